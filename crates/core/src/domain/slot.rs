use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::week::WeekYear;
use crate::errors::DomainError;

pub const DEFAULT_REVIEW_HOURS: [u8; 7] = [9, 10, 11, 13, 14, 15, 16];

/// Working days a reviewer can be scheduled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl ReviewDay {
    pub const ALL: [ReviewDay; 5] =
        [Self::Monday, Self::Tuesday, Self::Wednesday, Self::Thursday, Self::Friday];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        }
    }

    pub fn short(&self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
        }
    }

    pub fn weekday(&self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Tuesday => Weekday::Tue,
            Self::Wednesday => Weekday::Wed,
            Self::Thursday => Weekday::Thu,
            Self::Friday => Weekday::Fri,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(Self::Monday),
            Weekday::Tue => Some(Self::Tuesday),
            Weekday::Wed => Some(Self::Wednesday),
            Weekday::Thu => Some(Self::Thursday),
            Weekday::Fri => Some(Self::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// Accepts full names and three-letter abbreviations, case-insensitively.
    /// Weekend days are not review days.
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<Weekday>().ok().and_then(Self::from_weekday)
    }
}

impl fmt::Display for ReviewDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A (day, hour) slot inside a week, written as `Mon-10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    day: ReviewDay,
    hour: u8,
}

impl SlotId {
    pub fn new(day: ReviewDay, hour: u8) -> Result<Self, DomainError> {
        if hour > 23 {
            return Err(DomainError::UnknownSlot(format!("{}-{hour}", day.short())));
        }
        Ok(Self { day, hour })
    }

    pub fn day(&self) -> ReviewDay {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn time_label(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day.short(), self.hour)
    }
}

impl FromStr for SlotId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || DomainError::UnknownSlot(value.to_string());
        let (day, hour) = value.split_once('-').ok_or_else(unknown)?;
        let day = ReviewDay::ALL
            .into_iter()
            .find(|candidate| candidate.short() == day)
            .ok_or_else(unknown)?;
        if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(unknown());
        }
        let hour = hour.parse::<u8>().map_err(|_| unknown())?;
        Self::new(day, hour)
    }
}

impl TryFrom<String> for SlotId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.to_string()
    }
}

/// Stored flags of one slot. Availability and booking are independent planes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotState {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub booked: bool,
}

impl SlotState {
    pub fn is_empty(&self) -> bool {
        !self.available && !self.booked
    }
}

/// One rendered calendar slot of a reviewer's week.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub date: NaiveDate,
    pub available: bool,
    pub booked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotReference {
    pub slot_id: SlotId,
    pub week: WeekYear,
    pub available: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotBooking {
    pub slot_id: SlotId,
    pub week: WeekYear,
    pub is_booked: bool,
}

/// Sorted, de-duplicated hours, rejecting anything outside a day.
pub fn normalize_review_hours(hours: &[u8]) -> Result<Vec<u8>, DomainError> {
    if let Some(hour) = hours.iter().find(|hour| **hour > 23) {
        return Err(DomainError::InvariantViolation(format!(
            "review hour {hour} is outside 0..=23"
        )));
    }
    let mut normalized = hours.to_vec();
    normalized.sort_unstable();
    normalized.dedup();
    Ok(normalized)
}
