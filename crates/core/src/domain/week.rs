use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::slot::ReviewDay;
use crate::errors::DomainError;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// An ISO-8601 week, the addressing unit for reviewer schedules.
///
/// Values can only be built through [`WeekYear::new`] (or token parsing), so a
/// `WeekYear` always names a week that exists in its ISO year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekYear {
    year: i32,
    week: u32,
}

impl WeekYear {
    pub fn new(week: u32, year: i32) -> Result<Self, DomainError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DomainError::MalformedToken(format!(
                "year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
            )));
        }
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(DomainError::MalformedToken(format!(
                "week {week} does not exist in ISO year {year}"
            )));
        }
        Ok(Self { year, week })
    }

    /// The ISO week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self { year: iso.year(), week: iso.week() }
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Canonical, lexically sortable token such as `2024-W07`.
    pub fn token(&self) -> String {
        format!("{:04}-W{:02}", self.year, self.week)
    }

    pub fn from_token(token: &str) -> Result<Self, DomainError> {
        let malformed = || DomainError::MalformedToken(format!("`{token}` is not a YYYY-Www week"));

        let bytes = token.as_bytes();
        if bytes.len() != 8 || bytes[4] != b'-' || bytes[5] != b'W' {
            return Err(malformed());
        }
        let (year, week) = (&token[0..4], &token[6..8]);
        if !year.bytes().chain(week.bytes()).all(|byte| byte.is_ascii_digit()) {
            return Err(malformed());
        }

        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let week = week.parse::<u32>().map_err(|_| malformed())?;
        Self::new(week, year)
    }

    pub fn monday(&self) -> NaiveDate {
        self.date_of(ReviewDay::Monday)
    }

    pub fn date_of(&self, day: ReviewDay) -> NaiveDate {
        // Construction already proved this week exists.
        NaiveDate::from_isoywd_opt(self.year, self.week, day.weekday()).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Option<Self> {
        let date = self.monday().checked_add_signed(Duration::weeks(1))?;
        let next = Self::containing(date);
        (next.year <= MAX_YEAR).then_some(next)
    }

    pub fn previous(&self) -> Option<Self> {
        let date = self.monday().checked_sub_signed(Duration::weeks(1))?;
        let previous = Self::containing(date);
        (previous.year >= MIN_YEAR).then_some(previous)
    }

    /// `count` consecutive weeks starting with the week that contains `from`.
    pub fn upcoming(from: NaiveDate, count: usize) -> Vec<Self> {
        let mut weeks = Vec::with_capacity(count);
        let mut current = Some(Self::containing(from));
        while weeks.len() < count {
            let Some(week) = current else { break };
            weeks.push(week);
            current = week.next();
        }
        weeks
    }

    /// Number of ISO weeks (52 or 53) in `year`.
    pub fn weeks_in_year(year: i32) -> u32 {
        NaiveDate::from_ymd_opt(year, 12, 28).map(|date| date.iso_week().week()).unwrap_or(52)
    }
}

impl fmt::Display for WeekYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for WeekYear {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_token(value)
    }
}

impl TryFrom<String> for WeekYear {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_token(&value)
    }
}

impl From<WeekYear> for String {
    fn from(value: WeekYear) -> Self {
        value.token()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::WeekYear;
    use crate::domain::slot::ReviewDay;
    use crate::errors::DomainError;

    #[test]
    fn token_round_trips_for_every_week_of_long_and_short_years() {
        for year in [2015, 2020, 2024, 2026] {
            for week in 1..=WeekYear::weeks_in_year(year) {
                let value = WeekYear::new(week, year).expect("valid week");
                let parsed = WeekYear::from_token(&value.token()).expect("parse token");
                assert_eq!(parsed, value);
                assert_eq!((parsed.week(), parsed.year()), (week, year));
            }
        }
    }

    #[test]
    fn token_is_zero_padded_and_sortable() {
        let early = WeekYear::new(7, 2024).expect("week 7");
        let late = WeekYear::new(17, 2024).expect("week 17");
        assert_eq!(early.token(), "2024-W07");
        assert!(early.token() < late.token());
        assert!(early < late);
    }

    #[test]
    fn rejects_week_outside_range() {
        assert!(matches!(WeekYear::from_token("2024-W54"), Err(DomainError::MalformedToken(_))));
        assert!(matches!(WeekYear::from_token("2024-W00"), Err(DomainError::MalformedToken(_))));
    }

    #[test]
    fn rejects_week_53_in_a_52_week_year() {
        assert_eq!(WeekYear::weeks_in_year(2024), 52);
        assert!(WeekYear::new(53, 2024).is_err());
        assert_eq!(WeekYear::weeks_in_year(2020), 53);
        assert!(WeekYear::new(53, 2020).is_ok());
    }

    #[test]
    fn rejects_structurally_malformed_tokens() {
        for token in ["", "2024", "2024-17", "2024-w17", "24-W17", "2024-W1", "2024-W017", "+024-W17", "2024-W1x", "２０２４-W17"] {
            assert!(
                matches!(WeekYear::from_token(token), Err(DomainError::MalformedToken(_))),
                "token `{token}` should be rejected"
            );
        }
    }

    #[test]
    fn next_and_previous_roll_over_year_boundaries() {
        let last_of_2020 = WeekYear::new(53, 2020).expect("2020 has 53 weeks");
        let first_of_2021 = last_of_2020.next().expect("next week");
        assert_eq!(first_of_2021, WeekYear::new(1, 2021).expect("week 1"));
        assert_eq!(first_of_2021.previous(), Some(last_of_2020));

        let last_of_2024 = WeekYear::new(52, 2024).expect("week 52");
        assert_eq!(last_of_2024.next(), Some(WeekYear::new(1, 2025).expect("week 1")));
    }

    #[test]
    fn containing_uses_iso_year_not_calendar_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).expect("date");
        assert_eq!(WeekYear::containing(date), WeekYear::new(1, 2025).expect("week 1"));
    }

    #[test]
    fn dates_of_week_start_on_monday() {
        let week = WeekYear::new(17, 2024).expect("week 17");
        assert_eq!(week.monday(), NaiveDate::from_ymd_opt(2024, 4, 22).expect("date"));
        assert_eq!(week.date_of(ReviewDay::Friday), NaiveDate::from_ymd_opt(2024, 4, 26).expect("date"));
    }

    #[test]
    fn upcoming_lists_consecutive_weeks() {
        let from = NaiveDate::from_ymd_opt(2024, 12, 18).expect("date");
        let weeks = WeekYear::upcoming(from, 3).into_iter().map(|w| w.token()).collect::<Vec<_>>();
        assert_eq!(weeks, vec!["2024-W51", "2024-W52", "2025-W01"]);
    }
}
