use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::slot::{SlotBooking, SlotId, SlotReference, SlotState};
use crate::domain::week::WeekYear;

/// Chat user ID of a reviewer (e.g. a Slack `U…` ID).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReviewerId(pub String);

pub type WeekSlots = BTreeMap<SlotId, SlotState>;

/// Per-week slot flags of one reviewer. A missing week or slot means
/// "not available, not booked".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    weeks: BTreeMap<WeekYear, WeekSlots>,
}

impl WeeklySchedule {
    pub fn slot_state(&self, week: WeekYear, slot_id: SlotId) -> SlotState {
        self.weeks.get(&week).and_then(|slots| slots.get(&slot_id)).copied().unwrap_or_default()
    }

    pub fn week(&self, week: WeekYear) -> Option<&WeekSlots> {
        self.weeks.get(&week)
    }

    fn update(&mut self, week: WeekYear, slot_id: SlotId, apply: impl FnOnce(&mut SlotState)) {
        let slots = self.weeks.entry(week).or_default();
        let state = slots.entry(slot_id).or_default();
        apply(state);

        // Keep the stored document sparse.
        if state.is_empty() {
            slots.remove(&slot_id);
        }
        if slots.is_empty() {
            self.weeks.remove(&week);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    pub name: String,
    pub github_alias: String,
    pub challenge_name: String,
    pub technologies: BTreeSet<String>,
    pub schedule: WeeklySchedule,
    /// Optimistic concurrency stamp; `0` means the reviewer was never stored.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reviewer {
    pub fn has_technology(&self, technology: &str) -> bool {
        let technology = normalize_technology(technology);
        !technology.is_empty() && self.technologies.contains(&technology)
    }

    pub fn slot_state(&self, week: WeekYear, slot_id: SlotId) -> SlotState {
        self.schedule.slot_state(week, slot_id)
    }

    pub fn set_availability(&mut self, reference: &SlotReference) {
        self.schedule.update(reference.week, reference.slot_id, |state| {
            state.available = reference.available;
        });
    }

    pub fn set_booking(&mut self, booking: &SlotBooking) {
        self.schedule.update(booking.week, booking.slot_id, |state| {
            state.booked = booking.is_booked;
        });
    }
}

pub fn normalize_technology(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Splits a free-form tag list such as `"Go, rust  python"`.
pub fn parse_technologies(input: &str) -> BTreeSet<String> {
    input
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(normalize_technology)
        .filter(|tag| !tag.is_empty())
        .collect()
}
