//! Replays a schedule button click.
//!
//! A rendered schedule button carries an action-state token and the flag
//! value it displayed. Clicking it asks for the opposite value, so replaying
//! the same click against a stale message converges on the same stored value
//! instead of flipping it back.

use crate::codec::ScheduleActionInfo;
use crate::domain::reviewer::Reviewer;
use crate::domain::slot::{Slot, SlotBooking, SlotReference};
use crate::errors::{ApplicationError, DomainError};
use crate::scheduling::availability::{is_review_slot, slots_for_week};
use crate::scheduling::SchedulingService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TogglePlane {
    Availability,
    Booking,
}

impl TogglePlane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::Booking => "booking",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleRequest {
    pub plane: TogglePlane,
    /// Flag value shown on the clicked button.
    pub displayed: bool,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub reviewer: Reviewer,
    pub info: ScheduleActionInfo,
    pub plane: TogglePlane,
    pub new_value: bool,
    pub slots: Vec<Slot>,
}

impl SchedulingService {
    pub async fn toggle(&self, request: ToggleRequest) -> Result<ToggleOutcome, ApplicationError> {
        let info = self.codec.decode(&request.token)?;
        let reviewer = self.load_reviewer(&info.reviewer_id).await?;
        let challenge = self.load_challenge(&reviewer.challenge_name).await?;
        if !is_review_slot(&challenge, info.slot_id) {
            return Err(DomainError::UnknownSlot(info.slot_id.to_string()).into());
        }

        let new_value = !request.displayed;
        let reviewer = match request.plane {
            TogglePlane::Availability => {
                let reference =
                    SlotReference { slot_id: info.slot_id, week: info.week, available: new_value };
                self.update_reviewer_availability(&reviewer, reference).await?
            }
            TogglePlane::Booking => {
                let booking =
                    SlotBooking { slot_id: info.slot_id, week: info.week, is_booked: new_value };
                self.update_reviewer_booking(&reviewer, booking).await?
            }
        };

        let slots = slots_for_week(info.week, &reviewer, &challenge);
        Ok(ToggleOutcome { reviewer, info, plane: request.plane, new_value, slots })
    }
}
