use chrono::Utc;

use crate::domain::challenge::Challenge;
use crate::domain::reviewer::Reviewer;
use crate::domain::slot::{ReviewDay, Slot, SlotId, SlotReference};
use crate::domain::week::WeekYear;
use crate::errors::ApplicationError;
use crate::scheduling::SchedulingService;

/// Every slot of `week` for the challenge's review hours, Monday first and
/// ascending by hour within a day, carrying the reviewer's stored flags.
pub fn slots_for_week(week: WeekYear, reviewer: &Reviewer, challenge: &Challenge) -> Vec<Slot> {
    let hours = review_hours(challenge);
    let mut slots = Vec::with_capacity(ReviewDay::ALL.len() * hours.len());

    for day in ReviewDay::ALL {
        let date = week.date_of(day);
        for hour in &hours {
            let Ok(id) = SlotId::new(day, *hour) else { continue };
            let state = reviewer.slot_state(week, id);
            slots.push(Slot { id, date, available: state.available, booked: state.booked });
        }
    }

    slots
}

/// Whether `slot_id` is one of the slots `slots_for_week` renders for `challenge`.
pub fn is_review_slot(challenge: &Challenge, slot_id: SlotId) -> bool {
    review_hours(challenge).contains(&slot_id.hour())
}

pub(crate) fn review_hours(challenge: &Challenge) -> Vec<u8> {
    let mut hours =
        challenge.review_hours.iter().copied().filter(|hour| *hour <= 23).collect::<Vec<_>>();
    hours.sort_unstable();
    hours.dedup();
    hours
}

impl SchedulingService {
    /// Sets one slot's availability and persists the reviewer. The caller's
    /// copy is left untouched; the stored copy is returned.
    pub async fn update_reviewer_availability(
        &self,
        reviewer: &Reviewer,
        reference: SlotReference,
    ) -> Result<Reviewer, ApplicationError> {
        let mut updated = reviewer.clone();
        updated.set_availability(&reference);
        updated.updated_at = Utc::now();
        Ok(self.reviewers.save(&updated).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::{is_review_slot, slots_for_week};
    use crate::domain::slot::{ReviewDay, SlotId, SlotReference};
    use crate::domain::week::WeekYear;
    use crate::errors::{ApplicationError, PersistenceError};
    use crate::scheduling::testing::{challenge, harness, reviewer};

    #[test]
    fn slots_cover_weekdays_times_hours_in_stable_order() {
        let challenge = challenge("Backend", &[14, 10, 14]);
        let reviewer = reviewer("U1", "Ada", "Backend", "go");
        let week = WeekYear::new(17, 2024).expect("week");

        let slots = slots_for_week(week, &reviewer, &challenge);
        let labels = slots.iter().map(|slot| slot.id.to_string()).collect::<Vec<_>>();

        assert_eq!(
            labels,
            vec![
                "Mon-10", "Mon-14", "Tue-10", "Tue-14", "Wed-10", "Wed-14", "Thu-10", "Thu-14",
                "Fri-10", "Fri-14",
            ]
        );
        assert_eq!(slots[0].date.to_string(), "2024-04-22");
        assert_eq!(slots[9].date.to_string(), "2024-04-26");
        assert!(slots.iter().all(|slot| !slot.available && !slot.booked));
    }

    #[test]
    fn slots_carry_stored_flags_for_that_week_only() {
        let challenge = challenge("Backend", &[10]);
        let mut reviewer = reviewer("U1", "Ada", "Backend", "go");
        let week = WeekYear::new(17, 2024).expect("week");
        let slot_id = SlotId::new(ReviewDay::Wednesday, 10).expect("slot");
        reviewer.set_availability(&SlotReference { slot_id, week, available: true });

        let slots = slots_for_week(week, &reviewer, &challenge);
        let available =
            slots.iter().filter(|slot| slot.available).map(|slot| slot.id).collect::<Vec<_>>();
        assert_eq!(available, vec![slot_id]);

        let next = week.next().expect("next week");
        assert!(slots_for_week(next, &reviewer, &challenge).iter().all(|slot| !slot.available));
    }

    #[test]
    fn review_slots_follow_challenge_hours() {
        let challenge = challenge("Backend", &[9, 10]);
        assert!(is_review_slot(&challenge, SlotId::new(ReviewDay::Friday, 9).expect("slot")));
        assert!(!is_review_slot(&challenge, SlotId::new(ReviewDay::Friday, 12).expect("slot")));
    }

    #[tokio::test]
    async fn update_sets_only_the_referenced_slot() {
        let harness = harness();
        let mut original = reviewer("U1", "Ada", "Backend", "go");
        let week = WeekYear::new(17, 2024).expect("week");
        let booked = SlotId::new(ReviewDay::Tuesday, 11).expect("slot");
        original.set_booking(&crate::domain::slot::SlotBooking {
            slot_id: booked,
            week,
            is_booked: true,
        });
        harness.reviewers.insert(original.clone());
        let slot_id = SlotId::new(ReviewDay::Monday, 10).expect("slot");

        let stored = harness
            .service
            .update_reviewer_availability(&original, SlotReference { slot_id, week, available: true })
            .await
            .expect("update");

        assert!(stored.slot_state(week, slot_id).available);
        assert!(!stored.slot_state(week, slot_id).booked);
        assert!(stored.slot_state(week, booked).booked);
        assert!(!stored.slot_state(week, booked).available);
        assert_eq!(stored.version, original.version + 1);
        assert!(!original.slot_state(week, slot_id).available);
    }

    #[tokio::test]
    async fn failed_writes_leave_the_store_unchanged() {
        let harness = harness();
        let original = reviewer("U1", "Ada", "Backend", "go");
        harness.reviewers.insert(original.clone());
        harness.reviewers.fail_writes(true);
        let week = WeekYear::new(17, 2024).expect("week");
        let slot_id = SlotId::new(ReviewDay::Monday, 10).expect("slot");

        let error = harness
            .service
            .update_reviewer_availability(&original, SlotReference { slot_id, week, available: true })
            .await
            .expect_err("write fails");

        assert!(matches!(error, ApplicationError::Persistence(PersistenceError::Unavailable(_))));
        assert_eq!(harness.reviewers.get("U1"), Some(original));
    }
}
