use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::challenge::Challenge;
use crate::domain::reviewer::{normalize_technology, Reviewer, ReviewerId};
use crate::domain::slot::{ReviewDay, SlotId};
use crate::domain::week::WeekYear;
use crate::errors::ApplicationError;
use crate::scheduling::availability::is_review_slot;
use crate::scheduling::SchedulingService;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotAvailability {
    pub slot_id: SlotId,
    pub date: NaiveDate,
    pub booked: bool,
}

/// One reviewer's available slots on one day, ascending by hour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewerAvailability {
    pub reviewer_id: ReviewerId,
    pub name: String,
    pub github_alias: String,
    pub slots: Vec<SlotAvailability>,
}

impl ReviewerAvailability {
    pub fn earliest_hour(&self) -> Option<u8> {
        self.slots.first().map(|slot| slot.slot_id.hour())
    }
}

/// Search result grouped by weekday. Days without any reviewer are absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityByDay {
    week: WeekYear,
    days: BTreeMap<ReviewDay, Vec<ReviewerAvailability>>,
}

impl AvailabilityByDay {
    pub fn week(&self) -> WeekYear {
        self.week
    }

    pub fn day(&self, day: ReviewDay) -> Option<&[ReviewerAvailability]> {
        self.days.get(&day).map(Vec::as_slice)
    }

    pub fn days(&self) -> impl Iterator<Item = (ReviewDay, &[ReviewerAvailability])> {
        self.days.iter().map(|(day, reviewers)| (*day, reviewers.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn group(week: WeekYear, challenge: &Challenge, reviewers: &[Reviewer]) -> Self {
        let mut days = BTreeMap::<ReviewDay, Vec<ReviewerAvailability>>::new();

        for reviewer in reviewers {
            let Some(slots) = reviewer.schedule.week(week) else { continue };
            let mut by_day = BTreeMap::<ReviewDay, Vec<SlotAvailability>>::new();
            let offered = slots
                .iter()
                .filter(|(slot_id, state)| state.available && is_review_slot(challenge, **slot_id));
            for (slot_id, state) in offered {
                by_day.entry(slot_id.day()).or_default().push(SlotAvailability {
                    slot_id: *slot_id,
                    date: week.date_of(slot_id.day()),
                    booked: state.booked,
                });
            }
            for (day, slots) in by_day {
                days.entry(day).or_default().push(ReviewerAvailability {
                    reviewer_id: reviewer.id.clone(),
                    name: reviewer.name.clone(),
                    github_alias: reviewer.github_alias.clone(),
                    slots,
                });
            }
        }

        for reviewers in days.values_mut() {
            reviewers.sort_by(|left, right| {
                left.earliest_hour()
                    .cmp(&right.earliest_hour())
                    .then_with(|| left.name.cmp(&right.name))
                    .then_with(|| left.reviewer_id.cmp(&right.reviewer_id))
            });
        }

        Self { week, days }
    }
}

impl SchedulingService {
    /// Reviewers of `challenge_name` tagged with `technology` that marked at
    /// least one of the challenge's current slots of `week` available,
    /// grouped by day.
    pub async fn find_available_reviewers(
        &self,
        challenge_name: &str,
        technology: &str,
        week: WeekYear,
    ) -> Result<AvailabilityByDay, ApplicationError> {
        let challenge = self.load_challenge(challenge_name.trim()).await?;
        let challenge_name = challenge.name.as_str();
        let matching = self
            .reviewers
            .list_all()
            .await?
            .into_iter()
            .filter(|reviewer| {
                reviewer.challenge_name == challenge_name && reviewer.has_technology(technology)
            })
            .collect::<Vec<_>>();

        let result = AvailabilityByDay::group(week, &challenge, &matching);
        if result.is_empty() {
            return Err(ApplicationError::NoReviewersFound {
                challenge_name: challenge_name.to_string(),
                technology: normalize_technology(technology),
                week,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::reviewer::ReviewerId;
    use crate::domain::slot::{ReviewDay, SlotBooking, SlotId, SlotReference};
    use crate::domain::week::WeekYear;
    use crate::errors::ApplicationError;
    use crate::scheduling::testing::{challenge, harness, reviewer, Harness};

    fn week() -> WeekYear {
        WeekYear::new(17, 2024).expect("week")
    }

    fn slot(day: ReviewDay, hour: u8) -> SlotId {
        SlotId::new(day, hour).expect("slot")
    }

    fn add(harness: &Harness, id: &str, name: &str, challenge: &str, tags: &str, slots: &[SlotId]) {
        let mut reviewer = reviewer(id, name, challenge, tags);
        for slot_id in slots {
            reviewer.set_availability(&SlotReference {
                slot_id: *slot_id,
                week: week(),
                available: true,
            });
        }
        harness.reviewers.insert(reviewer);
    }

    #[tokio::test]
    async fn single_available_reviewer_is_found_on_that_day_only() {
        let harness = harness();
        add(&harness, "R1", "Ada", "Backend", "go", &[slot(ReviewDay::Monday, 10)]);

        let result = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect("search");

        let days = result.days().map(|(day, _)| day).collect::<Vec<_>>();
        assert_eq!(days, vec![ReviewDay::Monday]);
        let monday = result.day(ReviewDay::Monday).expect("monday");
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].reviewer_id, ReviewerId("R1".to_string()));
        assert_eq!(monday[0].slots.len(), 1);
        assert_eq!(monday[0].slots[0].slot_id.time_label(), "10:00");
        assert_eq!(monday[0].slots[0].date.to_string(), "2024-04-22");
        assert!(result.day(ReviewDay::Tuesday).is_none());
    }

    #[tokio::test]
    async fn filters_by_exact_challenge_and_case_insensitive_technology() {
        let harness = harness();
        let monday = [slot(ReviewDay::Monday, 10)];
        add(&harness, "R1", "Ada", "Backend", "Go", &monday);
        add(&harness, "R2", "Bob", "backend", "go", &monday);
        add(&harness, "R3", "Cy", "Backend", "rust", &monday);
        add(&harness, "R4", "Di", "Frontend", "go", &monday);

        let result = harness
            .service
            .find_available_reviewers("Backend", "GO", week())
            .await
            .expect("search");

        let ids = result
            .day(ReviewDay::Monday)
            .expect("monday")
            .iter()
            .map(|entry| entry.reviewer_id.0.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["R1"]);
    }

    #[tokio::test]
    async fn reviewer_appears_once_per_day_with_all_slots() {
        let harness = harness();
        add(
            &harness,
            "R1",
            "Ada",
            "Backend",
            "go",
            &[slot(ReviewDay::Monday, 14), slot(ReviewDay::Monday, 9), slot(ReviewDay::Thursday, 11)],
        );

        let result = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect("search");

        let monday = result.day(ReviewDay::Monday).expect("monday");
        assert_eq!(monday.len(), 1);
        let hours = monday[0].slots.iter().map(|slot| slot.slot_id.hour()).collect::<Vec<_>>();
        assert_eq!(hours, vec![9, 14]);
        assert_eq!(result.day(ReviewDay::Thursday).expect("thursday").len(), 1);
    }

    #[tokio::test]
    async fn reviewers_are_ranked_by_earliest_hour_then_name() {
        let harness = harness();
        add(&harness, "R1", "Zed", "Backend", "go", &[slot(ReviewDay::Monday, 9)]);
        add(&harness, "R2", "Ada", "Backend", "go", &[slot(ReviewDay::Monday, 13)]);
        add(&harness, "R3", "Bob", "Backend", "go", &[slot(ReviewDay::Monday, 13)]);

        let result = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect("search");

        let names = result
            .day(ReviewDay::Monday)
            .expect("monday")
            .iter()
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Zed", "Ada", "Bob"]);
    }

    #[tokio::test]
    async fn booked_slots_stay_listed_with_their_flag() {
        let harness = harness();
        let monday = slot(ReviewDay::Monday, 10);
        let mut entry = reviewer("R1", "Ada", "Backend", "go");
        entry.set_availability(&SlotReference { slot_id: monday, week: week(), available: true });
        entry.set_booking(&SlotBooking { slot_id: monday, week: week(), is_booked: true });
        harness.reviewers.insert(entry);

        let result = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect("search");

        assert!(result.day(ReviewDay::Monday).expect("monday")[0].slots[0].booked);
    }

    #[tokio::test]
    async fn no_matching_availability_is_reported_as_not_found() {
        let harness = harness();
        add(&harness, "R1", "Ada", "Backend", "go", &[slot(ReviewDay::Monday, 10)]);
        let other_week = week().next().expect("next");

        let error = harness
            .service
            .find_available_reviewers("Backend", "go", other_week)
            .await
            .expect_err("nothing available");

        assert!(error.is_informational());
        assert!(matches!(
            error,
            ApplicationError::NoReviewersFound { ref technology, week, .. }
                if technology == "go" && week == other_week
        ));
    }

    #[tokio::test]
    async fn slots_outside_the_current_challenge_hours_are_not_offered() {
        let harness = harness();
        add(
            &harness,
            "R1",
            "Ada",
            "Backend",
            "go",
            &[slot(ReviewDay::Monday, 9), slot(ReviewDay::Monday, 14), slot(ReviewDay::Friday, 9)],
        );
        harness.challenges.insert(challenge("Backend", &[14, 15]));

        let result = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect("search");

        let monday = result.day(ReviewDay::Monday).expect("monday");
        let hours = monday[0].slots.iter().map(|slot| slot.slot_id.hour()).collect::<Vec<_>>();
        assert_eq!(hours, vec![14]);
        assert!(result.day(ReviewDay::Friday).is_none());

        harness.challenges.insert(challenge("Backend", &[16]));
        let error = harness
            .service
            .find_available_reviewers("Backend", "go", week())
            .await
            .expect_err("no offered slot left");
        assert!(matches!(error, ApplicationError::NoReviewersFound { .. }));
    }

    #[tokio::test]
    async fn searching_an_unknown_challenge_reports_it() {
        let harness = harness();
        let error = harness
            .service
            .find_available_reviewers("Mobile", "go", week())
            .await
            .expect_err("unknown challenge");
        assert!(matches!(error, ApplicationError::ChallengeNotRegistered { .. }));
    }
}
