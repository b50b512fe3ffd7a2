//! Reviewer scheduling engine.
//!
//! [`SchedulingService`] owns no state of its own: every operation loads the
//! reviewer and challenge documents through the injected stores, applies one
//! change, and writes the reviewer back. Stores are shared across concurrent
//! interaction tasks, and a reviewer write only succeeds against the version
//! it was read at.

pub mod availability;
pub mod booking;
pub mod search;
pub mod toggle;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::codec::{ActionInfoCodec, MAX_REVIEWER_ID_LEN};
use crate::domain::challenge::{Challenge, ChallengeId};
use crate::domain::reviewer::{parse_technologies, Reviewer, ReviewerId, WeeklySchedule};
use crate::domain::slot::{normalize_review_hours, Slot, DEFAULT_REVIEW_HOURS};
use crate::domain::week::WeekYear;
use crate::errors::{ApplicationError, DomainError, PersistenceError};

pub use availability::slots_for_week;
pub use search::{AvailabilityByDay, ReviewerAvailability, SlotAvailability};
pub use toggle::{ToggleOutcome, TogglePlane, ToggleRequest};

#[async_trait]
pub trait ReviewerStore: Send + Sync {
    async fn find_by_id(&self, id: &ReviewerId) -> Result<Option<Reviewer>, PersistenceError>;

    async fn list_all(&self) -> Result<Vec<Reviewer>, PersistenceError>;

    /// Stores `reviewer` if the stored version still equals `reviewer.version`
    /// and returns the stored copy with its version bumped.
    async fn save(&self, reviewer: &Reviewer) -> Result<Reviewer, PersistenceError>;
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    async fn find_by_id(&self, id: &ChallengeId) -> Result<Option<Challenge>, PersistenceError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Challenge>, PersistenceError>;

    async fn list_all(&self) -> Result<Vec<Challenge>, PersistenceError>;

    async fn save(&self, challenge: &Challenge) -> Result<Challenge, PersistenceError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChallenge {
    pub name: String,
    pub github_owner: String,
    pub github_org: String,
    pub template_repo: String,
    pub repo_name_format: String,
    /// Free-form tag list, e.g. `"go, rust"`.
    pub technologies: String,
    pub review_hours: Vec<u8>,
    pub team_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReviewer {
    pub id: ReviewerId,
    pub name: String,
    pub github_alias: String,
    pub challenge_name: String,
    pub technologies: String,
}

/// A reviewer's rendered week.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleView {
    pub reviewer: Reviewer,
    pub challenge: Challenge,
    pub week: WeekYear,
    pub slots: Vec<Slot>,
}

#[derive(Clone)]
pub struct SchedulingService {
    reviewers: Arc<dyn ReviewerStore>,
    challenges: Arc<dyn ChallengeStore>,
    codec: ActionInfoCodec,
    default_review_hours: Vec<u8>,
}

impl fmt::Debug for SchedulingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingService")
            .field("default_review_hours", &self.default_review_hours)
            .finish_non_exhaustive()
    }
}

impl SchedulingService {
    pub fn new(
        reviewers: Arc<dyn ReviewerStore>,
        challenges: Arc<dyn ChallengeStore>,
        codec: ActionInfoCodec,
    ) -> Self {
        Self { reviewers, challenges, codec, default_review_hours: DEFAULT_REVIEW_HOURS.to_vec() }
    }

    /// Hours used for challenges registered without their own hours.
    pub fn with_default_review_hours(mut self, hours: &[u8]) -> Result<Self, DomainError> {
        let hours = normalize_review_hours(hours)?;
        if hours.is_empty() {
            return Err(DomainError::InvariantViolation(
                "default review hours must not be empty".to_string(),
            ));
        }
        self.default_review_hours = hours;
        Ok(self)
    }

    pub fn codec(&self) -> &ActionInfoCodec {
        &self.codec
    }

    pub fn default_review_hours(&self) -> &[u8] {
        &self.default_review_hours
    }

    pub async fn load_reviewer(&self, id: &ReviewerId) -> Result<Reviewer, ApplicationError> {
        self.reviewers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::ReviewerNotRegistered { reviewer_id: id.0.clone() })
    }

    /// Loads a challenge by name. A stored challenge without any valid
    /// review hour cannot offer slots and is reported as misconfigured.
    pub async fn load_challenge(&self, name: &str) -> Result<Challenge, ApplicationError> {
        let challenge = self.challenges.find_by_name(name).await?.ok_or_else(|| {
            ApplicationError::ChallengeNotRegistered { challenge_name: name.to_string() }
        })?;
        if availability::review_hours(&challenge).is_empty() {
            return Err(ApplicationError::Configuration(format!(
                "challenge `{}` has no review hours",
                challenge.name
            )));
        }
        Ok(challenge)
    }

    pub async fn show_schedule(
        &self,
        reviewer_id: &ReviewerId,
        week: WeekYear,
    ) -> Result<ScheduleView, ApplicationError> {
        let reviewer = self.load_reviewer(reviewer_id).await?;
        let challenge = self.load_challenge(&reviewer.challenge_name).await?;
        let slots = slots_for_week(week, &reviewer, &challenge);
        Ok(ScheduleView { reviewer, challenge, week, slots })
    }

    /// Creates a challenge, or updates the one that already has this name.
    pub async fn register_challenge(
        &self,
        request: NewChallenge,
    ) -> Result<Challenge, ApplicationError> {
        let name = required("challenge name", &request.name)?;
        let challenge = match self.challenges.find_by_name(&name).await? {
            Some(existing) => self.edited(existing, request)?,
            None => {
                let review_hours = self.review_hours_or_default(&request.review_hours)?;
                let now = Utc::now();
                Challenge {
                    id: ChallengeId(format!("CH-{}", Uuid::new_v4().simple())),
                    name,
                    github_owner: request.github_owner.trim().to_string(),
                    github_org: request.github_org.trim().to_string(),
                    template_repo: request.template_repo.trim().to_string(),
                    repo_name_format: request.repo_name_format.trim().to_string(),
                    technologies: parse_technologies(&request.technologies).into_iter().collect(),
                    review_hours,
                    created_by_team_id: request.team_id,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        Ok(self.challenges.save(&challenge).await?)
    }

    /// Updates the challenge with this id. Reviewers reference challenges by
    /// name, so the name cannot change.
    pub async fn edit_challenge(
        &self,
        id: &ChallengeId,
        request: NewChallenge,
    ) -> Result<Challenge, ApplicationError> {
        let existing = self.challenges.find_by_id(id).await?.ok_or_else(|| {
            ApplicationError::ChallengeNotRegistered { challenge_name: id.0.clone() }
        })?;
        let name = required("challenge name", &request.name)?;
        if name != existing.name {
            return Err(DomainError::InvariantViolation(format!(
                "challenge `{}` cannot be renamed to `{name}`",
                existing.name
            ))
            .into());
        }

        let challenge = self.edited(existing, request)?;
        Ok(self.challenges.save(&challenge).await?)
    }

    fn edited(&self, existing: Challenge, request: NewChallenge) -> Result<Challenge, DomainError> {
        Ok(Challenge {
            github_owner: request.github_owner.trim().to_string(),
            github_org: request.github_org.trim().to_string(),
            template_repo: request.template_repo.trim().to_string(),
            repo_name_format: request.repo_name_format.trim().to_string(),
            technologies: parse_technologies(&request.technologies).into_iter().collect(),
            review_hours: self.review_hours_or_default(&request.review_hours)?,
            updated_at: Utc::now(),
            ..existing
        })
    }

    fn review_hours_or_default(&self, hours: &[u8]) -> Result<Vec<u8>, DomainError> {
        match normalize_review_hours(hours)? {
            hours if hours.is_empty() => Ok(self.default_review_hours.clone()),
            hours => Ok(hours),
        }
    }

    /// Registers a reviewer for an existing challenge. Re-registering keeps
    /// the stored schedule.
    pub async fn register_reviewer(
        &self,
        request: NewReviewer,
    ) -> Result<Reviewer, ApplicationError> {
        let id = ReviewerId(required("reviewer id", &request.id.0)?);
        if id.0.len() > MAX_REVIEWER_ID_LEN {
            return Err(DomainError::InvariantViolation(format!(
                "reviewer id must be at most {MAX_REVIEWER_ID_LEN} bytes"
            ))
            .into());
        }
        let name = required("reviewer name", &request.name)?;
        let challenge = self.load_challenge(request.challenge_name.trim()).await?;
        let technologies = parse_technologies(&request.technologies);
        let now = Utc::now();

        let reviewer = match self.reviewers.find_by_id(&id).await? {
            Some(existing) => Reviewer {
                name,
                github_alias: request.github_alias.trim().to_string(),
                challenge_name: challenge.name,
                technologies,
                updated_at: now,
                ..existing
            },
            None => Reviewer {
                id,
                name,
                github_alias: request.github_alias.trim().to_string(),
                challenge_name: challenge.name,
                technologies,
                schedule: WeeklySchedule::default(),
                version: 0,
                created_at: now,
                updated_at: now,
            },
        };

        Ok(self.reviewers.save(&reviewer).await?)
    }

    pub async fn list_challenge_names(&self) -> Result<Vec<String>, ApplicationError> {
        let mut names = self
            .challenges
            .list_all()
            .await?
            .into_iter()
            .map(|challenge| challenge.name)
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvariantViolation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::{ChallengeStore, ReviewerStore, SchedulingService};
    use crate::codec::ActionInfoCodec;
    use crate::domain::challenge::{Challenge, ChallengeId};
    use crate::domain::reviewer::{parse_technologies, Reviewer, ReviewerId, WeeklySchedule};
    use crate::domain::slot::DEFAULT_REVIEW_HOURS;
    use crate::errors::PersistenceError;

    pub const SECRET: &str = "scheduling-test-secret-0123";

    #[derive(Default)]
    pub struct FakeReviewers {
        rows: Mutex<BTreeMap<ReviewerId, Reviewer>>,
        fail_writes: AtomicBool,
    }

    impl FakeReviewers {
        pub fn insert(&self, reviewer: Reviewer) {
            self.rows.lock().expect("lock").insert(reviewer.id.clone(), reviewer);
        }

        pub fn get(&self, id: &str) -> Option<Reviewer> {
            self.rows.lock().expect("lock").get(&ReviewerId(id.to_string())).cloned()
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ReviewerStore for FakeReviewers {
        async fn find_by_id(&self, id: &ReviewerId) -> Result<Option<Reviewer>, PersistenceError> {
            Ok(self.rows.lock().expect("lock").get(id).cloned())
        }

        async fn list_all(&self) -> Result<Vec<Reviewer>, PersistenceError> {
            Ok(self.rows.lock().expect("lock").values().cloned().collect())
        }

        async fn save(&self, reviewer: &Reviewer) -> Result<Reviewer, PersistenceError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PersistenceError::Unavailable("injected write failure".to_string()));
            }
            let mut rows = self.rows.lock().expect("lock");
            let actual = rows.get(&reviewer.id).map(|stored| stored.version);
            if actual.unwrap_or(0) != reviewer.version {
                return Err(PersistenceError::VersionConflict {
                    key: reviewer.id.0.clone(),
                    expected: reviewer.version,
                    actual,
                });
            }
            let mut stored = reviewer.clone();
            stored.version += 1;
            rows.insert(stored.id.clone(), stored.clone());
            Ok(stored)
        }
    }

    #[derive(Default)]
    pub struct FakeChallenges {
        rows: Mutex<BTreeMap<String, Challenge>>,
    }

    impl FakeChallenges {
        pub fn insert(&self, challenge: Challenge) {
            self.rows.lock().expect("lock").insert(challenge.id.0.clone(), challenge);
        }
    }

    #[async_trait]
    impl ChallengeStore for FakeChallenges {
        async fn find_by_id(
            &self,
            id: &ChallengeId,
        ) -> Result<Option<Challenge>, PersistenceError> {
            Ok(self.rows.lock().expect("lock").get(&id.0).cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Challenge>, PersistenceError> {
            Ok(self.rows.lock().expect("lock").values().find(|row| row.name == name).cloned())
        }

        async fn list_all(&self) -> Result<Vec<Challenge>, PersistenceError> {
            Ok(self.rows.lock().expect("lock").values().cloned().collect())
        }

        async fn save(&self, challenge: &Challenge) -> Result<Challenge, PersistenceError> {
            self.insert(challenge.clone());
            Ok(challenge.clone())
        }
    }

    pub fn challenge(name: &str, review_hours: &[u8]) -> Challenge {
        Challenge {
            id: ChallengeId(format!("CH-{name}")),
            name: name.to_string(),
            github_owner: "octocat".to_string(),
            github_org: String::new(),
            template_repo: format!("{}-template", name.to_ascii_lowercase()),
            repo_name_format: "test_CHALLENGENAME-GITHUBALIAS".to_string(),
            technologies: vec!["go".to_string(), "rust".to_string()],
            review_hours: review_hours.to_vec(),
            created_by_team_id: "T1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn reviewer(id: &str, name: &str, challenge_name: &str, technologies: &str) -> Reviewer {
        Reviewer {
            id: ReviewerId(id.to_string()),
            name: name.to_string(),
            github_alias: name.to_ascii_lowercase(),
            challenge_name: challenge_name.to_string(),
            technologies: parse_technologies(technologies),
            schedule: WeeklySchedule::default(),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub struct Harness {
        pub reviewers: Arc<FakeReviewers>,
        pub challenges: Arc<FakeChallenges>,
        pub service: SchedulingService,
    }

    pub fn harness() -> Harness {
        let reviewers = Arc::new(FakeReviewers::default());
        let challenges = Arc::new(FakeChallenges::default());
        challenges.insert(challenge("Backend", &DEFAULT_REVIEW_HOURS));
        let service = SchedulingService::new(
            reviewers.clone(),
            challenges.clone(),
            ActionInfoCodec::new(SECRET).expect("codec"),
        );
        Harness { reviewers, challenges, service }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{challenge, harness, reviewer};
    use super::{NewChallenge, NewReviewer};
    use crate::codec::{ScheduleActionInfo, MAX_REVIEWER_ID_LEN};
    use crate::domain::challenge::ChallengeId;
    use crate::domain::reviewer::ReviewerId;
    use crate::domain::slot::{ReviewDay, SlotId, SlotReference};
    use crate::domain::week::WeekYear;
    use crate::errors::{ApplicationError, DomainError, InterfaceError, PersistenceError};

    fn new_challenge(name: &str, review_hours: Vec<u8>) -> NewChallenge {
        NewChallenge {
            name: name.to_string(),
            github_owner: "octocat".to_string(),
            github_org: "acme".to_string(),
            template_repo: "frontend-template".to_string(),
            repo_name_format: "test_CHALLENGENAME-GITHUBALIAS".to_string(),
            technologies: "TypeScript, react".to_string(),
            review_hours,
            team_id: "T1".to_string(),
        }
    }

    #[tokio::test]
    async fn show_schedule_renders_the_reviewers_challenge_hours() {
        let harness = harness();
        harness.reviewers.insert(reviewer("U1", "Ada", "Backend", "go"));
        let week = WeekYear::new(17, 2024).expect("week");

        let view = harness
            .service
            .show_schedule(&ReviewerId("U1".to_string()), week)
            .await
            .expect("schedule");

        assert_eq!(view.challenge.name, "Backend");
        assert_eq!(view.slots.len(), 5 * 7);
        assert!(view.slots.iter().all(|slot| !slot.available && !slot.booked));
    }

    #[tokio::test]
    async fn show_schedule_reports_unknown_reviewer_and_challenge() {
        let harness = harness();
        let week = WeekYear::new(17, 2024).expect("week");

        let error = harness
            .service
            .show_schedule(&ReviewerId("U404".to_string()), week)
            .await
            .expect_err("unknown reviewer");
        assert!(matches!(error, ApplicationError::ReviewerNotRegistered { .. }));

        harness.reviewers.insert(reviewer("U2", "Bob", "Retired", "go"));
        let error = harness
            .service
            .show_schedule(&ReviewerId("U2".to_string()), week)
            .await
            .expect_err("unknown challenge");
        assert!(matches!(error, ApplicationError::ChallengeNotRegistered { .. }));
    }

    #[tokio::test]
    async fn challenges_without_review_hours_are_reported_as_misconfigured() {
        let harness = harness();
        harness.challenges.insert(challenge("Legacy", &[]));
        harness.reviewers.insert(reviewer("U3", "Cy", "Legacy", "go"));

        let error = harness
            .service
            .show_schedule(&ReviewerId("U3".to_string()), WeekYear::new(17, 2024).expect("week"))
            .await
            .expect_err("no hours");

        assert!(matches!(
            error,
            ApplicationError::Configuration(ref message) if message.contains("Legacy")
        ));
        assert!(!error.is_informational());
        assert!(matches!(error.into_interface("req-5"), InterfaceError::Internal { .. }));
    }

    #[tokio::test]
    async fn register_challenge_defaults_hours_and_updates_by_name() {
        let harness = harness();

        let created = harness
            .service
            .register_challenge(new_challenge("Frontend", Vec::new()))
            .await
            .expect("create");
        assert_eq!(created.review_hours, vec![9, 10, 11, 13, 14, 15, 16]);
        assert_eq!(created.technologies, vec!["react".to_string(), "typescript".to_string()]);

        let updated = harness
            .service
            .register_challenge(new_challenge("Frontend", vec![15, 10, 15]))
            .await
            .expect("update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.review_hours, vec![10, 15]);
        assert_eq!(
            harness.service.list_challenge_names().await.expect("names"),
            vec!["Backend".to_string(), "Frontend".to_string()]
        );
    }

    #[tokio::test]
    async fn register_challenge_rejects_invalid_input() {
        let harness = harness();

        let error = harness
            .service
            .register_challenge(new_challenge("  ", Vec::new()))
            .await
            .expect_err("blank name");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));

        let error = harness
            .service
            .register_challenge(new_challenge("Frontend", vec![24]))
            .await
            .expect_err("hour out of range");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn edit_challenge_updates_by_id_and_keeps_the_name() {
        let harness = harness();
        let created = harness
            .service
            .register_challenge(new_challenge("Frontend", vec![9]))
            .await
            .expect("create");

        let edited = harness
            .service
            .edit_challenge(&created.id, new_challenge("Frontend", vec![14, 11]))
            .await
            .expect("edit");
        assert_eq!(edited.id, created.id);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(edited.review_hours, vec![11, 14]);

        let error = harness
            .service
            .edit_challenge(&created.id, new_challenge("Mobile", Vec::new()))
            .await
            .expect_err("rename");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));

        let error = harness
            .service
            .edit_challenge(
                &ChallengeId("CH-missing".to_string()),
                new_challenge("Frontend", Vec::new()),
            )
            .await
            .expect_err("unknown id");
        assert!(matches!(error, ApplicationError::ChallengeNotRegistered { .. }));
    }

    #[tokio::test]
    async fn register_reviewer_bounds_the_id_to_what_tokens_can_carry() {
        let harness = harness();
        let request = |id: String| NewReviewer {
            id: ReviewerId(id),
            name: "Ada".to_string(),
            github_alias: "ada".to_string(),
            challenge_name: "Backend".to_string(),
            technologies: "go".to_string(),
        };

        let longest = "U".repeat(MAX_REVIEWER_ID_LEN);
        let reviewer = harness.service.register_reviewer(request(longest)).await.expect("at bound");
        let view = harness
            .service
            .show_schedule(&reviewer.id, WeekYear::new(53, 2020).expect("week"))
            .await
            .expect("schedule");
        for slot in &view.slots {
            let info = ScheduleActionInfo {
                reviewer_id: reviewer.id.clone(),
                slot_id: slot.id,
                week: view.week,
            };
            harness.service.codec().encode(&info).expect("every slot encodes");
        }

        let error = harness
            .service
            .register_reviewer(request("U".repeat(MAX_REVIEWER_ID_LEN + 1)))
            .await
            .expect_err("over bound");
        assert!(matches!(error, ApplicationError::Domain(DomainError::InvariantViolation(_))));
    }

    #[tokio::test]
    async fn register_reviewer_requires_an_existing_challenge() {
        let harness = harness();
        let error = harness
            .service
            .register_reviewer(NewReviewer {
                id: ReviewerId("U1".to_string()),
                name: "Ada".to_string(),
                github_alias: "ada".to_string(),
                challenge_name: "Mobile".to_string(),
                technologies: "kotlin".to_string(),
            })
            .await
            .expect_err("unknown challenge");
        assert!(matches!(error, ApplicationError::ChallengeNotRegistered { .. }));
    }

    #[tokio::test]
    async fn re_registering_keeps_the_schedule() {
        let harness = harness();
        let request = NewReviewer {
            id: ReviewerId("U1".to_string()),
            name: "Ada".to_string(),
            github_alias: "ada".to_string(),
            challenge_name: "Backend".to_string(),
            technologies: "Go".to_string(),
        };
        let created = harness.service.register_reviewer(request.clone()).await.expect("create");
        assert_eq!(created.version, 1);

        let week = WeekYear::new(17, 2024).expect("week");
        let slot_id = SlotId::new(ReviewDay::Monday, 10).expect("slot");
        harness
            .service
            .update_reviewer_availability(
                &created,
                SlotReference { slot_id, week, available: true },
            )
            .await
            .expect("availability");

        let updated = harness
            .service
            .register_reviewer(NewReviewer { technologies: "go rust".to_string(), ..request })
            .await
            .expect("update");
        assert_eq!(updated.version, 3);
        assert!(updated.has_technology("rust"));
        assert!(updated.slot_state(week, slot_id).available);
    }

    #[tokio::test]
    async fn stale_reviewer_writes_are_rejected() {
        let harness = harness();
        harness.reviewers.insert(reviewer("U1", "Ada", "Backend", "go"));
        let stale = harness.reviewers.get("U1").expect("reviewer");
        let week = WeekYear::new(17, 2024).expect("week");
        let monday = SlotId::new(ReviewDay::Monday, 10).expect("slot");
        let tuesday = SlotId::new(ReviewDay::Tuesday, 10).expect("slot");

        harness
            .service
            .update_reviewer_availability(
                &stale,
                SlotReference { slot_id: monday, week, available: true },
            )
            .await
            .expect("first write");
        let error = harness
            .service
            .update_reviewer_availability(
                &stale,
                SlotReference { slot_id: tuesday, week, available: true },
            )
            .await
            .expect_err("stale write");

        assert!(matches!(
            error,
            ApplicationError::Persistence(PersistenceError::VersionConflict {
                expected: 1,
                actual: Some(2),
                ..
            })
        ));
        let stored = harness.reviewers.get("U1").expect("reviewer");
        assert!(stored.slot_state(week, monday).available);
        assert!(!stored.slot_state(week, tuesday).available);
    }
}
