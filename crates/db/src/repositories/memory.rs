use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use reviewdesk_core::domain::challenge::{Challenge, ChallengeId};
use reviewdesk_core::domain::reviewer::{Reviewer, ReviewerId};
use reviewdesk_core::errors::PersistenceError;
use reviewdesk_core::scheduling::{ChallengeStore, ReviewerStore};

/// Reviewer store kept in process memory, with the same version check as the
/// SQL store. Writes can be switched off to exercise failure paths.
#[derive(Default)]
pub struct InMemoryReviewerStore {
    reviewers: RwLock<HashMap<String, Reviewer>>,
    fail_writes: AtomicBool,
}

impl InMemoryReviewerStore {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ReviewerStore for InMemoryReviewerStore {
    async fn find_by_id(&self, id: &ReviewerId) -> Result<Option<Reviewer>, PersistenceError> {
        let reviewers = self.reviewers.read().await;
        Ok(reviewers.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Reviewer>, PersistenceError> {
        let reviewers = self.reviewers.read().await;
        let mut all = reviewers.values().cloned().collect::<Vec<_>>();
        all.sort_by(|left, right| left.name.cmp(&right.name).then_with(|| left.id.cmp(&right.id)));
        Ok(all)
    }

    async fn save(&self, reviewer: &Reviewer) -> Result<Reviewer, PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("in-memory writes are disabled".to_string()));
        }

        let mut reviewers = self.reviewers.write().await;
        let actual = reviewers.get(&reviewer.id.0).map(|stored| stored.version);
        if actual.unwrap_or(0) != reviewer.version {
            return Err(PersistenceError::VersionConflict {
                key: reviewer.id.0.clone(),
                expected: reviewer.version,
                actual,
            });
        }

        let mut stored = reviewer.clone();
        stored.version += 1;
        reviewers.insert(stored.id.0.clone(), stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub struct InMemoryChallengeStore {
    challenges: RwLock<HashMap<String, Challenge>>,
}

#[async_trait::async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn find_by_id(&self, id: &ChallengeId) -> Result<Option<Challenge>, PersistenceError> {
        let challenges = self.challenges.read().await;
        Ok(challenges.get(&id.0).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Challenge>, PersistenceError> {
        let challenges = self.challenges.read().await;
        Ok(challenges.values().find(|challenge| challenge.name == name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Challenge>, PersistenceError> {
        let challenges = self.challenges.read().await;
        let mut all = challenges.values().cloned().collect::<Vec<_>>();
        all.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(all)
    }

    async fn save(&self, challenge: &Challenge) -> Result<Challenge, PersistenceError> {
        let mut challenges = self.challenges.write().await;
        let duplicate = challenges
            .values()
            .any(|existing| existing.name == challenge.name && existing.id != challenge.id);
        if duplicate {
            return Err(PersistenceError::Unavailable(format!(
                "challenge name `{}` is already taken",
                challenge.name
            )));
        }
        challenges.insert(challenge.id.0.clone(), challenge.clone());
        Ok(challenge.clone())
    }
}
