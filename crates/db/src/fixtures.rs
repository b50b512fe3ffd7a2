use sqlx::Executor;

use reviewdesk_core::domain::reviewer::ReviewerId;
use reviewdesk_core::domain::week::WeekYear;

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlReviewerRepository};

/// Week every demo reviewer has slots in.
pub const DEMO_WEEK: &str = "2026-W03";

const SEED_CHALLENGES: &[SeedChallengeContract] = &[
    SeedChallengeContract {
        id: "CH-demo-backend",
        name: "Backend",
        review_hours: &[9, 10, 11, 13, 14, 15, 16],
    },
    SeedChallengeContract { id: "CH-demo-frontend", name: "Frontend", review_hours: &[10, 14] },
];

const SEED_REVIEWERS: &[SeedReviewerContract] = &[
    SeedReviewerContract {
        id: "U-DEMO-ADA",
        name: "Ada",
        challenge_name: "Backend",
        available_slots: 3,
        booked_slots: 1,
        description: "Backend reviewer with one booked afternoon slot",
    },
    SeedReviewerContract {
        id: "U-DEMO-GRACE",
        name: "Grace",
        challenge_name: "Backend",
        available_slots: 2,
        booked_slots: 0,
        description: "Backend python reviewer, mornings only",
    },
    SeedReviewerContract {
        id: "U-DEMO-LINUS",
        name: "Linus",
        challenge_name: "Frontend",
        available_slots: 1,
        booked_slots: 0,
        description: "Frontend reviewer with a single Thursday slot",
    },
];

/// Deterministic demo dataset: two challenges and three reviewers with
/// availability in [`DEMO_WEEK`].
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let reviewers_seeded = SEED_REVIEWERS
            .iter()
            .map(|reviewer| ReviewerSeedInfo {
                reviewer_id: reviewer.id,
                challenge_name: reviewer.challenge_name,
                description: reviewer.description,
            })
            .collect();

        Ok(SeedResult {
            challenges_seeded: SEED_CHALLENGES.iter().map(|challenge| challenge.name).collect(),
            reviewers_seeded,
        })
    }

    /// Checks that every seeded row exists and that stored schedules still
    /// decode into the expected slot counts.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for challenge in SEED_CHALLENGES {
            let hours: Option<String> = sqlx::query_scalar(
                "SELECT review_hours_json FROM challenge WHERE id = ?1 AND name = ?2",
            )
            .bind(challenge.id)
            .bind(challenge.name)
            .fetch_optional(pool)
            .await?;
            let hours_match = match hours {
                Some(json) => {
                    let parsed: Vec<u8> = serde_json::from_str(&json)
                        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
                    parsed == challenge.review_hours
                }
                None => false,
            };
            checks.push((challenge.id, hours_match));
        }

        let week = WeekYear::from_token(DEMO_WEEK)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let repository = SqlReviewerRepository::new(pool.clone());
        for expected in SEED_REVIEWERS {
            let stored = repository.fetch(&ReviewerId(expected.id.to_string())).await?;
            let matches = stored.is_some_and(|reviewer| {
                let slots = reviewer.schedule.week(week);
                let available =
                    slots.map_or(0, |slots| slots.values().filter(|state| state.available).count());
                let booked =
                    slots.map_or(0, |slots| slots.values().filter(|state| state.booked).count());
                reviewer.name == expected.name
                    && reviewer.challenge_name == expected.challenge_name
                    && available == expected.available_slots
                    && booked == expected.booked_slots
            });
            checks.push((expected.id, matches));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let reviewer_ids = sql_array_from_ids(SEED_REVIEWERS.iter().map(|reviewer| reviewer.id));
        let challenge_ids =
            sql_array_from_ids(SEED_CHALLENGES.iter().map(|challenge| challenge.id));

        sqlx::query(&format!("DELETE FROM reviewer WHERE id IN {reviewer_ids}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM challenge WHERE id IN {challenge_ids}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedChallengeContract {
    id: &'static str,
    name: &'static str,
    review_hours: &'static [u8],
}

#[derive(Debug, Clone, Copy)]
struct SeedReviewerContract {
    id: &'static str,
    name: &'static str,
    challenge_name: &'static str,
    available_slots: usize,
    booked_slots: usize,
    description: &'static str,
}

fn sql_array_from_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let quoted = ids.map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub challenges_seeded: Vec<&'static str>,
    pub reviewers_seeded: Vec<ReviewerSeedInfo>,
}

#[derive(Debug)]
pub struct ReviewerSeedInfo {
    pub reviewer_id: &'static str,
    pub challenge_name: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_mentions_every_seeded_id() {
        for challenge in SEED_CHALLENGES {
            assert!(DemoSeedDataset::SQL.contains(&format!("'{}'", challenge.id)));
        }
        for reviewer in SEED_REVIEWERS {
            assert!(DemoSeedDataset::SQL.contains(&format!("'{}'", reviewer.id)));
        }
        assert!(DemoSeedDataset::SQL.contains(DEMO_WEEK));
    }

    #[tokio::test]
    async fn load_verify_and_reload_is_idempotent() {
        let pool = setup().await;

        let first = DemoSeedDataset::load(&pool).await.expect("load");
        assert_eq!(first.challenges_seeded, vec!["Backend", "Frontend"]);
        assert_eq!(first.reviewers_seeded.len(), 3);

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);

        DemoSeedDataset::load(&pool).await.expect("reload");
        let reviewers: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM reviewer")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(reviewers, 3);
    }

    #[tokio::test]
    async fn verify_detects_drifted_schedules() {
        let pool = setup().await;
        DemoSeedDataset::load(&pool).await.expect("load");
        sqlx::query("UPDATE reviewer SET schedule_json = '{}' WHERE id = 'U-DEMO-GRACE'")
            .execute(&pool)
            .await
            .expect("drift");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.contains(&("U-DEMO-GRACE", false)));
        assert!(verification.checks.contains(&("U-DEMO-ADA", true)));
    }

    #[tokio::test]
    async fn clean_removes_the_dataset() {
        let pool = setup().await;
        DemoSeedDataset::load(&pool).await.expect("load");
        DemoSeedDataset::clean(&pool).await.expect("clean");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.checks.iter().all(|(_, present)| !present));
    }
}
