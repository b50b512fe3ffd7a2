use std::collections::BTreeSet;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use reviewdesk_core::domain::reviewer::{Reviewer, ReviewerId, WeeklySchedule};
use reviewdesk_core::errors::PersistenceError;
use reviewdesk_core::scheduling::ReviewerStore;

use super::{decode_error, parse_timestamp, RepositoryError};
use crate::DbPool;

const REVIEWER_COLUMNS: &str = "id, name, github_alias, challenge_name, technologies_json,
                                schedule_json, version, created_at, updated_at";

pub struct SqlReviewerRepository {
    pool: DbPool,
}

impl SqlReviewerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn fetch(&self, id: &ReviewerId) -> Result<Option<Reviewer>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {REVIEWER_COLUMNS} FROM reviewer WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_reviewer).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<Reviewer>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEWER_COLUMNS} FROM reviewer ORDER BY name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reviewer).collect()
    }

    async fn current_version(&self, id: &ReviewerId) -> Result<Option<u64>, RepositoryError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM reviewer WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        version.map(to_version).transpose()
    }

    async fn store(&self, reviewer: &Reviewer) -> Result<Reviewer, RepositoryError> {
        let technologies_json =
            serde_json::to_string(&reviewer.technologies).map_err(decode_error)?;
        let schedule_json = serde_json::to_string(&reviewer.schedule).map_err(decode_error)?;

        let result = if reviewer.version == 0 {
            sqlx::query(
                "INSERT INTO reviewer (id, name, github_alias, challenge_name, technologies_json,
                                       schedule_json, version, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
                 ON CONFLICT(id) DO NOTHING",
            )
            .bind(&reviewer.id.0)
            .bind(&reviewer.name)
            .bind(&reviewer.github_alias)
            .bind(&reviewer.challenge_name)
            .bind(&technologies_json)
            .bind(&schedule_json)
            .bind(reviewer.created_at.to_rfc3339())
            .bind(reviewer.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await?
        } else {
            let expected = i64::try_from(reviewer.version).map_err(decode_error)?;
            sqlx::query(
                "UPDATE reviewer
                 SET name = ?, github_alias = ?, challenge_name = ?, technologies_json = ?,
                     schedule_json = ?, version = version + 1, updated_at = ?
                 WHERE id = ? AND version = ?",
            )
            .bind(&reviewer.name)
            .bind(&reviewer.github_alias)
            .bind(&reviewer.challenge_name)
            .bind(&technologies_json)
            .bind(&schedule_json)
            .bind(reviewer.updated_at.to_rfc3339())
            .bind(&reviewer.id.0)
            .bind(expected)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                key: reviewer.id.0.clone(),
                expected: reviewer.version,
                actual: self.current_version(&reviewer.id).await?,
            });
        }

        let mut stored = reviewer.clone();
        stored.version += 1;
        Ok(stored)
    }
}

fn to_version(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| RepositoryError::Decode(format!("negative version {value}")))
}

fn row_to_reviewer(row: &SqliteRow) -> Result<Reviewer, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let name: String = row.try_get("name").map_err(decode_error)?;
    let github_alias: String = row.try_get("github_alias").map_err(decode_error)?;
    let challenge_name: String = row.try_get("challenge_name").map_err(decode_error)?;
    let technologies_json: String = row.try_get("technologies_json").map_err(decode_error)?;
    let schedule_json: String = row.try_get("schedule_json").map_err(decode_error)?;
    let version: i64 = row.try_get("version").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    let technologies: BTreeSet<String> = serde_json::from_str(&technologies_json)
        .map_err(|error| RepositoryError::Decode(format!("reviewer `{id}` technologies: {error}")))?;
    let schedule: WeeklySchedule = serde_json::from_str(&schedule_json)
        .map_err(|error| RepositoryError::Decode(format!("reviewer `{id}` schedule: {error}")))?;

    Ok(Reviewer {
        id: ReviewerId(id),
        name,
        github_alias,
        challenge_name,
        technologies,
        schedule,
        version: to_version(version)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl ReviewerStore for SqlReviewerRepository {
    async fn find_by_id(&self, id: &ReviewerId) -> Result<Option<Reviewer>, PersistenceError> {
        Ok(self.fetch(id).await?)
    }

    async fn list_all(&self) -> Result<Vec<Reviewer>, PersistenceError> {
        Ok(self.fetch_all().await?)
    }

    async fn save(&self, reviewer: &Reviewer) -> Result<Reviewer, PersistenceError> {
        Ok(self.store(reviewer).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use reviewdesk_core::domain::reviewer::{parse_technologies, Reviewer, ReviewerId};
    use reviewdesk_core::domain::slot::{ReviewDay, SlotBooking, SlotId, SlotReference};
    use reviewdesk_core::domain::week::WeekYear;
    use reviewdesk_core::errors::PersistenceError;
    use reviewdesk_core::scheduling::ReviewerStore;

    use super::SqlReviewerRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_reviewer(id: &str, name: &str) -> Reviewer {
        let now = Utc::now();
        Reviewer {
            id: ReviewerId(id.to_string()),
            name: name.to_string(),
            github_alias: name.to_ascii_lowercase(),
            challenge_name: "Backend".to_string(),
            technologies: parse_technologies("go rust"),
            schedule: Default::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_by_id_round_trips_the_schedule() {
        let repo = SqlReviewerRepository::new(setup().await);
        let week = WeekYear::new(17, 2024).expect("week");
        let slot_id = SlotId::new(ReviewDay::Monday, 10).expect("slot");
        let mut reviewer = sample_reviewer("U1", "Ada");
        reviewer.set_availability(&SlotReference { slot_id, week, available: true });
        reviewer.set_booking(&SlotBooking { slot_id, week, is_booked: true });

        let stored = repo.save(&reviewer).await.expect("save");
        assert_eq!(stored.version, 1);

        let found = repo
            .find_by_id(&ReviewerId("U1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.version, 1);
        assert_eq!(found.schedule, reviewer.schedule);
        assert_eq!(found.technologies, reviewer.technologies);
        assert!(found.slot_state(week, slot_id).booked);
    }

    #[tokio::test]
    async fn missing_reviewer_is_none() {
        let repo = SqlReviewerRepository::new(setup().await);
        let found = repo.find_by_id(&ReviewerId("U404".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn updates_bump_the_version() {
        let repo = SqlReviewerRepository::new(setup().await);
        let stored = repo.save(&sample_reviewer("U1", "Ada")).await.expect("insert");

        let mut renamed = stored.clone();
        renamed.name = "Ada L.".to_string();
        let updated = repo.save(&renamed).await.expect("update");
        assert_eq!(updated.version, 2);

        let found = repo.find_by_id(&stored.id).await.expect("find").expect("exists");
        assert_eq!(found.name, "Ada L.");
        assert_eq!(found.version, 2);
    }

    #[tokio::test]
    async fn stale_updates_report_a_version_conflict() {
        let repo = SqlReviewerRepository::new(setup().await);
        let stored = repo.save(&sample_reviewer("U1", "Ada")).await.expect("insert");
        repo.save(&stored).await.expect("first update");

        let error = repo.save(&stored).await.expect_err("stale update");
        assert_eq!(
            error,
            PersistenceError::VersionConflict {
                key: "U1".to_string(),
                expected: 1,
                actual: Some(2),
            }
        );
    }

    #[tokio::test]
    async fn duplicate_inserts_report_a_version_conflict() {
        let repo = SqlReviewerRepository::new(setup().await);
        repo.save(&sample_reviewer("U1", "Ada")).await.expect("insert");

        let error = repo.save(&sample_reviewer("U1", "Imposter")).await.expect_err("duplicate");
        assert!(matches!(
            error,
            PersistenceError::VersionConflict { expected: 0, actual: Some(1), .. }
        ));
    }

    #[tokio::test]
    async fn list_all_orders_by_name() {
        let repo = SqlReviewerRepository::new(setup().await);
        repo.save(&sample_reviewer("U2", "Zed")).await.expect("save zed");
        repo.save(&sample_reviewer("U1", "Ada")).await.expect("save ada");

        let names = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|reviewer| reviewer.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Ada".to_string(), "Zed".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_schedule_documents_are_decode_errors() {
        let pool = setup().await;
        let repo = SqlReviewerRepository::new(pool.clone());
        repo.save(&sample_reviewer("U1", "Ada")).await.expect("insert");
        sqlx::query("UPDATE reviewer SET schedule_json = '{\"2024-W99\":{}}' WHERE id = 'U1'")
            .execute(&pool)
            .await
            .expect("corrupt");

        let error = repo.find_by_id(&ReviewerId("U1".to_string())).await.expect_err("decode");
        assert!(matches!(error, PersistenceError::Decode(_)));
    }
}
