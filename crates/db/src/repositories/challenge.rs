use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use reviewdesk_core::domain::challenge::{Challenge, ChallengeId};
use reviewdesk_core::errors::PersistenceError;
use reviewdesk_core::scheduling::ChallengeStore;

use super::{decode_error, parse_timestamp, RepositoryError};
use crate::DbPool;

const CHALLENGE_COLUMNS: &str = "id, name, github_owner, github_org, template_repo,
                                 repo_name_format, technologies_json, review_hours_json,
                                 created_by_team_id, created_at, updated_at";

pub struct SqlChallengeRepository {
    pool: DbPool,
}

impl SqlChallengeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Challenge>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {CHALLENGE_COLUMNS} FROM challenge WHERE {column} = ?"))
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_challenge).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<Challenge>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {CHALLENGE_COLUMNS} FROM challenge ORDER BY name ASC"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_challenge).collect()
    }

    async fn upsert(&self, challenge: &Challenge) -> Result<Challenge, RepositoryError> {
        let technologies_json =
            serde_json::to_string(&challenge.technologies).map_err(decode_error)?;
        let review_hours_json =
            serde_json::to_string(&challenge.review_hours).map_err(decode_error)?;

        sqlx::query(
            "INSERT INTO challenge (id, name, github_owner, github_org, template_repo,
                                    repo_name_format, technologies_json, review_hours_json,
                                    created_by_team_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 github_owner = excluded.github_owner,
                 github_org = excluded.github_org,
                 template_repo = excluded.template_repo,
                 repo_name_format = excluded.repo_name_format,
                 technologies_json = excluded.technologies_json,
                 review_hours_json = excluded.review_hours_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&challenge.id.0)
        .bind(&challenge.name)
        .bind(&challenge.github_owner)
        .bind(&challenge.github_org)
        .bind(&challenge.template_repo)
        .bind(&challenge.repo_name_format)
        .bind(&technologies_json)
        .bind(&review_hours_json)
        .bind(&challenge.created_by_team_id)
        .bind(challenge.created_at.to_rfc3339())
        .bind(challenge.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(challenge.clone())
    }
}

fn row_to_challenge(row: &SqliteRow) -> Result<Challenge, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_error)?;
    let technologies_json: String = row.try_get("technologies_json").map_err(decode_error)?;
    let review_hours_json: String = row.try_get("review_hours_json").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_error)?;

    let technologies = serde_json::from_str(&technologies_json).map_err(|error| {
        RepositoryError::Decode(format!("challenge `{id}` technologies: {error}"))
    })?;
    let review_hours = serde_json::from_str(&review_hours_json).map_err(|error| {
        RepositoryError::Decode(format!("challenge `{id}` review hours: {error}"))
    })?;

    Ok(Challenge {
        id: ChallengeId(id),
        name: row.try_get("name").map_err(decode_error)?,
        github_owner: row.try_get("github_owner").map_err(decode_error)?,
        github_org: row.try_get("github_org").map_err(decode_error)?,
        template_repo: row.try_get("template_repo").map_err(decode_error)?,
        repo_name_format: row.try_get("repo_name_format").map_err(decode_error)?,
        technologies,
        review_hours,
        created_by_team_id: row.try_get("created_by_team_id").map_err(decode_error)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl ChallengeStore for SqlChallengeRepository {
    async fn find_by_id(&self, id: &ChallengeId) -> Result<Option<Challenge>, PersistenceError> {
        Ok(self.fetch_where("id", &id.0).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Challenge>, PersistenceError> {
        Ok(self.fetch_where("name", name).await?)
    }

    async fn list_all(&self) -> Result<Vec<Challenge>, PersistenceError> {
        Ok(self.fetch_all().await?)
    }

    async fn save(&self, challenge: &Challenge) -> Result<Challenge, PersistenceError> {
        Ok(self.upsert(challenge).await?)
    }
}
