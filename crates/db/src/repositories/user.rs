use chrono::{DateTime, Utc};
use sqlx::Row;

use stijnbot_core::domain::user::{UserId, UserRecord};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<UserRecord, RepositoryError> {
    let id: String = decode(row, "id")?;
    let name: Option<String> = decode(row, "name")?;
    let blij: Option<i64> = decode(row, "blij")?;
    let last_survey_at: Option<String> = decode(row, "last_survey_at")?;

    let blij = match blij {
        None => None,
        Some(0) => Some(false),
        Some(1) => Some(true),
        Some(other) => {
            return Err(RepositoryError::Decode(format!("invalid blij value {other} for {id}")))
        }
    };
    let last_survey_at = last_survey_at
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| RepositoryError::Decode(format!("last_survey_at for {id}: {e}")))
        })
        .transpose()?;

    Ok(UserRecord { id: UserId(id), name, blij, last_survey_at })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, blij, last_survey_at FROM user_record WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: UserRecord) -> Result<UserId, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO user_record (id, name, blij, last_survey_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 blij = excluded.blij,
                 last_survey_at = excluded.last_survey_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.id.0)
        .bind(&record.name)
        .bind(record.blij.map(i64::from))
        .bind(record.last_survey_at.map(|dt| dt.to_rfc3339()))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    async fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query("SELECT id, name, blij, last_survey_at FROM user_record ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()
    }
}
