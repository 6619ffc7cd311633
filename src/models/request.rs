use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    New,
    Done,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "done" => RequestStatus::Done,
            _ => RequestStatus::New,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            RequestStatus::New => "🟡 Новая",
            RequestStatus::Done => "✅ Выполнена",
        }
    }
}

impl Request {
    pub fn status(&self) -> RequestStatus {
        RequestStatus::from_str(&self.status)
    }

    pub async fn create(
        db: &Database,
        user_id: i64,
        kind: &str,
        message: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO requests (user_id, type, message, status)
            VALUES ($1, $2, $3, 'new')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn get_by_id(db: &Database, id: i64) -> Result<Option<Request>, sqlx::Error> {
        sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    /// Заявки с фильтром по статусу (None = все), свежие сверху.
    pub async fn list(
        db: &Database,
        status: Option<RequestStatus>,
        limit: i64,
    ) -> Result<Vec<Request>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Request>(
                    "SELECT * FROM requests WHERE status = $1 ORDER BY created_at DESC LIMIT $2",
                )
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&db.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Request>(
                    "SELECT * FROM requests ORDER BY created_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&db.pool)
                .await
            }
        }
    }

    pub async fn update_status(
        db: &Database,
        id: i64,
        status: RequestStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE requests SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    pub async fn count(db: &Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM requests")
            .fetch_one(&db.pool)
            .await
    }

    pub async fn count_by_status(
        db: &Database,
        status: RequestStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM requests WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&db.pool)
            .await
    }
}
