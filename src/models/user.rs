use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use teloxide::types::ChatId;

use crate::database::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Имя для отображения: "Имя Фамилия" либо заглушка.
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            "Неизвестный".to_string()
        } else {
            name.to_string()
        }
    }

    pub fn handle(&self) -> String {
        self.username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_default()
    }

    /// Идемпотентный upsert по telegram_id: вызывается на каждое входящее событие.
    pub async fn upsert(
        db: &Database,
        telegram_id: ChatId,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (telegram_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            "#,
        )
        .bind(telegram_id.0)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .execute(&db.pool)
        .await?;
        Ok(())
    }

    pub async fn get(db: &Database, telegram_id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(&db.pool)
            .await
    }

    /// Последние зарегистрированные пользователи (для админ-панели).
    pub async fn recent(db: &Database, limit: i64) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&db.pool)
            .await
    }

    /// Все telegram_id для рассылки.
    pub async fn all_ids(db: &Database) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT telegram_id FROM users ORDER BY telegram_id")
            .fetch_all(&db.pool)
            .await
    }

    pub async fn count(db: &Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&db.pool)
            .await
    }
}
