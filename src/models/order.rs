use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Свободное описание заказа.
    pub items: String,
    /// Сумма пока не считается, всегда 0.
    pub total: i64,
    pub address: String,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    New,
    Processing,
    Done,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Processing => "processing",
            OrderStatus::Done => "done",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "processing" => OrderStatus::Processing,
            "done" => OrderStatus::Done,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::New,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            OrderStatus::New => "🟡 Новый",
            OrderStatus::Processing => "🔵 В работе",
            OrderStatus::Done => "✅ Выполнен",
            OrderStatus::Cancelled => "🔴 Отменён",
        }
    }
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::from_str(&self.status)
    }

    pub async fn create(
        db: &Database,
        user_id: i64,
        items: &str,
        total: i64,
        address: &str,
        comment: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO orders (user_id, items, total, address, comment, status)
            VALUES ($1, $2, $3, $4, $5, 'new')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(items)
        .bind(total)
        .bind(address)
        .bind(comment)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn get_by_id(db: &Database, id: i64) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn get_by_status(
        db: &Database,
        status: OrderStatus,
        limit: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE status = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn update_status(
        db: &Database,
        id: i64,
        status: OrderStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    pub async fn count(db: &Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&db.pool)
            .await
    }

    pub async fn count_by_status(db: &Database, status: OrderStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&db.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Done,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(s.as_str()), s);
        }
    }
}
