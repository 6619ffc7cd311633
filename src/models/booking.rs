use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    /// NULL, если услуга была удалена после записи.
    pub service_id: Option<i64>,
    /// Снимок названия на момент записи; переживает удаление услуги.
    pub service_name: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    New,
    Confirmed,
    Done,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Done => "done",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "done" => BookingStatus::Done,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::New,
        }
    }

    /// Статус с эмодзи для списков.
    pub fn badge(&self) -> &'static str {
        match self {
            BookingStatus::New => "🟡 Новая",
            BookingStatus::Confirmed => "🟢 Подтверждена",
            BookingStatus::Done => "✅ Выполнена",
            BookingStatus::Cancelled => "🔴 Отменена",
        }
    }
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::from_str(&self.status)
    }

    pub async fn create(
        db: &Database,
        user_id: i64,
        service_id: Option<i64>,
        service_name: &str,
        date: &str,
        time: &str,
        comment: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bookings (user_id, service_id, service_name, date, time, comment, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'new')
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(service_id)
        .bind(service_name)
        .bind(date)
        .bind(time)
        .bind(comment)
        .fetch_one(&db.pool)
        .await
    }

    pub async fn get_by_id(db: &Database, id: i64) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    /// Записи пользователя, свежие сверху.
    pub async fn get_by_user(
        db: &Database,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&db.pool)
        .await
    }

    /// Записи в заданном статусе для админ-панели, свежие сверху.
    pub async fn get_by_status(
        db: &Database,
        status: BookingStatus,
        limit: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&db.pool)
        .await
    }

    /// Безусловная перезапись статуса: порядок переходов не проверяется.
    pub async fn update_status(
        db: &Database,
        id: i64,
        status: BookingStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    pub async fn count(db: &Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(&db.pool)
            .await
    }

    pub async fn count_by_status(
        db: &Database,
        status: BookingStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE status = $1")
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
            BookingStatus::New,
            BookingStatus::Confirmed,
            BookingStatus::Done,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::from_str(s.as_str()), s);
        }
    }

    #[test]
    fn unknown_status_maps_to_new() {
        assert_eq!(BookingStatus::from_str("garbage"), BookingStatus::New);
        assert_eq!(BookingStatus::from_str(""), BookingStatus::New);
    }
}
