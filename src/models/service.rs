use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;
use crate::flows::{parse_duration, parse_price};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Цена в рублях, 0 = бесплатно.
    pub price: i64,
    /// Продолжительность в минутах.
    pub duration: i32,
    pub active: bool,
}

/// Редактируемое поле услуги. Параметр callback-кнопки в админ-панели.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceField {
    Name,
    Description,
    Price,
    Duration,
}

impl ServiceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceField::Name => "name",
            ServiceField::Description => "description",
            ServiceField::Price => "price",
            ServiceField::Duration => "duration",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(ServiceField::Name),
            "description" => Some(ServiceField::Description),
            "price" => Some(ServiceField::Price),
            "duration" => Some(ServiceField::Duration),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ServiceField::Name => "название",
            ServiceField::Description => "описание",
            ServiceField::Price => "цену",
            ServiceField::Duration => "длительность",
        }
    }
}

impl Service {
    /// Активные услуги — то, что видят клиенты.
    pub async fn get_active(db: &Database) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE active = true ORDER BY id")
            .fetch_all(&db.pool)
            .await
    }

    /// Все услуги, включая неактивные (админ-панель).
    pub async fn get_all(db: &Database) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY id")
            .fetch_all(&db.pool)
            .await
    }

    pub async fn get_by_id(db: &Database, id: i64) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    pub async fn create(
        db: &Database,
        name: &str,
        description: Option<&str>,
        price: i64,
        duration: i32,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO services (name, description, price, duration, active)
            VALUES ($1, $2, $3, $4, true)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration)
        .fetch_one(&db.pool)
        .await
    }

    /// Обновление одного поля. Числовые значения проходят ту же мягкую
    /// коэрцию, что и при создании услуги.
    pub async fn update_field(
        db: &Database,
        id: i64,
        field: ServiceField,
        value: &str,
    ) -> Result<(), sqlx::Error> {
        match field {
            ServiceField::Name => {
                sqlx::query("UPDATE services SET name = $1 WHERE id = $2")
                    .bind(value)
                    .bind(id)
                    .execute(&db.pool)
                    .await?;
            }
            ServiceField::Description => {
                // "-" — сентинел пустого описания, как и в диалоге создания
                let description = if value.trim() == "-" { None } else { Some(value) };
                sqlx::query("UPDATE services SET description = $1 WHERE id = $2")
                    .bind(description)
                    .bind(id)
                    .execute(&db.pool)
                    .await?;
            }
            ServiceField::Price => {
                sqlx::query("UPDATE services SET price = $1 WHERE id = $2")
                    .bind(parse_price(value))
                    .bind(id)
                    .execute(&db.pool)
                    .await?;
            }
            ServiceField::Duration => {
                sqlx::query("UPDATE services SET duration = $1 WHERE id = $2")
                    .bind(parse_duration(value))
                    .bind(id)
                    .execute(&db.pool)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn set_active(db: &Database, id: i64, active: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE services SET active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    /// Полное удаление. Записи хранят снимок service_name, поэтому
    /// исторические брони переживают удаление услуги.
    pub async fn delete(db: &Database, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE bookings SET service_id = NULL WHERE service_id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?;
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }

    pub async fn count(db: &Database) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
            .fetch_one(&db.pool)
            .await
    }
}
