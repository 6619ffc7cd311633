use std::env;

use teloxide::types::ChatId;

/// Конфигурация бота из переменных окружения (.env поддерживается через dotenvy).
#[derive(Clone, Debug)]
pub struct Config {
    /// Telegram ID администратора. Единственное правило авторизации.
    pub admin_id: ChatId,
    /// Отображаемое название бизнеса в приветствии и контактах.
    pub business_name: String,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let admin_id = env::var("ADMIN_ID")
            .map_err(|_| "ADMIN_ID must be set")?
            .parse::<i64>()
            .map_err(|e| format!("ADMIN_ID must be a number: {}", e))?;

        let business_name = env::var("BUSINESS_NAME").unwrap_or_else(|_| "Демо Бизнес".to_string());

        let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

        Ok(Config {
            admin_id: ChatId(admin_id),
            business_name,
            database_url,
        })
    }
}
