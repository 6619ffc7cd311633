use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                telegram_id BIGINT PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                phone TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS services (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                price BIGINT NOT NULL DEFAULT 0,
                duration INTEGER NOT NULL DEFAULT 60,
                active BOOLEAN NOT NULL DEFAULT true
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                service_id BIGINT,
                service_name TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                comment TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                items TEXT NOT NULL,
                total BIGINT NOT NULL DEFAULT 0,
                address TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                comment TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS requests (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                type TEXT NOT NULL DEFAULT 'general',
                message TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_user_id ON bookings (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings (status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_status ON requests (status)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_services_active ON services (active)")
            .execute(&self.pool)
            .await?;

        self.seed_demo_services().await?;

        Ok(())
    }

    /// Демо-каталог услуг при первом запуске. Одна транзакция,
    /// выполняется только если каталог пуст.
    async fn seed_demo_services(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;

        if count > 0 {
            return Ok(());
        }

        let demo: [(&str, &str, i64, i32); 5] = [
            ("Стрижка мужская", "Классическая мужская стрижка", 1500, 45),
            ("Стрижка женская", "Стрижка + укладка", 2500, 60),
            ("Окрашивание", "Окрашивание волос любой сложности", 4000, 120),
            ("Маникюр", "Маникюр с покрытием гель-лак", 2000, 90),
            ("Консультация", "Бесплатная консультация по услугам", 0, 30),
        ];

        let mut tx = self.pool.begin().await?;
        for (name, description, price, duration) in demo {
            sqlx::query(
                "INSERT INTO services (name, description, price, duration) VALUES ($1, $2, $3, $4)",
            )
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(duration)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        log::info!("🌱 Seeded {} demo services", demo.len());
        Ok(())
    }
}
