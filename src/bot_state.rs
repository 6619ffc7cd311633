use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::database::Database;
use crate::flows::Session;

type SessionMap = Arc<RwLock<HashMap<ChatId, Session>>>;

/// Общее состояние бота: база, конфигурация и карта диалоговых сессий.
/// Сессии держим только в памяти — рестарт обрывает незавершённые диалоги,
/// это допустимо.
#[derive(Clone)]
pub struct BotState {
    pub db: Database,
    pub config: Arc<Config>,
    sessions: SessionMap,
}

impl BotState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Единственное правило авторизации: совпадение с ADMIN_ID.
    pub fn is_admin(&self, chat_id: ChatId) -> bool {
        chat_id == self.config.admin_id
    }

    /// Копия сессии пользователя (пустая, если диалога нет).
    pub async fn session(&self, chat_id: ChatId) -> Session {
        let sessions = self.sessions.read().await;
        sessions.get(&chat_id).cloned().unwrap_or_default()
    }

    pub async fn put_session(&self, chat_id: ChatId, session: Session) {
        let mut sessions = self.sessions.write().await;
        if session.is_idle() {
            // не копим пустые записи
            sessions.remove(&chat_id);
        } else {
            sessions.insert(chat_id, session);
        }
    }

    pub async fn clear_session(&self, chat_id: ChatId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::Step;

    fn test_state() -> BotState {
        // Пул лениво подключается, для тестов карты сессий БД не нужна.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        BotState::new(
            Database { pool },
            Config {
                admin_id: ChatId(42),
                business_name: "Тест".into(),
                database_url: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let state = test_state();
        let a = ChatId(1);
        let b = ChatId(2);

        let mut session = state.session(a).await;
        session.start_request();
        state.put_session(a, session).await;

        assert_eq!(state.session(a).await.step, Some(Step::RequestMessage));
        assert!(state.session(b).await.is_idle());
    }

    #[tokio::test]
    async fn idle_session_is_dropped_from_map() {
        let state = test_state();
        let a = ChatId(1);

        let mut session = state.session(a).await;
        session.start_order();
        state.put_session(a, session.clone()).await;

        session.reset();
        state.put_session(a, session).await;
        assert!(state.session(a).await.is_idle());
    }

    #[tokio::test]
    async fn admin_check_is_equality_on_configured_id() {
        let state = test_state();
        assert!(state.is_admin(ChatId(42)));
        assert!(!state.is_admin(ChatId(43)));
    }
}
