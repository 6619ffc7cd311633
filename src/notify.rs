//! Уведомления: единичная best-effort доставка и массовая рассылка.
//!
//! Ошибка доставки никогда не распространяется на действие, которое её
//! вызвало: статус в базе — факт, уведомление — лишь сигнал. На местах
//! вызова результат отбрасывается явно (`let _ = ...`).

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, ParseMode};

/// Минимальный исходящий канал. Отдельный трейт, чтобы логика рассылки
/// тестировалась без Telegram.
pub trait Outbound {
    fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), teloxide::RequestError>> + Send;
}

impl Outbound for Bot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), teloxide::RequestError> {
        self.send_message(chat_id, text).await?;
        Ok(())
    }
}

/// Единичное уведомление (MarkdownV2, опционально с кнопками).
/// Ошибка логируется и возвращается; вызывающий её отбрасывает.
pub async fn notify(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<(), teloxide::RequestError> {
    let mut req = bot.send_message(chat_id, text).parse_mode(ParseMode::MarkdownV2);
    if let Some(markup) = markup {
        req = req.reply_markup(markup);
    }
    if let Err(e) = req.await {
        log::error!("Notify to {} failed: {}", chat_id, e);
        return Err(e);
    }
    Ok(())
}

/// Итог рассылки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: u32,
    pub failed: u32,
}

/// Массовая рассылка по всем известным пользователям. Каждая доставка
/// независима: сбой на одном получателе не прерывает остальных.
/// Никогда не возвращает ошибку — только счётчики.
pub async fn broadcast<O: Outbound>(out: &O, recipients: &[i64], text: &str) -> BroadcastReport {
    let mut sent = 0u32;
    let mut failed = 0u32;

    for &id in recipients {
        match out.send_text(ChatId(id), text).await {
            Ok(()) => sent += 1,
            Err(e) => {
                log::warn!("Broadcast to {} failed: {}", id, e);
                failed += 1;
            }
        }
    }

    log::info!("📣 Broadcast done: {} sent, {} failed", sent, failed);
    BroadcastReport { sent, failed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Канал-заглушка: падает на заданных получателях, запоминает доставки.
    struct FlakyOutbound {
        failing: HashSet<i64>,
        delivered: Mutex<Vec<i64>>,
    }

    impl FlakyOutbound {
        fn new(failing: impl IntoIterator<Item = i64>) -> Self {
            Self {
                failing: failing.into_iter().collect(),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    impl Outbound for FlakyOutbound {
        async fn send_text(
            &self,
            chat_id: ChatId,
            _text: &str,
        ) -> Result<(), teloxide::RequestError> {
            if self.failing.contains(&chat_id.0) {
                return Err(teloxide::RequestError::RetryAfter(
                    teloxide::types::Seconds::from_seconds(1),
                ));
            }
            self.delivered.lock().unwrap().push(chat_id.0);
            Ok(())
        }
    }

    #[tokio::test]
    async fn broadcast_tallies_successes_and_failures() {
        let out = FlakyOutbound::new([2, 4]);
        let report = broadcast(&out, &[1, 2, 3, 4, 5], "привет").await;

        assert_eq!(report, BroadcastReport { sent: 3, failed: 2 });
        // сбой на 2 не помешал доставке 3 и 5
        assert_eq!(*out.delivered.lock().unwrap(), vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn broadcast_with_all_failures_still_returns() {
        let out = FlakyOutbound::new([1, 2]);
        let report = broadcast(&out, &[1, 2], "текст").await;
        assert_eq!(report, BroadcastReport { sent: 0, failed: 2 });
    }

    #[tokio::test]
    async fn broadcast_to_nobody() {
        let out = FlakyOutbound::new([]);
        let report = broadcast(&out, &[], "текст").await;
        assert_eq!(report, BroadcastReport { sent: 0, failed: 0 });
    }
}
