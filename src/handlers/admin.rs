//! Админ-панель: статистика, списки сущностей и переходы статусов.
//!
//! Авторизация — единственная проверка на равенство с ADMIN_ID, выполняется
//! вызывающим до любого действия отсюда. Переходы перезаписывают статус
//! безусловно, без проверки предыдущего (унаследованное поведение).

use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot_state::BotState;
use crate::handlers::utils::{format_duration, format_price, user_label};
use crate::models::{
    Booking, BookingStatus, Order, OrderStatus, Request, RequestStatus, Service, User,
};
use crate::notify;

const BOOKINGS_PAGE: i64 = 15;
const ORDERS_PAGE: i64 = 15;
const REQUESTS_PAGE: i64 = 20;
const USERS_PAGE: i64 = 20;

/// Переход статуса, закодированный в callback-данных админских кнопок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ConfirmBooking(i64),
    CancelBooking(i64),
    DoneBooking(i64),
    ProcessOrder(i64),
    DoneOrder(i64),
    CancelOrder(i64),
    DoneRequest(i64),
}

impl AdminAction {
    pub fn parse(data: &str) -> Option<Self> {
        let (action, id): (fn(i64) -> AdminAction, &str) = if let Some(rest) =
            data.strip_prefix("confirm_")
        {
            (AdminAction::ConfirmBooking, rest)
        } else if let Some(rest) = data.strip_prefix("cancel_booking_") {
            (AdminAction::CancelBooking, rest)
        } else if let Some(rest) = data.strip_prefix("done_booking_") {
            (AdminAction::DoneBooking, rest)
        } else if let Some(rest) = data.strip_prefix("order_process_") {
            (AdminAction::ProcessOrder, rest)
        } else if let Some(rest) = data.strip_prefix("order_done_") {
            (AdminAction::DoneOrder, rest)
        } else if let Some(rest) = data.strip_prefix("order_cancel_") {
            (AdminAction::CancelOrder, rest)
        } else if let Some(rest) = data.strip_prefix("req_done_") {
            (AdminAction::DoneRequest, rest)
        } else {
            return None;
        };
        id.parse::<i64>().ok().map(action)
    }
}

/// Итог применённого перехода: текст для тоста админу и best-effort
/// уведомление владельцу сущности.
pub struct TransitionOutcome {
    pub toast: String,
    pub owner_id: i64,
    pub owner_text: String,
}

/// Применить переход. `Ok(None)` — сущность не найдена, состояние не менялось.
pub async fn apply_transition(
    state: &BotState,
    action: AdminAction,
) -> Result<Option<TransitionOutcome>, Box<dyn Error + Send + Sync>> {
    let outcome = match action {
        AdminAction::ConfirmBooking(id) => match Booking::get_by_id(&state.db, id).await? {
            Some(b) => {
                Booking::update_status(&state.db, id, BookingStatus::Confirmed).await?;
                Some(TransitionOutcome {
                    toast: format!("Запись #{} подтверждена", id),
                    owner_id: b.user_id,
                    owner_text: format!(
                        "🟢 Ваша запись \\#{} подтверждена\\!\n\n📋 {}\n📅 {} в {}",
                        id,
                        super::utils::escape_markdown_v2(&b.service_name),
                        super::utils::escape_markdown_v2(&b.date),
                        super::utils::escape_markdown_v2(&b.time)
                    ),
                })
            }
            None => None,
        },
        AdminAction::CancelBooking(id) => match Booking::get_by_id(&state.db, id).await? {
            Some(b) => {
                Booking::update_status(&state.db, id, BookingStatus::Cancelled).await?;
                Some(TransitionOutcome {
                    toast: format!("Запись #{} отменена", id),
                    owner_id: b.user_id,
                    owner_text: format!("🔴 К сожалению, ваша запись \\#{} отменена\\.", id),
                })
            }
            None => None,
        },
        AdminAction::DoneBooking(id) => match Booking::get_by_id(&state.db, id).await? {
            Some(b) => {
                Booking::update_status(&state.db, id, BookingStatus::Done).await?;
                Some(TransitionOutcome {
                    toast: format!("Запись #{} выполнена", id),
                    owner_id: b.user_id,
                    owner_text: format!(
                        "✅ Запись \\#{} выполнена\\. Спасибо, что выбрали нас\\!",
                        id
                    ),
                })
            }
            None => None,
        },
        AdminAction::ProcessOrder(id) => match Order::get_by_id(&state.db, id).await? {
            Some(o) => {
                Order::update_status(&state.db, id, OrderStatus::Processing).await?;
                Some(TransitionOutcome {
                    toast: format!("Заказ #{} взят в работу", id),
                    owner_id: o.user_id,
                    owner_text: format!("🔵 Ваш заказ \\#{} принят в работу\\!", id),
                })
            }
            None => None,
        },
        AdminAction::DoneOrder(id) => match Order::get_by_id(&state.db, id).await? {
            Some(o) => {
                Order::update_status(&state.db, id, OrderStatus::Done).await?;
                Some(TransitionOutcome {
                    toast: format!("Заказ #{} выполнен", id),
                    owner_id: o.user_id,
                    owner_text: format!("✅ Ваш заказ \\#{} выполнен\\. Спасибо\\!", id),
                })
            }
            None => None,
        },
        AdminAction::CancelOrder(id) => match Order::get_by_id(&state.db, id).await? {
            Some(o) => {
                Order::update_status(&state.db, id, OrderStatus::Cancelled).await?;
                Some(TransitionOutcome {
                    toast: format!("Заказ #{} отменён", id),
                    owner_id: o.user_id,
                    owner_text: format!("🔴 К сожалению, ваш заказ \\#{} отменён\\.", id),
                })
            }
            None => None,
        },
        AdminAction::DoneRequest(id) => match Request::get_by_id(&state.db, id).await? {
            Some(r) => {
                Request::update_status(&state.db, id, RequestStatus::Done).await?;
                Some(TransitionOutcome {
                    toast: format!("Заявка #{} закрыта", id),
                    owner_id: r.user_id,
                    owner_text: format!("✅ Ваша заявка \\#{} обработана\\.", id),
                })
            }
            None => None,
        },
    };
    Ok(outcome)
}

/// Статус в базе — факт; уведомление владельцу лишь сигнал, его сбой
/// проглатывается.
pub async fn notify_owner(bot: &Bot, outcome: &TransitionOutcome) {
    let _ = notify::notify(bot, ChatId(outcome.owner_id), &outcome.owner_text, None).await;
}

// ---------- представления админ-панели (текст + inline-клавиатура) ----------

pub async fn stats_view(state: &BotState) -> Result<String, Box<dyn Error + Send + Sync>> {
    let users = User::count(&state.db).await?;
    let bookings = Booking::count(&state.db).await?;
    let new_bookings = Booking::count_by_status(&state.db, BookingStatus::New).await?;
    let orders = Order::count(&state.db).await?;
    let new_orders = Order::count_by_status(&state.db, OrderStatus::New).await?;
    let requests = Request::count(&state.db).await?;
    let new_requests = Request::count_by_status(&state.db, RequestStatus::New).await?;
    let services = Service::count(&state.db).await?;

    Ok(format!(
        "📊 Статистика бота\n\n\
         👥 Пользователей: {}\n\
         📅 Записей: {} (новых: {})\n\
         🛒 Заказов: {} (новых: {})\n\
         📩 Заявок: {} (новых: {})\n\
         🛠 Услуг в каталоге: {}",
        users, bookings, new_bookings, orders, new_orders, requests, new_requests, services
    ))
}

/// Записи в заданном статусе. Первая страница, свежие сверху.
pub async fn bookings_view(
    state: &BotState,
    status: BookingStatus,
) -> Result<(String, InlineKeyboardMarkup), Box<dyn Error + Send + Sync>> {
    let bookings = Booking::get_by_status(&state.db, status, BOOKINGS_PAGE).await?;

    let mut text = match status {
        BookingStatus::New => format!("📋 Новые записи ({}):\n\n", bookings.len()),
        _ => format!("📋 Записи «{}» ({}):\n\n", status.badge(), bookings.len()),
    };
    if bookings.is_empty() {
        text = "✅ Нет записей в этом статусе.".to_string();
    }

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (i, b) in bookings.iter().enumerate() {
        let user = User::get(&state.db, b.user_id).await.unwrap_or(None);
        text.push_str(&format!(
            "{}. {} — {}\n   👤 {}\n   📅 {} в {}\n",
            i + 1,
            b.id,
            b.service_name,
            user_label(user.as_ref()),
            b.date,
            b.time
        ));
        if let Some(comment) = &b.comment {
            text.push_str(&format!("   💬 {}\n", comment));
        }
        text.push('\n');

        match status {
            BookingStatus::New => keyboard.push(vec![
                InlineKeyboardButton::callback(
                    format!("✅ Подтвердить #{}", b.id),
                    format!("confirm_{}", b.id),
                ),
                InlineKeyboardButton::callback(
                    format!("❌ Отменить #{}", b.id),
                    format!("cancel_booking_{}", b.id),
                ),
            ]),
            BookingStatus::Confirmed => keyboard.push(vec![
                InlineKeyboardButton::callback(
                    format!("✔️ Выполнена #{}", b.id),
                    format!("done_booking_{}", b.id),
                ),
                InlineKeyboardButton::callback(
                    format!("❌ Отменить #{}", b.id),
                    format!("cancel_booking_{}", b.id),
                ),
            ]),
            _ => {}
        }
    }

    keyboard.push(vec![
        InlineKeyboardButton::callback("🟡 Новые", "bookings_new"),
        InlineKeyboardButton::callback("🟢 Подтверждённые", "bookings_confirmed"),
    ]);

    Ok((text, InlineKeyboardMarkup::new(keyboard)))
}

pub async fn orders_view(
    state: &BotState,
    status: OrderStatus,
) -> Result<(String, InlineKeyboardMarkup), Box<dyn Error + Send + Sync>> {
    let orders = Order::get_by_status(&state.db, status, ORDERS_PAGE).await?;

    let mut text = format!("🛒 Заказы «{}» ({}):\n\n", status.badge(), orders.len());
    if orders.is_empty() {
        text = "✅ Нет заказов в этом статусе.".to_string();
    }

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (i, o) in orders.iter().enumerate() {
        let user = User::get(&state.db, o.user_id).await.unwrap_or(None);
        text.push_str(&format!(
            "{}. #{} {} 👤 {}\n   📦 {}\n   📍 {}\n",
            i + 1,
            o.id,
            o.status().badge(),
            user_label(user.as_ref()),
            o.items,
            o.address
        ));
        if let Some(comment) = &o.comment {
            text.push_str(&format!("   💬 {}\n", comment));
        }
        text.push('\n');

        match status {
            OrderStatus::New => keyboard.push(vec![
                InlineKeyboardButton::callback(
                    format!("▶️ В работу #{}", o.id),
                    format!("order_process_{}", o.id),
                ),
                InlineKeyboardButton::callback(
                    format!("❌ Отменить #{}", o.id),
                    format!("order_cancel_{}", o.id),
                ),
            ]),
            OrderStatus::Processing => keyboard.push(vec![
                InlineKeyboardButton::callback(
                    format!("✅ Выполнен #{}", o.id),
                    format!("order_done_{}", o.id),
                ),
                InlineKeyboardButton::callback(
                    format!("❌ Отменить #{}", o.id),
                    format!("order_cancel_{}", o.id),
                ),
            ]),
            _ => {}
        }
    }

    keyboard.push(vec![
        InlineKeyboardButton::callback("🟡 Новые", "orders_new"),
        InlineKeyboardButton::callback("🔵 В работе", "orders_processing"),
    ]);

    Ok((text, InlineKeyboardMarkup::new(keyboard)))
}

/// Заявки с фильтром по статусу (None = все).
pub async fn requests_view(
    state: &BotState,
    filter: Option<RequestStatus>,
) -> Result<(String, InlineKeyboardMarkup), Box<dyn Error + Send + Sync>> {
    let requests = Request::list(&state.db, filter, REQUESTS_PAGE).await?;

    let title = match filter {
        Some(RequestStatus::New) => "новые",
        Some(RequestStatus::Done) => "выполненные",
        None => "все",
    };
    let mut text = format!("📩 Заявки ({}, {}):\n\n", title, requests.len());
    if requests.is_empty() {
        text = format!("✅ Нет заявок ({}).", title);
    }

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (i, r) in requests.iter().enumerate() {
        let user = User::get(&state.db, r.user_id).await.unwrap_or(None);
        text.push_str(&format!(
            "{}. #{} {} 👤 {}\n   💬 {}\n\n",
            i + 1,
            r.id,
            r.status().badge(),
            user_label(user.as_ref()),
            r.message
        ));
        if r.status() == RequestStatus::New {
            keyboard.push(vec![InlineKeyboardButton::callback(
                format!("✅ Выполнена #{}", r.id),
                format!("req_done_{}", r.id),
            )]);
        }
    }

    keyboard.push(vec![
        InlineKeyboardButton::callback("🟡 Новые", "reqs_new"),
        InlineKeyboardButton::callback("✅ Выполненные", "reqs_done"),
        InlineKeyboardButton::callback("📃 Все", "reqs_all"),
    ]);

    Ok((text, InlineKeyboardMarkup::new(keyboard)))
}

pub async fn users_view(state: &BotState) -> Result<String, Box<dyn Error + Send + Sync>> {
    let users = User::recent(&state.db, USERS_PAGE).await?;
    let total = User::count(&state.db).await?;

    let mut text = format!("👥 Пользователи (последние {}, всего {}):\n\n", users.len(), total);
    for (i, u) in users.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} {} — id {}\n",
            i + 1,
            u.display_name(),
            u.handle(),
            u.telegram_id
        ));
    }
    Ok(text)
}

/// Управление каталогом: по сообщению на услугу с кнопками действий.
pub async fn send_services_panel(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let services = Service::get_all(&state.db).await?;

    if services.is_empty() {
        bot.send_message(chat_id, "🛠 Каталог пуст.").await?;
    }

    for s in &services {
        let visibility = if s.active { "" } else { " (скрыта)" };
        let description = s
            .description
            .as_deref()
            .map(|d| format!("\n   {}", d))
            .unwrap_or_default();
        bot.send_message(
            chat_id,
            format!(
                "🛠 #{} {}{}\n   💰 {} | ⏱ {}{}",
                s.id,
                s.name,
                visibility,
                format_price(s.price),
                format_duration(s.duration),
                description
            ),
        )
        .reply_markup(super::utils::service_admin_keyboard(s))
        .await?;
    }

    bot.send_message(chat_id, "Добавить новую услугу?")
        .reply_markup(InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("➕ Добавить услугу", "svc_add"),
        ]]))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transition_callbacks() {
        assert_eq!(AdminAction::parse("confirm_7"), Some(AdminAction::ConfirmBooking(7)));
        assert_eq!(
            AdminAction::parse("cancel_booking_12"),
            Some(AdminAction::CancelBooking(12))
        );
        assert_eq!(AdminAction::parse("done_booking_3"), Some(AdminAction::DoneBooking(3)));
        assert_eq!(AdminAction::parse("order_process_9"), Some(AdminAction::ProcessOrder(9)));
        assert_eq!(AdminAction::parse("order_done_9"), Some(AdminAction::DoneOrder(9)));
        assert_eq!(AdminAction::parse("order_cancel_9"), Some(AdminAction::CancelOrder(9)));
        assert_eq!(AdminAction::parse("req_done_1"), Some(AdminAction::DoneRequest(1)));
    }

    #[test]
    fn rejects_foreign_or_malformed_callbacks() {
        assert_eq!(AdminAction::parse("book_service_5"), None);
        assert_eq!(AdminAction::parse("confirm_abc"), None);
        assert_eq!(AdminAction::parse("confirm_"), None);
        assert_eq!(AdminAction::parse("cancel"), None);
    }
}
