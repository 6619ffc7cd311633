//! Исполнение эффектов движка диалогов: ответы пользователю, запись
//! сущностей в базу и best-effort уведомления администратору.

use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::BotState;
use crate::flows::Effect;
use crate::handlers::utils::{
    booking_admin_keyboard, escape_markdown_v2, skip_comment_keyboard, user_label,
};
use crate::models::{Booking, Order, Request, Service, User};
use crate::notify;

pub async fn run_effect(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
    effect: Effect,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match effect {
        Effect::AskDate { service_name } => {
            bot.send_message(
                chat_id,
                format!(
                    "✅ Вы выбрали: *{}*\n\n📅 Напишите желаемую *дату* \\(например: 15\\.02, завтра, понедельник\\):",
                    escape_markdown_v2(&service_name)
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }

        Effect::AskTime { date } => {
            bot.send_message(
                chat_id,
                format!(
                    "📅 Дата: *{}*\n\n⏰ Теперь напишите желаемое *время* \\(например: 14:00, после обеда\\):",
                    escape_markdown_v2(&date)
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }

        Effect::AskBookingComment { time } => {
            bot.send_message(
                chat_id,
                format!(
                    "⏰ Время: *{}*\n\n💬 Хотите добавить комментарий? Напишите или нажмите кнопку:",
                    escape_markdown_v2(&time)
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(skip_comment_keyboard("no_comment"))
            .await?;
        }

        Effect::AskAddress => {
            bot.send_message(chat_id, "📍 Укажите адрес доставки (или напишите \"самовывоз\"):")
                .await?;
        }

        Effect::AskOrderComment => {
            bot.send_message(chat_id, "💬 Хотите добавить комментарий к заказу?")
                .reply_markup(skip_comment_keyboard("no_order_comment"))
                .await?;
        }

        Effect::CommitBooking(draft) => {
            let booking_id = Booking::create(
                &state.db,
                chat_id.0,
                Some(draft.service_id),
                &draft.service_name,
                &draft.date,
                &draft.time,
                draft.comment.as_deref(),
            )
            .await?;

            let comment_line = draft
                .comment
                .as_deref()
                .map(|c| format!("💬 Комментарий: {}\n", escape_markdown_v2(c)))
                .unwrap_or_default();

            bot.send_message(
                chat_id,
                format!(
                    "✅ *Вы записаны\\!*\n\n\
                     📋 Услуга: {}\n\
                     📅 Дата: {}\n\
                     ⏰ Время: {}\n\
                     {}\n📌 Запись \\#{}\n\n\
                     Мы подтвердим запись в ближайшее время\\!",
                    escape_markdown_v2(&draft.service_name),
                    escape_markdown_v2(&draft.date),
                    escape_markdown_v2(&draft.time),
                    comment_line,
                    booking_id
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;

            let user = User::get(&state.db, chat_id.0).await.unwrap_or(None);
            let admin_text = format!(
                "📅 *Новая запись \\#{}*\n\n\
                 👤 {}\n\
                 📋 {}\n\
                 📅 {} в {}\n{}",
                booking_id,
                escape_markdown_v2(&user_label(user.as_ref())),
                escape_markdown_v2(&draft.service_name),
                escape_markdown_v2(&draft.date),
                escape_markdown_v2(&draft.time),
                draft
                    .comment
                    .as_deref()
                    .map(|c| format!("💬 {}", escape_markdown_v2(c)))
                    .unwrap_or_default()
            );
            // уведомление — best effort: запись уже создана
            let _ = notify::notify(
                bot,
                state.config.admin_id,
                &admin_text,
                Some(booking_admin_keyboard(booking_id)),
            )
            .await;
        }

        Effect::CommitOrder(draft) => {
            let order_id = Order::create(
                &state.db,
                chat_id.0,
                &draft.items,
                0,
                &draft.address,
                draft.comment.as_deref(),
            )
            .await?;

            let comment_line = draft
                .comment
                .as_deref()
                .map(|c| format!("💬 {}\n", escape_markdown_v2(c)))
                .unwrap_or_default();

            bot.send_message(
                chat_id,
                format!(
                    "✅ *Заказ \\#{} оформлен\\!*\n\n\
                     🛒 {}\n\
                     📍 {}\n\
                     {}\nМы свяжемся с вами для подтверждения\\!",
                    order_id,
                    escape_markdown_v2(&draft.items),
                    escape_markdown_v2(&draft.address),
                    comment_line
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;

            let user = User::get(&state.db, chat_id.0).await.unwrap_or(None);
            let admin_text = format!(
                "🛒 *Новый заказ \\#{}*\n\n\
                 👤 {}\n\
                 📦 {}\n\
                 📍 {}\n{}",
                order_id,
                escape_markdown_v2(&user_label(user.as_ref())),
                escape_markdown_v2(&draft.items),
                escape_markdown_v2(&draft.address),
                draft
                    .comment
                    .as_deref()
                    .map(|c| format!("💬 {}", escape_markdown_v2(c)))
                    .unwrap_or_default()
            );
            let _ = notify::notify(bot, state.config.admin_id, &admin_text, None).await;
        }

        Effect::CommitRequest { message } => {
            let request_id = Request::create(&state.db, chat_id.0, "general", &message).await?;

            bot.send_message(
                chat_id,
                format!(
                    "✅ *Заявка \\#{} принята\\!*\n\nМы свяжемся с вами в ближайшее время\\.",
                    request_id
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;

            let user = User::get(&state.db, chat_id.0).await.unwrap_or(None);
            let admin_text = format!(
                "📩 *Новая заявка \\#{}*\n\n👤 {}\n💬 {}",
                request_id,
                escape_markdown_v2(&user_label(user.as_ref())),
                escape_markdown_v2(&message)
            );
            let _ = notify::notify(bot, state.config.admin_id, &admin_text, None).await;
        }

        Effect::AskServicePrice { name } => {
            bot.send_message(
                chat_id,
                format!(
                    "🛠 Название: *{}*\n\n💰 Укажите цену в рублях \\(0 — бесплатно\\):",
                    escape_markdown_v2(&name)
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }

        Effect::AskServiceDuration => {
            bot.send_message(chat_id, "⏱ Укажите длительность в минутах:")
                .await?;
        }

        Effect::AskServiceDescription => {
            bot.send_message(chat_id, "📝 Добавьте описание (или отправьте \"-\", чтобы пропустить):")
                .await?;
        }

        Effect::CommitService(draft) => {
            let service_id = Service::create(
                &state.db,
                &draft.name,
                draft.description.as_deref(),
                draft.price,
                draft.duration,
            )
            .await?;

            bot.send_message(
                chat_id,
                format!(
                    "✅ Услуга #{} «{}» добавлена: {} ₽, {} мин.",
                    service_id, draft.name, draft.price, draft.duration
                ),
            )
            .await?;
        }

        Effect::AskEditValue { service_id: _, field } => {
            bot.send_message(chat_id, format!("✏️ Введите новое значение ({}):", field.title()))
                .await?;
        }

        Effect::UpdateServiceField { service_id, field, value } => {
            match Service::get_by_id(&state.db, service_id).await? {
                Some(_) => {
                    Service::update_field(&state.db, service_id, field, &value).await?;
                    bot.send_message(
                        chat_id,
                        format!("✅ Услуга #{} обновлена ({}).", service_id, field.title()),
                    )
                    .await?;
                }
                None => {
                    bot.send_message(chat_id, "❌ Услуга не найдена.").await?;
                }
            }
        }

        Effect::Broadcast { text } => {
            let ids = User::all_ids(&state.db).await?;
            let report = notify::broadcast(bot, &ids, &text).await;
            bot.send_message(
                chat_id,
                format!(
                    "📣 Рассылка завершена!\n\n✅ Доставлено: {}\n❌ Не доставлено: {}",
                    report.sent, report.failed
                ),
            )
            .await?;
        }

        // Отмена обрабатывается на месте нажатия кнопки,
        // игнор — молчание по контракту.
        Effect::Cancelled | Effect::Ignored => {}
    }

    Ok(())
}
