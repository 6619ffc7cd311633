use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot_state::BotState;
use crate::flows::{advance, Event, Step};
use crate::handlers::admin;
use crate::handlers::effects::run_effect;
use crate::handlers::utils::{
    cancel_keyboard, escape_markdown_v2, format_duration, format_price, main_menu_keyboard,
    services_keyboard,
};
use crate::models::{Booking, Service, User};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(from) = msg.from.clone() else {
        return Ok(());
    };

    // Регистрация идемпотентна и выполняется на каждое входящее сообщение.
    User::upsert(
        &state.db,
        msg.chat.id,
        from.username.as_deref(),
        Some(from.first_name.as_str()),
        from.last_name.as_deref(),
    )
    .await
    .unwrap_or_else(|e| log::error!("User upsert failed: {}", e));

    let Some(text) = msg.text() else {
        return Ok(());
    };
    // Команды обработаны в command_handler
    if text.starts_with('/') {
        return Ok(());
    }

    let chat_id = msg.chat.id;

    match text {
        // --- клиентское меню ---
        "📋 Услуги и цены" => show_services(&bot, &state, chat_id).await?,

        "📅 Записаться" => {
            let services = Service::get_active(&state.db).await?;
            if services.is_empty() {
                bot.send_message(chat_id, "Пока нет доступных услуг.").await?;
                return Ok(());
            }
            let mut session = state.session(chat_id).await;
            session.start_booking();
            state.put_session(chat_id, session).await;

            bot.send_message(chat_id, "📅 *Выберите услугу для записи:*")
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(services_keyboard(&services))
                .await?;
        }

        "🛒 Сделать заказ" => {
            let mut session = state.session(chat_id).await;
            session.start_order();
            state.put_session(chat_id, session).await;

            bot.send_message(chat_id, "🛒 *Оформление заказа*\n\nОпишите, что хотите заказать:")
                .parse_mode(ParseMode::MarkdownV2)
                .reply_markup(cancel_keyboard())
                .await?;
        }

        "📩 Оставить заявку" => {
            let mut session = state.session(chat_id).await;
            session.start_request();
            state.put_session(chat_id, session).await;

            bot.send_message(
                chat_id,
                "📩 *Оставить заявку*\n\nНапишите ваш вопрос или пожелание, и мы свяжемся с вами:",
            )
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(cancel_keyboard())
            .await?;
        }

        "📞 Контакты" => {
            bot.send_message(
                chat_id,
                format!(
                    "📞 *Контакты «{}»*\n\n\
                     📱 Телефон: \\+7 \\(XXX\\) XXX\\-XX\\-XX\n\
                     📍 Адрес: г\\. Саратов, ул\\. Примерная, 1\n\
                     🕐 Режим работы: Пн\\-Сб 9:00\\-20:00\n\
                     🌐 Сайт: example\\.com\n\n\
                     Напишите нам, и мы ответим в ближайшее время\\! 😊",
                    escape_markdown_v2(&state.config.business_name)
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("📩 Написать нам", "leave_request"),
            ]]))
            .await?;
        }

        "👤 Мои записи" => show_my_bookings(&bot, &state, chat_id).await?,

        "⬅️ Обычное меню" => {
            bot.send_message(chat_id, "Главное меню 👇")
                .reply_markup(main_menu_keyboard())
                .await?;
        }

        // --- админское меню: не-админу молчим ---
        "📊 Статистика" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            bot.send_message(chat_id, admin::stats_view(&state).await?).await?;
        }

        "📋 Новые записи" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            let (text, keyboard) =
                admin::bookings_view(&state, crate::models::BookingStatus::New).await?;
            bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        }

        "🛒 Заказы" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            let (text, keyboard) =
                admin::orders_view(&state, crate::models::OrderStatus::New).await?;
            bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        }

        "📩 Заявки" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            let (text, keyboard) =
                admin::requests_view(&state, Some(crate::models::RequestStatus::New)).await?;
            bot.send_message(chat_id, text).reply_markup(keyboard).await?;
        }

        "🛠 Услуги" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            admin::send_services_panel(&bot, &state, chat_id).await?;
        }

        "👥 Пользователи" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            bot.send_message(chat_id, admin::users_view(&state).await?).await?;
        }

        "📣 Рассылка" => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            let mut session = state.session(chat_id).await;
            session.start_broadcast();
            state.put_session(chat_id, session).await;
            bot.send_message(chat_id, "📣 Напишите текст рассылки (получат все пользователи бота):")
                .reply_markup(cancel_keyboard())
                .await?;
        }

        // --- шаг активного диалога ---
        _ => {
            let mut session = state.session(chat_id).await;

            // Шаг рассылки мог бы пережить смену ADMIN_ID; перепроверяем.
            if session.step == Some(Step::Broadcast) && !state.is_admin(chat_id) {
                state.clear_session(chat_id).await;
                return Ok(());
            }

            let effect = advance(&mut session, Event::Text(text));
            state.put_session(chat_id, session).await;
            run_effect(&bot, &state, chat_id, effect).await?;
        }
    }

    Ok(())
}

async fn show_services(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let services = Service::get_active(&state.db).await?;

    if services.is_empty() {
        bot.send_message(chat_id, "Пока нет доступных услуг.").await?;
        return Ok(());
    }

    let mut text = "📋 *Наши услуги:*\n\n".to_string();
    for (i, s) in services.iter().enumerate() {
        text.push_str(&format!(
            "*{}\\. {}*\n   💰 {} \\| ⏱ {}\n",
            i + 1,
            escape_markdown_v2(&s.name),
            escape_markdown_v2(&format_price(s.price)),
            escape_markdown_v2(&format_duration(s.duration))
        ));
        if let Some(description) = &s.description {
            text.push_str(&format!("   _{}_\n", escape_markdown_v2(description)));
        }
        text.push('\n');
    }
    text.push_str("\nЧтобы записаться, нажмите «📅 Записаться»");

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}

async fn show_my_bookings(
    bot: &Bot,
    state: &BotState,
    chat_id: ChatId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let bookings = Booking::get_by_user(&state.db, chat_id.0, 10).await?;

    if bookings.is_empty() {
        bot.send_message(
            chat_id,
            "У вас пока нет записей.\n\nНажмите «📅 Записаться» чтобы записаться.",
        )
        .await?;
        return Ok(());
    }

    let mut text = "👤 *Ваши записи:*\n\n".to_string();
    for (i, b) in bookings.iter().enumerate() {
        text.push_str(&format!(
            "*{}\\. {}*\n   📅 {} в {}\n   Статус: {}\n\n",
            i + 1,
            escape_markdown_v2(&b.service_name),
            escape_markdown_v2(&b.date),
            escape_markdown_v2(&b.time),
            escape_markdown_v2(b.status().badge())
        ));
    }

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    Ok(())
}
