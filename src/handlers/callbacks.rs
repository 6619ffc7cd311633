use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::BotState;
use crate::flows::{advance, Event};
use crate::handlers::admin::{self, AdminAction};
use crate::handlers::effects::run_effect;
use crate::handlers::utils::{escape_markdown_v2, main_menu_keyboard, service_fields_keyboard};
use crate::models::{BookingStatus, OrderStatus, RequestStatus, Service, ServiceField, User};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let chat_id = ChatId(q.from.id.0 as i64);
    User::upsert(
        &state.db,
        chat_id,
        q.from.username.as_deref(),
        Some(q.from.first_name.as_str()),
        q.from.last_name.as_deref(),
    )
    .await
    .unwrap_or_else(|e| log::error!("User upsert failed: {}", e));

    // Контекст исходного сообщения для правок на месте.
    let message_ctx = q.message.as_ref().map(|m| (m.chat().id, m.id()));

    match data.as_str() {
        // --- клиентские кнопки ---
        "cancel" => {
            let mut session = state.session(chat_id).await;
            advance(&mut session, Event::Cancel);
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).text("Отменено").await?;
            if let Some((msg_chat, msg_id)) = message_ctx {
                bot.edit_message_text(msg_chat, msg_id, "❌ Действие отменено.").await?;
            }
            bot.send_message(chat_id, "Главное меню 👇")
                .reply_markup(main_menu_keyboard())
                .await?;
        }

        "no_comment" | "no_order_comment" => {
            let mut session = state.session(chat_id).await;
            let effect = advance(&mut session, Event::SkipComment);
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).await?;
            run_effect(&bot, &state, chat_id, effect).await?;
        }

        "leave_request" => {
            let mut session = state.session(chat_id).await;
            session.start_request();
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).await?;
            bot.send_message(chat_id, "Напишите ваш вопрос или пожелание:").await?;
        }

        data if data.starts_with("book_service_") => {
            let service_id = data
                .trim_start_matches("book_service_")
                .parse::<i64>()
                .unwrap_or(0);

            let Some(service) = Service::get_by_id(&state.db, service_id).await? else {
                bot.answer_callback_query(q.id.clone()).text("Услуга не найдена").await?;
                return Ok(());
            };

            let mut session = state.session(chat_id).await;
            advance(
                &mut session,
                Event::ServiceChosen { id: service.id, name: service.name.clone() },
            );
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).await?;
            let prompt = format!(
                "✅ Вы выбрали: *{}*\n\n📅 Напишите желаемую *дату* \\(например: 15\\.02, завтра, понедельник\\):",
                escape_markdown_v2(&service.name)
            );
            match message_ctx {
                Some((msg_chat, msg_id)) => {
                    bot.edit_message_text(msg_chat, msg_id, prompt)
                        .parse_mode(ParseMode::MarkdownV2)
                        .await?;
                }
                None => {
                    bot.send_message(chat_id, prompt)
                        .parse_mode(ParseMode::MarkdownV2)
                        .await?;
                }
            }
        }

        // --- всё ниже только для админа; чужие нажатия игнорируются молча ---
        _ => {
            if !state.is_admin(chat_id) {
                return Ok(());
            }
            admin_callback(&bot, &q, &state, &data, chat_id).await?;
        }
    }

    Ok(())
}

async fn admin_callback(
    bot: &Bot,
    q: &CallbackQuery,
    state: &BotState,
    data: &str,
    chat_id: ChatId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let message_ctx = q.message.as_ref().map(|m| (m.chat().id, m.id()));

    // Переходы статусов: confirm_N, cancel_booking_N, order_*_N, req_done_N
    if let Some(action) = AdminAction::parse(data) {
        match admin::apply_transition(state, action).await? {
            Some(outcome) => {
                bot.answer_callback_query(q.id.clone()).text(outcome.toast.clone()).await?;
                if let Some((msg_chat, msg_id)) = message_ctx {
                    bot.edit_message_text(msg_chat, msg_id, format!("✅ {}.", outcome.toast))
                        .await?;
                }
                // статус уже записан; доставка владельцу — best effort
                admin::notify_owner(bot, &outcome).await;
            }
            None => {
                bot.answer_callback_query(q.id.clone()).text("Не найдено").await?;
            }
        }
        return Ok(());
    }

    match data {
        // фильтры списков: правим то же сообщение
        "bookings_new" | "bookings_confirmed" => {
            let status = if data == "bookings_new" {
                BookingStatus::New
            } else {
                BookingStatus::Confirmed
            };
            let (text, keyboard) = admin::bookings_view(state, status).await?;
            bot.answer_callback_query(q.id.clone()).await?;
            if let Some((msg_chat, msg_id)) = message_ctx {
                bot.edit_message_text(msg_chat, msg_id, text)
                    .reply_markup(keyboard)
                    .await?;
            }
        }

        "orders_new" | "orders_processing" => {
            let status = if data == "orders_new" {
                OrderStatus::New
            } else {
                OrderStatus::Processing
            };
            let (text, keyboard) = admin::orders_view(state, status).await?;
            bot.answer_callback_query(q.id.clone()).await?;
            if let Some((msg_chat, msg_id)) = message_ctx {
                bot.edit_message_text(msg_chat, msg_id, text)
                    .reply_markup(keyboard)
                    .await?;
            }
        }

        "reqs_new" | "reqs_done" | "reqs_all" => {
            let filter = match data {
                "reqs_new" => Some(RequestStatus::New),
                "reqs_done" => Some(RequestStatus::Done),
                _ => None,
            };
            let (text, keyboard) = admin::requests_view(state, filter).await?;
            bot.answer_callback_query(q.id.clone()).await?;
            if let Some((msg_chat, msg_id)) = message_ctx {
                bot.edit_message_text(msg_chat, msg_id, text)
                    .reply_markup(keyboard)
                    .await?;
            }
        }

        // управление каталогом услуг
        "svc_add" => {
            let mut session = state.session(chat_id).await;
            session.start_service_add();
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).await?;
            bot.send_message(chat_id, "🛠 Введите название новой услуги:").await?;
        }

        data if data.starts_with("svc_edit_") => {
            let id = data.trim_start_matches("svc_edit_").parse::<i64>().unwrap_or(0);
            match Service::get_by_id(&state.db, id).await? {
                Some(service) => {
                    bot.answer_callback_query(q.id.clone()).await?;
                    bot.send_message(
                        chat_id,
                        format!("✏️ Услуга #{} «{}». Что изменить?", service.id, service.name),
                    )
                    .reply_markup(service_fields_keyboard(service.id))
                    .await?;
                }
                None => {
                    bot.answer_callback_query(q.id.clone()).text("Услуга не найдена").await?;
                }
            }
        }

        data if data.starts_with("svc_field_") => {
            // svc_field_<id>_<field>
            let rest = data.trim_start_matches("svc_field_");
            let Some((id_str, field_str)) = rest.split_once('_') else {
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };
            let (Ok(service_id), Some(field)) =
                (id_str.parse::<i64>(), ServiceField::from_str(field_str))
            else {
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };

            let mut session = state.session(chat_id).await;
            let effect = advance(&mut session, Event::EditField { service_id, field });
            state.put_session(chat_id, session).await;

            bot.answer_callback_query(q.id.clone()).await?;
            run_effect(bot, state, chat_id, effect).await?;
        }

        data if data.starts_with("svc_off_") || data.starts_with("svc_on_") => {
            let active = data.starts_with("svc_on_");
            let id = data
                .trim_start_matches("svc_on_")
                .trim_start_matches("svc_off_")
                .parse::<i64>()
                .unwrap_or(0);
            match Service::get_by_id(&state.db, id).await? {
                Some(_) => {
                    Service::set_active(&state.db, id, active).await?;
                    let toast = if active {
                        format!("Услуга #{} снова видна клиентам", id)
                    } else {
                        format!("Услуга #{} скрыта", id)
                    };
                    bot.answer_callback_query(q.id.clone()).text(toast).await?;
                }
                None => {
                    bot.answer_callback_query(q.id.clone()).text("Услуга не найдена").await?;
                }
            }
        }

        data if data.starts_with("svc_del_") => {
            let id = data.trim_start_matches("svc_del_").parse::<i64>().unwrap_or(0);
            match Service::get_by_id(&state.db, id).await? {
                Some(service) => {
                    Service::delete(&state.db, id).await?;
                    bot.answer_callback_query(q.id.clone())
                        .text(format!("Услуга «{}» удалена", service.name))
                        .await?;
                    log::info!("🗑 Service {} deleted by admin", id);
                }
                None => {
                    bot.answer_callback_query(q.id.clone()).text("Услуга не найдена").await?;
                }
            }
        }

        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}
