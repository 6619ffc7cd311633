use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::BotState;
use crate::handlers::utils::{admin_menu_keyboard, escape_markdown_v2, main_menu_keyboard};
use crate::models::User;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(user) = &msg.from {
        User::upsert(
            &state.db,
            msg.chat.id,
            user.username.as_deref(),
            Some(user.first_name.as_str()),
            user.last_name.as_deref(),
        )
        .await
        .unwrap_or_else(|e| log::error!("User upsert failed: {}", e));
    }

    match cmd {
        Command::Start => handle_start(bot, msg, state).await?,
        Command::Help => handle_help(bot, msg).await?,
        Command::Admin => handle_admin(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| "друг".to_string());

    bot.send_message(
        msg.chat.id,
        format!(
            "👋 Привет, {}\\!\n\n\
             Добро пожаловать в «{}»\\!\n\n\
             Здесь вы можете:\n\
             📋 Посмотреть услуги и цены\n\
             📅 Записаться онлайн\n\
             🛒 Сделать заказ\n\
             📩 Оставить заявку\n\n\
             Выберите нужный пункт в меню 👇",
            escape_markdown_v2(&name),
            escape_markdown_v2(&state.config.business_name)
        ),
    )
    .parse_mode(ParseMode::MarkdownV2)
    .reply_markup(main_menu_keyboard())
    .await?;

    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        "ℹ️ Помощь\n\n\
         /start — главное меню\n\
         /help — эта справка\n\n\
         Всё остальное — через кнопки меню:\n\
         записаться, заказать, задать вопрос.",
    )
    .reply_markup(main_menu_keyboard())
    .await?;
    Ok(())
}

/// Вход в админ-панель. Единственное место с явным отказом в доступе;
/// кнопочные действия не-админа игнорируются молча.
async fn handle_admin(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if !state.is_admin(msg.chat.id) {
        bot.send_message(msg.chat.id, "⛔ Доступ запрещён.").await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "🔐 Админ-панель\n\nВыберите действие:")
        .reply_markup(admin_menu_keyboard())
        .await?;
    Ok(())
}
