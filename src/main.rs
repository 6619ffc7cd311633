use teloxide::{dptree, prelude::*, utils::command::BotCommands};

mod bot_state;
mod config;
mod database;
mod flows;
mod handlers;
mod models;
mod notify;

use crate::bot_state::BotState;
use crate::config::Config;
use crate::database::Database;
use crate::handlers::{callback_handler, command_handler, message_handler};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "панель администратора")]
    Admin,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Starting business bot «{}»...", config.business_name);
    log::info!("📊 Admin ID: {}", config.admin_id);

    let db = Database::new(&config.database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let state = BotState::new(db, config);
    let bot = Bot::from_env();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
