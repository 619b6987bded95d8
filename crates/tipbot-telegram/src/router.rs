use std::sync::Arc;

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use tipbot_core::{
    config::Config, handlers::TipBot, ledger::LedgerStore, messaging::port::MessagingPort,
    payout::PayoutGateway,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub tipbot: Arc<TipBot>,
}

/// Authenticate, then long-poll for updates until the process is stopped.
pub async fn run_polling(
    cfg: Arc<Config>,
    ledger: Arc<dyn LedgerStore>,
    payout: Arc<dyn PayoutGateway>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .context("telegram authentication failed")?;
    let bot_username = cfg
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("tipbot started: @{bot_username}");
    if cfg.tip_reaction.is_some() || cfg.tip_amount.is_some() {
        info!("TIP_REACTION / TIP_AMOUNT are set but reaction tipping is not supported");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        tipbot: Arc::new(TipBot::new(&cfg, bot_username, ledger, payout, messenger)),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
