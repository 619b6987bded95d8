//! Telegram update handlers.
//!
//! Converts a teloxide `Message` into the transport-neutral `IncomingMessage`
//! and hands it to the tip bot on its own task.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{MessageEntityKind, User},
};
use tracing::debug;

use tipbot_core::{
    domain::{AccountId, ChatId, UserId},
    messaging::types::{IncomingMessage, ResolvedMention},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = to_incoming(&msg) else {
        return Ok(());
    };
    debug!(chat_id = incoming.chat_id.0, sender = %incoming.account, "message received");

    // Payouts can take a while; never hold up the update stream for them.
    let tipbot = state.tipbot.clone();
    tokio::spawn(async move {
        tipbot.handle(&incoming).await;
    });
    Ok(())
}

/// Text messages from a user; everything else (stickers, channel posts, ...) is skipped.
fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let from = msg.from()?;

    let mentions = msg
        .parse_entities()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| match e.kind() {
            MessageEntityKind::TextMention { user } => Some(ResolvedMention {
                token: e.text().to_string(),
                account: account_of(user),
            }),
            _ => None,
        })
        .collect();

    Some(IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(from.id.0 as i64),
        account: account_of(from),
        display_name: display_name(from.username.as_deref(), &from.full_name()),
        text: text.to_string(),
        mentions,
    })
}

fn account_of(user: &User) -> AccountId {
    account_key(user.username.as_deref(), user.id.0)
}

/// Ledger key: the lower-cased username, or the numeric id when there is none.
fn account_key(username: Option<&str>, id: u64) -> AccountId {
    match username {
        Some(name) if !name.is_empty() => AccountId::new(name.to_lowercase()),
        _ => AccountId::new(format!("id:{id}")),
    }
}

fn display_name(username: Option<&str>, full_name: &str) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{name}"),
        _ => full_name.to_string(),
    }
}
