use crate::domain::{AccountId, ChatId, UserId};

/// A text message as delivered by the chat transport.
///
/// Platform-specific fields stay in the adapter; it resolves identities into
/// `AccountId`s before handing the message to the core.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    /// Ledger key of the sender.
    pub account: AccountId,
    /// Human-readable sender name used in public announcements.
    pub display_name: String,
    pub text: String,
    /// Mention tokens in `text` that the adapter resolved to an account
    /// (e.g. Telegram text mentions of users without a username).
    pub mentions: Vec<ResolvedMention>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMention {
    pub token: String,
    pub account: AccountId,
}

impl IncomingMessage {
    /// Private chat with the sender.
    pub fn direct_chat(&self) -> ChatId {
        ChatId(self.user_id.0)
    }

    /// Map a recipient token from a command onto a ledger key.
    ///
    /// Tokens the adapter resolved win; otherwise `@name` and `name` both map to
    /// the lower-cased `name`.
    pub fn resolve_recipient(&self, token: &str) -> AccountId {
        if let Some(m) = self.mentions.iter().find(|m| m.token == token) {
            return m.account.clone();
        }
        AccountId::new(token.trim_start_matches('@').to_lowercase())
    }
}
