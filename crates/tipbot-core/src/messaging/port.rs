use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound side of the chat transport.
///
/// Replies are rendered as the Telegram HTML subset; adapters for other
/// messengers are expected to translate or strip the markup.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;
}
