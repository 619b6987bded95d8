/// Core error type for the tip bot.
///
/// Adapter crates map their library errors into this type. Handlers render the
/// `Display` text straight back to the chat, so keep messages short.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("payout error: {0}")]
    Payout(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
