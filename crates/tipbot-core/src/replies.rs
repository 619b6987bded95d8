//! User-facing reply texts (Telegram HTML subset).
//!
//! Anything that echoes user input or an error goes through `escape_html`.

use crate::{config::Policy, parser::CommandKind};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn usage(kind: CommandKind) -> String {
    format!("🤔 Usage: {}", escape_html(kind.usage()))
}

pub fn help(bot_username: &str, policy: &Policy) -> String {
    let bot = escape_html(bot_username);
    let cur = escape_html(&policy.currency);
    format!(
        "👉😎👉 I'm a <b>{cur}</b> tipbot. Try these:\n\
         <code>@{bot} tip @user [amount]</code> send {cur} to someone\n\
         <code>@{bot} register [ETH wallet address]</code> set your payout address\n\
         <code>@{bot} balance</code> show your {cur}\n\
         <code>@{bot} withdraw</code> cash out (at least {min} {cur})",
        min = policy.min_withdrawal
    )
}

// ============== register ==============

pub const EMPTY_ADDRESS: &str = "🤔 Give me an address to register.";

pub fn registered(address: &str) -> String {
    format!("👉😎👉 Registered <code>{}</code>", escape_html(address))
}

pub fn bonus_granted(policy: &Policy) -> String {
    format!(
        "👈😎👈 Enjoy your free {} {}!",
        policy.registration_bonus,
        escape_html(&policy.currency)
    )
}

// ============== balance ==============

pub fn balance(amount: i64, policy: &Policy) -> String {
    format!(
        "Your balance is <b>{amount}</b> {}",
        escape_html(&policy.currency)
    )
}

// ============== tip ==============

pub fn tip_too_small(policy: &Policy) -> String {
    format!(
        "🤔 Must send at least {} {}",
        policy.min_tip,
        escape_html(&policy.currency)
    )
}

pub const INSUFFICIENT_FUNDS: &str = "🤔 Insufficient funds!";

pub const SELF_TIP: &str = "🤔 You can't tip yourself.";

pub fn tip_sent(sender: &str, recipient: &str, amount: i64, policy: &Policy) -> String {
    format!(
        "👉😎👉 {} just sent {} {amount} {}!",
        escape_html(sender),
        escape_html(recipient),
        escape_html(&policy.currency)
    )
}

// ============== withdraw ==============

pub fn withdraw_too_small(policy: &Policy) -> String {
    format!(
        "🤔 Must have at least {} {} before withdrawing",
        policy.min_withdrawal,
        escape_html(&policy.currency)
    )
}

pub fn register_first(bot_username: &str) -> String {
    format!(
        "👉😎👉 Please register your Ethereum address:\n\n<code>@{} register YOUR_ADDRESS</code>",
        escape_html(bot_username)
    )
}

pub fn withdrawn(amount: i64, tx_hash: &str, policy: &Policy) -> String {
    format!(
        "👈😎👈 You successfully withdrew {amount} {} at <code>{}</code>",
        escape_html(&policy.currency),
        escape_html(tx_hash)
    )
}

pub fn balance_reset_failed(policy: &Policy) -> String {
    format!(
        "Looks like I might have lost your {}. Sorry!",
        escape_html(&policy.currency)
    )
}

// ============== errors ==============

/// Datastore failure; rendered to the channel.
pub fn ledger_failed(err: &str) -> String {
    format!("🤔 {}", escape_html(err))
}

/// Payout or per-user failure; rendered to the user.
pub fn failed(err: &str) -> String {
    format!("❌ {}", escape_html(err))
}
