//! Command parsing for messages addressed to the bot.
//!
//! Messages look like `@bot tip @alice 5`. Tokens are separated by single
//! spaces with no quoting; a doubled space yields an empty token, which then
//! fails the per-command token count.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Tip,
    Register,
    Balance,
    Withdraw,
    Help,
}

impl CommandKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "tip" => Some(Self::Tip),
            "register" => Some(Self::Register),
            "balance" => Some(Self::Balance),
            "withdraw" => Some(Self::Withdraw),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Token count including the leading mention.
    fn expected_tokens(self) -> usize {
        match self {
            Self::Tip => 4,
            Self::Register => 3,
            Self::Balance | Self::Withdraw | Self::Help => 2,
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            Self::Tip => "tip @user [amount]",
            Self::Register => "register [ETH wallet address]",
            Self::Balance => "balance",
            Self::Withdraw => "withdraw",
            Self::Help => "help",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `amount` is left unparsed; the tip handler decides what a bad amount means.
    Tip { recipient: String, amount: String },
    Register { address: String },
    Balance,
    Withdraw,
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parsed {
    /// Not addressed to the bot; ignore without logging.
    NotAddressed,
    /// Addressed to the bot but not actionable; log only.
    Dropped(String),
    /// Known command with the wrong number of arguments.
    Usage(CommandKind),
    Command(Command),
}

/// Parse `text` if it starts with `@{bot_username}`.
pub fn parse(text: &str, bot_username: &str) -> Parsed {
    let mention = format!("@{}", bot_username.trim_start_matches('@'));
    if !starts_with_ignore_case(text, &mention) {
        return Parsed::NotAddressed;
    }
    // `@bot_admin` is a different user.
    if !matches!(text[mention.len()..].chars().next(), None | Some(' ')) {
        return Parsed::NotAddressed;
    }

    let tokens: Vec<&str> = text.split(' ').collect();
    if tokens.len() < 2 {
        return Parsed::Dropped("mention without a command".to_string());
    }

    let Some(kind) = CommandKind::from_token(tokens[1]) else {
        return Parsed::Dropped(format!("unknown command `{}`", tokens[1]));
    };

    if tokens.len() != kind.expected_tokens() {
        return Parsed::Usage(kind);
    }

    let cmd = match kind {
        CommandKind::Tip => Command::Tip {
            recipient: tokens[2].to_string(),
            amount: tokens[3].to_string(),
        },
        CommandKind::Register => Command::Register {
            address: tokens[2].to_string(),
        },
        CommandKind::Balance => Command::Balance,
        CommandKind::Withdraw => Command::Withdraw,
        CommandKind::Help => Command::Help,
    };
    Parsed::Command(cmd)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}
