//! Command handlers.
//!
//! Handlers are stateless; everything lives in the ledger. Balance updates are
//! read-compute-upsert sequences with no lock or transaction around them, so
//! two commands touching the same account at once can lose an update.

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, Policy},
    domain::{AccountId, ChatId},
    ledger::LedgerStore,
    messaging::{port::MessagingPort, types::IncomingMessage},
    parser::{parse, Command, Parsed},
    payout::{transfer_within, PayoutGateway},
    replies,
};

pub struct TipBot {
    bot_username: String,
    policy: Policy,
    payout_timeout: Duration,
    ledger: Arc<dyn LedgerStore>,
    payout: Arc<dyn PayoutGateway>,
    messenger: Arc<dyn MessagingPort>,
}

impl TipBot {
    pub fn new(
        cfg: &Config,
        bot_username: impl Into<String>,
        ledger: Arc<dyn LedgerStore>,
        payout: Arc<dyn PayoutGateway>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            bot_username: bot_username.into(),
            policy: cfg.policy.clone(),
            payout_timeout: cfg.payout_timeout,
            ledger,
            payout,
            messenger,
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Handle one incoming chat message end to end.
    pub async fn handle(&self, msg: &IncomingMessage) {
        let cmd = match parse(&msg.text, &self.bot_username) {
            Parsed::NotAddressed => return,
            Parsed::Dropped(reason) => {
                debug!(account = %msg.account, %reason, "dropping message");
                return;
            }
            Parsed::Usage(kind) => {
                self.reply(msg.chat_id, replies::usage(kind)).await;
                return;
            }
            Parsed::Command(cmd) => cmd,
        };

        info!(account = %msg.account, command = ?cmd, "handling command");
        match cmd {
            Command::Tip { recipient, amount } => self.tip(msg, &recipient, &amount).await,
            Command::Register { address } => self.register(msg, &address).await,
            Command::Balance => self.balance(msg).await,
            Command::Withdraw => self.withdraw(msg).await,
            Command::Help => self.help(msg).await,
        }
    }

    async fn register(&self, msg: &IncomingMessage, address: &str) {
        let Some(stored) = self.read_address(msg, &msg.account).await else {
            return;
        };

        if address.is_empty() {
            self.reply_direct(msg, replies::EMPTY_ADDRESS.to_string())
                .await;
            return;
        }

        match self.ledger.set_address(&msg.account, address).await {
            Ok(()) => {
                self.reply(msg.chat_id, replies::registered(address)).await;
            }
            Err(e) => {
                error!(account = %msg.account, "address upsert failed: {e}");
                self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                    .await;
            }
        }

        // One-time bonus: overwrites whatever balance the user had.
        if stored.is_empty() {
            match self
                .ledger
                .set_balance(&msg.account, self.policy.registration_bonus)
                .await
            {
                Ok(()) => {
                    self.reply(msg.chat_id, replies::bonus_granted(&self.policy))
                        .await;
                }
                Err(e) => {
                    error!(account = %msg.account, "bonus upsert failed: {e}");
                    self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                        .await;
                }
            }
        }
    }

    async fn balance(&self, msg: &IncomingMessage) {
        let Some(amount) = self.read_balance(msg, &msg.account).await else {
            return;
        };

        // Re-upsert the value just read; this only materializes a missing row.
        if let Err(e) = self.ledger.set_balance(&msg.account, amount).await {
            error!(account = %msg.account, "balance upsert failed: {e}");
            self.reply_direct(msg, replies::failed(&e.to_string()))
                .await;
        }

        self.reply_direct(msg, replies::balance(amount, &self.policy))
            .await;
    }

    async fn tip(&self, msg: &IncomingMessage, recipient_token: &str, amount_text: &str) {
        let amount = match amount_text.parse::<i64>() {
            Ok(v) => v,
            Err(e) => {
                warn!(account = %msg.account, "invalid tip amount {amount_text:?}: {e}");
                return;
            }
        };

        if amount < self.policy.min_tip {
            self.reply_direct(msg, replies::tip_too_small(&self.policy))
                .await;
            return;
        }

        let recipient = msg.resolve_recipient(recipient_token);
        if recipient == msg.account {
            self.reply_direct(msg, replies::SELF_TIP.to_string())
                .await;
            return;
        }

        let Some(sender_balance) = self.read_balance(msg, &msg.account).await else {
            return;
        };
        if sender_balance < amount {
            self.reply_direct(msg, replies::INSUFFICIENT_FUNDS.to_string())
                .await;
            return;
        }

        let Some(recipient_balance) = self.read_balance(msg, &recipient).await else {
            return;
        };
        let Some(recipient_after) = recipient_balance.checked_add(amount) else {
            self.reply(msg.chat_id, replies::ledger_failed("recipient balance overflow"))
                .await;
            return;
        };
        let sender_after = sender_balance - amount;

        match self.ledger.set_balance(&recipient, recipient_after).await {
            Ok(()) => {
                info!(from = %msg.account, to = %recipient, amount, "tip credited");
                let text =
                    replies::tip_sent(&msg.display_name, recipient_token, amount, &self.policy);
                self.reply(msg.chat_id, text).await;
            }
            Err(e) => {
                error!(to = %recipient, "recipient upsert failed: {e}");
                self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                    .await;
            }
        }

        // Attempted even when the credit above failed.
        if let Err(e) = self.ledger.set_balance(&msg.account, sender_after).await {
            error!(from = %msg.account, "sender upsert failed: {e}");
            self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                .await;
        }
    }

    async fn withdraw(&self, msg: &IncomingMessage) {
        let Some(address) = self.read_address(msg, &msg.account).await else {
            return;
        };
        let Some(amount) = self.read_balance(msg, &msg.account).await else {
            return;
        };

        if amount < self.policy.min_withdrawal {
            self.reply_direct(msg, replies::withdraw_too_small(&self.policy))
                .await;
            return;
        }
        if address.is_empty() {
            self.reply_direct(msg, replies::register_first(&self.bot_username))
                .await;
            return;
        }

        let tx = match transfer_within(
            self.payout.as_ref(),
            &address,
            amount,
            self.payout_timeout,
        )
        .await
        {
            Ok(tx) => tx,
            Err(e) => {
                error!(account = %msg.account, amount, "payout failed: {e}");
                self.reply_direct(msg, replies::failed(&e.to_string()))
                    .await;
                return;
            }
        };
        info!(account = %msg.account, amount, tx = %tx.hash, "payout submitted");

        // The transfer is already out; a failed reset leaves the balance
        // withdrawable again.
        if let Err(e) = self.ledger.set_balance(&msg.account, 0).await {
            error!(account = %msg.account, tx = %tx.hash, "balance reset failed after payout: {e}");
            self.reply(msg.chat_id, replies::balance_reset_failed(&self.policy))
                .await;
        }

        self.reply_direct(msg, replies::withdrawn(amount, &tx.hash, &self.policy))
            .await;
    }

    async fn help(&self, msg: &IncomingMessage) {
        self.reply(msg.chat_id, replies::help(&self.bot_username, &self.policy))
            .await;
    }

    async fn read_address(&self, msg: &IncomingMessage, account: &AccountId) -> Option<String> {
        match self.ledger.get_address(account).await {
            Ok(v) => Some(v),
            Err(e) => {
                error!(%account, "address lookup failed: {e}");
                self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                    .await;
                None
            }
        }
    }

    async fn read_balance(&self, msg: &IncomingMessage, account: &AccountId) -> Option<i64> {
        match self.ledger.get_balance(account).await {
            Ok(v) => Some(v),
            Err(e) => {
                error!(%account, "balance lookup failed: {e}");
                self.reply(msg.chat_id, replies::ledger_failed(&e.to_string()))
                    .await;
                None
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, html: String) {
        if let Err(e) = self.messenger.send_html(chat_id, &html).await {
            warn!(chat = chat_id.0, "failed to send reply: {e}");
        }
    }

    /// Reply in the sender's private chat. Telegram refuses that until the
    /// user has started the bot, so fall back to the chat the command came from.
    async fn reply_direct(&self, msg: &IncomingMessage, html: String) {
        let direct = msg.direct_chat();
        match self.messenger.send_html(direct, &html).await {
            Ok(()) => {}
            Err(e) if direct != msg.chat_id => {
                debug!(chat = direct.0, "private reply failed, answering in chat: {e}");
                self.reply(msg.chat_id, html).await;
            }
            Err(e) => warn!(chat = direct.0, "failed to send reply: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{LedgerBackend, DEFAULT_STATUS_PORT},
        domain::{TxHandle, UserId},
        errors::Error,
        ledger::MemoryLedger,
        messaging::types::ResolvedMention,
        Result,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    const CHANNEL: ChatId = ChatId(-1000);

    #[derive(Default)]
    struct FakeMessenger {
        /// Chats that refuse messages, like a private chat the user never opened.
        closed: Vec<ChatId>,
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    impl FakeMessenger {
        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(c, _)| *c == chat_id)
                .map(|(_, t)| t)
                .collect()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()> {
            if self.closed.contains(&chat_id) {
                return Err(Error::External(
                    "Forbidden: bot can't initiate conversation with a user".to_string(),
                ));
            }
            self.sent.lock().unwrap().push((chat_id, html.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePayout {
        fail: bool,
        calls: Mutex<Vec<(String, i64)>>,
    }

    impl FakePayout {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, i64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PayoutGateway for FakePayout {
        async fn transfer(&self, address: &str, amount: i64) -> Result<TxHandle> {
            self.calls
                .lock()
                .unwrap()
                .push((address.to_string(), amount));
            if self.fail {
                return Err(Error::Payout("dial tcp: connection refused".to_string()));
            }
            Ok(TxHandle {
                hash: "0xfeed".to_string(),
            })
        }
    }

    /// Memory ledger whose balance writes fail for selected accounts.
    #[derive(Default)]
    struct FlakyLedger {
        inner: MemoryLedger,
        failing_writes: Vec<AccountId>,
        set_balance_calls: Mutex<Vec<AccountId>>,
    }

    #[async_trait]
    impl LedgerStore for FlakyLedger {
        async fn address(&self, account: &AccountId) -> Result<Option<String>> {
            self.inner.address(account).await
        }

        async fn balance(&self, account: &AccountId) -> Result<Option<i64>> {
            self.inner.balance(account).await
        }

        async fn set_address(&self, account: &AccountId, address: &str) -> Result<()> {
            self.inner.set_address(account, address).await
        }

        async fn set_balance(&self, account: &AccountId, balance: i64) -> Result<()> {
            self.set_balance_calls.lock().unwrap().push(account.clone());
            if self.failing_writes.contains(account) {
                return Err(Error::Ledger("connection reset".to_string()));
            }
            self.inner.set_balance(account, balance).await
        }
    }

    fn cfg(policy: Policy) -> Config {
        Config {
            telegram_bot_token: "x".to_string(),
            bot_username: None,
            tip_reaction: None,
            tip_amount: None,
            token_address: "0x00000000000000000000000000000000000000aa".to_string(),
            eth_api_endpoint: "http://localhost:8545".to_string(),
            eth_key_json: "{}".to_string(),
            eth_password: String::new(),
            payout_timeout: Duration::from_secs(5),
            ledger_backend: LedgerBackend::Memory,
            database_url: None,
            policy,
            status_port: DEFAULT_STATUS_PORT,
        }
    }

    struct Harness {
        bot: TipBot,
        ledger: Arc<dyn LedgerStore>,
        payout: Arc<FakePayout>,
        messenger: Arc<FakeMessenger>,
    }

    impl Harness {
        fn with(ledger: Arc<dyn LedgerStore>, payout: FakePayout, policy: Policy) -> Self {
            Self::build(ledger, payout, policy, FakeMessenger::default())
        }

        fn build(
            ledger: Arc<dyn LedgerStore>,
            payout: FakePayout,
            policy: Policy,
            messenger: FakeMessenger,
        ) -> Self {
            let payout = Arc::new(payout);
            let messenger = Arc::new(messenger);
            let bot = TipBot::new(
                &cfg(policy),
                "cultbot",
                ledger.clone(),
                payout.clone(),
                messenger.clone(),
            );
            Self {
                bot,
                ledger,
                payout,
                messenger,
            }
        }

        fn new() -> Self {
            Self::with(
                Arc::new(MemoryLedger::new()),
                FakePayout::default(),
                Policy::default(),
            )
        }

        async fn send(&self, user: (&str, i64), text: &str) {
            let msg = IncomingMessage {
                chat_id: CHANNEL,
                user_id: UserId(user.1),
                account: AccountId::new(user.0),
                display_name: user.0.to_string(),
                text: text.to_string(),
                mentions: vec![],
            };
            self.bot.handle(&msg).await;
        }

        async fn balance_of(&self, who: &str) -> Option<i64> {
            self.ledger.balance(&AccountId::new(who)).await.unwrap()
        }

        async fn seed(&self, who: &str, balance: i64) {
            self.ledger
                .set_balance(&AccountId::new(who), balance)
                .await
                .unwrap();
        }
    }

    const ALICE: (&str, i64) = ("alice", 1);
    const BOB: (&str, i64) = ("bob", 2);

    #[tokio::test]
    async fn first_register_grants_bonus_once() {
        let h = Harness::new();

        h.send(ALICE, "@cultbot register 0xabc").await;
        assert_eq!(
            h.ledger.get_address(&AccountId::new("alice")).await.unwrap(),
            "0xabc"
        );
        assert_eq!(h.balance_of("alice").await, Some(10));
        let channel = h.messenger.sent_to(CHANNEL);
        assert_eq!(channel.len(), 2);
        assert!(channel[1].contains("free 10 CULT"));

        h.seed("alice", 3).await;
        h.send(ALICE, "@cultbot register 0xdef").await;
        assert_eq!(
            h.ledger.get_address(&AccountId::new("alice")).await.unwrap(),
            "0xdef"
        );
        assert_eq!(h.balance_of("alice").await, Some(3));
        assert_eq!(h.messenger.sent_to(CHANNEL).len(), 3);
    }

    #[tokio::test]
    async fn register_with_empty_address_is_rejected() {
        let h = Harness::new();
        h.send(ALICE, "@cultbot register ").await;

        assert_eq!(
            h.ledger.address(&AccountId::new("alice")).await.unwrap(),
            None
        );
        assert_eq!(h.balance_of("alice").await, None);
        assert_eq!(
            h.messenger.sent_to(ChatId(1)),
            vec![replies::EMPTY_ADDRESS.to_string()]
        );
    }

    #[tokio::test]
    async fn tip_below_minimum_changes_nothing() {
        let h = Harness::new();
        h.seed("alice", 5).await;

        h.send(ALICE, "@cultbot tip @bob 0").await;
        h.send(ALICE, "@cultbot tip @bob -3").await;

        assert_eq!(h.balance_of("alice").await, Some(5));
        assert_eq!(h.balance_of("bob").await, None);
        assert_eq!(h.messenger.sent_to(ChatId(1)).len(), 2);
    }

    #[tokio::test]
    async fn tip_with_insufficient_funds_changes_nothing() {
        let h = Harness::new();
        h.seed("alice", 3).await;
        h.seed("bob", 1).await;

        h.send(ALICE, "@cultbot tip @bob 4").await;

        assert_eq!(h.balance_of("alice").await, Some(3));
        assert_eq!(h.balance_of("bob").await, Some(1));
        assert_eq!(
            h.messenger.sent_to(ChatId(1)),
            vec![replies::INSUFFICIENT_FUNDS.to_string()]
        );
    }

    #[tokio::test]
    async fn tip_moves_amount_and_announces() {
        let h = Harness::new();
        h.seed("alice", 9).await;
        h.seed("bob", 2).await;

        h.send(ALICE, "@cultbot tip @Bob 4").await;

        assert_eq!(h.balance_of("alice").await, Some(5));
        assert_eq!(h.balance_of("bob").await, Some(6));
        let channel = h.messenger.sent_to(CHANNEL);
        assert_eq!(channel, vec!["👉😎👉 alice just sent @Bob 4 CULT!".to_string()]);
    }

    #[tokio::test]
    async fn tip_uses_resolved_mentions() {
        let h = Harness::new();
        h.seed("alice", 9).await;

        let msg = IncomingMessage {
            chat_id: CHANNEL,
            user_id: UserId(1),
            account: AccountId::new("alice"),
            display_name: "Alice".to_string(),
            text: "@cultbot tip Carol 2".to_string(),
            mentions: vec![ResolvedMention {
                token: "Carol".to_string(),
                account: AccountId::new("id:77"),
            }],
        };
        h.bot.handle(&msg).await;

        assert_eq!(h.balance_of("id:77").await, Some(2));
        assert_eq!(h.balance_of("alice").await, Some(7));
    }

    #[tokio::test]
    async fn tip_with_bad_amount_is_silent() {
        let h = Harness::new();
        h.seed("alice", 9).await;

        h.send(ALICE, "@cultbot tip @user abc").await;

        assert_eq!(h.balance_of("alice").await, Some(9));
        assert_eq!(h.balance_of("user").await, None);
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn self_tip_is_rejected() {
        let h = Harness::new();
        h.seed("alice", 9).await;

        h.send(ALICE, "@cultbot tip @alice 4").await;

        assert_eq!(h.balance_of("alice").await, Some(9));
        assert_eq!(
            h.messenger.sent_to(ChatId(1)),
            vec![replies::SELF_TIP.to_string()]
        );
    }

    #[tokio::test]
    async fn failed_credit_still_debits_sender() {
        let ledger = Arc::new(FlakyLedger {
            failing_writes: vec![AccountId::new("bob")],
            ..Default::default()
        });
        ledger
            .inner
            .set_balance(&AccountId::new("alice"), 9)
            .await
            .unwrap();
        let h = Harness::with(ledger.clone(), FakePayout::default(), Policy::default());

        h.send(ALICE, "@cultbot tip @bob 4").await;

        assert_eq!(
            *ledger.set_balance_calls.lock().unwrap(),
            vec![AccountId::new("bob"), AccountId::new("alice")]
        );
        assert_eq!(h.balance_of("alice").await, Some(5));
        assert_eq!(h.balance_of("bob").await, None);
        let channel = h.messenger.sent_to(CHANNEL);
        assert_eq!(channel.len(), 1);
        assert!(channel[0].contains("connection reset"));
    }

    #[tokio::test]
    async fn balance_reports_and_materializes_row() {
        let h = Harness::new();

        h.send(BOB, "@cultbot balance").await;

        assert_eq!(h.balance_of("bob").await, Some(0));
        assert_eq!(
            h.messenger.sent_to(ChatId(2)),
            vec!["Your balance is <b>0</b> CULT".to_string()]
        );
    }

    #[tokio::test]
    async fn withdraw_below_minimum_never_pays() {
        let h = Harness::new();
        h.ledger
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        h.seed("alice", 14).await;

        h.send(ALICE, "@cultbot withdraw").await;

        assert!(h.payout.calls().is_empty());
        assert_eq!(h.balance_of("alice").await, Some(14));
    }

    #[tokio::test]
    async fn withdraw_without_address_never_pays() {
        let h = Harness::new();
        h.seed("alice", 50).await;

        h.send(ALICE, "@cultbot withdraw").await;

        assert!(h.payout.calls().is_empty());
        assert_eq!(h.balance_of("alice").await, Some(50));
        assert!(h.messenger.sent_to(ChatId(1))[0].contains("register YOUR_ADDRESS"));
    }

    #[tokio::test]
    async fn successful_withdraw_zeroes_balance() {
        let h = Harness::new();
        h.ledger
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        h.seed("alice", 42).await;

        h.send(ALICE, "@cultbot withdraw").await;

        assert_eq!(h.payout.calls(), vec![("0xabc".to_string(), 42)]);
        assert_eq!(h.balance_of("alice").await, Some(0));
        let dm = h.messenger.sent_to(ChatId(1));
        assert_eq!(dm.len(), 1);
        assert!(dm[0].contains("withdrew 42 CULT at <code>0xfeed</code>"));
    }

    #[tokio::test]
    async fn failed_payout_keeps_balance() {
        let h = Harness::with(
            Arc::new(MemoryLedger::new()),
            FakePayout::failing(),
            Policy::default(),
        );
        h.ledger
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        h.seed("alice", 20).await;

        h.send(ALICE, "@cultbot withdraw").await;

        assert_eq!(h.payout.calls().len(), 1);
        assert_eq!(h.balance_of("alice").await, Some(20));
        assert!(h.messenger.sent_to(ChatId(1))[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn failed_reset_is_reported_after_payout() {
        let ledger = Arc::new(FlakyLedger {
            failing_writes: vec![AccountId::new("alice")],
            ..Default::default()
        });
        ledger
            .inner
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        ledger
            .inner
            .set_balance(&AccountId::new("alice"), 30)
            .await
            .unwrap();
        let h = Harness::with(ledger, FakePayout::default(), Policy::default());

        h.send(ALICE, "@cultbot withdraw").await;

        assert_eq!(h.payout.calls().len(), 1);
        assert_eq!(h.balance_of("alice").await, Some(30));
        assert!(h.messenger.sent_to(CHANNEL)[0].contains("lost your CULT"));
        assert!(h.messenger.sent_to(ChatId(1))[0].contains("withdrew 30 CULT"));
    }

    #[tokio::test]
    async fn tip_of_entire_balance_leaves_zero() {
        let h = Harness::new();
        h.seed("alice", 7).await;

        h.send(ALICE, "@cultbot tip @bob 7").await;

        assert_eq!(h.balance_of("alice").await, Some(0));
        assert_eq!(h.balance_of("bob").await, Some(7));
    }

    #[tokio::test]
    async fn withdraw_of_exactly_the_minimum_pays_out() {
        let h = Harness::new();
        h.ledger
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        h.seed("alice", 15).await;

        h.send(ALICE, "@cultbot withdraw").await;

        assert_eq!(h.payout.calls(), vec![("0xabc".to_string(), 15)]);
        assert_eq!(h.balance_of("alice").await, Some(0));
    }

    fn closed_private_chats() -> FakeMessenger {
        FakeMessenger {
            closed: vec![ChatId(1), ChatId(2)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn private_replies_fall_back_to_the_chat() {
        let h = Harness::build(
            Arc::new(MemoryLedger::new()),
            FakePayout::default(),
            Policy::default(),
            closed_private_chats(),
        );
        h.seed("bob", 3).await;

        h.send(BOB, "@cultbot balance").await;

        assert_eq!(
            h.messenger.sent(),
            vec![(CHANNEL, "Your balance is <b>3</b> CULT".to_string())]
        );
    }

    #[tokio::test]
    async fn withdraw_confirmation_reaches_the_chat_when_private_chat_is_closed() {
        let h = Harness::build(
            Arc::new(MemoryLedger::new()),
            FakePayout::default(),
            Policy::default(),
            closed_private_chats(),
        );
        h.ledger
            .set_address(&AccountId::new("alice"), "0xabc")
            .await
            .unwrap();
        h.seed("alice", 20).await;

        h.send(ALICE, "@cultbot withdraw").await;

        let channel = h.messenger.sent_to(CHANNEL);
        assert_eq!(channel.len(), 1);
        assert!(channel[0].contains("<code>0xfeed</code>"));
    }

    #[tokio::test]
    async fn private_chat_commands_are_answered_once() {
        let h = Harness::build(
            Arc::new(MemoryLedger::new()),
            FakePayout::default(),
            Policy::default(),
            closed_private_chats(),
        );
        let msg = IncomingMessage {
            chat_id: ChatId(2),
            user_id: UserId(2),
            account: AccountId::new("bob"),
            display_name: "bob".to_string(),
            text: "@cultbot balance".to_string(),
            mentions: vec![],
        };

        h.bot.handle(&msg).await;

        assert!(h.messenger.sent().is_empty());
        assert_eq!(h.balance_of("bob").await, Some(0));
    }

    #[tokio::test]
    async fn register_tip_withdraw_walkthrough() {
        let policy = Policy {
            min_withdrawal: 10,
            ..Policy::default()
        };
        let h = Harness::with(Arc::new(MemoryLedger::new()), FakePayout::default(), policy);

        h.send(ALICE, "@cultbot register 0xABC").await;
        assert_eq!(h.balance_of("alice").await, Some(10));

        h.send(ALICE, "@cultbot tip @bob 4").await;
        assert_eq!(h.balance_of("alice").await, Some(6));
        assert_eq!(h.balance_of("bob").await, Some(4));

        h.send(BOB, "@cultbot withdraw").await;
        assert!(h.payout.calls().is_empty());
        assert_eq!(h.balance_of("bob").await, Some(4));
        assert!(h.messenger.sent_to(ChatId(2))[0].contains("at least 10 CULT"));
    }

    #[tokio::test]
    async fn usage_and_unknown_commands() {
        let h = Harness::new();

        h.send(ALICE, "@cultbot tip @bob").await;
        h.send(ALICE, "@cultbot moon").await;
        h.send(ALICE, "gm everyone").await;

        assert_eq!(
            h.messenger.sent(),
            vec![(CHANNEL, "🤔 Usage: tip @user [amount]".to_string())]
        );
    }

    #[tokio::test]
    async fn help_goes_to_channel() {
        let h = Harness::new();
        h.send(ALICE, "@cultbot help").await;

        let channel = h.messenger.sent_to(CHANNEL);
        assert_eq!(channel.len(), 1);
        assert!(channel[0].contains("CULT</b> tipbot"));
    }
}
