use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use tipbot_core::{
    config::{Config, LedgerBackend, DEFAULT_STATUS_PORT},
    ledger::{LedgerStore, MemoryLedger},
    payout::PayoutGateway,
    status,
};
use tipbot_eth::EthPayoutGateway;
use tipbot_pg::PgLedger;

#[derive(Parser, Debug)]
#[command(name = "tipbot", about = "Chat tip bot for an ERC-20 token")]
struct Cli {
    /// Port for the status endpoint.
    #[arg(long, default_value_t = DEFAULT_STATUS_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), tipbot_core::Error> {
    let cli = Cli::parse();
    tipbot_core::logging::init("tipbot")?;

    let mut cfg = Config::load()?;
    cfg.status_port = cli.port;
    let cfg = Arc::new(cfg);

    let ledger: Arc<dyn LedgerStore> = match cfg.ledger_backend {
        LedgerBackend::Postgres => {
            let url = cfg.database_url.as_deref().ok_or_else(|| {
                tipbot_core::Error::Config("DATABASE_URL is required for the postgres ledger".into())
            })?;
            let pg = PgLedger::connect(url).await?;
            pg.migrate().await?;
            Arc::new(pg)
        }
        LedgerBackend::Memory => {
            info!("using in-memory ledger; balances are lost on restart");
            Arc::new(MemoryLedger::new())
        }
    };
    let payout: Arc<dyn PayoutGateway> = Arc::new(EthPayoutGateway::new(&cfg)?);

    let listener = status::bind(cfg.status_port).await?;
    tokio::spawn(async move {
        if let Err(e) = status::serve(listener).await {
            error!("status endpoint stopped: {e}");
        }
    });

    tipbot_telegram::router::run_polling(cfg, ledger, payout)
        .await
        .map_err(|e| tipbot_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
