use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use wallet_history_sync::config::{SyncConfig, DEFAULT_PAGE_SIZE};
use wallet_history_sync::history::api::DEFAULT_ACCOUNT;
use wallet_history_sync::history::client::{HttpHistoryClient, MockHistoryClient};
use wallet_history_sync::history::{
    normalize, HistoryFetchClient, HistoryPresence, HistoryView, LifecycleSignal, LogErrorSink,
    TransactionRecord, WalletIdentity,
};
use wallet_history_sync::scheduler::PollingScheduler;
use wallet_history_sync::FetchError;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://localhost:37221")]
    api_url: String,

    #[arg(long)]
    wallet_name: String,

    #[arg(long, default_value = DEFAULT_ACCOUNT)]
    account_name: String,

    #[arg(long, default_value_t = 5_000)]
    interval_ms: u64,

    /// 0 waits on the wallet API indefinitely
    #[arg(long, default_value_t = 30_000)]
    fetch_timeout_ms: u64,

    /// Transport timeout of the HTTP client itself; 0 leaves it unset
    #[arg(long, default_value_t = 0)]
    http_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    take: u32,

    /// Fetch and print one page, then exit
    #[arg(long)]
    once: bool,

    /// Serve a canned history instead of calling the wallet API
    #[arg(long)]
    demo: bool,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        let timeout = match self.fetch_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        SyncConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_fetch_timeout(timeout)
            .with_take(self.take)
    }

    fn wallet(&self) -> WalletIdentity {
        WalletIdentity::new(self.wallet_name.clone()).with_account(self.account_name.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    log::info!("[MAIN] wallet={} api={}", args.wallet_name, args.api_url);

    if args.demo {
        log::info!("[MAIN] demo mode, wallet API is not contacted");
        run(&args, Arc::new(MockHistoryClient::demo())).await
    } else {
        let client = match args.http_timeout_ms {
            0 => HttpHistoryClient::new(args.api_url.clone()),
            ms => HttpHistoryClient::with_timeout(args.api_url.clone(), Duration::from_millis(ms))?,
        };
        run(&args, Arc::new(client)).await
    }
}

async fn run<C: HistoryFetchClient + 'static>(args: &Args, client: Arc<C>) -> Result<()> {
    if args.once {
        run_once(args, client.as_ref()).await
    } else {
        run_watch(args, client).await
    }
}

async fn run_once<C: HistoryFetchClient>(args: &Args, client: &C) -> Result<()> {
    let config = args.sync_config();
    let wallet = args.wallet();

    let request = client.fetch_history(&wallet, config.skip, config.take);
    let response = match config.fetch_timeout {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| FetchError::Timeout(limit))??,
        None => request.await?,
    };

    let normalized = normalize(Some(&response));
    print_records(
        &wallet,
        &normalized.records,
        HistoryPresence::from_flag(normalized.presence),
    );
    Ok(())
}

async fn run_watch<C: HistoryFetchClient + 'static>(args: &Args, client: Arc<C>) -> Result<()> {
    let mut view = HistoryView::new(
        PollingScheduler::new(),
        client,
        Arc::new(LogErrorSink),
        args.wallet(),
        args.sync_config(),
    )?;

    view.on_mount()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut refresh = tokio::time::interval(Duration::from_millis(250));
    let mut shown: Option<(Vec<TransactionRecord>, HistoryPresence)> = None;

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                log::info!("[MAIN] interrupted, unmounting");
                break;
            }
            _ = refresh.tick() => {
                let snap = view.snapshot();
                if snap.presence == HistoryPresence::Pending {
                    continue;
                }

                let current = (snap.records, snap.presence);
                if shown.as_ref() != Some(&current) {
                    print_records(view.wallet(), &current.0, current.1);
                    shown = Some(current);
                }
            }
        }
    }

    view.on_unmount()?;
    Ok(())
}

fn print_records(wallet: &WalletIdentity, records: &[TransactionRecord], presence: HistoryPresence) {
    println!();
    println!("==================================================================");
    println!(" HISTORY  {} / {}", wallet.wallet_name, wallet.account_name);
    println!("==================================================================");

    match presence {
        HistoryPresence::Pending => {
            println!("Waiting for the first response...");
            return;
        }
        HistoryPresence::Empty => {
            println!("No transactions.");
            return;
        }
        HistoryPresence::Present => {}
    }

    println!(
        "{:<9} | {:>14} | {:>10} | {:>8} | {}",
        "Kind", "Amount", "Fee", "Block", "Id"
    );
    println!("------------------------------------------------------------------");

    for r in records {
        println!(
            "{:<9} | {:>14} | {:>10} | {:>8} | {}",
            r.kind,
            r.amount.map(|v| v.to_string()).unwrap_or("-".into()),
            r.fee,
            r.confirmed_in_block
                .map(|v| v.to_string())
                .unwrap_or("-".into()),
            r.id.as_deref().unwrap_or("-"),
        );
    }
}
