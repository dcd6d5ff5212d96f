use clap::{Parser, ValueEnum};
use legislator_scraper::{
    select::PEOPLE, CancelFlag, Connection, ConnectionDescriptor, FetchConfig, HttpClient,
    Registry, RowPolicy, Runner, ScrapeConfig,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Scrape the source.
    Scrape,
    /// Persist what was scraped to the store.
    Import,
}

/// Scrape legislators from parl.gc.ca, e.g. `legislator-scraper -- parliament 37`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Actions to perform; without `import` records are printed instead of stored
    #[arg(long = "action", value_enum, default_values_t = [Action::Scrape, Action::Import])]
    actions: Vec<Action>,

    /// Scraping task to run
    #[arg(long, default_value = PEOPLE)]
    task: String,

    /// Storage as scheme://address[?key=value&...] (mongodb, sqlite or jsonl)
    #[arg(long, default_value = "sqlite://legislators.db")]
    store: ConnectionDescriptor,

    /// What to do with a row that cannot be parsed
    #[arg(long, value_enum, default_value_t = RowPolicy::Abort)]
    on_row_error: RowPolicy,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Retries after a transport error or server error
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Scraping criteria as `key value` pairs, e.g. `parliament 37`
    #[arg(last = true)]
    criteria: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();
    let config = ScrapeConfig::from_pairs(args.criteria)
        .ok_or("criteria must be given as `key value` pairs")?;

    if !args.actions.contains(&Action::Scrape) {
        warn!("Nothing to do without the scrape action");
        return Ok(ExitCode::SUCCESS);
    }
    let store = if args.actions.contains(&Action::Import) {
        args.store
    } else {
        "jsonl://-".parse()?
    };

    let client = HttpClient::new(
        "http",
        Level::INFO,
        FetchConfig {
            timeout: Duration::from_secs(args.timeout),
            retries: args.retries,
            ..FetchConfig::default()
        },
    )?;
    let connection = Connection::open(&store).await?;

    let cancel = CancelFlag::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current record");
            on_ctrl_c.cancel();
        }
    });

    let runner = Runner::new(Registry::default(), Arc::new(client), connection)
        .row_policy(args.on_row_error)
        .cancel_flag(cancel);

    match runner.run(&args.task, &config).await {
        Ok(summary) => {
            info!(
                "Completed {} with {}: {} dispatched to {}, {} skipped{}",
                summary.task,
                summary.strategy,
                summary.dispatched,
                store,
                summary.skipped,
                if summary.cancelled { " (cancelled)" } else { "" }
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
