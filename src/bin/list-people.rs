use clap::Parser;
use legislator_scraper::store::{Options, SqliteAdapter};
use legislator_scraper::Table;
use tracing_subscriber::prelude::*;

/// Print the people stored in a SQLite database, one per line.
#[derive(Debug, Parser)]
struct Args {
    /// Database file written by `legislator-scraper --store sqlite://<file>`
    #[arg(default_value = "legislators.db")]
    database: String,

    /// Table holding the people
    #[arg(long, default_value = "people")]
    table: String,
}

async fn list_people(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::from([("table".to_string(), args.table)]);
    let store = SqliteAdapter::new(&args.database, &options).await?;
    for name in store.people.names().await? {
        println!("{}", name);
    }
    eprintln!("{} people", store.people.count().await?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    list_people(Args::parse()).await
}
