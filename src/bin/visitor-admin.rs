use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use visitor_counter::config::Config;
use visitor_counter::storage::{self, keys};
use visitor_counter::visits::StatsSnapshot;

#[derive(Parser)]
#[command(name = "visitor-admin")]
#[command(about = "Visitor counter store management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record table and indexes
    Init,
    /// Print aggregate statistics read directly from the store
    Stats {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete expired visitor locks
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("visitor_counter=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::connect(&config.store.url, config.store.max_connections).await?;

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::Init => {
            println!("✓ Store initialized");
        }
        Commands::Stats { json } => {
            let records = storage.query_by_kind(keys::METRIC_KIND).await?;
            let stats = StatsSnapshot::from_records(records);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total visits: {}", stats.total_visits);
                println!();
                println!("{:<20} {}", "Country", "Visits");
                println!("{}", "-".repeat(30));
                for (country, count) in &stats.countries {
                    println!("{:<20} {}", country, count);
                }
                println!();
                println!("{:<20} {}", "Device", "Visits");
                println!("{}", "-".repeat(30));
                for (device, count) in &stats.devices {
                    println!("{:<20} {}", device, count);
                }
            }
        }
        Commands::Purge => {
            let removed = storage.purge_expired(Utc::now()).await?;
            println!("✓ Removed {} expired visitor locks", removed);
        }
    }

    Ok(())
}
