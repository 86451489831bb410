//! Rates CLI
//!
//! Command-line interface for the FX Rates API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use rates_client::RatesClient;
use rates_types::{CurrencyPair, HistoryPeriod, RateId};

#[derive(Parser)]
#[command(name = "rates")]
#[command(author, version, about = "FX rates API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Rates API
    #[arg(long, env = "RATES_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Fetch a quote from the provider and stage it
    Stage {
        /// Currency pair, e.g. EUR/USD
        pair: String,
    },
    /// Confirm the oldest staged quote
    Confirm,
    /// Get a confirmed rate by id
    Get {
        /// Rate ID (UUID)
        id: String,
    },
    /// Latest rate of a pair
    Last {
        /// Currency pair, e.g. EUR/USD
        pair: String,
    },
    /// Latest rate of every stored pair with its change
    All,
    /// Override the rate of a pair
    Set {
        #[arg(long)]
        currency: String,
        #[arg(long)]
        base: String,
        #[arg(long)]
        rate: Decimal,
    },
    /// Delete the whole history of a pair
    Delete { currency: String, base: String },
    /// Rates of a pair within a look-back window
    History {
        #[arg(long)]
        currency: String,
        #[arg(long)]
        base: String,
        /// One of 15m, 1h, 1d, 1w, 1mo
        #[arg(long, default_value = "1d")]
        period: String,
    },
}

fn parse_pair(s: &str) -> Result<CurrencyPair> {
    Ok(CurrencyPair::parse(s)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_optional<T: Serialize>(value: Option<T>, missing: &str) -> Result<()> {
    match value {
        Some(value) => print_json(&value),
        None => {
            println!("{}", missing);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = RatesClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Stage { pair } => {
            let rate_id = client.stage(&parse_pair(&pair)?).await?;
            println!("{}", rate_id);
        }

        Commands::Confirm => {
            print_optional(client.confirm().await?, "Queue is empty")?;
        }

        Commands::Get { id } => {
            let rate_id: RateId = id
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid rate ID: {}", id))?;
            print_optional(client.get_by_id(rate_id).await?, "No confirmed rate with that id")?;
        }

        Commands::Last { pair } => {
            let latest = client.latest(&parse_pair(&pair)?).await?;
            print_optional(latest, "No rate stored for that pair")?;
        }

        Commands::All => {
            print_json(&client.all_latest().await?)?;
        }

        Commands::Set {
            currency,
            base,
            rate,
        } => {
            let pair = CurrencyPair::new(currency, base);
            print_json(&client.update_rate(&pair, rate).await?)?;
        }

        Commands::Delete { currency, base } => {
            let deleted = client.delete_pair(&CurrencyPair::new(currency, base)).await?;
            println!("✓ Deleted {} rate(s)", deleted);
        }

        Commands::History {
            currency,
            base,
            period,
        } => {
            let period: HistoryPeriod = period.parse()?;
            let rows = client
                .history(&CurrencyPair::new(currency, base), period)
                .await?;
            print_json(&rows)?;
        }
    }

    Ok(())
}
