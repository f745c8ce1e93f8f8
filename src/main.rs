//! Is It Worth It?
//!
//! Look up a food product, see how much exercise it takes to burn it off,
//! find healthier alternatives and keep a history of your verdicts.

mod alternatives;
mod calculator;
mod db;
mod food_api;
mod history;
mod models;
mod report;
mod scanner;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, warn};
use rusqlite::Connection;
use uuid::Uuid;

use crate::food_api::{FoodApiConfig, OpenFoodFactsClient};
use crate::history::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
use crate::models::{CalorieValue, Product, Verdict};
use crate::scanner::{ScanEvent, ScanFailure, ScanSession};

#[derive(Parser)]
#[command(name = "worthit")]
#[command(about = "How much exercise is that snack worth?")]
struct Cli {
    /// Path to the SQLite database holding your verdict history
    #[arg(short, long, env = "WORTHIT_DATABASE", default_value = "worthit.db")]
    database: PathBuf,

    /// Keep history in memory only; nothing is written to disk
    #[arg(long)]
    in_memory: bool,

    /// Open Food Facts base URL
    #[arg(long, env = "WORTHIT_API_URL", default_value = food_api::DEFAULT_BASE_URL)]
    base_url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a product by barcode
    Lookup {
        barcode: String,

        /// Also search for healthier alternatives
        #[arg(short, long)]
        alternatives: bool,
    },

    /// Search products by name
    Search { query: String },

    /// Show burn estimates for a calorie value
    Burn {
        /// Energy in kcal
        kcal: f64,
    },

    /// Record whether a product was worth it
    Verdict {
        barcode: String,

        #[arg(value_enum)]
        verdict: VerdictArg,
    },

    /// List recorded verdicts, newest first
    History,

    /// Delete a recorded verdict
    Remove { id: Uuid },

    /// Delete every recorded verdict
    ClearHistory,

    /// Show verdict statistics
    Stats,

    /// Read barcodes from a scanner (stdin unless --device is given)
    Scan {
        /// Scanner device or capture file
        #[arg(long)]
        device: Option<PathBuf>,

        /// Also search for healthier alternatives
        #[arg(short, long)]
        alternatives: bool,
    },

    /// Initialize empty database with schema
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum VerdictArg {
    WorthIt,
    NotWorthIt,
}

impl From<VerdictArg> for Verdict {
    fn from(arg: VerdictArg) -> Self {
        match arg {
            VerdictArg::WorthIt => Verdict::WorthIt,
            VerdictArg::NotWorthIt => Verdict::NotWorthIt,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut store: Box<dyn HistoryStore> = if cli.in_memory {
        Box::new(MemoryHistoryStore::default())
    } else {
        Box::new(SqliteHistoryStore::new(Connection::open(&cli.database)?)?)
    };
    let client = OpenFoodFactsClient::new(FoodApiConfig {
        base_url: cli.base_url.trim_end_matches('/').to_string(),
        timeout_secs: cli.timeout_secs,
        ..Default::default()
    })?;

    match cli.command {
        Commands::Lookup {
            barcode,
            alternatives,
        } => {
            if let Some(product) = lookup(&client, &barcode).await {
                show_product(&client, &product, alternatives).await;
            }
        }

        Commands::Search { query } => match client.search_products(&query).await {
            Ok(products) if products.is_empty() => println!("No products found for '{query}'"),
            Ok(products) => {
                println!("{:<15} {:>10}  {}", "Barcode", "kcal", "Product");
                println!("{}", "-".repeat(60));
                for p in products {
                    let energy = calculator::extract_calories(&p.nutriments)
                        .map_or_else(|| "?".to_string(), |c| format!("{:.0}", c.kcal()));
                    println!("{:<15} {:>10}  {}", p.code, energy, p.display_name());
                }
            }
            Err(e) => {
                warn!("Search failed: {e}");
                println!("Search failed: {e}");
            }
        },

        Commands::Burn { kcal } => match CalorieValue::new(kcal) {
            Some(calories) => {
                println!("{}", report::format_estimates(&calculator::calculate_exercise(calories)));
            }
            None => println!("Calories must be a non-negative number"),
        },

        Commands::Verdict { barcode, verdict } => {
            if let Some(product) = lookup(&client, &barcode).await {
                match calculator::extract_calories(&product.nutriments) {
                    Some(calories) => {
                        let entry =
                            history::record_verdict(store.as_mut(), product, verdict.into(), calories)?;
                        println!(
                            "Recorded: {} is {} ({:.2} kcal) [{}]",
                            entry.product.display_name(),
                            entry.verdict,
                            entry.calories.kcal(),
                            entry.id
                        );
                    }
                    None => println!(
                        "Could not calculate calories for {}; verdict not recorded",
                        product.display_name()
                    ),
                }
            }
        }

        Commands::History => {
            let entries = store.load()?;
            if entries.is_empty() {
                println!("No verdicts yet. Run 'verdict' after looking up a product.");
            } else {
                print!("{}", report::format_history(&entries));
            }
        }

        Commands::Remove { id } => {
            let before = store.load()?.len();
            let remaining = store.remove(id)?;
            if remaining.len() < before {
                println!("Removed {id}. {} verdicts left.", remaining.len());
            } else {
                println!("No verdict with id {id}");
            }
        }

        Commands::ClearHistory => {
            store.clear()?;
            println!("History cleared");
        }

        Commands::Stats => {
            let stats = history::get_stats(store.as_ref())?;
            println!("{}", stats);
        }

        Commands::Scan {
            device,
            alternatives,
        } => {
            scan(&client, device, alternatives).await;
        }

        Commands::Init => {
            println!("{}", init_message(cli.in_memory, &cli.database));
        }
    }

    Ok(())
}

fn init_message(in_memory: bool, database: &Path) -> String {
    if in_memory {
        "History is kept in memory only; no database was created".to_string()
    } else {
        format!("Database initialized at: {}", database.display())
    }
}

/// Fetch a product, turning every failure into a message for the user
async fn lookup(client: &OpenFoodFactsClient, barcode: &str) -> Option<Product> {
    match client.get_product(barcode).await {
        Ok(Some(product)) => Some(product),
        Ok(None) => {
            println!("Product '{barcode}' not found");
            None
        }
        Err(e) => {
            warn!("Lookup of {barcode} failed: {e}");
            println!("Could not look up '{barcode}': {e}");
            None
        }
    }
}

async fn show_product(client: &OpenFoodFactsClient, product: &Product, with_alternatives: bool) {
    let calories = calculator::extract_calories(&product.nutriments);
    println!("{}", report::format_product(product, calories));

    match calories {
        Some(c) => println!("{}", report::format_estimates(&calculator::calculate_exercise(c))),
        None => println!("Could not calculate calories.\n"),
    }

    if with_alternatives {
        let found = alternatives::find_alternatives(client, product).await;
        if !found.is_empty() {
            println!("{}", report::format_alternatives(&found));
        }
    }
}

async fn scan(client: &OpenFoodFactsClient, device: Option<PathBuf>, with_alternatives: bool) {
    let mut session = match device {
        Some(path) => match ScanSession::from_device(&path).await {
            Ok(session) => session,
            Err(ScanFailure::PermissionDenied(msg)) => {
                println!("Scanner access denied ({msg}). Grant read access and run 'scan' again.");
                return;
            }
            Err(e) => {
                println!("Could not start scanner: {e}");
                return;
            }
        },
        None => ScanSession::from_stdin(),
    };

    println!("Waiting for barcodes (end input to stop)...");
    while let Some(event) = session.next_event().await {
        match event {
            ScanEvent::Decoded(barcode) => {
                if let Some(product) = lookup(client, &barcode).await {
                    show_product(client, &product, with_alternatives).await;
                }
            }
            ScanEvent::Failure(ScanFailure::PermissionDenied(msg)) => {
                println!("Scanner access denied ({msg}). Grant read access and run 'scan' again.");
            }
            ScanEvent::Failure(failure) => debug!("Ignoring scan: {failure}"),
        }
    }
    session.stop().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_names_the_database_file() {
        assert_eq!(
            init_message(false, Path::new("worthit.db")),
            "Database initialized at: worthit.db"
        );
    }

    #[test]
    fn init_in_memory_does_not_claim_a_file() {
        let message = init_message(true, Path::new("worthit.db"));
        assert!(!message.contains("worthit.db"));
        assert!(message.contains("memory"));
    }

    #[test]
    fn cli_accepts_in_memory_init() {
        let cli = Cli::try_parse_from(["worthit", "--in-memory", "init"]).unwrap();
        assert!(cli.in_memory);
        assert!(matches!(cli.command, Commands::Init));
    }
}
