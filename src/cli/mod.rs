use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{parse_kind, parse_quantity, StockService};

/// Stockledger - append-only stock movement ledger
#[derive(Parser)]
#[command(name = "stockledger")]
#[command(about = "Records stock movements and derives stock levels by replaying them")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "STOCKLEDGER_DATABASE",
        default_value = "data/inventory.db",
        global = true
    )]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "STOCKLEDGER_LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "STOCKLEDGER_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },

    /// Record a stock movement
    Move {
        /// Product identifier
        product: String,

        /// Movement type: IN, SALE or REMOVAL
        kind: String,

        /// Number of units (non-negative)
        quantity: String,
    },

    /// Show stock for a product or all products
    Stock {
        /// Product identifier (omit for all products)
        product: Option<String>,
    },

    /// List the movements of a product
    History {
        /// Product identifier
        product: String,

        /// Maximum number of movements to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show received, sold and removed totals for a product
    Summary {
        /// Product identifier
        product: String,
    },

    /// Show a single movement
    Show {
        /// Movement id
        id: i64,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        what: ExportKind,

        /// Output format (ignored for `full`, which is always JSON)
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Movements,
    Stock,
    Full,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                StockService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve { bind } => {
                let service = StockService::init(&self.database).await?;
                tracing::info!(database = %self.database, "Starting stock ledger API");
                crate::api::serve(service, bind).await?;
            }

            Commands::Move {
                product,
                kind,
                quantity,
            } => {
                let service = StockService::connect(&self.database).await?;
                let kind = parse_kind(&kind)?;
                let quantity = parse_quantity(&quantity)
                    .context("Quantity must be a non-negative whole number")?;

                let movement = service.record_movement(&product, kind, quantity).await?;
                println!(
                    "Recorded movement #{}: {} {} x{}",
                    movement.id, movement.kind, movement.product, movement.quantity
                );
            }

            Commands::Stock { product } => {
                let service = StockService::connect(&self.database).await?;
                run_stock_command(&service, product).await?;
            }

            Commands::History { product, limit } => {
                let service = StockService::connect(&self.database).await?;
                run_history_command(&service, &product, limit).await?;
            }

            Commands::Summary { product } => {
                let service = StockService::connect(&self.database).await?;
                let summary = service.get_summary(&product).await?;

                println!("Product:   {}", summary.product);
                println!("Movements: {}", summary.movements);
                println!();
                println!("  {:<10} {:>10}", "Received:", summary.received);
                println!("  {:<10} {:>10}", "Sold:", summary.sold);
                println!("  {:<10} {:>10}", "Removed:", summary.removed);
                println!("  {}", "-".repeat(21));
                println!("  {:<10} {:>10}", "Stock:", summary.stock);
            }

            Commands::Show { id } => {
                let service = StockService::connect(&self.database).await?;
                let movement = service.get_movement(id).await?;

                println!("Movement:  {}", movement.id);
                println!("Product:   {}", movement.product);
                println!("Type:      {}", movement.kind);
                println!("Quantity:  {}", movement.quantity);
                println!("Recorded:  {}", movement.timestamp.to_rfc3339());
            }

            Commands::Check => {
                let service = StockService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                what,
                format,
                output,
            } => {
                let service = StockService::connect(&self.database).await?;
                run_export_command(&service, what, format, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_stock_command(service: &StockService, product: Option<String>) -> Result<()> {
    match product {
        Some(product) => {
            let level = service.get_stock(&product).await?;
            println!("{}: {}", level.product, level.stock);
        }
        None => {
            let levels = service.get_all_stock().await?;
            if levels.is_empty() {
                println!("No stock movements recorded.");
            } else {
                println!("{:<30} {:>10}", "PRODUCT", "STOCK");
                println!("{}", "-".repeat(41));
                for level in levels {
                    println!("{:<30} {:>10}", truncate(&level.product, 30), level.stock);
                }
            }
        }
    }
    Ok(())
}

async fn run_history_command(
    service: &StockService,
    product: &str,
    limit: Option<usize>,
) -> Result<()> {
    let movements = service.list_movements(Some(product), limit).await?;

    if movements.is_empty() {
        println!("No movements found for {}.", product);
        return Ok(());
    }

    println!(
        "{:>8} {:<20} {:<8} {:>10} {:>10}",
        "ID", "RECORDED", "TYPE", "QUANTITY", "RUNNING"
    );
    println!("{}", "-".repeat(60));

    let mut running: i64 = 0;
    for movement in &movements {
        running = running.saturating_add(movement.delta());
        println!(
            "{:>8} {:<20} {:<8} {:>10} {:>10}",
            movement.id,
            movement.timestamp.format("%Y-%m-%d %H:%M:%S"),
            movement.kind.as_str(),
            movement.quantity,
            running
        );
    }

    Ok(())
}

async fn run_check_command(service: &StockService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Movements: {}", report.movement_count);
    println!("Products:  {}", report.product_count);
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &StockService,
    what: ExportKind,
    format: ExportFormat,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let summary = match (what, format) {
        (ExportKind::Movements, ExportFormat::Csv) => {
            format!("{} movements", exporter.export_movements_csv(writer).await?)
        }
        (ExportKind::Movements, ExportFormat::Json) => {
            format!("{} movements", exporter.export_movements_json(writer).await?)
        }
        (ExportKind::Stock, ExportFormat::Csv) => {
            format!("{} stock levels", exporter.export_stock_csv(writer).await?)
        }
        (ExportKind::Stock, ExportFormat::Json) => {
            format!("{} stock levels", exporter.export_stock_json(writer).await?)
        }
        (ExportKind::Full, _) => {
            let snapshot = exporter.export_full_json(writer).await?;
            format!(
                "full ledger: {} movements, {} products",
                snapshot.movements.len(),
                snapshot.stock.len()
            )
        }
    };

    if output.is_some() {
        eprintln!("Exported {}", summary);
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
