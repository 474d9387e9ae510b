use std::path::PathBuf;

use clap::{Parser, Subcommand};
use importer::csv_import::{parse_chips, parse_entries};
use storage::Database;
use storage::dto::import::ImportReport;
use storage::services::import::{import_chips, import_entries};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "racetime-import")]
#[command(about = "Bulk entry and chip registration from CSV", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import entries from `bib,first_name,last_name,club,class`
    Entries {
        #[arg(long)]
        event: i64,

        file: PathBuf,

        /// Parse and report without writing
        #[arg(long)]
        validate_only: bool,
    },
    /// Import chips from `bib,siac,primary`
    Chips {
        #[arg(long)]
        event: i64,

        file: PathBuf,

        #[arg(long)]
        validate_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("racetime_import={log_level},importer={log_level},storage={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Entries {
            event,
            file,
            validate_only,
        } => {
            let parsed = parse_entries(std::fs::File::open(&file)?)?;
            tracing::info!("Parsed {} entries from {}", parsed.rows.len(), file.display());

            let report = if validate_only {
                ImportReport {
                    imported: 0,
                    warnings: parsed.warnings,
                }
            } else {
                let db = connect(&cli.database_url).await?;
                import_entries(&db, event, parsed.rows)
                    .await?
                    .merge_warnings(parsed.warnings)
            };
            log_report(&report);
        }
        Commands::Chips {
            event,
            file,
            validate_only,
        } => {
            let parsed = parse_chips(std::fs::File::open(&file)?)?;
            tracing::info!("Parsed {} chips from {}", parsed.rows.len(), file.display());

            let report = if validate_only {
                ImportReport {
                    imported: 0,
                    warnings: parsed.warnings,
                }
            } else {
                let db = connect(&cli.database_url).await?;
                import_chips(&db, event, parsed.rows)
                    .await?
                    .merge_warnings(parsed.warnings)
            };
            log_report(&report);
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<Database, Box<dyn std::error::Error>> {
    tracing::info!("Connecting to database...");
    let db = Database::new(database_url).await?;
    db.run_migrations().await?;
    Ok(db)
}

fn log_report(report: &ImportReport) {
    for warning in &report.warnings {
        tracing::warn!("  {}", warning);
    }
    tracing::info!(
        "Summary: {} imported, {} warning(s)",
        report.imported,
        report.warnings.len()
    );
}
