use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sell_through_lib::commands::{self, AppContext, RunSearchRequest};
use sell_through_lib::infrastructure::config::{ConfigManager, SessionDriver};
use sell_through_lib::infrastructure::logging::{bootstrap_logging, init_logging_with_config, log_system_info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Check marketplace sell-through for a list of items", long_about = None)]
struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every item and record its sell-through
    Run {
        /// Appended to every item, e.g. "front bumper"
        #[arg(short, long)]
        qualifier: String,

        /// Items file (.json, .csv or plain text, one item per line)
        #[arg(short, long)]
        items: Option<PathBuf>,

        /// How result pages are loaded
        #[arg(short, long, value_enum)]
        driver: Option<DriverArg>,

        /// Extra items, searched after the file's items
        item: Vec<String>,
    },
    /// Show stored history, highest sell-through first
    Report {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write stored history to a CSV file
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge exported CSV files into the history, skipping terms already stored
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete one history entry by its search term
    Remove { search_term: String },
    /// Delete all stored history
    Clear,
    /// Inspect or reset the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    Path,
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DriverArg {
    Webdriver,
    Http,
}

impl From<DriverArg> for SessionDriver {
    fn from(value: DriverArg) -> Self {
        match value {
            DriverArg::Webdriver => Self::Webdriver,
            DriverArg::Http => Self::Http,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // config loading reports backups and first-run defaults before file logging exists
    let bootstrap = bootstrap_logging();
    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let ctx = AppContext::load(manager).await?;
    drop(bootstrap);

    let log_dir = ctx.config.storage.logs_dir()?;
    if let Err(e) = init_logging_with_config(&ctx.config.logging, &log_dir) {
        eprintln!("Failed to initialize logging: {e:#}");
    }
    log_system_info();

    match cli.command {
        Command::Run { qualifier, items, driver, item } => {
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("🛑 Stop requested; finishing the current item");
                    ctrl_c.cancel();
                }
            });

            let request = RunSearchRequest {
                qualifier,
                items_file: items,
                items: item,
                driver: driver.map(SessionDriver::from),
            };
            let report = commands::run_search(&ctx, request, cancel).await?;

            info!(run_id = %report.run_id, "Run finished with status {}", report.status);
            println!("{} ({}/{} items)", report.status, report.processed, report.total);
            if let Some(failure) = &report.failure {
                println!("Error: {failure}");
            }

            let history = commands::history_report(&ctx).await?;
            print!("{}", commands::format_report(&history));
        }
        Command::Report { json } => {
            let report = commands::history_report(&ctx).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", commands::format_report(&report));
            }
        }
        Command::Export { output } => {
            let path = commands::export_history(&ctx, output).await?;
            println!("Exported history to {}", path.display());
        }
        Command::Import { files } => {
            let imports = commands::import_history(&ctx, &files).await?;
            print!("{}", commands::format_imports(&imports));
        }
        Command::Remove { search_term } => {
            if commands::remove_entry(&ctx, &search_term).await? {
                println!("Removed '{search_term}'");
            } else {
                println!("No entry for '{search_term}'");
            }
        }
        Command::Clear => {
            commands::clear_history(&ctx).await?;
            println!("History cleared");
        }
        Command::Config { action } => match action {
            ConfigAction::Show => println!("{}", commands::show_config(&ctx)?),
            ConfigAction::Path => println!("{}", commands::config_path(&ctx).display()),
            ConfigAction::Reset => {
                commands::reset_config(&ctx).await?;
                println!("Configuration reset to defaults");
            }
        },
    }

    Ok(())
}
