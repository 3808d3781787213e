//! # tally
//!
//! Small-business bookkeeping from the command line.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       `tally <command>`                                 │
//! │                                                                         │
//! │  1. Initialize Logging ─────────────────────────────────────────────►   │
//! │     • tracing-subscriber with env filter, to stderr                     │
//! │     • Default: info,tally=debug,sqlx=warn; override with RUST_LOG       │
//! │                                                                         │
//! │  2. Load Configuration ─────────────────────────────────────────────►   │
//! │     • TALLY_* environment, then --db / --user / --password              │
//! │                                                                         │
//! │  3. Open Database ──────────────────────────────────────────────────►   │
//! │     • Create file if missing, run embedded migrations                   │
//! │                                                                         │
//! │  4. Run Command ────────────────────────────────────────────────────►   │
//! │     • Authenticate, call repositories, print JSON on stdout             │
//! │     • On failure: {"code", "message"} on stderr, exit status 1          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod config;
mod error;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{
    analytics::AnalyticsCommand, debt::DebtCommand, expense::ExpenseCommand,
    export::ExportCommand, remind::RemindCommand, sale::SaleCommand,
    settings::SettingsCommand, stock::StockCommand, user::UserCommand, Context,
};
use config::{CliConfig, Overrides};
use error::ApiError;

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Small-business bookkeeping", version)]
struct Cli {
    /// Database file (overrides TALLY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Account email (overrides TALLY_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Account password (overrides TALLY_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Stock(StockCommand),
    #[command(subcommand)]
    Sale(SaleCommand),
    #[command(subcommand)]
    Debt(DebtCommand),
    #[command(subcommand)]
    Expense(ExpenseCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    #[command(subcommand)]
    Analytics(AnalyticsCommand),
    #[command(subcommand)]
    Export(ExportCommand),
    #[command(subcommand)]
    Remind(RemindCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let rendered = serde_json::to_string_pretty(&err).context("failed to render error")?;
        eprintln!("{}", rendered);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), ApiError> {
    let config = CliConfig::load(Overrides {
        db_path: cli.db,
        user: cli.user,
        password: cli.password,
    })?;
    let ctx = Context::open(config).await?;

    let result = match cli.command {
        Command::User(command) => commands::user::run(&ctx, command).await,
        Command::Stock(command) => commands::stock::run(&ctx, command).await,
        Command::Sale(command) => commands::sale::run(&ctx, command).await,
        Command::Debt(command) => commands::debt::run(&ctx, command).await,
        Command::Expense(command) => commands::expense::run(&ctx, command).await,
        Command::Settings(command) => commands::settings::run(&ctx, command).await,
        Command::Analytics(command) => commands::analytics::run(&ctx, command).await,
        Command::Export(command) => commands::export::run(&ctx, command).await,
        Command::Remind(command) => commands::remind::run(&ctx, command).await,
    };

    ctx.db.close().await;
    info!(ok = result.is_ok(), "Done");
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_db=trace` - Trace the database layer only
/// - Default: `info,tally=debug,sqlx=warn`
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
