//! # Export Commands
//!
//! Writes CSV to `--out`, or to stdout when no file is given.

use clap::{Args, Subcommand};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

use super::{print_json, Context, RangeArgs};
use crate::error::ApiError;
use tally_core::export;

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// Sales in a date range
    Sales {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        out: OutArgs,
    },
    /// Current inventory
    Stock(OutArgs),
    /// Expenses in a date range
    Expenses {
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        out: OutArgs,
    },
    /// All debtors
    Debtors(OutArgs),
}

#[derive(Args, Debug)]
pub struct OutArgs {
    /// Output file; stdout when omitted
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(ctx: &Context, command: ExportCommand) -> Result<(), ApiError> {
    let user = ctx.user().await?;
    let today = ctx.today();

    match command {
        ExportCommand::Sales { range, out } => {
            let range = range.resolve(today)?;
            let rows = ctx.db.sales().list(&user.id, &range).await?;
            write_to(&out, rows.len(), |w| export::write_sales(w, &rows))
        }
        ExportCommand::Stock(out) => {
            let rows = ctx.db.stock().list(&user.id, None).await?;
            write_to(&out, rows.len(), |w| export::write_stock(w, &rows))
        }
        ExportCommand::Expenses { range, out } => {
            let range = range.resolve(today)?;
            let rows = ctx.db.expenses().list(&user.id, &range, None).await?;
            write_to(&out, rows.len(), |w| export::write_expenses(w, &rows))
        }
        ExportCommand::Debtors(out) => {
            let rows = ctx.db.debtors().list(&user.id, None, None).await?;
            write_to(&out, rows.len(), |w| export::write_debtors(w, &rows))
        }
    }
}

/// Runs `write` against the chosen destination. A file export reports
/// what it wrote as JSON; a stdout export prints only the CSV.
fn write_to<F>(out: &OutArgs, rows: usize, write: F) -> Result<(), ApiError>
where
    F: FnOnce(&mut dyn Write) -> tally_core::CoreResult<()>,
{
    match &out.out {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write(&mut file)?;
            file.flush()?;

            info!(path = %path.display(), rows, "Exported CSV");
            print_json(&json!({ "file": path, "rows": rows }))
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
            lock.flush()?;
            Ok(())
        }
    }
}
