//! CLI argument parsing for the bakemate-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::types::EntityKind;

#[derive(Parser)]
#[command(name = "bakemate-worker", about = "BakeMate bulk import worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Import a workbook, archive or CSV file as a job and print the result
    Import {
        /// Account that will own the imported records
        #[arg(long)]
        account: Uuid,
        /// File to import (.xlsx, .zip or *Orders*.csv style CSV)
        #[arg(long)]
        file: PathBuf,
    },
    /// Import every matching CSV in a directory and print the counts
    Scan {
        #[arg(long)]
        account: Uuid,
        /// orders, expenses, mileage, ingredients or supplies
        #[arg(long)]
        kind: EntityKind,
        /// Defaults to IMPORT_DIR
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
