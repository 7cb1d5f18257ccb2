pub mod bank;
pub mod init;
pub mod purchases;
pub mod review;
pub mod rules;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::importer::Layout;
use crate::reviewer::ReferenceMode;
use crate::settings::{shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "releve",
    version,
    about = "Turns bank statement exports into accounting import files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a bank export and write the import and summary files.
    Bank {
        /// Bank export: XLSX workbook (transactions + tier mapping sheets) or CSV
        file: PathBuf,
        /// Tier mapping table, required when FILE is a CSV
        #[arg(long)]
        mapping: Option<PathBuf>,
        /// Column layout of the export (default from settings)
        #[arg(long, value_enum)]
        layout: Option<Layout>,
        /// Reference tagging for rows without one (default from settings)
        #[arg(long, value_enum)]
        references: Option<ReferenceMode>,
        /// Output directory (default from settings)
        #[arg(long)]
        output: Option<String>,
        /// Skip writing the summary file
        #[arg(long = "no-summary")]
        no_summary: bool,
    },
    /// Convert a purchases listing into a purchases journal.
    Purchases {
        /// Purchases listing (XLSX or CSV, 9 columns)
        file: PathBuf,
        /// Output directory (default from settings)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show the classification rules in evaluation order.
    Rules,
    /// Write the settings file.
    Init {
        /// Default output directory (default: ~/Documents/releve)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
}

/// `--output` when given, otherwise the configured directory.
pub(crate) fn output_dir(settings: &Settings, flag: Option<&str>) -> PathBuf {
    PathBuf::from(shellexpand_path(flag.unwrap_or(&settings.output_dir)))
}
