mod categorizer;
mod cli;
mod error;
mod exporter;
mod fmt;
mod importer;
mod labels;
mod models;
mod pipeline;
mod purchases;
mod reports;
mod reviewer;
mod settings;
mod splitter;
mod tiers;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::bank::BankOptions;
use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_env("RELEVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Bank {
            file,
            mapping,
            layout,
            references,
            output,
            no_summary,
        } => cli::bank::run(
            &file,
            BankOptions {
                mapping: mapping.as_deref(),
                layout,
                references,
                output: output.as_deref(),
                no_summary,
            },
        ),
        Commands::Purchases { file, output } => cli::purchases::run(&file, output.as_deref()),
        Commands::Rules => cli::rules::run(),
        Commands::Init { output_dir } => cli::init::run(output_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
