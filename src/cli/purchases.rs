use std::path::Path;

use colored::Colorize;
use rust_decimal::Decimal;

use crate::cli::output_dir;
use crate::error::{ReleveError, Result};
use crate::exporter::{output_path, render, write_files, write_purchases};
use crate::fmt::amount;
use crate::importer::read_sheets;
use crate::purchases::parse_purchases;
use crate::settings::load_settings;

pub fn run(file: &Path, output: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let sheet = read_sheets(file)?
        .into_iter()
        .next()
        .ok_or_else(|| ReleveError::MissingSheet(format!("purchases in {}", file.display())))?;
    let rows = parse_purchases(&sheet)?;

    let dir = output_dir(&settings, output);
    let path = output_path(&dir, file, "achats")?;
    let body = render(|buf| write_purchases(buf, &rows))?;
    write_files(&dir, &[(path.clone(), body)])?;

    let total: Decimal = rows.iter().map(|r| r.amount).sum();
    println!("{} purchases, {} total", rows.len(), amount(total));
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
