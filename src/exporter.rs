use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;

use crate::error::{ReleveError, Result};
use crate::fmt;
use crate::models::TransactionRow;
use crate::purchases::{PurchaseRow, PURCHASES_ACCOUNT};
use crate::reports::AggregationRow;

const DELIMITER: u8 = b';';

pub const IMPORT_HEADER: [&str; 8] = ["DATE", "N PIECE", "CPT", "TIERS", "LIB", "REF", "DEBIT", "CREDIT"];
pub const SUMMARY_HEADER: [&str; 4] = ["CPT", "LIB", "DEBIT", "CREDIT"];
pub const PURCHASES_HEADER: [&str; 15] = [
    "Date",
    "N FAC",
    "TIERS",
    "IF",
    "ICE",
    "DESIGNATION",
    "TTC",
    "HT",
    "TVA",
    "MODE REGL",
    "DATE REGL",
    "CPT HT",
    "CPT TVA",
    "TAUX TVA",
    "JOURNAL TRESORIE",
];

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(out)
}

fn finish<W: Write>(mut wtr: csv::Writer<W>) -> Result<()> {
    wtr.flush()?;
    Ok(())
}

/// The transformed table, one line per row, in the order given.
pub fn write_transformed<W: Write>(out: W, rows: &[TransactionRow]) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(IMPORT_HEADER)?;
    for row in rows {
        wtr.write_record([
            fmt::date(row.date),
            String::new(),
            row.account_code.map(|c| c.to_string()).unwrap_or_default(),
            row.resolved_tier.clone().unwrap_or_default(),
            row.label.clone().unwrap_or_default(),
            String::new(),
            fmt::plain_amount(row.debit),
            fmt::plain_amount(row.credit),
        ])?;
    }
    finish(wtr)
}

pub fn write_summary<W: Write>(out: W, rows: &[AggregationRow]) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(SUMMARY_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.key.to_string(),
            row.label.clone(),
            fmt::plain_amount(row.debit),
            fmt::plain_amount(row.credit),
        ])?;
    }
    finish(wtr)
}

pub fn write_purchases<W: Write>(out: W, rows: &[PurchaseRow]) -> Result<()> {
    let mut wtr = writer(out);
    wtr.write_record(PURCHASES_HEADER)?;
    for row in rows {
        let amount = fmt::plain_amount(row.amount);
        wtr.write_record([
            fmt::date(row.date),
            String::new(),
            row.supplier.clone(),
            String::new(),
            String::new(),
            row.designation.clone(),
            amount.clone(),
            amount,
            fmt::plain_amount(Decimal::ZERO),
            String::new(),
            String::new(),
            PURCHASES_ACCOUNT.to_string(),
            "0".to_string(),
            String::new(),
            String::new(),
        ])?;
    }
    finish(wtr)
}

/// Renders a file body into memory so nothing touches disk until every
/// output is ready.
pub fn render<F>(write: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut buf = Vec::new();
    write(&mut buf)?;
    Ok(buf)
}

/// `<dir>/<input stem>-<suffix>.csv`
pub fn output_path(dir: &Path, input: &Path, suffix: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ReleveError::UnsupportedFile(input.display().to_string()))?;
    Ok(dir.join(format!("{stem}-{suffix}.csv")))
}

/// Writes every rendered file, creating the directory first.
pub fn write_files(dir: &Path, files: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (path, body) in files {
        std::fs::write(path, body)?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}
