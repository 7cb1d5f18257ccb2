use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReleveError, Result};
use crate::models::{is_blank, Cell, TierMapping, TransactionRow};

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Column count of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<Cell>)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.iter().all(Cell::is_blank))
    }
}

/// The two logical sheets of a bank export.
pub struct Workbook {
    pub transactions: Sheet,
    pub mappings: Sheet,
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reads the transactions sheet and the tier mapping sheet.
///
/// Spreadsheets carry both sheets; a CSV export needs the mapping table
/// passed separately.
pub fn read_workbook(path: &Path, mapping_path: Option<&Path>) -> Result<Workbook> {
    let mut sheets = read_sheets(path)?;
    let mappings = match mapping_path {
        Some(p) => read_sheets(p)?
            .into_iter()
            .next()
            .ok_or_else(|| ReleveError::MissingSheet(format!("mapping table in {}", p.display())))?,
        None if sheets.len() >= 2 => sheets.remove(1),
        None => {
            return Err(ReleveError::MissingSheet(format!(
                "mapping sheet in {} (pass --mapping)",
                path.display()
            )))
        }
    };
    let transactions = sheets
        .into_iter()
        .next()
        .ok_or_else(|| ReleveError::MissingSheet(format!("transactions in {}", path.display())))?;
    Ok(Workbook {
        transactions,
        mappings,
    })
}

pub fn read_sheets(path: &Path) -> Result<Vec<Sheet>> {
    match extension(path).as_str() {
        "csv" | "txt" => Ok(vec![read_csv_sheet(path)?]),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet(path),
        _ => Err(ReleveError::UnsupportedFile(path.display().to_string())),
    }
}

fn detect_delimiter(content: &str) -> u8 {
    let first = content.lines().next().unwrap_or("");
    if first.matches(';').count() > first.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// UTF-8 text, or Latin-1 when the bytes are not valid UTF-8 (bank exports
/// saved from Excel on Windows).
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(e) => {
            tracing::debug!("input is not UTF-8, reading it as Latin-1");
            e.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

pub fn read_csv_sheet(path: &Path) -> Result<Sheet> {
    let content = decode_text(std::fs::read(path)?);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(&content))
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("csv")
        .to_string();
    Ok(Sheet { name, rows })
}

#[cfg(feature = "xlsx")]
fn read_spreadsheet(path: &Path) -> Result<Vec<Sheet>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::Empty | Data::Error(_) => Cell::Empty,
                        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                            Cell::Text(s.clone())
                        }
                        Data::Float(f) => Cell::Number(*f),
                        Data::Int(i) => Cell::Number(*i as f64),
                        Data::Bool(b) => Cell::Bool(*b),
                        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
                            Some(d) => Cell::Date(d),
                            None => Cell::Number(dt.as_f64()),
                        },
                    })
                    .collect()
            })
            .collect();
        sheets.push(Sheet { name, rows });
    }
    Ok(sheets)
}

// ---------------------------------------------------------------------------
// Cell parsing helpers
// ---------------------------------------------------------------------------

/// 31/12/9999, the last day Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    if serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::try_days(serial.trunc() as i64)?)
}

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%y"];

pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(f) => excel_serial_to_date(*f),
        Cell::Text(s) => {
            let s = s.trim();
            // Datetime text such as "2025-01-15 00:00:00" keeps only the day.
            let day = s.split_whitespace().next().unwrap_or(s);
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
        }
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Parses amount text such as `1 234,56`, `1.234,56`, `1,234.56` or `-50`.
///
/// With both separators present the last one is the decimal point. A lone
/// separator is decimal unless it repeats (`1,234,567`).
pub fn parse_amount_text(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    let (thousands, decimal) = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => ('.', Some(',')),
        (Some(_), Some(_)) => (',', Some('.')),
        (Some(_), None) if s.matches(',').count() == 1 => ('.', Some(',')),
        (Some(_), None) => (',', None),
        (None, Some(_)) if s.matches('.').count() > 1 => ('.', None),
        _ => (',', Some('.')),
    };
    let normalized: String = s
        .chars()
        .filter(|c| *c != thousands)
        .map(|c| if Some(c) == decimal { '.' } else { c })
        .collect();
    Decimal::from_str(&normalized).ok()
}

/// Amount cell as a decimal; blank or unreadable cells count as zero.
pub fn parse_amount(cell: &Cell) -> Decimal {
    let parsed = match cell {
        Cell::Number(f) if f.is_finite() => Decimal::from_f64(*f),
        Cell::Text(s) if !is_blank(s) => parse_amount_text(s),
        _ => return Decimal::ZERO,
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!("unreadable amount {:?}, using 0", cell.text());
        Decimal::ZERO
    })
}

pub fn parse_flag(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(b) => *b,
        Cell::Number(f) => *f == 1.0,
        Cell::Text(s) => {
            let t = s.trim().to_lowercase();
            matches!(t.as_str(), "1" | "1.0" | "x" | "oui" | "yes" | "true")
        }
        Cell::Empty | Cell::Date(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Layouts: the known bank export variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// date, label, counterparty, reference, debit, credit, channel flag
    #[default]
    Bank,
    /// date, (ignored), label, counterparty, reference, debit, credit
    BankRef,
}

struct Columns {
    date: usize,
    label: usize,
    tier: usize,
    reference: usize,
    debit: usize,
    credit: usize,
    channel: Option<usize>,
}

impl Layout {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::BankRef => "bank-ref",
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            Self::Bank | Self::BankRef => 7,
        }
    }

    fn columns(&self) -> Columns {
        match self {
            Self::Bank => Columns {
                date: 0,
                label: 1,
                tier: 2,
                reference: 3,
                debit: 4,
                credit: 5,
                channel: Some(6),
            },
            Self::BankRef => Columns {
                date: 0,
                label: 2,
                tier: 3,
                reference: 4,
                debit: 5,
                credit: 6,
                channel: None,
            },
        }
    }
}

fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&Cell::Empty)
}

fn is_label_text(cell: &Cell) -> bool {
    matches!(cell, Cell::Text(s) if !is_blank(s))
}

/// A column header line: its date, debit and credit cells are all text and
/// none of them reads as a date or an amount.
fn is_header_row(record: &[Cell], cols: &Columns) -> bool {
    let date = cell_at(record, cols.date);
    let amounts = [cell_at(record, cols.debit), cell_at(record, cols.credit)];
    is_label_text(date)
        && parse_date(date).is_none()
        && amounts
            .iter()
            .all(|c| is_label_text(c) && parse_amount_text(&c.text()).is_none())
}

/// Builds transaction rows from a sheet, rejecting any column count other
/// than the layout's. A leading header line is skipped.
pub fn parse_transactions(sheet: &Sheet, layout: Layout) -> Result<Vec<TransactionRow>> {
    let found = sheet.width();
    if found != layout.column_count() {
        return Err(ReleveError::Layout {
            sheet: sheet.name.clone(),
            expected: layout.column_count().to_string(),
            found,
        });
    }
    let cols = layout.columns();
    let mut rows = Vec::new();
    for (pos, (line, record)) in sheet.data_rows().enumerate() {
        if pos == 0 && is_header_row(record, &cols) {
            tracing::debug!("skipping header line {}", line + 1);
            continue;
        }
        let date_cell = cell_at(record, cols.date);
        let date = parse_date(date_cell);
        if date.is_none() && !date_cell.is_blank() {
            tracing::warn!(
                "line {}: unreadable date {:?}, leaving it empty",
                line + 1,
                date_cell.text()
            );
        }
        rows.push(TransactionRow {
            date,
            raw_label: cell_at(record, cols.label).text(),
            raw_tier: cell_at(record, cols.tier).text(),
            raw_reference: cell_at(record, cols.reference).text(),
            debit: parse_amount(cell_at(record, cols.debit)),
            credit: parse_amount(cell_at(record, cols.credit)),
            channel_flag: cols.channel.is_some_and(|c| parse_flag(cell_at(record, c))),
            ..Default::default()
        });
    }
    if rows.is_empty() {
        return Err(ReleveError::EmptySheet(sheet.name.clone()));
    }
    tracing::info!("read {} rows from '{}' ({} layout)", rows.len(), sheet.name, layout.key());
    Ok(rows)
}

/// Reads (pattern, canonical name) pairs; the sheet has no header row.
pub fn parse_mappings(sheet: &Sheet) -> Result<Vec<TierMapping>> {
    let found = sheet.width();
    if found < 2 {
        return Err(ReleveError::Layout {
            sheet: sheet.name.clone(),
            expected: "at least 2".to_string(),
            found,
        });
    }
    let mappings: Vec<TierMapping> = sheet
        .data_rows()
        .map(|(_, r)| TierMapping {
            pattern: cell_at(r, 0).text(),
            canonical_name: cell_at(r, 1).text(),
        })
        .filter(|m| !is_blank(&m.pattern) && !is_blank(&m.canonical_name))
        .collect();
    tracing::info!("read {} tier mappings from '{}'", mappings.len(), sheet.name);
    Ok(mappings)
}
