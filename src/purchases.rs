use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ReleveError, Result};
use crate::importer::{parse_amount, parse_amount_text, parse_date, Sheet};
use crate::labels::join_non_blank;
use crate::models::{is_blank, AccountCode, Cell};

/// Purchases are booked to a single expense account.
pub const PURCHASES_ACCOUNT: AccountCode = AccountCode::new(6111000000);

const PURCHASE_COLUMNS: usize = 9;
const DATE_COL: usize = 0;
const PRODUCT_COL: usize = 3;
const SUPPLIER_COL: usize = 4;
const AMOUNT_COL: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRow {
    pub date: Option<NaiveDate>,
    pub supplier: String,
    pub designation: String,
    /// Amount including tax; also used as the net amount.
    pub amount: Decimal,
}

fn cell_at(row: &[Cell], idx: usize) -> Cell {
    row.get(idx).cloned().unwrap_or(Cell::Empty)
}

fn is_header(row: &[Cell]) -> bool {
    let date = cell_at(row, DATE_COL);
    let amount = cell_at(row, AMOUNT_COL).text();
    matches!(&date, Cell::Text(s) if !is_blank(s))
        && parse_date(&date).is_none()
        && parse_amount_text(&amount).is_none()
}

pub fn parse_purchases(sheet: &Sheet) -> Result<Vec<PurchaseRow>> {
    let found = sheet.width();
    if found != PURCHASE_COLUMNS {
        return Err(ReleveError::Layout {
            sheet: sheet.name.clone(),
            expected: PURCHASE_COLUMNS.to_string(),
            found,
        });
    }
    let rows: Vec<PurchaseRow> = sheet
        .rows
        .iter()
        .filter(|r| !r.iter().all(Cell::is_blank))
        .enumerate()
        .filter(|(pos, r)| *pos > 0 || !is_header(r))
        .map(|(_, r)| r)
        .map(|r| {
            let product = cell_at(r, PRODUCT_COL).text();
            let supplier = cell_at(r, SUPPLIER_COL).text();
            PurchaseRow {
                date: parse_date(&cell_at(r, DATE_COL)),
                designation: join_non_blank([product.as_str(), supplier.as_str()]),
                supplier,
                amount: parse_amount(&cell_at(r, AMOUNT_COL)),
            }
        })
        .collect();
    if rows.is_empty() {
        return Err(ReleveError::EmptySheet(sheet.name.clone()));
    }
    tracing::info!("read {} purchase rows from '{}'", rows.len(), sheet.name);
    Ok(rows)
}
