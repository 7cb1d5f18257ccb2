use rust_decimal::Decimal;

use crate::models::{ReferenceTag, TransactionRow};

const SPLIT_TIER: &str = "dgi";

fn split_total() -> Decimal {
    Decimal::new(734, 0)
}

/// Debit and forced reference of each derived row, in output order.
fn split_parts() -> [(Decimal, ReferenceTag); 2] {
    [
        (Decimal::new(400, 0), ReferenceTag::RetenuMedecin),
        (Decimal::new(334, 0), ReferenceTag::RetenuAvocat),
    ]
}

/// A DGI payment of exactly 734 bundles two withholding remittances.
pub fn needs_split(row: &TransactionRow) -> bool {
    let tier_matches = row.raw_tier.to_lowercase().contains(SPLIT_TIER)
        || row
            .resolved_tier
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(SPLIT_TIER));
    tier_matches && row.debit.round_dp(2) == split_total()
}

pub fn split(row: TransactionRow) -> Vec<TransactionRow> {
    if !needs_split(&row) {
        return vec![row];
    }
    split_parts()
        .into_iter()
        .map(|(debit, tag)| TransactionRow {
            debit,
            raw_reference: tag.as_str().to_string(),
            ..row.clone()
        })
        .collect()
}

/// Replaces every bundled row by its two parts, keeping table order.
pub fn split_rows(rows: Vec<TransactionRow>) -> (Vec<TransactionRow>, usize) {
    let mut split_count = 0usize;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let parts = split(row);
        if parts.len() > 1 {
            split_count += 1;
        }
        out.extend(parts);
    }
    (out, split_count)
}
