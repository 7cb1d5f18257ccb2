use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;

use crate::models::{AccountCode, TransactionRow};

pub const EMPTY_GROUP: &str = "Vide";
pub const TOTAL_LABEL: &str = "Total";

/// Summary grouping key. Variant order is the output order: account codes
/// ascending, then rows without a code, then the grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupKey {
    Account(AccountCode),
    Empty,
    GrandTotal,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Account(code) => write!(f, "{code}"),
            GroupKey::Empty => f.write_str(EMPTY_GROUP),
            GroupKey::GrandTotal => f.write_str(TOTAL_LABEL),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Detail,
    Subtotal,
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRow {
    pub key: GroupKey,
    pub kind: RowKind,
    pub label: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl AggregationRow {
    pub fn is_total(&self) -> bool {
        self.kind != RowKind::Detail
    }
}

#[derive(Default, Clone, Copy)]
struct Sums {
    debit: Decimal,
    credit: Decimal,
}

impl Sums {
    fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit += debit;
        self.credit += credit;
    }
}

/// Sums per (account, label), a "Total" line after each account group, and
/// a grand total line last.
pub fn aggregate(rows: &[TransactionRow]) -> Vec<AggregationRow> {
    let mut groups: BTreeMap<GroupKey, BTreeMap<String, Sums>> = BTreeMap::new();
    let mut grand = Sums::default();

    for row in rows {
        let key = row.account_code.map_or(GroupKey::Empty, GroupKey::Account);
        let label = row.label.clone().unwrap_or_default();
        groups
            .entry(key)
            .or_default()
            .entry(label)
            .or_default()
            .add(row.debit, row.credit);
        grand.add(row.debit, row.credit);
    }

    let mut out = Vec::new();
    for (key, labels) in groups {
        let mut subtotal = Sums::default();
        for (label, sums) in labels {
            subtotal.add(sums.debit, sums.credit);
            out.push(AggregationRow {
                key,
                kind: RowKind::Detail,
                label,
                debit: sums.debit,
                credit: sums.credit,
            });
        }
        out.push(AggregationRow {
            key,
            kind: RowKind::Subtotal,
            label: TOTAL_LABEL.to_string(),
            debit: subtotal.debit,
            credit: subtotal.credit,
        });
    }
    out.push(AggregationRow {
        key: GroupKey::GrandTotal,
        kind: RowKind::GrandTotal,
        label: String::new(),
        debit: grand.debit,
        credit: grand.credit,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: Option<u64>, label: &str, debit: i64, credit: i64) -> TransactionRow {
        TransactionRow {
            account_code: code.map(AccountCode::new),
            label: Some(label.to_string()),
            debit: Decimal::from(debit),
            credit: Decimal::from(credit),
            ..Default::default()
        }
    }

    fn agg(key: GroupKey, label: &str, debit: i64, credit: i64) -> AggregationRow {
        let kind = match (key, label) {
            (GroupKey::GrandTotal, _) => RowKind::GrandTotal,
            (_, TOTAL_LABEL) => RowKind::Subtotal,
            _ => RowKind::Detail,
        };
        AggregationRow {
            key,
            kind,
            label: label.to_string(),
            debit: Decimal::from(debit),
            credit: Decimal::from(credit),
        }
    }

    #[test]
    fn test_groups_subtotals_and_grand_total() {
        let code = GroupKey::Account(AccountCode::new(100));
        let out = aggregate(&[
            row(Some(100), "A", 10, 0),
            row(Some(100), "A", 5, 0),
            row(None, "B", 0, 3),
        ]);
        assert_eq!(
            out,
            vec![
                agg(code, "A", 15, 0),
                agg(code, "Total", 15, 0),
                agg(GroupKey::Empty, "B", 0, 3),
                agg(GroupKey::Empty, "Total", 0, 3),
                agg(GroupKey::GrandTotal, "", 15, 3),
            ]
        );
    }

    #[test]
    fn test_ordering_by_code_then_label() {
        let out = aggregate(&[
            row(Some(4411000000), "Zeta", 1, 0),
            row(None, "x", 1, 0),
            row(Some(3421000000), "b", 2, 0),
            row(Some(4411000000), "Alpha", 3, 0),
            row(Some(3421000000), "a", 4, 0),
        ]);
        let keys: Vec<String> = out.iter().map(|r| format!("{}|{}", r.key, r.label)).collect();
        assert_eq!(
            keys,
            vec![
                "3421000000|a",
                "3421000000|b",
                "3421000000|Total",
                "4411000000|Alpha",
                "4411000000|Zeta",
                "4411000000|Total",
                "Vide|x",
                "Vide|Total",
                "Total|",
            ]
        );
        assert_eq!(out[2].debit, Decimal::from(6));
        assert_eq!(out.last().map(|r| r.debit), Some(Decimal::from(11)));
    }

    #[test]
    fn test_empty_input_has_zero_grand_total() {
        assert_eq!(aggregate(&[]), vec![agg(GroupKey::GrandTotal, "", 0, 0)]);
    }

    #[test]
    fn test_is_total() {
        assert!(agg(GroupKey::Empty, "Total", 0, 0).is_total());
        assert!(agg(GroupKey::GrandTotal, "", 0, 0).is_total());
        assert!(!agg(GroupKey::Empty, "B", 0, 0).is_total());
    }

    #[test]
    fn test_detail_labelled_total_is_not_a_subtotal() {
        let code = GroupKey::Account(AccountCode::new(100));
        let out = aggregate(&[row(Some(100), "Total", 7, 0), row(Some(100), "A", 1, 0)]);
        let kinds: Vec<(&str, RowKind)> = out.iter().map(|r| (r.label.as_str(), r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("A", RowKind::Detail),
                ("Total", RowKind::Detail),
                ("Total", RowKind::Subtotal),
                ("", RowKind::GrandTotal),
            ]
        );
        assert!(!out[1].is_total());
        assert!(out[2].is_total());
        assert_eq!((out[1].key, out[1].debit), (code, Decimal::from(7)));
        assert_eq!(out[2].debit, Decimal::from(8));
    }
}
