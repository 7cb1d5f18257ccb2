use crate::models::{is_blank, TransactionRow};

pub const SEPARATOR: &str = " / ";

/// Joins the non-blank parts with " / ", trimming each one.
pub fn join_non_blank<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !is_blank(p))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Label, reference, then the resolved tier (raw tier when unresolved).
pub fn compose(row: &TransactionRow) -> String {
    join_non_blank([
        row.raw_label.as_str(),
        row.raw_reference.as_str(),
        row.tier(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, reference: &str, tier: &str) -> TransactionRow {
        TransactionRow {
            raw_label: label.into(),
            raw_reference: reference.into(),
            raw_tier: tier.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_reference_skipped() {
        assert_eq!(compose(&row("Virement", "", "ORANGE")), "Virement / ORANGE");
    }

    #[test]
    fn test_all_parts() {
        assert_eq!(compose(&row(" CB ", "FAC", "inwi ")), "CB / FAC / inwi");
    }

    #[test]
    fn test_resolved_tier_preferred() {
        let mut r = row("Prlv", "FAC", "orange 0612");
        r.resolved_tier = Some("ORANGE MAROC".into());
        assert_eq!(compose(&r), "Prlv / FAC / ORANGE MAROC");
    }

    #[test]
    fn test_placeholders_never_rendered() {
        assert_eq!(compose(&row("nan", "None", "ORANGE")), "ORANGE");
        assert_eq!(compose(&row("", "", "")), "");
    }
}
