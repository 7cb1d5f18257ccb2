use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// True when a source field carries no usable value.
///
/// Spreadsheet exports leave placeholder text behind for missing cells, so
/// the usual null spellings count as blank alongside whitespace.
pub fn is_blank(text: &str) -> bool {
    let t = text.trim();
    t.is_empty()
        || ["nan", "null", "none", "nat"]
            .iter()
            .any(|p| t.eq_ignore_ascii_case(p))
}

/// One spreadsheet cell, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => is_blank(s),
            Cell::Number(f) => f.is_nan(),
            Cell::Date(_) | Cell::Bool(_) => false,
        }
    }

    /// Text form of the cell; blank cells render as an empty string.
    pub fn text(&self) -> String {
        if self.is_blank() {
            return String::new();
        }
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Cell::Number(f) => f.to_string(),
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// Ten-digit chart-of-accounts code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountCode(u64);

impl AccountCode {
    pub const fn new(code: u64) -> Self {
        AccountCode(code)
    }
}

impl fmt::Display for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification hint literals an operator can pick for an untagged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTag {
    Felah,
    Fac,
    Frais,
    Remb,
    Paie,
    Cotis,
    Ir,
    RetenuMedecin,
    RetenuAvocat,
}

impl ReferenceTag {
    pub const ALL: [ReferenceTag; 9] = [
        ReferenceTag::Felah,
        ReferenceTag::Fac,
        ReferenceTag::Frais,
        ReferenceTag::Remb,
        ReferenceTag::Paie,
        ReferenceTag::Cotis,
        ReferenceTag::Ir,
        ReferenceTag::RetenuMedecin,
        ReferenceTag::RetenuAvocat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Felah => "FELAH",
            Self::Fac => "FAC",
            Self::Frais => "FRAIS",
            Self::Remb => "REMB",
            Self::Paie => "PAIE",
            Self::Cotis => "COTIS",
            Self::Ir => "IR",
            Self::RetenuMedecin => "RETENU MEDECIN",
            Self::RetenuAvocat => "RETENU AVOCAT",
        }
    }
}

impl fmt::Display for ReferenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReferenceTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("Unknown reference tag: '{wanted}'"))
    }
}

/// One ledger entry moving through the pipeline.
///
/// Source fields are kept as written (blank text is an empty string);
/// `resolved_tier`, `account_code` and `label` are derived and stay `None`
/// until a stage fills them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionRow {
    pub date: Option<NaiveDate>,
    pub raw_label: String,
    pub raw_tier: String,
    pub raw_reference: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub channel_flag: bool,
    pub resolved_tier: Option<String>,
    pub account_code: Option<AccountCode>,
    pub label: Option<String>,
}

impl TransactionRow {
    /// Resolved counterparty when known, raw text otherwise.
    pub fn tier(&self) -> &str {
        match &self.resolved_tier {
            Some(t) => t,
            None => &self.raw_tier,
        }
    }
}

/// Reference-table entry: case-insensitive substring → canonical name.
#[derive(Debug, Clone, PartialEq)]
pub struct TierMapping {
    pub pattern: String,
    pub canonical_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank_placeholders() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(is_blank("nan"));
        assert!(is_blank("NaN"));
        assert!(is_blank(" None "));
        assert!(is_blank("NULL"));
        assert!(!is_blank("ORANGE"));
        assert!(!is_blank("nano"));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(Cell::Number(734.0).text(), "734");
        assert_eq!(Cell::Number(12.5).text(), "12.5");
        assert_eq!(Cell::Text("  inwi ".into()).text(), "inwi");
        assert_eq!(Cell::Text("nan".into()).text(), "");
        assert_eq!(Cell::Number(f64::NAN).text(), "");
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(Cell::Date(d).text(), "07/03/2025");
    }

    #[test]
    fn test_reference_tag_parse() {
        assert_eq!("retenu medecin".parse::<ReferenceTag>(), Ok(ReferenceTag::RetenuMedecin));
        assert_eq!("PAIE".parse::<ReferenceTag>(), Ok(ReferenceTag::Paie));
        assert!("SALAIRE".parse::<ReferenceTag>().is_err());
    }

    #[test]
    fn test_row_tier_prefers_resolved() {
        let mut row = TransactionRow {
            raw_tier: "orange maroc".into(),
            ..Default::default()
        };
        assert_eq!(row.tier(), "orange maroc");
        row.resolved_tier = Some("ORANGE".into());
        assert_eq!(row.tier(), "ORANGE");
    }
}
