use std::fmt;

use crate::models::{is_blank, AccountCode, TransactionRow};

const SUPPLIER_KEYWORDS: &str = include_str!("../data/supplier_keywords.txt");

pub const CHANNEL: AccountCode = AccountCode::new(3497000000);
pub const FRUL: AccountCode = AccountCode::new(3421000000);
pub const PAYROLL: AccountCode = AccountCode::new(4432000000);
pub const SOCIAL_CONTRIBUTIONS: AccountCode = AccountCode::new(4441000000);
pub const BANK_FEES: AccountCode = AccountCode::new(6147300000);
pub const EXCHANGE_LOSS: AccountCode = AccountCode::new(6331000000);
pub const EXCHANGE_GAIN: AccountCode = AccountCode::new(7331000000);
pub const SUPPLIERS: AccountCode = AccountCode::new(4411000000);
pub const INCOME_TAX: AccountCode = AccountCode::new(4452500000);
pub const WITHHOLDING_DOCTOR: AccountCode = AccountCode::new(4458110100);
pub const WITHHOLDING_LAWYER: AccountCode = AccountCode::new(4458110200);
pub const VEHICLE_TAX: AccountCode = AccountCode::new(4452110000);

/// Which counterparty text a tier predicate looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierField {
    Resolved,
    /// Holds when either the raw or the resolved text satisfies the test.
    Either,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    ChannelFlag,
    TierStartsWith(TierField, &'static str),
    TierEquals(TierField, &'static str),
    TierContains(TierField, &'static str),
    TierContainsAny(TierField, Vec<String>),
    ReferenceStartsWith(&'static str),
    ReferenceEquals(&'static str),
    LabelStartsWith(&'static str),
    Any(Vec<Predicate>),
}

fn upper(text: &str) -> String {
    text.trim().to_uppercase()
}

fn tier_texts(row: &TransactionRow, field: TierField) -> Vec<&str> {
    let raw = Some(row.raw_tier.as_str());
    let resolved = row.resolved_tier.as_deref();
    let picked = match field {
        TierField::Resolved => [resolved, None],
        TierField::Either => [raw, resolved],
    };
    picked
        .into_iter()
        .flatten()
        .filter(|t| !is_blank(t))
        .collect()
}

fn tier_test(row: &TransactionRow, field: TierField, test: impl Fn(&str) -> bool) -> bool {
    tier_texts(row, field).into_iter().any(|t| test(&upper(t)))
}

impl Predicate {
    pub fn matches(&self, row: &TransactionRow) -> bool {
        match self {
            Predicate::ChannelFlag => row.channel_flag,
            Predicate::TierStartsWith(field, prefix) => {
                let prefix = upper(prefix);
                tier_test(row, *field, |t| t.starts_with(&prefix))
            }
            Predicate::TierEquals(field, literal) => {
                let literal = upper(literal);
                tier_test(row, *field, |t| t == literal)
            }
            Predicate::TierContains(field, needle) => {
                let needle = upper(needle);
                tier_test(row, *field, |t| t.contains(&needle))
            }
            Predicate::TierContainsAny(field, needles) => {
                tier_test(row, *field, |t| needles.iter().any(|n| t.contains(n.as_str())))
            }
            Predicate::ReferenceStartsWith(prefix) => {
                !is_blank(&row.raw_reference) && upper(&row.raw_reference).starts_with(&upper(prefix))
            }
            Predicate::ReferenceEquals(literal) => {
                !is_blank(&row.raw_reference) && upper(&row.raw_reference) == upper(literal)
            }
            Predicate::LabelStartsWith(prefix) => {
                !is_blank(&row.raw_label) && upper(&row.raw_label).starts_with(&upper(prefix))
            }
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(row)),
        }
    }
}

impl fmt::Display for TierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TierField::Resolved => "resolved tier",
            TierField::Either => "tier",
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::ChannelFlag => write!(f, "channel flag set"),
            Predicate::TierStartsWith(field, p) => write!(f, "{field} starts with \"{p}\""),
            Predicate::TierEquals(field, p) => write!(f, "{field} = \"{p}\""),
            Predicate::TierContains(field, p) => write!(f, "{field} contains \"{p}\""),
            Predicate::TierContainsAny(field, list) => {
                write!(f, "{field} contains one of {} keywords", list.len())
            }
            Predicate::ReferenceStartsWith(p) => write!(f, "reference starts with \"{p}\""),
            Predicate::ReferenceEquals(p) => write!(f, "reference = \"{p}\""),
            Predicate::LabelStartsWith(p) => write!(f, "label starts with \"{p}\""),
            Predicate::Any(preds) => {
                let parts: Vec<String> = preds.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(" or "))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub predicate: Predicate,
    pub account: AccountCode,
}

fn rule(name: &'static str, predicate: Predicate, account: AccountCode) -> ClassificationRule {
    ClassificationRule {
        name,
        predicate,
        account,
    }
}

/// Supplier keyword list, uppercased, in file order.
pub fn supplier_keywords() -> Vec<String> {
    SUPPLIER_KEYWORDS
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_uppercase())
        .collect()
}

/// First-match-wins decision list over transaction rows.
pub struct Categorizer {
    rules: Vec<ClassificationRule>,
}

impl Categorizer {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// The production rule table. Order is significant.
    pub fn standard() -> Self {
        use Predicate::*;

        Self::new(vec![
            rule("channel", ChannelFlag, CHANNEL),
            rule("frul", TierStartsWith(TierField::Either, "FRUL"), FRUL),
            rule(
                "payroll",
                Any(vec![ReferenceStartsWith("CONGÉ"), ReferenceEquals("PAIE")]),
                PAYROLL,
            ),
            rule(
                "social-contributions",
                Any(vec![
                    TierEquals(TierField::Either, "CNSS"),
                    ReferenceEquals("COTIS"),
                ]),
                SOCIAL_CONTRIBUTIONS,
            ),
            rule(
                "bank-fees",
                Any(vec![ReferenceEquals("FRAIS"), LabelStartsWith("FRAIS")]),
                BANK_FEES,
            ),
            rule("exchange-loss", ReferenceEquals("PERTE"), EXCHANGE_LOSS),
            rule("exchange-gain", ReferenceEquals("GAIN"), EXCHANGE_GAIN),
            rule(
                "suppliers",
                Any(vec![
                    ReferenceEquals("FELAH"),
                    TierContainsAny(TierField::Resolved, supplier_keywords()),
                ]),
                SUPPLIERS,
            ),
            rule("income-tax", ReferenceEquals("IR"), INCOME_TAX),
            rule(
                "withholding-doctor",
                ReferenceEquals("RETENU MEDECIN"),
                WITHHOLDING_DOCTOR,
            ),
            rule(
                "withholding-lawyer",
                ReferenceEquals("RETENU AVOCAT"),
                WITHHOLDING_LAWYER,
            ),
            rule("doctor", TierContains(TierField::Either, "SAIDOU"), SUPPLIERS),
            rule("vehicle-tax", TierContains(TierField::Either, "VIGNETTE"), VEHICLE_TAX),
        ])
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn find_matching_rule(&self, row: &TransactionRow) -> Option<&ClassificationRule> {
        self.rules.iter().find(|r| r.predicate.matches(row))
    }

    /// Account of the first matching rule, `None` when nothing matches.
    pub fn classify(&self, row: &TransactionRow) -> Option<AccountCode> {
        let rule = self.find_matching_rule(row)?;
        tracing::debug!("rule '{}' -> {}", rule.name, rule.account);
        Some(rule.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> TransactionRow {
        TransactionRow::default()
    }

    fn with_ref(reference: &str) -> TransactionRow {
        TransactionRow {
            raw_reference: reference.into(),
            ..row()
        }
    }

    fn with_tier(raw: &str, resolved: Option<&str>) -> TransactionRow {
        TransactionRow {
            raw_tier: raw.into(),
            resolved_tier: resolved.map(String::from),
            ..row()
        }
    }

    #[test]
    fn test_keyword_list_is_complete() {
        let kw = supplier_keywords();
        assert_eq!(kw.len(), 68);
        assert_eq!(kw.first().map(String::as_str), Some("AJYAD"));
        assert_eq!(kw.last().map(String::as_str), Some("D.A"));
        assert!(kw.contains(&"HAMRI TISSUS".to_string()));
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = Categorizer::standard().rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "channel",
                "frul",
                "payroll",
                "social-contributions",
                "bank-fees",
                "exchange-loss",
                "exchange-gain",
                "suppliers",
                "income-tax",
                "withholding-doctor",
                "withholding-lawyer",
                "doctor",
                "vehicle-tax",
            ]
        );
    }

    #[test]
    fn test_channel_flag_overrides_everything() {
        let r = TransactionRow {
            channel_flag: true,
            raw_reference: "PAIE".into(),
            raw_tier: "FRULEX".into(),
            ..row()
        };
        assert_eq!(Categorizer::standard().classify(&r), Some(CHANNEL));
    }

    #[test]
    fn test_frul_prefix_beats_supplier_keywords() {
        let r = with_tier("FRUL ORANGE", Some("ORANGE MAROC"));
        assert!(Predicate::TierContainsAny(TierField::Resolved, supplier_keywords()).matches(&r));
        assert_eq!(Categorizer::standard().classify(&r), Some(FRUL));
    }

    #[test]
    fn test_reference_rules() {
        let c = Categorizer::standard();
        assert_eq!(c.classify(&with_ref("PAIE")), Some(PAYROLL));
        assert_eq!(c.classify(&with_ref("congé annuel")), Some(PAYROLL));
        assert_eq!(c.classify(&with_ref("COTIS")), Some(SOCIAL_CONTRIBUTIONS));
        assert_eq!(c.classify(&with_ref("FRAIS")), Some(BANK_FEES));
        assert_eq!(c.classify(&with_ref("PERTE")), Some(EXCHANGE_LOSS));
        assert_eq!(c.classify(&with_ref("GAIN")), Some(EXCHANGE_GAIN));
        assert_eq!(c.classify(&with_ref("FELAH")), Some(SUPPLIERS));
        assert_eq!(c.classify(&with_ref("ir")), Some(INCOME_TAX));
        assert_eq!(c.classify(&with_ref("RETENU MEDECIN")), Some(WITHHOLDING_DOCTOR));
        assert_eq!(c.classify(&with_ref("RETENU AVOCAT")), Some(WITHHOLDING_LAWYER));
    }

    #[test]
    fn test_label_prefix_fees() {
        let r = TransactionRow {
            raw_label: "Frais tenue de compte".into(),
            ..row()
        };
        assert_eq!(Categorizer::standard().classify(&r), Some(BANK_FEES));
    }

    #[test]
    fn test_cnss_tier() {
        let c = Categorizer::standard();
        assert_eq!(c.classify(&with_tier("cnss", None)), Some(SOCIAL_CONTRIBUTIONS));
        assert_eq!(c.classify(&with_tier("cnss rabat", None)), None);
    }

    #[test]
    fn test_supplier_keywords_use_resolved_tier() {
        let c = Categorizer::standard();
        assert_eq!(c.classify(&with_tier("x", Some("Kitea Agdal"))), Some(SUPPLIERS));
        assert_eq!(c.classify(&with_tier("kitea agdal", None)), None);
    }

    #[test]
    fn test_tail_rules() {
        let c = Categorizer::standard();
        assert_eq!(c.classify(&with_tier("dr saidou", None)), Some(SUPPLIERS));
        assert_eq!(c.classify(&with_tier("Vignette 2025", None)), Some(VEHICLE_TAX));
    }

    #[test]
    fn test_classify_reports_first_rule_account() {
        let c = Categorizer::standard();
        let r = TransactionRow {
            raw_tier: "FRUL ORANGE".into(),
            resolved_tier: Some("ORANGE MAROC".into()),
            ..Default::default()
        };
        assert_eq!(c.find_matching_rule(&r).map(|rule| rule.name), Some("frul"));
        assert_eq!(c.classify(&r), Some(FRUL));
    }

    #[test]
    fn test_no_match_is_absent() {
        let c = Categorizer::standard();
        assert_eq!(c.classify(&row()), None);
        assert_eq!(c.classify(&with_ref("nan")), None);
        assert_eq!(c.classify(&with_tier("UNKNOWN CO", None)), None);
    }

    #[test]
    fn test_rules_describe_themselves() {
        let c = Categorizer::standard();
        let text = c.rules()[2].predicate.to_string();
        assert_eq!(text, "reference starts with \"CONGÉ\" or reference = \"PAIE\"");
    }
}
