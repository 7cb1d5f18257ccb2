use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{is_blank, TierMapping};

/// Counterparty that maps to a dedicated contract name when it is paid one
/// of a known set of instalment amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountOverride {
    pub keyword: String,
    pub amounts: Vec<Decimal>,
    pub canonical_name: String,
}

pub fn default_amount_overrides() -> Vec<AmountOverride> {
    vec![AmountOverride {
        keyword: "wafabail".to_string(),
        amounts: vec![Decimal::new(2878038, 2)],
        canonical_name: "WAFABAIL CONTRAT".to_string(),
    }]
}

const DOCTOR_NAME: &str = "SAIDOU ABDELLATIPH";

struct CompiledMapping {
    pattern: String,
    canonical_name: String,
}

/// Maps free-text counterparties onto canonical names.
///
/// Lookup order: hardcoded overrides, amount-keyed overrides, then the
/// mapping table in table order. The first table entry whose pattern is a
/// substring of the raw text wins, regardless of pattern length.
pub struct TierResolver {
    mappings: Vec<CompiledMapping>,
    overrides: Vec<AmountOverride>,
}

impl TierResolver {
    pub fn new(mappings: Vec<TierMapping>, overrides: Vec<AmountOverride>) -> Self {
        let mappings = mappings
            .into_iter()
            .filter(|m| !is_blank(&m.pattern) && !is_blank(&m.canonical_name))
            .map(|m| CompiledMapping {
                pattern: m.pattern.trim().to_lowercase(),
                canonical_name: m.canonical_name.trim().to_string(),
            })
            .collect();
        let overrides = overrides
            .into_iter()
            .map(|o| AmountOverride {
                keyword: o.keyword.to_lowercase(),
                amounts: o.amounts.into_iter().map(|a| a.round_dp(2)).collect(),
                canonical_name: o.canonical_name,
            })
            .collect();
        Self { mappings, overrides }
    }

    pub fn pattern_count(&self) -> usize {
        self.mappings.len()
    }

    pub fn resolve(&self, raw_tier: &str, debit: Option<Decimal>) -> Option<String> {
        if is_blank(raw_tier) {
            return None;
        }
        let text = raw_tier.to_lowercase();

        if text.contains("saidou") && text.contains("medecin") {
            return Some(DOCTOR_NAME.to_string());
        }

        if let Some(debit) = debit.map(|d| d.round_dp(2)) {
            let hit = self
                .overrides
                .iter()
                .find(|o| text.contains(&o.keyword) && o.amounts.contains(&debit));
            if let Some(o) = hit {
                return Some(o.canonical_name.clone());
            }
        }

        self.mappings
            .iter()
            .find(|m| text.contains(&m.pattern))
            .map(|m| m.canonical_name.clone())
    }
}
