use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{is_blank, ReferenceTag, TransactionRow};

/// How rows without a reference tag are handled before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceMode {
    /// Leave untagged rows as they are
    #[default]
    Off,
    /// Apply the keyword hints only
    Auto,
    /// Apply the keyword hints, then ask for each remaining row
    Interactive,
}

enum HintTest {
    TierContainsAny(&'static [&'static str]),
    TextContainsAny(&'static [&'static str]),
    TierEquals(&'static str),
    TierEqualsAndDebitAbove(&'static str, i64),
}

struct ReferenceHint {
    test: HintTest,
    tag: ReferenceTag,
}

/// Keyword hints for untagged rows, first match wins. Compared on lowercase
/// raw tier and label.
const HINTS: &[ReferenceHint] = &[
    ReferenceHint {
        test: HintTest::TierContainsAny(&["hamza", "youssef"]),
        tag: ReferenceTag::Felah,
    },
    ReferenceHint {
        test: HintTest::TierContainsAny(&["orange", "mamda"]),
        tag: ReferenceTag::Fac,
    },
    ReferenceHint {
        test: HintTest::TextContainsAny(&["frais", "commis"]),
        tag: ReferenceTag::Frais,
    },
    ReferenceHint {
        test: HintTest::TierEquals("cnss"),
        tag: ReferenceTag::Cotis,
    },
    ReferenceHint {
        test: HintTest::TextContainsAny(&["salaire", "paie"]),
        tag: ReferenceTag::Paie,
    },
    ReferenceHint {
        test: HintTest::TierContainsAny(&["relanc"]),
        tag: ReferenceTag::Remb,
    },
    ReferenceHint {
        test: HintTest::TierEqualsAndDebitAbove("dgi", 50_000),
        tag: ReferenceTag::Ir,
    },
];

fn lower(text: &str) -> String {
    if is_blank(text) {
        String::new()
    } else {
        text.trim().to_lowercase()
    }
}

impl HintTest {
    fn matches(&self, tier: &str, label: &str, debit: Decimal) -> bool {
        match self {
            HintTest::TierContainsAny(words) => words.iter().any(|w| tier.contains(w)),
            HintTest::TextContainsAny(words) => {
                words.iter().any(|w| label.contains(w) || tier.contains(w))
            }
            HintTest::TierEquals(literal) => tier == *literal,
            HintTest::TierEqualsAndDebitAbove(literal, floor) => {
                tier == *literal && debit > Decimal::from(*floor)
            }
        }
    }
}

/// Reference tag suggested by the keyword hints, if any.
pub fn suggest_reference(row: &TransactionRow) -> Option<ReferenceTag> {
    let tier = lower(&row.raw_tier);
    let label = lower(&row.raw_label);
    HINTS
        .iter()
        .find(|h| h.test.matches(&tier, &label, row.debit))
        .map(|h| h.tag)
}

/// The row an operator is asked to tag.
pub struct ClassificationRequest<'a> {
    /// Position of the row in the table.
    pub index: usize,
    /// 1-based position among the rows that need an answer.
    pub number: usize,
    pub total: usize,
    pub row: &'a TransactionRow,
}

/// The external actor that supplies reference tags.
pub trait ReferenceSource {
    /// Returns the chosen tag, or `None` when no valid choice was made.
    fn request_classification(&mut self, request: &ClassificationRequest<'_>) -> Option<ReferenceTag>;
}

/// Source that never answers; pending rows stay untagged.
pub struct NoAnswers;

impl ReferenceSource for NoAnswers {
    fn request_classification(&mut self, _request: &ClassificationRequest<'_>) -> Option<ReferenceTag> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReviewSummary {
    pub auto_tagged: usize,
    pub manually_tagged: usize,
    pub unresolved: usize,
}

/// Resumable tagging pass over a row table.
///
/// Construction applies the keyword hints and queues every row that is
/// still untagged, in table order. Exactly one request is outstanding at a
/// time: `next_request` shows it and `answer` settles it and moves on.
pub struct ReviewSession {
    rows: Vec<TransactionRow>,
    pending: Vec<usize>,
    cursor: usize,
    summary: ReviewSummary,
}

impl ReviewSession {
    pub fn new(mut rows: Vec<TransactionRow>) -> Self {
        let mut pending = Vec::new();
        let mut summary = ReviewSummary::default();
        for (idx, row) in rows.iter_mut().enumerate() {
            if !is_blank(&row.raw_reference) {
                continue;
            }
            match suggest_reference(row) {
                Some(tag) => {
                    tracing::debug!("row {}: tagged {tag} from keywords", idx + 1);
                    row.raw_reference = tag.as_str().to_string();
                    summary.auto_tagged += 1;
                }
                None => pending.push(idx),
            }
        }
        Self {
            rows,
            pending,
            cursor: 0,
            summary,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len() - self.cursor
    }

    #[allow(dead_code)]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.pending.len()
    }

    pub fn next_request(&self) -> Option<ClassificationRequest<'_>> {
        let index = *self.pending.get(self.cursor)?;
        Some(ClassificationRequest {
            index,
            number: self.cursor + 1,
            total: self.pending.len(),
            row: &self.rows[index],
        })
    }

    /// Settles the outstanding request. Does nothing once complete.
    pub fn answer(&mut self, choice: Option<ReferenceTag>) {
        let Some(&index) = self.pending.get(self.cursor) else {
            return;
        };
        match choice {
            Some(tag) => {
                self.rows[index].raw_reference = tag.as_str().to_string();
                self.summary.manually_tagged += 1;
            }
            None => {
                tracing::warn!("row {}: no reference chosen, left untagged", index + 1);
                self.summary.unresolved += 1;
            }
        }
        self.cursor += 1;
    }

    /// Asks `source` about every remaining row, in order.
    pub fn drive(&mut self, source: &mut dyn ReferenceSource) {
        while let Some(request) = self.next_request() {
            let choice = source.request_classification(&request);
            self.answer(choice);
        }
    }

    /// Returns the rows; requests never answered count as unresolved.
    pub fn finish(mut self) -> (Vec<TransactionRow>, ReviewSummary) {
        self.summary.unresolved += self.pending_count();
        (self.rows, self.summary)
    }
}
