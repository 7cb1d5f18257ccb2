use crate::categorizer::Categorizer;
use crate::labels;
use crate::models::TransactionRow;
use crate::reviewer::{ReferenceSource, ReviewSession, ReviewSummary};
use crate::splitter;
use crate::tiers::TierResolver;

#[derive(Debug, Default)]
pub struct PipelineResult {
    pub rows: Vec<TransactionRow>,
    pub split: usize,
    pub review: ReviewSummary,
    pub classified: usize,
    pub unclassified: usize,
}

/// The row transformation, stage by stage:
/// tiers, references (optional), splitting, accounts, labels, date order.
///
/// Stages only fill derived fields that are still empty, so feeding the
/// result back in leaves it unchanged.
pub struct Pipeline<'a> {
    resolver: &'a TierResolver,
    categorizer: &'a Categorizer,
}

impl<'a> Pipeline<'a> {
    pub fn new(resolver: &'a TierResolver, categorizer: &'a Categorizer) -> Self {
        Self {
            resolver,
            categorizer,
        }
    }

    /// `references` is the actor asked about untagged rows; `None` skips
    /// the reference stage altogether.
    pub fn run(
        &self,
        rows: Vec<TransactionRow>,
        references: Option<&mut dyn ReferenceSource>,
    ) -> PipelineResult {
        let mut rows = rows;
        self.resolve_tiers(&mut rows);

        let mut review = ReviewSummary::default();
        if let Some(source) = references {
            let mut session = ReviewSession::new(rows);
            session.drive(source);
            let (tagged, summary) = session.finish();
            rows = tagged;
            review = summary;
            tracing::info!(
                "references: {} from keywords, {} chosen, {} left blank",
                review.auto_tagged,
                review.manually_tagged,
                review.unresolved
            );
        }

        let (mut rows, split) = splitter::split_rows(rows);
        if split > 0 {
            tracing::info!("split {split} bundled withholding payment(s)");
        }

        let (classified, unclassified) = self.classify(&mut rows);
        for row in rows.iter_mut().filter(|r| r.label.is_none()) {
            row.label = Some(labels::compose(row));
        }

        // Stable: rows sharing a date keep table order; undated rows go last.
        rows.sort_by_key(|r| (r.date.is_none(), r.date));

        PipelineResult {
            rows,
            split,
            review,
            classified,
            unclassified,
        }
    }

    fn resolve_tiers(&self, rows: &mut [TransactionRow]) {
        for row in rows.iter_mut().filter(|r| r.resolved_tier.is_none()) {
            row.resolved_tier = self.resolver.resolve(&row.raw_tier, Some(row.debit));
        }
    }

    fn classify(&self, rows: &mut [TransactionRow]) -> (usize, usize) {
        let mut classified = 0usize;
        let mut unclassified = 0usize;
        for (idx, row) in rows.iter_mut().enumerate() {
            if row.account_code.is_none() {
                row.account_code = self.categorizer.classify(row);
                if row.account_code.is_none() {
                    tracing::debug!("row {}: no rule matched", idx + 1);
                }
            }
            if row.account_code.is_some() {
                classified += 1;
            } else {
                unclassified += 1;
            }
        }
        (classified, unclassified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::{BANK_FEES, FRUL, SUPPLIERS, WITHHOLDING_DOCTOR, WITHHOLDING_LAWYER};
    use crate::models::{ReferenceTag, TierMapping};
    use crate::reviewer::{ClassificationRequest, NoAnswers};
    use crate::tiers::default_amount_overrides;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn resolver() -> TierResolver {
        TierResolver::new(
            vec![
                TierMapping {
                    pattern: "orange".into(),
                    canonical_name: "ORANGE MAROC".into(),
                },
                TierMapping {
                    pattern: "dgi".into(),
                    canonical_name: "DGI".into(),
                },
            ],
            default_amount_overrides(),
        )
    }

    fn row(day: Option<u32>, label: &str, tier: &str, reference: &str, debit: i64) -> TransactionRow {
        TransactionRow {
            date: day.and_then(|d| NaiveDate::from_ymd_opt(2025, 1, d)),
            raw_label: label.into(),
            raw_tier: tier.into(),
            raw_reference: reference.into(),
            debit: Decimal::from(debit),
            ..Default::default()
        }
    }

    fn sample() -> Vec<TransactionRow> {
        vec![
            row(Some(20), "PRLV", "orange fixe", "FAC", 300),
            row(Some(5), "VIR", "DGI", "", 734),
            row(None, "Frais tenue", "", "", 25),
            row(Some(5), "CB", "mystery shop", "", 90),
        ]
    }

    #[test]
    fn test_full_run() {
        let resolver = resolver();
        let categorizer = Categorizer::standard();
        let result = Pipeline::new(&resolver, &categorizer).run(sample(), None);

        assert_eq!(result.split, 1);
        assert_eq!(result.rows.len(), 5);
        assert_eq!((result.classified, result.unclassified), (4, 1));

        // Sorted by date; the split rows (day 5) keep table order ahead of
        // the other day-5 row, undated row last.
        let summary: Vec<_> = result
            .rows
            .iter()
            .map(|r| (r.debit, r.account_code))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Decimal::from(400), Some(WITHHOLDING_DOCTOR)),
                (Decimal::from(334), Some(WITHHOLDING_LAWYER)),
                (Decimal::from(90), None),
                (Decimal::from(300), Some(SUPPLIERS)),
                (Decimal::from(25), Some(BANK_FEES)),
            ]
        );
        assert_eq!(result.rows[0].label.as_deref(), Some("VIR / RETENU MEDECIN / DGI"));
        assert_eq!(result.rows[3].resolved_tier.as_deref(), Some("ORANGE MAROC"));
        assert_eq!(result.rows[3].label.as_deref(), Some("PRLV / FAC / ORANGE MAROC"));
        assert_eq!(result.rows[4].label.as_deref(), Some("Frais tenue"));
        assert_eq!(result.rows[4].date, None);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let resolver = resolver();
        let categorizer = Categorizer::standard();
        let pipeline = Pipeline::new(&resolver, &categorizer);
        let first = pipeline.run(sample(), None);
        let second = pipeline.run(first.rows.clone(), None);
        assert_eq!(second.split, 0);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn test_populated_fields_are_kept() {
        let resolver = resolver();
        let categorizer = Categorizer::standard();
        let mut r = row(Some(1), "PRLV", "orange", "", 10);
        r.resolved_tier = Some("KEEP".into());
        r.account_code = Some(FRUL);
        r.label = Some("kept label".into());
        let result = Pipeline::new(&resolver, &categorizer).run(vec![r], None);
        let out = &result.rows[0];
        assert_eq!(out.resolved_tier.as_deref(), Some("KEEP"));
        assert_eq!(out.account_code, Some(FRUL));
        assert_eq!(out.label.as_deref(), Some("kept label"));
    }

    struct Always(ReferenceTag);

    impl ReferenceSource for Always {
        fn request_classification(&mut self, _request: &ClassificationRequest<'_>) -> Option<ReferenceTag> {
            Some(self.0)
        }
    }

    #[test]
    fn test_manual_choice_drives_classification() {
        let resolver = resolver();
        let categorizer = Categorizer::standard();
        let mut source = Always(ReferenceTag::Felah);
        let result = Pipeline::new(&resolver, &categorizer).run(sample(), Some(&mut source));
        // "Frais tenue" is tagged by keyword; the DGI payment and "mystery
        // shop" are asked about, and splitting then overrides the DGI answer.
        assert_eq!(result.review.auto_tagged, 1);
        assert_eq!(result.review.manually_tagged, 2);
        assert_eq!(result.unclassified, 0);
        let mystery = result.rows.iter().find(|r| r.raw_tier == "mystery shop").unwrap();
        assert_eq!(mystery.raw_reference, "FELAH");
        assert_eq!(mystery.account_code, Some(SUPPLIERS));
    }

    #[test]
    fn test_auto_mode_leaves_unknown_rows_blank() {
        let resolver = resolver();
        let categorizer = Categorizer::standard();
        let result = Pipeline::new(&resolver, &categorizer).run(sample(), Some(&mut NoAnswers));
        assert_eq!(result.review.unresolved, 2);
        assert_eq!(result.unclassified, 1);
    }
}
