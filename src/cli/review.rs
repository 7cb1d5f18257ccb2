use colored::Colorize;
use dialoguer::Select;

use crate::fmt;
use crate::models::ReferenceTag;
use crate::reviewer::{ClassificationRequest, ReferenceSource};

const SKIP: &str = "Skip (leave blank)";

/// Asks on the terminal for each untagged row.
pub struct PromptSource {
    items: Vec<&'static str>,
}

impl PromptSource {
    pub fn new() -> Self {
        let mut items: Vec<&'static str> = ReferenceTag::ALL.iter().map(|t| t.as_str()).collect();
        items.push(SKIP);
        Self { items }
    }
}

impl Default for PromptSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSource for PromptSource {
    fn request_classification(&mut self, request: &ClassificationRequest<'_>) -> Option<ReferenceTag> {
        let row = request.row;
        println!("{}", "\u{2500}".repeat(60));
        println!("  Row {} of {} to tag (line {})", request.number, request.total, request.index + 1);
        println!("  Date:   {}", fmt::date(row.date));
        println!("  Label:  {}", row.raw_label);
        println!("  Tier:   {}", row.tier());
        if !row.debit.is_zero() {
            println!("  Debit:  {}", fmt::amount(row.debit).red());
        }
        if !row.credit.is_zero() {
            println!("  Credit: {}", fmt::amount(row.credit).green());
        }

        let choice = Select::new()
            .with_prompt("Reference")
            .items(&self.items)
            .default(self.items.len() - 1)
            .interact();
        match choice {
            Ok(idx) => ReferenceTag::ALL.get(idx).copied(),
            Err(e) => {
                tracing::warn!("prompt failed, skipping row: {e}");
                None
            }
        }
    }
}
