use comfy_table::{Cell, Table};

use crate::categorizer::{supplier_keywords, Categorizer};
use crate::error::Result;

pub fn run() -> Result<()> {
    let categorizer = Categorizer::standard();
    let mut table = Table::new();
    table.set_header(vec!["#", "Rule", "Account", "Condition"]);
    for (i, rule) in categorizer.rules().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.name),
            Cell::new(rule.account),
            Cell::new(&rule.predicate),
        ]);
    }
    println!("Classification rules (first match wins)\n{table}");
    println!("Supplier keywords: {}", supplier_keywords().join(", "));
    Ok(())
}
