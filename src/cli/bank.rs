use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categorizer::Categorizer;
use crate::cli::output_dir;
use crate::cli::review::PromptSource;
use crate::error::Result;
use crate::exporter::{self, output_path, render, write_files};
use crate::fmt::amount;
use crate::importer::{parse_mappings, parse_transactions, read_workbook, Layout};
use crate::pipeline::Pipeline;
use crate::reports::{aggregate, AggregationRow, GroupKey};
use crate::reviewer::{NoAnswers, ReferenceMode, ReferenceSource};
use crate::settings::load_settings;
use crate::tiers::TierResolver;

pub struct BankOptions<'a> {
    pub mapping: Option<&'a Path>,
    pub layout: Option<Layout>,
    pub references: Option<ReferenceMode>,
    pub output: Option<&'a str>,
    pub no_summary: bool,
}

pub fn run(file: &Path, opts: BankOptions<'_>) -> Result<()> {
    let settings = load_settings();
    let layout = opts.layout.unwrap_or(settings.layout);
    let mode = opts.references.unwrap_or(settings.references);

    let workbook = read_workbook(file, opts.mapping)?;
    let rows = parse_transactions(&workbook.transactions, layout)?;
    let mappings = parse_mappings(&workbook.mappings)?;
    let resolver = TierResolver::new(mappings, settings.tier_overrides.clone());
    tracing::debug!("{} tier patterns loaded", resolver.pattern_count());
    let categorizer = Categorizer::standard();
    let pipeline = Pipeline::new(&resolver, &categorizer);

    let mut quiet = NoAnswers;
    let mut prompt = PromptSource::new();
    let source: Option<&mut dyn ReferenceSource> = match mode {
        ReferenceMode::Off => None,
        ReferenceMode::Auto => Some(&mut quiet),
        ReferenceMode::Interactive => Some(&mut prompt),
    };
    let result = pipeline.run(rows, source);
    let summary = aggregate(&result.rows);

    let dir = output_dir(&settings, opts.output);
    let mut files = vec![(
        output_path(&dir, file, "import")?,
        render(|buf| exporter::write_transformed(buf, &result.rows))?,
    )];
    if !opts.no_summary {
        files.push((
            output_path(&dir, file, "summary")?,
            render(|buf| exporter::write_summary(buf, &summary))?,
        ));
    }
    write_files(&dir, &files)?;

    print_summary(&summary);
    println!(
        "{} rows, {} classified, {} without account, {} split",
        result.rows.len(),
        result.classified,
        result.unclassified,
        result.split
    );
    if mode != ReferenceMode::Off {
        println!(
            "References: {} from keywords, {} chosen, {} left blank",
            result.review.auto_tagged, result.review.manually_tagged, result.review.unresolved
        );
    }
    for (path, _) in &files {
        println!("{} {}", "Wrote".green(), path.display());
    }
    Ok(())
}

fn print_summary(rows: &[AggregationRow]) {
    let mut table = Table::new();
    table.set_header(vec!["Account", "Label", "Debit", "Credit"]);
    for row in rows {
        let cells = [
            row.key.to_string(),
            row.label.clone(),
            amount(row.debit),
            amount(row.credit),
        ];
        let styled: Vec<Cell> = cells
            .into_iter()
            .map(|text| {
                if row.key == GroupKey::Empty {
                    Cell::new(text.red())
                } else if row.is_total() {
                    Cell::new(text.bold())
                } else {
                    Cell::new(text)
                }
            })
            .collect();
        table.add_row(styled);
    }
    println!("Summary\n{table}");
}
