use crate::report::error_previews;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use tilefuzz::{RunKind, RunSummary};

/// Number of distinct errors listed under the summary
const TOP_ERRORS: usize = 5;

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_summary(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        output.push_str(&self.format_run_table(summary));
        output.push('\n');

        if !summary.statistics.outcomes.is_empty() {
            output.push_str(&self.format_outcome_table(summary));
            output.push('\n');
        }

        let errors = error_previews(&summary.statistics);
        if !errors.is_empty() {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(Row::from(vec![
                Cell::new("Most frequent errors").set_alignment(CellAlignment::Left),
                Cell::new("Count").set_alignment(CellAlignment::Right),
            ]));
            for (preview, count) in errors.iter().take(TOP_ERRORS) {
                table.add_row(Row::from(vec![
                    Cell::new(preview.replace('\n', "\\n")),
                    Cell::new(count).set_alignment(CellAlignment::Right),
                ]));
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output
    }

    fn format_run_table(&self, summary: &RunSummary) -> String {
        let kind = match summary.kind {
            RunKind::Fuzz => "fuzz",
            RunKind::Mutation => "mutation",
        };

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Run").set_alignment(CellAlignment::Left),
            Cell::new("Value").set_alignment(CellAlignment::Left),
        ]));
        table.add_row(Row::from(vec!["Kind".to_string(), kind.to_string()]));
        table.add_row(Row::from(vec!["Seed".to_string(), summary.seed.to_string()]));
        table.add_row(Row::from(vec![
            "Iterations".to_string(),
            summary.iterations().to_string(),
        ]));
        table.add_row(Row::from(vec![
            "Runtime".to_string(),
            format!("{:.2}s", summary.runtime().as_secs_f64()),
        ]));

        if let Some(mutation) = &summary.mutation {
            table.add_row(Row::from(vec![
                "Visited".to_string(),
                format!("{}/{}", mutation.visited, mutation.estimated_total),
            ]));
            table.add_row(Row::from(vec![
                "Max depth".to_string(),
                mutation.search.max_depth_reached.to_string(),
            ]));
            table.add_row(Row::from(vec![
                "Duplicates skipped".to_string(),
                mutation.search.skipped.to_string(),
            ]));
        }

        table.to_string()
    }

    fn format_outcome_table(&self, summary: &RunSummary) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Exit code").set_alignment(CellAlignment::Left),
            Cell::new("Count").set_alignment(CellAlignment::Right),
        ]));
        for (outcome, count) in &summary.statistics.outcomes {
            table.add_row(Row::from(vec![
                Cell::new(outcome),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]));
        }
        table.to_string()
    }
}
