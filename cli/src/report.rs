//! Markdown and JSON reports written after a run.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tilefuzz::{FuzzConfig, RunHistory, RunRecord, RunStatistics, RunSummary};

/// Outputs longer than this are cut in the statistics section
pub const ERROR_PREVIEW_CHARS: usize = 50;

pub const PARTIAL_REPORT: &str = "report_temp.md";

pub struct ReportPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    config: &'a FuzzConfig,
    summary: &'a RunSummary,
    history: &'a RunHistory,
}

pub fn write_reports(
    output_dir: &Path,
    config: &FuzzConfig,
    summary: &RunSummary,
    history: &RunHistory,
) -> Result<ReportPaths> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let markdown = output_dir.join("report.md");
    fs::write(&markdown, render_markdown(config, summary, history)?)
        .with_context(|| format!("Failed to write {}", markdown.display()))?;

    let json = output_dir.join("report.json");
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        config,
        summary,
        history,
    };
    fs::write(&json, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {}", json.display()))?;

    Ok(ReportPaths { markdown, json })
}

/// Overwrite `report_temp.md` with the history recorded so far
pub fn write_partial(
    output_dir: &Path,
    config: &FuzzConfig,
    summary: &RunSummary,
    history: &RunHistory,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = output_dir.join(PARTIAL_REPORT);
    fs::write(&path, render_markdown(config, summary, history)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn render_markdown(
    config: &FuzzConfig,
    summary: &RunSummary,
    history: &RunHistory,
) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "# tilefuzz Report\n")?;
    writeln!(out, "## Table of Contents\n")?;
    writeln!(out, "* [Configuration](#configuration)")?;
    writeln!(out, "* [Arguments](#arguments)")?;
    writeln!(out, "* [Statistics](#statistics)")?;
    writeln!(out, "* [History](#history)\n")?;

    writeln!(out, "## Configuration\n")?;
    writeln!(out, "```json\n{}\n```\n", serde_json::to_string_pretty(config)?)?;

    writeln!(out, "## Arguments\n")?;
    writeln!(out, "```bash")?;
    writeln!(out, "--max-iterations: {}", optional(summary.budget.max_iterations))?;
    writeln!(out, "--max-time: {}", optional(summary.budget.max_time_secs))?;
    writeln!(out, "--seed: {}", summary.seed)?;
    writeln!(out, "```\n")?;

    writeln!(out, "## Statistics\n")?;
    write_statistics(&mut out, summary)?;

    writeln!(out, "## History\n")?;
    writeln!(
        out,
        "| Iteration | Exit Code | Map | Commands | Output | Notes |"
    )?;
    writeln!(
        out,
        "| --------- | --------- | --- | -------- | ------ | ----- |"
    )?;
    for record in history {
        write_history_row(&mut out, record)?;
    }

    writeln!(
        out,
        "\n> Report generated at {}.",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    Ok(out)
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

fn write_statistics(out: &mut String, summary: &RunSummary) -> std::fmt::Result {
    let statistics = &summary.statistics;
    writeln!(out, "- Iterations: {}", statistics.iterations)?;
    writeln!(
        out,
        "- Runtime: {:.2} seconds",
        statistics.runtime.as_secs_f64()
    )?;
    if let Some(mutation) = &summary.mutation {
        writeln!(
            out,
            "- Mutations: {} visited of {} estimated ({:?})",
            mutation.visited, mutation.estimated_total, mutation.search.end
        )?;
    }

    writeln!(out, "\n| Exit Code | Count |")?;
    writeln!(out, "| --------- | ----- |")?;
    for (outcome, count) in &statistics.outcomes {
        writeln!(out, "| {} | {} |", outcome, count)?;
    }

    let errors = error_previews(statistics);
    if !errors.is_empty() {
        writeln!(out, "\n| Error | Count |")?;
        writeln!(out, "| ----- | ----- |")?;
        for (preview, count) in errors {
            writeln!(out, "| {} | {} |", cell(&preview), count)?;
        }
    }
    writeln!(out)
}

/// Error outputs cut to [`ERROR_PREVIEW_CHARS`], merged when the cut makes
/// them equal, most frequent first
pub fn error_previews(statistics: &RunStatistics) -> Vec<(String, u64)> {
    let mut previews: Vec<(String, u64)> = Vec::new();
    for error in &statistics.errors {
        let preview = truncate(&error.output);
        match previews.iter_mut().find(|(p, _)| *p == preview) {
            Some((_, count)) => *count += error.count,
            None => previews.push((preview, error.count)),
        }
    }
    previews.sort_by(|a, b| b.1.cmp(&a.1));
    previews
}

fn truncate(output: &str) -> String {
    if output.chars().count() > ERROR_PREVIEW_CHARS {
        let cut: String = output.chars().take(ERROR_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        output.to_string()
    }
}

fn write_history_row(out: &mut String, record: &RunRecord) -> std::fmt::Result {
    writeln!(
        out,
        "| {} | {} | {} | {} | {} | {} |",
        record.iteration,
        record.outcome,
        cell(record.map.as_str()),
        cell(record.commands.as_str()),
        cell(&record.output),
        cell(record.note.as_deref().unwrap_or(""))
    )
}

/// Render a value as inline code inside a table cell.
/// Multi-line values become one code span per line.
fn cell(value: &str) -> String {
    let value = value.replace('|', "\\|");
    if value.is_empty() {
        return String::new();
    }
    if value.trim_end_matches('\n').contains('\n') {
        value
            .trim_end_matches('\n')
            .lines()
            .map(|line| format!("`{}`", line))
            .collect::<Vec<_>>()
            .join("<br>")
    } else {
        format!("`{}`", value.replace('\n', "\\n"))
    }
}
