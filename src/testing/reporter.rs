//! Test reporter - render run reports and the test catalog
//!
//! Rendering only reads the report; it never changes it.

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

use super::category::CategoryOrder;
use super::registry::Registry;
use super::report::RunReport;
use super::runner::TestResult;
use crate::common::truncate_display;

/// Width the test name is padded to in the console tree
const NAME_WIDTH: usize = 50;

/// What the run was pointed at
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub server: String,
    pub provider: String,
    pub model: String,
}

/// Console tree renderer
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    /// Actual values longer than this are cut in the tree
    max_got_len: usize,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ConsoleReporter {
    pub fn new(max_got_len: usize) -> Self {
        Self { max_got_len }
    }

    /// Render the whole report: header, per-category results, summary
    pub fn render(&self, info: &RunInfo, report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
        if report.is_empty() {
            writeln!(out, "{}", "No tests to run".yellow())?;
            return Ok(());
        }

        self.header(info, out)?;
        self.results(report, out)?;
        self.summary(report, out)
    }

    /// Print the run header
    pub fn header(&self, info: &RunInfo, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "OpenAI Compatibility Test Suite".bold())?;
        writeln!(out, "Server: {}", info.server)?;
        writeln!(out, "Provider: {} (model: {})", info.provider, info.model)?;
        writeln!(out)
    }

    /// Print results grouped by category
    pub fn results(&self, report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
        for (category, results) in report.grouped() {
            self.category_heading(category, out)?;
            for result in results {
                self.result_line(result, out)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Print the heading that opens a category section
    pub fn category_heading(&self, category: &str, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", category.cyan().bold())
    }

    /// Print one result line plus its detail lines
    pub fn result_line(&self, result: &TestResult, out: &mut dyn Write) -> io::Result<()> {
        let name = format!("{:<width$}", result.name, width = NAME_WIDTH);
        let duration = format!("{:.2}s", result.duration.as_secs_f64());

        if let Some(reason) = result.outcome.skip_reason() {
            writeln!(out, "  {} {} {}", "○".yellow(), name, "skip".dimmed())?;
            writeln!(out, "    {}", format!("│ Reason: {}", reason).dimmed())?;
            return Ok(());
        }

        if result.passed() {
            writeln!(out, "  {} {} {}", "✓".green(), name, duration.dimmed())?;
            return Ok(());
        }

        writeln!(out, "  {} {} {}", "✗".red(), name, duration.dimmed())?;
        if let Some(error) = result.outcome.error_message() {
            writeln!(out, "    {}", format!("│ {}", error).red())?;
        }
        if let Some(expected) = result.outcome.expected() {
            writeln!(out, "    {}", format!("│ Expected: {}", display_value(expected)).dimmed())?;
        }
        if let Some(got) = result.outcome.got() {
            let got = truncate_display(&display_value(got), self.max_got_len);
            writeln!(out, "    {}", format!("│ Got: {}", got).dimmed())?;
        }
        Ok(())
    }

    /// Print summary counts and total duration
    pub fn summary(&self, report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
        let summary = report.summary();

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed).green().to_string());
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed).red().to_string());
        }
        if summary.skipped > 0 {
            parts.push(format!("{} skipped", summary.skipped).yellow().to_string());
        }

        writeln!(out, "{}", "─".repeat(NAME_WIDTH))?;
        writeln!(out, "Results: {}", parts.join(", "))?;
        writeln!(out, "Duration: {:.2}s", summary.total_duration.as_secs_f64())
    }
}

/// Strings print bare, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON document for one run
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub server: &'a str,
    pub provider: &'a str,
    pub model: &'a str,
    pub results: Vec<JsonResult<'a>>,
    pub summary: JsonSummary,
}

/// One result in the JSON document
#[derive(Debug, Serialize)]
pub struct JsonResult<'a> {
    pub name: &'a str,
    pub category: &'a str,
    /// True for passed and skipped tests
    pub passed: bool,
    pub skipped: bool,
    pub outcome: &'static str,
    /// Seconds
    pub duration: f64,
    pub error: Option<String>,
    pub skip_reason: Option<&'a str>,
    pub expected: Option<&'a Value>,
    pub got: Option<&'a Value>,
}

/// Summary counts in the JSON document
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Seconds
    pub total_duration: f64,
}

impl<'a> JsonReport<'a> {
    pub fn new(info: &'a RunInfo, report: &'a RunReport) -> Self {
        let summary = report.summary();
        Self {
            server: &info.server,
            provider: &info.provider,
            model: &info.model,
            results: report
                .results()
                .iter()
                .map(|r| JsonResult {
                    name: &r.name,
                    category: &r.category,
                    passed: r.passed(),
                    skipped: r.skipped(),
                    outcome: r.outcome.label(),
                    duration: r.duration.as_secs_f64(),
                    error: r.outcome.error_message(),
                    skip_reason: r.outcome.skip_reason(),
                    expected: r.outcome.expected(),
                    got: r.outcome.got(),
                })
                .collect(),
            summary: JsonSummary {
                passed: summary.passed,
                failed: summary.failed,
                skipped: summary.skipped,
                total_duration: summary.total_duration.as_secs_f64(),
            },
        }
    }
}

/// Render the report as a pretty-printed JSON document
pub fn render_json(info: &RunInfo, report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::new(info, report))
}

/// Catalog grouped by category in display order, names sorted in a group
fn catalog<C>(registry: &Registry<C>, order: &CategoryOrder) -> Vec<(String, Vec<String>)> {
    let cases: Vec<_> = registry.all().collect();
    order
        .group(&cases, |case| case.category())
        .into_iter()
        .map(|(category, members)| {
            let mut names: Vec<String> = members.iter().map(|c| c.name().to_string()).collect();
            names.sort();
            (category.to_string(), names)
        })
        .collect()
}

/// Print the test catalog as a two-column table
pub fn render_catalog<C>(
    registry: &Registry<C>,
    order: &CategoryOrder,
    out: &mut dyn Write,
) -> io::Result<()> {
    let groups = catalog(registry, order);
    let width = groups
        .iter()
        .map(|(c, _)| c.len())
        .max()
        .unwrap_or(0)
        .max("Category".len());

    writeln!(out, "{}", "Available Tests".bold())?;
    writeln!(out, "{:<width$}  {}", "Category", "Test Name", width = width)?;
    writeln!(out, "{}", "─".repeat(width + 2 + NAME_WIDTH))?;
    for (category, names) in &groups {
        for (i, name) in names.iter().enumerate() {
            let label = if i == 0 { category.as_str() } else { "" };
            writeln!(
                out,
                "{}  {}",
                format!("{:<width$}", label, width = width).cyan(),
                name
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out, "{} tests in {} categories", registry.len(), groups.len())
}

/// The test catalog as JSON: `[{"category": ..., "tests": [...]}, ...]`
pub fn catalog_json<C>(registry: &Registry<C>, order: &CategoryOrder) -> Value {
    Value::Array(
        catalog(registry, order)
            .into_iter()
            .map(|(category, tests)| serde_json::json!({ "category": category, "tests": tests }))
            .collect(),
    )
}
