use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::validation::{Issue, Severity, Statistics, ValidationReport};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Bioboxes,
    Taxpasta,
}

impl ReportFormat {
    fn label(self) -> &'static str {
        match self {
            Self::Bioboxes => "CAMI Bioboxes",
            Self::Taxpasta => "taxpasta",
        }
    }

    fn reference(self) -> Option<&'static str> {
        match self {
            Self::Bioboxes => Some("https://github.com/bioboxes/rfc/tree/master/data-format"),
            Self::Taxpasta => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub file: &'a str,
    pub valid: bool,
    pub issues: &'a [Issue],
    pub statistics: &'a Statistics,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(file: &str, report: &ValidationReport, strict: bool) -> io::Result<()> {
        Self::print_json(&ReportDocument {
            file,
            valid: report.passes(strict),
            issues: &report.issues,
            statistics: &report.statistics,
        })
    }

    pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_report(
        file: &str,
        format: ReportFormat,
        report: &ValidationReport,
        strict: bool,
    ) -> io::Result<()> {
        io::stdout().write_all(Self::render_report(file, format, report, strict).as_bytes())
    }

    pub fn render_report(
        file: &str,
        format: ReportFormat,
        report: &ValidationReport,
        strict: bool,
    ) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();
        let _ = writeln!(out, "Validating: {file}");
        let _ = writeln!(out, "{rule}");

        if !report.statistics.is_empty() {
            let _ = writeln!(out, "\nStatistics:");
            for (key, value) in report.statistics.iter() {
                let _ = writeln!(out, "  {key}: {}", display_value(value));
            }
        }

        if !report.issues.is_empty() {
            let _ = writeln!(out, "\nValidation Issues:");
            for issue in &report.issues {
                let _ = writeln!(out, "  {} {}", marker(issue.severity), issue.message);
            }
        }

        let _ = writeln!(out, "\n{rule}");
        if report.passes(strict) {
            let _ = writeln!(
                out,
                "✓ VALID: File conforms to {} format",
                format.label()
            );
        } else {
            let _ = writeln!(out, "✗ INVALID: File has format issues");
            let _ = writeln!(out, "\nPlease fix the issues above before using this file.");
            if let Some(reference) = format.reference() {
                let _ = writeln!(out, "\nSee: {reference}");
            }
        }
        out
    }

    pub fn render_profiler_check(profiler: &str, file: &str, report: &ValidationReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Validating {file} as {profiler} format...");
        if report.passes(false) {
            let _ = writeln!(out, "✓ File appears to be valid {profiler} format");
            if !report.issues.is_empty() {
                let _ = writeln!(out, "\nWarnings:");
                for issue in &report.issues {
                    let _ = writeln!(out, "  {}", issue.message);
                }
            }
        } else {
            let _ = writeln!(out, "\n✗ File does not appear to be valid {profiler} format\n");
            let _ = writeln!(out, "Issues found:");
            for issue in &report.issues {
                let _ = writeln!(out, "  • {}", issue.message);
            }
            let _ = writeln!(out, "\nFor format details, run:");
            let _ = writeln!(out, "  taxbench check-profiler {profiler} --show-spec");
        }
        out
    }
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.len() > 10 => format!("{} items", items.len()),
        other => other.to_string(),
    }
}
