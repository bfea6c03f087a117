use std::collections::{HashMap, HashSet};
use std::io::Read;

use camino::Utf8Path;
use csv::ReaderBuilder;

use crate::domain::TaxId;
use crate::error::TaxbenchError;
use crate::fs_util;
use crate::validation::ValidationReport;

pub const TAXONOMY_ID_COLUMN: &str = "taxonomy_id";
pub const COUNT_COLUMN: &str = "count";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizedRow {
    pub line: u64,
    pub taxonomy_id: Option<String>,
    pub count: Option<String>,
}

/// A taxpasta standardized profile: tab separated, one header row.
#[derive(Debug, Clone)]
pub struct StandardizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<StandardizedRow>,
}

impl StandardizedTable {
    pub fn read(path: &Utf8Path) -> Result<Self, TaxbenchError> {
        let reader = fs_util::open_text(path)?;
        Self::parse(reader).map_err(|err| TaxbenchError::InputRead {
            path: path.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn parse(reader: impl Read) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|column| column.trim().to_string())
            .collect();
        let taxid_idx = columns.iter().position(|c| c == TAXONOMY_ID_COLUMN);
        let count_idx = columns.iter().position(|c| c == COUNT_COLUMN);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let field = |idx: Option<usize>| {
                idx.and_then(|idx| record.get(idx))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            rows.push(StandardizedRow {
                line,
                taxonomy_id: field(taxid_idx),
                count: field(count_idx),
            });
        }

        Ok(Self { columns, rows })
    }

    pub fn missing_columns(&self) -> Vec<&'static str> {
        [TAXONOMY_ID_COLUMN, COUNT_COLUMN]
            .into_iter()
            .filter(|required| !self.columns.iter().any(|column| column == required))
            .collect()
    }

    pub fn require_columns(&self) -> Result<(), TaxbenchError> {
        let missing = self.missing_columns();
        if missing.is_empty() {
            return Ok(());
        }
        Err(TaxbenchError::InputFormat(format!(
            "input must contain '{TAXONOMY_ID_COLUMN}' and '{COUNT_COLUMN}' columns (missing: {}; found: {})",
            missing.join(", "),
            self.columns.join(", ")
        )))
    }
}

pub fn parse_count(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|count| count.is_finite())
}

pub fn validate_taxpasta(path: &Utf8Path) -> ValidationReport {
    if !path.as_std_path().exists() {
        return ValidationReport::failed(format!("File not found: {path}"));
    }
    let reader = match fs_util::open_text(path) {
        Ok(reader) => reader,
        Err(err) => return ValidationReport::failed(format!("Cannot read file: {err}")),
    };
    match StandardizedTable::parse(reader) {
        Ok(table) => validate_table(&table),
        Err(err) => ValidationReport::failed(format!("Cannot parse file as TSV: {err}")),
    }
}

pub fn validate_table(table: &StandardizedTable) -> ValidationReport {
    let mut report = ValidationReport::default();
    if table.columns.iter().all(|column| column.is_empty()) && table.rows.is_empty() {
        report.error("File is empty");
        return report;
    }
    report.statistics.insert("total_rows", table.rows.len());

    let missing = table.missing_columns();
    if !missing.is_empty() {
        report.error(format!("Missing required columns: {}", missing.join(", ")));
        report.error(format!("Found columns: {}", table.columns.join(", ")));
        return report;
    }
    report.statistics.insert("total_entries", table.rows.len());

    let missing_taxid = table.rows.iter().filter(|row| row.taxonomy_id.is_none()).count();
    if missing_taxid > 0 {
        report.error(format!("Found {missing_taxid} rows with missing taxonomy_id"));
        report.statistics.insert("missing_taxonomy_id", missing_taxid);
    }

    let mut invalid_taxid_examples = Vec::new();
    let mut non_positive_taxid = 0usize;
    let mut taxids: Vec<Option<TaxId>> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(raw) = row.taxonomy_id.as_deref() else {
            taxids.push(None);
            continue;
        };
        match raw.parse::<TaxId>() {
            Ok(taxid) => taxids.push(Some(taxid)),
            Err(_) => {
                taxids.push(None);
                if raw.parse::<i64>().is_ok_and(|value| value <= 0) {
                    non_positive_taxid += 1;
                } else {
                    invalid_taxid_examples.push(raw.to_string());
                }
            }
        }
    }
    if !invalid_taxid_examples.is_empty() {
        report.error(format!(
            "Found {} rows with invalid taxonomy_id (not convertible to integer)",
            invalid_taxid_examples.len()
        ));
        report
            .statistics
            .insert("invalid_taxonomy_id", invalid_taxid_examples.len());
        report.error(format!("  Examples: {}", examples(&invalid_taxid_examples, 5)));
    }
    if non_positive_taxid > 0 {
        report.error(format!(
            "Found {non_positive_taxid} rows with non-positive taxonomy_id"
        ));
        report
            .statistics
            .insert("negative_taxonomy_id", non_positive_taxid);
    }

    let missing_count = table.rows.iter().filter(|row| row.count.is_none()).count();
    if missing_count > 0 {
        report.error(format!("Found {missing_count} rows with missing count"));
        report.statistics.insert("missing_count", missing_count);
    }

    let mut invalid_count_examples = Vec::new();
    let mut counts: Vec<Option<f64>> = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(raw) = row.count.as_deref() else {
            counts.push(None);
            continue;
        };
        let parsed = parse_count(raw);
        if parsed.is_none() {
            invalid_count_examples.push(raw.to_string());
        }
        counts.push(parsed);
    }
    if !invalid_count_examples.is_empty() {
        report.error(format!(
            "Found {} rows with invalid count (not numeric)",
            invalid_count_examples.len()
        ));
        report
            .statistics
            .insert("invalid_count", invalid_count_examples.len());
        report.error(format!("  Examples: {}", examples(&invalid_count_examples, 5)));
    }

    let numeric: Vec<f64> = counts.iter().flatten().copied().collect();
    if !numeric.is_empty() {
        let non_positive = numeric.iter().filter(|count| **count <= 0.0).count();
        if non_positive > 0 {
            report.error(format!("Found {non_positive} rows with non-positive count"));
            report.statistics.insert("negative_count", non_positive);
        }
        let total: f64 = numeric.iter().sum();
        let min = numeric.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        report.statistics.insert("total_reads", total.trunc() as i64);
        report.statistics.insert("min_count", min.trunc() as i64);
        report.statistics.insert("max_count", max.trunc() as i64);
        report
            .statistics
            .insert("mean_count", total / numeric.len() as f64);
    }

    let mut seen = HashSet::new();
    let mut occurrences: HashMap<TaxId, usize> = HashMap::new();
    let mut duplicates = 0usize;
    for taxid in taxids.iter().flatten() {
        *occurrences.entry(*taxid).or_default() += 1;
        if !seen.insert(*taxid) {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        report.error(format!("Found {duplicates} duplicate taxonomy_id entries"));
        report.statistics.insert("duplicate_taxonomy_id", duplicates);
        let duplicated: Vec<String> = table
            .rows
            .iter()
            .zip(&taxids)
            .filter_map(|(row, taxid)| {
                let taxid = (*taxid)?;
                (occurrences[&taxid] > 1).then(|| row.taxonomy_id.clone().unwrap_or_default())
            })
            .collect();
        report.error(format!("  Examples: {}", examples(&duplicated, 10)));
    }

    let valid: Vec<TaxId> = taxids
        .iter()
        .zip(&counts)
        .filter_map(|(taxid, count)| match (taxid, count) {
            (Some(taxid), Some(count)) if *count > 0.0 => Some(*taxid),
            _ => None,
        })
        .collect();
    let unique: HashSet<TaxId> = valid.iter().copied().collect();
    report.statistics.insert("valid_rows", valid.len());
    report.statistics.insert("unique_taxa", unique.len());

    report
}

fn examples(values: &[String], limit: usize) -> String {
    let shown: Vec<String> = values
        .iter()
        .take(limit)
        .map(|value| format!("'{value}'"))
        .collect();
    format!("[{}]", shown.join(", "))
}
