use std::collections::HashSet;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use tracing::debug;

use crate::domain::{UNKNOWN_RANK, is_recognized_header_rank};
use crate::error::TaxbenchError;
use crate::fs_util;
use crate::profile::REQUIRED_COLUMNS;
use crate::validation::ValidationReport;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(\w+):(.+)$").expect("header pattern"));
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern"));

const REQUIRED_HEADERS: [&str; 3] = ["SampleID", "Version", "Ranks"];
const KNOWN_TAXONOMIES: [&str; 2] = ["NCBI", "GTDB"];
const PERCENTAGE_SUM_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedBioboxes {
    pub total_lines: usize,
    pub headers: Vec<(String, String)>,
    pub column_header: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
    pub structure_issues: Vec<String>,
}

impl ParsedBioboxes {
    pub fn parse(text: &str) -> Self {
        let mut parsed = Self::default();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            parsed.total_lines = line_no;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(columns) = line.strip_prefix("@@") {
                if parsed.column_header.is_some() {
                    parsed
                        .structure_issues
                        .push(format!("Line {line_no}: Duplicate column header: {line}"));
                    continue;
                }
                let columns = columns.trim();
                parsed.columns = columns.split('\t').map(|c| c.trim().to_string()).collect();
                parsed.column_header = Some(columns.to_string());
            } else if line.starts_with('@') {
                match HEADER_RE.captures(line) {
                    Some(caps) => parsed.set_header(&caps[1], caps[2].trim()),
                    None => parsed
                        .structure_issues
                        .push(format!("Line {line_no}: Invalid header format: {line}")),
                }
            } else if parsed.column_header.is_some() {
                parsed.rows.push(DataRow {
                    line: line_no,
                    fields: line.split('\t').map(str::to_string).collect(),
                });
            } else {
                debug!(line = line_no, "ignoring line before column header");
            }
        }
        parsed
    }

    fn set_header(&mut self, key: &str, value: &str) {
        match self.headers.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((key.to_string(), value.to_string())),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Index of each required column: by name, else its canonical position.
    fn column_indices(&self) -> [usize; 5] {
        let mut indices = [0; 5];
        for (canonical, name) in REQUIRED_COLUMNS.iter().enumerate() {
            indices[canonical] = self
                .columns
                .iter()
                .position(|column| column == name)
                .unwrap_or(canonical);
        }
        indices
    }
}

pub fn validate_bioboxes(path: &Utf8Path) -> ValidationReport {
    if !path.as_std_path().exists() {
        return ValidationReport::failed(format!("File not found: {path}"));
    }
    match fs_util::read_text(path) {
        Ok(text) => validate_text(&text),
        Err(err) => ValidationReport::failed(format!("Cannot read file: {err}")),
    }
}

pub fn validate_text(text: &str) -> ValidationReport {
    if text.is_empty() {
        return ValidationReport::failed("File is empty");
    }

    let parsed = ParsedBioboxes::parse(text);
    let mut report = ValidationReport::default();
    report.statistics.insert("total_lines", parsed.total_lines);
    if let Some(column_header) = &parsed.column_header {
        report.statistics.insert("column_header", column_header.as_str());
    }
    for issue in &parsed.structure_issues {
        report.error(issue.as_str());
    }

    for header in REQUIRED_HEADERS {
        if parsed.header(header).is_none() {
            report.error(format!("Missing required header: @{header}"));
        }
    }
    let found: Vec<&str> = parsed.headers.iter().map(|(key, _)| key.as_str()).collect();
    report.statistics.insert("headers_found", found);

    if let Some(version) = parsed.header("Version") {
        if !VERSION_RE.is_match(version) {
            report.error(format!(
                "Version format invalid: {version} (expected format: X.Y.Z)"
            ));
        }
        report.statistics.insert("version", version);
    }

    let header_ranks: Option<Vec<&str>> = parsed
        .header("Ranks")
        .map(|ranks| ranks.split('|').collect());
    if let Some(ranks) = &header_ranks {
        report.statistics.insert("ranks", ranks.clone());
        report.statistics.insert("num_ranks", ranks.len());
        let unexpected: Vec<String> = ranks
            .iter()
            .filter(|rank| !is_recognized_header_rank(rank) && !rank.starts_with("no_rank"))
            .map(|rank| format!("'{rank}'"))
            .collect();
        if !unexpected.is_empty() {
            report.error(format!("Unexpected rank names: [{}]", unexpected.join(", ")));
        }
    }

    if let Some(taxonomy_db) = parsed.header("TaxonomyID") {
        report.statistics.insert("taxonomy_db", taxonomy_db);
        if !KNOWN_TAXONOMIES.contains(&taxonomy_db) {
            report.warning(format!(
                "Unusual TaxonomyID: {taxonomy_db} (expected NCBI or GTDB)"
            ));
        }
    }

    if parsed.column_header.is_none() {
        report.error("Missing column header (line starting with @@)");
        return report;
    }

    report
        .statistics
        .insert("columns_found", parsed.columns.clone());
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|required| !parsed.columns.iter().any(|column| column == required))
        .collect();
    if !missing.is_empty() {
        report.error(format!("Missing required columns: {}", missing.join(", ")));
        report.error(format!("Found columns: {}", parsed.columns.join(", ")));
    }

    report.statistics.insert("data_rows", parsed.rows.len());
    if parsed.rows.is_empty() {
        report.error("No data rows found");
        return report;
    }

    let indices = parsed.column_indices();
    let needed = indices.iter().max().map_or(0, |max| max + 1);
    let mut percentages = Vec::new();
    let mut taxids = Vec::new();

    for row in &parsed.rows {
        let line = row.line;
        if row.fields.len() < needed {
            report.error(format!(
                "Line {line}: Insufficient columns (expected {needed}, got {})",
                row.fields.len()
            ));
            continue;
        }
        let [taxid, rank, taxpath, taxpathsn, percentage] =
            indices.map(|idx| row.fields[idx].trim());

        let taxid_value = match taxid.parse::<i64>() {
            Ok(value) => {
                if value <= 0 {
                    report.error(format!(
                        "Line {line}: Invalid TAXID (must be positive): {taxid}"
                    ));
                }
                taxids.push(value);
                Some(value)
            }
            Err(_) => {
                report.error(format!("Line {line}: TAXID not an integer: {taxid}"));
                None
            }
        };

        if let Some(ranks) = &header_ranks {
            if !ranks.contains(&rank) && rank != "no_rank" && rank != UNKNOWN_RANK {
                report.error(format!("Line {line}: RANK '{rank}' not in header Ranks"));
            }
        }

        if taxpath.is_empty() {
            report.error(format!("Line {line}: Empty TAXPATH"));
        } else {
            let parts: Vec<&str> = taxpath.split('|').collect();
            let mut all_integers = true;
            for part in &parts {
                if part.trim().parse::<i64>().is_err() {
                    report.error(format!("Line {line}: TAXPATH contains non-integer: {part}"));
                    all_integers = false;
                    break;
                }
            }
            let last = parts[parts.len() - 1];
            if let (true, Some(taxid_value), Ok(last_value)) =
                (all_integers, taxid_value, last.trim().parse::<i64>())
            {
                if last_value != taxid_value {
                    report.error(format!(
                        "Line {line}: Last TAXPATH element ({last}) doesn't match TAXID ({taxid})"
                    ));
                }
            }

            if !taxpathsn.is_empty() {
                let names = taxpathsn.split('|').count();
                if names != parts.len() {
                    report.error(format!(
                        "Line {line}: TAXPATHSN ({names} elements) doesn't match TAXPATH ({} elements)",
                        parts.len()
                    ));
                }
            }
        }

        match percentage.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if !(0.0..=100.0).contains(&value) {
                    report.error(format!(
                        "Line {line}: PERCENTAGE out of range [0, 100]: {value}"
                    ));
                }
                percentages.push(value);
            }
            _ => report.error(format!("Line {line}: PERCENTAGE not a number: {percentage}")),
        }
    }

    if !percentages.is_empty() {
        let sum: f64 = percentages.iter().sum();
        let min = percentages.iter().copied().fold(f64::INFINITY, f64::min);
        let max = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        report.statistics.insert("total_percentage", sum);
        report.statistics.insert("min_percentage", min);
        report.statistics.insert("max_percentage", max);
        if (sum - 100.0).abs() > PERCENTAGE_SUM_TOLERANCE {
            report.warning(format!(
                "Percentages sum to {sum:.2}% (expected ~100%). This may be acceptable for some use cases."
            ));
        }
    }

    if !taxids.is_empty() {
        let unique: HashSet<i64> = taxids.iter().copied().collect();
        report.statistics.insert("unique_taxids", unique.len());
        let duplicates = taxids.len() - unique.len();
        if duplicates > 0 {
            report.error(format!("Found {duplicates} duplicate TAXID entries"));
        }
    }

    report
}

/// One data row of a Bioboxes profile, as used by the comparison reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub taxid: u64,
    pub rank: String,
    pub name: String,
    pub percentage: f64,
}

/// Reads the data rows of a Bioboxes profile, skipping rows that do not
/// carry a positive TAXID and a numeric PERCENTAGE.
pub fn read_entries(path: &Utf8Path) -> Result<Vec<ProfileEntry>, TaxbenchError> {
    let text = fs_util::read_text(path)?;
    let parsed = ParsedBioboxes::parse(&text);
    if parsed.column_header.is_none() {
        return Err(TaxbenchError::InputFormat(format!(
            "{path} has no column header (line starting with @@)"
        )));
    }
    let [taxid_idx, rank_idx, _, name_idx, percentage_idx] = parsed.column_indices();

    let mut entries = Vec::new();
    for row in &parsed.rows {
        let field = |idx: usize| row.fields.get(idx).map(|value| value.trim());
        let taxid = field(taxid_idx).and_then(|value| value.parse::<u64>().ok());
        let percentage = field(percentage_idx)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite());
        let (Some(taxid), Some(percentage)) = (taxid.filter(|id| *id > 0), percentage) else {
            debug!(line = row.line, "skipping unreadable profile row in {path}");
            continue;
        };
        let name = field(name_idx)
            .and_then(|names| names.rsplit('|').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("taxid_{taxid}"));
        entries.push(ProfileEntry {
            taxid,
            rank: field(rank_idx).unwrap_or(UNKNOWN_RANK).to_string(),
            name,
            percentage,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "@SampleID:s1\n@Version:0.9.1\n@Ranks:superkingdom|species\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
2\tsuperkingdom\t2\tBacteria\t50.000000\n\
562\tspecies\t2|562\tBacteria|Escherichia coli\t50.000000\n";

    #[test]
    fn parse_splits_headers_columns_and_rows() {
        let parsed = ParsedBioboxes::parse(VALID);
        assert_eq!(parsed.header("SampleID"), Some("s1"));
        assert_eq!(parsed.header("Ranks"), Some("superkingdom|species"));
        assert_eq!(parsed.columns.len(), 5);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].line, 7);
        assert!(parsed.structure_issues.is_empty());
    }

    #[test]
    fn valid_profile_has_no_issues() {
        let report = validate_text(VALID);
        assert!(report.is_valid(), "{:?}", report.issues);
        assert_eq!(report.statistics.get("data_rows"), Some(&2.into()));
        assert_eq!(report.statistics.get("unique_taxids"), Some(&2.into()));
    }

    #[test]
    fn columns_are_located_by_name() {
        let text = "@SampleID:s1\n@Version:0.9.1\n@Ranks:species\n\
@@RANK\tTAXID\tPERCENTAGE\tTAXPATH\tTAXPATHSN\n\
species\t562\t100\t2|562\tBacteria|Escherichia coli\n";
        let report = validate_text(text);
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    #[test]
    fn malformed_header_and_second_column_header_are_flagged() {
        let text = format!("@broken header\n{VALID}@@TAXID\tRANK\n");
        let report = validate_text(&text);
        let messages = report.messages();
        assert!(messages.contains(&"Line 1: Invalid header format: @broken header"));
        assert!(messages.iter().any(|m| m.contains("Duplicate column header")));
    }
}
