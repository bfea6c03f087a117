use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::BufRead;

use camino::Utf8Path;
use tracing::debug;

use crate::error::TaxbenchError;
use crate::fs_util;
use crate::validation::ValidationReport;

const CHECKED_DATA_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub extensions: &'static [&'static str],
    pub delimiter: char,
    pub min_columns: usize,
    pub max_columns: Option<usize>,
    pub example_columns: &'static [&'static str],
    pub header_marker: Option<&'static str>,
}

const KRAKEN_REPORT_COLUMNS: &[&str] = &[
    "percentage",
    "clade_reads",
    "taxon_reads",
    "rank",
    "taxID",
    "name",
];

pub const PROFILERS: &[ProfilerSpec] = &[
    ProfilerSpec {
        name: "bracken",
        description: "Bracken report format (6-7 tab-separated columns)",
        extensions: &[".kreport", ".bracken"],
        delimiter: '\t',
        min_columns: 6,
        max_columns: Some(7),
        example_columns: KRAKEN_REPORT_COLUMNS,
        header_marker: None,
    },
    ProfilerSpec {
        name: "centrifuge",
        description: "Centrifuge report format (6 tab-separated columns)",
        extensions: &[".report"],
        delimiter: '\t',
        min_columns: 6,
        max_columns: Some(6),
        example_columns: &[
            "percentage",
            "numReads",
            "numUniqueReads",
            "rank",
            "taxID",
            "name",
        ],
        header_marker: None,
    },
    ProfilerSpec {
        name: "diamond",
        description: "DIAMOND taxonomic assignment format",
        extensions: &[".diamond", ".tsv"],
        delimiter: '\t',
        min_columns: 2,
        max_columns: None,
        example_columns: &["taxon_id", "count"],
        header_marker: None,
    },
    ProfilerSpec {
        name: "ganon",
        description: "ganon profiling output (tab-separated)",
        extensions: &[".ganon", ".out"],
        delimiter: '\t',
        min_columns: 3,
        max_columns: None,
        example_columns: &["taxonomy_id", "lineage", "count"],
        header_marker: None,
    },
    ProfilerSpec {
        name: "kaiju",
        description: "Kaiju summary table format (tab-separated)",
        extensions: &[".kaiju", ".out"],
        delimiter: '\t',
        min_columns: 3,
        max_columns: None,
        example_columns: &["taxon_id", "taxon_name", "count"],
        header_marker: None,
    },
    ProfilerSpec {
        name: "kmcp",
        description: "KMCP profiling results (tab-separated)",
        extensions: &[".kmcp", ".out"],
        delimiter: '\t',
        min_columns: 2,
        max_columns: None,
        example_columns: &["taxid", "percentage"],
        header_marker: None,
    },
    ProfilerSpec {
        name: "kraken2",
        description: "Kraken2 report format (6 tab-separated columns)",
        extensions: &[".kreport", ".kreport2"],
        delimiter: '\t',
        min_columns: 6,
        max_columns: Some(6),
        example_columns: KRAKEN_REPORT_COLUMNS,
        header_marker: None,
    },
    ProfilerSpec {
        name: "krakenuniq",
        description: "KrakenUniq report format (6-8 tab-separated columns)",
        extensions: &[".krakenuniq", ".kreport"],
        delimiter: '\t',
        min_columns: 6,
        max_columns: Some(8),
        example_columns: &[
            "percentage",
            "reads",
            "taxReads",
            "kmers",
            "rank",
            "taxID",
            "name",
        ],
        header_marker: None,
    },
    ProfilerSpec {
        name: "megan6",
        description: "MEGAN6 taxonomic summary format",
        extensions: &[".megan", ".rma6"],
        delimiter: '\t',
        min_columns: 2,
        max_columns: None,
        example_columns: &["taxon_id", "count"],
        header_marker: None,
    },
    ProfilerSpec {
        name: "metaphlan",
        description: "MetaPhlAn profile format (3-4 tab-separated columns)",
        extensions: &[".profile", ".mpa", ".mpa3"],
        delimiter: '\t',
        min_columns: 3,
        max_columns: Some(4),
        example_columns: &[
            "clade_name",
            "NCBI_tax_id",
            "relative_abundance",
            "additional_species",
        ],
        header_marker: Some("#"),
    },
    ProfilerSpec {
        name: "motus",
        description: "mOTUs profiling output (tab-separated)",
        extensions: &[".motus", ".out"],
        delimiter: '\t',
        min_columns: 2,
        max_columns: None,
        example_columns: &["taxonomy", "count"],
        header_marker: None,
    },
];

pub fn supported_profilers() -> String {
    PROFILERS
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn find_profiler(name: &str) -> Result<&'static ProfilerSpec, TaxbenchError> {
    let name = name.trim().to_ascii_lowercase();
    PROFILERS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| TaxbenchError::UnknownProfiler {
            name,
            supported: supported_profilers(),
        })
}

impl ProfilerSpec {
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Format specification for {}:", self.name);
        let _ = writeln!(out, "  Description: {}", self.description);
        let _ = writeln!(out, "  Extensions: {}", self.extensions.join(", "));
        let _ = writeln!(out, "  Delimiter: {:?}", self.delimiter);
        let _ = writeln!(out, "  Min columns: {}", self.min_columns);
        let max = self
            .max_columns
            .map_or_else(|| "unbounded".to_string(), |max| max.to_string());
        let _ = writeln!(out, "  Max columns: {max}");
        let _ = writeln!(out, "  Example columns: {}", self.example_columns.join(", "));
        if let Some(marker) = self.header_marker {
            let _ = writeln!(out, "  Header marker: {marker}");
        }
        out
    }

    fn expected_columns(&self) -> String {
        format!("  Expected columns: {}", self.example_columns.join(", "))
    }
}

/// Checks that a raw profiler output looks like something taxpasta can
/// standardise for the named profiler.
pub fn check_profiler_output(profiler: &str, path: &Utf8Path) -> ValidationReport {
    let spec = match find_profiler(profiler) {
        Ok(spec) => spec,
        Err(_) => {
            let mut report = ValidationReport::failed(format!("Unknown profiler '{profiler}'"));
            report.error(format!("Supported profilers: {}", supported_profilers()));
            return report;
        }
    };
    if !path.as_std_path().exists() {
        return ValidationReport::failed(format!("File does not exist: {path}"));
    }

    let mut report = ValidationReport::default();
    let extension = path
        .extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    if !spec.extensions.contains(&extension.as_str()) {
        report.error(format!(
            "File extension '{extension}' does not match expected extensions for {}",
            spec.name
        ));
        report.error(format!("Expected extensions: {}", spec.extensions.join(", ")));
    }

    let lines = match read_non_empty_lines(path) {
        Ok(lines) => lines,
        Err(err) => {
            report.error(format!("Error reading file: {err}"));
            return report;
        }
    };
    if lines.is_empty() {
        report.error("File is empty");
        return report;
    }

    let data_lines: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| spec.header_marker.is_none_or(|marker| !line.starts_with(marker)))
        .collect();
    if data_lines.is_empty() {
        report.error("File contains no data lines (only headers or empty)");
        return report;
    }
    report.statistics.insert("data_lines", data_lines.len());

    let mut column_counts: BTreeMap<usize, usize> = BTreeMap::new();
    for (idx, line) in data_lines.iter().take(CHECKED_DATA_LINES).enumerate() {
        let line_no = idx + 1;
        let columns = line.split(spec.delimiter).count();
        *column_counts.entry(columns).or_default() += 1;
        if columns < spec.min_columns {
            report.error(format!(
                "Line {line_no}: Has {columns} columns but {} expects at least {}",
                spec.name, spec.min_columns
            ));
            report.error(spec.expected_columns());
        }
        if let Some(max) = spec.max_columns.filter(|max| columns > *max) {
            report.error(format!(
                "Line {line_no}: Has {columns} columns but {} expects at most {max}",
                spec.name
            ));
            report.error(spec.expected_columns());
        }
    }
    debug!(?column_counts, "column counts in checked lines");
    if column_counts.len() > 1 {
        let summary = column_counts
            .iter()
            .map(|(columns, lines)| format!("{columns}: {lines}"))
            .collect::<Vec<_>>()
            .join(", ");
        report.warning(format!("Inconsistent column counts in file: {{{summary}}}"));
    }

    report
}

fn read_non_empty_lines(path: &Utf8Path) -> Result<Vec<String>, TaxbenchError> {
    let reader = fs_util::open_text(path)?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|err| TaxbenchError::InputRead {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        if !line.trim().is_empty() {
            lines.push(line.trim_end_matches('\r').to_string());
        }
    }
    Ok(lines)
}
