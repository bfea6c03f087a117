use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::bioboxes::{self, ProfileEntry};
use crate::error::TaxbenchError;
use crate::fs_util;
use crate::pca::{self, PcaResult};

pub const DEFAULT_DIFF_THRESHOLD: f64 = 1.0;
pub const OPAL_RESULTS_FILE: &str = "results.tsv";
pub const DIFF_TAXA_COLUMNS: [&str; 7] = [
    "taxid",
    "rank",
    "taxname",
    "observed_pct",
    "expected_pct",
    "p_value",
    "classifier",
];

const GOLD_STANDARD_TOOL: &str = "gold standard";
const SPECIES_RANK: &str = "species";

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub opal_dir: Utf8PathBuf,
    pub gold_standard: Utf8PathBuf,
    pub sample_id: String,
    pub labels: Vec<String>,
    pub output_prefix: String,
    pub profiles: Vec<Utf8PathBuf>,
    pub threshold: f64,
}

impl CompareOptions {
    fn check(&self) -> Result<(), TaxbenchError> {
        if self.labels.is_empty() {
            return Err(TaxbenchError::InputFormat(
                "at least one classifier label is required".to_string(),
            ));
        }
        if !self.profiles.is_empty() && self.profiles.len() != self.labels.len() {
            return Err(TaxbenchError::InputFormat(format!(
                "{} profiles given for {} labels",
                self.profiles.len(),
                self.labels.len()
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(TaxbenchError::InputFormat(format!(
                "difference threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        fs_util::ensure_exists(&self.gold_standard)?;
        for profile in &self.profiles {
            fs_util::ensure_exists(profile)?;
        }
        Ok(())
    }

    pub fn outputs(&self) -> CompareOutputs {
        let prefix = &self.output_prefix;
        CompareOutputs {
            pca_html: Utf8PathBuf::from(format!("{prefix}_pca.html")),
            diff_taxa_tsv: Utf8PathBuf::from(format!("{prefix}_diff_taxa.tsv")),
            comparison_html: Utf8PathBuf::from(format!("{prefix}_comparison.html")),
        }
    }
}

pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOutputs {
    pub pca_html: Utf8PathBuf,
    pub diff_taxa_tsv: Utf8PathBuf,
    pub comparison_html: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub tool: String,
    pub rank: String,
    pub metric: String,
    pub sample: String,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
struct OpalRecord {
    tool: String,
    rank: String,
    metric: String,
    sample: String,
    value: String,
}

/// Reads OPAL's long-format `results.tsv`. Rows whose value is not a finite
/// number (OPAL writes `nan` for undefined metrics) are skipped.
pub fn read_opal_results(path: &Utf8Path) -> Result<Vec<MetricRow>, TaxbenchError> {
    let reader = fs_util::open_text(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize::<OpalRecord>() {
        let record = record.map_err(|err| TaxbenchError::OpalResults(format!("{path}: {err}")))?;
        let Some(value) = record
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
        else {
            continue;
        };
        rows.push(MetricRow {
            tool: record.tool.trim().to_string(),
            rank: record.rank.trim().to_string(),
            metric: record.metric.trim().to_string(),
            sample: record.sample.trim().to_string(),
            value,
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone)]
pub enum AnalysisMode {
    Full(Vec<MetricRow>),
    Placeholder { reason: String },
}

impl AnalysisMode {
    pub fn probe(opal_dir: &Utf8Path) -> Self {
        let results = opal_dir.join(OPAL_RESULTS_FILE);
        if !results.as_std_path().is_file() {
            return Self::Placeholder {
                reason: format!("{results} not found"),
            };
        }
        match read_opal_results(&results) {
            Ok(rows) if rows.is_empty() => Self::Placeholder {
                reason: format!("{results} has no metric rows"),
            },
            Ok(rows) => Self::Full(rows),
            Err(err) => Self::Placeholder {
                reason: err.to_string(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Full(_) => "full",
            Self::Placeholder { .. } => "placeholder",
        }
    }
}

type Feature = (String, String);

/// Classifier metrics keyed by (rank, metric), averaged over repeated rows.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    pub tools: Vec<String>,
    values: BTreeMap<Feature, HashMap<String, f64>>,
}

impl MetricTable {
    pub fn from_rows(rows: &[MetricRow], sample_id: &str) -> Self {
        let same_sample = rows.iter().any(|row| row.sample == sample_id);
        if !same_sample {
            debug!("no OPAL rows for sample {sample_id}, using all samples");
        }

        let mut tools = Vec::new();
        let mut sums: BTreeMap<Feature, HashMap<String, (f64, usize)>> = BTreeMap::new();
        for row in rows {
            if is_gold_standard(&row.tool) || (same_sample && row.sample != sample_id) {
                continue;
            }
            if !tools.contains(&row.tool) {
                tools.push(row.tool.clone());
            }
            let entry = sums
                .entry((row.rank.clone(), row.metric.clone()))
                .or_default()
                .entry(row.tool.clone())
                .or_default();
            entry.0 += row.value;
            entry.1 += 1;
        }

        let values = sums
            .into_iter()
            .map(|(feature, per_tool)| {
                let means: HashMap<String, f64> = per_tool
                    .into_iter()
                    .map(|(tool, (sum, count))| (tool, sum / count as f64))
                    .collect();
                (feature, means)
            })
            .collect();
        Self { tools, values }
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.values.keys()
    }

    pub fn value(&self, feature: &Feature, tool: &str) -> Option<f64> {
        self.values.get(feature)?.get(tool).copied()
    }

    /// Tool × feature matrix restricted to features every tool reports.
    pub fn matrix(&self) -> (Vec<Vec<f64>>, Vec<Feature>) {
        let features: Vec<Feature> = self
            .values
            .iter()
            .filter(|(_, per_tool)| self.tools.iter().all(|tool| per_tool.contains_key(tool)))
            .map(|(feature, _)| feature.clone())
            .collect();
        let rows = self
            .tools
            .iter()
            .map(|tool| {
                features
                    .iter()
                    .map(|feature| self.value(feature, tool).unwrap_or_default())
                    .collect()
            })
            .collect();
        (rows, features)
    }
}

fn is_gold_standard(tool: &str) -> bool {
    tool.trim().eq_ignore_ascii_case(GOLD_STANDARD_TOOL)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffTaxon {
    pub taxid: u64,
    pub rank: String,
    pub taxname: String,
    pub observed_pct: f64,
    pub expected_pct: f64,
    pub classifier: String,
}

impl DiffTaxon {
    pub fn difference(&self) -> f64 {
        self.observed_pct - self.expected_pct
    }
}

fn abundance_by_taxon(entries: &[ProfileEntry]) -> BTreeMap<(u64, String), (String, f64)> {
    let mut map: BTreeMap<(u64, String), (String, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = map
            .entry((entry.taxid, entry.rank.clone()))
            .or_insert_with(|| (entry.name.clone(), 0.0));
        slot.1 += entry.percentage;
    }
    map
}

/// Taxa whose abundance in `observed` differs from `expected` by at least
/// `threshold` percentage points, largest difference first.
pub fn differential_taxa(
    expected: &[ProfileEntry],
    observed: &[ProfileEntry],
    classifier: &str,
    threshold: f64,
) -> Vec<DiffTaxon> {
    let expected = abundance_by_taxon(expected);
    let observed = abundance_by_taxon(observed);
    let keys: BTreeSet<&(u64, String)> = expected.keys().chain(observed.keys()).collect();

    let mut rows: Vec<DiffTaxon> = keys
        .into_iter()
        .filter_map(|key| {
            let (obs_name, observed_pct) = observed
                .get(key)
                .map_or((None, 0.0), |(name, pct)| (Some(name), *pct));
            let (exp_name, expected_pct) = expected
                .get(key)
                .map_or((None, 0.0), |(name, pct)| (Some(name), *pct));
            if (observed_pct - expected_pct).abs() < threshold {
                return None;
            }
            let taxname = exp_name.or(obs_name).cloned().unwrap_or_default();
            Some(DiffTaxon {
                taxid: key.0,
                rank: key.1.clone(),
                taxname,
                observed_pct,
                expected_pct,
                classifier: classifier.to_string(),
            })
        })
        .collect();
    rows.sort_by(|a, b| b.difference().abs().total_cmp(&a.difference().abs()));
    rows
}

pub fn species_set(entries: &[ProfileEntry]) -> BTreeSet<u64> {
    entries
        .iter()
        .filter(|entry| entry.rank == SPECIES_RANK && entry.percentage > 0.0)
        .map(|entry| entry.taxid)
        .collect()
}

/// Jaccard index of two sets; undefined when both are empty.
pub fn jaccard(a: &BTreeSet<u64>, b: &BTreeSet<u64>) -> Option<f64> {
    let union = a.union(b).count();
    if union == 0 {
        return None;
    }
    Some(a.intersection(b).count() as f64 / union as f64)
}

#[derive(Debug, Clone)]
pub struct CompareSummary {
    pub mode: &'static str,
    pub classifiers: usize,
    pub differential_taxa: usize,
    pub outputs: CompareOutputs,
}

pub fn run_comparison(options: &CompareOptions) -> Result<CompareSummary, TaxbenchError> {
    options.check()?;
    info!(
        sample = %options.sample_id,
        labels = %options.labels.join(","),
        "comparing {} classifiers using OPAL results in {}",
        options.labels.len(),
        options.opal_dir
    );

    let mode = AnalysisMode::probe(&options.opal_dir);
    let outputs = options.outputs();
    let differential_taxa = match &mode {
        AnalysisMode::Placeholder { reason } => {
            warn!("OPAL metrics unavailable ({reason}), writing placeholder reports");
            write_placeholder(options, &outputs)?;
            0
        }
        AnalysisMode::Full(rows) => write_full(options, &outputs, rows)?,
    };

    for path in [&outputs.pca_html, &outputs.diff_taxa_tsv, &outputs.comparison_html] {
        info!("created {path}");
    }
    Ok(CompareSummary {
        mode: mode.name(),
        classifiers: options.labels.len(),
        differential_taxa,
        outputs,
    })
}

fn write_placeholder(options: &CompareOptions, outputs: &CompareOutputs) -> Result<(), TaxbenchError> {
    let sample = html_escape(&options.sample_id);
    let labels = html_escape(&options.labels.join(", "));

    let pca_body = format!(
        "<h1>Classifier Performance PCA - {sample}</h1>\n\
         <p>Classifiers analyzed: {labels}</p>\n\
         <p class=\"note\">OPAL metrics were not available, so no PCA was computed.</p>\n"
    );
    fs_util::write_atomic(
        &outputs.pca_html,
        page(&format!("PCA Analysis - {}", options.sample_id), &pca_body).as_bytes(),
    )?;

    let mut tsv = DIFF_TAXA_COLUMNS.join("\t");
    tsv.push('\n');
    tsv.push_str("# Placeholder: differential abundance analysis\n");
    tsv.push_str("# OPAL metrics were not available for this sample\n");
    fs_util::write_atomic(&outputs.diff_taxa_tsv, tsv.as_bytes())?;

    let comparison_body = format!(
        "<h1>Classifier Comparison Report - {sample}</h1>\n\
         <h2>Classifiers: {labels}</h2>\n\
         <h2>Analysis Components</h2>\n\
         <ul>\n\
         <li><strong>PCA Analysis:</strong> See {pca}</li>\n\
         <li><strong>Differential Taxa:</strong> See {diff}</li>\n\
         </ul>\n\
         <p class=\"note\">Run OPAL first to get metric tables, PCA and differential taxa.</p>\n",
        pca = html_escape(file_name(&outputs.pca_html)),
        diff = html_escape(file_name(&outputs.diff_taxa_tsv)),
    );
    fs_util::write_atomic(
        &outputs.comparison_html,
        page(
            &format!("Classifier Comparison - {}", options.sample_id),
            &comparison_body,
        )
        .as_bytes(),
    )
}

fn write_full(
    options: &CompareOptions,
    outputs: &CompareOutputs,
    rows: &[MetricRow],
) -> Result<usize, TaxbenchError> {
    let table = MetricTable::from_rows(rows, &options.sample_id);
    info!(
        tools = table.tools.len(),
        "loaded {} OPAL metric rows",
        rows.len()
    );

    let pca_body = pca_section(options, &table);
    fs_util::write_atomic(
        &outputs.pca_html,
        page(&format!("PCA Analysis - {}", options.sample_id), &pca_body).as_bytes(),
    )?;

    let mut diff_rows = Vec::new();
    let mut species = Vec::new();
    if options.profiles.is_empty() {
        info!("no classifier profiles given, differential taxa table will be empty");
    } else {
        let gold = bioboxes::read_entries(&options.gold_standard)?;
        for (label, path) in options.labels.iter().zip(&options.profiles) {
            let entries = bioboxes::read_entries(path)?;
            let found = differential_taxa(&gold, &entries, label, options.threshold);
            debug!(classifier = %label, "{} differential taxa", found.len());
            diff_rows.extend(found);
            species.push((label.as_str(), species_set(&entries)));
        }
    }
    fs_util::write_atomic(&outputs.diff_taxa_tsv, &render_diff_tsv(&diff_rows)?)?;

    let comparison_body = comparison_section(options, outputs, &table, &diff_rows, &species);
    fs_util::write_atomic(
        &outputs.comparison_html,
        page(
            &format!("Classifier Comparison - {}", options.sample_id),
            &comparison_body,
        )
        .as_bytes(),
    )?;
    Ok(diff_rows.len())
}

pub fn render_diff_tsv(rows: &[DiffTaxon]) -> Result<Vec<u8>, TaxbenchError> {
    let tsv_error = |err: csv::Error| TaxbenchError::Analysis(err.to_string());
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(Vec::new());
    writer.write_record(DIFF_TAXA_COLUMNS).map_err(tsv_error)?;
    for row in rows {
        writer
            .write_record([
                row.taxid.to_string(),
                row.rank.clone(),
                row.taxname.clone(),
                format!("{:.6}", row.observed_pct),
                format!("{:.6}", row.expected_pct),
                "NA".to_string(),
                row.classifier.clone(),
            ])
            .map_err(tsv_error)?;
    }
    writer
        .into_inner()
        .map_err(|err| TaxbenchError::Analysis(err.to_string()))
}

fn pca_section(options: &CompareOptions, table: &MetricTable) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<h1>Classifier Performance PCA - {}</h1>",
        html_escape(&options.sample_id)
    );
    let _ = writeln!(
        body,
        "<p>Classifiers analyzed: {}</p>",
        html_escape(&table.tools.join(", "))
    );

    if table.tools.len() < 2 {
        let _ = writeln!(
            body,
            "<p class=\"note\">PCA needs at least two classifiers; the OPAL results list {}.</p>",
            table.tools.len()
        );
        return body;
    }

    let (matrix, features) = table.matrix();
    let result = match pca::pca(&matrix, 2) {
        Ok(result) => result,
        Err(err) => {
            warn!("PCA not computed: {err}");
            let _ = writeln!(
                body,
                "<p class=\"note\">PCA could not be computed: {}</p>",
                html_escape(&err.to_string())
            );
            return body;
        }
    };
    info!(
        features = result.kept_features.len(),
        "PCA over {} classifiers",
        table.tools.len()
    );

    let _ = writeln!(
        body,
        "<p>{} of {} shared metrics vary between classifiers and were z-scored.</p>",
        result.kept_features.len(),
        features.len()
    );
    body.push_str(&scatter_svg(&table.tools, &result));

    body.push_str("<h2>Scores</h2>\n<table>\n<tr><th>Classifier</th>");
    for (axis, share) in result.proportion_explained.iter().enumerate() {
        let _ = write!(body, "<th>PC{} ({:.1}%)</th>", axis + 1, share * 100.0);
    }
    body.push_str("</tr>\n");
    for (tool, coords) in table.tools.iter().zip(&result.coordinates) {
        let _ = write!(body, "<tr><td>{}</td>", html_escape(tool));
        for value in coords {
            let _ = write!(body, "<td>{value:.4}</td>");
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");
    body
}

fn scatter_svg(labels: &[String], result: &PcaResult) -> String {
    const WIDTH: f64 = 640.0;
    const HEIGHT: f64 = 420.0;
    const MARGIN: f64 = 60.0;

    let xs: Vec<f64> = result.coordinates.iter().map(|c| c[0]).collect();
    let ys: Vec<f64> = result
        .coordinates
        .iter()
        .map(|c| c.get(1).copied().unwrap_or_default())
        .collect();
    let bounds = |values: &[f64]| {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let pad = ((max - min) * 0.1).max(0.5);
        (min - pad, max + pad)
    };
    let (x_min, x_max) = bounds(&xs);
    let (y_min, y_max) = bounds(&ys);
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let to_x = |x: f64| MARGIN + (x - x_min) / (x_max - x_min) * plot_w;
    let to_y = |y: f64| HEIGHT - MARGIN - (y - y_min) / (y_max - y_min) * plot_h;

    let axis_label = |axis: usize| match result.proportion_explained.get(axis) {
        Some(share) => format!("PC{} ({:.1}% variance)", axis + 1, share * 100.0),
        None => format!("PC{} (not available)", axis + 1),
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">"
    );
    let _ = writeln!(
        svg,
        "<rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_w}\" height=\"{plot_h}\" fill=\"#fafafa\" stroke=\"#bdc3c7\"/>"
    );
    let _ = writeln!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>",
        WIDTH / 2.0,
        HEIGHT - MARGIN / 3.0,
        axis_label(0)
    );
    let _ = writeln!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" transform=\"rotate(-90 {:.1} {:.1})\">{}</text>",
        MARGIN / 3.0,
        HEIGHT / 2.0,
        MARGIN / 3.0,
        HEIGHT / 2.0,
        axis_label(1)
    );
    for ((label, x), y) in labels.iter().zip(&xs).zip(&ys) {
        let (cx, cy) = (to_x(*x), to_y(*y));
        let _ = writeln!(
            svg,
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"6\" fill=\"#3498db\"><title>{}</title></circle>",
            html_escape(label)
        );
        let _ = writeln!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\">{}</text>",
            cx + 9.0,
            cy + 4.0,
            html_escape(label)
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn comparison_section(
    options: &CompareOptions,
    outputs: &CompareOutputs,
    table: &MetricTable,
    diff_rows: &[DiffTaxon],
    species: &[(&str, BTreeSet<u64>)],
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<h1>Classifier Comparison Report - {}</h1>",
        html_escape(&options.sample_id)
    );
    let _ = writeln!(
        body,
        "<div class=\"metadata\">\n<div><span class=\"label\">Classifiers:</span> {}</div>\n\
         <div><span class=\"label\">OPAL results:</span> {}</div>\n\
         <div><span class=\"label\">Generated:</span> {}</div>\n</div>",
        html_escape(&options.labels.join(", ")),
        html_escape(options.opal_dir.as_str()),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(
        body,
        "<ul>\n<li><strong>PCA Analysis:</strong> <a href=\"{0}\">{0}</a></li>\n\
         <li><strong>Differential Taxa:</strong> <a href=\"{1}\">{1}</a></li>\n</ul>",
        html_escape(file_name(&outputs.pca_html)),
        html_escape(file_name(&outputs.diff_taxa_tsv))
    );

    body.push_str("<h2>Metrics by rank</h2>\n<table>\n<tr><th>Rank</th><th>Metric</th>");
    for tool in &table.tools {
        let _ = write!(body, "<th>{}</th>", html_escape(tool));
    }
    body.push_str("</tr>\n");
    for feature in table.features() {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td>",
            html_escape(&feature.0),
            html_escape(&feature.1)
        );
        for tool in &table.tools {
            match table.value(feature, tool) {
                Some(value) => {
                    let _ = write!(body, "<td>{value:.4}</td>");
                }
                None => body.push_str("<td>NA</td>"),
            }
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");

    if !species.is_empty() {
        body.push_str("<h2>Classifier agreement (Jaccard index of detected species)</h2>\n<table>\n<tr><th></th>");
        for (label, _) in species {
            let _ = write!(body, "<th>{}</th>", html_escape(label));
        }
        body.push_str("</tr>\n");
        for (label, set) in species {
            let _ = write!(body, "<tr><th>{}</th>", html_escape(label));
            for (_, other) in species {
                match jaccard(set, other) {
                    Some(value) => {
                        let _ = write!(body, "<td>{value:.3}</td>");
                    }
                    None => body.push_str("<td>NA</td>"),
                }
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</table>\n");

        body.push_str("<h2>Differential taxa</h2>\n<table>\n<tr><th>Classifier</th><th>Taxa</th></tr>\n");
        for (label, _) in species {
            let count = diff_rows.iter().filter(|row| row.classifier == *label).count();
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{count}</td></tr>",
                html_escape(label)
            );
        }
        body.push_str("</table>\n");
        let _ = writeln!(
            body,
            "<p class=\"note\">Taxa differing from the gold standard by at least {} percentage points. \
             p-values are not computed for a single sample.</p>",
            options.threshold
        );
    }
    body
}

fn file_name(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or(path.as_str())
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
    line-height: 1.6;
    color: #333;
    max-width: 1200px;
    margin: 0 auto;
    padding: 20px;
    background-color: #f5f5f5;
}
.container {
    background-color: white;
    border-radius: 8px;
    padding: 30px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}
h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
h2 { color: #34495e; border-left: 4px solid #3498db; padding-left: 10px; }
.metadata { background-color: #ecf0f1; border-radius: 4px; padding: 15px; }
.label { font-weight: bold; color: #7f8c8d; }
.note { color: #7f8c8d; font-style: italic; }
table { border-collapse: collapse; margin: 15px 0; }
th, td { border: 1px solid #ddd; padding: 6px 10px; text-align: left; }
th { background-color: #3498db; color: white; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n{body}</div>\n</body>\n</html>\n",
        html_escape(title)
    )
}
