use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Rank, TaxId, TaxonRecord};
use crate::error::TaxbenchError;
use crate::fs_util;
use crate::profile::{ProfileDocument, ProfileHeader, renormalize};
use crate::taxonomy::TaxonomyLookup;

pub const DEFAULT_GOLD_SAMPLE_ID: &str = "gold_standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldLayout {
    /// The header has no TAXPATH column; fields are located by name.
    MissingTaxpathColumn {
        taxid: usize,
        rank: usize,
        taxpathsn: usize,
        percentage: usize,
    },
    /// The header lists TAXPATH but data rows omit it.
    TaxpathOmittedInRows,
    AlreadyValid,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixSummary {
    pub layout: GoldLayout,
    pub rows_read: usize,
    pub skipped_unparsable: usize,
    pub skipped_by_rank: usize,
    pub replaced_names: usize,
    pub records_written: usize,
    pub renormalized_from: Option<f64>,
}

#[derive(Debug, Clone)]
struct GoldInput {
    columns: Vec<String>,
    rows: Vec<String>,
}

fn read_gold(text: &str) -> Result<GoldInput, TaxbenchError> {
    let mut columns = None;
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix("@@") {
            columns = Some(header.split('\t').map(|c| c.trim().to_string()).collect());
        } else if line.starts_with('#') || line.starts_with('@') {
            continue;
        } else {
            rows.push(line.to_string());
        }
    }
    let columns = columns
        .ok_or_else(|| TaxbenchError::GoldStandard("no column header found".to_string()))?;
    Ok(GoldInput { columns, rows })
}

fn detect_layout(input: &GoldInput) -> Result<GoldLayout, TaxbenchError> {
    let find = |name: &str| {
        input
            .columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TaxbenchError::GoldStandard(format!("column {name} missing from header")))
    };
    if !input.columns.iter().any(|column| column == "TAXPATH") {
        return Ok(GoldLayout::MissingTaxpathColumn {
            taxid: find("TAXID")?,
            rank: find("RANK")?,
            taxpathsn: find("TAXPATHSN")?,
            percentage: find("PERCENTAGE")?,
        });
    }
    let first_row_len = input
        .rows
        .first()
        .map_or(0, |row| row.split('\t').count());
    if input.columns.len() != first_row_len {
        return Ok(GoldLayout::TaxpathOmittedInRows);
    }
    Ok(GoldLayout::AlreadyValid)
}

/// Rewrites a gold-standard profile so every row carries a TAXPATH.
pub fn fix_gold_standard(
    input: &Utf8Path,
    output: &Utf8Path,
    sample_id: &str,
    taxonomy: &TaxonomyLookup,
) -> Result<FixSummary, TaxbenchError> {
    info!("reading gold standard {input}");
    let text = fs_util::read_text(input)?;
    let gold = read_gold(&text)?;
    debug!(columns = ?gold.columns, rows = gold.rows.len(), "parsed gold standard");

    let layout = detect_layout(&gold)?;
    if layout == GoldLayout::AlreadyValid {
        info!("TAXPATH column already present and rows match the header, copying unchanged");
        fs_util::write_atomic(output, text.as_bytes())?;
        return Ok(FixSummary {
            layout,
            rows_read: gold.rows.len(),
            skipped_unparsable: 0,
            skipped_by_rank: 0,
            replaced_names: 0,
            records_written: gold.rows.len(),
            renormalized_from: None,
        });
    }

    let (taxid_idx, rank_idx, taxpathsn_idx, percentage_idx) = match layout {
        GoldLayout::MissingTaxpathColumn {
            taxid,
            rank,
            taxpathsn,
            percentage,
        } => (taxid, rank, taxpathsn, percentage),
        _ => (0, 1, 2, 3),
    };
    info!(?layout, "processing {} entries", gold.rows.len());

    let mut summary = FixSummary {
        layout,
        rows_read: gold.rows.len(),
        skipped_unparsable: 0,
        skipped_by_rank: 0,
        replaced_names: 0,
        records_written: 0,
        renormalized_from: None,
    };
    let mut records = Vec::new();
    for row in &gold.rows {
        let fields: Vec<&str> = row.split('\t').map(str::trim).collect();
        let field = |idx: usize| fields.get(idx).copied().unwrap_or_default();

        let taxid = field(taxid_idx).parse::<TaxId>();
        let percentage = field(percentage_idx)
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite());
        let (Ok(taxid), Some(percentage)) = (taxid, percentage) else {
            warn!("unparsable gold standard row, skipping: {row}");
            summary.skipped_unparsable += 1;
            continue;
        };

        let Some(rank) = Rank::normalize(field(rank_idx)) else {
            summary.skipped_by_rank += 1;
            continue;
        };

        let info = taxonomy.lookup(taxid);
        let taxpath = info.lineage.taxpath();
        let supplied_names = field(taxpathsn_idx);
        let taxpathsn = if supplied_names.split('|').count() == info.lineage.len() {
            supplied_names.to_string()
        } else if info.resolved {
            debug!(%taxid, "replacing TAXPATHSN with lineage names");
            summary.replaced_names += 1;
            info.lineage.taxpathsn()
        } else {
            // Unresolved lineage is just the taxid, so keep only the leaf name.
            supplied_names
                .rsplit('|')
                .map(str::trim)
                .find(|name| !name.is_empty())
                .map_or_else(|| info.lineage.taxpathsn(), str::to_string)
        };

        records.push(TaxonRecord {
            taxid,
            rank,
            taxpath,
            taxpathsn,
            percentage,
        });
    }

    if summary.skipped_by_rank > 0 {
        info!(
            "skipped {} entries with unsupported ranks (root, no rank, etc.)",
            summary.skipped_by_rank
        );
    }
    summary.renormalized_from = renormalize(&mut records);
    summary.records_written = records.len();

    let document = ProfileDocument::new(ProfileHeader::new(sample_id), records);
    document.write(output)?;
    info!("fixed {} entries, output written to {output}", summary.records_written);
    Ok(summary)
}
