use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Rank, TaxId, TaxonRecord};
use crate::error::TaxbenchError;
use crate::profile::{
    DEFAULT_BIOBOXES_VERSION, DEFAULT_TAXONOMY_DB, ProfileDocument, ProfileHeader, renormalize,
};
use crate::taxonomy::TaxonomyLookup;
use crate::taxpasta::{StandardizedTable, parse_count};

#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub sample_id: String,
    pub ranks: Vec<Rank>,
    pub taxonomy_db: String,
    pub version: String,
}

impl ConversionOptions {
    pub fn new(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            ranks: Rank::ALL.to_vec(),
            taxonomy_db: DEFAULT_TAXONOMY_DB.to_string(),
            version: DEFAULT_BIOBOXES_VERSION.to_string(),
        }
    }

    fn header(&self) -> ProfileHeader {
        ProfileHeader {
            sample_id: self.sample_id.clone(),
            version: self.version.clone(),
            ranks: self.ranks.clone(),
            taxonomy_db: self.taxonomy_db.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionSummary {
    pub rows_read: usize,
    pub dropped_missing_id: usize,
    pub dropped_invalid_id: usize,
    pub dropped_invalid_count: usize,
    pub merged_duplicates: usize,
    pub skipped_by_rank: usize,
    pub skipped_ranks: BTreeSet<String>,
    pub records_written: usize,
    pub renormalized_from: Option<f64>,
}

impl ConversionSummary {
    pub fn dropped_rows(&self) -> usize {
        self.dropped_missing_id + self.dropped_invalid_id + self.dropped_invalid_count
    }
}

pub fn convert_file(
    input: &Utf8Path,
    output: &Utf8Path,
    options: &ConversionOptions,
    taxonomy: &TaxonomyLookup,
) -> Result<ConversionSummary, TaxbenchError> {
    info!("reading taxpasta file {input}");
    let table = StandardizedTable::read(input)?;
    let (document, summary) = build_profile(&table, options, taxonomy)?;
    document.write(output)?;
    info!(
        records = summary.records_written,
        dropped = summary.dropped_rows(),
        skipped_by_rank = summary.skipped_by_rank,
        "converted {input} to {output}"
    );
    Ok(summary)
}

pub fn build_profile(
    table: &StandardizedTable,
    options: &ConversionOptions,
    taxonomy: &TaxonomyLookup,
) -> Result<(ProfileDocument, ConversionSummary), TaxbenchError> {
    table.require_columns()?;

    let mut summary = ConversionSummary {
        rows_read: table.rows.len(),
        ..Default::default()
    };

    let mut counts: Vec<(TaxId, f64)> = Vec::new();
    let mut positions: HashMap<TaxId, usize> = HashMap::new();
    for row in &table.rows {
        let Some(raw_id) = row.taxonomy_id.as_deref() else {
            debug!(line = row.line, "missing taxonomy_id, skipping");
            summary.dropped_missing_id += 1;
            continue;
        };
        let Ok(taxid) = raw_id.parse::<TaxId>() else {
            warn!(line = row.line, "invalid taxonomy_id: {raw_id}, skipping");
            summary.dropped_invalid_id += 1;
            continue;
        };
        let Some(count) = row
            .count
            .as_deref()
            .and_then(parse_count)
            .filter(|count| *count > 0.0)
        else {
            debug!(line = row.line, %taxid, "missing or non-positive count, skipping");
            summary.dropped_invalid_count += 1;
            continue;
        };
        match positions.get(&taxid) {
            Some(&idx) => {
                counts[idx].1 += count;
                summary.merged_duplicates += 1;
            }
            None => {
                positions.insert(taxid, counts.len());
                counts.push((taxid, count));
            }
        }
    }

    if summary.dropped_rows() > 0 {
        warn!(
            missing_id = summary.dropped_missing_id,
            invalid_id = summary.dropped_invalid_id,
            invalid_count = summary.dropped_invalid_count,
            "skipped {} invalid rows",
            summary.dropped_rows()
        );
    }
    if summary.merged_duplicates > 0 {
        warn!(
            "merged {} repeated taxonomy_id rows by summing their counts",
            summary.merged_duplicates
        );
    }
    if counts.is_empty() {
        return Err(TaxbenchError::InputFormat(
            "no valid rows (each row needs a positive integer taxonomy_id and a positive count)"
                .to_string(),
        ));
    }

    let total: f64 = counts.iter().map(|(_, count)| count).sum();
    let mut records = Vec::with_capacity(counts.len());
    for (taxid, count) in counts {
        let percentage = if total > 0.0 { count / total * 100.0 } else { 0.0 };
        let info = taxonomy.lookup(taxid);
        let rank = Rank::normalize(&info.rank).filter(|rank| options.ranks.contains(rank));
        let Some(rank) = rank else {
            summary.skipped_by_rank += 1;
            summary.skipped_ranks.insert(info.rank);
            continue;
        };
        records.push(TaxonRecord::from_lineage(taxid, rank, &info.lineage, percentage));
    }

    if !summary.skipped_ranks.is_empty() {
        info!(
            "skipped {} unsupported ranks: {}",
            summary.skipped_ranks.len(),
            summary
                .skipped_ranks
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if records.is_empty() {
        if taxonomy.is_offline() {
            warn!("no taxa with a supported rank; taxonomy lookups are disabled so every rank is unknown");
        } else {
            warn!("no taxa with a supported rank; the profile will have no data rows");
        }
    }

    summary.renormalized_from = renormalize(&mut records);
    summary.records_written = records.len();
    Ok((ProfileDocument::new(options.header(), records), summary))
}
