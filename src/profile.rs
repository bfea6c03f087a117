use std::fmt::Write as _;

use camino::Utf8Path;
use tracing::info;

use crate::domain::{Rank, TaxonRecord};
use crate::error::TaxbenchError;
use crate::fs_util;

pub const DEFAULT_BIOBOXES_VERSION: &str = "0.9.1";
pub const DEFAULT_TAXONOMY_DB: &str = "NCBI";
pub const REQUIRED_COLUMNS: [&str; 5] = ["TAXID", "RANK", "TAXPATH", "TAXPATHSN", "PERCENTAGE"];

const RENORMALIZE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHeader {
    pub sample_id: String,
    pub version: String,
    pub ranks: Vec<Rank>,
    pub taxonomy_db: String,
}

impl ProfileHeader {
    pub fn new(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            version: DEFAULT_BIOBOXES_VERSION.to_string(),
            ranks: Rank::ALL.to_vec(),
            taxonomy_db: DEFAULT_TAXONOMY_DB.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileDocument {
    pub header: ProfileHeader,
    pub records: Vec<TaxonRecord>,
}

impl ProfileDocument {
    pub fn new(header: ProfileHeader, records: Vec<TaxonRecord>) -> Self {
        Self { header, records }
    }

    pub fn total_percentage(&self) -> f64 {
        self.records.iter().map(|record| record.percentage).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let header = &self.header;
        let _ = writeln!(out, "@SampleID:{}", header.sample_id);
        let _ = writeln!(out, "@Version:{}", header.version);
        let _ = writeln!(out, "@Ranks:{}", Rank::join(&header.ranks));
        let _ = writeln!(out, "@TaxonomyID:{}", header.taxonomy_db);
        let _ = writeln!(out, "@@{}", REQUIRED_COLUMNS.join("\t"));
        for record in &self.records {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{:.6}",
                record.taxid, record.rank, record.taxpath, record.taxpathsn, record.percentage
            );
        }
        out
    }

    pub fn write(&self, path: &Utf8Path) -> Result<(), TaxbenchError> {
        info!("writing Bioboxes profile {path} ({} records)", self.records.len());
        fs_util::write_atomic(path, self.render().as_bytes())
    }
}

/// Rescales percentages so they sum to 100. Returns the sum before
/// rescaling when a rescale happened.
pub fn renormalize(records: &mut [TaxonRecord]) -> Option<f64> {
    let total: f64 = records.iter().map(|record| record.percentage).sum();
    if total <= 0.0 || (total - 100.0).abs() <= RENORMALIZE_TOLERANCE {
        return None;
    }
    info!("renormalizing percentages (current sum: {total:.2}%)");
    for record in records.iter_mut() {
        record.percentage = record.percentage / total * 100.0;
    }
    Some(total)
}
