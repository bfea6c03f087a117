use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxbenchError {
    #[error("input file does not exist: {0}")]
    InputNotFound(Utf8PathBuf),

    #[error("failed to read {path}: {message}")]
    InputRead { path: Utf8PathBuf, message: String },

    #[error("input format error: {0}")]
    InputFormat(String),

    #[error("invalid taxonomy id: {0}")]
    InvalidTaxId(String),

    #[error("invalid rank: {0}")]
    InvalidRank(String),

    #[error("taxonomy database unavailable: {0}")]
    TaxonomyUnavailable(String),

    #[error("taxon {0} not found in taxonomy database")]
    TaxonNotFound(u64),

    #[error("broken lineage for taxon {taxid}: {message}")]
    BrokenLineage { taxid: u64, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("gold standard cannot be fixed: {0}")]
    GoldStandard(String),

    #[error("unknown profiler '{name}' (supported: {supported})")]
    UnknownProfiler { name: String, supported: String },

    #[error("invalid OPAL results: {0}")]
    OpalResults(String),

    #[error("analysis failed: {0}")]
    Analysis(String),
}
