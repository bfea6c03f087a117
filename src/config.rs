use std::fs;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::compare::DEFAULT_DIFF_THRESHOLD;
use crate::domain::Rank;
use crate::error::TaxbenchError;
use crate::profile::{DEFAULT_BIOBOXES_VERSION, DEFAULT_TAXONOMY_DB};

pub const CONFIG_FILE_NAME: &str = "taxbench.json";
pub const TAXDUMP_ENV: &str = "TAXBENCH_TAXDUMP";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub taxdump_dir: Option<String>,
    #[serde(default)]
    pub taxonomy_db: Option<String>,
    #[serde(default)]
    pub bioboxes_version: Option<String>,
    #[serde(default)]
    pub ranks: Option<String>,
    #[serde(default)]
    pub diff_threshold: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub taxdump_dir: Option<Utf8PathBuf>,
    pub taxonomy_db: String,
    pub bioboxes_version: String,
    pub ranks: Vec<Rank>,
    pub diff_threshold: f64,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TaxbenchError> {
        let config_path = Utf8PathBuf::from(path.unwrap_or(CONFIG_FILE_NAME));
        let env_taxdump = std::env::var(TAXDUMP_ENV).ok();

        if path.is_none() && !config_path.as_std_path().exists() {
            return Self::resolve_config(Config::default(), env_taxdump);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| TaxbenchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| TaxbenchError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config, env_taxdump)
    }

    pub fn resolve_config(
        config: Config,
        env_taxdump: Option<String>,
    ) -> Result<ResolvedConfig, TaxbenchError> {
        let ranks = match config.ranks.as_deref() {
            Some(value) => Rank::parse_list(value)?,
            None => Rank::ALL.to_vec(),
        };
        let diff_threshold = config.diff_threshold.unwrap_or(DEFAULT_DIFF_THRESHOLD);
        if !diff_threshold.is_finite() || diff_threshold < 0.0 {
            return Err(TaxbenchError::ConfigParse(format!(
                "diff_threshold must be a non-negative number, got {diff_threshold}"
            )));
        }

        let taxdump_dir = env_taxdump
            .filter(|value| !value.trim().is_empty())
            .or(config.taxdump_dir)
            .map(Utf8PathBuf::from)
            .or_else(default_taxdump_dir);

        Ok(ResolvedConfig {
            taxdump_dir,
            taxonomy_db: config
                .taxonomy_db
                .unwrap_or_else(|| DEFAULT_TAXONOMY_DB.to_string()),
            bioboxes_version: config
                .bioboxes_version
                .unwrap_or_else(|| DEFAULT_BIOBOXES_VERSION.to_string()),
            ranks,
            diff_threshold,
        })
    }
}

pub fn default_taxdump_dir() -> Option<Utf8PathBuf> {
    BaseDirs::new().and_then(|dirs| {
        Utf8PathBuf::from_path_buf(
            dirs.home_dir()
                .join(".cache")
                .join("taxbencher")
                .join("taxdump"),
        )
        .ok()
    })
}
