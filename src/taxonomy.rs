use std::collections::HashMap;
use std::io::BufRead;

use camino::Utf8Path;
use tracing::{debug, info, warn};

use crate::domain::{Lineage, TaxId, UNKNOWN_RANK, placeholder_name};
use crate::error::TaxbenchError;
use crate::fs_util;

const MAX_LINEAGE_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyInfo {
    pub rank: String,
    pub lineage: Lineage,
    pub resolved: bool,
}

impl TaxonomyInfo {
    pub fn degraded(taxid: TaxId) -> Self {
        Self {
            rank: UNKNOWN_RANK.to_string(),
            lineage: Lineage::single(taxid),
            resolved: false,
        }
    }
}

pub trait TaxonomyBackend {
    fn name(&self) -> &str;
    fn lookup(&self, taxid: TaxId) -> Result<TaxonomyInfo, TaxbenchError>;
}

#[derive(Debug, Default)]
pub struct NcbiTaxdump {
    nodes: HashMap<u64, (u64, String)>,
    names: HashMap<u64, String>,
}

impl NcbiTaxdump {
    pub fn load(dir: &Utf8Path) -> Result<Self, TaxbenchError> {
        let nodes_path = dir.join("nodes.dmp");
        let names_path = dir.join("names.dmp");
        for path in [&nodes_path, &names_path] {
            if !path.as_std_path().is_file() {
                return Err(TaxbenchError::TaxonomyUnavailable(format!("{path} not found")));
            }
        }
        let taxdump = Self::from_readers(
            fs_util::open_text(&nodes_path)?,
            fs_util::open_text(&names_path)?,
        )?;
        info!(
            nodes = taxdump.nodes.len(),
            names = taxdump.names.len(),
            "loaded NCBI taxdump from {dir}"
        );
        Ok(taxdump)
    }

    pub fn from_readers(nodes: impl BufRead, names: impl BufRead) -> Result<Self, TaxbenchError> {
        let mut taxdump = Self::default();

        for line in nodes.lines() {
            let line = line.map_err(|err| TaxbenchError::TaxonomyUnavailable(err.to_string()))?;
            let parts: Vec<&str> = line.split("\t|\t").collect();
            if parts.len() < 3 {
                continue;
            }
            if let (Ok(taxid), Ok(parent)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
                let rank = parts[2].trim_end_matches("\t|").trim().to_string();
                taxdump.nodes.insert(taxid, (parent, rank));
            }
        }

        for line in names.lines() {
            let line = line.map_err(|err| TaxbenchError::TaxonomyUnavailable(err.to_string()))?;
            let parts: Vec<&str> = line.split("\t|\t").collect();
            if parts.len() >= 4 && parts[3].trim_end_matches("\t|").trim() == "scientific name" {
                if let Ok(taxid) = parts[0].trim().parse::<u64>() {
                    taxdump.names.insert(taxid, parts[1].trim().to_string());
                }
            }
        }

        if taxdump.nodes.is_empty() {
            return Err(TaxbenchError::TaxonomyUnavailable(
                "nodes.dmp contains no taxa".to_string(),
            ));
        }
        Ok(taxdump)
    }

    fn name_of(&self, taxid: TaxId) -> String {
        self.names
            .get(&taxid.get())
            .cloned()
            .unwrap_or_else(|| placeholder_name(taxid))
    }
}

impl TaxonomyBackend for NcbiTaxdump {
    fn name(&self) -> &str {
        "NCBI taxdump"
    }

    fn lookup(&self, taxid: TaxId) -> Result<TaxonomyInfo, TaxbenchError> {
        let (_, rank) = self
            .nodes
            .get(&taxid.get())
            .ok_or(TaxbenchError::TaxonNotFound(taxid.get()))?;

        let mut chain = Vec::new();
        let mut current = taxid.get();
        loop {
            let (parent, _) =
                self.nodes
                    .get(&current)
                    .ok_or_else(|| TaxbenchError::BrokenLineage {
                        taxid: taxid.get(),
                        message: format!("ancestor {current} missing from nodes.dmp"),
                    })?;
            chain.push(TaxId::new(current)?);
            if *parent == current || *parent == 0 {
                break;
            }
            if chain.len() >= MAX_LINEAGE_DEPTH {
                return Err(TaxbenchError::BrokenLineage {
                    taxid: taxid.get(),
                    message: "parent chain does not reach the root".to_string(),
                });
            }
            current = *parent;
        }
        chain.reverse();

        let names = chain.iter().map(|id| self.name_of(*id)).collect();
        Ok(TaxonomyInfo {
            rank: rank.clone(),
            lineage: Lineage::new(chain, names)?,
            resolved: true,
        })
    }
}

/// Taxonomy access for the converter and the gold-standard fixer. Lookups
/// never fail: without a backend, or when the backend errors, the taxon is
/// reported with an unknown rank and itself as its only ancestor.
pub struct TaxonomyLookup {
    backend: Option<Box<dyn TaxonomyBackend>>,
}

impl TaxonomyLookup {
    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: impl TaxonomyBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    pub fn resolve(taxdump_dir: Option<&Utf8Path>) -> Self {
        let Some(dir) = taxdump_dir else {
            info!("taxonomy lookups disabled, taxa keep an unknown rank");
            return Self::offline();
        };
        match NcbiTaxdump::load(dir) {
            Ok(taxdump) => Self::with_backend(taxdump),
            Err(err) => {
                warn!("{err}; continuing without taxonomy lookups");
                Self::offline()
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }

    pub fn lookup(&self, taxid: TaxId) -> TaxonomyInfo {
        let Some(backend) = &self.backend else {
            return TaxonomyInfo::degraded(taxid);
        };
        match backend.lookup(taxid) {
            Ok(info) => {
                debug!(%taxid, rank = %info.rank, depth = info.lineage.len(), "resolved taxon");
                info
            }
            Err(err) => {
                warn!("{} lookup failed for taxid {taxid}: {err}", backend.name());
                TaxonomyInfo::degraded(taxid)
            }
        }
    }
}
