use std::fmt;
use std::str::FromStr;

use crate::error::TaxbenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaxId(u64);

impl TaxId {
    pub fn new(value: u64) -> Result<Self, TaxbenchError> {
        if value == 0 {
            return Err(TaxbenchError::InvalidTaxId(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = TaxbenchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = trimmed
            .parse::<u64>()
            .map_err(|_| TaxbenchError::InvalidTaxId(value.to_string()))?;
        Self::new(parsed).map_err(|_| TaxbenchError::InvalidTaxId(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Superkingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Strain,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::Superkingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
        Rank::Strain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Superkingdom => "superkingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
            Rank::Strain => "strain",
        }
    }

    /// Resolves a rank name as reported by a taxonomy database, applying the
    /// rank mapping table. Returns `None` for ranks outside the canonical set.
    pub fn normalize(raw: &str) -> Option<Rank> {
        let raw = raw.trim();
        if let Ok(rank) = raw.parse::<Rank>() {
            return Some(rank);
        }
        RANK_MAPPING
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, rank)| *rank)
    }

    /// Parses a rank list given as `a|b|c` or `a,b,c`.
    pub fn parse_list(value: &str) -> Result<Vec<Rank>, TaxbenchError> {
        let separator = if value.contains('|') { '|' } else { ',' };
        let mut ranks = Vec::new();
        for token in value.split(separator) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let rank = token.parse::<Rank>()?;
            if !ranks.contains(&rank) {
                ranks.push(rank);
            }
        }
        if ranks.is_empty() {
            return Err(TaxbenchError::InvalidRank(value.to_string()));
        }
        Ok(ranks)
    }

    pub fn join(ranks: &[Rank]) -> String {
        ranks
            .iter()
            .map(|rank| rank.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = TaxbenchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str() == value.trim())
            .ok_or_else(|| TaxbenchError::InvalidRank(value.to_string()))
    }
}

/// Non-canonical rank names and the canonical rank they are reported as.
pub const RANK_MAPPING: [(&str, Rank); 3] = [
    ("subspecies", Rank::Strain),
    ("domain", Rank::Superkingdom),
    ("kingdom", Rank::Superkingdom),
];

/// Rank names accepted in a Bioboxes `@Ranks` header besides `no_rank*`.
pub fn is_recognized_header_rank(name: &str) -> bool {
    name.parse::<Rank>().is_ok() || name == "kingdom"
}

pub const UNKNOWN_RANK: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    ids: Vec<TaxId>,
    names: Vec<String>,
}

impl Lineage {
    pub fn new(ids: Vec<TaxId>, names: Vec<String>) -> Result<Self, TaxbenchError> {
        if ids.is_empty() || ids.len() != names.len() {
            return Err(TaxbenchError::InputFormat(format!(
                "lineage with {} ids and {} names",
                ids.len(),
                names.len()
            )));
        }
        Ok(Self { ids, names })
    }

    pub fn single(taxid: TaxId) -> Self {
        Self {
            ids: vec![taxid],
            names: vec![placeholder_name(taxid)],
        }
    }

    pub fn ids(&self) -> &[TaxId] {
        &self.ids
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn leaf(&self) -> TaxId {
        self.ids[self.ids.len() - 1]
    }

    pub fn taxpath(&self) -> String {
        self.ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn taxpathsn(&self) -> String {
        self.names.join("|")
    }
}

pub fn placeholder_name(taxid: TaxId) -> String {
    format!("taxid_{taxid}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonRecord {
    pub taxid: TaxId,
    pub rank: Rank,
    pub taxpath: String,
    pub taxpathsn: String,
    pub percentage: f64,
}

impl TaxonRecord {
    pub fn from_lineage(taxid: TaxId, rank: Rank, lineage: &Lineage, percentage: f64) -> Self {
        debug_assert_eq!(lineage.leaf(), taxid, "lineage must end with the looked-up taxon");
        Self {
            taxid,
            rank,
            taxpath: lineage.taxpath(),
            taxpathsn: lineage.taxpathsn(),
            percentage,
        }
    }
}
