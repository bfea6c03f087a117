#![allow(dead_code)]

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use taxbench_tools::domain::{Lineage, TaxId};
use taxbench_tools::error::TaxbenchError;
use taxbench_tools::taxonomy::{TaxonomyBackend, TaxonomyInfo, TaxonomyLookup};

const TAXA: &[(u64, &str, &str, &str)] = &[
    (2, "superkingdom", "2", "Bacteria"),
    (
        1236,
        "class",
        "2|1224|1236",
        "Bacteria|Proteobacteria|Gammaproteobacteria",
    ),
    (
        561,
        "genus",
        "2|1224|1236|91347|543|561",
        "Bacteria|Proteobacteria|Gammaproteobacteria|Enterobacterales|Enterobacteriaceae|Escherichia",
    ),
    (
        562,
        "species",
        "2|1224|1236|91347|543|561|562",
        "Bacteria|Proteobacteria|Gammaproteobacteria|Enterobacterales|Enterobacteriaceae|Escherichia|Escherichia coli",
    ),
    (
        1280,
        "species",
        "2|1239|91061|1385|90964|1279|1280",
        "Bacteria|Bacillota|Bacilli|Bacillales|Staphylococcaceae|Staphylococcus|Staphylococcus aureus",
    ),
    (
        1282,
        "species",
        "2|1239|91061|1385|90964|1279|1282",
        "Bacteria|Bacillota|Bacilli|Bacillales|Staphylococcaceae|Staphylococcus|Staphylococcus epidermidis",
    ),
    (
        46170,
        "subspecies",
        "2|1239|91061|1385|90964|1279|1280|46170",
        "Bacteria|Bacillota|Bacilli|Bacillales|Staphylococcaceae|Staphylococcus|Staphylococcus aureus|Staphylococcus aureus subsp. aureus",
    ),
    (131567, "no rank", "131567", "cellular organisms"),
    (
        2759,
        "superkingdom",
        "131567|2759",
        "cellular organisms|Eukaryota",
    ),
];

#[derive(Default)]
pub struct MockTaxonomy;

impl TaxonomyBackend for MockTaxonomy {
    fn name(&self) -> &str {
        "mock"
    }

    fn lookup(&self, taxid: TaxId) -> Result<TaxonomyInfo, TaxbenchError> {
        let (_, rank, path, names) = TAXA
            .iter()
            .find(|(id, ..)| *id == taxid.get())
            .ok_or(TaxbenchError::TaxonNotFound(taxid.get()))?;
        let ids = path
            .split('|')
            .map(str::parse::<TaxId>)
            .collect::<Result<Vec<_>, _>>()?;
        let names = names.split('|').map(str::to_string).collect();
        Ok(TaxonomyInfo {
            rank: rank.to_string(),
            lineage: Lineage::new(ids, names)?,
            resolved: true,
        })
    }
}

pub fn mock_lookup() -> TaxonomyLookup {
    TaxonomyLookup::with_backend(MockTaxonomy)
}

pub fn workspace() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

pub fn write_file(dir: &Utf8Path, name: &str, content: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn read_file(path: &Utf8Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Data rows of a Bioboxes profile, split into fields.
pub fn data_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('@'))
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

pub fn write_taxdump(dir: &Utf8Path) -> Utf8PathBuf {
    let taxdump = dir.join("taxdump");
    fs::create_dir_all(&taxdump).unwrap();
    let nodes = [
        (1, 1, "no rank"),
        (131567, 1, "no rank"),
        (2, 131567, "superkingdom"),
        (1224, 2, "phylum"),
        (1236, 1224, "class"),
        (91347, 1236, "order"),
        (543, 91347, "family"),
        (561, 543, "genus"),
        (562, 561, "species"),
    ];
    let names = [
        (1, "root"),
        (131567, "cellular organisms"),
        (2, "Bacteria"),
        (1224, "Pseudomonadota"),
        (1236, "Gammaproteobacteria"),
        (91347, "Enterobacterales"),
        (543, "Enterobacteriaceae"),
        (561, "Escherichia"),
        (562, "Escherichia coli"),
    ];
    let nodes: String = nodes
        .iter()
        .map(|(id, parent, rank)| format!("{id}\t|\t{parent}\t|\t{rank}\t|\t\t|\n"))
        .collect();
    let names: String = names
        .iter()
        .map(|(id, name)| format!("{id}\t|\t{name}\t|\t\t|\tscientific name\t|\n"))
        .collect();
    fs::write(taxdump.join("nodes.dmp"), nodes).unwrap();
    fs::write(taxdump.join("names.dmp"), names).unwrap();
    taxdump
}
