mod common;

use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use taxbench_tools::compare::{AnalysisMode, CompareOptions, run_comparison};
use taxbench_tools::error::TaxbenchError;

use common::{read_file, workspace, write_file};

const GOLD: &str = "@SampleID:mock\n@Version:0.9.1\n@Ranks:genus|species\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
561\tgenus\t2|561\tBacteria|Escherichia\t60\n\
562\tspecies\t2|561|562\tBacteria|Escherichia|Escherichia coli\t60\n\
1279\tgenus\t2|1279\tBacteria|Staphylococcus\t40\n\
1280\tspecies\t2|1279|1280\tBacteria|Staphylococcus|Staphylococcus aureus\t40\n";

const KRAKEN2: &str = "@SampleID:mock\n@Version:0.9.1\n@Ranks:genus|species\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\t2|561|562\tBacteria|Escherichia|Escherichia coli\t50\n\
1280\tspecies\t2|1279|1280\tBacteria|Staphylococcus|Staphylococcus aureus\t40.5\n\
1282\tspecies\t2|1279|1282\tBacteria|Staphylococcus|Staphylococcus epidermidis\t9.5\n";

const METAPHLAN: &str = "@SampleID:mock\n@Version:0.9.1\n@Ranks:genus|species\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\t2|561|562\tBacteria|Escherichia|Escherichia coli\t60\n\
1280\tspecies\t2|1279|1280\tBacteria|Staphylococcus|Staphylococcus aureus\t40\n";

const RESULTS: &str = "tool\trank\tmetric\tsample\tvalue\n\
Gold standard\tspecies\tF1 score\tmock\t1.0\n\
kraken2\tspecies\tF1 score\tmock\t0.8\n\
metaphlan\tspecies\tF1 score\tmock\t1.0\n\
centrifuge\tspecies\tF1 score\tmock\t0.6\n\
kraken2\tspecies\tL1 norm error\tmock\t0.21\n\
metaphlan\tspecies\tL1 norm error\tmock\t0.0\n\
centrifuge\tspecies\tL1 norm error\tmock\t0.35\n\
kraken2\tgenus\tPurity\tmock\tnan\n";

fn options(dir: &Utf8Path, labels: &[&str], profiles: Vec<Utf8PathBuf>) -> CompareOptions {
    CompareOptions {
        opal_dir: dir.join("opal"),
        gold_standard: write_file(dir, "gold.bioboxes", GOLD),
        sample_id: "mock".to_string(),
        labels: labels.iter().map(|label| label.to_string()).collect(),
        output_prefix: dir.join("mock").to_string(),
        profiles,
        threshold: 1.0,
    }
}

#[test]
fn missing_opal_results_give_placeholders() {
    let (_guard, dir) = workspace();
    let options = options(&dir, &["kraken2", "metaphlan"], Vec::new());
    assert_matches!(AnalysisMode::probe(&options.opal_dir), AnalysisMode::Placeholder { .. });

    let summary = run_comparison(&options).unwrap();
    assert_eq!(summary.mode, "placeholder");

    let pca = read_file(&summary.outputs.pca_html);
    assert!(pca.contains("Classifiers analyzed: kraken2, metaphlan"));
    let tsv = read_file(&summary.outputs.diff_taxa_tsv);
    assert!(tsv.starts_with("taxid\trank\ttaxname\tobserved_pct\texpected_pct\tp_value\tclassifier\n# "));
    let comparison = read_file(&summary.outputs.comparison_html);
    assert!(comparison.contains("mock_pca.html"));
    assert!(comparison.contains("mock_diff_taxa.tsv"));
}

#[test]
fn opal_metrics_drive_full_report() {
    let (_guard, dir) = workspace();
    fs::create_dir_all(dir.join("opal")).unwrap();
    write_file(&dir.join("opal"), "results.tsv", RESULTS);
    let kraken2 = write_file(&dir, "kraken2.bioboxes", KRAKEN2);
    let metaphlan = write_file(&dir, "metaphlan.bioboxes", METAPHLAN);
    let options = options(&dir, &["kraken2", "metaphlan"], vec![kraken2, metaphlan]);

    assert_matches!(AnalysisMode::probe(&options.opal_dir), AnalysisMode::Full(rows) if rows.len() == 7);
    let summary = run_comparison(&options).unwrap();
    assert_eq!(summary.mode, "full");

    let pca = read_file(&summary.outputs.pca_html);
    assert!(pca.contains("<svg"));
    assert!(pca.contains("PC1 ("));
    assert!(pca.contains("centrifuge"));
    assert!(!pca.contains("Gold standard"));

    let tsv = read_file(&summary.outputs.diff_taxa_tsv);
    let rows: Vec<&str> = tsv.lines().skip(1).collect();
    assert_eq!(rows.len(), summary.differential_taxa);
    assert!(rows.contains(&"562\tspecies\tEscherichia coli\t50.000000\t60.000000\tNA\tkraken2"));
    assert!(rows.contains(&"1282\tspecies\tStaphylococcus epidermidis\t9.500000\t0.000000\tNA\tkraken2"));
    assert!(rows.contains(&"561\tgenus\tEscherichia\t0.000000\t60.000000\tNA\tmetaphlan"));
    assert!(!rows.iter().any(|row| row.starts_with("1280\tspecies")));

    let comparison = read_file(&summary.outputs.comparison_html);
    assert!(comparison.contains("F1 score"));
    assert!(comparison.contains("Jaccard"));
    assert!(comparison.contains("<td>0.667</td>"));
}

#[test]
fn single_classifier_cannot_be_projected() {
    let (_guard, dir) = workspace();
    fs::create_dir_all(dir.join("opal")).unwrap();
    write_file(
        &dir.join("opal"),
        "results.tsv",
        "tool\trank\tmetric\tsample\tvalue\nkraken2\tspecies\tF1 score\tmock\t0.8\n",
    );
    let summary = run_comparison(&options(&dir, &["kraken2"], Vec::new())).unwrap();
    assert_eq!(summary.mode, "full");
    let pca = read_file(&summary.outputs.pca_html);
    assert!(pca.contains("PCA needs at least two classifiers"));
}

#[test]
fn profiles_must_match_labels() {
    let (_guard, dir) = workspace();
    let kraken2 = write_file(&dir, "kraken2.bioboxes", KRAKEN2);
    let options = options(&dir, &["kraken2", "metaphlan"], vec![kraken2]);
    assert_matches!(run_comparison(&options), Err(TaxbenchError::InputFormat(_)));
}
