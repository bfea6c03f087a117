mod common;

use assert_matches::assert_matches;

use taxbench_tools::bioboxes::validate_text;
use taxbench_tools::error::TaxbenchError;
use taxbench_tools::gold::{GoldLayout, fix_gold_standard};
use taxbench_tools::taxonomy::TaxonomyLookup;

use common::{data_rows, mock_lookup, read_file, workspace, write_file};

#[test]
fn missing_taxpath_column_is_added() {
    let (_guard, dir) = workspace();
    let input = write_file(
        &dir,
        "gold.tsv",
        "# mock community\n@SampleID:mock\n@@TAXID\tRANK\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\tEscherichia coli\t60\n\
1280\tspecies\tBacteria|Bacillota|Bacilli|Bacillales|Staphylococcaceae|Staphylococcus|Staphylococcus aureus\t30\n\
131567\tno rank\tcellular organisms\t5\n\
oops\tspecies\tbroken\t5\n",
    );
    let output = dir.join("gold.bioboxes");

    let summary = fix_gold_standard(&input, &output, "gold_standard", &mock_lookup()).unwrap();
    assert_matches!(summary.layout, GoldLayout::MissingTaxpathColumn { taxid: 0, .. });
    assert_eq!(summary.skipped_unparsable, 1);
    assert_eq!(summary.skipped_by_rank, 1);
    assert_eq!(summary.replaced_names, 1);
    assert_eq!(summary.records_written, 2);

    let text = read_file(&output);
    assert!(text.starts_with("@SampleID:gold_standard\n@Version:0.9.1\n"));
    let rows = data_rows(&text);
    assert_eq!(rows[0][2], "2|1224|1236|91347|543|561|562");
    assert!(rows[0][3].ends_with("Escherichia|Escherichia coli"));
    assert!(rows[1][3].starts_with("Bacteria|Bacillota"));
    assert_eq!(rows[0][4], "66.666667");

    let report = validate_text(&text);
    assert!(report.is_valid(), "{:?}", report.issues);
}

#[test]
fn rows_without_taxpath_are_repaired_positionally() {
    let (_guard, dir) = workspace();
    let input = write_file(
        &dir,
        "gold.bioboxes",
        "@SampleID:x\n@Version:0.9.1\n@Ranks:species\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\tEscherichia coli\t50\n\
46170\tsubspecies\tS. aureus subsp. aureus\t50\n",
    );
    let output = dir.join("fixed.bioboxes");
    let summary = fix_gold_standard(&input, &output, "mock", &mock_lookup()).unwrap();
    assert_eq!(summary.layout, GoldLayout::TaxpathOmittedInRows);

    let rows = data_rows(&read_file(&output));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "46170");
    assert_eq!(rows[1][1], "strain");
    assert!(rows[1][2].ends_with("|1280|46170"));
}

#[test]
fn offline_fix_keeps_supplied_names() {
    let (_guard, dir) = workspace();
    let input = write_file(
        &dir,
        "gold.tsv",
        "@@TAXID\tRANK\tTAXPATHSN\tPERCENTAGE\n562\tspecies\tEscherichia coli\t100\n",
    );
    let output = dir.join("gold.bioboxes");
    let summary =
        fix_gold_standard(&input, &output, "gold_standard", &TaxonomyLookup::offline()).unwrap();
    assert_eq!(summary.replaced_names, 0);
    let rows = data_rows(&read_file(&output));
    assert_eq!(rows[0], vec!["562", "species", "562", "Escherichia coli", "100.000000"]);
}

#[test]
fn unresolved_lineage_keeps_only_the_leaf_name() {
    let (_guard, dir) = workspace();
    let input = write_file(
        &dir,
        "gold.tsv",
        "@@TAXID\tRANK\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\tBacteria|Pseudomonadota|Escherichia coli\t100\n",
    );
    let output = dir.join("gold.bioboxes");
    let summary =
        fix_gold_standard(&input, &output, "gold_standard", &TaxonomyLookup::offline()).unwrap();
    assert_eq!(summary.replaced_names, 0);

    let text = read_file(&output);
    let rows = data_rows(&text);
    assert_eq!(rows[0], vec!["562", "species", "562", "Escherichia coli", "100.000000"]);
    let report = validate_text(&text);
    assert!(report.is_valid(), "{:?}", report.issues);
}

#[test]
fn taxid_missing_from_taxonomy_stays_consistent() {
    let (_guard, dir) = workspace();
    let input = write_file(
        &dir,
        "gold.tsv",
        "@@TAXID\tRANK\tTAXPATHSN\tPERCENTAGE\n\
999999\tspecies\tBacteria|Unknownia|Unknownia novus\t40\n\
562\tspecies\tEscherichia coli\t60\n",
    );
    let output = dir.join("gold.bioboxes");
    fix_gold_standard(&input, &output, "gold_standard", &mock_lookup()).unwrap();

    let text = read_file(&output);
    let rows = data_rows(&text);
    let missing = rows.iter().find(|row| row[0] == "999999").unwrap();
    assert_eq!(missing[2], "999999");
    assert_eq!(missing[3], "Unknownia novus");
    let report = validate_text(&text);
    assert!(report.is_valid(), "{:?}", report.issues);
}

#[test]
fn valid_file_is_copied_unchanged() {
    let (_guard, dir) = workspace();
    let content = "@SampleID:x\n@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n\
562\tspecies\t562\tEscherichia coli\t100\n";
    let input = write_file(&dir, "ok.bioboxes", content);
    let output = dir.join("copy.bioboxes");
    let summary = fix_gold_standard(&input, &output, "gold_standard", &mock_lookup()).unwrap();
    assert_eq!(summary.layout, GoldLayout::AlreadyValid);
    assert_eq!(read_file(&output), content);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["layout"], "already_valid");
}

#[test]
fn file_without_column_header_fails() {
    let (_guard, dir) = workspace();
    let input = write_file(&dir, "gold.tsv", "562\tspecies\t100\n");
    assert_matches!(
        fix_gold_standard(&input, &dir.join("out"), "g", &mock_lookup()),
        Err(TaxbenchError::GoldStandard(_))
    );
}
