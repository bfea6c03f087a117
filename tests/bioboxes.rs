mod common;

use taxbench_tools::bioboxes::{read_entries, validate_bioboxes, validate_text};
use taxbench_tools::validation::{Severity, ValidationReport};

use common::{workspace, write_file};

const HEADER: &str = "@SampleID:s1\n@Version:0.9.1\n\
@Ranks:superkingdom|phylum|class|order|family|genus|species|strain\n\
@TaxonomyID:NCBI\n@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n";

fn profile_with_headers(headers: &str, rows: &[&str]) -> String {
    let mut text = format!("{headers}@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn errors(report: &ValidationReport) -> Vec<&str> {
    report
        .issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .map(|issue| issue.message.as_str())
        .collect()
}

fn profile(rows: &[&str]) -> String {
    let mut text = HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

#[test]
fn well_formed_file_is_valid() {
    let (_guard, dir) = workspace();
    let path = write_file(
        &dir,
        "ok.bioboxes",
        &profile(&[
            "2\tsuperkingdom\t2\tBacteria\t40.000000",
            "562\tspecies\t2|1224|1236|91347|543|561|562\tBacteria|Pseudomonadota|Gammaproteobacteria|Enterobacterales|Enterobacteriaceae|Escherichia|Escherichia coli\t60.000000",
        ]),
    );
    let report = validate_bioboxes(&path);
    assert!(report.is_valid(), "{:?}", report.issues);
    assert_eq!(report.statistics.get("data_rows"), Some(&2.into()));
    assert_eq!(report.statistics.get("unique_taxids"), Some(&2.into()));
}

#[test]
fn missing_ranks_header_is_reported() {
    let text = "@SampleID:s1\n@Version:0.9.1\n@TaxonomyID:NCBI\n\
@@TAXID\tRANK\tTAXPATH\tTAXPATHSN\tPERCENTAGE\n2\tsuperkingdom\t2\tBacteria\t100\n";
    let report = validate_text(text);
    assert!(!report.is_valid());
    assert!(report.messages().contains(&"Missing required header: @Ranks"));
}

#[test]
fn duplicate_taxid_is_counted_once() {
    let report = validate_text(&profile(&[
        "2\tsuperkingdom\t2\tBacteria\t50",
        "2\tsuperkingdom\t2\tBacteria\t50",
    ]));
    let duplicates: Vec<&str> = report
        .messages()
        .into_iter()
        .filter(|message| message.contains("duplicate"))
        .collect();
    assert_eq!(duplicates, vec!["Found 1 duplicate TAXID entries"]);
}

#[test]
fn percentage_bounds() {
    let boundary = validate_text(&profile(&[
        "2\tsuperkingdom\t2\tBacteria\t100",
        "1224\tphylum\t2|1224\tBacteria|Pseudomonadota\t0",
    ]));
    assert!(boundary.is_valid(), "{:?}", boundary.issues);

    let above = validate_text(&profile(&["2\tsuperkingdom\t2\tBacteria\t100.0001"]));
    assert!(!above.passes(false));
    assert!(above
        .messages()
        .iter()
        .any(|message| message.contains("PERCENTAGE out of range")));

    let below = validate_text(&profile(&[
        "2\tsuperkingdom\t2\tBacteria\t100",
        "1224\tphylum\t2|1224\tBacteria|Pseudomonadota\t-0.0001",
    ]));
    assert!(!below.passes(false));
}

#[test]
fn taxpath_must_end_with_taxid() {
    let report = validate_text(&profile(&["562\tspecies\t2|561\tBacteria|Escherichia\t100"]));
    assert!(report
        .messages()
        .contains(&"Line 6: Last TAXPATH element (561) doesn't match TAXID (562)"));
}

#[test]
fn missing_column_header_stops_validation() {
    let report = validate_text(
        "@SampleID:s1\n@Version:0.9.1\n@Ranks:species\n@TaxonomyID:NCBI\n562\tspecies\t562\tE. coli\t100\n",
    );
    assert_eq!(
        report.messages().last(),
        Some(&"Missing column header (line starting with @@)")
    );
}

#[test]
fn percentage_sum_is_only_a_warning() {
    let report = validate_text(&profile(&["2\tsuperkingdom\t2\tBacteria\t80"]));
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);
    assert!(report.passes(false));
    assert!(!report.passes(true));
}

#[test]
fn entries_are_read_for_comparison() {
    let (_guard, dir) = workspace();
    let path = write_file(
        &dir,
        "gold.bioboxes",
        &profile(&[
            "562\tspecies\t2|561|562\tBacteria|Escherichia|Escherichia coli\t75",
            "bad\tspecies\t1\tx\t10",
            "561\tgenus\t2|561\t\t25",
        ]),
    );
    let entries = read_entries(&path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Escherichia coli");
    assert_eq!(entries[1].name, "taxid_561");
    assert_eq!(entries[1].percentage, 25.0);
}

#[test]
fn version_must_be_three_numbers() {
    let report = validate_text(&profile_with_headers(
        "@SampleID:s1\n@Version:0.9\n@Ranks:superkingdom\n",
        &["2\tsuperkingdom\t2\tBacteria\t100"],
    ));
    assert_eq!(
        errors(&report),
        vec!["Version format invalid: 0.9 (expected format: X.Y.Z)"]
    );
}

#[test]
fn unexpected_header_ranks_are_listed() {
    let report = validate_text(&profile_with_headers(
        "@SampleID:s1\n@Version:0.9.1\n@Ranks:superkingdom|kingdom|no_rank_1|clade|root\n",
        &["2\tsuperkingdom\t2\tBacteria\t100"],
    ));
    assert_eq!(errors(&report), vec!["Unexpected rank names: ['clade', 'root']"]);
}

#[test]
fn row_rank_must_be_listed_in_header() {
    let report = validate_text(&profile_with_headers(
        "@SampleID:s1\n@Version:0.9.1\n@Ranks:genus|species\n",
        &[
            "2\tsuperkingdom\t2\tBacteria\t40",
            "131567\tno_rank\t131567\tcellular organisms\t30",
            "12908\tunknown\t12908\tunclassified sequences\t30",
        ],
    ));
    assert_eq!(
        errors(&report),
        vec!["Line 5: RANK 'superkingdom' not in header Ranks"]
    );
}

#[test]
fn taxpathsn_length_must_match_taxpath() {
    let report = validate_text(&profile(&[
        "562\tspecies\t2|561|562\tBacteria|Escherichia coli\t100",
    ]));
    assert_eq!(
        errors(&report),
        vec!["Line 6: TAXPATHSN (2 elements) doesn't match TAXPATH (3 elements)"]
    );
}

#[test]
fn taxid_must_be_a_positive_integer() {
    let text = validate_text(&profile(&["abc\tspecies\t562\tEscherichia coli\t100"]));
    assert_eq!(errors(&text), vec!["Line 6: TAXID not an integer: abc"]);

    let negative = validate_text(&profile(&["-5\tspecies\t-5\tEscherichia coli\t100"]));
    assert_eq!(
        errors(&negative),
        vec!["Line 6: Invalid TAXID (must be positive): -5"]
    );

    let zero = validate_text(&profile(&["0\tspecies\t0\tEscherichia coli\t100"]));
    assert_eq!(errors(&zero), vec!["Line 6: Invalid TAXID (must be positive): 0"]);
}

#[test]
fn taxpath_must_be_present_and_numeric() {
    let empty = validate_text(&profile(&["562\tspecies\t\tEscherichia coli\t100"]));
    assert_eq!(errors(&empty), vec!["Line 6: Empty TAXPATH"]);

    let text = validate_text(&profile(&[
        "562\tspecies\t2|x|562\tBacteria|Escherichia|Escherichia coli\t100",
    ]));
    assert_eq!(errors(&text), vec!["Line 6: TAXPATH contains non-integer: x"]);
}

#[test]
fn non_finite_percentages_are_rejected() {
    for value in ["nan", "inf", "-inf"] {
        let row = format!("2\tsuperkingdom\t2\tBacteria\t{value}");
        let report = validate_text(&profile(&[row.as_str()]));
        assert_eq!(
            errors(&report),
            vec![format!("Line 6: PERCENTAGE not a number: {value}").as_str()]
        );
        assert!(report.statistics.get("total_percentage").is_none());
    }
}

#[test]
fn unusual_taxonomy_is_a_warning() {
    let report = validate_text(&profile_with_headers(
        "@SampleID:s1\n@Version:0.9.1\n@Ranks:superkingdom\n@TaxonomyID:SILVA\n",
        &["2\tsuperkingdom\t2\tBacteria\t100"],
    ));
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);
    assert_eq!(
        report.issues[0].message,
        "Unusual TaxonomyID: SILVA (expected NCBI or GTDB)"
    );
    assert!(report.passes(false));
    assert!(!report.passes(true));
}

#[test]
fn short_rows_are_reported() {
    let report = validate_text(&profile(&[
        "562\tspecies\t562",
        "2\tsuperkingdom\t2\tBacteria\t100",
    ]));
    assert_eq!(
        errors(&report),
        vec!["Line 6: Insufficient columns (expected 5, got 3)"]
    );
}
