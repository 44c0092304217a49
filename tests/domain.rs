use assert_matches::assert_matches;

use kira_module_matrix::domain::{SampleId, normalize_group};
use kira_module_matrix::error::KiraError;

#[test]
fn accession_extraction() {
    assert_eq!(
        SampleId::find_accession("PRJEB1; err4808451").unwrap().as_str(),
        "ERR4808451"
    );
    assert!(SampleId::find_accession("SRR1234").is_none());
}

#[test]
fn file_name_rules() {
    let id = SampleId::from_file_name("ERR99.emapper.annotations.gz").unwrap();
    assert_eq!(id.to_string(), "ERR99");
    let id = SampleId::from_file_name("sample-7.tsv").unwrap();
    assert_eq!(id.as_str(), "sample-7");
    assert_matches!(
        SampleId::from_file_name(""),
        Err(KiraError::InvalidSampleId(_))
    );
}

#[test]
fn groups_are_lowercase() {
    assert_eq!(normalize_group("Adenoma").as_deref(), Some("adenoma"));
    assert_eq!(normalize_group(""), None);
}
