use std::fs;
use std::io::Write;
use std::path::Path;

use assert_matches::assert_matches;
use flate2::Compression;
use flate2::write::GzEncoder;

use kira_module_matrix::annotation::{DEFAULT_PATTERN, find_annotation_files, read_emapper};
use kira_module_matrix::error::KiraError;
use kira_module_matrix::matrix::summarize_modules;

const HEADER: &str = "#query\tseed_ortholog\tevalue\tscore\tKEGG_ko\tKEGG_Module\n";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn worked_example_explodes_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "ERR123.emapper.annotations",
        &format!("## preamble\n{HEADER}P1\ts\t0\t1\tko:K1\tK001,K002\nP2\ts\t0\t1\tko:K1\tK001\n"),
    );

    let table = read_emapper(dir.path(), DEFAULT_PATTERN).unwrap();
    let triples: Vec<_> = table
        .records()
        .iter()
        .map(|r| (r.sample_id.as_str(), r.query.as_str(), r.kegg_module.as_str()))
        .collect();
    assert_eq!(
        triples,
        vec![
            ("ERR123", "P1", "K001"),
            ("ERR123", "P1", "K002"),
            ("ERR123", "P2", "K001"),
        ]
    );

    let (long, matrix) = summarize_modules(&table);
    assert_eq!(long.len(), 2);
    let sample = "ERR123".parse().unwrap();
    assert_eq!(matrix.get(&sample, "K001"), Some(2));
    assert_eq!(matrix.get(&sample, "K002"), Some(1));
}

#[test]
fn rows_from_all_files_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "ERR1.emapper.annotations",
        &format!("{HEADER}A\ts\t0\t1\t-\tM1, M2 ,\nB\ts\t0\t1\t-\t-\n"),
    );
    write(
        dir.path(),
        "ERR2.emapper.annotations",
        &format!("{HEADER}A\ts\t0\t1\t-\tM3\n# trailing comment\n"),
    );
    write(dir.path(), "notes.txt", "ignored\n");

    let table = read_emapper(dir.path(), DEFAULT_PATTERN).unwrap();
    assert_eq!(table.len(), 3);
    let samples: Vec<&str> = table.sample_ids().into_iter().map(|s| s.as_str()).collect();
    assert_eq!(samples, vec!["ERR1", "ERR2"]);
    assert_eq!(
        table.modules().into_iter().collect::<Vec<_>>(),
        vec!["M1", "M2", "M3"]
    );
}

#[test]
fn file_without_header_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ERR1.emapper.annotations", "## nothing here\nA\tM1\n");
    write(
        dir.path(),
        "ERR2.emapper.annotations",
        &format!("{HEADER}A\ts\t0\t1\t-\tM1\n"),
    );

    let table = read_emapper(dir.path(), DEFAULT_PATTERN).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].sample_id.as_str(), "ERR2");
}

#[test]
fn all_files_skipped_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ERR1.emapper.annotations", "A\tM1\n");
    let err = read_emapper(dir.path(), DEFAULT_PATTERN).unwrap_err();
    assert_matches!(err, KiraError::NoValidAnnotations);
}

#[test]
fn no_matching_files_names_pattern() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "SRR1.emapper.annotations", HEADER);
    let err = read_emapper(dir.path(), DEFAULT_PATTERN).unwrap_err();
    assert_matches!(err, KiraError::NoInputFiles { ref pattern, .. } if pattern == DEFAULT_PATTERN);

    let missing = dir.path().join("does-not-exist");
    let err = find_annotation_files(&missing, "*").unwrap_err();
    assert_matches!(err, KiraError::NoInputFiles { .. });
}

#[test]
fn fallback_sample_id_from_custom_pattern() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "gut01.emapper.annotations",
        &format!("{HEADER}A\ts\t0\t1\t-\tM1\n"),
    );
    let table = read_emapper(dir.path(), "*.emapper.annotations").unwrap();
    assert_eq!(table.records()[0].sample_id.as_str(), "gut01");
}

#[test]
fn gzipped_annotations_are_decompressed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ERR7.emapper.annotations.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    encoder
        .write_all(format!("{HEADER}Q1\ts\t0\t1\t-\tM00005\n").as_bytes())
        .unwrap();
    encoder.finish().unwrap();

    let table = read_emapper(dir.path(), "ERR*.emapper.annotations.gz").unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].sample_id.as_str(), "ERR7");
    assert_eq!(table.records()[0].kegg_module, "M00005");
}
