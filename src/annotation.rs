use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use glob::Pattern;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::SampleId;
use crate::error::KiraError;

pub const DEFAULT_PATTERN: &str = "ERR*.emapper.annotations";

const HEADER_MARKER: &[u8] = b"#query";
const QUERY_COLUMN: &str = "query";
const MODULE_COLUMN: &str = "KEGG_Module";
const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub sample_id: SampleId,
    pub query: String,
    #[serde(rename = "KEGG_Module")]
    pub kegg_module: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    records: Vec<AnnotationRecord>,
}

impl AnnotationTable {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sample_ids(&self) -> BTreeSet<&SampleId> {
        self.records.iter().map(|r| &r.sample_id).collect()
    }

    pub fn modules(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.kegg_module.as_str()).collect()
    }
}

pub fn read_emapper(dir: &Path, pattern: &str) -> Result<AnnotationTable, KiraError> {
    let files = find_annotation_files(dir, pattern)?;

    let mut records = Vec::new();
    let mut parsed = 0usize;
    for path in &files {
        let name = file_name(path);
        let sample_id = SampleId::from_file_name(&name)?;
        let bytes = read_bytes(path)?;
        match parse_annotations(&bytes, &sample_id, path)? {
            Some(rows) => {
                parsed += 1;
                records.extend(rows);
            }
            None => warn!("skipping {name}: no '#query' header found"),
        }
    }

    if parsed == 0 {
        return Err(KiraError::NoValidAnnotations);
    }

    let table = AnnotationTable::new(records);
    info!(
        files = files.len(),
        samples = table.sample_ids().len(),
        rows = table.len(),
        "loaded annotations"
    );
    Ok(table)
}

pub fn find_annotation_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, KiraError> {
    let matcher = Pattern::new(pattern).map_err(|err| KiraError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;
    let not_found = || KiraError::NoInputFiles {
        pattern: pattern.to_string(),
        dir: dir.to_path_buf(),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
        Err(err) => {
            return Err(KiraError::Filesystem(format!(
                "read dir {}: {err}",
                dir.display()
            )));
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file() && matcher.matches(&file_name(&path)) {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(not_found());
    }
    Ok(files)
}

/// Returns `Ok(None)` when there is no `#query` header line.
pub fn parse_annotations(
    content: &[u8],
    sample_id: &SampleId,
    source: &Path,
) -> Result<Option<Vec<AnnotationRecord>>, KiraError> {
    let Some(header) = find_header(content) else {
        return Ok(None);
    };

    let position = |column: &str| header.iter().position(|h| h == column);
    let (query_idx, module_idx) = match (position(QUERY_COLUMN), position(MODULE_COLUMN)) {
        (Some(q), Some(m)) => (q, m),
        (q, m) => {
            let mut columns = Vec::new();
            if q.is_none() {
                columns.push(QUERY_COLUMN.to_string());
            }
            if m.is_none() {
                columns.push(MODULE_COLUMN.to_string());
            }
            return Err(KiraError::MissingAnnotationColumns {
                file: source.to_path_buf(),
                columns,
            });
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .from_reader(content);

    let mut records = Vec::new();
    for row in reader.byte_records() {
        let row = row?;
        let query = field(&row, query_idx);
        let modules = field(&row, module_idx);
        let (Some(query), Some(modules)) = (query, modules) else {
            continue;
        };
        if modules == PLACEHOLDER {
            continue;
        }
        for module in modules.split(',').map(str::trim).filter(|m| !m.is_empty()) {
            records.push(AnnotationRecord {
                sample_id: sample_id.clone(),
                query: query.clone(),
                kegg_module: module.to_string(),
            });
        }
    }
    Ok(Some(records))
}

fn find_header(content: &[u8]) -> Option<Vec<String>> {
    content
        .split(|byte| *byte == b'\n')
        .find(|line| line.starts_with(HEADER_MARKER))
        .map(|line| {
            String::from_utf8_lossy(line)
                .trim_start_matches('#')
                .trim()
                .split('\t')
                .map(str::to_string)
                .collect()
        })
}

// Empty cells count as missing values.
fn field(row: &csv::ByteRecord, idx: usize) -> Option<String> {
    row.get(idx)
        .filter(|raw| !raw.is_empty())
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, KiraError> {
    let file = File::open(path)
        .map_err(|err| KiraError::Filesystem(format!("open {}: {err}", path.display())))?;
    let mut bytes = Vec::new();
    let result = if path.extension().is_some_and(|ext| ext == "gz") {
        MultiGzDecoder::new(file).read_to_end(&mut bytes)
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)
    };
    result.map_err(|err| KiraError::Filesystem(format!("read {}: {err}", path.display())))?;
    Ok(bytes)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SAMPLE: &str = "\
## emapper-2.1.12
## command: emapper.py -i proteins.faa
#query\tseed_ortholog\tevalue\tKEGG_ko\tKEGG_Module
P1\tx\t1e-5\tko:K00001\tM00001, M00002
P2\tx\t1e-5\tko:K00002\tM00001
P3\tx\t1e-5\t-\t-
P4\tx\t1e-5\tko:K00003\t
## 4 queries scanned
";

    fn sample() -> SampleId {
        "ERR123".parse().unwrap()
    }

    #[test]
    fn explodes_and_filters_modules() {
        let records = parse_annotations(SAMPLE.as_bytes(), &sample(), Path::new("x"))
            .unwrap()
            .unwrap();
        let triples: Vec<_> = records
            .iter()
            .map(|r| (r.query.as_str(), r.kegg_module.as_str()))
            .collect();
        assert_eq!(
            triples,
            vec![("P1", "M00001"), ("P1", "M00002"), ("P2", "M00001")]
        );
        assert!(records.iter().all(|r| r.sample_id.as_str() == "ERR123"));
    }

    #[test]
    fn missing_header_yields_none() {
        let content = "## no header\nP1\tM00001\n";
        let parsed = parse_annotations(content.as_bytes(), &sample(), Path::new("x")).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn missing_module_column_is_reported() {
        let content = "#query\tseed_ortholog\nP1\tx\n";
        let err = parse_annotations(content.as_bytes(), &sample(), Path::new("a.tsv")).unwrap_err();
        assert_matches!(err, KiraError::MissingAnnotationColumns { columns, .. } if columns == vec!["KEGG_Module".to_string()]);
    }

    #[test]
    fn short_rows_are_dropped() {
        let content = "#query\tKEGG_ko\tKEGG_Module\nP1\tko:K1\n";
        let records = parse_annotations(content.as_bytes(), &sample(), Path::new("x"))
            .unwrap()
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn pattern_classes_and_wildcards() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ERR1.emapper.annotations", "ERRx.emapper.annotations", "S1.tsv", "S12.tsv"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let names = |pattern: &str| -> Vec<String> {
            find_annotation_files(dir.path(), pattern)
                .unwrap()
                .iter()
                .map(|p| file_name(p))
                .collect()
        };
        assert_eq!(names("ERR[0-9]*.emapper.annotations"), vec!["ERR1.emapper.annotations"]);
        assert_eq!(names("S?.tsv"), vec!["S1.tsv"]);
        assert_eq!(names("ERR*.emapper.annotations").len(), 2);
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_annotation_files(dir.path(), "ERR[*").unwrap_err();
        assert_matches!(err, KiraError::InvalidPattern { .. });
    }
}
