//! Sample metadata: accession -> study condition, and the join with the count
//! matrix that produces the DESeq2 design table.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{SampleId, normalize_group};
use crate::error::KiraError;
use crate::matrix::CountMatrix;

pub const ACCESSION_COLUMN: &str = "NCBI_accession";
pub const CONDITION_COLUMN: &str = "study_condition";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleGroup {
    pub sample_id: SampleId,
    pub group: String,
}

/// Load `metadata.csv`, keeping one (sample_id, group) row per sample.
///
/// Rows without an extractable accession or with an empty condition are
/// dropped; the first row wins for duplicated samples.
pub fn load_metadata(path: &Path) -> Result<Vec<SampleGroup>, KiraError> {
    let file = File::open(path).map_err(|_| KiraError::MetadataRead(path.to_path_buf()))?;
    let groups = parse_metadata(file)?;
    info!(samples = groups.len(), path = %path.display(), "loaded metadata");
    Ok(groups)
}

pub fn parse_metadata<R: std::io::Read>(reader: R) -> Result<Vec<SampleGroup>, KiraError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |column: &str| headers.iter().position(|h| h.trim() == column);
    let (accession_idx, condition_idx) =
        match (position(ACCESSION_COLUMN), position(CONDITION_COLUMN)) {
            (Some(a), Some(c)) => (a, c),
            (a, c) => {
                let missing = [(a, ACCESSION_COLUMN), (c, CONDITION_COLUMN)]
                    .into_iter()
                    .filter(|(idx, _)| idx.is_none())
                    .map(|(_, name)| name.to_string())
                    .collect();
                return Err(KiraError::MetadataColumns { missing });
            }
        };

    let mut seen = HashSet::new();
    let mut groups = Vec::new();
    for row in reader.records() {
        let row = row?;
        let sample_id = row.get(accession_idx).and_then(SampleId::find_accession);
        let group = row.get(condition_idx).and_then(normalize_group);
        let (Some(sample_id), Some(group)) = (sample_id, group) else {
            continue;
        };
        if seen.insert(sample_id.clone()) {
            groups.push(SampleGroup { sample_id, group });
        }
    }
    Ok(groups)
}

/// Count matrix and metadata restricted to the samples they share.
#[derive(Debug, Clone)]
pub struct DesignTable {
    pub counts: CountMatrix,
    /// One row per matrix sample, in matrix order.
    pub design: Vec<SampleGroup>,
    /// Matrix samples without metadata.
    pub missing_metadata: Vec<SampleId>,
    /// Metadata samples without annotations.
    pub missing_counts: Vec<SampleId>,
}

pub fn join_metadata(
    matrix: &CountMatrix,
    metadata: &[SampleGroup],
) -> Result<DesignTable, KiraError> {
    let mut design = Vec::new();
    let mut missing_metadata = Vec::new();
    for sample_id in matrix.sample_ids() {
        match metadata.iter().find(|m| &m.sample_id == sample_id) {
            Some(row) => design.push(row.clone()),
            None => missing_metadata.push(sample_id.clone()),
        }
    }

    let in_matrix: HashSet<&SampleId> = matrix.sample_ids().iter().collect();
    let missing_counts: Vec<SampleId> = metadata
        .iter()
        .filter(|m| !in_matrix.contains(&m.sample_id))
        .map(|m| m.sample_id.clone())
        .collect();

    if matrix.is_empty() {
        warn!("count matrix is empty; design table has no samples");
    } else if design.is_empty() {
        return Err(KiraError::NoSharedSamples);
    }
    if !missing_metadata.is_empty() {
        warn!(samples = ?missing_metadata, "samples without metadata dropped from design");
    }
    if !missing_counts.is_empty() {
        info!(samples = missing_counts.len(), "metadata rows without annotations ignored");
    }

    let keep: Vec<SampleId> = design.iter().map(|row| row.sample_id.clone()).collect();
    Ok(DesignTable {
        counts: matrix.select_samples(&keep),
        design,
        missing_metadata,
        missing_counts,
    })
}
