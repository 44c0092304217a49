use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::annotation::AnnotationTable;
use crate::domain::SampleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCount {
    pub sample_id: SampleId,
    #[serde(rename = "KEGG_Module")]
    pub kegg_module: String,
    pub n_proteins: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMatrix {
    sample_ids: Vec<SampleId>,
    module_ids: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl CountMatrix {
    pub fn from_long(long: &[ModuleCount]) -> Self {
        let sample_ids: Vec<SampleId> = long
            .iter()
            .map(|c| c.sample_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let module_ids: Vec<String> = long
            .iter()
            .map(|c| c.kegg_module.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0u64; module_ids.len()]; sample_ids.len()];
        for count in long {
            // Both lookups succeed: the axes were built from `long`.
            if let (Ok(row), Ok(col)) = (
                sample_ids.binary_search(&count.sample_id),
                module_ids.binary_search(&count.kegg_module),
            ) {
                counts[row][col] = count.n_proteins;
            }
        }

        Self {
            sample_ids,
            module_ids,
            counts,
        }
    }

    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    pub fn module_ids(&self) -> &[String] {
        &self.module_ids
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_modules(&self) -> usize {
        self.module_ids.len()
    }

    pub fn size(&self) -> usize {
        self.n_samples() * self.n_modules()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn get(&self, sample_id: &SampleId, module: &str) -> Option<u64> {
        let row = self.sample_ids.binary_search(sample_id).ok()?;
        let col = self
            .module_ids
            .binary_search_by(|id| id.as_str().cmp(module))
            .ok()?;
        Some(self.counts[row][col])
    }

    pub fn row(&self, sample_id: &SampleId) -> Option<&[u64]> {
        let row = self.sample_ids.binary_search(sample_id).ok()?;
        Some(&self.counts[row])
    }

    pub fn zero_count(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|row| row.iter())
            .filter(|value| **value == 0)
            .count()
    }

    pub fn max_count(&self) -> u64 {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Matrix restricted to `keep`, in the order given. Unknown samples are skipped.
    pub fn select_samples(&self, keep: &[SampleId]) -> Self {
        let mut sample_ids = Vec::new();
        let mut counts = Vec::new();
        for id in keep {
            if let Some(row) = self.row(id) {
                sample_ids.push(id.clone());
                counts.push(row.to_vec());
            }
        }
        Self {
            sample_ids,
            module_ids: self.module_ids.clone(),
            counts,
        }
    }
}

pub fn count_modules(table: &AnnotationTable) -> Vec<ModuleCount> {
    let mut groups: BTreeMap<(&SampleId, &str), HashSet<&str>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry((&record.sample_id, record.kegg_module.as_str()))
            .or_default()
            .insert(record.query.as_str());
    }

    groups
        .into_iter()
        .map(|((sample_id, module), queries)| ModuleCount {
            sample_id: sample_id.clone(),
            kegg_module: module.to_string(),
            n_proteins: queries.len() as u64,
        })
        .collect()
}

pub fn summarize_modules(table: &AnnotationTable) -> (Vec<ModuleCount>, CountMatrix) {
    let long = count_modules(table);
    let matrix = CountMatrix::from_long(&long);
    (long, matrix)
}
