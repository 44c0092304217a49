use std::collections::BTreeSet;

use serde::Serialize;

use crate::kegg::ReferenceTable;
use crate::matrix::CountMatrix;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub n_samples: usize,
    pub n_modules: usize,
    pub sparsity: f64,
    pub percent_unmapped: Option<f64>,
    pub unmapped_modules: Vec<String>,
}

impl QualityReport {
    pub fn build(matrix: &CountMatrix, reference: Option<&ReferenceTable>) -> Self {
        let modules = matrix.module_ids().iter().map(String::as_str);
        let (percent_unmapped, unmapped_modules) = match reference {
            Some(reference) => (
                Some(percent_unmapped(modules.clone(), reference)),
                unmapped_modules(modules, reference),
            ),
            None => (None, Vec::new()),
        };
        Self {
            n_samples: matrix.n_samples(),
            n_modules: matrix.n_modules(),
            sparsity: matrix_sparsity(matrix),
            percent_unmapped,
            unmapped_modules,
        }
    }
}

pub fn unmapped_modules<'a>(
    modules: impl IntoIterator<Item = &'a str>,
    reference: &ReferenceTable,
) -> Vec<String> {
    modules
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|module| !reference.contains(module))
        .map(str::to_string)
        .collect()
}

/// Empty input gives 0.0.
pub fn percent_unmapped<'a>(
    modules: impl IntoIterator<Item = &'a str>,
    reference: &ReferenceTable,
) -> f64 {
    let present: BTreeSet<&str> = modules.into_iter().collect();
    if present.is_empty() {
        return 0.0;
    }
    let missing = present.iter().filter(|m| !reference.contains(m)).count();
    round2(100.0 * missing as f64 / present.len() as f64)
}

/// Empty matrix gives 0.0.
pub fn matrix_sparsity(matrix: &CountMatrix) -> f64 {
    let total = matrix.size();
    if total == 0 {
        return 0.0;
    }
    round2(100.0 * matrix.zero_count() as f64 / total as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
