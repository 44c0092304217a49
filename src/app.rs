use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::annotation::{DEFAULT_PATTERN, read_emapper};
use crate::config::ProjectPaths;
use crate::error::KiraError;
use crate::kegg::{KeggClient, fetch_kegg_reference};
use crate::matrix::summarize_modules;
use crate::metadata::{join_metadata, load_metadata};
use crate::metrics::QualityReport;
use crate::output::{JsonOutput, save_csv, save_plot};
use crate::plot::ModuleHeatmap;

pub const DEFAULT_DPI: u32 = 300;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pattern: String,
    pub fetch_reference: bool,
    pub dpi: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            fetch_reference: true,
            dpi: DEFAULT_DPI,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub raw_dir: String,
    pub meta_path: String,
    pub samples: usize,
    pub annotation_rows: usize,
    pub quality: QualityReport,
    pub design_samples: usize,
    pub missing_metadata: Vec<String>,
    pub missing_counts: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceResult {
    pub modules: usize,
    pub path: String,
}

#[derive(Clone)]
pub struct App<K: KeggClient> {
    paths: ProjectPaths,
    kegg: K,
}

impl<K: KeggClient> App<K> {
    pub fn new(paths: ProjectPaths, kegg: K) -> Self {
        Self { paths, kegg }
    }

    /// Annotations -> counts -> QC -> metadata join, writing every table,
    /// the heatmap and a JSON summary under the output root.
    pub fn run(&self, options: &RunOptions) -> Result<RunSummary, KiraError> {
        let paths = &self.paths;
        paths.ensure_dirs()?;
        let csv_dir = paths.out_csv.as_std_path();
        let mut outputs: Vec<PathBuf> = Vec::new();

        let annotations = read_emapper(paths.raw_dir.as_std_path(), &options.pattern)?;
        let (long_counts, matrix) = summarize_modules(&annotations);
        outputs.push(save_csv(&annotations, csv_dir, "annotations_long")?);
        outputs.push(save_csv(long_counts.as_slice(), csv_dir, "module_counts_long")?);
        outputs.push(save_csv(&matrix, csv_dir, "module_matrix")?);

        let reference = if options.fetch_reference {
            let reference = fetch_kegg_reference(&self.kegg)?;
            outputs.push(save_csv(&reference, csv_dir, "kegg_reference")?);
            Some(reference)
        } else {
            None
        };

        let quality = QualityReport::build(&matrix, reference.as_ref());
        info!(
            sparsity = quality.sparsity,
            percent_unmapped = ?quality.percent_unmapped,
            "count matrix quality"
        );

        let metadata = load_metadata(paths.meta_path.as_std_path())?;
        outputs.push(save_csv(metadata.as_slice(), csv_dir, "metadata")?);
        let design = join_metadata(&matrix, &metadata)?;
        outputs.push(save_csv(design.design.as_slice(), csv_dir, "design")?);
        outputs.push(save_csv(&design.counts, csv_dir, "design_counts")?);

        if matrix.is_empty() {
            warn!("no module counts; skipping heatmap");
        } else {
            outputs.push(save_plot(
                ModuleHeatmap::new(&matrix),
                paths.out_plots.as_std_path(),
                "module_heatmap",
                options.dpi,
            )?);
        }

        let mut summary = RunSummary {
            generated_at: chrono::Utc::now().to_rfc3339(),
            raw_dir: paths.raw_dir.to_string(),
            meta_path: paths.meta_path.to_string(),
            samples: matrix.n_samples(),
            annotation_rows: annotations.len(),
            quality,
            design_samples: design.design.len(),
            missing_metadata: design.missing_metadata.iter().map(ToString::to_string).collect(),
            missing_counts: design.missing_counts.iter().map(ToString::to_string).collect(),
            outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
        };
        let summary_path = paths.out_root.as_std_path().join("run_summary.json");
        summary.outputs.push(summary_path.display().to_string());
        JsonOutput::save(&summary, paths.out_root.as_std_path(), "run_summary")?;
        Ok(summary)
    }

    /// Fetch the KEGG module list and store it as `kegg_reference.csv`.
    pub fn fetch_reference(&self) -> Result<ReferenceResult, KiraError> {
        let reference = fetch_kegg_reference(&self.kegg)?;
        let path = save_csv(&reference, self.paths.out_csv.as_std_path(), "kegg_reference")?;
        Ok(ReferenceResult {
            modules: reference.len(),
            path: path.display().to_string(),
        })
    }
}
