use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::error::KiraError;

pub const INPUT_DIR_VAR: &str = "INPUT_DIR";
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";
pub const DEFAULT_ANALYSIS_NAME: &str = "02_deseq_study";

/// Values given on the command line take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub repo_root: Option<Utf8PathBuf>,
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub analysis_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPaths {
    pub repo_root: Utf8PathBuf,
    pub raw_dir: Utf8PathBuf,
    pub meta_path: Utf8PathBuf,
    pub out_root: Utf8PathBuf,
    pub out_csv: Utf8PathBuf,
    pub out_plots: Utf8PathBuf,
}

impl ProjectPaths {
    pub fn new(
        repo_root: &Utf8Path,
        input_dir: &str,
        output_dir: &str,
        analysis_name: &str,
    ) -> Self {
        let input = repo_root.join(input_dir);
        let out_root = repo_root.join(output_dir).join(analysis_name);
        Self {
            repo_root: repo_root.to_path_buf(),
            raw_dir: input.join("raw").join("functional_annotation"),
            meta_path: input.join("metadata").join("metadata.csv"),
            out_csv: out_root.join("csv"),
            out_plots: out_root.join("plots"),
            out_root,
        }
    }

    pub fn ensure_dirs(&self) -> Result<(), KiraError> {
        for dir in [&self.out_root, &self.out_csv, &self.out_plots] {
            fs::create_dir_all(dir)
                .map_err(|err| KiraError::Filesystem(format!("create {dir}: {err}")))?;
        }
        Ok(())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `<repo_root>/.env` (if any) and resolve the project layout.
    pub fn resolve(overrides: PathOverrides) -> Result<ProjectPaths, KiraError> {
        let repo_root = match overrides.repo_root {
            Some(root) => root,
            None => current_dir()?,
        };
        dotenvy::from_path(repo_root.join(".env")).ok();

        let input_dir = overrides
            .input_dir
            .or_else(|| env_var(INPUT_DIR_VAR))
            .ok_or_else(|| KiraError::MissingEnv(INPUT_DIR_VAR.to_string()))?;
        let output_dir = overrides
            .output_dir
            .or_else(|| env_var(OUTPUT_DIR_VAR))
            .ok_or_else(|| KiraError::MissingEnv(OUTPUT_DIR_VAR.to_string()))?;
        let analysis_name = overrides
            .analysis_name
            .unwrap_or_else(|| DEFAULT_ANALYSIS_NAME.to_string());

        Ok(ProjectPaths::new(
            &repo_root,
            &input_dir,
            &output_dir,
            &analysis_name,
        ))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn current_dir() -> Result<Utf8PathBuf, KiraError> {
    let cwd = std::env::current_dir().map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|_| KiraError::Filesystem("invalid working directory path".to_string()))
}
