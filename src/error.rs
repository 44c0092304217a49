use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("no files matching '{pattern}' found in {dir}")]
    NoInputFiles { pattern: String, dir: PathBuf },

    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("no valid annotation files could be read")]
    NoValidAnnotations,

    #[error("{file}: header is missing required columns {columns:?}")]
    MissingAnnotationColumns { file: PathBuf, columns: Vec<String> },

    #[error("cannot derive a sample id from file name: {0}")]
    InvalidSampleId(String),

    #[error("metadata must have columns 'NCBI_accession' and 'study_condition' (missing: {missing:?})")]
    MetadataColumns { missing: Vec<String> },

    #[error("failed to read metadata at {0}")]
    MetadataRead(PathBuf),

    #[error("KEGG request failed: {0}")]
    KeggHttp(String),

    #[error("KEGG returned status {status}: {message}")]
    KeggStatus { status: u16, message: String },

    #[error("malformed KEGG module list: {0}")]
    KeggParse(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("plot rendering failed: {0}")]
    Plot(String),

    #[error("count matrix is empty")]
    EmptyMatrix,

    #[error("no sample is present in both the count matrix and the metadata")]
    NoSharedSamples,
}

impl From<csv::Error> for KiraError {
    fn from(err: csv::Error) -> Self {
        KiraError::Csv(err.to_string())
    }
}
