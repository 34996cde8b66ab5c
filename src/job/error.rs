//! Job loading and planning errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::matrix::MatrixError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse job YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("job has no steps")]
    EmptyJob,

    #[error("duplicate step name: '{0}'")]
    DuplicateStep(String),

    #[error("step '{step}' is invalid: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("invalid matrix: {0}")]
    InvalidMatrix(#[source] MatrixError),

    #[error("step '{step}': {source}")]
    Matrix {
        step: String,
        #[source]
        source: MatrixError,
    },
}
