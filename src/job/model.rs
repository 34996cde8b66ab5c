//! Job Data Model
//!
//! A job is a list of steps run once per matrix instance.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: nightly_maintenance
//! matrix:
//!   schema: [public, audit]
//!   day: [mon, tue]
//! steps:
//!   - name: vacuum
//!     query: select maintenance.vacuum(:schema, :day)
//!
//!   - name: report
//!     command: ./report.sh "$PGQ_INSTANCE_SCHEMA" "$PGQ_INSTANCE_DAY"
//! ```

use serde::{Deserialize, Serialize};

use super::error::JobError;
use crate::matrix::MatrixArgs;

/// A single step of a job.
///
/// Exactly one of `command` and `query` must be set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Step {
    /// Unique name within the job
    pub name: String,

    /// Shell script, run with the instance as environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// SQL template with `:name` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// What a step runs, borrowed from the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    Shell(&'a str),
    Query(&'a str),
}

impl Step {
    /// Creates a shell step.
    ///
    /// # Example
    ///
    /// ```
    /// use stepmatrix::job::{Step, StepKind};
    ///
    /// let step = Step::shell("report", "./report.sh");
    /// assert_eq!(step.kind(), Some(StepKind::Shell("./report.sh")));
    /// ```
    pub fn shell(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            command: Some(command.into()),
            query: None,
        }
    }

    /// Creates a query step.
    pub fn query(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            command: None,
            query: Some(query.into()),
        }
    }

    /// Returns the step body, or `None` unless exactly one of
    /// `command`/`query` is set.
    pub fn kind(&self) -> Option<StepKind<'_>> {
        match (&self.command, &self.query) {
            (Some(command), None) => Some(StepKind::Shell(command)),
            (None, Some(query)) => Some(StepKind::Query(query)),
            _ => None,
        }
    }

    /// Like [`Step::kind`], but a step without exactly one body is an error.
    pub fn require_kind(&self) -> Result<StepKind<'_>, JobError> {
        self.kind().ok_or_else(|| JobError::InvalidStep {
            step: self.name.clone(),
            reason: "exactly one of 'command' or 'query' must be set".to_string(),
        })
    }
}

/// A complete job definition.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Job {
    /// Job name, used in logs
    #[serde(default)]
    pub name: String,

    /// Matrix arguments; every step runs once per instance
    #[serde(default, skip_serializing_if = "MatrixArgs::is_empty")]
    pub matrix: MatrixArgs,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_matrix(mut self, matrix: MatrixArgs) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Gets a step by name.
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Returns the number of steps in the job.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the job has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
