//! Job Validation
//!
//! Checks a parsed job before it is planned:
//! - The job has at least one step
//! - Step names are non-empty and unique
//! - Each step has exactly one non-empty `command` or `query`
//! - Matrix argument names can be written as `:name` placeholders

use std::collections::HashSet;

use log::{debug, info, warn};

use super::error::JobError;
use super::model::{Job, Step, StepKind};

/// Validates a single step's fields.
fn validate_step(step: &Step) -> Result<(), JobError> {
    if step.name.trim().is_empty() {
        return Err(JobError::InvalidStep {
            step: step.name.clone(),
            reason: "step has empty or whitespace-only name".to_string(),
        });
    }

    let (StepKind::Shell(body) | StepKind::Query(body)) = step.require_kind()?;

    if body.trim().is_empty() {
        return Err(JobError::InvalidStep {
            step: step.name.clone(),
            reason: "step body is empty".to_string(),
        });
    }

    Ok(())
}

/// Validates the entire job structure.
pub fn validate_job(job: &Job) -> Result<(), JobError> {
    info!("Validating job '{}' with {} steps", job.name, job.steps.len());

    if job.steps.is_empty() {
        return Err(JobError::EmptyJob);
    }

    job.matrix.validate().map_err(JobError::InvalidMatrix)?;

    let mut seen = HashSet::new();
    for step in &job.steps {
        validate_step(step)?;
        if !seen.insert(step.name.as_str()) {
            return Err(JobError::DuplicateStep(step.name.clone()));
        }
        debug!("Step '{}' is valid", step.name);
    }

    if job.matrix.instance_count() == 0 {
        warn!("Job '{}' has an empty matrix argument, no step will run", job.name);
    }

    Ok(())
}
