//! Job Parser
//!
//! Loads job definitions from YAML files.

use std::fs;
use std::path::Path;

use log::{debug, info};

use super::error::JobError;
use super::model::Job;
use super::validator::validate_job;

/// Parses and validates a job from YAML text.
pub fn parse_job(yaml_content: &str) -> Result<Job, JobError> {
    let job: Job = serde_yaml::from_str(yaml_content)?;

    info!(
        "Parsed job '{}': {} steps, {} matrix arguments",
        job.name,
        job.steps.len(),
        job.matrix.len()
    );

    validate_job(&job)?;
    Ok(job)
}

/// Loads a job from a YAML file.
///
/// When the file does not name the job, the file stem is used.
///
/// # Example
///
/// ```rust,no_run
/// use stepmatrix::job::load_job;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let job = load_job("nightly.yaml")?;
///     println!("Loaded {} steps", job.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_job(path: impl AsRef<Path>) -> Result<Job, JobError> {
    let path = path.as_ref();
    info!("Loading job from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|source| JobError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let mut job = parse_job(&yaml_content)?;
    if job.name.trim().is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            job.name = stem.to_string();
        }
    }

    Ok(job)
}
