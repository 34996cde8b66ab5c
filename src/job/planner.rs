//! Job Planning
//!
//! Expands the job matrix once and renders every step for every instance:
//! shell steps get environment assignments, query steps get numbered
//! placeholders with positional arguments. Nothing is executed here; the
//! resulting plan is handed to whatever runs the steps.

use log::{debug, info};
use serde::Serialize;

use super::error::JobError;
use super::model::{Job, StepKind};
use crate::matrix::InstanceArguments;

/// What one step instance runs.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Shell script with `PGQ_INSTANCE_*` environment assignments
    Shell { command: String, env: Vec<String> },
    /// Query with numbered placeholders and positional arguments
    Query { query: String, args: Vec<String> },
}

/// One step run with one instance.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstance {
    /// Step name
    pub step: String,
    /// Position of the instance in the expanded matrix
    pub index: usize,
    /// The binding this run uses
    pub instance: InstanceArguments,
    pub action: Action,
}

/// All step instances of a job, grouped by step in declaration order.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    pub job: String,
    /// Instances per step
    pub instance_count: usize,
    pub runs: Vec<PlannedInstance>,
}

impl JobPlan {
    /// Total number of step runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Runs belonging to one step.
    pub fn runs_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a PlannedInstance> {
        self.runs.iter().filter(move |run| run.step == step)
    }
}

/// Plans every step of `job` against every matrix instance.
///
/// # Example
///
/// ```
/// use stepmatrix::job::{plan_job, Action, Job, Step};
/// use stepmatrix::matrix::MatrixArgs;
///
/// let job = Job::new("demo")
///     .with_matrix(MatrixArgs::new().with_arg("x", ["1", "2"]))
///     .with_step(Step::query("q", "select :x"));
///
/// let plan = plan_job(&job).unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!(
///     plan.runs[1].action,
///     Action::Query { query: "select $1".to_string(), args: vec!["2".to_string()] }
/// );
/// ```
pub fn plan_job(job: &Job) -> Result<JobPlan, JobError> {
    let instances = job.matrix.instances();
    info!(
        "Planning job '{}': {} steps x {} instances",
        job.name,
        job.steps.len(),
        instances.len()
    );

    let mut runs = Vec::with_capacity(job.steps.len() * instances.len());

    for step in &job.steps {
        let kind = step.require_kind()?;

        for (index, instance) in instances.iter().enumerate() {
            let action = match kind {
                StepKind::Shell(command) => Action::Shell {
                    command: command.to_string(),
                    env: instance.as_env(),
                },
                StepKind::Query(query) => {
                    let parsed = instance.parse_query(query).map_err(|source| JobError::Matrix {
                        step: step.name.clone(),
                        source,
                    })?;
                    Action::Query {
                        query: parsed.query,
                        args: parsed.args,
                    }
                }
            };

            debug!("Planned '{}' #{} with {}", step.name, index, instance);

            runs.push(PlannedInstance {
                step: step.name.clone(),
                index,
                instance: instance.clone(),
                action,
            });
        }
    }

    info!("Planned {} step runs", runs.len());

    Ok(JobPlan {
        job: job.name.clone(),
        instance_count: instances.len(),
        runs,
    })
}
