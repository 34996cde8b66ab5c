//! Job Definition Module
//!
//! Loads job definitions and plans their step instances.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Job, Step)
//! - [`parser`]: YAML loading
//! - [`validator`]: Structural checks on a parsed job
//! - [`planner`]: Rendering every step for every matrix instance
//! - [`error`]: Job errors

pub mod error;
pub mod model;
pub mod parser;
pub mod planner;
pub mod validator;

pub use error::JobError;
pub use model::{Job, Step, StepKind};
pub use parser::{load_job, parse_job};
pub use planner::{plan_job, Action, JobPlan, PlannedInstance};
pub use validator::validate_job;
