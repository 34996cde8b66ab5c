//! StepMatrix - Matrix Expansion for Job Steps
//!
//! Expands a job's matrix arguments into concrete instances and renders
//! each instance for the step that runs with it: environment variables
//! for shell steps, numbered placeholders and positional arguments for
//! SQL steps.
//!
//! # Architecture
//!
//! The library is organized into two modules:
//!
//! - [`matrix`]: Matrix arguments, instance explosion and rendering
//! - [`job`]: Job definitions, YAML loading and step planning
//!
//! # Example
//!
//! ```rust,no_run
//! use stepmatrix::{load_job, plan_job};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a job from YAML
//!     let job = load_job("nightly.yaml")?;
//!
//!     // Render every step for every matrix instance
//!     let plan = plan_job(&job)?;
//!     println!("{} step runs", plan.len());
//!     Ok(())
//! }
//! ```

pub mod job;
pub mod matrix;

// Re-export commonly used types
pub use job::{load_job, plan_job, Job, JobError, JobPlan, Step};
pub use matrix::{InstanceArguments, Instances, MatrixArgs, MatrixError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "StepMatrix";
