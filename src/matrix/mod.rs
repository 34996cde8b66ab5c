//! Matrix Argument Expansion
//!
//! Turns a set of named value lists into the concrete argument bindings a
//! job step runs with, one binding per combination.
//!
//! # Structure
//!
//! - [`args`]: Data structures (MatrixArgs, InstanceArguments, Instances) and explosion
//! - [`render`]: Environment and query-placeholder rendering of a binding
//! - [`error`]: Rendering errors

pub mod args;
pub mod error;
pub mod render;

pub use args::{InstanceArguments, Instances, MatrixArgValues, MatrixArgs};
pub use error::MatrixError;
pub use render::{env_var_name, ParsedQuery, MATRIX_INSTANCE_PREFIX};
