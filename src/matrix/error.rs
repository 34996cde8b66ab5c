//! Errors raised for matrix argument names and query rendering.

use thiserror::Error;

/// Placeholder rewriting failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// The template names an argument the binding does not carry.
    #[error("placeholder ':{name}' is not bound by the instance arguments")]
    UnboundPlaceholder { name: String },

    /// The template names an unbound argument that extends a bound one,
    /// e.g. `:xy` while only `x` is bound.
    #[error("placeholder ':{placeholder}' is not bound but collides with bound argument '{bound}'")]
    AmbiguousPlaceholder { placeholder: String, bound: String },

    /// An argument name that cannot be written as a placeholder.
    #[error("argument name '{name}' must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidArgumentName { name: String },
}
