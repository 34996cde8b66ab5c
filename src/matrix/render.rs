//! Instance Rendering
//!
//! Hands an instance to a step in one of two forms:
//! - Shell steps get `PGQ_INSTANCE_<NAME>=<value>` environment assignments
//! - Query steps get their `:name` placeholders rewritten into numbered
//!   `$1, $2, ...` placeholders plus the matching positional arguments
//!
//! # Placeholder Syntax
//!
//! A placeholder is a colon followed by an identifier
//! (`[A-Za-z_][A-Za-z0-9_]*`), matched up to the end of the identifier, so
//! `:x` never matches inside `:xy`. Argument names must follow the same
//! grammar. The scanner leaves alone:
//! - `::` casts
//! - single-quoted literals and double-quoted identifiers (doubled quotes escape)
//! - `--` line comments and `/* */` block comments (nested)
//!
//! Array slices with identifier bounds (`arr[lo:hi]`) read as a placeholder
//! `:hi`; write them with spaces (`arr[lo : hi]`) or with a bound argument.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use log::debug;
use serde::Serialize;

use super::args::InstanceArguments;
use super::error::MatrixError;

/// Prefix of every environment variable set for a shell step instance.
pub const MATRIX_INSTANCE_PREFIX: &str = "PGQ_INSTANCE";

/// A query with numbered placeholders and its positional arguments.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Query text using `$1, $2, ...`
    pub query: String,
    /// Value for `$n` at index `n - 1`
    pub args: Vec<String>,
}

/// A placeholder occurrence inside a query template.
#[derive(Debug)]
struct Placeholder<'a> {
    name: &'a str,
    /// Byte range of `:name`, colon included
    span: Range<usize>,
}

impl InstanceArguments {
    /// Renders the binding as `PGQ_INSTANCE_<NAME>=<value>` strings in key order.
    ///
    /// Values are passed through verbatim.
    pub fn as_env(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("{}={}", env_var_name(key), value))
            .collect()
    }

    /// Rewrites the `:name` placeholders of `query` into numbered ones.
    ///
    /// Bound names that appear in the query are numbered in key order; all
    /// occurrences of a name share its number. Bound names absent from the
    /// query contribute nothing.
    ///
    /// # Errors
    ///
    /// * [`MatrixError::AmbiguousPlaceholder`] - an unbound placeholder starts
    ///   with a bound name (`:xy` while only `x` is bound)
    /// * [`MatrixError::UnboundPlaceholder`] - any other unbound placeholder
    ///
    /// # Example
    ///
    /// ```
    /// use stepmatrix::matrix::InstanceArguments;
    ///
    /// let args: InstanceArguments = [("x", "1"), ("y", "3")].into_iter().collect();
    /// let parsed = args.parse_query("select f(:x, :y)").unwrap();
    ///
    /// assert_eq!(parsed.query, "select f($1, $2)");
    /// assert_eq!(parsed.args, vec!["1", "3"]);
    /// ```
    pub fn parse_query(&self, query: &str) -> Result<ParsedQuery, MatrixError> {
        if let Some((name, _)) = self.iter().find(|(key, _)| !is_valid_arg_name(key)) {
            return Err(MatrixError::InvalidArgumentName {
                name: name.to_string(),
            });
        }

        let placeholders = scan_placeholders(query);

        for placeholder in &placeholders {
            if !self.contains_key(placeholder.name) {
                return Err(self.unbound_error(placeholder.name));
            }
        }

        let used: BTreeSet<&str> = placeholders.iter().map(|p| p.name).collect();
        let mut numbers = BTreeMap::new();
        let mut args = Vec::with_capacity(used.len());

        for (key, value) in self.iter().filter(|(key, _)| used.contains(key)) {
            args.push(value.to_string());
            numbers.insert(key, args.len());
            debug!("Bound ':{}' to ${} = {}", key, args.len(), value);
        }

        let mut parsed = String::with_capacity(query.len());
        let mut last = 0;
        for placeholder in &placeholders {
            parsed.push_str(&query[last..placeholder.span.start]);
            parsed.push('$');
            parsed.push_str(&numbers[placeholder.name].to_string());
            last = placeholder.span.end;
        }
        parsed.push_str(&query[last..]);

        Ok(ParsedQuery { query: parsed, args })
    }

    /// Picks the error for an unbound placeholder, preferring the longest
    /// bound name it could have been mistaken for.
    fn unbound_error(&self, name: &str) -> MatrixError {
        let collision = self
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !key.is_empty() && name.starts_with(key))
            .max_by_key(|key| key.len());

        match collision {
            Some(bound) => MatrixError::AmbiguousPlaceholder {
                placeholder: name.to_string(),
                bound: bound.to_string(),
            },
            None => MatrixError::UnboundPlaceholder {
                name: name.to_string(),
            },
        }
    }
}

/// Environment variable name for a matrix argument.
pub fn env_var_name(arg_name: &str) -> String {
    format!("{}_{}", MATRIX_INSTANCE_PREFIX, arg_name.to_uppercase())
}

/// Returns true if `name` can be written as a `:name` placeholder.
pub fn is_valid_arg_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes.next().is_some_and(is_ident_start) && bytes.all(is_ident_continue)
}

/// Finds every `:name` placeholder in template order.
fn scan_placeholders(query: &str) -> Vec<Placeholder<'_>> {
    let bytes = query.as_bytes();
    let mut placeholders = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_quoted(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b':' if bytes.get(i + 1) == Some(&b':') => {
                // Cast: skip both colons
                i += 2;
            }
            b':' if bytes.get(i + 1).is_some_and(|&b| is_ident_start(b)) => {
                let start = i;
                let mut end = i + 2;
                while end < bytes.len() && is_ident_continue(bytes[end]) {
                    end += 1;
                }
                placeholders.push(Placeholder {
                    name: &query[start + 1..end],
                    span: start..end,
                });
                i = end;
            }
            _ => i += 1,
        }
    }

    placeholders
}

/// Skips a `'...'` or `"..."` span starting at `start`; a doubled quote
/// stays inside the span. Returns the index after the closing quote.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Skips `--` up to and including the end of the line.
fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset + 1)
}

/// Skips a `/* */` comment, honouring nested comments.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0;
    let mut i = start;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(&b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(&b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
