//! Matrix Arguments and Instance Explosion
//!
//! A job declares matrix arguments: named lists of candidate values. The
//! Cartesian product of those lists gives the instances, one concrete
//! argument binding per run of every step.
//!
//! # Example YAML Format
//!
//! ```yaml
//! matrix:
//!   x: ["1", "2"]
//!   y: ["3", "4"]
//! ```
//!
//! Values are strings and must be written as YAML strings: unquoted numbers
//! or booleans are rejected, since their parsed form may not match the text
//! (`1.10`, `0x1F`). A single string stands for a one-element list.
//!
//! Explodes into four instances:
//!
//! ```text
//! { 'x': 1,'y': 3 }
//! { 'x': 2,'y': 3 }
//! { 'x': 1,'y': 4 }
//! { 'x': 2,'y': 4 }
//! ```
//!
//! Argument names are folded in ascending order and, for each argument,
//! every candidate value is combined with every binding collected so far.
//! The argument folded last therefore changes slowest.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use log::{debug, warn};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::error::MatrixError;
use super::render::is_valid_arg_name;

/// All the values one matrix argument can take, in declaration order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MatrixArgValues(Vec<String>);

impl<'de> Deserialize<'de> for MatrixArgValues {
    /// Accepts either a single string or a list of strings.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = Value::deserialize(deserializer)?;
        let values = match val {
            Value::String(s) => vec![s],
            Value::Sequence(seq) => seq
                .into_iter()
                .map(string_value::<D::Error>)
                .collect::<Result<_, _>>()?,
            Value::Null => {
                return Err(de::Error::custom(
                    "Matrix argument has no value; use [] for an empty list",
                ))
            }
            other => vec![string_value::<D::Error>(other)?],
        };
        Ok(Self(values))
    }
}

/// Unwraps a string matrix value; other scalars must be quoted.
fn string_value<E: de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(_) | Value::Bool(_) => Err(E::custom(
            "Matrix values must be quoted strings (e.g. \"1.10\")",
        )),
        _ => Err(E::custom("Expected string matrix value")),
    }
}

impl MatrixArgValues {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Combines every value of this argument with every collected binding.
    ///
    /// Values form the outer loop, so the result holds `collected` once per
    /// value, each copy carrying that value under `key`. Each produced
    /// binding is an independent clone.
    pub fn explode(&self, key: &str, collected: &[InstanceArguments]) -> Vec<InstanceArguments> {
        let mut exploded = Vec::with_capacity(self.len() * collected.len());
        for value in &self.0 {
            for instance in collected {
                let mut instance = instance.clone();
                instance.insert(key, value.as_str());
                exploded.push(instance);
            }
        }
        exploded
    }
}

impl<S: Into<String>> FromIterator<S> for MatrixArgValues {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a MatrixArgValues {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Named matrix arguments, kept sorted by name.
///
/// Names are prefixed and uppercased when handed to shell steps, and turned
/// into numbered placeholders for query steps.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MatrixArgs(BTreeMap<String, MatrixArgValues>);

impl MatrixArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an argument.
    ///
    /// # Example
    ///
    /// ```
    /// use stepmatrix::matrix::MatrixArgs;
    ///
    /// let matrix = MatrixArgs::new()
    ///     .with_arg("x", ["1", "2"])
    ///     .with_arg("y", ["3"]);
    /// assert_eq!(matrix.len(), 2);
    /// ```
    pub fn with_arg<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, values.into_iter().collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: MatrixArgValues) {
        self.0.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&MatrixArgValues> {
        self.0.get(name)
    }

    /// Argument names in folding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that every argument name can be written as a `:name`
    /// placeholder.
    pub fn validate(&self) -> Result<(), MatrixError> {
        match self.names().find(|name| !is_valid_arg_name(name)) {
            Some(name) => Err(MatrixError::InvalidArgumentName {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Number of instances `instances()` produces: the product of all list
    /// lengths, 1 for no arguments and 0 when any list is empty.
    pub fn instance_count(&self) -> usize {
        self.0.values().map(MatrixArgValues::len).product()
    }

    /// Explodes the matrix into its instances.
    ///
    /// With no arguments the result is a single empty binding, so a job
    /// without a matrix still runs its steps once. Any empty value list
    /// yields no instances at all.
    ///
    /// # Example
    ///
    /// ```
    /// use stepmatrix::matrix::MatrixArgs;
    ///
    /// let matrix = MatrixArgs::new()
    ///     .with_arg("x", ["1", "2"])
    ///     .with_arg("y", ["3", "4"]);
    ///
    /// let instances = matrix.instances();
    /// assert_eq!(instances.len(), 4);
    /// assert_eq!(instances[1].get("x"), Some("2"));
    /// assert_eq!(instances[1].get("y"), Some("3"));
    /// ```
    pub fn instances(&self) -> Instances {
        let mut collected = vec![InstanceArguments::new()];

        for (name, values) in &self.0 {
            if values.is_empty() {
                warn!("Matrix argument '{}' has no values, no instances will run", name);
            }
            collected = values.explode(name, &collected);
            debug!(
                "Folded matrix argument '{}' ({} values): {} instances",
                name,
                values.len(),
                collected.len()
            );
        }

        Instances(collected)
    }
}

impl<N, I, S> FromIterator<(N, I)> for MatrixArgs
where
    N: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |matrix, (name, values)| matrix.with_arg(name, values))
    }
}

/// One concrete binding: every matrix argument mapped to a single value.
///
/// Handed to exactly one step instance.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct InstanceArguments(BTreeMap<String, String>);

impl InstanceArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key/value pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InstanceArguments {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for InstanceArguments {
    /// Renders `{ 'k1': v1,'k2': v2 }` with single quotes doubled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| {
                format!("'{}': {}", key.replace('\'', "''"), value.replace('\'', "''"))
            })
            .collect();
        write!(f, "{{ {} }}", pairs.join(","))
    }
}

/// The ordered set of bindings a step runs with, one run per element.
///
/// Instances may run in parallel; each binding is owned independently.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Instances(Vec<InstanceArguments>);

impl Instances {
    pub fn into_vec(self) -> Vec<InstanceArguments> {
        self.0
    }
}

impl Deref for Instances {
    type Target = [InstanceArguments];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<InstanceArguments>> for Instances {
    fn from(instances: Vec<InstanceArguments>) -> Self {
        Self(instances)
    }
}

impl IntoIterator for Instances {
    type Item = InstanceArguments;
    type IntoIter = std::vec::IntoIter<InstanceArguments>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Instances {
    type Item = &'a InstanceArguments;
    type IntoIter = std::slice::Iter<'a, InstanceArguments>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Instances {
    /// Renders `[ b1, b2 ]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[ {} ]", bindings.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(pairs: &[(&str, &str)]) -> InstanceArguments {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_instances_product_order() {
        let matrix = MatrixArgs::new()
            .with_arg("x", ["1", "2"])
            .with_arg("y", ["3", "4"]);

        let instances = matrix.instances();
        assert_eq!(
            instances.into_vec(),
            vec![
                binding(&[("x", "1"), ("y", "3")]),
                binding(&[("x", "2"), ("y", "3")]),
                binding(&[("x", "1"), ("y", "4")]),
                binding(&[("x", "2"), ("y", "4")]),
            ]
        );
    }

    #[test]
    fn test_names_folded_in_sorted_order() {
        // Insertion order must not matter
        let a = MatrixArgs::new().with_arg("b", ["1", "2"]).with_arg("a", ["x", "y"]);
        let b = MatrixArgs::new().with_arg("a", ["x", "y"]).with_arg("b", ["1", "2"]);
        assert_eq!(a.instances(), b.instances());
        assert_eq!(a.names().collect::<Vec<_>>(), vec!["a", "b"]);
        // "b" is folded last so it changes slowest
        assert_eq!(a.instances()[1], binding(&[("a", "y"), ("b", "1")]));
    }

    #[test]
    fn test_instance_count_and_completeness() {
        let matrix = MatrixArgs::new()
            .with_arg("a", ["1", "2"])
            .with_arg("b", ["1", "2", "3"])
            .with_arg("c", ["1", "2", "3", "4"]);

        let instances = matrix.instances();
        assert_eq!(instances.len(), 24);
        assert_eq!(matrix.instance_count(), 24);
        assert!(instances.iter().all(|i| i.len() == 3));
        assert!(instances
            .iter()
            .all(|i| i.contains_key("a") && i.contains_key("b") && i.contains_key("c")));
    }

    #[test]
    fn test_value_frequencies() {
        let matrix = MatrixArgs::new()
            .with_arg("a", ["p", "q"])
            .with_arg("b", ["r", "s", "t"]);
        let instances = matrix.instances();

        for value in ["p", "q"] {
            let n = instances.iter().filter(|i| i.get("a") == Some(value)).count();
            assert_eq!(n, 3);
        }
        for value in ["r", "s", "t"] {
            let n = instances.iter().filter(|i| i.get("b") == Some(value)).count();
            assert_eq!(n, 2);
        }
    }

    #[test]
    fn test_all_combinations_distinct() {
        let matrix = MatrixArgs::new()
            .with_arg("a", ["1", "2", "3"])
            .with_arg("b", ["1", "2", "3"]);
        let instances = matrix.instances();
        let unique: std::collections::HashSet<_> = instances.iter().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_empty_matrix_yields_single_empty_instance() {
        let instances = MatrixArgs::new().instances();
        assert_eq!(instances.len(), 1);
        assert!(instances[0].is_empty());
        assert_eq!(MatrixArgs::new().instance_count(), 1);
    }

    #[test]
    fn test_empty_first_list_yields_nothing() {
        let matrix = MatrixArgs::new()
            .with_arg("a", Vec::<String>::new())
            .with_arg("b", ["1", "2"]);
        assert!(matrix.instances().is_empty());
        assert_eq!(matrix.instance_count(), 0);
    }

    #[test]
    fn test_empty_later_list_yields_nothing() {
        let matrix = MatrixArgs::new()
            .with_arg("a", ["1", "2"])
            .with_arg("b", Vec::<String>::new());
        assert!(matrix.instances().is_empty());
    }

    #[test]
    fn test_single_argument_seeds_in_value_order() {
        let matrix = MatrixArgs::new().with_arg("day", ["mon", "tue", "wed"]);
        let days: Vec<_> = matrix
            .instances()
            .iter()
            .map(|i| i.get("day").unwrap().to_string())
            .collect();
        assert_eq!(days, vec!["mon", "tue", "wed"]);
    }

    #[test]
    fn test_explode_values_outer_loop() {
        let collected = vec![binding(&[("a", "1")]), binding(&[("a", "2")])];
        let values: MatrixArgValues = ["x", "y"].into_iter().collect();

        let exploded = values.explode("b", &collected);
        assert_eq!(
            exploded,
            vec![
                binding(&[("a", "1"), ("b", "x")]),
                binding(&[("a", "2"), ("b", "x")]),
                binding(&[("a", "1"), ("b", "y")]),
                binding(&[("a", "2"), ("b", "y")]),
            ]
        );
        // Source bindings untouched
        assert!(collected.iter().all(|i| !i.contains_key("b")));
    }

    #[test]
    fn test_clone_does_not_alias() {
        let original = binding(&[("x", "1")]);
        let mut copy = original.clone();
        copy.insert("x", "2");
        copy.insert("y", "3");

        assert_eq!(original.get("x"), Some("1"));
        assert!(!original.contains_key("y"));
        assert_eq!(copy.get("x"), Some("2"));
    }

    #[test]
    fn test_instance_display() {
        let args = binding(&[("x", "1"), ("y", "3")]);
        assert_eq!(args.to_string(), "{ 'x': 1,'y': 3 }");
    }

    #[test]
    fn test_instance_display_escapes_quotes() {
        let args = binding(&[("it's", "o'clock")]);
        assert_eq!(args.to_string(), "{ 'it''s': o''clock }");
    }

    #[test]
    fn test_instance_display_empty() {
        assert_eq!(InstanceArguments::new().to_string(), "{  }");
    }

    #[test]
    fn test_instances_display() {
        let instances = MatrixArgs::new().with_arg("x", ["1", "2"]).instances();
        assert_eq!(instances.to_string(), "[ { 'x': 1 }, { 'x': 2 } ]");
        assert_eq!(Instances::default().to_string(), "[  ]");
    }

    #[test]
    fn test_deserialize_strings_and_lists() {
        let yaml = "x: [\"1.10\", \"007\", \"0x1F\"]\ny: single\nz: []\n";
        let matrix: MatrixArgs = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            matrix.get("x").unwrap().iter().collect::<Vec<_>>(),
            vec!["1.10", "007", "0x1F"]
        );
        assert_eq!(matrix.get("y").unwrap().iter().collect::<Vec<_>>(), vec!["single"]);
        assert!(matrix.get("z").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_rejects_unquoted_numbers() {
        for yaml in ["x: [1.10]", "x: 0x1F", "x: [007, 1e3]", "x: [true]"] {
            let result: Result<MatrixArgs, _> = serde_yaml::from_str(yaml);
            assert!(result.is_err(), "{} should be rejected", yaml);
        }
    }

    #[test]
    fn test_deserialize_rejects_null_argument() {
        let result: Result<MatrixArgs, _> = serde_yaml::from_str("x:\ny: [\"1\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_argument_names() {
        let matrix = MatrixArgs::new().with_arg("from_day", ["mon"]);
        assert!(matrix.validate().is_ok());

        let matrix = matrix.with_arg("my-arg", ["1"]);
        assert_eq!(
            matrix.validate(),
            Err(MatrixError::InvalidArgumentName {
                name: "my-arg".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_nested_values() {
        let yaml = "x:\n  - [1, 2]\n";
        let result: Result<MatrixArgs, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_matrix_from_pairs() {
        let matrix: MatrixArgs = vec![("x", vec!["1", "2"]), ("y", vec!["3"])]
            .into_iter()
            .collect();
        assert_eq!(matrix.instance_count(), 2);
    }
}
