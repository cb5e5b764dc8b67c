//! Request-driven filter composition
//!
//! Listings declare which request parameters they recognize and how each one
//! matches. [`FilterBuilder`] turns a request's parameters into an immutable
//! [`FilterSpec`]; undeclared parameters never reach the storage engine.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// How a recognized parameter is matched against a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Value equality
    Exact,
    /// Case-sensitive "contains", like wrapping the value in wildcards
    Substring,
}

impl MatcherKind {
    pub fn matcher(&self, value: &str) -> Matcher {
        match self {
            MatcherKind::Exact => Matcher::Exact(Value::String(value.to_string())),
            MatcherKind::Substring => Matcher::Substring(value.to_string()),
        }
    }
}

/// A single field-level match condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Matcher {
    Exact(Value),
    Substring(String),
}

impl Matcher {
    /// Whether a field value satisfies this matcher (absent fields never match)
    pub fn matches(&self, field: Option<&Value>) -> bool {
        let Some(field) = field else {
            return false;
        };

        match self {
            Matcher::Exact(expected) => exact_candidates(expected)
                .iter()
                .any(|candidate| same_value(field, candidate)),
            Matcher::Substring(pattern) => {
                scalar_text(field).is_some_and(|text| text.contains(pattern.as_str()))
            }
        }
    }
}

/// Values an exact matcher accepts
///
/// Request parameters are always text, so a string also stands for the number
/// or boolean it parses to: `"42"` accepts a stored `42`. Storage backends
/// must accept exactly this set.
pub fn exact_candidates(expected: &Value) -> Vec<Value> {
    let mut candidates = vec![expected.clone()];
    let Value::String(text) = expected else {
        return candidates;
    };

    if let Ok(n) = text.parse::<i64>() {
        candidates.push(Value::from(n));
    } else if let Some(n) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        candidates.push(Value::Number(n));
    }
    if let Ok(b) = text.parse::<bool>() {
        candidates.push(Value::Bool(b));
    }
    candidates
}

/// Equality with numbers compared by value, so 42 equals 42.0
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Conjunction of field matchers; empty matches every record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterSpec {
    clauses: BTreeMap<String, Matcher>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new spec with `field` constrained by `matcher`
    pub fn with(mut self, field: impl Into<String>, matcher: Matcher) -> Self {
        self.clauses.insert(field.into(), matcher);
        self
    }

    pub fn exact(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Matcher::Exact(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn get(&self, field: &str) -> Option<&Matcher> {
        self.clauses.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluate against a field accessor; all clauses must hold
    pub fn matches_with<F>(&self, field: F) -> bool
    where
        F: Fn(&str) -> Option<Value>,
    {
        self.clauses
            .iter()
            .all(|(name, matcher)| matcher.matches(field(name).as_ref()))
    }
}

/// Declared schema of the request parameters a listing understands
#[derive(Debug, Clone, Default)]
pub struct RecognizedParams {
    params: Vec<(String, MatcherKind)>,
}

impl RecognizedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exact(mut self, name: &str) -> Self {
        self.params.push((name.to_string(), MatcherKind::Exact));
        self
    }

    pub fn substring(mut self, name: &str) -> Self {
        self.params.push((name.to_string(), MatcherKind::Substring));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MatcherKind)> {
        self.params.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Builds a [`FilterSpec`] from request parameters
pub struct FilterBuilder;

impl FilterBuilder {
    /// Add a clause for every recognized parameter with a non-empty value
    pub fn build(recognized: &RecognizedParams, request: &HashMap<String, String>) -> FilterSpec {
        recognized
            .iter()
            .fold(FilterSpec::new(), |spec, (name, kind)| {
                match request.get(name).filter(|value| !value.is_empty()) {
                    Some(value) => spec.with(name, kind.matcher(value)),
                    None => spec,
                }
            })
    }
}
