//! Evaluation contexts.
//!
//! An [`EvaluationContext`] is the immutable set of key/value pairs
//! describing the situation a check occurs in (server, world, custom keys).
//! Contexts are compared by *specificity*: a context imposing more
//! constraints outranks a less constrained one, and the empty context is
//! the least specific of all.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An immutable set of key/value pairs describing a check situation.
///
/// Backed by a sorted map so that iteration order, equality and the
/// specificity comparison are all deterministic.
///
/// # Examples
///
/// ```
/// use precedence::EvaluationContext;
///
/// let ctx = EvaluationContext::of([("server", "lobby"), ("world", "nether")]).unwrap();
/// assert_eq!(ctx.len(), 2);
/// assert!(ctx.contains("server", "lobby"));
/// assert!(EvaluationContext::empty().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EvaluationContext {
    pairs: BTreeMap<String, String>,
}

impl EvaluationContext {
    /// The empty context: applies everywhere, least specific.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            pairs: BTreeMap::new(),
        }
    }

    /// Builds a context from key/value pairs.
    ///
    /// Duplicate keys keep the last value.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyContextKey` if any key is empty.
    pub fn of<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ValidationError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            let k = k.into();
            if k.is_empty() {
                return Err(ValidationError::EmptyContextKey);
            }
            map.insert(k, v.into());
        }
        Ok(Self { pairs: map })
    }

    /// Single-pair convenience constructor.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyContextKey` if the key is empty.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Result<Self, ValidationError> {
        Self::of([(key.into(), value.into())])
    }

    /// Number of constraining pairs. The primary specificity metric.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if this is the empty (global) context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns true if this context contains the exact pair.
    #[must_use]
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.pairs.get(key).is_some_and(|v| v == value)
    }

    /// Returns the value bound to `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Returns true if every pair of this context is present in `other`.
    ///
    /// Used for context matching: a grant's context is satisfied when the
    /// situation it is checked under carries all of its constraints.
    #[must_use]
    pub fn is_satisfied_by(&self, other: &Self) -> bool {
        self.pairs
            .iter()
            .all(|(k, v)| other.contains(k, v))
    }

    /// Iterates the pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            return write!(f, "global");
        }
        let mut first = true;
        for (k, v) in &self.pairs {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}
