//! Specificity order over evaluation contexts.

use std::cmp::Ordering;

use crate::context::EvaluationContext;

use super::Direction;

/// A strict total order over [`EvaluationContext`] values by specificity.
///
/// Under the normal order a context imposing more constraints compares
/// greater ("wins"): pair count is the primary key, so a strict superset
/// always outranks its subset, and the empty context ranks below
/// everything else. Equal-count contexts fall back to pair-wise
/// lexicographic comparison, making the order total and transitive;
/// equal sets compare equal.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use precedence::{ContextSpecificity, EvaluationContext};
///
/// let specific = EvaluationContext::single("server", "a").unwrap();
/// let global = EvaluationContext::empty();
///
/// let order = ContextSpecificity::normal();
/// assert_eq!(order.compare(&specific, &global), Ordering::Greater);
/// assert_eq!(ContextSpecificity::reverse().compare(&specific, &global), Ordering::Less);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSpecificity {
    direction: Direction,
}

impl ContextSpecificity {
    /// More-specific-first order: greater means more specific.
    #[must_use]
    pub const fn normal() -> Self {
        Self {
            direction: Direction::Normal,
        }
    }

    /// The mirror of [`ContextSpecificity::normal`].
    #[must_use]
    pub const fn reverse() -> Self {
        Self {
            direction: Direction::Reversed,
        }
    }

    /// Compares two contexts by specificity.
    #[must_use]
    pub fn compare(&self, a: &EvaluationContext, b: &EvaluationContext) -> Ordering {
        self.direction.apply(compare_specificity(a, b))
    }
}

/// The single base comparison both directions derive from.
fn compare_specificity(a: &EvaluationContext, b: &EvaluationContext) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.cmp(b))
}
