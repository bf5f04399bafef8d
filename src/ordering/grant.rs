//! Priority order over grants of equal context specificity.

use std::cmp::Ordering;

use crate::grant::Grant;

use super::Direction;

/// A strict total order over [`Grant`]s by declared priority.
///
/// Under the normal order a higher declared priority (the weight value
/// for weight grants, 0 for everything else) compares greater. Equal
/// priorities fall back to the grant's insertion sequence, earlier
/// declarations ranking higher — a deterministic, reproducible tie-break.
/// An arbitrary tie-break (say, by hash) would make resolution
/// non-deterministic across runs, so none is permitted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantPriority {
    direction: Direction,
}

impl GrantPriority {
    /// Highest-priority-first order.
    #[must_use]
    pub const fn normal() -> Self {
        Self {
            direction: Direction::Normal,
        }
    }

    /// The mirror of [`GrantPriority::normal`].
    #[must_use]
    pub const fn reverse() -> Self {
        Self {
            direction: Direction::Reversed,
        }
    }

    /// Compares two grants by declared priority, then insertion sequence.
    #[must_use]
    pub fn compare(&self, a: &Grant, b: &Grant) -> Ordering {
        self.direction.apply(compare_priority(a, b))
    }
}

/// The single base comparison both directions derive from.
fn compare_priority(a: &Grant, b: &Grant) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        // Earlier-declared grants rank higher among equal priorities.
        .then_with(|| b.sequence().cmp(&a.sequence()))
}
