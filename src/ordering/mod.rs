//! Total orders used to pick the authoritative grant.
//!
//! Three comparators, composed: [`ContextSpecificity`] ranks evaluation
//! contexts by how constrained they are, [`GrantPriority`] ranks grants of
//! equal specificity by declared priority, and [`GrantOrder`] chains the
//! two into the single order resolution uses.
//!
//! Every comparator is a plain stateless value with `normal()` and
//! `reverse()` constructors; the reverse variant is always the sign flip
//! of the normal comparison, never a second implementation.

mod context;
mod grant;
mod resolution;

pub use context::ContextSpecificity;
pub use grant::GrantPriority;
pub use resolution::GrantOrder;

/// Direction applied to a base comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Normal,
    Reversed,
}

impl Direction {
    pub(crate) fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Normal => ordering,
            Self::Reversed => ordering.reverse(),
        }
    }
}
