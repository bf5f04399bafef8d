//! The composed order used to rank simultaneously-applicable grants.

use std::cmp::Ordering;

use crate::grant::Grant;

use super::{ContextSpecificity, Direction, GrantPriority};

/// The order resolution actually uses: context specificity first, then
/// declared priority.
///
/// Structurally equal grants compare equal immediately, without consulting
/// either sub-order — cheaper, and it rules out asymmetric tie-break
/// artifacts on identical input. The winning grant for a check is the
/// maximum of the candidate set under the normal order; lowest-wins
/// semantics use [`GrantOrder::loser`] (or the reverse variant), both
/// derived from the same composition.
///
/// # Examples
///
/// ```
/// use precedence::{EvaluationContext, Grant, GrantKind, GrantOrder, GrantSet};
///
/// let mut set = GrantSet::new();
/// set.add(Grant::new(
///     GrantKind::Permission { node: "fly".into(), value: false },
///     EvaluationContext::empty(),
/// ).unwrap());
/// set.add(Grant::new(
///     GrantKind::Permission { node: "fly".into(), value: true },
///     EvaluationContext::single("server", "creative").unwrap(),
/// ).unwrap());
///
/// let winner = GrantOrder::normal().winner(set.iter()).unwrap();
/// assert!(!winner.context().is_empty()); // the contextual grant wins
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantOrder {
    contexts: ContextSpecificity,
    priorities: GrantPriority,
    direction: Direction,
}

impl GrantOrder {
    /// Winner-is-maximum order.
    #[must_use]
    pub const fn normal() -> Self {
        Self {
            contexts: ContextSpecificity::normal(),
            priorities: GrantPriority::normal(),
            direction: Direction::Normal,
        }
    }

    /// The mirror of [`GrantOrder::normal`].
    #[must_use]
    pub const fn reverse() -> Self {
        Self {
            contexts: ContextSpecificity::normal(),
            priorities: GrantPriority::normal(),
            direction: Direction::Reversed,
        }
    }

    /// Compares two grants: specificity, then priority.
    #[must_use]
    pub fn compare(&self, a: &Grant, b: &Grant) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }

        let base = self
            .contexts
            .compare(a.context(), b.context())
            .then_with(|| self.priorities.compare(a, b));
        self.direction.apply(base)
    }

    /// The maximum element: the authoritative grant under highest-wins
    /// semantics. Ties keep the first-encountered element, so the result
    /// is stable for any fixed candidate sequence.
    #[must_use]
    pub fn winner<'a>(&self, candidates: impl IntoIterator<Item = &'a Grant>) -> Option<&'a Grant> {
        candidates.into_iter().fold(None, |best, g| match best {
            None => Some(g),
            Some(b) if self.compare(g, b) == Ordering::Greater => Some(g),
            Some(b) => Some(b),
        })
    }

    /// The minimum element, for lowest-wins semantics. Ties keep the
    /// first-encountered element.
    #[must_use]
    pub fn loser<'a>(&self, candidates: impl IntoIterator<Item = &'a Grant>) -> Option<&'a Grant> {
        candidates.into_iter().fold(None, |worst, g| match worst {
            None => Some(g),
            Some(w) if self.compare(g, w) == Ordering::Less => Some(g),
            Some(w) => Some(w),
        })
    }

    /// Sorts a candidate slice so the winner comes first.
    ///
    /// Structural twins compare `Equal` under [`GrantOrder::compare`], which
    /// alone is not a total order over a slice that carries duplicates; the
    /// sort therefore falls back to the insertion sequence between twins,
    /// keeping the comparator total and the output deterministic.
    pub fn sort_winning_first(&self, candidates: &mut [Grant]) {
        candidates.sort_by(|a, b| {
            self.compare(b, a)
                .then_with(|| a.sequence().cmp(&b.sequence()))
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::context::EvaluationContext;
    use crate::grant::{GrantKind, GrantSet};

    use super::*;

    fn permission(node: &str, value: bool, ctx: EvaluationContext) -> Grant {
        Grant::new(
            GrantKind::Permission {
                node: node.to_string(),
                value,
            },
            ctx,
        )
        .unwrap()
    }

    fn sequenced(grants: Vec<Grant>) -> Vec<Grant> {
        let mut set = GrantSet::new();
        for g in grants {
            set.add(g);
        }
        set.iter().cloned().collect()
    }

    #[test]
    fn test_specificity_beats_priority() {
        let order = GrantOrder::normal();
        let server_ctx = EvaluationContext::single("server", "a").unwrap();

        // A contextual grant outranks a global one regardless of priority.
        let grants = sequenced(vec![
            Grant::new(GrantKind::Weight { weight: 100 }, EvaluationContext::empty()).unwrap(),
            Grant::new(GrantKind::Weight { weight: 1 }, server_ctx).unwrap(),
        ]);

        let winner = order.winner(&grants).unwrap();
        assert_eq!(winner, &grants[1]);
    }

    #[test]
    fn test_priority_breaks_specificity_ties() {
        let order = GrantOrder::normal();
        let grants = sequenced(vec![
            Grant::new(GrantKind::Weight { weight: 5 }, EvaluationContext::empty()).unwrap(),
            Grant::new(GrantKind::Weight { weight: 10 }, EvaluationContext::empty()).unwrap(),
        ]);

        assert_eq!(order.winner(&grants).unwrap(), &grants[1]);
    }

    #[test]
    fn test_equality_short_circuit() {
        let order = GrantOrder::normal();
        let g = permission("test.node", true, EvaluationContext::empty());
        let copy = g.clone();

        assert_eq!(order.compare(&g, &g), Ordering::Equal);
        assert_eq!(order.compare(&g, &copy), Ordering::Equal);
    }

    #[test]
    fn test_winner_independent_of_iteration_order() {
        let order = GrantOrder::normal();
        let ctx = EvaluationContext::single("server", "a").unwrap();
        let grants = sequenced(vec![
            permission("n", false, EvaluationContext::empty()),
            permission("n", true, ctx),
            permission("m", true, EvaluationContext::empty()),
        ]);

        let forward = order.winner(&grants).cloned().unwrap();
        let mut reversed: Vec<Grant> = grants.clone();
        reversed.reverse();
        let backward = order.winner(&reversed).cloned().unwrap();

        assert_eq!(forward, backward);
        // And repeated evaluation is stable.
        assert_eq!(order.winner(&grants).cloned().unwrap(), forward);
    }

    #[test]
    fn test_loser_mirrors_winner() {
        let order = GrantOrder::normal();
        let ctx = EvaluationContext::single("server", "a").unwrap();
        let grants = sequenced(vec![
            permission("n", false, EvaluationContext::empty()),
            permission("n", true, ctx),
        ]);

        let winner = order.winner(&grants).unwrap();
        let loser = order.loser(&grants).unwrap();
        assert_ne!(winner, loser);

        // The reverse order's winner is the normal order's loser.
        assert_eq!(GrantOrder::reverse().winner(&grants).unwrap(), loser);
    }

    #[test]
    fn test_reverse_is_sign_flip() {
        let normal = GrantOrder::normal();
        let reverse = GrantOrder::reverse();
        let ctx = EvaluationContext::single("world", "w").unwrap();
        let grants = sequenced(vec![
            permission("a", true, EvaluationContext::empty()),
            permission("b", true, ctx.clone()),
            Grant::new(GrantKind::Weight { weight: 3 }, ctx).unwrap(),
        ]);

        for a in &grants {
            for b in &grants {
                assert_eq!(normal.compare(a, b), reverse.compare(a, b).reverse());
            }
        }
    }

    #[test]
    fn test_sort_winning_first() {
        let order = GrantOrder::normal();
        let ctx = EvaluationContext::single("server", "a").unwrap();
        let mut grants = sequenced(vec![
            permission("n", false, EvaluationContext::empty()),
            permission("n", true, ctx),
        ]);

        order.sort_winning_first(&mut grants);
        assert!(!grants[0].context().is_empty());
    }

    #[test]
    fn test_sort_handles_structural_duplicates() {
        let order = GrantOrder::normal();

        // Duplicate declarations interleaved with distinct ones: the
        // duplicates compare Equal while the sequence tie-break orders
        // each of them against the grants declared in between.
        let mut set = GrantSet::new();
        for i in 0..50 {
            if i % 2 == 0 {
                set.add(permission("n", true, EvaluationContext::empty()));
            } else {
                set.add(permission(&format!("other.{i}"), true, EvaluationContext::empty()));
            }
        }
        let mut grants: Vec<Grant> = set.iter().cloned().collect();

        order.sort_winning_first(&mut grants);

        // All candidates share specificity and priority, so the sorted
        // order is exactly declaration order.
        let sequences: Vec<u64> = grants.iter().map(Grant::sequence).collect();
        let mut ascending = sequences.clone();
        ascending.sort_unstable();
        assert_eq!(sequences, ascending);
    }

    #[test]
    fn test_empty_candidates() {
        let order = GrantOrder::normal();
        assert!(order.winner(std::iter::empty()).is_none());
        assert!(order.loser(std::iter::empty()).is_none());
    }
}
