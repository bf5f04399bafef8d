//! Effective weight resolution.
//!
//! A holder's effective precedence weight comes from its own weight
//! grants, falling back to an external per-holder configuration mapping.
//! Weight is a holder-global attribute: resolution uses the
//! non-contextual query policy, so a weight grant applies whatever
//! context it was declared under. The derived result is memoized per
//! holder in a [`LazyCache`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::LazyCache;
use crate::error::{PrecedenceError, PrecedenceResult, SourceError};
use crate::grant::{Grant, GrantType};
use crate::source::{GrantSource, QueryPolicy};

/// The outcome of weight resolution, with provenance.
///
/// `Absent` is a distinct state, never to be conflated with a weight of
/// zero: callers must branch on presence before using the numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum WeightResult {
    /// Derived from the holder's own weight grant.
    FromGrant {
        /// The effective weight.
        weight: i64,
        /// The grant that supplied it.
        grant: Grant,
    },

    /// Derived from the fallback configuration mapping.
    FromConfig {
        /// The effective weight.
        weight: i64,
    },

    /// No weight grant and no config entry.
    Absent,
}

impl WeightResult {
    /// The numeric weight, if one applies.
    #[must_use]
    pub const fn weight(&self) -> Option<i64> {
        match self {
            Self::FromGrant { weight, .. } | Self::FromConfig { weight } => Some(*weight),
            Self::Absent => None,
        }
    }

    /// Returns true if no weight applies.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The provenance grant, when the weight came from one.
    #[must_use]
    pub const fn provenance(&self) -> Option<&Grant> {
        match self {
            Self::FromGrant { grant, .. } => Some(grant),
            _ => None,
        }
    }
}

/// Per-holder fallback weights, keyed by canonical lower-cased name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackWeights {
    weights: HashMap<String, i64>,
}

impl FallbackWeights {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping, lower-casing all names.
    pub fn from_entries<N: Into<String>>(entries: impl IntoIterator<Item = (N, i64)>) -> Self {
        Self {
            weights: entries
                .into_iter()
                .map(|(n, w)| (n.into().to_lowercase(), w))
                .collect(),
        }
    }

    /// Looks up a holder by canonical lower-cased name.
    #[must_use]
    pub fn get(&self, holder: &str) -> Option<i64> {
        self.weights.get(&holder.to_lowercase()).copied()
    }
}

/// Resolves and memoizes one holder's effective weight.
///
/// Each holder gets its own resolver, owning its own cache cell.
/// [`invalidate`](WeightResolver::invalidate) must be called when the
/// holder's underlying grants change.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use precedence::{
///     EvaluationContext, FallbackWeights, Grant, GrantKind, MemoryGrantSource, WeightResolver,
/// };
///
/// let source = Arc::new(MemoryGrantSource::new());
/// source.add("mods", Grant::new(
///     GrantKind::Weight { weight: 10 },
///     EvaluationContext::empty(),
/// ).unwrap());
///
/// let resolver = WeightResolver::new("mods", source, Arc::new(FallbackWeights::new()));
/// assert_eq!(resolver.resolve().unwrap().weight(), Some(10));
/// ```
pub struct WeightResolver {
    holder: String,
    source: Arc<dyn GrantSource>,
    fallback: Arc<FallbackWeights>,
    cache: LazyCache<WeightResult>,
}

impl WeightResolver {
    /// Creates a resolver for one holder.
    #[must_use]
    pub fn new(
        holder: impl Into<String>,
        source: Arc<dyn GrantSource>,
        fallback: Arc<FallbackWeights>,
    ) -> Self {
        Self {
            holder: holder.into(),
            source,
            fallback,
            cache: LazyCache::new(),
        }
    }

    /// The holder this resolver serves.
    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Resolves the holder's effective weight, memoized.
    ///
    /// Among non-expired weight grants the maximum declared priority wins;
    /// equal-priority grants are indistinguishable by design, so the
    /// first-encountered one supplies the provenance. With no weight grant
    /// the fallback mapping is consulted; with no entry there either, the
    /// result is [`WeightResult::Absent`].
    ///
    /// # Errors
    ///
    /// Propagates grant source failures; the cache stays empty so the next
    /// call retries.
    pub fn resolve(&self) -> PrecedenceResult<WeightResult> {
        self.cache.get(|| self.derive())
    }

    /// Drops the memoized result. Call when the holder's grants change.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn derive(&self) -> PrecedenceResult<WeightResult> {
        let grants = self
            .source
            .own_grants(&self.holder, GrantType::Weight, &QueryPolicy::NonContextual)
            .or_else(|err| match err {
                // A holder the source has never seen simply has no grants.
                SourceError::HolderNotFound { .. } => Ok(Vec::new()),
                other => Err(PrecedenceError::from(other)),
            })?;

        let mut best: Option<&Grant> = None;
        for grant in &grants {
            // Strictly greater: the first-encountered grant keeps ties.
            if best.map_or(true, |b| grant.priority() > b.priority()) {
                best = Some(grant);
            }
        }

        if let Some(grant) = best {
            return Ok(WeightResult::FromGrant {
                weight: grant.priority(),
                grant: grant.clone(),
            });
        }

        match self.fallback.get(&self.holder) {
            Some(weight) => Ok(WeightResult::FromConfig { weight }),
            None => Ok(WeightResult::Absent),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::context::EvaluationContext;
    use crate::grant::GrantKind;
    use crate::source::MemoryGrantSource;

    use super::*;

    fn weight_grant(value: i64, ctx: EvaluationContext) -> Grant {
        Grant::new(GrantKind::Weight { weight: value }, ctx).unwrap()
    }

    fn resolver_for(
        holder: &str,
        source: Arc<MemoryGrantSource>,
        fallback: FallbackWeights,
    ) -> WeightResolver {
        WeightResolver::new(holder, source, Arc::new(fallback))
    }

    #[test]
    fn test_max_priority_wins_context_ignored() {
        let source = Arc::new(MemoryGrantSource::new());
        source.add("g", weight_grant(5, EvaluationContext::empty()));
        source.add(
            "g",
            weight_grant(10, EvaluationContext::single("server", "x").unwrap()),
        );

        let resolver = resolver_for("g", source, FallbackWeights::new());
        let result = resolver.resolve().unwrap();
        assert_eq!(result.weight(), Some(10));
        assert!(result.provenance().is_some());
    }

    #[test]
    fn test_config_fallback() {
        let source = Arc::new(MemoryGrantSource::new());
        let fallback = FallbackWeights::from_entries([("Test", 7)]);

        let resolver = resolver_for("test", source, fallback);
        let result = resolver.resolve().unwrap();
        assert_eq!(result, WeightResult::FromConfig { weight: 7 });
        assert!(result.provenance().is_none());
    }

    #[test]
    fn test_absent_is_not_zero() {
        let source = Arc::new(MemoryGrantSource::new());
        let resolver = resolver_for("nobody", source, FallbackWeights::new());

        let result = resolver.resolve().unwrap();
        assert!(result.is_absent());
        assert_eq!(result.weight(), None);
        assert_ne!(result, WeightResult::FromConfig { weight: 0 });
    }

    #[test]
    fn test_grant_beats_config() {
        let source = Arc::new(MemoryGrantSource::new());
        source.add("g", weight_grant(3, EvaluationContext::empty()));
        let fallback = FallbackWeights::from_entries([("g", 100)]);

        let resolver = resolver_for("g", source, fallback);
        assert_eq!(resolver.resolve().unwrap().weight(), Some(3));
    }

    #[test]
    fn test_expired_grants_ignored() {
        let source = Arc::new(MemoryGrantSource::new());
        source.add(
            "g",
            Grant::expiring(
                GrantKind::Weight { weight: 50 },
                EvaluationContext::empty(),
                Utc::now() - Duration::minutes(1),
            )
            .unwrap(),
        );
        source.add("g", weight_grant(5, EvaluationContext::empty()));

        let resolver = resolver_for("g", source, FallbackWeights::new());
        assert_eq!(resolver.resolve().unwrap().weight(), Some(5));
    }

    #[test]
    fn test_equal_priority_first_encountered_wins() {
        let source = Arc::new(MemoryGrantSource::new());
        let first = weight_grant(5, EvaluationContext::single("server", "a").unwrap());
        source.add("g", first.clone());
        source.add("g", weight_grant(5, EvaluationContext::single("server", "b").unwrap()));

        let resolver = resolver_for("g", source, FallbackWeights::new());
        let result = resolver.resolve().unwrap();
        assert_eq!(result.provenance(), Some(&first));
    }

    #[test]
    fn test_memoized_until_invalidated() {
        let source = Arc::new(MemoryGrantSource::new());
        source.add("g", weight_grant(5, EvaluationContext::empty()));

        let resolver = resolver_for("g", Arc::clone(&source), FallbackWeights::new());
        assert_eq!(resolver.resolve().unwrap().weight(), Some(5));

        // Underlying data changes; the cached result persists until
        // invalidation.
        source.add("g", weight_grant(20, EvaluationContext::empty()));
        assert_eq!(resolver.resolve().unwrap().weight(), Some(5));

        resolver.invalidate();
        assert_eq!(resolver.resolve().unwrap().weight(), Some(20));
    }

    #[test]
    fn test_serde_provenance_tag() {
        let result = WeightResult::FromConfig { weight: 7 };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["provenance"], "from_config");
        assert_eq!(json["weight"], 7);

        let absent = serde_json::to_value(WeightResult::Absent).unwrap();
        assert_eq!(absent["provenance"], "absent");
    }
}
