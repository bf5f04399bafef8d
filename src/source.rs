//! Grant source collaborators.
//!
//! Assembling a holder's grants (including walking group inheritance) is
//! the job of an external collaborator. This module defines the contract
//! it must implement, plus a simple in-memory implementation for embedded
//! use and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::context::EvaluationContext;
use crate::error::SourceError;
use crate::grant::{Grant, GrantSet, GrantType};

/// How a grant query treats evaluation contexts.
///
/// Expiry is honored under every policy. The non-contextual policy skips
/// context matching entirely — used where an attribute is holder-global,
/// like weight resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Honor expiry; do not apply context matching.
    NonContextual,

    /// Honor expiry; return only grants whose context is satisfied by the
    /// given situation.
    Contextual(EvaluationContext),
}

impl QueryPolicy {
    fn admits(&self, grant: &Grant) -> bool {
        if grant.is_expired() {
            return false;
        }
        match self {
            Self::NonContextual => true,
            Self::Contextual(situation) => grant.context().is_satisfied_by(situation),
        }
    }
}

/// A provider of a holder's own grants.
///
/// Implementations are responsible for context-filtering semantics; the
/// resolution core only states the policy it wants.
pub trait GrantSource: Send + Sync {
    /// Returns the holder's own grants of `grant_type` admitted by `policy`.
    ///
    /// # Errors
    ///
    /// Returns a `SourceError` if the holder is unknown or the backend
    /// fails.
    fn own_grants(
        &self,
        holder: &str,
        grant_type: GrantType,
        policy: &QueryPolicy,
    ) -> Result<Vec<Grant>, SourceError>;
}

/// A `Vec`-backed in-memory grant source.
///
/// Holder names are matched case-insensitively, lower-cased on insertion.
#[derive(Debug, Default)]
pub struct MemoryGrantSource {
    holders: Mutex<HashMap<String, GrantSet>>,
}

impl MemoryGrantSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grant for a holder, creating the holder if absent.
    pub fn add(&self, holder: &str, grant: Grant) {
        self.lock()
            .entry(holder.to_lowercase())
            .or_default()
            .add(grant);
    }

    /// Removes all grants for a holder. Returns true if the holder existed.
    pub fn clear(&self, holder: &str) -> bool {
        self.lock().remove(&holder.to_lowercase()).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, GrantSet>> {
        match self.holders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl GrantSource for MemoryGrantSource {
    fn own_grants(
        &self,
        holder: &str,
        grant_type: GrantType,
        policy: &QueryPolicy,
    ) -> Result<Vec<Grant>, SourceError> {
        let holders = self.lock();
        let set = holders
            .get(&holder.to_lowercase())
            .ok_or_else(|| SourceError::HolderNotFound {
                holder: holder.to_string(),
            })?;

        Ok(set
            .of_type(grant_type)
            .filter(|g| policy.admits(g))
            .cloned()
            .collect())
    }
}
