//! Grants: atomic declared facts about a holder.
//!
//! A [`Grant`] is one immutable fact (permission, inheritance link,
//! metadata pair, display name or weight) applying under an
//! [`EvaluationContext`], optionally expiring at an instant. Which grant
//! wins when several apply at once is decided by the orders in
//! [`crate::ordering`], never by iteration order.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::error::ValidationError;

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    /// Positively granted.
    True,
    /// Positively denied.
    False,
    /// No applicable grant.
    Undefined,
}

impl Tristate {
    /// Converts a grant's boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    /// The boolean result, if defined.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undefined => None,
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// The declared fact a grant carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GrantKind {
    /// A permission node set to true (granted) or false (denied).
    Permission {
        /// The permission node string.
        node: String,
        /// Granted or denied.
        value: bool,
    },

    /// An inheritance link to a parent group.
    Inheritance {
        /// Name of the inherited group.
        group: String,
    },

    /// A metadata key/value pair.
    Meta {
        /// Metadata key.
        key: String,
        /// Metadata value.
        value: String,
    },

    /// Display text for the holder.
    DisplayName {
        /// The display text.
        name: String,
    },

    /// A numeric precedence weight.
    Weight {
        /// The weight value; higher takes precedence.
        weight: i64,
    },
}

impl GrantKind {
    /// The kind discriminant, without payload.
    #[must_use]
    pub const fn grant_type(&self) -> GrantType {
        match self {
            Self::Permission { .. } => GrantType::Permission,
            Self::Inheritance { .. } => GrantType::Inheritance,
            Self::Meta { .. } => GrantType::Meta,
            Self::DisplayName { .. } => GrantType::DisplayName,
            Self::Weight { .. } => GrantType::Weight,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Permission { node, .. } if node.is_empty() => {
                Err(ValidationError::EmptyPermissionNode)
            }
            Self::Inheritance { group } if group.is_empty() => {
                Err(ValidationError::EmptyGroupName)
            }
            Self::Meta { key, .. } if key.is_empty() => Err(ValidationError::EmptyMetaKey),
            _ => Ok(()),
        }
    }
}

/// Discriminant for selecting grants of one kind from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Permission,
    Inheritance,
    Meta,
    DisplayName,
    Weight,
}

/// One declared fact for a holder, with context and optional expiry.
///
/// Grants are immutable once constructed. Equality is structural over
/// kind + context + expiry; the insertion `sequence` (assigned by
/// [`GrantSet::add`]) exists only as the stable tie-break for
/// [`crate::ordering::GrantPriority`] and takes no part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    kind: GrantKind,
    context: EvaluationContext,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    expiry: Option<DateTime<Utc>>,
    #[serde(skip)]
    sequence: u64,
}

impl Grant {
    /// Creates a permanent grant.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the kind carries an empty node,
    /// group or metadata key.
    pub fn new(kind: GrantKind, context: EvaluationContext) -> Result<Self, ValidationError> {
        kind.validate()?;
        Ok(Self {
            kind,
            context,
            expiry: None,
            sequence: 0,
        })
    }

    /// Creates a grant expiring at `expiry`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the kind carries an empty node,
    /// group or metadata key.
    pub fn expiring(
        kind: GrantKind,
        context: EvaluationContext,
        expiry: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let mut grant = Self::new(kind, context)?;
        grant.expiry = Some(expiry);
        Ok(grant)
    }

    /// The declared fact.
    #[must_use]
    pub const fn kind(&self) -> &GrantKind {
        &self.kind
    }

    /// The kind discriminant.
    #[must_use]
    pub const fn grant_type(&self) -> GrantType {
        self.kind.grant_type()
    }

    /// The context this grant applies under.
    #[must_use]
    pub const fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// The expiry instant, if the grant is temporary.
    #[must_use]
    pub const fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Returns true if the grant has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|e| e <= now)
    }

    /// Returns true if the grant has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Declared priority: the weight value for weight grants, 0 otherwise.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        match self.kind {
            GrantKind::Weight { weight } => weight,
            _ => 0,
        }
    }

    /// Insertion sequence within the owning [`GrantSet`].
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl PartialEq for Grant {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.context == other.context && self.expiry == other.expiry
    }
}

impl Eq for Grant {}

impl Hash for Grant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.context.hash(state);
        self.expiry.hash(state);
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GrantKind::Permission { node, value } => write!(f, "{node}={value}")?,
            GrantKind::Inheritance { group } => write!(f, "group.{group}")?,
            GrantKind::Meta { key, value } => write!(f, "meta.{key}={value}")?,
            GrantKind::DisplayName { name } => write!(f, "displayname.{name}")?,
            GrantKind::Weight { weight } => write!(f, "weight.{weight}")?,
        }
        if !self.context.is_empty() {
            write!(f, " ({})", self.context)?;
        }
        Ok(())
    }
}

/// A holder's own grants of any kind, in declaration order.
///
/// Iteration order carries no resolution meaning; it only fixes the
/// sequence numbers used as the deterministic priority tie-break.
#[derive(Debug, Clone, Default)]
pub struct GrantSet {
    grants: Vec<Grant>,
    next_sequence: u64,
}

impl GrantSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            grants: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Adds a grant, assigning it the next insertion sequence.
    pub fn add(&mut self, mut grant: Grant) {
        grant.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.grants.push(grant);
    }

    /// Number of grants held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Returns true if the set holds no grants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Iterates all grants in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }

    /// Iterates grants of one kind.
    pub fn of_type(&self, grant_type: GrantType) -> impl Iterator<Item = &Grant> {
        self.grants
            .iter()
            .filter(move |g| g.grant_type() == grant_type)
    }
}

impl<'a> IntoIterator for &'a GrantSet {
    type Item = &'a Grant;
    type IntoIter = std::slice::Iter<'a, Grant>;

    fn into_iter(self) -> Self::IntoIter {
        self.grants.iter()
    }
}
