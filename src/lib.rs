//! # precedence — deterministic grant resolution
//!
//! precedence decides, for a holder subject to many possibly-conflicting
//! attribute grants, which grant is authoritative when several apply to
//! the same check — and caches the expensive parts of that decision so
//! repeated checks are cheap.
//!
//! ## Core Concepts
//!
//! - **Grant**: one declared fact (permission, inheritance link, metadata,
//!   display text or weight) with an evaluation context and optional expiry
//! - **Evaluation context**: the situational key/value set a check runs under
//! - **Resolution order**: context specificity first, declared priority
//!   second — a strict total order whose maximum is the winner
//! - **Diagnostic capture**: a filtered, bounded, exportable trace of
//!   resolution decisions for audit
//!
//! ## Usage
//!
//! ```rust
//! use precedence::{EvaluationContext, Grant, GrantKind, GrantOrder, GrantSet};
//!
//! let mut grants = GrantSet::new();
//! grants.add(Grant::new(
//!     GrantKind::Permission { node: "fly".into(), value: false },
//!     EvaluationContext::empty(),
//! )?);
//! grants.add(Grant::new(
//!     GrantKind::Permission { node: "fly".into(), value: true },
//!     EvaluationContext::single("server", "creative")?,
//! )?);
//!
//! // The contextual grant wins over the global one.
//! let winner = GrantOrder::normal().winner(grants.iter()).unwrap();
//! assert_eq!(winner.context().get("server"), Some("creative"));
//! # Ok::<(), precedence::ValidationError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod capture;
pub mod context;
pub mod error;
pub mod grant;
pub mod ordering;
pub mod source;
pub mod weight;

// Re-export primary types at crate root for convenience
pub use cache::LazyCache;
pub use capture::{
    CheckKind, CheckOrigin, ContentUploader, DiagnosticCapture, DiagnosticEvent, EventFilter,
    NotificationSink, Snapshot, UploadKey, UploaderIdentity,
};
pub use context::EvaluationContext;
pub use error::{
    ExportError, PrecedenceError, PrecedenceResult, SourceError, TransportError, ValidationError,
};
pub use grant::{Grant, GrantKind, GrantSet, GrantType, Tristate};
pub use ordering::{ContextSpecificity, GrantOrder, GrantPriority};
pub use source::{GrantSource, MemoryGrantSource, QueryPolicy};
pub use weight::{FallbackWeights, WeightResolver, WeightResult};
