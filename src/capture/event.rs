//! Diagnostic events: recorded outcomes of resolution checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::context::EvaluationContext;
use crate::grant::{Grant, Tristate};

use super::trace::TraceRenderer;

/// Classifies where a check originated, deciding trace-filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOrigin {
    /// A check made internally by the resolution engine.
    Internal,
    /// A platform API permission lookup.
    PlatformLookup,
    /// A platform API lookup that also reports whether the node is set.
    PlatformLookupWithDefault,
    /// A third-party API consumer.
    ThirdPartyApi,
}

impl CheckOrigin {
    /// Returns true if renderings of this origin's traces should have
    /// internal/noise frames suppressed. Platform lookups arrive through
    /// deep adapter plumbing that would otherwise drown the caller's
    /// frames.
    #[must_use]
    pub const fn filters_trace(self) -> bool {
        matches!(self, Self::PlatformLookup | Self::PlatformLookupWithDefault)
    }
}

/// The checked key and winning result, by check kind.
///
/// A closed set: formatting sites match exhaustively, so introducing a
/// new kind without updating them is a compile error rather than a
/// runtime "unknown type" failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckKind {
    /// A permission check.
    Permission {
        /// The node that was checked.
        node: String,
        /// The winning result.
        result: Tristate,
        /// The grant that decided the result, if any.
        cause: Option<Grant>,
    },

    /// A metadata lookup.
    Meta {
        /// The metadata key that was looked up.
        key: String,
        /// The winning value, if any.
        result: Option<String>,
        /// The grant that decided the result, if any.
        cause: Option<Grant>,
    },
}

/// One recorded resolution-check outcome. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// The checked key and winning result.
    pub kind: CheckKind,
    /// Descriptor of the subject that was checked.
    pub subject: String,
    /// The evaluation context the check ran under.
    pub context: EvaluationContext,
    /// Call-site trace, outermost frame first.
    pub trace: Vec<String>,
    /// Identifier of the issuing thread or task.
    pub thread: String,
    /// Wall-clock time of the check.
    pub timestamp: DateTime<Utc>,
    /// Where the check originated.
    pub origin: CheckOrigin,
}

impl DiagnosticEvent {
    /// One-line human rendering of the check and its outcome.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.kind {
            CheckKind::Permission { node, result, .. } => {
                format!("{} - {} - {}", self.subject, node, result)
            }
            CheckKind::Meta { key, result, .. } => {
                format!(
                    "{} - meta: {} - {}",
                    self.subject,
                    key,
                    result.as_deref().unwrap_or("null")
                )
            }
        }
    }

    /// Structured JSON rendering for the export payload, with the trace
    /// rendered through `renderer`.
    #[must_use]
    pub fn to_json(&self, renderer: &TraceRenderer) -> serde_json::Value {
        let (trace, overflow) = renderer.render(&self.trace);

        let (kind, key, result) = match &self.kind {
            CheckKind::Permission { node, result, cause } => (
                "permission",
                node.clone(),
                json!({
                    "value": result.to_string(),
                    "cause": cause,
                }),
            ),
            CheckKind::Meta { key, result, cause } => (
                "meta",
                key.clone(),
                json!({
                    "value": result,
                    "cause": cause,
                }),
            ),
        };

        json!({
            "type": kind,
            "who": self.subject,
            "key": key,
            "result": result,
            "context": self.context,
            "origin": self.origin,
            "thread": self.thread,
            "time": self.timestamp.timestamp(),
            "trace": trace,
            "traceOverflow": overflow,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::grant::GrantKind;

    use super::*;

    fn permission_event(origin: CheckOrigin) -> DiagnosticEvent {
        let cause = Grant::new(
            GrantKind::Permission {
                node: "test.node".to_string(),
                value: true,
            },
            EvaluationContext::empty(),
        )
        .unwrap();

        DiagnosticEvent {
            kind: CheckKind::Permission {
                node: "test.node".to_string(),
                result: Tristate::True,
                cause: Some(cause),
            },
            subject: "player1".to_string(),
            context: EvaluationContext::single("server", "a").unwrap(),
            trace: vec!["plugin::check".to_string(), "plugin::main".to_string()],
            thread: "main".to_string(),
            timestamp: Utc::now(),
            origin,
        }
    }

    #[test]
    fn test_origin_trace_filtering_policy() {
        assert!(!CheckOrigin::Internal.filters_trace());
        assert!(CheckOrigin::PlatformLookup.filters_trace());
        assert!(CheckOrigin::PlatformLookupWithDefault.filters_trace());
        assert!(!CheckOrigin::ThirdPartyApi.filters_trace());
    }

    #[test]
    fn test_summary_permission() {
        let event = permission_event(CheckOrigin::Internal);
        assert_eq!(event.summary(), "player1 - test.node - true");
    }

    #[test]
    fn test_summary_meta() {
        let mut event = permission_event(CheckOrigin::Internal);
        event.kind = CheckKind::Meta {
            key: "prefix".to_string(),
            result: None,
            cause: None,
        };
        assert_eq!(event.summary(), "player1 - meta: prefix - null");
    }

    #[test]
    fn test_to_json_shape() {
        let event = permission_event(CheckOrigin::PlatformLookup);
        let value = event.to_json(&TraceRenderer::plain(10));

        assert_eq!(value["type"], "permission");
        assert_eq!(value["who"], "player1");
        assert_eq!(value["key"], "test.node");
        assert_eq!(value["result"]["value"], "true");
        assert!(value["result"]["cause"].is_object());
        assert_eq!(value["origin"], "platform_lookup");
        assert_eq!(value["trace"].as_array().unwrap().len(), 2);
        assert_eq!(value["traceOverflow"], 0);
    }

    #[test]
    fn test_to_json_truncates_trace() {
        let mut event = permission_event(CheckOrigin::Internal);
        event.trace = (0..20).map(|i| format!("frame{i}")).collect();

        let value = event.to_json(&TraceRenderer::plain(5));
        assert_eq!(value["trace"].as_array().unwrap().len(), 5);
        assert_eq!(value["traceOverflow"], 15);
    }

    #[test]
    fn test_serde_round_trip() {
        let event = permission_event(CheckOrigin::ThirdPartyApi);
        let json = serde_json::to_string(&event).unwrap();
        let back: DiagnosticEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
