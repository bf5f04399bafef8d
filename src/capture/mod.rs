//! Diagnostic capture of resolution-check events.
//!
//! A [`DiagnosticCapture`] accumulates the outcome of every resolution
//! check it is shown: events are counted, run through a caller-supplied
//! filter, buffered up to a fixed capacity, optionally forwarded to a
//! live [`NotificationSink`], and on demand exported as a gzip-compressed
//! structured snapshot through a [`ContentUploader`]. Export drains the
//! buffer but never resets the cumulative counters.

mod event;
mod notify;
mod trace;
mod transport;

pub use event::{CheckKind, CheckOrigin, DiagnosticEvent};
pub use notify::NotificationSink;
pub use trace::{TraceRenderer, EXPORT_TRACE_LINES, NOTIFY_TRACE_LINES};
pub use transport::{ContentUploader, UploadKey, GZIP_JSON_CONTENT_TYPE};

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ExportError;

use notify::Notifier;

/// How many matched events the buffer retains. Events beyond this are
/// still counted, and the same constant decides the export `truncated`
/// flag.
pub const BUFFER_CAPACITY: usize = 10_000;

/// The predicate deciding which observed events a capture records.
///
/// Predicate logic lives with the caller; the capture only evaluates it
/// and reports its textual description in export metadata.
pub trait EventFilter: Send + Sync {
    /// Returns true if the event should be recorded.
    fn matches(&self, event: &DiagnosticEvent) -> bool;

    /// A textual description for export metadata.
    fn describe(&self) -> String {
        String::new()
    }
}

/// The filter that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl EventFilter for MatchAll {
    fn matches(&self, _event: &DiagnosticEvent) -> bool {
        true
    }
}

/// Who requested the capture; recorded in export metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploaderIdentity {
    /// Display name.
    pub name: String,
    /// Stable unique id.
    pub uuid: Uuid,
}

/// Cumulative counts at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotCounts {
    /// Events that passed the filter.
    pub matched: u64,
    /// Events observed in total.
    pub total: u64,
}

/// Export metadata, shaped for the structured payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// When the capture session began.
    pub start_time: String,
    /// When the snapshot was taken.
    pub end_time: String,
    /// Concise duration between the two.
    pub duration: String,
    /// Cumulative counters.
    pub count: SnapshotCounts,
    /// Who requested the capture.
    pub uploader: UploaderIdentity,
    /// The filter's textual description.
    pub filter: String,
    /// True iff the matched count exceeds the retained buffer length.
    pub truncated: bool,
}

/// A drained export snapshot: metadata plus rendered events.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Capture session metadata.
    pub metadata: SnapshotMetadata,
    /// The buffered events, in acceptance order, rendered with the export
    /// trace budget.
    pub data: Vec<serde_json::Value>,
}

/// One capture session: filters, counts, buffers and exports resolution
/// check events.
///
/// A single live instance accumulates indefinitely; export is a
/// repeatable drain, not a terminal state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use precedence::capture::{DiagnosticCapture, MatchAll, UploaderIdentity};
///
/// let capture = DiagnosticCapture::new(
///     Arc::new(MatchAll),
///     UploaderIdentity { name: "console".into(), uuid: uuid::Uuid::new_v4() },
/// );
/// assert_eq!(capture.total(), 0);
/// ```
pub struct DiagnosticCapture {
    started_at: DateTime<Utc>,
    filter: Arc<dyn EventFilter>,
    uploader: UploaderIdentity,
    capacity: usize,
    total: AtomicU64,
    matched: AtomicU64,
    buffer: Mutex<Vec<DiagnosticEvent>>,
    notifier: Option<Notifier>,
}

impl DiagnosticCapture {
    /// Creates a capture session with the default buffer capacity and no
    /// live notifications.
    #[must_use]
    pub fn new(filter: Arc<dyn EventFilter>, uploader: UploaderIdentity) -> Self {
        Self {
            started_at: Utc::now(),
            filter,
            uploader,
            capacity: BUFFER_CAPACITY,
            total: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            buffer: Mutex::new(Vec::new()),
            notifier: None,
        }
    }

    /// Enables live notification of matched events to `sink`, delivered
    /// off the hot path by a dedicated worker.
    #[must_use]
    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(Notifier::spawn(sink));
        self
    }

    /// Overrides the buffer capacity. Intended for tests.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Accepts one resolution-check event.
    ///
    /// Always counts the observation; filter-matching events are counted
    /// separately, buffered while there is capacity, and forwarded to the
    /// notification worker without blocking. Once this returns the event
    /// is recorded and cannot be retracted.
    pub fn accept(&self, event: DiagnosticEvent) {
        self.total.fetch_add(1, Ordering::Relaxed);

        if !self.filter.matches(&event) {
            return;
        }
        self.matched.fetch_add(1, Ordering::Relaxed);

        {
            let mut buffer = self.lock_buffer();
            if buffer.len() < self.capacity {
                buffer.push(event.clone());
            }
        }

        if let Some(notifier) = &self.notifier {
            notifier.notify(event);
        }
    }

    /// Total events observed over the capture's lifetime.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Total filter-matching events over the capture's lifetime.
    #[must_use]
    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    /// Number of events currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.lock_buffer().len()
    }

    /// Notifications dropped because the delivery queue was full.
    #[must_use]
    pub fn dropped_notifications(&self) -> u64 {
        self.notifier.as_ref().map_or(0, Notifier::dropped)
    }

    /// Takes a snapshot, draining the buffer.
    ///
    /// All metadata and event renderings are frozen into the returned
    /// value before this returns, so nothing recorded can be lost by a
    /// later transport failure. The cumulative counters are not reset.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let events = std::mem::take(&mut *self.lock_buffer());

        let matched = self.matched();
        let total = self.total();
        let now = Utc::now();

        let metadata = SnapshotMetadata {
            start_time: format_timestamp(self.started_at),
            end_time: format_timestamp(now),
            duration: format_duration_concise(now - self.started_at),
            count: SnapshotCounts { matched, total },
            uploader: self.uploader.clone(),
            filter: self.filter.describe(),
            truncated: matched > events.len() as u64,
        };

        let filtering = TraceRenderer::filtering(EXPORT_TRACE_LINES);
        let plain = TraceRenderer::plain(EXPORT_TRACE_LINES);
        let data = events
            .iter()
            .map(|e| {
                if e.origin.filters_trace() {
                    e.to_json(&filtering)
                } else {
                    e.to_json(&plain)
                }
            })
            .collect();

        Snapshot { metadata, data }
    }

    /// Takes a snapshot and uploads it, returning the retrieval key.
    ///
    /// The buffer drain happens when the snapshot is captured, before any
    /// transport work; a transport failure surfaces as a typed error and
    /// is not retried here.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if serialization, compression or the
    /// upload fails.
    pub fn export(&self, transport: &dyn ContentUploader) -> Result<UploadKey, ExportError> {
        let snapshot = self.snapshot();
        upload_snapshot(&snapshot, transport)
    }

    fn lock_buffer(&self) -> MutexGuard<'_, Vec<DiagnosticEvent>> {
        match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Serializes, compresses and uploads an already-captured snapshot.
///
/// Split from [`DiagnosticCapture::export`] so a caller holding a
/// snapshot from a failed upload can retry without draining again.
///
/// # Errors
///
/// Returns an [`ExportError`] if serialization, compression or the
/// upload fails.
pub fn upload_snapshot(
    snapshot: &Snapshot,
    transport: &dyn ContentUploader,
) -> Result<UploadKey, ExportError> {
    let json = serde_json::to_vec(snapshot).map_err(|e| ExportError::Serialize {
        message: e.to_string(),
    })?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(transport.upload(&compressed, GZIP_JSON_CONTENT_TYPE)?)
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Concise human duration: `1d 2h 3m 4s`, or `0s` for sub-second spans.
fn format_duration_concise(duration: Duration) -> String {
    let mut seconds = duration.num_seconds().max(0);

    let days = seconds / 86_400;
    seconds %= 86_400;
    let hours = seconds / 3_600;
    seconds %= 3_600;
    let minutes = seconds / 60;
    seconds %= 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
