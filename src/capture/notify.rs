//! Live notification delivery, off the hot path.
//!
//! `accept()` must never block on a slow subscriber, so rendered
//! notifications are handed to a dedicated worker thread over a bounded
//! channel with non-blocking `try_send`. Messages that cannot be queued
//! are counted and dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::event::{CheckKind, DiagnosticEvent};
use super::trace::{TraceRenderer, NOTIFY_TRACE_LINES};

/// A subscriber for live notifications of matched events.
///
/// `detail` carries the expandable hover text (origin, cause, context,
/// trace); a non-interactive console sink reports `is_console() == true`
/// and receives the summary line only.
pub trait NotificationSink: Send + Sync {
    /// Delivers one rendered notification.
    fn send(&self, message: String, detail: Option<Vec<String>>);

    /// Returns true if this sink cannot display expandable detail.
    fn is_console(&self) -> bool;
}

#[derive(Debug)]
enum WorkerMsg {
    Notify(DiagnosticEvent),
}

/// Owns the notification worker for one capture session.
pub(crate) struct Notifier {
    tx: Sender<WorkerMsg>,
    dropped: AtomicU64,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    const QUEUE_CAPACITY: usize = 1024;

    pub(crate) fn spawn(sink: Arc<dyn NotificationSink>) -> Self {
        let (tx, rx) = bounded::<WorkerMsg>(Self::QUEUE_CAPACITY);

        let join = thread::Builder::new()
            .name("precedence-notify".to_string())
            .spawn(move || worker_loop(&*sink, &rx))
            .expect("failed to spawn precedence notification worker");

        Self {
            tx,
            dropped: AtomicU64::new(0),
            join: Mutex::new(Some(join)),
        }
    }

    /// Non-blocking enqueue; full or closed queues count a drop.
    pub(crate) fn notify(&self, event: DiagnosticEvent) {
        match self.tx.try_send(WorkerMsg::Notify(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Close the channel so the worker terminates, then join; the
        // worker drains whatever was already queued first.
        let (dummy_tx, _) = bounded::<WorkerMsg>(1);
        drop(std::mem::replace(&mut self.tx, dummy_tx));

        if let Ok(mut guard) = self.join.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

fn worker_loop(sink: &dyn NotificationSink, rx: &Receiver<WorkerMsg>) {
    while let Ok(WorkerMsg::Notify(event)) = rx.recv() {
        let message = event.summary();

        if sink.is_console() {
            sink.send(message, None);
            continue;
        }

        sink.send(message, Some(render_detail(&event)));
    }
}

/// Builds the expandable detail lines for one event.
fn render_detail(event: &DiagnosticEvent) -> Vec<String> {
    let mut detail = Vec::new();

    // Exhaustive on purpose: a new check kind must update this rendering.
    let (type_name, cause) = match &event.kind {
        CheckKind::Permission { cause, .. } => ("permission", cause),
        CheckKind::Meta { cause, .. } => ("meta", cause),
    };

    detail.push(format!("Type: {type_name}"));
    detail.push(format!("Origin: {:?}", event.origin));
    if let Some(cause) = cause {
        detail.push(format!("Cause: {cause}"));
    }
    if !event.context.is_empty() {
        detail.push(format!("Context: {}", event.context));
    }
    detail.push(format!("Thread: {}", event.thread));
    detail.push("Trace:".to_string());

    let renderer = if event.origin.filters_trace() {
        TraceRenderer::filtering(NOTIFY_TRACE_LINES)
    } else {
        TraceRenderer::plain(NOTIFY_TRACE_LINES)
    };
    let (lines, overflow) = renderer.render(&event.trace);
    detail.extend(lines);
    if overflow != 0 {
        detail.push(format!("... and {overflow} more"));
    }

    detail
}
