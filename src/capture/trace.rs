//! Bounded rendering of call-site traces.

/// Renders call-site traces with prefix filtering and truncation.
///
/// Filtering removes noise frames (this crate's own plumbing, runtime
/// internals) before truncation, so a short rendering spends its line
/// budget on the caller's frames. The overflow count reports how many
/// frames the truncation suppressed.
#[derive(Debug, Clone)]
pub struct TraceRenderer {
    ignore_prefixes: Vec<String>,
    truncate: usize,
}

/// Line budget for live notification renderings.
pub const NOTIFY_TRACE_LINES: usize = 15;

/// Line budget for export renderings.
pub const EXPORT_TRACE_LINES: usize = 40;

impl TraceRenderer {
    /// A renderer with no filtering, truncating to `truncate` lines.
    #[must_use]
    pub const fn plain(truncate: usize) -> Self {
        Self {
            ignore_prefixes: Vec::new(),
            truncate,
        }
    }

    /// A renderer suppressing internal/noise frames, truncating to
    /// `truncate` lines.
    #[must_use]
    pub fn filtering(truncate: usize) -> Self {
        Self {
            ignore_prefixes: vec![
                "precedence::".to_string(),
                "std::sync::".to_string(),
                "core::ops::function::".to_string(),
            ],
            truncate,
        }
    }

    /// Adds a prefix whose frames are suppressed.
    #[must_use]
    pub fn ignoring(mut self, prefix: impl Into<String>) -> Self {
        self.ignore_prefixes.push(prefix.into());
        self
    }

    /// Renders `frames`, returning the retained lines and the number of
    /// frames suppressed by truncation (filtered frames are not counted).
    #[must_use]
    pub fn render(&self, frames: &[String]) -> (Vec<String>, usize) {
        let kept: Vec<&String> = frames
            .iter()
            .filter(|f| !self.ignore_prefixes.iter().any(|p| f.starts_with(p.as_str())))
            .collect();

        let overflow = kept.len().saturating_sub(self.truncate);
        let lines = kept
            .into_iter()
            .take(self.truncate)
            .cloned()
            .collect();
        (lines, overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_plain_truncation() {
        let renderer = TraceRenderer::plain(2);
        let (lines, overflow) = renderer.render(&frames(&["a", "b", "c", "d"]));
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(overflow, 2);
    }

    #[test]
    fn test_no_overflow_when_within_budget() {
        let renderer = TraceRenderer::plain(10);
        let (lines, overflow) = renderer.render(&frames(&["a", "b"]));
        assert_eq!(lines.len(), 2);
        assert_eq!(overflow, 0);
    }

    #[test]
    fn test_filtering_before_truncation() {
        let renderer = TraceRenderer::filtering(2);
        let input = frames(&[
            "precedence::capture::accept",
            "myplugin::listener::on_join",
            "std::sync::mutex::lock",
            "myplugin::main",
            "myplugin::boot",
        ]);
        let (lines, overflow) = renderer.render(&input);
        // Internal frames removed first; the budget applies to what's left.
        assert_eq!(lines, vec!["myplugin::listener::on_join", "myplugin::main"]);
        assert_eq!(overflow, 1);
    }

    #[test]
    fn test_custom_ignore_prefix() {
        let renderer = TraceRenderer::plain(10).ignoring("tokio::");
        let (lines, _) = renderer.render(&frames(&["tokio::task::run", "app::check"]));
        assert_eq!(lines, vec!["app::check"]);
    }
}
