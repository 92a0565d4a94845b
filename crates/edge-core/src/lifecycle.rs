//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a prerender request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, processing started.
    Start,
    /// Caller classified; `true` when the request will be intercepted.
    Classified(bool),
    /// Tombstone list consulted.
    TombstonesChecked,
    /// Backing store lookup settled (or timed out).
    Resolved,
    /// Response produced with the given status.
    Completion(u16),
    /// An error occurred.
    Error(String),
}

impl LifecyclePhase {
    /// Timing mark name for this phase.
    pub fn mark_name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Classified(_) => "classified",
            Self::TombstonesChecked => "tombstones_checked",
            Self::Resolved => "resolved",
            Self::Completion(_) => "completion",
            Self::Error(_) => "error",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the mark for a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        self.mark(phase.mark_name());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from request start to a mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time between two marks.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        Some(to.saturating_duration_since(*from))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_recorded() {
        let mut timing = TimingContext::new();
        timing.mark_phase(&LifecyclePhase::Start);
        timing.mark_phase(&LifecyclePhase::Resolved);

        assert!(timing.since_start("start").is_some());
        assert!(timing.between("start", "resolved").is_some());
        assert!(timing.since_start("completion").is_none());
    }

    #[test]
    fn test_phase_mark_names() {
        assert_eq!(LifecyclePhase::Classified(true).mark_name(), "classified");
        assert_eq!(LifecyclePhase::Completion(410).mark_name(), "completion");
    }
}
