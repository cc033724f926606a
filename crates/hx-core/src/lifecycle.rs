//! Worker lifecycle and request timing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Constructed, routes loaded, nothing cached yet.
    Parsed,
    /// Install in progress.
    Installing,
    /// Cache manifest stored in the current generation.
    Installed,
    /// Stale generations being pruned.
    Activating,
    /// Serving fetch events.
    Activated,
    /// Install failed; the worker never becomes active.
    Redundant,
}

impl WorkerPhase {
    /// Whether fetch events may be served in this phase.
    pub fn serves_fetches(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl std::fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Timing context for one request chain.
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

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a recorded mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_activated_serves() {
        assert!(WorkerPhase::Activated.serves_fetches());
        assert!(!WorkerPhase::Installed.serves_fetches());
        assert!(!WorkerPhase::Redundant.serves_fetches());
    }

    #[test]
    fn test_timing_marks() {
        let mut timing = TimingContext::new();
        timing.mark("rpc");
        let rpc = timing.since_start("rpc").unwrap();
        assert!(rpc <= timing.elapsed());
        assert!(timing.since_start("render").is_none());
    }
}
