//! Forward-only run lifecycle.
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::FailureKind;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "kind")]
pub enum RunState {
    Received,
    Generating,
    Parsing,
    Resolving,
    Assembling,
    Succeeded,
    Failed(FailureKind),
}

impl RunState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Generating => "generating",
            Self::Parsing => "parsing",
            Self::Resolving => "resolving",
            Self::Assembling => "assembling",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Received => 0,
            Self::Generating => 1,
            Self::Parsing => 2,
            Self::Resolving => 3,
            Self::Assembling => 4,
            Self::Succeeded | Self::Failed(_) => 5,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    /// Terminal states are reachable from anywhere non-terminal; other moves must
    /// go strictly forward.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Records the states one run passes through.
#[derive(Debug)]
pub(crate) struct RunTracker {
    current: RunState,
    history: Vec<RunState>,
    metrics: Arc<Metrics>,
}

impl RunTracker {
    pub(crate) fn new(metrics: Arc<Metrics>) -> Self {
        let tracker = Self {
            current: RunState::Received,
            history: vec![RunState::Received],
            metrics,
        };
        tracker.count(RunState::Received);
        tracker
    }

    pub(crate) fn current(&self) -> RunState {
        self.current
    }

    /// Moves to `next`; backward or post-terminal moves are ignored and logged.
    pub(crate) fn advance(&mut self, next: RunState) {
        if !self.current.can_advance_to(next) {
            warn!(
                from = self.current.label(),
                to = next.label(),
                "ignored out-of-order run state transition"
            );
            return;
        }
        debug!(from = self.current.label(), to = next.label(), "run state transition");
        self.current = next;
        self.history.push(next);
        self.count(next);
    }

    pub(crate) fn fail(&mut self, kind: FailureKind) {
        self.advance(RunState::Failed(kind));
    }

    pub(crate) fn into_history(self) -> Vec<RunState> {
        self.history
    }

    fn count(&self, state: RunState) {
        self.metrics
            .state_transitions
            .with_label_values(&[state.label()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Telemetry;

    fn tracker() -> RunTracker {
        RunTracker::new(Telemetry::metrics_only().expect("telemetry").metrics_arc())
    }

    #[test]
    fn advances_forward_only() {
        let mut tracker = tracker();
        tracker.advance(RunState::Generating);
        tracker.advance(RunState::Parsing);
        tracker.advance(RunState::Generating);

        assert_eq!(tracker.current(), RunState::Parsing);
        assert_eq!(
            tracker.into_history(),
            vec![RunState::Received, RunState::Generating, RunState::Parsing]
        );
    }

    #[test]
    fn terminal_state_is_final() {
        let mut tracker = tracker();
        tracker.advance(RunState::Generating);
        tracker.fail(FailureKind::GenerationUnavailable);
        tracker.advance(RunState::Succeeded);

        assert_eq!(
            tracker.current(),
            RunState::Failed(FailureKind::GenerationUnavailable)
        );
    }

    #[test]
    fn failure_may_skip_remaining_stages() {
        assert!(RunState::Received.can_advance_to(RunState::Failed(FailureKind::InvalidRequest)));
        assert!(!RunState::Resolving.can_advance_to(RunState::Parsing));
        assert!(!RunState::Succeeded.can_advance_to(RunState::Failed(FailureKind::TrackAppendFailed)));
    }

    #[test]
    fn transitions_are_counted() {
        let telemetry = Telemetry::metrics_only().expect("telemetry");
        let mut tracker = RunTracker::new(telemetry.metrics_arc());
        tracker.advance(RunState::Generating);

        let rendered = telemetry.render_prometheus();
        assert!(rendered.contains("playlist_run_state_transitions_total{state=\"generating\"} 1"));
        assert!(rendered.contains("playlist_run_state_transitions_total{state=\"received\"} 1"));
    }
}
