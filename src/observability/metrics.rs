//! Prometheus metric definitions.
use std::sync::Arc;

use prometheus::{
    Counter, CounterVec, Histogram, Registry, register_counter_vec_with_registry,
    register_counter_with_registry, register_histogram_with_registry,
};

/// Counters and histograms for pipeline runs.
#[derive(Debug, Clone)]
pub struct Metrics {
    // counters
    pub runs_started: Counter,
    pub runs_succeeded: Counter,
    pub run_failures: CounterVec,
    pub state_transitions: CounterVec,
    pub tracks_requested: Counter,
    pub tracks_resolved: Counter,
    pub tracks_unresolved: Counter,
    pub generation_retries: Counter,
    pub search_retries: Counter,

    // histograms
    pub generation_duration: Histogram,
    pub resolve_duration: Histogram,
    pub assemble_duration: Histogram,
    pub run_duration: Histogram,
}

impl Metrics {
    /// Registers every metric with `registry`.
    ///
    /// # Errors
    /// Fails when a metric with the same name is already registered.
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            runs_started: register_counter_with_registry!(
                "playlist_runs_started_total",
                "Total number of playlist runs started",
                registry
            )?,
            runs_succeeded: register_counter_with_registry!(
                "playlist_runs_succeeded_total",
                "Total number of playlist runs that created a playlist",
                registry
            )?,
            run_failures: register_counter_vec_with_registry!(
                "playlist_run_failures_total",
                "Total number of failed playlist runs by failure kind",
                &["kind"],
                registry
            )?,
            state_transitions: register_counter_vec_with_registry!(
                "playlist_run_state_transitions_total",
                "Run state transitions by entered state",
                &["state"],
                registry
            )?,
            tracks_requested: register_counter_with_registry!(
                "playlist_tracks_requested_total",
                "Track references proposed by generated concepts",
                registry
            )?,
            tracks_resolved: register_counter_with_registry!(
                "playlist_tracks_resolved_total",
                "Track references matched in the catalog",
                registry
            )?,
            tracks_unresolved: register_counter_with_registry!(
                "playlist_tracks_unresolved_total",
                "Track references without a catalog match",
                registry
            )?,
            generation_retries: register_counter_with_registry!(
                "playlist_generation_retries_total",
                "Retries of concept generation calls",
                registry
            )?,
            search_retries: register_counter_with_registry!(
                "playlist_search_retries_total",
                "Retries of individual catalog searches",
                registry
            )?,
            generation_duration: register_histogram_with_registry!(
                "playlist_generation_duration_seconds",
                "Duration of concept generation including retries",
                registry
            )?,
            resolve_duration: register_histogram_with_registry!(
                "playlist_resolve_duration_seconds",
                "Duration of catalog resolution for one concept",
                registry
            )?,
            assemble_duration: register_histogram_with_registry!(
                "playlist_assemble_duration_seconds",
                "Duration of playlist creation and population",
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "playlist_run_duration_seconds",
                "Duration of whole playlist runs",
                registry
            )?,
        })
    }
}
