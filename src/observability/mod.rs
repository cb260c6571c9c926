pub mod metrics;
pub mod tracing;

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};

use self::metrics::Metrics;

/// Owns the metric registry and the process-wide tracing setup.
#[derive(Debug, Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
}

impl Telemetry {
    /// Initializes tracing and registers metrics on a fresh registry.
    ///
    /// # Errors
    /// Fails when tracing cannot be installed or metric registration fails.
    pub fn new() -> Result<Self> {
        tracing::init()?;
        Self::metrics_only()
    }

    /// Registers metrics without touching the global subscriber.
    ///
    /// # Errors
    /// Fails when metric registration fails.
    pub fn metrics_only() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new(Arc::clone(&registry))?);
        Ok(Self { registry, metrics })
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn metrics_arc(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn record_ready_probe(&self) {
        ::tracing::debug!("ready probe");
    }

    pub fn record_live_probe(&self) {
        ::tracing::debug!("live probe");
    }

    /// Text exposition of every metric in this registry.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_own_registry_only() {
        let telemetry = Telemetry::metrics_only().expect("telemetry");
        telemetry.metrics().runs_started.inc();

        let rendered = telemetry.render_prometheus();
        assert!(rendered.contains("playlist_runs_started_total 1"));

        let other = Telemetry::metrics_only().expect("independent registry");
        assert!(other.render_prometheus().contains("playlist_runs_started_total 0"));
    }
}
