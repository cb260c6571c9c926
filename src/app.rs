use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use crate::{api, config::Config, observability::Telemetry, pipeline::PipelineOrchestrator};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

/// Long-lived components shared by every request.
pub struct ComponentRegistry {
    telemetry: Telemetry,
    pipeline: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn pipeline(&self) -> &PipelineOrchestrator {
        &self.registry.pipeline
    }
}

impl ComponentRegistry {
    /// Initializes telemetry and wires the pipeline against the configured services.
    ///
    /// # Errors
    /// Fails when telemetry cannot be initialized or an HTTP client cannot be built.
    pub fn build(config: &Config) -> Result<Self> {
        let telemetry = Telemetry::new()?;
        let pipeline = PipelineOrchestrator::from_config(config, telemetry.metrics_arc())
            .context("failed to wire playlist pipeline")?;
        Ok(Self::new(telemetry, pipeline))
    }

    /// Registry around an already assembled pipeline.
    #[must_use]
    pub fn new(telemetry: Telemetry, pipeline: PipelineOrchestrator) -> Self {
        Self {
            telemetry,
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
