use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use prometheus::Registry;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    clients::{
        AppCredentialSource, GeminiClient, GeminiConfig, SpotifyAccountsClient, SpotifyClient,
        SpotifyConfig,
    },
    config::Config,
    model::{Collection, PlaylistConcept, RecommendationRequest, TrackRef},
    observability::metrics::Metrics,
    util::retry::RetryConfig,
};

pub mod assemble;
pub mod error;
pub mod generate;
pub mod parse;
pub(crate) mod prompt;
pub mod resolve;
pub mod state;

use assemble::{AssembleStage, AssemblyRequest, CollectionAssembler};
use generate::{ConceptGenerator, GenerateStage};
use parse::ConceptParser;
use resolve::{ResolveStage, Resolution, TrackResolver};
use state::{RunState, RunTracker};

pub use error::{CredentialStage, FailureKind, PipelineError};

/// Runs one mood description through generation, parsing, catalog resolution
/// and playlist assembly.
pub struct PipelineOrchestrator {
    stages: PipelineStages,
    parser: ConceptParser,
    credentials: Arc<dyn AppCredentialSource>,
    generation_retry: RetryConfig,
    metrics: Arc<Metrics>,
}

struct PipelineStages {
    generate: Arc<dyn GenerateStage>,
    resolve: Arc<dyn ResolveStage>,
    assemble: Arc<dyn AssembleStage>,
}

/// A finished run and the diagnostics gathered along the way.
#[derive(Debug, Clone)]
pub struct PlaylistRun {
    run_id: Uuid,
    concept: PlaylistConcept,
    resolution: Resolution,
    collection: Collection,
    states: Vec<RunState>,
}

impl PlaylistRun {
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn playlist_url(&self) -> &str {
        &self.collection.external_url
    }

    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    #[must_use]
    pub fn concept(&self) -> &PlaylistConcept {
        &self.concept
    }

    #[must_use]
    pub fn tracks_requested(&self) -> usize {
        self.resolution.len()
    }

    #[must_use]
    pub fn tracks_added(&self) -> usize {
        self.resolution.found_uris().len()
    }

    #[must_use]
    pub fn unresolved(&self) -> Vec<&TrackRef> {
        self.resolution.unresolved()
    }

    #[must_use]
    pub fn states(&self) -> &[RunState] {
        &self.states
    }
}

struct Completed {
    concept: PlaylistConcept,
    resolution: Resolution,
    collection: Collection,
}

impl PipelineOrchestrator {
    /// Wires the production clients described by `config`.
    ///
    /// # Errors
    /// Fails when an HTTP client cannot be built from the configured URLs.
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self> {
        let gemini = GeminiClient::new(GeminiConfig {
            base_url: config.gemini_base_url().to_string(),
            api_key: config.gemini_api_key().to_string(),
            model: config.gemini_model().to_string(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.generation_timeout(),
        })?;
        let spotify_config = SpotifyConfig {
            api_base_url: config.spotify_api_base_url().to_string(),
            accounts_base_url: config.spotify_accounts_base_url().to_string(),
            client_id: config.spotify_client_id().to_string(),
            client_secret: config.spotify_client_secret().to_string(),
            connect_timeout: config.http_connect_timeout(),
            total_timeout: config.collection_timeout().max(config.search_timeout()),
        };
        let spotify = Arc::new(SpotifyClient::new(&spotify_config)?);
        let accounts = Arc::new(SpotifyAccountsClient::new(&spotify_config)?);

        let search_retry = RetryConfig::new(
            config.search_max_attempts(),
            config.http_backoff_base_ms(),
            config.http_backoff_cap_ms(),
        );
        let generation_retry = RetryConfig::new(
            config.generation_max_attempts(),
            config.http_backoff_base_ms(),
            config.http_backoff_cap_ms(),
        );

        PipelineBuilder::new(config.concept_max_tracks())
            .with_generate_stage(Arc::new(ConceptGenerator::new(
                Arc::new(gemini),
                config.concept_max_tracks(),
                config.generation_timeout(),
            )))
            .with_resolve_stage(Arc::new(
                TrackResolver::new(
                    Arc::clone(&spotify) as _,
                    config.search_max_concurrency(),
                    config.search_timeout(),
                    search_retry,
                )
                .with_metrics(Arc::clone(&metrics)),
            ))
            .with_assemble_stage(Arc::new(CollectionAssembler::new(
                spotify,
                config.playlist_public(),
                config.collection_timeout(),
            )))
            .with_credentials(accounts)
            .with_generation_retry(generation_retry)
            .with_metrics(metrics)
            .build()
    }

    #[must_use]
    pub fn builder(max_tracks: usize) -> PipelineBuilder {
        PipelineBuilder::new(max_tracks)
    }

    /// Current application credential for catalog searches.
    pub(crate) fn credentials(&self) -> Arc<dyn AppCredentialSource> {
        Arc::clone(&self.credentials)
    }

    /// Executes one run. Every failure leaves as exactly one [`PipelineError`].
    ///
    /// # Errors
    /// See [`FailureKind`] for the possible outcomes.
    pub async fn run(&self, request: &RecommendationRequest) -> Result<PlaylistRun, PipelineError> {
        let run_id = Uuid::now_v7();
        let span = info_span!("playlist_run", %run_id);
        self.run_with_id(run_id, request).instrument(span).await
    }

    async fn run_with_id(
        &self,
        run_id: Uuid,
        request: &RecommendationRequest,
    ) -> Result<PlaylistRun, PipelineError> {
        let started = Instant::now();
        self.metrics.runs_started.inc();
        info!(mood_chars = request.mood_text().chars().count(), "playlist run received");

        let mut tracker = RunTracker::new(Arc::clone(&self.metrics));
        let outcome = self.execute(request, &mut tracker).await;
        self.metrics
            .run_duration
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(completed) => {
                tracker.advance(RunState::Succeeded);
                self.metrics.runs_succeeded.inc();
                let run = PlaylistRun {
                    run_id,
                    concept: completed.concept,
                    resolution: completed.resolution,
                    collection: completed.collection,
                    states: tracker.into_history(),
                };
                info!(
                    playlist_id = %run.collection.id,
                    tracks_added = run.tracks_added(),
                    tracks_requested = run.tracks_requested(),
                    "playlist run succeeded"
                );
                Ok(run)
            }
            Err(failure) => {
                let kind = failure.kind();
                tracker.fail(kind);
                self.metrics
                    .run_failures
                    .with_label_values(&[kind.as_str()])
                    .inc();
                match failure.orphaned_collection() {
                    Some(collection) => error!(
                        kind = %kind,
                        error = %failure,
                        orphaned_playlist_id = %collection.id,
                        "playlist run failed"
                    ),
                    None => warn!(kind = %kind, error = %failure, "playlist run failed"),
                }
                Err(failure)
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    async fn execute(
        &self,
        request: &RecommendationRequest,
        tracker: &mut RunTracker,
    ) -> Result<Completed, PipelineError> {
        tracker.advance(RunState::Generating);
        let raw = self.generate_with_retry(request.mood_text()).await?;

        tracker.advance(RunState::Parsing);
        debug!(raw_output = %raw, "generator output");
        let concept = self.parser.parse(&raw)?;
        self.metrics
            .tracks_requested
            .inc_by(concept.tracks().len() as f64);

        tracker.advance(RunState::Resolving);
        let credential = self
            .credentials
            .app_token()
            .await
            .map_err(|source| PipelineError::CatalogUnavailable { source })?;

        let resolve_started = Instant::now();
        let resolved = self.stages.resolve.resolve(concept.tracks(), &credential).await;
        self.metrics
            .resolve_duration
            .observe(resolve_started.elapsed().as_secs_f64());
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(failure) => {
                if failure.kind() == FailureKind::AuthenticationExpired {
                    self.credentials.invalidate().await;
                }
                return Err(failure);
            }
        };

        let uris = resolution.found_uris();
        self.metrics.tracks_resolved.inc_by(uris.len() as f64);
        self.metrics
            .tracks_unresolved
            .inc_by((resolution.len() - uris.len()) as f64);
        info!(
            requested = resolution.len(),
            resolved = uris.len(),
            "catalog resolution finished"
        );
        if uris.is_empty() {
            return Err(PipelineError::NoMatchesFound {
                requested: resolution.len(),
            });
        }

        tracker.advance(RunState::Assembling);
        let assemble_started = Instant::now();
        let assembled = self
            .stages
            .assemble
            .assemble(AssemblyRequest {
                owner_id: request.requester_catalog_id(),
                title: concept.title(),
                description: concept.description(),
                catalog_uris: &uris,
                credential: request.requester_auth_token(),
            })
            .await;
        self.metrics
            .assemble_duration
            .observe(assemble_started.elapsed().as_secs_f64());

        Ok(Completed {
            collection: assembled?,
            concept,
            resolution,
        })
    }

    async fn generate_with_retry(&self, mood_text: &str) -> Result<String, PipelineError> {
        let started = Instant::now();
        let mut attempt = 1;
        let outcome = loop {
            match self.stages.generate.generate(mood_text).await {
                Ok(raw) => break Ok(raw),
                Err(source) if source.is_retryable() && self.generation_retry.can_retry(attempt) => {
                    let delay = self.generation_retry.delay_for_attempt(attempt);
                    warn!(attempt, error = %source, "concept generation failed; retrying");
                    self.metrics.generation_retries.inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => break Err(PipelineError::GenerationUnavailable { source }),
            }
        };
        self.metrics
            .generation_duration
            .observe(started.elapsed().as_secs_f64());
        outcome
    }
}

/// Assembles a [`PipelineOrchestrator`] from explicit stages.
pub struct PipelineBuilder {
    max_tracks: usize,
    generate: Option<Arc<dyn GenerateStage>>,
    resolve: Option<Arc<dyn ResolveStage>>,
    assemble: Option<Arc<dyn AssembleStage>>,
    credentials: Option<Arc<dyn AppCredentialSource>>,
    generation_retry: RetryConfig,
    metrics: Option<Arc<Metrics>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new(max_tracks: usize) -> Self {
        Self {
            max_tracks,
            generate: None,
            resolve: None,
            assemble: None,
            credentials: None,
            generation_retry: RetryConfig::single_attempt(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_generate_stage(mut self, stage: Arc<dyn GenerateStage>) -> Self {
        self.generate = Some(stage);
        self
    }

    #[must_use]
    pub fn with_resolve_stage(mut self, stage: Arc<dyn ResolveStage>) -> Self {
        self.resolve = Some(stage);
        self
    }

    #[must_use]
    pub fn with_assemble_stage(mut self, stage: Arc<dyn AssembleStage>) -> Self {
        self.assemble = Some(stage);
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn AppCredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_generation_retry(mut self, retry: RetryConfig) -> Self {
        self.generation_retry = retry;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// # Errors
    /// Fails when a stage or the credential source was never supplied.
    pub fn build(self) -> Result<PipelineOrchestrator> {
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(
                Metrics::new(Arc::new(Registry::new()))
                    .context("failed to register pipeline metrics")?,
            ),
        };

        Ok(PipelineOrchestrator {
            stages: PipelineStages {
                generate: self
                    .generate
                    .ok_or_else(|| anyhow!("generate stage must be configured before build"))?,
                resolve: self
                    .resolve
                    .ok_or_else(|| anyhow!("resolve stage must be configured before build"))?,
                assemble: self
                    .assemble
                    .ok_or_else(|| anyhow!("assemble stage must be configured before build"))?,
            },
            parser: ConceptParser::new(self.max_tracks),
            credentials: self
                .credentials
                .ok_or_else(|| anyhow!("credential source must be configured before build"))?,
            generation_retry: self.generation_retry,
            metrics,
        })
    }
}
