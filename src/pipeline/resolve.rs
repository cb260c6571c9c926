use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{CredentialStage, PipelineError};
use crate::{
    clients::{AppToken, CatalogSearch, ClientError, within},
    model::{ResolvedTrack, TrackRef},
    observability::metrics::Metrics,
    util::retry::RetryConfig,
};

const SERVICE: &str = "spotify-search";

/// Per-reference search outcomes, in the order the references were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    tracks: Vec<ResolvedTrack>,
}

impl Resolution {
    #[must_use]
    pub fn new(tracks: Vec<ResolvedTrack>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn tracks(&self) -> &[ResolvedTrack] {
        &self.tracks
    }

    /// Catalog URIs of the matched references, order preserved.
    #[must_use]
    pub fn found_uris(&self) -> Vec<String> {
        self.tracks
            .iter()
            .filter_map(|track| track.catalog_uri().map(ToString::to_string))
            .collect()
    }

    #[must_use]
    pub fn unresolved(&self) -> Vec<&TrackRef> {
        self.tracks
            .iter()
            .filter(|track| !track.is_resolved())
            .map(ResolvedTrack::track)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[async_trait]
pub trait ResolveStage: Send + Sync {
    /// Resolves every reference; a rejected credential aborts the whole stage.
    async fn resolve(
        &self,
        tracks: &[TrackRef],
        credential: &AppToken,
    ) -> Result<Resolution, PipelineError>;
}

/// Searches the catalog for each reference, at most `concurrency` at a time.
pub struct TrackResolver {
    catalog: Arc<dyn CatalogSearch>,
    concurrency: NonZeroUsize,
    call_timeout: Duration,
    retry: RetryConfig,
    metrics: Option<Arc<Metrics>>,
}

impl TrackResolver {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        concurrency: NonZeroUsize,
        call_timeout: Duration,
        retry: RetryConfig,
    ) -> Self {
        Self {
            catalog,
            concurrency,
            call_timeout,
            retry,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn lookup(
        &self,
        track: &TrackRef,
        credential: &AppToken,
    ) -> Result<Option<String>, ClientError> {
        let mut attempt = 1;
        loop {
            match within(
                SERVICE,
                self.call_timeout,
                self.catalog.search_track(track, credential),
            )
            .await
            {
                Err(error) if error.is_retryable() && self.retry.can_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(
                        track = %track.track_name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying catalog search"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.search_retries.inc();
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[async_trait]
impl ResolveStage for TrackResolver {
    async fn resolve(
        &self,
        tracks: &[TrackRef],
        credential: &AppToken,
    ) -> Result<Resolution, PipelineError> {
        let pending: Vec<_> = tracks
            .iter()
            .map(|track| async move { (track, self.lookup(track, credential).await) })
            .collect();
        let mut lookups = stream::iter(pending).buffered(self.concurrency.get());

        let mut resolved = Vec::with_capacity(tracks.len());
        while let Some((track, outcome)) = lookups.next().await {
            let entry = match outcome {
                Ok(Some(uri)) => ResolvedTrack::found(track.clone(), uri),
                Ok(None) => {
                    debug!(
                        track = %track.track_name,
                        artist = %track.artist_name,
                        "no catalog match"
                    );
                    ResolvedTrack::absent(track.clone())
                }
                // Dropping the stream abandons searches still in flight.
                Err(error) if error.is_unauthorized() => {
                    warn!(
                        service = error.service(),
                        error = %error,
                        "catalog rejected the search credential"
                    );
                    return Err(PipelineError::AuthenticationExpired {
                        stage: CredentialStage::Resolving,
                        source: error,
                    });
                }
                Err(error) => {
                    warn!(
                        track = %track.track_name,
                        artist = %track.artist_name,
                        service = error.service(),
                        error = %error,
                        "catalog search failed; marking track absent"
                    );
                    ResolvedTrack::absent(track.clone())
                }
            };
            resolved.push(entry);
        }

        Ok(Resolution::new(resolved))
    }
}
