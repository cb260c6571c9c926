//! In-memory stand-ins for the external services.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use playlist_curator::{
    clients::{
        AppCredentialSource, AppToken, CatalogSearch, ClientError, CollectionDraft,
        CollectionService, TextGenerator, UserToken,
    },
    model::{Collection, RecommendationRequest, TrackRef},
    observability::Telemetry,
    pipeline::{
        PipelineOrchestrator, assemble::CollectionAssembler, generate::ConceptGenerator,
        resolve::TrackResolver,
    },
    util::retry::RetryConfig,
};
use reqwest::StatusCode;

pub const PLAYLIST_URL: &str = "https://open.spotify.com/playlist/37i9dQZF1DX";

/// Answers every prompt with the same text.
pub struct CannedGenerator {
    pub output: String,
    pub calls: AtomicUsize,
}

impl CannedGenerator {
    pub fn new(output: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            output: output.into(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate_text(&self, _prompt: &str) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Catalog keyed by track name; unknown names miss.
#[derive(Default)]
pub struct FakeCatalog {
    pub hits: HashMap<String, String>,
    pub rejected: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_hits<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            hits: names
                .into_iter()
                .map(|name| (name.to_string(), catalog_uri(name)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn catalog_uri(name: &str) -> String {
    format!("spotify:track:{}", name.replace(' ', "-").to_lowercase())
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search_track(
        &self,
        track: &TrackRef,
        _credential: &AppToken,
    ) -> Result<Option<String>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(&track.track_name) {
            return Err(ClientError::Unauthorized {
                service: "spotify-search",
                status: StatusCode::UNAUTHORIZED,
            });
        }
        Ok(self.hits.get(&track.track_name).cloned())
    }
}

/// Records playlist writes and optionally fails the append call.
#[derive(Default)]
pub struct FakeCollections {
    pub fail_append: bool,
    pub creates: AtomicUsize,
    pub appended: Mutex<Vec<String>>,
}

impl FakeCollections {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn appended(&self) -> Vec<String> {
        self.appended.lock().expect("appended lock").clone()
    }
}

#[async_trait]
impl CollectionService for FakeCollections {
    async fn create_collection(
        &self,
        _owner_id: &str,
        _draft: CollectionDraft<'_>,
        _credential: &UserToken,
    ) -> Result<Collection, ClientError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Collection {
            id: "37i9dQZF1DX".to_string(),
            external_url: PLAYLIST_URL.to_string(),
        })
    }

    async fn append_tracks(
        &self,
        _collection_id: &str,
        catalog_uris: &[String],
        _credential: &UserToken,
    ) -> Result<(), ClientError> {
        if self.fail_append {
            return Err(ClientError::Status {
                service: "spotify-playlists",
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            });
        }
        self.appended
            .lock()
            .expect("appended lock")
            .extend_from_slice(catalog_uris);
        Ok(())
    }
}

#[derive(Default)]
pub struct FixedCredentials {
    pub invalidations: AtomicUsize,
}

#[async_trait]
impl AppCredentialSource for FixedCredentials {
    async fn app_token(&self) -> Result<AppToken, ClientError> {
        Ok(AppToken::new("app-token"))
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Fixture {
    pub generator: Arc<CannedGenerator>,
    pub catalog: Arc<FakeCatalog>,
    pub collections: Arc<FakeCollections>,
    pub credentials: Arc<FixedCredentials>,
    pub telemetry: Telemetry,
    pub pipeline: PipelineOrchestrator,
}

/// Wires the real stages around the fakes.
pub fn fixture(raw_concept: &str, catalog: FakeCatalog, collections: FakeCollections) -> Fixture {
    let generator = CannedGenerator::new(raw_concept);
    let catalog = Arc::new(catalog);
    let collections = Arc::new(collections);
    let credentials = Arc::new(FixedCredentials::default());
    let telemetry = Telemetry::metrics_only().expect("telemetry");

    let pipeline = PipelineOrchestrator::builder(15)
        .with_generate_stage(Arc::new(ConceptGenerator::new(
            Arc::clone(&generator) as _,
            15,
            Duration::from_secs(5),
        )))
        .with_resolve_stage(Arc::new(TrackResolver::new(
            Arc::clone(&catalog) as _,
            NonZeroUsize::new(3).expect("non-zero"),
            Duration::from_secs(5),
            RetryConfig::single_attempt(),
        )))
        .with_assemble_stage(Arc::new(CollectionAssembler::new(
            Arc::clone(&collections) as _,
            true,
            Duration::from_secs(5),
        )))
        .with_credentials(Arc::clone(&credentials) as _)
        .with_metrics(telemetry.metrics_arc())
        .build()
        .expect("pipeline builds");

    Fixture {
        generator,
        catalog,
        collections,
        credentials,
        telemetry,
        pipeline,
    }
}

/// A concept JSON document naming `tracks` as `(track, artist)` pairs.
pub fn concept_json(title: &str, tracks: &[(&str, &str)]) -> String {
    serde_json::json!({
        "playlist_title": title,
        "playlist_description": format!("{title}, curated"),
        "tracks": tracks
            .iter()
            .map(|(track, artist)| serde_json::json!({ "track_name": track, "artist_name": artist }))
            .collect::<Vec<_>>()
    })
    .to_string()
}

pub fn request(mood: &str) -> RecommendationRequest {
    RecommendationRequest::new(mood, "listener-42", "BQD-user-token").expect("valid request")
}
