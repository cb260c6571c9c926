use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{error, info};

use super::error::{CredentialStage, PipelineError};
use crate::{
    clients::{ClientError, CollectionDraft, CollectionService, UserToken, within},
    config::CATALOG_APPEND_LIMIT,
    model::Collection,
};

const SERVICE: &str = "spotify-playlists";

/// What the assembler needs to persist one playlist.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    pub owner_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub catalog_uris: &'a [String],
    pub credential: &'a UserToken,
}

#[async_trait]
pub trait AssembleStage: Send + Sync {
    async fn assemble(&self, request: AssemblyRequest<'_>) -> Result<Collection, PipelineError>;
}

/// Creates the playlist, then appends every resolved URI.
pub struct CollectionAssembler {
    collections: Arc<dyn CollectionService>,
    public: bool,
    call_timeout: Duration,
}

impl CollectionAssembler {
    #[must_use]
    pub fn new(collections: Arc<dyn CollectionService>, public: bool, call_timeout: Duration) -> Self {
        Self {
            collections,
            public,
            call_timeout,
        }
    }
}

#[async_trait]
impl AssembleStage for CollectionAssembler {
    async fn assemble(&self, request: AssemblyRequest<'_>) -> Result<Collection, PipelineError> {
        let draft = CollectionDraft {
            name: request.title,
            description: request.description,
            public: self.public,
        };

        let collection = within(
            SERVICE,
            self.call_timeout,
            self.collections
                .create_collection(request.owner_id, draft, request.credential),
        )
        .await
        .map_err(|source| {
            if matches!(source, ClientError::Decode { .. }) {
                error!(
                    owner_id = request.owner_id,
                    error = %source,
                    "playlist create succeeded with an unreadable body; a playlist may be left behind"
                );
            }
            if source.is_unauthorized() {
                PipelineError::AuthenticationExpired {
                    stage: CredentialStage::Assembling,
                    source,
                }
            } else {
                PipelineError::CollectionCreateFailed { source }
            }
        })?;

        info!(
            playlist_id = %collection.id,
            tracks = request.catalog_uris.len(),
            "playlist created; adding tracks"
        );

        // A concept never exceeds the append limit, so this is a single call.
        for batch in request.catalog_uris.chunks(CATALOG_APPEND_LIMIT) {
            let appended = within(
                SERVICE,
                self.call_timeout,
                self.collections
                    .append_tracks(&collection.id, batch, request.credential),
            )
            .await;

            if let Err(source) = appended {
                error!(
                    playlist_id = %collection.id,
                    playlist_url = %collection.external_url,
                    service = source.service(),
                    error = %source,
                    "playlist left without tracks after append failure"
                );
                return Err(PipelineError::TrackAppendFailed { collection, source });
            }
        }

        Ok(collection)
    }
}
