//! Values flowing through one pipeline run.
use serde::Serialize;

use crate::{clients::UserToken, pipeline::PipelineError};

/// Validated input of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    mood_text: String,
    requester_catalog_id: String,
    requester_auth_token: UserToken,
}

impl RecommendationRequest {
    /// Builds a request, rejecting blank fields before anything leaves the process.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidRequest`] naming every blank field.
    pub fn new(
        mood_text: impl Into<String>,
        requester_catalog_id: impl Into<String>,
        requester_auth_token: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let mood_text = mood_text.into().trim().to_string();
        let requester_catalog_id = requester_catalog_id.into().trim().to_string();
        let requester_auth_token = requester_auth_token.into().trim().to_string();

        let missing: Vec<&str> = [
            ("mood", mood_text.is_empty()),
            ("spotifyUserId", requester_catalog_id.is_empty()),
            ("spotifyAccessToken", requester_auth_token.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, blank)| blank.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(PipelineError::InvalidRequest(format!(
                "missing required parameters: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            mood_text,
            requester_catalog_id,
            requester_auth_token: UserToken::new(requester_auth_token),
        })
    }

    #[must_use]
    pub fn mood_text(&self) -> &str {
        &self.mood_text
    }

    #[must_use]
    pub fn requester_catalog_id(&self) -> &str {
        &self.requester_catalog_id
    }

    #[must_use]
    pub fn requester_auth_token(&self) -> &UserToken {
        &self.requester_auth_token
    }
}

/// A song named by the generator, not yet tied to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub track_name: String,
    pub artist_name: String,
}

impl TrackRef {
    #[must_use]
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
        }
    }
}

/// Structured playlist idea produced from the generator's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistConcept {
    title: String,
    description: String,
    tracks: Vec<TrackRef>,
}

impl PlaylistConcept {
    pub(crate) fn new(title: String, description: String, tracks: Vec<TrackRef>) -> Self {
        Self {
            title,
            description,
            tracks,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }
}

/// Outcome of looking one [`TrackRef`] up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrack {
    track: TrackRef,
    catalog_uri: Option<String>,
}

impl ResolvedTrack {
    #[must_use]
    pub fn found(track: TrackRef, catalog_uri: impl Into<String>) -> Self {
        Self {
            track,
            catalog_uri: Some(catalog_uri.into()),
        }
    }

    #[must_use]
    pub fn absent(track: TrackRef) -> Self {
        Self {
            track,
            catalog_uri: None,
        }
    }

    #[must_use]
    pub fn track(&self) -> &TrackRef {
        &self.track
    }

    #[must_use]
    pub fn catalog_uri(&self) -> Option<&str> {
        self.catalog_uri.as_deref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.catalog_uri.is_some()
    }
}

/// A playlist persisted on the streaming service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub external_url: String,
}
