use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use crate::{
    app::AppState,
    model::{RecommendationRequest, TrackRef},
    pipeline::PipelineError,
};

/// Body of `POST /api/create-playlist`; absent fields are reported as invalid
/// rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePlaylistRequest {
    #[serde(default, alias = "moodText")]
    mood: Option<String>,
    #[serde(default, alias = "requesterAuthToken")]
    spotify_access_token: Option<String>,
    #[serde(default, alias = "requesterCatalogId")]
    spotify_user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePlaylistResponse {
    playlist_url: String,
    tracks_added: usize,
    tracks_requested: usize,
    unresolved_tracks: Vec<TrackRef>,
}

pub(crate) async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlaylistRequest>, JsonRejection>,
) -> Result<Json<CreatePlaylistResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        PipelineError::InvalidRequest(format!("malformed request body: {}", rejection.body_text()))
    })?;

    let request = RecommendationRequest::new(
        payload.mood.unwrap_or_default(),
        payload.spotify_user_id.unwrap_or_default(),
        payload.spotify_access_token.unwrap_or_default(),
    )?;

    let run = state.pipeline().run(&request).await?;
    info!(
        run_id = %run.run_id(),
        playlist_id = %run.collection().id,
        "playlist delivered"
    );

    Ok(Json(CreatePlaylistResponse {
        playlist_url: run.playlist_url().to_string(),
        tracks_added: run.tracks_added(),
        tracks_requested: run.tracks_requested(),
        unresolved_tracks: run.unresolved().into_iter().cloned().collect(),
    }))
}
