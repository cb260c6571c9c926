//! Spotify Web API client: track search and playlist writes.
pub(crate) mod accounts;
mod models;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{
    AppToken, CatalogSearch, ClientError, CollectionDraft, CollectionService, UserToken,
    ensure_success, extend_path,
};
use crate::model::{Collection, TrackRef};

pub(crate) use accounts::SpotifyAccountsClient;
use models::{AppendTracksBody, CreatePlaylistBody, CreatedPlaylist, SearchResponse};

const SEARCH_SERVICE: &str = "spotify-search";
const PLAYLIST_SERVICE: &str = "spotify-playlists";
const PLAYLIST_WEB_BASE: &str = "https://open.spotify.com/playlist/";

#[derive(Debug, Clone)]
pub(crate) struct SpotifyConfig {
    pub(crate) api_base_url: String,
    pub(crate) accounts_base_url: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) total_timeout: Duration,
}

#[derive(Debug, Clone)]
pub(crate) struct SpotifyClient {
    client: Client,
    base_url: Url,
}

impl SpotifyClient {
    /// # Errors
    /// Fails when the HTTP client cannot be built or the API base URL is invalid.
    pub(crate) fn new(config: &SpotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build spotify HTTP client")?;

        let base_url =
            Url::parse(&config.api_base_url).context("invalid spotify API base URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("spotify API base URL cannot carry a path: {base_url}");
        }

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, service: &'static str, segments: &[&str]) -> Result<Url, ClientError> {
        extend_path(&self.base_url, segments).ok_or_else(|| ClientError::Url {
            service,
            detail: format!("{} cannot carry a path", self.base_url),
        })
    }
}

fn playlist_web_url(playlist_id: &str) -> String {
    format!("{PLAYLIST_WEB_BASE}{playlist_id}")
}

/// Catalog query syntax: field filters on track title and artist.
pub(crate) fn search_query(track: &TrackRef) -> String {
    format!("track:{} artist:{}", track.track_name, track.artist_name)
}

#[async_trait]
impl CatalogSearch for SpotifyClient {
    async fn search_track(
        &self,
        track: &TrackRef,
        credential: &AppToken,
    ) -> Result<Option<String>, ClientError> {
        let mut url = self.endpoint(SEARCH_SERVICE, &["v1", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", &search_query(track))
            .append_pair("type", "track")
            .append_pair("limit", "1");

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.secret())
            .send()
            .await
            .map_err(ClientError::transport(SEARCH_SERVICE))?;

        let body: SearchResponse = ensure_success(SEARCH_SERVICE, response)
            .await?
            .json()
            .await
            .map_err(ClientError::decode(SEARCH_SERVICE))?;

        Ok(body
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.uri))
    }
}

#[async_trait]
impl CollectionService for SpotifyClient {
    async fn create_collection(
        &self,
        owner_id: &str,
        draft: CollectionDraft<'_>,
        credential: &UserToken,
    ) -> Result<Collection, ClientError> {
        let url = self.endpoint(PLAYLIST_SERVICE, &["v1", "users", owner_id, "playlists"])?;
        let body = CreatePlaylistBody {
            name: draft.name,
            description: draft.description,
            public: draft.public,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(credential.secret())
            .json(&body)
            .send()
            .await
            .map_err(ClientError::transport(PLAYLIST_SERVICE))?;

        let created: CreatedPlaylist = ensure_success(PLAYLIST_SERVICE, response)
            .await?
            .json()
            .await
            .map_err(ClientError::decode(PLAYLIST_SERVICE))?;

        debug!(playlist_id = %created.id, "playlist created");

        // A missing link is rebuilt from the playlist id.
        let external_url = created
            .external_urls
            .spotify
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| playlist_web_url(&created.id));

        Ok(Collection {
            id: created.id,
            external_url,
        })
    }

    async fn append_tracks(
        &self,
        collection_id: &str,
        catalog_uris: &[String],
        credential: &UserToken,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(PLAYLIST_SERVICE, &["v1", "playlists", collection_id, "tracks"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(credential.secret())
            .json(&AppendTracksBody { uris: catalog_uris })
            .send()
            .await
            .map_err(ClientError::transport(PLAYLIST_SERVICE))?;

        ensure_success(PLAYLIST_SERVICE, response).await?;
        Ok(())
    }
}
