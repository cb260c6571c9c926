use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub(super) tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackPage {
    #[serde(default)]
    pub(super) items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrackItem {
    pub(super) uri: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatePlaylistBody<'a> {
    pub(super) name: &'a str,
    pub(super) description: &'a str,
    pub(super) public: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedPlaylist {
    pub(super) id: String,
    #[serde(default)]
    pub(super) external_urls: ExternalUrls,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ExternalUrls {
    #[serde(default)]
    pub(super) spotify: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AppendTracksBody<'a> {
    pub(super) uris: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: String,
    #[serde(default = "default_expires_in")]
    pub(super) expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}
