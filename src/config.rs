use std::{env, net::SocketAddr, num::NonZeroUsize, time::Duration};

use thiserror::Error;

/// The catalog accepts at most this many URIs per append call, and a concept is
/// appended in a single batch.
pub const CATALOG_APPEND_LIMIT: usize = 100;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/";
const DEFAULT_SPOTIFY_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com/";

#[derive(Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    gemini_base_url: String,
    gemini_api_key: String,
    gemini_model: String,
    spotify_api_base_url: String,
    spotify_accounts_base_url: String,
    spotify_client_id: String,
    spotify_client_secret: String,
    concept_max_tracks: usize,
    playlist_public: bool,
    search_max_concurrency: NonZeroUsize,
    generation_timeout: Duration,
    search_timeout: Duration,
    collection_timeout: Duration,
    http_connect_timeout: Duration,
    generation_max_attempts: usize,
    search_max_attempts: usize,
    http_backoff_base_ms: u64,
    http_backoff_cap_ms: u64,
}

// Secrets stay out of logs even when the whole config is dumped at startup.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_bind", &self.http_bind)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_model", &self.gemini_model)
            .field("spotify_api_base_url", &self.spotify_api_base_url)
            .field("spotify_accounts_base_url", &self.spotify_accounts_base_url)
            .field("spotify_client_id", &self.spotify_client_id)
            .field("concept_max_tracks", &self.concept_max_tracks)
            .field("playlist_public", &self.playlist_public)
            .field("search_max_concurrency", &self.search_max_concurrency)
            .field("generation_timeout", &self.generation_timeout)
            .field("search_timeout", &self.search_timeout)
            .field("collection_timeout", &self.collection_timeout)
            .field("generation_max_attempts", &self.generation_max_attempts)
            .field("search_max_attempts", &self.search_max_attempts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Loads and validates the service configuration from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a required credential is missing or when a
    /// numeric, boolean or address value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_http_bind()?;

        let gemini_api_key = env_var("GEMINI_API_KEY")?;
        let gemini_base_url =
            env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-pro-latest".to_string());

        let spotify_client_id = env_var("SPOTIFY_CLIENT_ID")?;
        let spotify_client_secret = env_var("SPOTIFY_CLIENT_SECRET")?;
        let spotify_api_base_url = env::var("SPOTIFY_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SPOTIFY_API_BASE_URL.to_string());
        let spotify_accounts_base_url = env::var("SPOTIFY_ACCOUNTS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SPOTIFY_ACCOUNTS_BASE_URL.to_string());

        // Concept shape
        let concept_max_tracks = parse_track_limit("CONCEPT_MAX_TRACKS", 15)?;
        let playlist_public = parse_bool("PLAYLIST_PUBLIC", true)?;

        // Resolution fan-out; 1 keeps the one-search-at-a-time behaviour
        let search_max_concurrency = parse_non_zero_usize("SEARCH_MAX_CONCURRENCY", 1)?;

        // Per-call deadlines
        let generation_timeout = parse_duration_secs("GENERATION_TIMEOUT_SECS", 60)?;
        let search_timeout = parse_duration_ms("SEARCH_TIMEOUT_MS", 5000)?;
        let collection_timeout = parse_duration_ms("COLLECTION_TIMEOUT_MS", 10000)?;
        let http_connect_timeout = parse_duration_ms("HTTP_CONNECT_TIMEOUT_MS", 3000)?;

        // Retry settings (exponential backoff + jitter)
        let generation_max_attempts = parse_attempts("GENERATION_MAX_ATTEMPTS", 2)?;
        let search_max_attempts = parse_attempts("SEARCH_MAX_ATTEMPTS", 2)?;
        let http_backoff_base_ms = parse_u64("HTTP_BACKOFF_BASE_MS", 250)?;
        let http_backoff_cap_ms = parse_u64("HTTP_BACKOFF_CAP_MS", 5000)?;

        Ok(Self {
            http_bind,
            gemini_base_url,
            gemini_api_key,
            gemini_model,
            spotify_api_base_url,
            spotify_accounts_base_url,
            spotify_client_id,
            spotify_client_secret,
            concept_max_tracks,
            playlist_public,
            search_max_concurrency,
            generation_timeout,
            search_timeout,
            collection_timeout,
            http_connect_timeout,
            generation_max_attempts,
            search_max_attempts,
            http_backoff_base_ms,
            http_backoff_cap_ms,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    #[must_use]
    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }

    #[must_use]
    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    #[must_use]
    pub fn spotify_api_base_url(&self) -> &str {
        &self.spotify_api_base_url
    }

    #[must_use]
    pub fn spotify_accounts_base_url(&self) -> &str {
        &self.spotify_accounts_base_url
    }

    #[must_use]
    pub fn spotify_client_id(&self) -> &str {
        &self.spotify_client_id
    }

    #[must_use]
    pub fn spotify_client_secret(&self) -> &str {
        &self.spotify_client_secret
    }

    #[must_use]
    pub fn concept_max_tracks(&self) -> usize {
        self.concept_max_tracks
    }

    #[must_use]
    pub fn playlist_public(&self) -> bool {
        self.playlist_public
    }

    #[must_use]
    pub fn search_max_concurrency(&self) -> NonZeroUsize {
        self.search_max_concurrency
    }

    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }

    #[must_use]
    pub fn search_timeout(&self) -> Duration {
        self.search_timeout
    }

    #[must_use]
    pub fn collection_timeout(&self) -> Duration {
        self.collection_timeout
    }

    #[must_use]
    pub fn http_connect_timeout(&self) -> Duration {
        self.http_connect_timeout
    }

    #[must_use]
    pub fn generation_max_attempts(&self) -> usize {
        self.generation_max_attempts
    }

    #[must_use]
    pub fn search_max_attempts(&self) -> usize {
        self.search_max_attempts
    }

    #[must_use]
    pub fn http_backoff_base_ms(&self) -> u64 {
        self.http_backoff_base_ms
    }

    #[must_use]
    pub fn http_backoff_cap_ms(&self) -> u64 {
        self.http_backoff_cap_ms
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// `PLAYLIST_CURATOR_HTTP_BIND` wins; a bare `PORT` binds on all interfaces.
fn parse_http_bind() -> Result<SocketAddr, ConfigError> {
    const NAME: &str = "PLAYLIST_CURATOR_HTTP_BIND";

    let raw = match (env::var(NAME), env::var("PORT")) {
        (Ok(bind), _) => bind,
        (Err(_), Ok(port)) => format!("0.0.0.0:{port}"),
        (Err(_), Err(_)) => "0.0.0.0:3000".to_string(),
    };

    raw.parse().map_err(|error| ConfigError::Invalid {
        name: NAME,
        source: anyhow::Error::new(error),
    })
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let parsed = parse_usize(name, default)?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_attempts(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    parse_non_zero_usize(name, default).map(NonZeroUsize::get)
}

fn parse_track_limit(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let parsed = parse_usize(name, default)?;
    if parsed == 0 || parsed > CATALOG_APPEND_LIMIT {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 1 and {CATALOG_APPEND_LIMIT}"),
        });
    }
    Ok(parsed)
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(value))
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}
