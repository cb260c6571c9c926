//! Client-credentials grant against the Spotify accounts service.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info};

use super::SpotifyConfig;
use super::models::TokenResponse;
use crate::clients::{
    AppCredentialSource, AppToken, ClientError, ensure_success, extend_path, within,
};

const SERVICE: &str = "spotify-accounts";
/// Tokens are refreshed this long before the service would expire them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct CachedToken {
    token: AppToken,
    refresh_at: Instant,
}

/// Fetches and caches the application token used for catalog searches.
#[derive(Debug)]
pub(crate) struct SpotifyAccountsClient {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    request_timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl SpotifyAccountsClient {
    /// # Errors
    /// Fails when the HTTP client cannot be built or the accounts URL is invalid.
    pub(crate) fn new(config: &SpotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .context("failed to build spotify accounts HTTP client")?;

        let base_url =
            Url::parse(&config.accounts_base_url).context("invalid spotify accounts base URL")?;
        let token_url = extend_path(&base_url, &["api", "token"])
            .context("spotify accounts base URL cannot carry a path")?;

        Ok(Self {
            client,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            request_timeout: config.total_timeout,
            cached: Mutex::new(None),
        })
    }

    async fn request_token(&self) -> Result<CachedToken, ClientError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(ClientError::transport(SERVICE))?;

        let body: TokenResponse = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(ClientError::decode(SERVICE))?;

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_MARGIN);
        info!(
            expires_in_secs = body.expires_in,
            "obtained spotify application token"
        );

        Ok(CachedToken {
            token: AppToken::new(body.access_token),
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl AppCredentialSource for SpotifyAccountsClient {
    async fn app_token(&self) -> Result<AppToken, ClientError> {
        // Held across the fetch so concurrent callers share one token request.
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                return Ok(entry.token.clone());
            }
            debug!("cached spotify application token is due for refresh");
        }

        let fresh = within(SERVICE, self.request_timeout, self.request_token()).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("dropped cached spotify application token");
        }
    }
}
