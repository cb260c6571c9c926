//! Gemini `generateContent` client.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientError, TextGenerator, ensure_success, extend_path};

const SERVICE: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub(crate) struct GeminiConfig {
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) total_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    /// # Errors
    /// Fails when the HTTP client cannot be built or the base URL/model do not
    /// form a valid endpoint.
    pub(crate) fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build gemini HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid gemini base URL")?;
        let method = format!("{}:generateContent", config.model);
        let endpoint = extend_path(&base_url, &["v1beta", "models", &method])
            .context("gemini base URL cannot carry a path")?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, ClientError> {
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        debug!(prompt_chars = prompt.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::transport(SERVICE))?;

        let body: GenerateContentResponse = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(ClientError::decode(SERVICE))?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Err(ClientError::Decode {
                service: SERVICE,
                detail: "response contained no candidates".to_string(),
            });
        };

        debug!(finish_reason = ?candidate.finish_reason, "generateContent answered");

        // Text parts are concatenated as-is; interpreting them is the parser's job.
        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}
