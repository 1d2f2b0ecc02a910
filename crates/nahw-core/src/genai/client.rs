//! Generation-service client
//!
//! A thin, single-shot adapter over the provider's `generateContent`
//! endpoint. No retry logic lives here; the client is the operation the
//! retrying invoker wraps. The `Generator` trait is the seam through
//! which the pipeline accepts this client or a test double.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::genai::error::GenAiError;
use crate::genai::retry::RetryableError;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_KEY_VAR: &str = "GOOGLE_GENAI_API_KEY";

/// Anything that can turn a prompt into raw model text
///
/// The single suspension point of the pipeline besides the backoff
/// delay itself. Implementations must surface provider failures with a
/// status code or descriptive message so the retry policy can classify
/// them.
pub trait Generator {
    /// Issue one generation request and return the raw textual response
    fn generate(&self, prompt: &str)
        -> impl Future<Output = std::result::Result<String, GenAiError>> + Send;
}

/// Configuration for the generation client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Model identifier appended to the generateContent path
    pub model: String,
    /// Provider base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Use a different model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Point at a different base URL (self-hosted proxy, test server)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Single-shot client for the generateContent API
pub struct GenerationClient {
    http: reqwest::Client,
    config: ClientConfig,
    api_key: String,
}

impl GenerationClient {
    /// Create a client with an explicit API key
    pub fn new(config: ClientConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(anyhow::anyhow!(e)),
            })?;

        Ok(Self { http, config, api_key })
    }

    /// Create a client from the environment
    ///
    /// Loads `.env` if present, then reads the API key from
    /// `GOOGLE_GENAI_API_KEY`.
    pub fn from_env(config: ClientConfig) -> Result<Self> {
        dotenv::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| Error::Configuration {
            message: format!("{} is not set", API_KEY_VAR),
            source: None,
        })?;
        Self::new(config, api_key)
    }

    /// The configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(&self, prompt: &str) -> std::result::Result<String, GenAiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(GenAiError::from_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::from_response(status.as_u16(), &body));
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(GenAiError::from_request_error)?;

        extract_text(&payload)
    }
}

impl Generator for GenerationClient {
    fn generate(&self, prompt: &str)
        -> impl Future<Output = std::result::Result<String, GenAiError>> + Send
    {
        self.generate_content(prompt)
    }
}

impl RetryableError for GenAiError {
    fn status_code(&self) -> Option<u16> {
        self.status_code
    }
}

/// Pull the generated text out of a generateContent response body
///
/// Successful responses nest the text under
/// `candidates[0].content.parts[*].text`; multi-part candidates are
/// concatenated.
fn extract_text(payload: &Value) -> std::result::Result<String, GenAiError> {
    let parts = payload
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| GenAiError::malformed("response contained no generated candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(GenAiError::malformed("generated candidate carried no text parts"));
    }
    Ok(text)
}
