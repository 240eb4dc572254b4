use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    Authentication,
    Network,
    Api,
    MalformedResponse,
    RetriesExhausted,
    Configuration,
}

impl GenerationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Network => "network",
            Self::Api => "api",
            Self::MalformedResponse => "malformed_response",
            Self::RetriesExhausted => "retries_exhausted",
            Self::Configuration => "configuration",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
    transient: bool,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), transient: false }
    }

    /// A failure worth retrying: transport errors, 429 and 5xx.
    fn transient(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self { transient: true, ..Self::new(kind, message) }
    }
}

/// Settings for one generation client; built once at startup and passed in by reference.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    pub credential: Option<String>,
    pub base_url: String,
    /// Base delay before the first retry; doubles per attempt, plus jitter.
    pub retry_backoff: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_output_tokens: None,
            timeout: None,
            max_retries: 2,
            credential: None,
            base_url: DEFAULT_API_BASE.to_string(),
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_id(&self) -> &str;
}

pub struct GeminiClient {
    client: Client,
    config: GenerationConfig,
}

// Shortened view of long payloads for log lines.
fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...[{} chars total]", head, s.chars().count())
    }
}

fn looks_like_bad_key(body: &str) -> bool {
    body.contains("API_KEY_INVALID") || body.contains("API key not valid")
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::Configuration, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config: config.clone() })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut generation_config = json!({ "temperature": self.config.temperature });
        if let Some(max) = self.config.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max);
        }
        json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": generation_config
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_backoff;
        if base.is_zero() {
            return base;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 2);
        base.saturating_mul(2u32.saturating_pow(attempt)) + Duration::from_millis(jitter_ms)
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model_id,
            api_key
        )
    }

    async fn perform_api_call(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint(api_key);
        info!("🔗 Making request to: {}", self.endpoint("***"));

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::transient(GenerationErrorKind::Network, format!("request failed: {e}")))?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        let response_text = response
            .text()
            .await
            .map_err(|e| GenerationError::transient(GenerationErrorKind::Network, format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            error!("❌ API Error response: {}", preview(&response_text, 500));
            let kind = if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || (status == StatusCode::BAD_REQUEST && looks_like_bad_key(&response_text))
            {
                GenerationErrorKind::Authentication
            } else {
                GenerationErrorKind::Api
            };
            let message = format!("HTTP {}: {}", status.as_u16(), response_text.trim());
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                GenerationError::transient(kind, message)
            } else {
                GenerationError::new(kind, message)
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            GenerationError::new(
                GenerationErrorKind::MalformedResponse,
                format!("failed to parse response: {e}: {}", preview(&response_text, 200)),
            )
        })?;
        extract_text(&parsed)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(api_key) = self.config.credential.as_deref().filter(|k| !k.trim().is_empty()) else {
            warn!("No API key configured; refusing to call Gemini");
            return Err(GenerationError::new(
                GenerationErrorKind::Authentication,
                "missing API key: set GOOGLE_API_KEY",
            ));
        };

        info!(
            model = %self.config.model_id,
            prompt_chars = prompt.len(),
            "Generating testing instructions with Gemini API..."
        );

        let attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            match self.perform_api_call(api_key, prompt).await {
                Ok(text) => {
                    info!("✅ Generated {} chars: {}", text.len(), preview(&text, 80));
                    return Ok(text);
                }
                Err(e) if e.transient && attempt + 1 < attempts => {
                    let delay = self.backoff(attempt);
                    warn!("🔄 Attempt {} of {} failed ({}); retrying in {:?}", attempt + 1, attempts, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.transient && attempts > 1 => {
                    error!("❌ Giving up after {} attempts: {}", attempts, e);
                    return Err(GenerationError::new(
                        GenerationErrorKind::RetriesExhausted,
                        format!("gave up after {attempts} attempts: {e}"),
                    ));
                }
                Err(e) => {
                    error!("❌ Generation failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(default, rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn extract_text(resp: &GeminiResponse) -> Result<String, GenerationError> {
    let Some(candidate) = resp.candidates.first() else {
        let reason = resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
            .map(|r| format!(" (prompt blocked: {r})"))
            .unwrap_or_default();
        return Err(GenerationError::new(
            GenerationErrorKind::MalformedResponse,
            format!("no candidates in response{reason}"),
        ));
    };

    let text: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            Part::Other(_) => None,
        })
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::new(
            GenerationErrorKind::MalformedResponse,
            "no text content found in response",
        ));
    }
    Ok(text.trim().to_string())
}
