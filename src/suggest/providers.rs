use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, ProviderConfig};

use super::prompt::{SYSTEM_PROMPT, build_prompt, clean_reply};
use super::types::{SuggestError, SuggestRequest};

// ---------------------------------------------------------------------------
// Suggester trait
// ---------------------------------------------------------------------------

/// Source of moves for an external opponent. Implementations return a raw
/// move token; the session decodes and validates it.
pub trait MoveSuggester: Send + Sync {
    /// Ask for one move in the position described by `request`.
    fn suggest<'a>(
        &'a self,
        request: &'a SuggestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SuggestError>> + Send + 'a>>;

    /// Suggester name for logging / response metadata.
    fn name(&self) -> &str;
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, SuggestError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SuggestError::Provider(e.to_string()))
}

// ---------------------------------------------------------------------------
// Gemini suggester
// ---------------------------------------------------------------------------

/// Asks a Gemini model through the `generateContent` API.
#[derive(Debug)]
pub struct GeminiSuggester {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiSystemInstruction,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiSuggester {
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, SuggestError> {
        if config.api_key.is_empty() {
            return Err(SuggestError::MissingApiKey("gemini".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

impl MoveSuggester for GeminiSuggester {
    fn suggest<'a>(
        &'a self,
        request: &'a SuggestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SuggestError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/{}:generateContent", self.endpoint, self.model);

            let body = GeminiRequest {
                system_instruction: GeminiSystemInstruction {
                    parts: vec![GeminiPart {
                        text: SYSTEM_PROMPT.to_string(),
                    }],
                },
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart {
                        text: build_prompt(request),
                    }],
                }],
                generation_config: GeminiGenerationConfig {
                    max_output_tokens: 16,
                    temperature: 0.7,
                },
            };

            let resp = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| SuggestError::Unreachable(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(SuggestError::Provider(format!(
                    "gemini returned {}: {}",
                    status, text
                )));
            }

            let parsed: GeminiResponse = resp
                .json()
                .await
                .map_err(|e| SuggestError::Parse(e.to_string()))?;

            let text = parsed
                .candidates
                .first()
                .and_then(|c| c.content.parts.first())
                .map(|p| p.text.as_str())
                .ok_or_else(|| SuggestError::Parse("empty candidates".to_string()))?;

            clean_reply(text).ok_or(SuggestError::Empty)
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// HTTP suggester
// ---------------------------------------------------------------------------

/// POSTs the request JSON to an endpoint that answers with
/// `{"geminiMove": "<token>"}`.
#[derive(Debug)]
pub struct HttpSuggester {
    pub url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpSuggestResponse {
    gemini_move: Option<String>,
}

impl HttpSuggester {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SuggestError> {
        if url.is_empty() {
            return Err(SuggestError::Provider("no suggest URL configured".to_string()));
        }
        Ok(Self {
            url: url.to_string(),
            client: http_client(timeout)?,
        })
    }
}

impl MoveSuggester for HttpSuggester {
    fn suggest<'a>(
        &'a self,
        request: &'a SuggestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SuggestError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .client
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| SuggestError::Unreachable(e.to_string()))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(SuggestError::Provider(format!(
                    "{} returned {}: {}",
                    self.url, status, text
                )));
            }

            let parsed: HttpSuggestResponse = resp
                .json()
                .await
                .map_err(|e| SuggestError::Parse(e.to_string()))?;

            parsed
                .gemini_move
                .as_deref()
                .and_then(clean_reply)
                .ok_or(SuggestError::Empty)
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ---------------------------------------------------------------------------
// Random suggester
// ---------------------------------------------------------------------------

/// Offline opponent: plays a uniformly random legal move.
#[derive(Debug, Default)]
pub struct RandomSuggester;

impl MoveSuggester for RandomSuggester {
    fn suggest<'a>(
        &'a self,
        request: &'a SuggestRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SuggestError>> + Send + 'a>> {
        let choice = request
            .legal_moves
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(SuggestError::Empty);
        Box::pin(async move { choice })
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create the suggester selected by `config.suggester`.
pub fn create_suggester(config: &AppConfig) -> Result<Arc<dyn MoveSuggester>, SuggestError> {
    let timeout = config.ai_timeout();
    match config.suggester.as_str() {
        "gemini" => Ok(Arc::new(GeminiSuggester::new(&config.gemini, timeout)?)),
        "http" => {
            let url = config.suggest_url.as_deref().unwrap_or_default();
            Ok(Arc::new(HttpSuggester::new(url, timeout)?))
        }
        "random" => Ok(Arc::new(RandomSuggester)),
        other => Err(SuggestError::UnsupportedProvider(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
