//! Health assistant backed by a generative language model.
//!
//! The assistant never fails from the caller's point of view: a missing API
//! key, a transport error or an empty completion each map to a fixed reply.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const OFFLINE_REPLY: &str =
    "AI Assistant is currently offline (API Key missing). Please contact support.";
pub const TROUBLE_REPLY: &str =
    "I'm having trouble connecting to the server. Please try again later.";
pub const EMPTY_REPLY: &str = "I'm sorry, I couldn't process that request right now.";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Build the full prompt sent to the model for one user question.
pub fn build_prompt(query: &str) -> String {
    format!(
        "You are a helpful and knowledgeable medical assistant for 'HemoCare Hub BD', \
         a blood donation platform in Bangladesh.\n\
         Answer the user's question politely and concisely.\n\
         Focus on blood donation eligibility, health tips, and general medical guidance.\n\
         If the query is an emergency, advise them to call 999 immediately.\n\n\
         User Query: {}",
        query.trim()
    )
}

#[async_trait]
pub trait HealthAssistant: Send + Sync {
    /// Answer a health question. Always produces a user-facing reply.
    async fn advise(&self, query: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiAssistant {
    client: Client,
    config: AssistantConfig,
}

impl GeminiAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("hemocare/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, AssistantError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        debug!("Calling assistant model {}", self.config.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&GenerateRequest {
                contents: [Content {
                    parts: [Part { text: prompt }],
                }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text())
    }
}

#[async_trait]
impl HealthAssistant for GeminiAssistant {
    async fn advise(&self, query: &str) -> String {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return OFFLINE_REPLY.to_string(),
        };

        match self.generate(api_key, &build_prompt(query)).await {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!("Assistant backend error: {}", e);
                TROUBLE_REPLY.to_string()
            }
        }
    }
}
