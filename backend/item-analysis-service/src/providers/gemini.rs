//! Gemini `generateContent` integration for item photos
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{PromptPayload, VisionProvider};

const API_KEY_HEADER: &str = "x-goog-api-key";
/// Longest slice of an error body we put in logs
const LOGGED_BODY_LIMIT: usize = 512;

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_base: String,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        });

        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl VisionProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, api_key: &SecretString, payload: &PromptPayload) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: &payload.prompt,
                    },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: payload.media_type.as_mime(),
                            data: STANDARD.encode(&payload.image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.generate_url(&payload.model))
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("network error: {}", e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                model = %payload.model,
                body = %truncate(&body, LOGGED_BODY_LIMIT),
                "Gemini request failed"
            );
            return Err(status_error(status, &body));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("malformed provider envelope: {}", e.without_url()))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = %payload.model,
            "Gemini response received"
        );

        extract_text(envelope)
    }

    async fn probe(&self, api_key: &SecretString) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/models", self.api_base))
            .query(&[("pageSize", "1")])
            .header(API_KEY_HEADER, api_key.expose_secret())
            .send()
            .await
            .map_err(|e| anyhow!("network error: {}", e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, &body).context("Gemini connectivity probe failed"))
        }
    }
}

/// Turn a non-success status into an error worded for the classifier
///
/// The body can echo request details, so it goes to the log only.
fn status_error(status: StatusCode, body: &str) -> anyhow::Error {
    match status {
        StatusCode::BAD_REQUEST if body.to_lowercase().contains("api key") => {
            anyhow!("authentication failed: invalid api key")
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            anyhow!("authentication failed ({})", status.as_u16())
        }
        StatusCode::TOO_MANY_REQUESTS => anyhow!("rate limit exceeded (429)"),
        StatusCode::BAD_REQUEST => {
            anyhow!("cannot process request: provider responded with {}", status)
        }
        s if s.is_server_error() => anyhow!("network error: provider responded with {}", status),
        _ => anyhow!("provider responded with {}", status),
    }
}

/// Concatenated text of the first candidate
fn extract_text(envelope: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = envelope.prompt_feedback.and_then(|f| f.block_reason) {
        bail!("cannot process image: blocked ({})", reason);
    }

    let candidate = envelope
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("empty response from provider"))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if matches!(reason, "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST") {
            bail!("cannot process image: blocked ({})", reason);
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!("empty response from provider");
    }
    Ok(text)
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
