//! Outbound gateway to the generative-text service.
//!
//! One HTTP call per request, bounded by a fixed timeout, no retries.
//! Callers own the fallback policy; this crate only reports what happened.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI API key is not configured")]
    MissingApiKey,
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI service returned HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("AI returned an empty or invalid response")]
    EmptyResponse,
}

// Wire shape: {contents:[{parts:[{text}]}]} out,
// {candidates:[{content:{parts:[{text}]}}]} back.

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl AiClient {
    pub fn new(api_key: Option<String>, endpoint: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }

    /// Sends the prompt fragments in order and returns the first candidate's
    /// text, trimmed. A missing API key fails before any network traffic.
    pub async fn generate(&self, parts: &[String]) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: parts.iter().map(|text| Part { text: text.clone() }).collect(),
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("AI service HTTP {}: {}", status, body);
            return Err(AiError::Status { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AiError::EmptyResponse)?;

        Ok(text.trim().to_string())
    }
}

/// Turns a model response into a list of choice labels: one per line,
/// leading bullet markers stripped, blank lines dropped.
pub fn split_choice_lines(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', ' ']).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
