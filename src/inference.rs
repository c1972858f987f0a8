//! Client side of the hosted chat-completions endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use serde::Serialize;
use thiserror::Error;

use crate::models::ChatMessage;

#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body: String,
  },

  #[error("could not decode provider response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("provider response had no choices")]
  EmptyChoices,

  #[error("credential is not a valid header value: {0}")]
  Credential(#[from] InvalidHeaderValue),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ResponseFormat {
  #[serde(rename = "type")]
  pub kind: String,
}

impl ResponseFormat {
  pub fn json_object() -> Self {
    Self {
      kind: "json_object".to_string(),
    }
  }
}

/// Body of a chat-completions call.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CompletionRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_format: Option<ResponseFormat>,
}

/// Content of the first choice. Some providers hand back an already decoded
/// JSON document instead of a string; `Empty` is a `null` content.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyContent {
  Text(String),
  Structured(serde_json::Value),
  Empty,
}

impl ReplyContent {
  pub fn from_value(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::String(text) => ReplyContent::Text(text),
      serde_json::Value::Null => ReplyContent::Empty,
      value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_)) => ReplyContent::Structured(value),
      other => ReplyContent::Text(other.to_string()),
    }
  }

  pub fn into_text(self) -> Option<String> {
    match self {
      ReplyContent::Text(text) => Some(text),
      ReplyContent::Structured(value) => Some(value.to_string()),
      ReplyContent::Empty => None,
    }
  }
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
  async fn complete(&self, request: &CompletionRequest) -> Result<ReplyContent, InferenceError>;
}

pub fn extract_content(body: &serde_json::Value) -> Result<ReplyContent, InferenceError> {
  let choice = body["choices"]
    .as_array()
    .and_then(|choices| choices.first())
    .ok_or(InferenceError::EmptyChoices)?;
  Ok(ReplyContent::from_value(choice["message"]["content"].clone()))
}

pub struct OpenAiClient {
  http: reqwest::Client,
  base_url: String,
}

impl OpenAiClient {
  pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, InferenceError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert("X-Title", HeaderValue::from_static("Crop-Sahayaka"));

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }

    Ok(Self {
      http: builder.build()?,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  fn endpoint(&self) -> String {
    format!("{}/chat/completions", self.base_url)
  }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
  async fn complete(&self, request: &CompletionRequest) -> Result<ReplyContent, InferenceError> {
    let started = Instant::now();
    tracing::debug!(
      model = %request.model,
      messages = request.messages.len(),
      temperature = request.temperature,
      "sending chat completion"
    );

    let resp = self.http.post(self.endpoint()).json(request).send().await?;

    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
      return Err(InferenceError::Status { status, body: text });
    }

    let body: serde_json::Value = serde_json::from_str(&text)?;
    let content = extract_content(&body)?;
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "chat completion finished");
    Ok(content)
  }
}

/// Handle to the inference capability, fixed once at startup.
#[derive(Clone)]
pub enum Upstream {
  Uninitialized { reason: String },
  Ready(Arc<dyn InferenceClient>),
}

impl Upstream {
  pub fn ready(client: impl InferenceClient + 'static) -> Self {
    Upstream::Ready(Arc::new(client))
  }

  /// Builds the production client. A missing or unusable credential leaves
  /// the handle uninitialized instead of failing startup.
  pub fn connect(base_url: &str, credential: Option<&str>, timeout: Option<Duration>) -> Self {
    let Some(key) = credential.map(str::trim).filter(|k| !k.is_empty()) else {
      tracing::warn!("GITHUB_TOKEN is not set; inference endpoints will answer 500");
      return Upstream::Uninitialized {
        reason: "GITHUB_TOKEN missing".to_string(),
      };
    };

    match OpenAiClient::new(base_url, key, timeout) {
      Ok(client) => {
        tracing::info!(base_url, "inference client initialized");
        Upstream::ready(client)
      }
      Err(err) => {
        tracing::warn!(error = %err, "could not initialize inference client");
        Upstream::Uninitialized {
          reason: err.to_string(),
        }
      }
    }
  }

  pub fn client(&self) -> Option<&Arc<dyn InferenceClient>> {
    match self {
      Upstream::Ready(client) => Some(client),
      Upstream::Uninitialized { .. } => None,
    }
  }

  pub fn reason(&self) -> Option<&str> {
    match self {
      Upstream::Ready(_) => None,
      Upstream::Uninitialized { reason } => Some(reason),
    }
  }

  pub fn state_label(&self) -> &'static str {
    match self {
      Upstream::Ready(_) => "ready",
      Upstream::Uninitialized { .. } => "uninitialized",
    }
  }
}
