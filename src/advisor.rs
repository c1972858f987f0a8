use uuid::Uuid;

use crate::error::RelayError;
use crate::inference::{CompletionRequest, InferenceClient, ReplyContent, ResponseFormat, Upstream};
use crate::models::{ChatMessage, ChatReply, ChatRequest, FarmParameters, RecommendationReply, RecommendationResult};
use crate::prompt::{build_recommendation_prompt, chat_system_message, recommendation_system_message};

pub const RECOMMENDATION_TEMPERATURE: f32 = 0.5;
pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 200;

/// Turns farm parameters and chat turns into completion calls and shapes the
/// answers for the HTTP layer.
pub struct Advisor {
  upstream: Upstream,
  model: String,
}

impl Advisor {
  pub fn new(upstream: Upstream, model: impl Into<String>) -> Self {
    Self {
      upstream,
      model: model.into(),
    }
  }

  pub fn upstream(&self) -> &Upstream {
    &self.upstream
  }

  fn client(&self) -> Result<&dyn InferenceClient, RelayError> {
    self
      .upstream
      .client()
      .map(|c| &**c)
      .ok_or_else(RelayError::unavailable)
  }

  pub fn recommendation_request(&self, params: &FarmParameters) -> CompletionRequest {
    CompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessage::system(recommendation_system_message(params.language())),
        ChatMessage::user(build_recommendation_prompt(params)),
      ],
      temperature: RECOMMENDATION_TEMPERATURE,
      max_tokens: None,
      response_format: Some(ResponseFormat::json_object()),
    }
  }

  pub fn chat_request(&self, req: &ChatRequest) -> CompletionRequest {
    let mut messages = Vec::with_capacity(req.messages.len() + 1);
    messages.push(ChatMessage::system(chat_system_message(req.language())));
    messages.extend(req.messages.iter().cloned());

    CompletionRequest {
      model: self.model.clone(),
      messages,
      temperature: CHAT_TEMPERATURE,
      max_tokens: Some(CHAT_MAX_TOKENS),
      response_format: None,
    }
  }

  pub async fn recommendations(&self, params: &FarmParameters) -> Result<RecommendationReply, RelayError> {
    let client = self.client()?;
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, district = %params.district, language = params.language().name(), "requesting recommendations");

    let request = self.recommendation_request(params);
    let content = client.complete(&request).await.map_err(|err| {
      tracing::error!(%request_id, error = %err, "recommendations call failed");
      RelayError::upstream("Failed to get recommendations from AI model", err)
    })?;

    let reply = normalize_recommendation(content);
    match &reply {
      RecommendationReply::Structured(value) => {
        if let Err(err) = serde_json::from_value::<RecommendationResult>(value.clone()) {
          tracing::debug!(%request_id, error = %err, "recommendations reply does not follow the requested schema");
        }
      }
      RecommendationReply::RawText(text) => {
        tracing::warn!(%request_id, len = text.len(), "recommendations reply was not JSON; returning raw text");
      }
    }
    Ok(reply)
  }

  pub async fn chat(&self, req: &ChatRequest) -> Result<ChatReply, RelayError> {
    let client = self.client()?;
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, turns = req.messages.len(), language = req.language().name(), "relaying chat");

    let request = self.chat_request(req);
    let content = client.complete(&request).await.map_err(|err| {
      tracing::error!(%request_id, error = %err, "chat call failed");
      RelayError::upstream("Failed to get chat response from AI model", err)
    })?;

    Ok(ChatReply {
      reply: content.into_text(),
    })
  }
}

/// Decoded content (including `null`) passes through; text is parsed as JSON when possible and
/// otherwise kept verbatim.
pub fn normalize_recommendation(content: ReplyContent) -> RecommendationReply {
  match content {
    ReplyContent::Structured(value) => RecommendationReply::Structured(value),
    ReplyContent::Empty => RecommendationReply::Structured(serde_json::Value::Null),
    ReplyContent::Text(text) => match serde_json::from_str::<serde_json::Value>(&text) {
      Ok(value) => RecommendationReply::Structured(value),
      Err(_) => RecommendationReply::RawText(text),
    },
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::{Arc, Mutex};

  use async_trait::async_trait;

  use super::*;
  use crate::error::ErrorKind;
  use crate::inference::InferenceError;
  use crate::models::Role;

  /// Scripted client that records every request it sees.
  pub(crate) struct FakeClient {
    pub reply: Mutex<Option<Result<ReplyContent, InferenceError>>>,
    pub seen: Arc<Mutex<Vec<CompletionRequest>>>,
  }

  impl FakeClient {
    pub(crate) fn replying(reply: Result<ReplyContent, InferenceError>) -> (Self, Arc<Mutex<Vec<CompletionRequest>>>) {
      let seen = Arc::new(Mutex::new(Vec::new()));
      let client = Self {
        reply: Mutex::new(Some(reply)),
        seen: seen.clone(),
      };
      (client, seen)
    }
  }

  #[async_trait]
  impl InferenceClient for FakeClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<ReplyContent, InferenceError> {
      self.seen.lock().unwrap().push(request.clone());
      self
        .reply
        .lock()
        .unwrap()
        .take()
        .unwrap_or(Err(InferenceError::EmptyChoices))
    }
  }

  pub(crate) fn farm(language: Option<&str>) -> FarmParameters {
    FarmParameters {
      district: "Mysuru".to_string(),
      season: "Kharif".to_string(),
      rainfall: "850".to_string(),
      fertilizer: "120".to_string(),
      pesticide: "2".to_string(),
      language: language.map(str::to_string),
    }
  }

  fn uninitialized() -> Advisor {
    Advisor::new(
      Upstream::Uninitialized {
        reason: "GITHUB_TOKEN missing".to_string(),
      },
      "openai/gpt-4o",
    )
  }

  #[test]
  fn normalize_parses_json_text() {
    let reply = normalize_recommendation(ReplyContent::Text(r#"{"metrics":{"soilHealth":"8"},"radarData":[]}"#.to_string()));
    assert_eq!(
      reply,
      RecommendationReply::Structured(serde_json::json!({ "metrics": { "soilHealth": "8" }, "radarData": [] }))
    );
  }

  #[test]
  fn normalize_keeps_non_json_text() {
    let text = "Sorry, here is a plan: grow ragi.";
    assert_eq!(
      normalize_recommendation(ReplyContent::Text(text.to_string())),
      RecommendationReply::RawText(text.to_string())
    );
  }

  #[test]
  fn normalize_passes_structured_through() {
    let value = serde_json::json!([{ "name": "Mango" }]);
    assert_eq!(
      normalize_recommendation(ReplyContent::Structured(value.clone())),
      RecommendationReply::Structured(value)
    );
  }

  #[test]
  fn normalize_keeps_null_content() {
    assert_eq!(
      normalize_recommendation(ReplyContent::Empty),
      RecommendationReply::Structured(serde_json::Value::Null)
    );
  }

  #[tokio::test]
  async fn chat_passes_null_content_through() {
    let (client, _) = FakeClient::replying(Ok(ReplyContent::Empty));
    let advisor = Advisor::new(Upstream::ready(client), "openai/gpt-4o");
    let req = ChatRequest {
      messages: vec![ChatMessage::user("Hello")],
      language: None,
    };

    let reply = advisor.chat(&req).await.expect("should succeed");
    assert_eq!(reply.reply, None);
  }

  #[test]
  fn recommendation_request_uses_fixed_parameters() {
    let advisor = uninitialized();
    let request = advisor.recommendation_request(&farm(Some("kn")));
    assert_eq!(request.temperature, RECOMMENDATION_TEMPERATURE);
    assert_eq!(request.max_tokens, None);
    assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.contains("Kannada"));
    assert_eq!(request.messages[1].role, Role::User);
    for value in ["Mysuru", "Kharif", "850", "120", "2"] {
      assert!(request.messages[1].content.contains(value));
    }
  }

  #[test]
  fn chat_request_prepends_system_turn() {
    let advisor = uninitialized();
    let caller = vec![
      ChatMessage::user("Hello"),
      ChatMessage {
        role: Role::Assistant,
        content: "Namaskara!".to_string(),
      },
      ChatMessage::user("Which millet suits Tumakuru?"),
    ];
    let req = ChatRequest {
      messages: caller.clone(),
      language: Some("en".to_string()),
    };

    let request = advisor.chat_request(&req);
    assert_eq!(request.temperature, CHAT_TEMPERATURE);
    assert_eq!(request.max_tokens, Some(CHAT_MAX_TOKENS));
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.ends_with("Reply strictly in English."));
    assert_eq!(&request.messages[1..], caller.as_slice());
    assert_eq!(req.messages, caller);
  }

  #[tokio::test]
  async fn uninitialized_fails_before_any_call() {
    let advisor = uninitialized();
    let err = advisor.recommendations(&farm(None)).await.expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);

    let req = ChatRequest {
      messages: vec![ChatMessage::user("Hello")],
      language: None,
    };
    let err = advisor.chat(&req).await.expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
  }

  #[tokio::test]
  async fn recommendations_returns_raw_text_when_not_json() {
    let (client, seen) = FakeClient::replying(Ok(ReplyContent::Text("not json at all".to_string())));
    let advisor = Advisor::new(Upstream::ready(client), "openai/gpt-4o");

    let reply = advisor.recommendations(&farm(None)).await.expect("should succeed");
    assert_eq!(reply, RecommendationReply::RawText("not json at all".to_string()));
    assert_eq!(seen.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn upstream_failure_maps_to_upstream_error() {
    let (client, _) = FakeClient::replying(Err(InferenceError::EmptyChoices));
    let advisor = Advisor::new(Upstream::ready(client), "openai/gpt-4o");

    let err = advisor.recommendations(&farm(None)).await.expect_err("should fail");
    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert!(err.to_string().contains("Failed to get recommendations from AI model"));
  }

  #[tokio::test]
  async fn chat_returns_first_reply_text() {
    let (client, seen) = FakeClient::replying(Ok(ReplyContent::Text("Hello! How can I help?".to_string())));
    let advisor = Advisor::new(Upstream::ready(client), "openai/gpt-4o");
    let req = ChatRequest {
      messages: vec![ChatMessage::user("Hello")],
      language: Some("kn".to_string()),
    };

    let reply = advisor.chat(&req).await.expect("should succeed");
    assert_eq!(reply.reply.as_deref(), Some("Hello! How can I help?"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].model, "openai/gpt-4o");
    assert!(seen[0].messages[0].content.ends_with("Reply strictly in Kannada."));
    assert_eq!(seen[0].messages[1], ChatMessage::user("Hello"));
  }
}
