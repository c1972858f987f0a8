use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: Role::System,
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: content.into(),
    }
  }
}

/// Reply language. Anything that is not a Kannada tag falls back to English.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
  English,
  Kannada,
}

impl Language {
  pub fn from_tag(tag: Option<&str>) -> Self {
    let tag = tag.filter(|t| !t.is_empty()).unwrap_or("en");
    if tag.to_lowercase().starts_with("kn") {
      Language::Kannada
    } else {
      Language::English
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Language::English => "English",
      Language::Kannada => "Kannada",
    }
  }
}

fn default_language() -> Option<String> {
  Some("en".to_string())
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FarmParameters {
  pub district: String,
  pub season: String,
  pub rainfall: String,
  pub fertilizer: String,
  pub pesticide: String,
  #[serde(default = "default_language")]
  pub language: Option<String>,
}

impl FarmParameters {
  pub fn language(&self) -> Language {
    Language::from_tag(self.language.as_deref())
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatRequest {
  pub messages: Vec<ChatMessage>,
  #[serde(default = "default_language")]
  pub language: Option<String>,
}

impl ChatRequest {
  pub fn language(&self) -> Language {
    Language::from_tag(self.language.as_deref())
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
  pub reply: Option<String>,
}

/// Normalized recommendations reply. `RawText` carries a model answer that
/// was not valid JSON, untouched.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RecommendationReply {
  Structured(serde_json::Value),
  RawText(String),
}

/// Shape the recommendations prompt asks the model for. Replies are never
/// rejected for failing to match it.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
  pub metrics: Metrics,
  pub radar_data: Vec<RadarPoint>,
  pub recommendations: Vec<Recommendation>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
  pub crop_diversity: serde_json::Value,
  pub soil_health: serde_json::Value,
  pub resilience: serde_json::Value,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RadarPoint {
  pub category: String,
  pub value: serde_json::Value,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Recommendation {
  pub name: String,
  pub category: Option<String>,
  pub confidence: serde_json::Value,
  #[serde(rename = "yield")]
  pub expected_yield: serde_json::Value,
  pub profit: serde_json::Value,
  pub benefit: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
  pub status: String,
  pub version: String,
  pub upstream: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub upstream_reason: Option<String>,
  pub uptime_ms: u64,
  pub started_at: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn language_defaults_to_english() {
    assert_eq!(Language::from_tag(None), Language::English);
    assert_eq!(Language::from_tag(Some("")), Language::English);
    assert_eq!(Language::from_tag(Some("  ")), Language::English);
  }

  #[test]
  fn language_matches_kannada_prefix_case_insensitively() {
    assert_eq!(Language::from_tag(Some("kn")), Language::Kannada);
    assert_eq!(Language::from_tag(Some("KN-in")), Language::Kannada);
    assert_eq!(Language::from_tag(Some("Kannada")), Language::English);
    assert_eq!(Language::from_tag(Some("english")), Language::English);
    assert_eq!(Language::from_tag(Some("hi")), Language::English);
  }

  #[test]
  fn language_tag_is_not_trimmed() {
    assert_eq!(Language::from_tag(Some(" kn")), Language::English);
    assert_eq!(Language::from_tag(Some("kn ")), Language::Kannada);
  }

  #[test]
  fn chat_reply_serializes_missing_content_as_null() {
    let reply = ChatReply { reply: None };
    assert_eq!(serde_json::to_value(&reply).unwrap(), serde_json::json!({ "reply": null }));
  }

  #[test]
  fn farm_parameters_default_language() {
    let params: FarmParameters = serde_json::from_value(serde_json::json!({
      "district": "Mysuru",
      "season": "Kharif",
      "rainfall": "850",
      "fertilizer": "120",
      "pesticide": "2"
    }))
    .expect("farm parameters should parse");
    assert_eq!(params.language.as_deref(), Some("en"));
    assert_eq!(params.language(), Language::English);
  }

  #[test]
  fn chat_request_rejects_unknown_role() {
    let res = serde_json::from_value::<ChatRequest>(serde_json::json!({
      "messages": [{ "role": "tool", "content": "x" }]
    }));
    assert!(res.is_err());
  }

  #[test]
  fn recommendation_reply_serializes_untagged() {
    let structured = RecommendationReply::Structured(serde_json::json!({ "a": [1, 2] }));
    assert_eq!(serde_json::to_value(&structured).unwrap(), serde_json::json!({ "a": [1, 2] }));

    let raw = RecommendationReply::RawText("not json".to_string());
    assert_eq!(serde_json::to_value(&raw).unwrap(), serde_json::json!("not json"));
  }

  #[test]
  fn recommendation_result_reads_prompt_schema() {
    let value = serde_json::json!({
      "metrics": { "cropDiversity": "6", "soilHealth": "8.1", "resilience": "7.9" },
      "radarData": [{ "category": "Sustainability", "value": 88 }],
      "recommendations": [{
        "name": "Ragi",
        "category": "field crop",
        "confidence": 91,
        "yield": "2.4 t/ha",
        "profit": "₹8,854",
        "benefit": 90
      }]
    });
    let result: RecommendationResult = serde_json::from_value(value).expect("schema should parse");
    assert_eq!(result.recommendations[0].name, "Ragi");
    assert_eq!(result.recommendations[0].expected_yield, serde_json::json!("2.4 t/ha"));
    assert_eq!(result.radar_data.len(), 1);
  }
}
