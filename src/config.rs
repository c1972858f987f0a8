use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "CROP_SAHAYAKA_CONFIG";
pub const CREDENTIAL_ENV: &str = "GITHUB_TOKEN";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub bind_addr: String,
  pub base_url: String,
  pub model: String,
  pub allowed_origins: Vec<String>,
  pub request_timeout_secs: Option<u64>,
  pub log_path: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      bind_addr: "127.0.0.1:8000".to_string(),
      base_url: "https://models.github.ai/inference".to_string(),
      model: "openai/gpt-4o".to_string(),
      allowed_origins: vec!["http://localhost:8080".to_string()],
      request_timeout_secs: None,
      log_path: None,
    }
  }
}

impl AppConfig {
  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_secs.map(Duration::from_secs)
  }

  /// Applies `CROP_SAHAYAKA_*` overrides on top of the file values.
  pub fn apply_env_overrides<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(bind) = non_empty("CROP_SAHAYAKA_BIND") {
      self.bind_addr = bind;
    }
    if let Some(model) = non_empty("CROP_SAHAYAKA_MODEL") {
      self.model = model;
    }
    if let Some(base_url) = non_empty("CROP_SAHAYAKA_BASE_URL") {
      self.base_url = base_url;
    }
  }
}

pub fn config_path() -> PathBuf {
  std::env::var_os(CONFIG_PATH_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("crop-sahayaka.json"))
}

pub fn credential_from_env() -> Option<String> {
  std::env::var(CREDENTIAL_ENV).ok()
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig =
      serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
  Ok(())
}
