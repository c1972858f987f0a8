//! Connectivity check against the configured inference endpoint.

use std::process::ExitCode;

use crop_sahayaka::config::{self, config_path, credential_from_env, load_or_init};
use crop_sahayaka::inference::{CompletionRequest, InferenceClient, OpenAiClient};
use crop_sahayaka::logger;
use crop_sahayaka::models::ChatMessage;

#[tokio::main]
async fn main() -> ExitCode {
  dotenvy::dotenv().ok();

  match probe().await {
    Ok(reply) => {
      println!("Response: {reply}");
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("Exception during API call: {err:#}");
      ExitCode::FAILURE
    }
  }
}

async fn probe() -> anyhow::Result<String> {
  let mut config = load_or_init(&config_path())?;
  config.apply_env_overrides(|key| std::env::var(key).ok());
  logger::init(None)?;

  let credential = credential_from_env().filter(|c| !c.trim().is_empty());
  println!("{} present: {}", config::CREDENTIAL_ENV, credential.is_some());
  let credential = credential.ok_or_else(|| anyhow::anyhow!("{} is not set", config::CREDENTIAL_ENV))?;

  let client = OpenAiClient::new(&config.base_url, credential.trim(), config.request_timeout())?;
  println!("Client created for {}", config.base_url);

  let request = CompletionRequest {
    model: config.model.clone(),
    messages: vec![ChatMessage::system("You are a test."), ChatMessage::user("Say hello.")],
    temperature: 0.0,
    max_tokens: Some(10),
    response_format: None,
  };

  println!("Attempting chat completion...");
  let reply = client.complete(&request).await?;
  Ok(reply.into_text().unwrap_or_else(|| "null".to_string()))
}
