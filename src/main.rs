use anyhow::Context;

use crop_sahayaka::advisor::Advisor;
use crop_sahayaka::config::{config_path, credential_from_env, load_or_init};
use crop_sahayaka::inference::Upstream;
use crop_sahayaka::logger;
use crop_sahayaka::router::{run_router, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  let path = config_path();
  let mut config = load_or_init(&path).with_context(|| format!("loading config {}", path.display()))?;
  config.apply_env_overrides(|key| std::env::var(key).ok());

  logger::init(config.log_path.as_deref())?;
  tracing::info!(config = %path.display(), model = %config.model, "Crop-Sahayaka starting up");

  let credential = credential_from_env();
  let upstream = Upstream::connect(&config.base_url, credential.as_deref(), config.request_timeout());

  let state = RouterState::new(Advisor::new(upstream, config.model.clone()));

  let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
    .await
    .with_context(|| format!("binding {}", config.bind_addr))?;
  let addr = listener.local_addr()?;
  let upstream = state.advisor.upstream();
  tracing::info!(
    %addr,
    upstream = upstream.state_label(),
    reason = upstream.reason().unwrap_or("-"),
    "listening"
  );

  run_router(listener, state, &config.allowed_origins).await
}
