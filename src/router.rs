use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::advisor::Advisor;
use crate::models::{ChatRequest, FarmParameters, HealthResponse};

pub struct RouterState {
  pub started_at: Instant,
  pub started_wall: DateTime<Utc>,
  pub advisor: Advisor,
}

impl RouterState {
  pub fn new(advisor: Advisor) -> Self {
    Self {
      started_at: Instant::now(),
      started_wall: Utc::now(),
      advisor,
    }
  }
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = allowed_origins
    .iter()
    .filter_map(|origin| match HeaderValue::from_str(origin) {
      Ok(value) => Some(value),
      Err(err) => {
        tracing::warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods(Any)
    .allow_headers(Any)
}

pub fn build_router(state: RouterState, allowed_origins: &[String]) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/recommendations", post(recommendations))
    .route("/chat", post(chat))
    .layer(cors_layer(allowed_origins))
    .with_state(Arc::new(state))
}

pub async fn run_router(
  listener: tokio::net::TcpListener,
  state: RouterState,
  allowed_origins: &[String],
) -> anyhow::Result<()> {
  let app = build_router(state, allowed_origins);
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %err, "could not listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<HealthResponse> {
  Json(HealthResponse {
    status: "ok".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    upstream: state.advisor.upstream().state_label().to_string(),
    upstream_reason: state.advisor.upstream().reason().map(str::to_string),
    uptime_ms: state.started_at.elapsed().as_millis() as u64,
    started_at: state.started_wall.to_rfc3339(),
  })
}

async fn recommendations(
  State(state): State<Arc<RouterState>>,
  Json(req): Json<FarmParameters>,
) -> Response {
  match state.advisor.recommendations(&req).await {
    Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
    Err(err) => err.into_response(),
  }
}

async fn chat(State(state): State<Arc<RouterState>>, Json(req): Json<ChatRequest>) -> Response {
  match state.advisor.chat(&req).await {
    Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
    Err(err) => err.into_response(),
  }
}
