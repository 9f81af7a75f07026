use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::GateError;
use crate::key_resolver::ClientKeyResolver;
use crate::path_filter::PathFilter;
use crate::rate_limiter::RateLimiter;
use crate::response::{HealthResponse, ResetResponse, SettingsResponse};

/// Application state shared by the gate middleware and the handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: RateLimiter,
    pub path_filter: Arc<PathFilter>,
    pub resolver: ClientKeyResolver,
}

impl AppState {
    pub fn new(limiter: RateLimiter, path_filter: PathFilter) -> Self {
        Self {
            limiter,
            path_filter: Arc::new(path_filter),
            resolver: ClientKeyResolver::new(),
        }
    }
}

fn validate_key(key: &str) -> Result<(), GateError> {
    if key.trim().is_empty() {
        return Err(GateError::InvalidKey("client key cannot be empty".to_string()));
    }
    Ok(())
}

/// Active limiter settings and store statistics
pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(SettingsResponse::new(
        state.limiter.config(),
        state.path_filter.pattern(),
        state.limiter.stats(),
    ))
}

/// Window status for a client, without counting this lookup against it
pub async fn get_rate_limit(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, GateError> {
    validate_key(&key)?;
    Ok(Json(state.limiter.status(&key)))
}

/// Clear a client's window
pub async fn delete_rate_limit(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, GateError> {
    validate_key(&key)?;
    let cleared = state.limiter.reset(&key);
    tracing::info!(target: "gatekeeper::handlers", client = %key, cleared, "Window reset");
    Ok(Json(ResetResponse { key, cleared }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(state.limiter.store().len()))
}

/// Readiness check endpoint
pub async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ready" })))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
}
