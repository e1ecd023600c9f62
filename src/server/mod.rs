//! Optional HTTP shell exposing the engine over REST and SSE.
//!
//! Enabled with the `server` feature. Routes:
//!
//! - `POST /api/v1/slide` generates a whole presentation as one JSON body
//! - `POST /api/v1/streaming` streams slides as server-sent events
//! - `GET /health` reports the resolved provider and model
//! - `GET /` lists the entry points

mod sse;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowHeaders, CorsLayer};

use crate::config::Settings;
use crate::engine::GenerationEngine;
use crate::error::EngineError;
use crate::types::LessonRequest;

/// Shared state for all request handlers.
///
/// The engine is optional so a misconfigured deployment still serves
/// health checks and reports the problem instead of refusing to start.
#[derive(Clone)]
pub struct AppState {
    engine: Option<GenerationEngine>,
    environment: String,
}

impl AppState {
    pub fn new(engine: Option<GenerationEngine>, environment: impl Into<String>) -> Self {
        Self {
            engine,
            environment: environment.into(),
        }
    }

    /// Build state from settings, keeping the server alive even when no
    /// provider credential is configured.
    pub fn from_settings(settings: &Settings) -> Self {
        let engine = match GenerationEngine::from_settings(settings) {
            Ok(engine) => Some(engine),
            Err(err) => {
                tracing::warn!(error = %err, "engine unavailable, generation endpoints will fail");
                None
            }
        };
        Self::new(engine, settings.environment.clone())
    }
}

/// Build the application router with CORS applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/slide", post(generate_presentation))
        .route("/api/v1/streaming", post(stream_presentation))
        .layer(cors_layer())
        .with_state(state)
}

/// Browser origins for the local development frontends.
fn cors_layer() -> CorsLayer {
    let origins = [
        HeaderValue::from_static("http://localhost"),
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://localhost:8080"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://127.0.0.1:8080"),
    ];

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Lectern API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
        "api": "/api/v1",
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (provider, model) = match &state.engine {
        Some(engine) => (engine.provider_name(), engine.model_name().to_string()),
        None => ("not_configured", "not_configured".to_string()),
    };

    Json(serde_json::json!({
        "status": "ok",
        "environment": state.environment,
        "llm_provider": provider,
        "default_model": model,
    }))
}

async fn generate_presentation(
    State(state): State<AppState>,
    Json(request): Json<LessonRequest>,
) -> Response {
    let Some(engine) = &state.engine else {
        return engine_missing_response();
    };

    match engine.generate(&request).await {
        Ok(presentation) => Json(presentation).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn stream_presentation(
    State(state): State<AppState>,
    Json(request): Json<LessonRequest>,
) -> Response {
    let Some(engine) = &state.engine else {
        return engine_missing_response();
    };

    // Request problems surface as a JSON 422 before the stream starts;
    // only generation failures become in-stream error events.
    match request.normalized() {
        Ok(request) => sse::slide_sse_response(engine.stream(&request)),
        Err(err) => error_response(&err),
    }
}

fn engine_missing_response() -> Response {
    let detail = "LLM engine is not configured; set OPENAI_API_KEY or GOOGLE_API_KEY";
    (StatusCode::INTERNAL_SERVER_ERROR, error_body(detail)).into_response()
}

/// Map engine failures onto HTTP statuses.
///
/// Bad input and schema-shaped generation failures are client-visible 422s;
/// everything else is a 500 with a short operator-facing detail.
fn error_response(err: &EngineError) -> Response {
    match err {
        EngineError::Validation(message) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error_body(message)).into_response()
        }
        EngineError::Generation { .. } => match err.root_cause() {
            EngineError::Parse(cause) | EngineError::Validation(cause) => {
                let detail =
                    format!("Generated content doesn't match the expected schema: {cause}");
                (StatusCode::UNPROCESSABLE_ENTITY, error_body(&detail)).into_response()
            }
            _ => {
                let detail = format!("AI generation failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, error_body(&detail)).into_response()
            }
        },
        other => {
            let detail = format!("AI generation failed: {other}");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(&detail)).into_response()
        }
    }
}

fn error_body(detail: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "detail": detail }))
}
