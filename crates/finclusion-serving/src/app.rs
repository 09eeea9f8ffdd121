//! HTTP routes.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | Form with preview of the current selections |
//! | `POST /predict` | Form submission: preview plus prediction result |
//! | `GET /api/schema` | Feature schema as JSON |
//! | `POST /api/predict` | JSON prediction for one individual |
//! | `GET /healthz` | Model status and prediction counters |
//!
//! If the artifact failed to load, every page route answers with the halted page and
//! `503 Service Unavailable`.

use crate::config::ServerConfig;
use crate::model_loader::ModelStatus;
use crate::page::{load_failure_message, render_halted, render_page, PageContext};
use crate::predictor::{PredictionOutcome, Predictor, PredictorStats};
use axum::extract::{DefaultBodyLimit, Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use finclusion_core::{FeatureSchema, RawRecord};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

type FormPairs = Vec<(String, String)>;

/// Shared, read-only request context.
#[derive(Debug)]
pub struct AppState {
    title: String,
    model_file_name: String,
    schema: FeatureSchema,
    status: ModelStatus,
    predictor: Option<Predictor>,
    started_at: Instant,
}

impl AppState {
    /// Build the request context from the load outcome.
    pub fn new(config: &ServerConfig, schema: FeatureSchema, status: ModelStatus) -> Self {
        let predictor = status
            .model()
            .map(|model| Predictor::new(schema.clone(), model.classifier()));
        Self {
            title: config.title.clone(),
            model_file_name: config.model_file_name(),
            schema,
            status,
            predictor,
            started_at: Instant::now(),
        }
    }

    /// The predictor, or `None` when the page is halted.
    pub fn predictor(&self) -> Option<&Predictor> {
        self.predictor.as_ref()
    }

    /// The load outcome.
    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    /// Health snapshot.
    pub fn health(&self) -> AppHealth {
        AppHealth {
            healthy: self.status.is_ready(),
            model_loaded: self.status.is_ready(),
            model_name: self.status.model().map(|m| m.name.clone()),
            load_error: self.status.error().map(|e| e.kind()),
            uptime_secs: self.started_at.elapsed().as_secs(),
            stats: self.predictor.as_ref().map(Predictor::stats).unwrap_or_default(),
        }
    }

    fn halted(&self) -> Response {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(render_halted(&self.title, &self.model_file_name)),
        )
            .into_response()
    }
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, Serialize)]
pub struct AppHealth {
    /// True when predictions can be served
    pub healthy: bool,
    /// Whether the artifact loaded
    pub model_loaded: bool,
    /// Name of the loaded model
    pub model_name: Option<String>,
    /// Load failure kind, when loading failed
    pub load_error: Option<&'static str>,
    /// Seconds since the state was created
    pub uptime_secs: u64,
    /// Prediction counters
    pub stats: PredictorStats,
}

#[derive(Debug, Serialize)]
struct Unavailable {
    status: &'static str,
    error_kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct BadRequest {
    error: String,
}

/// Build the router over a shared state.
pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/schema", get(api_schema))
        .route("/api/predict", post(api_predict))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn index(State(state): State<Arc<AppState>>, Query(pairs): Query<FormPairs>) -> Response {
    if state.predictor.is_none() {
        return state.halted();
    }
    let raw = RawRecord::collect_verbatim(&state.schema, pairs);
    Html(render_page(&PageContext {
        title: &state.title,
        schema: &state.schema,
        raw: &raw,
        outcome: None,
    }))
    .into_response()
}

async fn predict_form(State(state): State<Arc<AppState>>, Form(pairs): Form<FormPairs>) -> Response {
    let Some(predictor) = state.predictor.as_ref() else {
        return state.halted();
    };

    let submitted = pairs.iter().map(|(k, v)| (k, v));
    let (raw, outcome) = match RawRecord::from_pairs(&state.schema, submitted.clone()) {
        Ok(raw) => {
            let outcome = predictor.encode_and_predict(&raw);
            (raw, outcome)
        }
        Err(e) => {
            debug!("Rejected form input: {}", e);
            let raw = RawRecord::collect_verbatim(&state.schema, submitted);
            let outcome = PredictionOutcome::Failure {
                reason: e.to_string(),
                encoded: None,
            };
            (raw, outcome)
        }
    };

    Html(render_page(&PageContext {
        title: &state.title,
        schema: &state.schema,
        raw: &raw,
        outcome: Some(&outcome),
    }))
    .into_response()
}

async fn api_schema(State(state): State<Arc<AppState>>) -> Json<FeatureSchema> {
    Json(state.schema.clone())
}

async fn api_predict(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(predictor) = state.predictor.as_ref() else {
        let kind = state.status.error().map(|e| e.kind()).unwrap_or("not_loaded");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Unavailable {
                status: "unavailable",
                error_kind: kind,
                message: load_failure_message(&state.model_file_name),
            }),
        )
            .into_response();
    };

    let Some(object) = body.as_object() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(BadRequest {
                error: "request body must be a JSON object of field values".to_string(),
            }),
        )
            .into_response();
    };

    let outcome = match RawRecord::from_json(&state.schema, object) {
        Ok(raw) => predictor.encode_and_predict(&raw),
        Err(e) => PredictionOutcome::Failure {
            reason: e.to_string(),
            encoded: None,
        },
    };
    info!(
        "API prediction: {}",
        if outcome.is_success() { "success" } else { "failure" }
    );
    Json(outcome).into_response()
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    let health = state.health();
    let code = if health.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(health)).into_response()
}
