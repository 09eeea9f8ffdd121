#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use finclusion_core::FeatureSchema;
use finclusion_serving::error::LoadError;
use finclusion_serving::{
    router, AppState, Classifier, LoadedModel, ModelStatus, ServerConfig, ServingError,
    ServingResult,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub const KENYA_FORM: &[(&str, &str)] = &[
    ("country", "Kenya"),
    ("year", "2016"),
    ("location_type", "Rural"),
    ("cellphone_access", "Yes"),
    ("household_size", "3"),
    ("age_of_respondent", "30"),
    ("gender_of_respondent", "Female"),
    ("relationship_with_head", "Head of Household"),
    ("marital_status", "Single/Never Married"),
    ("education_level", "Secondary education"),
    ("job_type", "Informally employed"),
];

pub const KENYA_ENCODED: [f32; 11] = [0.0, 2016.0, 1.0, 1.0, 3.0, 30.0, 1.0, 0.0, 3.0, 2.0, 4.0];

/// Returns 1 only for the encoded Kenya scenario row.
pub struct KenyaDetector;

impl Classifier for KenyaDetector {
    fn n_features(&self) -> usize {
        11
    }

    fn predict(&self, features: &[f32]) -> ServingResult<i64> {
        Ok(i64::from(features == KENYA_ENCODED))
    }
}

/// Fails every call the way a model fitted on fewer columns would.
pub struct ShapeMismatch;

impl Classifier for ShapeMismatch {
    fn n_features(&self) -> usize {
        10
    }

    fn predict(&self, features: &[f32]) -> ServingResult<i64> {
        Err(ServingError::prediction(format!(
            "X has {} features, but model expects 10 features as input",
            features.len()
        )))
    }
}

pub fn app_with(classifier: Arc<dyn Classifier>) -> Router {
    let config = ServerConfig::default();
    let status = ModelStatus::Ready(Arc::new(LoadedModel::from_classifier("stub", classifier)));
    let state = AppState::new(&config, FeatureSchema::financial_inclusion(), status);
    router(Arc::new(state), config.request_body_limit)
}

pub fn halted_app() -> Router {
    let config = ServerConfig::default();
    let status = ModelStatus::Failed {
        path: PathBuf::from("financial_model.json"),
        error: Arc::new(LoadError::NotFound(PathBuf::from("financial_model.json"))),
    };
    let state = AppState::new(&config, FeatureSchema::financial_inclusion(), status);
    router(Arc::new(state), config.request_body_limit)
}

pub fn form_encode(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_encode(pairs)))
        .unwrap()
}

pub fn post_json(uri: &str, value: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(value).unwrap()))
        .unwrap()
}
