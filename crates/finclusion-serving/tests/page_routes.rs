//! Route-level tests for the prediction page and JSON API.

mod common;

use axum::http::StatusCode;
use common::*;
use finclusion_core::FeatureSchema;
use finclusion_serving::page::escape_html;
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn index_lists_every_option_without_result() {
    let (status, html) = send(app_with(Arc::new(KenyaDetector)), get("/")).await;
    assert_eq!(status, StatusCode::OK);

    let schema = FeatureSchema::financial_inclusion();
    for field in schema.fields() {
        for option in field.options() {
            assert!(
                html.contains(&format!("<option value=\"{}\"", escape_html(option))),
                "missing option {option}"
            );
        }
    }
    assert!(html.contains("✅ Model loaded successfully!"));
    assert!(html.contains("Preview of Input Data (before encoding)"));
    assert!(!html.contains("id=\"result\""));
}

#[tokio::test]
async fn index_preview_reflects_query_selections() {
    let (status, html) = send(
        app_with(Arc::new(KenyaDetector)),
        get("/?country=Uganda&household_size=7"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<option value=\"Uganda\" selected>"));
    assert!(html.contains("<td>Uganda</td>"));
    assert!(html.contains("<td>7</td>"));
    assert!(!html.contains("id=\"result\""));
}

#[tokio::test]
async fn predict_kenya_scenario_shows_positive_indicator() {
    let (status, html) = send(
        app_with(Arc::new(KenyaDetector)),
        post_form("/predict", KENYA_FORM),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(html.contains("id=\"result\""));
    assert!(html.contains("Encoded Input Data (ready for model)"));
    let encoded_row = "<td>0</td><td>0</td><td>2016</td><td>1</td><td>1</td><td>3</td>\
                       <td>30</td><td>1</td><td>0</td><td>3</td><td>2</td><td>4</td>";
    assert!(html.contains(encoded_row), "encoded row missing in {html}");
    assert!(html.contains("This person is likely to HAVE a bank account."));
    assert!(!html.contains("UNLIKELY"));
    // The raw preview is still rendered.
    assert!(html.contains("<td>Single/Never Married</td>"));
}

#[tokio::test]
async fn predict_other_label_shows_cautionary_indicator() {
    let mut form = KENYA_FORM.to_vec();
    form[0] = ("country", "Tanzania");
    let (status, html) = send(app_with(Arc::new(KenyaDetector)), post_form("/predict", &form)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("banner warning"));
    assert!(html.contains("This person is UNLIKELY to have a bank account."));
}

#[tokio::test]
async fn predict_model_error_is_reported_and_page_stays_usable() {
    let app = app_with(Arc::new(ShapeMismatch));
    let (status, html) = send(app.clone(), post_form("/predict", KENYA_FORM)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(
        "Prediction failed: X has 11 features, but model expects 10 features as input"
    ));
    assert!(html.contains("Encoded Input Data (ready for model)"));
    assert!(html.contains("Preview of Input Data (before encoding)"));
    assert!(!html.contains("bank account."));

    let (status, html) = send(app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<form"));
}

#[tokio::test]
async fn predict_rejects_value_below_minimum() {
    let mut form = KENYA_FORM.to_vec();
    form[5] = ("age_of_respondent", "12");
    let (status, html) = send(app_with(Arc::new(KenyaDetector)), post_form("/predict", &form)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Prediction failed:"));
    assert!(html.contains("age_of_respondent"));
    assert!(!html.contains("Encoded Input Data"));
    assert!(html.contains("<td>12</td>"));
}

#[tokio::test]
async fn predict_unknown_category_is_reported() {
    let mut form = KENYA_FORM.to_vec();
    form[0] = ("country", "Ghana");
    let (_, html) = send(app_with(Arc::new(KenyaDetector)), post_form("/predict", &form)).await;
    assert!(html.contains("Prediction failed: Unknown category &quot;Ghana&quot; for field &#39;country&#39;"));
}

#[tokio::test]
async fn halted_app_serves_message_without_controls() {
    for request in [get("/"), post_form("/predict", KENYA_FORM)] {
        let (status, html) = send(halted_app(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(html.contains(
            "Could not load model file. Make sure &#39;financial_model.json&#39; is in the same folder."
        ));
        assert!(!html.contains("<form"));
        assert!(!html.contains("<select"));
        assert!(!html.contains("<input"));
    }
}

#[tokio::test]
async fn api_schema_lists_fields_in_order() {
    let (status, body) = send(app_with(Arc::new(KenyaDetector)), get("/api/schema")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    let fields = value["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 11);
    assert_eq!(fields[0]["name"], "country");
    assert_eq!(fields[0]["kind"], "categorical");
    assert_eq!(fields[1]["name"], "year");
    assert_eq!(fields[1]["kind"], "numeric");
}

#[tokio::test]
async fn api_predict_returns_outcome_json() {
    let body = json!({
        "country": "Kenya",
        "year": 2016,
        "location_type": "Rural",
        "cellphone_access": "Yes",
        "household_size": 3,
        "age_of_respondent": 30,
        "gender_of_respondent": "Female",
        "relationship_with_head": "Head of Household",
        "marital_status": "Single/Never Married",
        "education_level": "Secondary education",
        "job_type": "Informally employed"
    });
    let (status, text) = send(
        app_with(Arc::new(KenyaDetector)),
        post_json("/api/predict", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["label"], 1);
    assert_eq!(value["verdict"], "likely_banked");
    assert_eq!(
        value["encoded"]["values"],
        json!([0, 2016, 1, 1, 3, 30, 1, 0, 3, 2, 4])
    );
}

#[tokio::test]
async fn api_predict_failure_and_bad_requests() {
    let app = app_with(Arc::new(KenyaDetector));

    let (status, text) = send(app.clone(), post_json("/api/predict", &json!({"country": "Mars"}))).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["status"], "failure");
    assert!(value["reason"].as_str().unwrap().contains("Mars"));

    let (status, _) = send(app, post_json("/api/predict", &json!([1, 2, 3]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, text) = send(halted_app(), post_json("/api/predict", &json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["error_kind"], "not_found");
}

#[tokio::test]
async fn healthz_reports_model_state() {
    let (status, text) = send(app_with(Arc::new(KenyaDetector)), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["healthy"], true);
    assert_eq!(value["model_name"], "stub");

    let (status, text) = send(halted_app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["model_loaded"], false);
    assert_eq!(value["load_error"], "not_found");
}
