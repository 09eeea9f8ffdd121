//! Encode-and-predict.
//!
//! [`Predictor`] owns the schema and an explicit handle to the classifier. Its single
//! operation, [`Predictor::encode_and_predict`], never fails in the `Result` sense: any
//! encoding or model error comes back as [`PredictionOutcome::Failure`] carrying the raw
//! error text, and the service stays usable for the next attempt.

use crate::error::{ServingError, ServingResult};
use crate::model::Classifier;
use finclusion_core::{encode, EncodedRecord, FeatureSchema, RawRecord};
use parking_lot::RwLock;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// How a predicted label is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Label 1: positive indicator.
    LikelyBanked,
    /// Any other label: cautionary indicator.
    UnlikelyBanked,
}

impl Verdict {
    /// Maps a model label to a verdict. Only `1` is positive.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Self::LikelyBanked
        } else {
            Self::UnlikelyBanked
        }
    }

    /// User-facing sentence.
    pub fn message(&self) -> &'static str {
        match self {
            Self::LikelyBanked => "This person is likely to HAVE a bank account.",
            Self::UnlikelyBanked => "This person is UNLIKELY to have a bank account.",
        }
    }

    /// True for the positive indicator.
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::LikelyBanked)
    }
}

/// Result of one encode-and-predict call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    /// The model returned a label.
    Success {
        /// Raw label from the model.
        label: i64,
        /// How the label is presented.
        verdict: Verdict,
        /// The numeric row that was fed to the model.
        encoded: EncodedRecord,
    },
    /// Encoding or prediction failed.
    Failure {
        /// Raw error text.
        reason: String,
        /// The encoded row, when encoding got that far.
        #[serde(skip_serializing_if = "Option::is_none")]
        encoded: Option<EncodedRecord>,
    },
}

impl PredictionOutcome {
    /// Whether the model produced a label.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The verdict on success.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Success { verdict, .. } => Some(*verdict),
            Self::Failure { .. } => None,
        }
    }

    /// The encoded row, if encoding succeeded.
    pub fn encoded(&self) -> Option<&EncodedRecord> {
        match self {
            Self::Success { encoded, .. } => Some(encoded),
            Self::Failure { encoded, .. } => encoded.as_ref(),
        }
    }
}

/// Prediction counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictorStats {
    /// Total number of predictions requested
    pub total_predictions: u64,

    /// Predictions that produced a label
    pub successful_predictions: u64,

    /// Predictions that failed
    pub failed_predictions: u64,

    /// Predictions rendered with the positive indicator
    pub positive_predictions: u64,

    /// Average latency in milliseconds
    pub avg_latency_ms: f64,
}

/// Encodes raw records and runs them through the classifier.
///
/// # Example
///
/// ```
/// use finclusion_core::{FeatureSchema, RawRecord};
/// use finclusion_serving::model::Classifier;
/// use finclusion_serving::predictor::{Predictor, Verdict};
/// use finclusion_serving::ServingResult;
/// use std::sync::Arc;
///
/// struct AlwaysBanked;
///
/// impl Classifier for AlwaysBanked {
///     fn n_features(&self) -> usize { 11 }
///     fn predict(&self, _features: &[f32]) -> ServingResult<i64> { Ok(1) }
/// }
///
/// let schema = FeatureSchema::financial_inclusion();
/// let raw = RawRecord::defaults(&schema);
/// let predictor = Predictor::new(schema, Arc::new(AlwaysBanked));
/// let outcome = predictor.encode_and_predict(&raw);
/// assert_eq!(outcome.verdict(), Some(Verdict::LikelyBanked));
/// ```
pub struct Predictor {
    schema: FeatureSchema,
    model: Arc<dyn Classifier>,
    stats: RwLock<PredictorStats>,
}

impl Predictor {
    /// Create a predictor over an explicitly provided model.
    pub fn new(schema: FeatureSchema, model: Arc<dyn Classifier>) -> Self {
        Self {
            schema,
            model,
            stats: RwLock::new(PredictorStats::default()),
        }
    }

    /// The schema used for encoding.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode `raw` and ask the model for a label.
    pub fn encode_and_predict(&self, raw: &RawRecord) -> PredictionOutcome {
        let start = Instant::now();

        let outcome = match encode(&self.schema, raw) {
            Ok(encoded) => match self.predict_encoded(&encoded) {
                Ok(label) => {
                    let verdict = Verdict::from_label(label);
                    debug!(
                        "Predicted label {} for {:?} ({:?})",
                        label,
                        encoded.values(),
                        verdict
                    );
                    PredictionOutcome::Success {
                        label,
                        verdict,
                        encoded,
                    }
                }
                Err(e) => {
                    warn!("Prediction failed: {}", e);
                    PredictionOutcome::Failure {
                        reason: e.to_string(),
                        encoded: Some(encoded),
                    }
                }
            },
            Err(e) => {
                warn!("Encoding failed: {}", e);
                PredictionOutcome::Failure {
                    reason: e.to_string(),
                    encoded: None,
                }
            }
        };

        self.record(&outcome, start.elapsed().as_secs_f64() * 1000.0);
        outcome
    }

    /// Snapshot of the prediction counters.
    pub fn stats(&self) -> PredictorStats {
        self.stats.read().clone()
    }

    /// A panic inside the model is reported as a prediction error.
    fn predict_encoded(&self, encoded: &EncodedRecord) -> ServingResult<i64> {
        let row = encoded.as_f32();
        panic::catch_unwind(AssertUnwindSafe(|| self.model.predict(&row)))
            .unwrap_or_else(|payload| Err(ServingError::prediction(panic_message(payload.as_ref()))))
    }

    fn record(&self, outcome: &PredictionOutcome, latency_ms: f64) {
        let mut stats = self.stats.write();
        stats.total_predictions += 1;
        match outcome {
            PredictionOutcome::Success { verdict, .. } => {
                stats.successful_predictions += 1;
                if verdict.is_positive() {
                    stats.positive_predictions += 1;
                }
            }
            PredictionOutcome::Failure { .. } => stats.failed_predictions += 1,
        }
        let n = stats.total_predictions as f64;
        stats.avg_latency_ms += (latency_ms - stats.avg_latency_ms) / n;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "model panicked".to_string()
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("columns", &self.schema.len())
            .field("n_features", &self.model.n_features())
            .field("stats", &*self.stats.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServingError;
    use finclusion_core::RawValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed label and remembers the last row it saw.
    struct FixedLabel {
        label: i64,
        last_row: RwLock<Vec<f32>>,
        calls: AtomicUsize,
    }

    impl FixedLabel {
        fn new(label: i64) -> Self {
            Self {
                label,
                last_row: RwLock::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for FixedLabel {
        fn n_features(&self) -> usize {
            11
        }

        fn predict(&self, features: &[f32]) -> ServingResult<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_row.write() = features.to_vec();
            Ok(self.label)
        }
    }

    struct Raising;

    impl Classifier for Raising {
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

    struct Panicking;

    impl Classifier for Panicking {
        fn n_features(&self) -> usize {
            11
        }

        fn predict(&self, _features: &[f32]) -> ServingResult<i64> {
            panic!("model internal error")
        }
    }

    fn kenya(schema: &FeatureSchema) -> RawRecord {
        RawRecord::from_pairs(
            schema,
            [
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
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_verdict_from_label() {
        assert_eq!(Verdict::from_label(1), Verdict::LikelyBanked);
        assert_eq!(Verdict::from_label(0), Verdict::UnlikelyBanked);
        assert_eq!(Verdict::from_label(2), Verdict::UnlikelyBanked);
        assert_eq!(Verdict::from_label(-1), Verdict::UnlikelyBanked);
        assert!(Verdict::LikelyBanked.message().contains("HAVE"));
        assert!(Verdict::UnlikelyBanked.message().contains("UNLIKELY"));
    }

    #[test]
    fn test_kenya_scenario_positive() {
        let schema = FeatureSchema::financial_inclusion();
        let raw = kenya(&schema);
        let model = Arc::new(FixedLabel::new(1));
        let predictor = Predictor::new(schema, model.clone());

        let outcome = predictor.encode_and_predict(&raw);
        match &outcome {
            PredictionOutcome::Success {
                label,
                verdict,
                encoded,
            } => {
                assert_eq!(*label, 1);
                assert_eq!(*verdict, Verdict::LikelyBanked);
                assert_eq!(encoded.values(), &[0, 2016, 1, 1, 3, 30, 1, 0, 3, 2, 4]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            *model.last_row.read(),
            vec![0.0, 2016.0, 1.0, 1.0, 3.0, 30.0, 1.0, 0.0, 3.0, 2.0, 4.0]
        );
    }

    #[test]
    fn test_outcome_is_binary_for_any_label() {
        for label in [-3, 0, 1, 2, 7] {
            let schema = FeatureSchema::financial_inclusion();
            let raw = RawRecord::defaults(&schema);
            let predictor = Predictor::new(schema, Arc::new(FixedLabel::new(label)));
            let verdict = predictor.encode_and_predict(&raw).verdict().unwrap();
            assert!(matches!(
                verdict,
                Verdict::LikelyBanked | Verdict::UnlikelyBanked
            ));
            assert_eq!(verdict.is_positive(), label == 1);
        }
    }

    #[test]
    fn test_model_error_becomes_failure() {
        let schema = FeatureSchema::financial_inclusion();
        let raw = kenya(&schema);
        let predictor = Predictor::new(schema, Arc::new(Raising));

        let outcome = predictor.encode_and_predict(&raw);
        match &outcome {
            PredictionOutcome::Failure { reason, encoded } => {
                assert_eq!(
                    reason,
                    "X has 11 features, but model expects 10 features as input"
                );
                assert!(encoded.is_some());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Still usable afterwards.
        assert!(!predictor.encode_and_predict(&raw).is_success());
        assert_eq!(predictor.stats().failed_predictions, 2);
    }

    #[test]
    fn test_unknown_category_skips_model() {
        let schema = FeatureSchema::financial_inclusion();
        let mut raw = RawRecord::defaults(&schema);
        raw.set("job_type", RawValue::Text("Astronaut".into()));
        let model = Arc::new(FixedLabel::new(1));
        let predictor = Predictor::new(schema, model.clone());

        let outcome = predictor.encode_and_predict(&raw);
        assert_eq!(
            outcome,
            PredictionOutcome::Failure {
                reason: "Unknown category \"Astronaut\" for field 'job_type'".into(),
                encoded: None,
            }
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stats() {
        let schema = FeatureSchema::financial_inclusion();
        let raw = RawRecord::defaults(&schema);
        let predictor = Predictor::new(schema, Arc::new(FixedLabel::new(1)));
        predictor.encode_and_predict(&raw);
        predictor.encode_and_predict(&raw);

        let stats = predictor.stats();
        assert_eq!(stats.total_predictions, 2);
        assert_eq!(stats.successful_predictions, 2);
        assert_eq!(stats.positive_predictions, 2);
        assert_eq!(stats.failed_predictions, 0);
        assert!(stats.avg_latency_ms >= 0.0);
    }

    #[test]
    fn test_outcome_serialization() {
        let schema = FeatureSchema::financial_inclusion();
        let raw = RawRecord::defaults(&schema);
        let predictor = Predictor::new(schema, Arc::new(FixedLabel::new(0)));
        let json = serde_json::to_value(predictor.encode_and_predict(&raw)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["label"], 0);
        assert_eq!(json["verdict"], "unlikely_banked");
        assert_eq!(json["encoded"]["values"][1], 2016);

        let failure = PredictionOutcome::Failure {
            reason: "boom".into(),
            encoded: None,
        };
        let json = serde_json::to_value(failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "boom");
        assert!(json.get("encoded").is_none());
    }

    #[test]
    fn test_model_panic_becomes_failure() {
        let schema = FeatureSchema::financial_inclusion();
        let raw = RawRecord::defaults(&schema);
        let predictor = Predictor::new(schema, Arc::new(Panicking));

        let outcome = predictor.encode_and_predict(&raw);
        match &outcome {
            PredictionOutcome::Failure { reason, encoded } => {
                assert_eq!(reason, "model internal error");
                assert_eq!(encoded.as_ref().map(EncodedRecord::len), Some(11));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(!predictor.encode_and_predict(&raw).is_success());
        let stats = predictor.stats();
        assert_eq!(stats.total_predictions, 2);
        assert_eq!(stats.failed_predictions, 2);
    }
}
