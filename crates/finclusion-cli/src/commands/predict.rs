//! Predict Command Implementation
//!
//! Scores one individual from command-line flags using the same schema, encoder and
//! predictor as the HTTP page. Flags left out take the form defaults.

use anyhow::{bail, Context, Result};
use clap::Args;
use finclusion_core::{FeatureSchema, RawRecord};
use finclusion_serving::config::DEFAULT_MODEL_PATH;
use finclusion_serving::{ModelLoader, PredictionOutcome, Predictor};
use std::path::PathBuf;
use tracing::info;

/// Predict whether one individual is likely to hold a bank account
///
/// # Example
///
/// ```bash
/// finclusion predict \
///     --model-path financial_model.json \
///     --country Kenya --location-type Rural --cellphone-access Yes \
///     --household-size 3 --age-of-respondent 30 --gender-of-respondent Female \
///     --relationship-with-head "Head of Household" \
///     --marital-status "Single/Never Married" \
///     --education-level "Secondary education" \
///     --job-type "Informally employed"
/// ```
#[derive(Args, Debug, Clone)]
pub struct PredictCommand {
    /// Path to the serialized model artifact
    #[arg(long, short = 'm', env = "FINCLUSION_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Print the full outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Country
    #[arg(long)]
    pub country: Option<String>,

    /// Survey year
    #[arg(long)]
    pub year: Option<String>,

    /// Location type (Rural / Urban)
    #[arg(long)]
    pub location_type: Option<String>,

    /// Cellphone access (Yes / No)
    #[arg(long)]
    pub cellphone_access: Option<String>,

    /// Household size
    #[arg(long)]
    pub household_size: Option<String>,

    /// Age of the respondent
    #[arg(long)]
    pub age_of_respondent: Option<String>,

    /// Gender of the respondent
    #[arg(long)]
    pub gender_of_respondent: Option<String>,

    /// Relationship with the head of household
    #[arg(long)]
    pub relationship_with_head: Option<String>,

    /// Marital status
    #[arg(long)]
    pub marital_status: Option<String>,

    /// Education level
    #[arg(long)]
    pub education_level: Option<String>,

    /// Job type
    #[arg(long)]
    pub job_type: Option<String>,
}

impl PredictCommand {
    /// Execute the predict command
    pub fn run(&self) -> Result<()> {
        let outcome = self.execute()?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
            );
        }
        match &outcome {
            PredictionOutcome::Success { verdict, .. } => {
                if !self.json {
                    println!("{}", verdict.message());
                }
                Ok(())
            }
            PredictionOutcome::Failure { reason, .. } => bail!("Prediction failed: {reason}"),
        }
    }

    /// Load the artifact and score the individual described by the flags.
    ///
    /// A load failure is an error; a prediction failure comes back as
    /// [`PredictionOutcome::Failure`].
    pub fn execute(&self) -> Result<PredictionOutcome> {
        let schema = FeatureSchema::financial_inclusion();
        let raw = self.raw_record(&schema)?;

        let loader = ModelLoader::new(
            schema.column_names().into_iter().map(String::from).collect(),
        );
        let model = loader
            .load(&self.model_path)
            .with_context(|| format!("Could not load model file {:?}", self.model_path))?;
        info!("Using model {:?}", model.name);

        let predictor = Predictor::new(schema, model.classifier());
        Ok(predictor.encode_and_predict(&raw))
    }

    /// Collect the provided flags into a raw record over `schema`.
    pub fn raw_record(&self, schema: &FeatureSchema) -> Result<RawRecord> {
        RawRecord::from_pairs(schema, self.field_pairs()).context("Invalid individual information")
    }

    fn field_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("country", &self.country),
            ("year", &self.year),
            ("location_type", &self.location_type),
            ("cellphone_access", &self.cellphone_access),
            ("household_size", &self.household_size),
            ("age_of_respondent", &self.age_of_respondent),
            ("gender_of_respondent", &self.gender_of_respondent),
            ("relationship_with_head", &self.relationship_with_head),
            ("marital_status", &self.marital_status),
            ("education_level", &self.education_level),
            ("job_type", &self.job_type),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}
