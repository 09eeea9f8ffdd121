//! Declarative feature schema.
//!
//! A [`FeatureSchema`] is the single source of truth for the form and the encoder:
//! an ordered list of fields, each either categorical (with its label-to-code table)
//! or numeric (with an optional lower bound and a default). The option list shown to
//! the user is read straight from the mapping table, so the two can never drift apart.
//!
//! # Overview
//!
//! - [`FeatureSchema`]: ordered fields, in the column order the model expects.
//! - [`FieldSpec`]: one column with its name, display label and [`FieldKind`].
//! - [`CategoryOption`]: one selectable label and the integer code it encodes to.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::record::RawValue;

/// One selectable category and its training-time integer code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    /// Display value, also the value submitted by the form.
    pub label: String,
    /// Integer code the model was trained with.
    pub code: i64,
}

impl CategoryOption {
    fn new(label: &str, code: i64) -> Self {
        Self {
            label: label.to_string(),
            code,
        }
    }
}

/// The kind of a feature column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A closed set of labels, each mapped to an integer code.
    Categorical {
        /// Options in display order.
        options: Vec<CategoryOption>,
    },
    /// An integer passed through to the model unchanged.
    Numeric {
        /// Inclusive lower bound, if any. There is never an upper bound.
        min: Option<i64>,
        /// Value shown before the user changes anything.
        default: i64,
    },
}

/// A single column of the feature record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name as the model knows it.
    pub name: String,
    /// Human readable label for the form control.
    pub label: String,
    /// Categorical mapping or numeric bounds.
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Creates a categorical field from `(label, code)` pairs in display order.
    pub fn categorical(name: &str, label: &str, options: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Categorical {
                options: options
                    .iter()
                    .map(|(label, code)| CategoryOption::new(label, *code))
                    .collect(),
            },
        }
    }

    /// Creates a numeric passthrough field.
    pub fn numeric(name: &str, label: &str, min: Option<i64>, default: i64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Numeric { min, default },
        }
    }

    /// Returns true for categorical fields.
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FieldKind::Categorical { .. })
    }

    /// Returns the selectable labels, i.e. the key set of the mapping table.
    ///
    /// Numeric fields have no options.
    pub fn options(&self) -> impl Iterator<Item = &str> + '_ {
        let options: &[CategoryOption] = match &self.kind {
            FieldKind::Categorical { options } => options,
            FieldKind::Numeric { .. } => &[],
        };
        options.iter().map(|o| o.label.as_str())
    }

    /// Looks up the code for a categorical label.
    pub fn code_for(&self, label: &str) -> Option<i64> {
        match &self.kind {
            FieldKind::Categorical { options } => {
                options.iter().find(|o| o.label == label).map(|o| o.code)
            }
            FieldKind::Numeric { .. } => None,
        }
    }

    /// Returns the set of codes a categorical field can encode to.
    pub fn codes(&self) -> Vec<i64> {
        match &self.kind {
            FieldKind::Categorical { options } => options.iter().map(|o| o.code).collect(),
            FieldKind::Numeric { .. } => Vec::new(),
        }
    }

    /// The value a fresh form shows for this field.
    pub fn default_raw(&self) -> RawValue {
        match &self.kind {
            FieldKind::Categorical { options } => options
                .first()
                .map(|o| RawValue::Text(o.label.clone()))
                .unwrap_or_else(|| RawValue::Text(String::new())),
            FieldKind::Numeric { default, .. } => RawValue::Int(*default),
        }
    }

    /// Checks a numeric value against the lower bound.
    pub fn check_bounds(&self, value: i64) -> Result<()> {
        if let FieldKind::Numeric { min: Some(min), .. } = &self.kind {
            if value < *min {
                return Err(CoreError::BelowMinimum {
                    field: self.name.clone(),
                    min: *min,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Ordered set of feature columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// Creates a schema from fields in model column order, validating it.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        let schema = Self { fields };
        schema.validate()?;
        Ok(schema)
    }

    /// The schema of the financial inclusion survey model.
    ///
    /// Codes are the label-encoder codes used at training time.
    pub fn financial_inclusion() -> Self {
        Self {
            fields: vec![
                FieldSpec::categorical(
                    "country",
                    "Country",
                    &[("Kenya", 0), ("Rwanda", 1), ("Tanzania", 2), ("Uganda", 3)],
                ),
                FieldSpec::numeric("year", "Year", None, 2016),
                FieldSpec::categorical(
                    "location_type",
                    "Location Type",
                    &[("Urban", 0), ("Rural", 1)],
                ),
                FieldSpec::categorical(
                    "cellphone_access",
                    "Cellphone Access",
                    &[("Yes", 1), ("No", 0)],
                ),
                FieldSpec::numeric("household_size", "Household Size", Some(1), 3),
                FieldSpec::numeric("age_of_respondent", "Age of Respondent", Some(15), 30),
                FieldSpec::categorical(
                    "gender_of_respondent",
                    "Gender",
                    &[("Male", 0), ("Female", 1)],
                ),
                FieldSpec::categorical(
                    "relationship_with_head",
                    "Relationship with Head",
                    &[
                        ("Head of Household", 0),
                        ("Spouse", 1),
                        ("Child", 2),
                        ("Other relative", 3),
                        ("Other", 4),
                    ],
                ),
                FieldSpec::categorical(
                    "marital_status",
                    "Marital Status",
                    &[
                        ("Married/Living together", 0),
                        ("Divorced/Separated", 1),
                        ("Widowed", 2),
                        ("Single/Never Married", 3),
                    ],
                ),
                FieldSpec::categorical(
                    "education_level",
                    "Education Level",
                    &[
                        ("No formal education", 0),
                        ("Primary education", 1),
                        ("Secondary education", 2),
                        ("Tertiary education", 3),
                        ("Vocational/Specialised training", 4),
                        ("Other/Dont know/RTA", 5),
                    ],
                ),
                FieldSpec::categorical(
                    "job_type",
                    "Job Type",
                    &[
                        ("Self employed", 0),
                        ("Government Dependent", 1),
                        ("Formally employed Private", 2),
                        ("Formally employed Government", 3),
                        ("Informally employed", 4),
                        ("Farming and Fishing", 5),
                        ("Remittance Dependent", 6),
                        ("Other Income", 7),
                        ("Dont Know/Refuse to answer", 8),
                        ("No Income", 9),
                    ],
                ),
            ],
        }
    }

    /// Returns the fields in column order.
    #[inline]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by column name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in model order.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Validates the schema.
    ///
    /// Field names must be unique; each categorical field needs at least one option
    /// and unique labels and codes.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(CoreError::invalid_schema("schema has no fields"));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(CoreError::invalid_schema(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }

            if let FieldKind::Categorical { options } = &field.kind {
                if options.is_empty() {
                    return Err(CoreError::invalid_schema(format!(
                        "field '{}' has no options",
                        field.name
                    )));
                }
                let mut labels = HashSet::new();
                let mut codes = HashSet::new();
                for option in options {
                    if !labels.insert(option.label.as_str()) {
                        return Err(CoreError::invalid_schema(format!(
                            "field '{}' repeats label {:?}",
                            field.name, option.label
                        )));
                    }
                    if !codes.insert(option.code) {
                        return Err(CoreError::invalid_schema(format!(
                            "field '{}' repeats code {}",
                            field.name, option.code
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::financial_inclusion()
    }
}
