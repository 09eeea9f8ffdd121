//! Raw and encoded feature records.
//!
//! A [`RawRecord`] is the single row assembled from the current form state, before any
//! categorical mapping. An [`EncodedRecord`] is the same row after encoding, fully numeric
//! and ready for the model. Both are built fresh per request and dropped afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::schema::{FeatureSchema, FieldKind, FieldSpec};

/// A single raw cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A categorical label.
    Text(String),
    /// A numeric value.
    Int(i64),
}

impl RawValue {
    /// Returns the text if this is a categorical value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Returns the integer if this is a numeric value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

/// One row of raw selections in schema column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    columns: Vec<String>,
    values: Vec<RawValue>,
}

impl RawRecord {
    /// Creates a record from parallel column and value lists without checking them
    /// against a schema. The encoder reports any mismatch.
    pub fn new(columns: Vec<String>, values: Vec<RawValue>) -> Self {
        Self { columns, values }
    }

    /// A record with every field at its default.
    pub fn defaults(schema: &FeatureSchema) -> Self {
        Self {
            columns: schema.fields().iter().map(|f| f.name.clone()).collect(),
            values: schema.fields().iter().map(FieldSpec::default_raw).collect(),
        }
    }

    /// Collects submitted `name=value` pairs into a record.
    ///
    /// Fields that were not submitted keep their defaults; unknown names are ignored.
    /// When a name repeats, the last value wins. Numeric fields are parsed and checked
    /// against their lower bound here, categorical labels are kept verbatim.
    pub fn from_pairs<I, K, V>(schema: &FeatureSchema, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = Self::defaults(schema);
        for (name, value) in pairs {
            let Some(index) = record.position(name.as_ref()) else {
                continue;
            };
            let field = &schema.fields()[index];
            record.values[index] = collect_text(field, value.as_ref())?;
        }
        Ok(record)
    }

    /// Collects submitted pairs for display only.
    ///
    /// Unlike [`RawRecord::from_pairs`] this never fails: numeric fields that do not parse
    /// or fall below their minimum keep the submitted text, so the preview can show
    /// exactly what was entered.
    pub fn collect_verbatim<I, K, V>(schema: &FeatureSchema, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut record = Self::defaults(schema);
        for (name, value) in pairs {
            let Some(index) = record.position(name.as_ref()) else {
                continue;
            };
            let field = &schema.fields()[index];
            record.values[index] = collect_text(field, value.as_ref())
                .unwrap_or_else(|_| RawValue::Text(value.as_ref().to_string()));
        }
        record
    }

    /// Collects a JSON object (`{"country": "Kenya", "year": 2016, ...}`) into a record.
    ///
    /// Numeric fields accept integers or integer strings; categorical fields accept strings.
    pub fn from_json(
        schema: &FeatureSchema,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let mut record = Self::defaults(schema);
        for (index, field) in schema.fields().iter().enumerate() {
            let Some(value) = object.get(&field.name) else {
                continue;
            };
            record.values[index] = match value {
                serde_json::Value::String(s) => collect_text(field, s)?,
                serde_json::Value::Number(n) => match (&field.kind, n.as_i64()) {
                    (FieldKind::Numeric { .. }, Some(v)) => {
                        field.check_bounds(v)?;
                        RawValue::Int(v)
                    }
                    (FieldKind::Numeric { .. }, None) => {
                        return Err(CoreError::InvalidNumber {
                            field: field.name.clone(),
                            value: n.to_string(),
                        })
                    }
                    (FieldKind::Categorical { .. }, _) => {
                        return Err(CoreError::TypeMismatch {
                            field: field.name.clone(),
                            expected: "a text",
                        })
                    }
                },
                _ => {
                    return Err(CoreError::TypeMismatch {
                        field: field.name.clone(),
                        expected: if field.is_categorical() {
                            "a text"
                        } else {
                            "an integer"
                        },
                    })
                }
            };
        }
        Ok(record)
    }

    /// Column names in order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    #[inline]
    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    /// Looks up a value by column name.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.position(name).map(|i| &self.values[i])
    }

    /// Replaces a value by column name. Returns false if the column does not exist.
    pub fn set(&mut self, name: &str, value: RawValue) -> bool {
        match self.position(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Iterates `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn collect_text(field: &FieldSpec, value: &str) -> Result<RawValue> {
    match &field.kind {
        FieldKind::Categorical { .. } => Ok(RawValue::Text(value.to_string())),
        FieldKind::Numeric { .. } => {
            let parsed = value
                .trim()
                .parse::<i64>()
                .map_err(|_| CoreError::InvalidNumber {
                    field: field.name.clone(),
                    value: value.to_string(),
                })?;
            field.check_bounds(parsed)?;
            Ok(RawValue::Int(parsed))
        }
    }
}

/// A fully numeric row ready for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedRecord {
    columns: Vec<String>,
    values: Vec<i64>,
}

impl EncodedRecord {
    pub(crate) fn new(columns: Vec<String>, values: Vec<i64>) -> Self {
        Self { columns, values }
    }

    /// Column names in order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Encoded values in column order.
    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up an encoded value by column name.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    /// Values as `f32`, the input type of the classifiers.
    pub fn as_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    /// Values as `f64`.
    pub fn as_f64(&self) -> Vec<f64> {
        self.values.iter().map(|&v| v as f64).collect()
    }
}
