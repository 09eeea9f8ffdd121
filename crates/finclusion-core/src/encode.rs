//! Categorical encoding.
//!
//! [`encode`] turns a [`RawRecord`] into an [`EncodedRecord`] by mapping every categorical
//! column through its field's table and passing numeric columns through. It is a pure
//! function of the schema and the record.

use crate::error::{CoreError, Result};
use crate::record::{EncodedRecord, RawRecord, RawValue};
use crate::schema::{FeatureSchema, FieldKind};

/// Encodes a raw record against a schema.
///
/// # Errors
///
/// - [`CoreError::ColumnCount`] if the record does not have one value per field.
/// - [`CoreError::UnknownCategory`] if a label has no mapping.
/// - [`CoreError::TypeMismatch`] if a cell holds the wrong kind of value.
///
/// # Examples
///
/// ```
/// use finclusion_core::{encode, FeatureSchema, RawRecord};
///
/// let schema = FeatureSchema::financial_inclusion();
/// let encoded = encode(&schema, &RawRecord::defaults(&schema)).unwrap();
/// assert_eq!(encoded.values(), &[0, 2016, 0, 1, 3, 30, 0, 0, 0, 0, 0]);
/// ```
pub fn encode(schema: &FeatureSchema, raw: &RawRecord) -> Result<EncodedRecord> {
    if raw.values().len() != schema.len() {
        return Err(CoreError::ColumnCount {
            expected: schema.len(),
            actual: raw.values().len(),
        });
    }

    let mut values = Vec::with_capacity(schema.len());
    for (field, value) in schema.fields().iter().zip(raw.values()) {
        let code = match (&field.kind, value) {
            (FieldKind::Categorical { .. }, RawValue::Text(label)) => {
                field
                    .code_for(label)
                    .ok_or_else(|| CoreError::UnknownCategory {
                        field: field.name.clone(),
                        value: label.clone(),
                    })?
            }
            (FieldKind::Numeric { .. }, RawValue::Int(v)) => *v,
            (FieldKind::Categorical { .. }, RawValue::Int(_)) => {
                return Err(CoreError::TypeMismatch {
                    field: field.name.clone(),
                    expected: "a text",
                })
            }
            (FieldKind::Numeric { .. }, RawValue::Text(_)) => {
                return Err(CoreError::TypeMismatch {
                    field: field.name.clone(),
                    expected: "an integer",
                })
            }
        };
        values.push(code);
    }

    let columns = schema.fields().iter().map(|f| f.name.clone()).collect();
    Ok(EncodedRecord::new(columns, values))
}
