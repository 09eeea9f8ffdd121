//! Core types for the financial inclusion predictor.
//!
//! This crate holds everything that does not depend on the model or on HTTP:
//!
//! - [`FeatureSchema`]: the ordered, declarative list of feature columns, each with its
//!   categorical mapping or numeric bounds. Both the form and the encoder read from it.
//! - [`RawRecord`]: the single row collected from the form, before encoding.
//! - [`encode`]: maps a [`RawRecord`] to a fully numeric [`EncodedRecord`].
//! - [`CoreError`]: everything that can go wrong while collecting or encoding.
//!
//! # Example
//!
//! ```
//! use finclusion_core::{encode, FeatureSchema, RawRecord};
//!
//! let schema = FeatureSchema::financial_inclusion();
//! let raw = RawRecord::from_pairs(&schema, [("country", "Uganda"), ("location_type", "Rural")])
//!     .unwrap();
//! let encoded = encode(&schema, &raw).unwrap();
//! assert_eq!(encoded.get("country"), Some(3));
//! assert_eq!(encoded.get("location_type"), Some(1));
//! ```

#![warn(missing_docs)]

pub mod encode;
pub mod error;
pub mod record;
pub mod schema;

pub use encode::encode;
pub use error::{CoreError, Result};
pub use record::{EncodedRecord, RawRecord, RawValue};
pub use schema::{CategoryOption, FeatureSchema, FieldKind, FieldSpec};
