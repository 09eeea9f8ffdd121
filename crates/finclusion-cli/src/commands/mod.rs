//! CLI Command Implementations
//!
//! - [`serve`]: HTTP prediction page
//! - [`predict`]: one-shot prediction from flags
//! - [`schema`]: schema dump

mod predict;
mod schema;
mod serve;

pub use predict::PredictCommand;
pub use schema::SchemaCommand;
pub use serve::ServeCommand;
