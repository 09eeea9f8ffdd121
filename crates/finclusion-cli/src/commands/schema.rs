//! Schema Command Implementation

use anyhow::{Context, Result};
use clap::Args;
use finclusion_core::FeatureSchema;

/// Print the feature schema (fields, options and codes) as JSON
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaCommand {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl SchemaCommand {
    /// Execute the schema command
    pub fn run(&self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }

    /// Render the built-in schema.
    pub fn render(&self) -> Result<String> {
        let schema = FeatureSchema::financial_inclusion();
        let json = if self.pretty {
            serde_json::to_string_pretty(&schema)
        } else {
            serde_json::to_string(&schema)
        };
        json.context("Failed to serialize feature schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_round_trips_schema() {
        let text = SchemaCommand { pretty: true }.render().unwrap();
        let parsed: FeatureSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, FeatureSchema::financial_inclusion());
        assert!(text.contains('\n'));

        let compact = SchemaCommand::default().render().unwrap();
        assert!(!compact.contains('\n'));
    }
}
