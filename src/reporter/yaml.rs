//! YAML report generator.

use crate::error::Result;
use crate::reporter::{JsonReport, ReportGenerator};
use crate::types::ScanResult;

/// YAML report generator; emits the same document as the JSON reporter.
pub struct YamlReporter;

impl ReportGenerator for YamlReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        serde_yaml::to_string(&JsonReport::from(result)).map_err(|e| crate::err!(ReportGeneration {
            message: format!("Failed to serialize YAML report: {e}"),
        }))
    }
}
