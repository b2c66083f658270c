//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{ScanFailure, ScanResult, ScannedRoot};
use serde::Serialize;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, result: &ScanResult) -> Result<String> {
        let report = JsonReport::from(result);

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| crate::err!(ReportGeneration {
            message: format!("Failed to serialize JSON report: {e}"),
        }))
    }
}

/// JSON report structure, shared by the YAML reporter.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Parsed roots with their modules
    pub roots: &'a [ScannedRoot],
    /// Roots skipped because of errors
    #[serde(skip_serializing_if = "no_failures")]
    pub failures: &'a [ScanFailure],
}

impl<'a> From<&'a ScanResult> for JsonReport<'a> {
    fn from(result: &'a ScanResult) -> Self {
        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                roots_scanned: result.roots.len() + result.failures.len(),
                files_scanned: result.file_count(),
                total_modules: result.module_count(),
            },
            roots: &result.roots,
            failures: &result.failures,
        }
    }
}

fn no_failures(failures: &&[ScanFailure]) -> bool {
    failures.is_empty()
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// tfmodscan version
    pub version: String,
    /// Report generation timestamp
    pub timestamp: String,
    /// Number of paths requested
    pub roots_scanned: usize,
    /// Number of files read
    pub files_scanned: usize,
    /// Number of modules found
    pub total_modules: usize,
}
