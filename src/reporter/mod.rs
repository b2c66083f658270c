//! Report generation module.
//!
//! This module provides report generation in multiple formats:
//! - Text: Human-readable CLI tables
//! - JSON: Machine-readable structured output
//! - YAML: The same structure as JSON, for configuration pipelines
//!
//! # Example
//!
//! ```rust,no_run
//! use tfmodscan::reporter::Reporter;
//! use tfmodscan::{Config, ReportFormat, ScanResult};
//!
//! let config = Config::default();
//! let reporter = Reporter::new(&config);
//! let json = reporter.generate(&ScanResult::default(), ReportFormat::Json).unwrap();
//! ```

mod json;
mod text;
mod yaml;

use crate::config::Config;
use crate::error::Result;
use crate::types::{ReportFormat, ScanResult};

pub use json::{JsonReport, JsonReporter};
pub use text::TextReporter;
pub use yaml::YamlReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, result: &ScanResult, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(result),
            ReportFormat::Text => TextReporter::new(&self.config).generate(result),
            ReportFormat::Yaml => YamlReporter.generate(result),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from scan results.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, result: &ScanResult) -> Result<String>;
}
