//! Core data types used throughout tfmodscan.
//!
//! This module defines:
//! - The extracted configuration model ([`Configuration`], [`Module`])
//! - Scan results for one or more roots
//! - Report formats

use crate::error::ParseError;
use crate::parser::Delta;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One module invocation.
///
/// # Example HCL
///
/// ```hcl
/// module "routing" {
///   source   = "../../modules/vpc-routing"
///   vpc_name = "Development VPC"
///
///   providers = {
///     aws.alice = aws.us-east-1
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Value of the `source` attribute, empty until it is parsed
    pub source_path: String,

    /// Scalar parameters passed into the module, in declaration order
    #[serde(default)]
    pub parameters: IndexMap<String, String>,

    /// Provider alias to provider reference bindings, in declaration order
    #[serde(default)]
    pub providers: IndexMap<String, String>,

    /// Set once a `source` attribute was parsed, even an empty one
    #[serde(skip)]
    source_declared: bool,
}

/// Everything extracted from one buffer: module name to module record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Modules keyed by name, in declaration order
    pub modules: IndexMap<String, Module>,
}

impl Configuration {
    /// Look up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Apply one change produced by the FSM, enforcing uniqueness rules.
    ///
    /// # Errors
    ///
    /// Returns a semantic error for duplicate modules, parameters, provider
    /// aliases or sources, and a consistency error if the change targets a
    /// module that was never declared.
    pub fn apply(&mut self, delta: Delta) -> Result<(), ParseError> {
        match delta {
            Delta::DeclareModule { name } => {
                if self.modules.contains_key(&name) {
                    return Err(ParseError::DuplicateModule { name });
                }
                self.modules.insert(name, Module::default());
            }
            Delta::SetSource { module, path } => {
                let record = self.module_mut(&module)?;
                if record.source_declared {
                    return Err(ParseError::DuplicateSource { module });
                }
                record.source_path = path;
                record.source_declared = true;
            }
            Delta::InsertParameter { module, name, value } => {
                let record = self.module_mut(&module)?;
                if record.parameters.contains_key(&name) {
                    return Err(ParseError::DuplicateParameter { module, parameter: name });
                }
                record.parameters.insert(name, value);
            }
            Delta::InsertProvider { module, alias, reference } => {
                let record = self.module_mut(&module)?;
                if record.providers.contains_key(&alias) {
                    return Err(ParseError::DuplicateProvider { module, alias });
                }
                record.providers.insert(alias, reference);
            }
        }
        Ok(())
    }

    fn module_mut(&mut self, name: &str) -> Result<&mut Module, ParseError> {
        self.modules
            .get_mut(name)
            .ok_or_else(|| ParseError::inconsistent(format!("module object for `{name}` was not created")))
    }
}

/// One scanned root (a file, or a directory whose files were concatenated).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannedRoot {
    /// The path that was scanned
    pub path: PathBuf,
    /// Files that contributed to the buffer, in concatenation order
    pub files: Vec<PathBuf>,
    /// The extracted modules
    pub configuration: Configuration,
}

/// A root that failed to load or parse while `continue_on_error` was set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailure {
    /// The path that was scanned
    pub path: PathBuf,
    /// Rendered error
    pub message: String,
}

/// The result of scanning one or more roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Successfully parsed roots, in the order they were requested
    pub roots: Vec<ScannedRoot>,
    /// Roots that failed and were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScanFailure>,
}

impl ScanResult {
    /// Total number of modules across all roots.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.roots.iter().map(|r| r.configuration.len()).sum()
    }

    /// Total number of files read across all roots.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.roots.iter().map(|r| r.files.len()).sum()
    }

    /// Returns `true` if any root was skipped because of an error.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}
