//! Configuration module for tfmodscan.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tfmodscan.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfmodscan.yaml
//!
//! # Scanning options
//! scan:
//!   extension: ".tf"
//!   exclude_patterns:
//!     - "*_override.tf"
//!   continue_on_error: false
//!
//! # Output options
//! output:
//!   colored: true
//!   pretty: true
//! ```

use crate::error::{Result, TfModScanError};
use crate::parser::TERRAFORM_EXTENSION;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BRACED_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

static BARE_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// File extension read from directories.
    pub extension: String,

    /// File name patterns to exclude from scanning (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Keep scanning other roots when one fails to load or parse.
    pub continue_on_error: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: TERRAFORM_EXTENSION.to_string(),
            exclude_patterns: Vec::new(),
            continue_on_error: false,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanning options
    pub scan: ScanOptions,

    /// Output options
    pub output: OutputOptions,
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Self = serde_yaml::from_str(&expanded).map_err(|e| {
            TfModScanError::config_parse(e.to_string(), Some(e.into()), file!(), line!())
        })?;

        if config.scan.extension.is_empty() {
            return Err(crate::err!(ConfigParse {
                message: "scan.extension must not be empty".to_string(),
                source: None,
            }));
        }

        tracing::debug!(
            extension = %config.scan.extension,
            exclude_patterns = config.scan.exclude_patterns.len(),
            continue_on_error = config.scan.continue_on_error,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfmodscan Configuration File

# Scanning options
scan:
  # Extension of the files read from a directory
  extension: ".tf"

  # File name patterns to exclude from scanning (glob patterns)
  exclude_patterns: []
  #   - "*_override.tf"

  # Continue with the next path when one fails to parse
  continue_on_error: false

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::ScanArgs) {
        if !args.exclude_patterns.is_empty() {
            self.scan
                .exclude_patterns
                .extend(args.exclude_patterns.iter().cloned());
        }
        if args.continue_on_error {
            self.scan.continue_on_error = true;
        }
        if let Some(ref extension) = args.extension {
            self.scan.extension.clone_from(extension);
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax; unknown variables are left as is.
fn expand_env_vars(content: &str) -> String {
    let braced = BRACED_VAR_PATTERN.replace_all(content, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR_PATTERN
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.extension, ".tf");
        assert!(!config.scan.continue_on_error);
        assert!(config.output.colored);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_config_from_yaml_nested() {
        let yaml = r#"
scan:
  extension: ".hcl"
  exclude_patterns:
    - "*_override.tf"
  continue_on_error: true
output:
  colored: false
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.scan.extension, ".hcl");
        assert!(config.scan.exclude_patterns.contains(&"*_override.tf".to_string()));
        assert!(config.scan.continue_on_error);
        assert!(!config.output.colored);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("output:\n  pretty: false\n").unwrap();
        assert_eq!(config.scan.extension, ".tf");
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_empty_extension_rejected() {
        let result = Config::from_yaml("scan:\n  extension: \"\"\n");
        assert!(matches!(result, Err(TfModScanError::ConfigParse { .. })));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = Config::from_yaml("scan: [unclosed");
        assert!(matches!(result, Err(TfModScanError::ConfigParse { .. })));
    }

    #[test]
    fn test_env_var_expansion() {
        // Only variables that are certainly unset, so the environment is not modified.
        assert_eq!(
            expand_env_vars("ext: ${TFMODSCAN_SURELY_UNSET_VAR}"),
            "ext: ${TFMODSCAN_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("no vars here"), "no vars here");

        let path = std::env::var("PATH").unwrap_or_default();
        if !path.is_empty() && !path.contains('$') {
            assert_eq!(expand_env_vars("p: ${PATH}"), format!("p: {path}"));
            assert_eq!(expand_env_vars("p: $PATH"), format!("p: {path}"));
        }
    }

    #[test]
    fn test_example_yaml_is_valid() {
        let config = Config::from_yaml(&Config::example_yaml()).unwrap();
        assert_eq!(config.scan.extension, ".tf");
        assert!(config.scan.exclude_patterns.is_empty());
    }
}
