//! # tfmodscan
//!
//! Extracts module invocations from Terraform configuration.
//!
//! tfmodscan reads Terraform files, or directories of them, and for every
//! `module` block records its source path, its scalar parameters and its
//! provider alias bindings. Every other top-level block is skipped without
//! being interpreted.
//!
//! ## Features
//!
//! - **Small surface**: a hand-written lexer and a state machine, no HCL
//!   evaluation
//! - **Precise errors**: lexical, syntax, semantic and validation failures
//!   report the file, line and column they occurred at
//! - **Multiple roots**: each path is parsed independently and in parallel
//! - **Multiple output formats**: plain text tables, JSON and YAML
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfmodscan::{Config, ReportFormat, Scanner};
//! use tfmodscan::reporter::Reporter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let scanner = Scanner::new(config.clone());
//!
//!     // Scan a local directory
//!     let result = scanner.scan_path("./terraform").await?;
//!
//!     // Generate a report
//!     let report = Reporter::new(&config).generate(&result, ReportFormat::Json)?;
//!     println!("{report}");
//!
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{ErrorCategory, ParseError, Result, TfModScanError};
pub use parser::parse;
pub use types::{Configuration, Module, ReportFormat, ScanFailure, ScanResult, ScannedRoot};

use parser::{SourceSet, TfParser};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Scanner that loads and parses one or more Terraform roots.
///
/// Each path is a root: a single file, or a directory whose Terraform files
/// are concatenated into one buffer. Roots are parsed independently, so the
/// same module name may appear in different roots.
///
/// # Example
///
/// ```rust,no_run
/// use tfmodscan::{Config, Scanner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let scanner = Scanner::new(Config::default());
///
///     let paths = vec!["./live/prod", "./live/staging"];
///     let result = scanner.scan_paths(&paths).await?;
///
///     println!("Found {} modules", result.module_count());
///     Ok(())
/// }
/// ```
pub struct Scanner {
    config: Config,
}

impl Scanner {
    /// Create a new scanner with the given configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scan a single file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path doesn't exist or isn't readable
    /// - The configuration fails to parse
    pub async fn scan_path<P: AsRef<Path>>(&self, path: P) -> Result<ScanResult> {
        self.scan_paths(&[path.as_ref()]).await
    }

    /// Scan several files or directories.
    ///
    /// Roots are loaded in order, then parsed in parallel. The result lists
    /// roots in the order they were given.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. With `continue_on_error` set,
    /// read and parse failures are recorded in [`ScanResult::failures`]
    /// instead and only fatal errors are returned.
    pub async fn scan_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ScanResult> {
        let parser = TfParser::new(&self.config);
        let mut result = ScanResult::default();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            tracing::info!(path = %path.display(), "Scanning path");

            match parser.load(path).await {
                Ok(set) => loaded.push(set),
                Err(e) => self.record_failure(&mut result, path, e)?,
            }
        }

        let parsed: Vec<(&SourceSet, Result<Configuration>)> =
            loaded.par_iter().map(|set| (set, set.parse())).collect();

        for (set, outcome) in parsed {
            match outcome {
                Ok(configuration) => {
                    tracing::debug!(
                        path = %set.root.display(),
                        modules = configuration.len(),
                        "Parsed root"
                    );
                    result.roots.push(ScannedRoot {
                        path: set.root.clone(),
                        files: set.files().map(Path::to_path_buf).collect::<Vec<PathBuf>>(),
                        configuration,
                    });
                }
                Err(e) => self.record_failure(&mut result, &set.root, e)?,
            }
        }

        tracing::info!(
            roots = result.roots.len(),
            failures = result.failures.len(),
            modules = result.module_count(),
            "Scan complete"
        );

        Ok(result)
    }

    /// Keep going past a recoverable error, or hand it back.
    fn record_failure(&self, result: &mut ScanResult, path: &Path, error: TfModScanError) -> Result<()> {
        if !self.config.scan.continue_on_error || !error.is_recoverable() {
            return Err(error);
        }

        tracing::warn!(path = %path.display(), error = %error, "Failed to scan path");
        result.failures.push(ScanFailure {
            path: path.to_path_buf(),
            message: error.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_root(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let root = dir.path().join(name);
        fs::create_dir(&root).unwrap();
        fs::write(root.join("main.tf"), contents).unwrap();
        root
    }

    #[tokio::test]
    async fn test_scan_roots_independently() {
        let dir = TempDir::new().unwrap();
        let prod = write_root(&dir, "prod", "module \"vpc\" {\n  source = \"./vpc\"\n}\n");
        let staging = write_root(&dir, "staging", "module \"vpc\" {\n  source = \"./vpc-next\"\n}\n");

        let scanner = Scanner::new(Config::default());
        let result = scanner.scan_paths(&[&prod, &staging]).await.unwrap();

        assert_eq!(result.roots.len(), 2);
        assert_eq!(result.roots[0].path, prod);
        assert_eq!(result.roots[1].configuration.module("vpc").unwrap().source_path, "./vpc-next");
        assert_eq!(result.file_count(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_stops_scan() {
        let dir = TempDir::new().unwrap();
        let broken = write_root(&dir, "broken", "module \"vpc\" {\n");

        let scanner = Scanner::new(Config::default());
        let err = scanner.scan_path(&broken).await.unwrap_err();
        assert!(matches!(err.parse_error(), Some(ParseError::UnterminatedModule { .. })));
    }

    #[tokio::test]
    async fn test_continue_on_error_records_failures() {
        let dir = TempDir::new().unwrap();
        let good = write_root(&dir, "good", "module \"dns\" {\n  source = \"./dns\"\n}\n");
        let broken = write_root(&dir, "broken", "module \"dns\" {\n  source = \n}\n");

        let mut config = Config::default();
        config.scan.continue_on_error = true;
        let result = Scanner::new(config).scan_paths(&[&broken, &good]).await.unwrap();

        assert_eq!(result.roots.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, broken);
        assert!(result.has_failures());
    }

    #[tokio::test]
    async fn test_missing_path_is_fatal_even_when_continuing() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scan.continue_on_error = true;

        let err = Scanner::new(config)
            .scan_path(dir.path().join("nope.tf"))
            .await
            .unwrap_err();
        assert!(matches!(err, TfModScanError::FileNotFound { .. }));
    }
}
