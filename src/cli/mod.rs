//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `scan`: Extract module invocations from files or directories
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Scan a Terraform root
//! tfmodscan scan ./live/prod
//!
//! # Several roots, JSON report
//! tfmodscan scan ./live/prod ./live/staging --format json --output modules.json
//!
//! # Initialize configuration
//! tfmodscan init
//!
//! # Validate configuration
//! tfmodscan validate tfmodscan.yaml
//! ```

use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tfmodscan - extract module sources, parameters and provider aliases from Terraform.
#[derive(Parser, Debug)]
#[command(
    name = "tfmodscan",
    author,
    version,
    about = "Extract module invocations from Terraform configuration",
    long_about = "tfmodscan reads Terraform files or directories and reports, for every \
                  module block, its source path, its scalar parameters and its provider \
                  alias bindings. Everything else in the configuration is ignored."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TFMODSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract module invocations from Terraform files or directories
    #[command(visible_alias = "s")]
    Scan(ScanArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the scan command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Files or directories to scan; each is parsed independently
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Continue with the remaining paths when one fails to parse
    #[arg(long)]
    pub continue_on_error: bool,

    /// File name patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Extension of the files read from directories (default: .tf)
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tfmodscan.yaml")]
    pub config: PathBuf,
}
