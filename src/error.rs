//! Error types for tfmodscan.
//!
//! Two layers of errors are defined here:
//!
//! - [`ParseError`]: everything the lexer and the module FSM can report.
//!   These carry byte offsets into the parsed buffer and never any file
//!   context, since the core only ever sees one buffer.
//! - [`TfModScanError`]: the crate-level error used by the loader, scanner,
//!   configuration and reporters. Variants record the Rust source location
//!   they were raised from (see [`err!`](crate::err)).
//!
//! # Example
//!
//! ```rust
//! use tfmodscan::error::{ErrorCategory, ParseError};
//!
//! let err = tfmodscan::parse("module \"a\" {").unwrap_err();
//! assert!(matches!(err, ParseError::UnterminatedModule { .. }));
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(FileNotFound { path: path.to_path_buf() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::TfModScanError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfmodscan operations.
pub type Result<T> = std::result::Result<T, TfModScanError>;

/// Family a [`ParseError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed lexical structure (comments, strings, braces).
    Lex,
    /// A required token was not where it was expected.
    Syntax,
    /// Conflicting declarations.
    Semantic,
    /// The FSM context disagreed with the action being taken.
    Consistency,
    /// End of input reached with a construct still open.
    Validation,
}

/// Errors produced while lexing and parsing one buffer.
///
/// Every error is terminal: the first one aborts the parse and no partial
/// configuration is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    // =========================================================================
    // Lex errors
    // =========================================================================
    /// A `/*` comment was still open at end of input.
    #[error("unable to find closing multiline comment opened at byte {offset}")]
    UnterminatedComment {
        /// Offset of the opening `/*`
        offset: usize,
    },

    /// A skipped block had unbalanced braces at end of input.
    #[error("unable to find closing brace for block opened at byte {offset}")]
    UnterminatedBlock {
        /// Offset of the opening `{`
        offset: usize,
    },

    /// A quoted string had no closing quote.
    #[error("unterminated quoted string starting at byte {offset}")]
    UnterminatedString {
        /// Offset of the opening `"`
        offset: usize,
    },

    // =========================================================================
    // Syntax errors
    // =========================================================================
    /// A different token was found where a specific one was required.
    #[error("unexpected token `{found}` at byte {offset}, expected {expected}")]
    UnexpectedToken {
        /// Rendering of the token found
        found: String,
        /// What was expected instead
        expected: String,
        /// Offset of the token found
        offset: usize,
    },

    // =========================================================================
    // Semantic errors
    // =========================================================================
    /// A module name was declared twice.
    #[error("duplicated module name found: `{name}`")]
    DuplicateModule {
        /// The module name
        name: String,
    },

    /// A parameter was assigned twice inside one module.
    #[error("duplicated parameter `{parameter}` in module `{module}`")]
    DuplicateParameter {
        /// The enclosing module
        module: String,
        /// The parameter name
        parameter: String,
    },

    /// A provider alias was bound twice inside one module.
    #[error("provider alias `{alias}` has already been used in module `{module}`")]
    DuplicateProvider {
        /// The enclosing module
        module: String,
        /// The provider alias
        alias: String,
    },

    /// `source` was assigned twice inside one module.
    #[error("source of module `{module}` is already set")]
    DuplicateSource {
        /// The enclosing module
        module: String,
    },

    // =========================================================================
    // Consistency errors
    // =========================================================================
    /// The FSM context was in a state the current transition does not allow.
    #[error("FSM error: {message}")]
    Inconsistent {
        /// Description of the mismatch
        message: String,
    },

    // =========================================================================
    // Validation errors
    // =========================================================================
    /// A module block was never closed.
    #[error("did not find the closing curly brace when parsing module `{module}`")]
    UnterminatedModule {
        /// The open module
        module: String,
    },

    /// A parameter name was read but never given a value.
    #[error("did not find the value for parameter `{parameter}` of module `{module}`")]
    UnterminatedParameter {
        /// The enclosing module
        module: String,
        /// The open parameter
        parameter: String,
    },

    /// Input ended in the middle of a construct.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What the parser was waiting for
        expected: String,
    },
}

impl ParseError {
    /// Creates an `Inconsistent` error.
    #[must_use]
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }

    /// Returns the family this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnterminatedComment { .. }
            | Self::UnterminatedBlock { .. }
            | Self::UnterminatedString { .. } => ErrorCategory::Lex,
            Self::UnexpectedToken { .. } => ErrorCategory::Syntax,
            Self::DuplicateModule { .. }
            | Self::DuplicateParameter { .. }
            | Self::DuplicateProvider { .. }
            | Self::DuplicateSource { .. } => ErrorCategory::Semantic,
            Self::Inconsistent { .. } => ErrorCategory::Consistency,
            Self::UnterminatedModule { .. }
            | Self::UnterminatedParameter { .. }
            | Self::UnexpectedEof { .. } => ErrorCategory::Validation,
        }
    }

    /// Byte offset into the parsed buffer, when the error has one.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::UnterminatedComment { offset }
            | Self::UnterminatedBlock { offset }
            | Self::UnterminatedString { offset }
            | Self::UnexpectedToken { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// The main error type for tfmodscan.
#[derive(Error, Debug)]
pub enum TfModScanError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// Terraform parsing error, located in the file it came from.
    #[error("Failed to parse '{}'{} \n\t({src_path}:{src_line}): {source}", file.display(), format_position(*line, *column))]
    Parse {
        /// The file the error points into
        file: PathBuf,
        /// Line number (1-based, if known)
        line: Option<usize>,
        /// Column number (1-based, if known)
        column: Option<usize>,
        /// The core parse error
        #[source]
        source: ParseError,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

fn format_position(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

impl TfModScanError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Returns the core parse error, if this is one.
    #[must_use]
    pub const fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Determines if the error is recoverable (scanning may continue with the next root).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Io { .. })
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::DirectoryNotFound { .. } => 15,
            Self::ConfigParse { .. } => 18,
            Self::Parse { .. } => 23,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ParseError::UnterminatedString { offset: 0 }.category(), ErrorCategory::Lex);
        assert_eq!(
            ParseError::DuplicateModule { name: "a".into() }.category(),
            ErrorCategory::Semantic
        );
        assert_eq!(ParseError::inconsistent("x").category(), ErrorCategory::Consistency);
        assert_eq!(
            ParseError::UnexpectedEof { expected: "`{`".into() }.category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_unexpected_token_names_both_tokens() {
        let err = ParseError::UnexpectedToken {
            found: "foo".into(),
            expected: "`=`".into(),
            offset: 12,
        };
        let message = err.to_string();
        assert!(message.contains("`foo`"));
        assert!(message.contains("`=`"));
        assert_eq!(err.offset(), Some(12));
    }

    #[test]
    fn test_parse_error_display_has_position() {
        let err = err!(Parse {
            file: PathBuf::from("main.tf"),
            line: Some(3),
            column: Some(7),
            source: ParseError::UnterminatedBlock { offset: 40 },
        });
        assert!(err.to_string().contains("main.tf' at 3:7"));
        assert_eq!(err.exit_code(), 23);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        let err = err!(DirectoryNotFound { path: PathBuf::from("nope") });
        assert_eq!(err.exit_code(), 15);
        assert!(!err.is_recoverable());
    }
}
