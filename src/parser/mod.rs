//! Terraform module extraction.
//!
//! This module turns configuration text into a [`Configuration`]:
//!
//! - [`lexer`]: cursor-based tokenizer (symbols, identifiers, quoted strings,
//!   comments, block skipping)
//! - [`fsm`]: the state machine that recognizes `module` blocks
//! - [`parse`]: the driver tying both together
//! - [`TfParser`]: reads files and directories and reports errors with file
//!   positions
//!
//! # Example
//!
//! ```rust
//! let config = tfmodscan::parser::parse(r#"
//! module "vpc" {
//!   source = "../modules/vpc"
//!   cidr   = "10.0.0.0/16"
//! }
//! "#).unwrap();
//!
//! assert_eq!(config.module("vpc").unwrap().source_path, "../modules/vpc");
//! ```

pub mod fsm;
pub mod lexer;
mod loader;

pub use fsm::{Context, Delta, State, Transition};
pub use lexer::{Lexer, Token, TokenKind};
pub use loader::{Location, SourceSet, TfParser};

use crate::error::ParseError;
use crate::types::Configuration;

/// Default file extension read from directories.
pub const TERRAFORM_EXTENSION: &str = ".tf";

/// Files and directories never read.
pub const SKIP_FILES: &[&str] = &[".terraform", ".terragrunt-cache", "terraform.tfstate"];

/// Parse one buffer of Terraform configuration.
///
/// Leading and trailing whitespace is ignored. Error offsets are byte
/// offsets into `text` as given.
///
/// # Errors
///
/// Returns the first lexical, syntax, semantic, consistency or validation
/// error encountered. No partial result is returned.
pub fn parse(text: &str) -> Result<Configuration, ParseError> {
    let end = text.trim_end().len();
    let start = end - text[..end].trim_start().len();
    let mut lexer = Lexer::starting_at(&text[..end], start);

    let mut state = State::default();
    let mut context = Context::default();
    let mut config = Configuration::default();

    while !lexer.is_eof() {
        let transition = fsm::step(state, context, &mut lexer)?;
        if let Some(delta) = transition.delta {
            config.apply(delta)?;
        }
        state = transition.state;
        context = transition.context;
    }

    fsm::finish(state, &context)?;
    Ok(config)
}
