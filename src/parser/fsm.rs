//! Finite-state machine that recognizes module blocks.
//!
//! [`step`] consumes exactly one decision worth of tokens from the
//! [`Lexer`] and returns a [`Transition`]: the next [`State`], the updated
//! [`Context`] and, when the step read something worth keeping, a [`Delta`]
//! for the caller to apply to the [`Configuration`](crate::Configuration).
//! The step never touches the configuration itself, so duplicate detection
//! lives with the model and the state machine can be driven token by token
//! in tests.

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

/// Where in the grammar the machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Outside of any module; everything but `module` is skipped.
    #[default]
    TopLevel,
    /// Read `module`, waiting for its name.
    ModuleName,
    /// Read the module name, waiting for `{`.
    ModuleOpenBrace,
    /// Inside a module block, between attributes.
    ModuleBody,
    /// Read `source`, waiting for `=`.
    SourceEquals,
    /// Read `source =`, waiting for the path.
    SourceValue,
    /// Read `providers`, waiting for `= {`.
    ProvidersEquals,
    /// Inside the `providers` map.
    ProvidersBody,
    /// Read a parameter name, waiting for `= value`.
    ParameterEquals,
}

impl State {
    /// What the machine needs next in this state, for end-of-input errors.
    #[must_use]
    pub const fn expectation(self) -> &'static str {
        match self {
            Self::TopLevel => "a top-level block",
            Self::ModuleName => "module name",
            Self::ModuleOpenBrace => "`{` after module name",
            Self::ModuleBody => "`}` closing the module",
            Self::SourceEquals => "`=` after `source`",
            Self::SourceValue => "module source path",
            Self::ProvidersEquals => "`= {` after `providers`",
            Self::ProvidersBody => "`}` closing the providers map",
            Self::ParameterEquals => "parameter value",
        }
    }
}

/// Names of the constructs currently being assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Module whose block is open
    pub module: Option<String>,
    /// Parameter whose name was read but not its value
    pub parameter: Option<String>,
}

/// A change to the configuration model produced by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Create an empty module record.
    DeclareModule {
        /// Module name
        name: String,
    },
    /// Set a module's source path.
    SetSource {
        /// Target module
        module: String,
        /// The `source` value
        path: String,
    },
    /// Add a parameter to a module.
    InsertParameter {
        /// Target module
        module: String,
        /// Parameter name
        name: String,
        /// Parameter value
        value: String,
    },
    /// Bind a provider alias inside a module.
    InsertProvider {
        /// Target module
        module: String,
        /// Alias as seen by the module
        alias: String,
        /// Provider the alias resolves to
        reference: String,
    },
}

/// Outcome of one FSM step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to continue from
    pub state: State,
    /// Context to continue with
    pub context: Context,
    /// Change to apply, if any
    pub delta: Option<Delta>,
}

impl Transition {
    const fn to(state: State, context: Context) -> Self {
        Self { state, context, delta: None }
    }

    fn with(mut self, delta: Delta) -> Self {
        self.delta = Some(delta);
        self
    }
}

/// Take one step from `state`.
///
/// If only trivia remains before end of input the step is a no-op; the
/// driver then runs [`finish`].
///
/// # Errors
///
/// Lexer errors, syntax errors for misplaced tokens, and consistency errors
/// when `context` does not match `state`.
pub fn step(state: State, context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    let next = lexer.peek()?;
    if next.kind == TokenKind::Eof {
        return Ok(Transition::to(state, context));
    }

    match state {
        State::TopLevel => top_level(next, context, lexer),
        State::ModuleName => module_name(context, lexer),
        State::ModuleOpenBrace => {
            lexer.pop_expecting(TokenKind::LBrace)?;
            Ok(Transition::to(State::ModuleBody, context))
        }
        State::ModuleBody => module_body(next, context, lexer),
        State::SourceEquals => {
            lexer.pop_expecting(TokenKind::Equals)?;
            Ok(Transition::to(State::SourceValue, context))
        }
        State::SourceValue => source_value(context, lexer),
        State::ProvidersEquals => {
            lexer.pop_expecting(TokenKind::Equals)?;
            lexer.pop_expecting(TokenKind::LBrace)?;
            Ok(Transition::to(State::ProvidersBody, context))
        }
        State::ProvidersBody => provider_binding(context, lexer),
        State::ParameterEquals => parameter_value(context, lexer),
    }
}

/// Validate the machine once input is exhausted.
///
/// # Errors
///
/// Returns a validation error naming whatever construct is still open.
pub fn finish(state: State, context: &Context) -> Result<()> {
    if let Some(parameter) = &context.parameter {
        return Err(ParseError::UnterminatedParameter {
            module: context.module.clone().unwrap_or_default(),
            parameter: parameter.clone(),
        });
    }
    if let Some(module) = &context.module {
        return Err(ParseError::UnterminatedModule { module: module.clone() });
    }
    if state != State::TopLevel {
        return Err(ParseError::UnexpectedEof {
            expected: state.expectation().to_string(),
        });
    }
    Ok(())
}

fn top_level(next: Token<'_>, context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    if next.is_keyword("module") {
        lexer.pop()?;
        return Ok(Transition::to(State::ModuleName, context));
    }
    if next.kind == TokenKind::LBrace {
        lexer.skip_block()?;
    } else {
        lexer.pop()?;
    }
    Ok(Transition::to(State::TopLevel, context))
}

fn module_name(mut context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    if let Some(current) = &context.module {
        return Err(ParseError::inconsistent(format!(
            "reading module name, while we have current module `{current}`"
        )));
    }
    let name = expect_word(lexer, "module name")?;
    if name.text.is_empty() {
        return Err(unexpected(name, "non-empty module name"));
    }
    let name = name.text.to_string();
    context.module = Some(name.clone());
    Ok(Transition::to(State::ModuleOpenBrace, context).with(Delta::DeclareModule { name }))
}

fn module_body(next: Token<'_>, mut context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    if next.is_named("source") {
        lexer.pop()?;
        return Ok(Transition::to(State::SourceEquals, context));
    }
    if next.is_named("providers") {
        lexer.pop()?;
        return Ok(Transition::to(State::ProvidersEquals, context));
    }
    if next.kind == TokenKind::RBrace {
        lexer.pop()?;
        context.module = None;
        return Ok(Transition::to(State::TopLevel, context));
    }

    if let Some(current) = &context.parameter {
        return Err(ParseError::inconsistent(format!(
            "next token is to be parameter, but there is already parameter `{current}`"
        )));
    }
    let name = expect_word(lexer, "parameter name or `}`")?;
    context.parameter = Some(name.text.to_string());
    Ok(Transition::to(State::ParameterEquals, context))
}

fn source_value(context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    let Some(module) = context.module.clone() else {
        return Err(ParseError::inconsistent("module name expected to be set"));
    };
    let path = expect_word(lexer, "module source path")?.text.to_string();
    Ok(Transition::to(State::ModuleBody, context).with(Delta::SetSource { module, path }))
}

fn provider_binding(context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    if lexer.peek()?.kind == TokenKind::RBrace {
        lexer.pop()?;
        return Ok(Transition::to(State::ModuleBody, context));
    }

    let alias = expect_word(lexer, "provider alias or `}`")?.text.to_string();
    lexer.pop_expecting(TokenKind::Equals)?;
    let reference = expect_word(lexer, "provider reference")?.text.to_string();
    let Some(module) = context.module.clone() else {
        return Err(ParseError::inconsistent(format!(
            "got provider alias `{alias}` outside of a module"
        )));
    };
    Ok(Transition::to(State::ProvidersBody, context).with(Delta::InsertProvider {
        module,
        alias,
        reference,
    }))
}

fn parameter_value(mut context: Context, lexer: &mut Lexer<'_>) -> Result<Transition> {
    lexer.pop_expecting(TokenKind::Equals)?;
    let value = if lexer.peek()?.kind == TokenKind::LBrace {
        lexer.skip_block()?.to_string()
    } else {
        expect_word(lexer, "parameter value")?.text.to_string()
    };

    let Some(name) = context.parameter.take() else {
        return Err(ParseError::inconsistent(format!(
            "got param value `{value}`, but param name is empty"
        )));
    };
    let Some(module) = context.module.clone() else {
        return Err(ParseError::inconsistent(format!(
            "got parameter `{name}` outside of a module"
        )));
    };
    Ok(Transition::to(State::ModuleBody, context).with(Delta::InsertParameter { module, name, value }))
}

/// Pop a token that must be an identifier or a quoted string.
fn expect_word<'a>(lexer: &mut Lexer<'a>, expected: &str) -> Result<Token<'a>> {
    let token = lexer.pop()?;
    if token.is_word() {
        Ok(token)
    } else {
        Err(unexpected(token, expected))
    }
}

fn unexpected(token: Token<'_>, expected: &str) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.describe(),
        expected: expected.to_string(),
        offset: token.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open_module(name: &str) -> Context {
        Context {
            module: Some(name.to_string()),
            parameter: None,
        }
    }

    #[test]
    fn test_top_level_skips_unrelated_tokens() {
        let mut lexer = Lexer::new("resource \"aws_instance\" \"web\" { ami = \"x\" } module");
        let mut state = State::TopLevel;
        let mut context = Context::default();
        for _ in 0..4 {
            let t = step(state, context, &mut lexer).unwrap();
            assert_eq!(t.delta, None);
            (state, context) = (t.state, t.context);
        }
        assert_eq!(state, State::TopLevel);
        let t = step(state, context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ModuleName);
    }

    #[test]
    fn test_quoted_module_label_is_not_a_keyword() {
        let mut lexer = Lexer::new("variable \"module\" {}");
        let t = step(State::TopLevel, Context::default(), &mut lexer).unwrap();
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::TopLevel);
    }

    #[test]
    fn test_module_keyword_ignores_case() {
        for keyword in ["MODULE", "Module", "module"] {
            let text = format!("{keyword} \"a\"");
            let mut lexer = Lexer::new(&text);
            let t = step(State::TopLevel, Context::default(), &mut lexer).unwrap();
            assert_eq!(t.state, State::ModuleName, "{keyword}");
        }
    }

    #[test]
    fn test_quoted_source_sets_source() {
        let mut lexer = Lexer::new("\"source\" = \"./x\"");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t.state, State::SourceEquals);
    }

    #[test]
    fn test_body_keywords_are_case_sensitive() {
        let mut lexer = Lexer::new("Source = \"./x\"");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t.state, State::ParameterEquals);
        assert_eq!(t.context.parameter.as_deref(), Some("Source"));
    }

    #[test]
    fn test_module_name_declares_module() {
        let mut lexer = Lexer::new("\"vpc\" {");
        let t = step(State::ModuleName, Context::default(), &mut lexer).unwrap();
        assert_eq!(t.state, State::ModuleOpenBrace);
        assert_eq!(t.context, open_module("vpc"));
        assert_eq!(t.delta, Some(Delta::DeclareModule { name: "vpc".into() }));
    }

    #[test]
    fn test_module_name_while_module_open() {
        let mut lexer = Lexer::new("\"other\" {");
        let err = step(State::ModuleName, open_module("vpc"), &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::Inconsistent { .. }));
    }

    #[test]
    fn test_empty_module_name() {
        let mut lexer = Lexer::new("\"\" {");
        let err = step(State::ModuleName, Context::default(), &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_module_requires_open_brace() {
        let mut lexer = Lexer::new("source = \"x\"");
        let err = step(State::ModuleOpenBrace, open_module("vpc"), &mut lexer).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                found: "source".into(),
                expected: "`{`".into(),
                offset: 0,
            }
        );
    }

    #[test]
    fn test_source_sequence() {
        let mut lexer = Lexer::new("source = \"../x\"");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t.state, State::SourceEquals);
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::SourceValue);
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ModuleBody);
        assert_eq!(
            t.delta,
            Some(Delta::SetSource { module: "m1".into(), path: "../x".into() })
        );
    }

    #[test]
    fn test_source_without_module_context() {
        let mut lexer = Lexer::new("\"../x\"");
        let err = step(State::SourceValue, Context::default(), &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::Inconsistent { .. }));
    }

    #[test]
    fn test_parameter_sequence() {
        let mut lexer = Lexer::new("region = us-east-1 }");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t.state, State::ParameterEquals);
        assert_eq!(t.context.parameter.as_deref(), Some("region"));
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ModuleBody);
        assert_eq!(t.context, open_module("m1"));
        assert_eq!(
            t.delta,
            Some(Delta::InsertParameter {
                module: "m1".into(),
                name: "region".into(),
                value: "us-east-1".into(),
            })
        );
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::TopLevel);
        assert_eq!(t.context, Context::default());
    }

    #[test]
    fn test_parameter_while_parameter_open() {
        let context = Context {
            module: Some("m1".into()),
            parameter: Some("a".into()),
        };
        let mut lexer = Lexer::new("b = 1");
        let err = step(State::ModuleBody, context, &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::Inconsistent { .. }));
    }

    #[test]
    fn test_parameter_value_without_name() {
        let mut lexer = Lexer::new("= 1");
        let err = step(State::ParameterEquals, open_module("m1"), &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::Inconsistent { .. }));
    }

    #[test]
    fn test_object_parameter_keeps_raw_block() {
        let context = Context {
            module: Some("m1".into()),
            parameter: Some("tags".into()),
        };
        let mut lexer = Lexer::new("= { Name = \"x\" }\n}");
        let t = step(State::ParameterEquals, context, &mut lexer).unwrap();
        assert_eq!(
            t.delta,
            Some(Delta::InsertParameter {
                module: "m1".into(),
                name: "tags".into(),
                value: "{ Name = \"x\" }".into(),
            })
        );
    }

    #[test]
    fn test_providers_sequence() {
        let mut lexer = Lexer::new("providers = {\n aws.alice = aws.us-east-1\n}");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t.state, State::ProvidersEquals);
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ProvidersBody);
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ProvidersBody);
        assert_eq!(
            t.delta,
            Some(Delta::InsertProvider {
                module: "m1".into(),
                alias: "aws.alice".into(),
                reference: "aws.us-east-1".into(),
            })
        );
        let t = step(t.state, t.context, &mut lexer).unwrap();
        assert_eq!(t.state, State::ModuleBody);
        assert!(lexer.is_eof());
    }

    #[test]
    fn test_provider_binding_requires_equals() {
        let mut lexer = Lexer::new("aws.alice aws.us-east-1");
        let err = step(State::ProvidersBody, open_module("m1"), &mut lexer).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "`=`"));
    }

    #[test]
    fn test_trailing_comment_is_a_no_op() {
        let mut lexer = Lexer::new("# only a comment");
        let t = step(State::ModuleBody, open_module("m1"), &mut lexer).unwrap();
        assert_eq!(t, Transition::to(State::ModuleBody, open_module("m1")));
        assert!(lexer.is_eof());
    }

    #[test]
    fn test_finish() {
        assert_eq!(finish(State::TopLevel, &Context::default()), Ok(()));
        assert_eq!(
            finish(State::ModuleBody, &open_module("m1")),
            Err(ParseError::UnterminatedModule { module: "m1".into() })
        );
        let context = Context {
            module: Some("m1".into()),
            parameter: Some("region".into()),
        };
        assert_eq!(
            finish(State::ParameterEquals, &context),
            Err(ParseError::UnterminatedParameter {
                module: "m1".into(),
                parameter: "region".into(),
            })
        );
        assert!(matches!(
            finish(State::ModuleName, &Context::default()),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }
}
