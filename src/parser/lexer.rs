//! Lexical scanner for Terraform configuration text.
//!
//! The lexer is a cursor over an immutable `&str`. It only knows enough of
//! the language to find token boundaries: symbols (`{`, `}`, `=`), quoted
//! strings, bare identifiers, and the three comment forms (`#`, `//` and
//! nesting `/* */`). Whitespace and comments are skipped on every
//! [`Lexer::peek`] and [`Lexer::pop`], so the cursor always rests either at
//! the start of a token or at end of input.
//!
//! Scanning is byte-oriented. Every delimiter is ASCII and UTF-8 continuation
//! bytes never collide with ASCII, so token boundaries always fall on char
//! boundaries and non-ASCII text passes through untouched.

use crate::error::ParseError;
use std::fmt;

type Result<T> = std::result::Result<T, ParseError>;

/// Bytes that end an identifier and are tokens of their own.
const SYMBOLS: &[u8] = b"{}=\"";

/// Bytes skipped between tokens.
const WHITESPACE: &[u8] = b"\t\r\n ";

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `=`
    Equals,
    /// A run of bytes that are neither whitespace nor symbols.
    Ident,
    /// The contents of a double-quoted string, escapes left intact.
    Str,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LBrace => write!(f, "`{{`"),
            Self::RBrace => write!(f, "`}}`"),
            Self::Equals => write!(f, "`=`"),
            Self::Ident => write!(f, "identifier"),
            Self::Str => write!(f, "quoted string"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token borrowed from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What kind of token this is
    pub kind: TokenKind,
    /// Token text; for strings this excludes the surrounding quotes
    pub text: &'a str,
    /// Byte offset of the first byte of the token (the opening quote for strings)
    pub offset: usize,
    /// Byte offset just past the token (past the closing quote for strings)
    pub end: usize,
}

impl<'a> Token<'a> {
    const fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: "",
            offset,
            end: offset,
        }
    }

    /// Returns `true` for bare identifiers spelling `keyword` in any ASCII case.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Returns `true` for identifiers or quoted strings with exactly this text.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.is_word() && self.text == name
    }

    /// Returns `true` if the token can be used as a name or scalar value.
    #[must_use]
    pub const fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Str)
    }

    /// Renders the token the way it appeared in the source, for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Str => format!("\"{}\"", self.text),
            TokenKind::Eof => "end of input".to_string(),
            _ => self.text.to_string(),
        }
    }
}

/// Cursor-based tokenizer over a configuration buffer.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `text`.
    #[must_use]
    pub const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Creates a lexer positioned at byte `offset` of `text`.
    ///
    /// `offset` must lie on a char boundary.
    #[must_use]
    pub const fn starting_at(text: &'a str, offset: usize) -> Self {
        Self { text, pos: offset }
    }

    /// Current cursor position.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    /// Returns `true` once the cursor has reached the end of the buffer.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Returns the next token without consuming it.
    ///
    /// Leading whitespace and comments are skipped first, so afterwards the
    /// cursor sits at the returned token's offset.
    ///
    /// # Errors
    ///
    /// Fails on an unterminated block comment or quoted string.
    pub fn peek(&mut self) -> Result<Token<'a>> {
        self.skip_trivia()?;
        self.scan_token()
    }

    /// Consumes the next token, then skips any whitespace and comments after it.
    ///
    /// # Errors
    ///
    /// Fails on an unterminated block comment or quoted string.
    pub fn pop(&mut self) -> Result<Token<'a>> {
        let token = self.peek()?;
        self.pos = token.end;
        self.skip_trivia()?;
        Ok(token)
    }

    /// Consumes the next token and checks that it is of the `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedToken` naming both the found and the expected token.
    pub fn pop_expecting(&mut self, expected: TokenKind) -> Result<Token<'a>> {
        let token = self.pop()?;
        if token.kind == expected {
            Ok(token)
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: expected.to_string(),
                offset: token.offset,
            })
        }
    }

    /// Skips a brace-delimited block without interpreting it.
    ///
    /// The cursor must be at `{`. Returns the raw text of the block, braces
    /// included. Comments and quoted strings inside the block do not count
    /// towards brace depth.
    ///
    /// # Errors
    ///
    /// Returns `UnterminatedBlock` if the input ends before the matching `}`,
    /// and `UnexpectedToken` if the cursor is not at `{`.
    pub fn skip_block(&mut self) -> Result<&'a str> {
        self.skip_trivia()?;
        let start = self.pos;
        let bytes = self.text.as_bytes();
        if bytes.get(start) != Some(&b'{') {
            let token = self.scan_token()?;
            return Err(ParseError::UnexpectedToken {
                found: token.describe(),
                expected: TokenKind::LBrace.to_string(),
                offset: token.offset,
            });
        }

        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    depth += 1;
                    i += 1;
                }
                b'}' => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        self.pos = i;
                        let block = &self.text[start..i];
                        self.skip_trivia()?;
                        return Ok(block);
                    }
                }
                b'"' => i = quoted_end(bytes, i).ok_or(ParseError::UnterminatedString { offset: i })?,
                b'#' => i = line_end(bytes, i),
                b'/' if bytes.get(i + 1) == Some(&b'/') => i = line_end(bytes, i),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = block_comment_end(bytes, i).ok_or(ParseError::UnterminatedComment { offset: i })?;
                }
                _ => i += 1,
            }
        }

        Err(ParseError::UnterminatedBlock { offset: start })
    }

    /// Skips whitespace and comments until meaningful content or end of input.
    fn skip_trivia(&mut self) -> Result<()> {
        let bytes = self.text.as_bytes();
        loop {
            while bytes.get(self.pos).is_some_and(|b| WHITESPACE.contains(b)) {
                self.pos += 1;
            }
            let rest = &bytes[self.pos.min(bytes.len())..];
            if rest.starts_with(b"#") || rest.starts_with(b"//") {
                self.pos = line_end(bytes, self.pos);
            } else if rest.starts_with(b"/*") {
                self.pos = block_comment_end(bytes, self.pos)
                    .ok_or(ParseError::UnterminatedComment { offset: self.pos })?;
            } else {
                return Ok(());
            }
        }
    }

    /// Reads the token at the cursor without moving it. Trivia must already be skipped.
    fn scan_token(&self) -> Result<Token<'a>> {
        let start = self.pos;
        let Some(&byte) = self.text.as_bytes().get(start) else {
            return Ok(Token::eof(start));
        };

        let kind = match byte {
            b'"' => return self.scan_quoted(start),
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'=' => TokenKind::Equals,
            _ => return Ok(self.scan_identifier(start)),
        };

        Ok(Token {
            kind,
            text: &self.text[start..=start],
            offset: start,
            end: start + 1,
        })
    }

    fn scan_quoted(&self, start: usize) -> Result<Token<'a>> {
        let end = quoted_end(self.text.as_bytes(), start).ok_or(ParseError::UnterminatedString { offset: start })?;
        Ok(Token {
            kind: TokenKind::Str,
            text: &self.text[start + 1..end - 1],
            offset: start,
            end,
        })
    }

    fn scan_identifier(&self, start: usize) -> Token<'a> {
        let bytes = self.text.as_bytes();
        let end = bytes[start..]
            .iter()
            .position(|b| SYMBOLS.contains(b) || WHITESPACE.contains(b))
            .map_or(bytes.len(), |len| start + len);

        Token {
            kind: TokenKind::Ident,
            text: &self.text[start..end],
            offset: start,
            end,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pop() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.pos = self.text.len();
                Some(Err(e))
            }
        }
    }
}

/// Offset just past the closing quote of the string opened at `start`.
///
/// A quote immediately preceded by a backslash does not close the string.
fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    bytes[start..]
        .windows(2)
        .position(|pair| pair[1] == b'"' && pair[0] != b'\\')
        .map(|pos| start + pos + 2)
}

/// Offset just past the newline ending the line that contains `start`.
fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |pos| start + pos + 1)
}

/// Offset just past the `*/` closing the (possibly nested) comment at `start`.
fn block_comment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}
