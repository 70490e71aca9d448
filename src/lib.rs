//! Rule-table driven lexer engine.
//!
//! A lexer is described as data: a [`Ruleset`] of named [`Rule`]s, each mapping
//! input patterns to a tree of [`Action`]s. The [`Lexer`] driver runs that table
//! over an input text with an [`Engine`] that tracks two orthogonal state
//! machines (position in the line, progress of the current token) and hands the
//! parser one [`TokenEntry`] at a time, ending with a single end-of-stream entry.
//!
//! ```
//! use rulelex::{Action, Lexer, LexerOptions, Pattern, Rule, Ruleset, TokenEntry, token_types};
//! use std::sync::Arc;
//!
//! let mut rules = Ruleset::new();
//! rules.set_token_types(token_types!["INT" => "integer", '+' => "plus"]).unwrap();
//! rules
//!     .add_rule(
//!         Rule::lookahead("main")
//!             .on(Pattern::regex(r"\d+").unwrap(), Action::enqueue("INT"))
//!             .on(Pattern::char('+'), Action::enqueue('+')),
//!     )
//!     .unwrap();
//!
//! let mut lexer = Lexer::new(Arc::new(rules), LexerOptions::default()).unwrap();
//! lexer.set_input("1 + 22").unwrap();
//! let types: Vec<String> = lexer
//!     .map(|entry| match entry.unwrap() {
//!         TokenEntry::Token(ty, _) => ty.to_string(),
//!         other => format!("{other:?}").chars().take(3).collect(),
//!     })
//!     .collect();
//! assert_eq!(types, ["INT", "'+'", "INT", "Eos"]);
//! ```

#[macro_use]
mod macros;
mod action;
mod api;
pub mod demo;
mod engine;
mod error;
mod lexer;
mod noise;
mod pattern;
mod queue;
mod rule;
mod ruleset;

pub use action::{Action, ActionResult, Host};
pub use api::{TokenizeResult, tokenize, tokenize_with};
pub use engine::{
    Engine, EngineConfig, EngineSnapshot, LineEntry, LineEvent, LineState, RecognitionEntry, RecognitionEvent,
    RecognitionState, ScanOutcome,
};
pub use error::{ErrorKind, LexerError, Result};
pub use lexer::{DEFAULT_MODE, Lexer, LexerFlags, LexerOptions, LexerStats, MessageHandler};
pub use noise::NoiseRule;
pub use pattern::Pattern;
pub use queue::{TokenQueue, TransformFn, TransformRule};
pub use rule::{Handler, Rule, RuleKind};
pub use ruleset::Ruleset;

use std::fmt;

/// Lexeme (and value) of the end-of-stream token.
pub const EOS_LEXEME: &str = "$";

// --- Position ---------------------------------------------------------------

/// Where a lexeme starts in the source.
///
/// `offset` counts characters from the start of the input, `line` is 1-based and
/// `column` counts characters from the start of that line. Only [`new`](Self::new)
/// builds one from outside the crate, so every position satisfies its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LexemePosition {
    offset: usize,
    line: usize,
    column: usize,
}

impl LexemePosition {
    /// Fails unless `line >= 1` and `column <= offset - line + 1`: every line
    /// before `line` ends with at least one separator character.
    pub fn new(offset: usize, line: usize, column: usize) -> Result<Self> {
        let fits = line >= 1 && (offset + 1).checked_sub(line).is_some_and(|limit| column <= limit);
        if !fits {
            return Err(LexerError::internal(
                format!("Inconsistent lexeme position: offset {offset}, line {line}, column {column}"),
                None,
            ));
        }
        Ok(LexemePosition { offset, line, column })
    }

    pub fn origin() -> Self {
        LexemePosition { offset: 0, line: 1, column: 0 }
    }

    /// Unchecked constructor for positions the engine derives from its input.
    pub(crate) fn located(offset: usize, line: usize, column: usize) -> Self {
        debug_assert!(line >= 1 && column + line <= offset + 1, "offset {offset}, line {line}, column {column}");
        LexemePosition { offset, line, column }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for LexemePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// --- Token values -----------------------------------------------------------

/// Normalized token value, also used for message arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: Value,
    /// Verbatim source text.
    pub lexeme: String,
    pub position: LexemePosition,
}

impl Token {
    pub fn new(value: impl Into<Value>, lexeme: impl Into<String>, position: LexemePosition) -> Self {
        Token { value: value.into(), lexeme: lexeme.into(), position }
    }

    /// A token whose value is its own lexeme.
    pub fn text(lexeme: impl Into<String>, position: LexemePosition) -> Self {
        let lexeme = lexeme.into();
        Token { value: Value::Text(lexeme.clone()), lexeme, position }
    }

    pub fn eos(position: LexemePosition) -> Self {
        Token::text(EOS_LEXEME, position)
    }
}

/// A token compares equal to a string when its value is that text.
impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.value.as_text() == Some(*other)
    }
}

// --- Token types and queue entries ------------------------------------------

/// Terminal symbol handed to the parser: a bare character (`'+'`) or a
/// symbolic name (`NUMBER`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
    Char(char),
    Symbol(String),
}

impl TokenType {
    pub fn symbol(name: impl Into<String>) -> Self {
        TokenType::Symbol(name.into())
    }

    pub fn is_char(&self) -> bool {
        matches!(self, TokenType::Char(_))
    }
}

impl From<char> for TokenType {
    fn from(c: char) -> Self {
        TokenType::Char(c)
    }
}

impl From<&str> for TokenType {
    fn from(name: &str) -> Self {
        TokenType::Symbol(name.to_string())
    }
}

impl From<String> for TokenType {
    fn from(name: String) -> Self {
        TokenType::Symbol(name)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Char(c) => write!(f, "{c:?}"),
            TokenType::Symbol(name) => f.write_str(name),
        }
    }
}

/// What the lexer hands to the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenEntry {
    Token(TokenType, Token),
    /// The single end-of-stream entry; its token is `"$"` at the end position.
    Eos(Token),
    /// A lexical error captured by the scan loop.
    Error(LexerError),
}

impl TokenEntry {
    pub fn new(token_type: impl Into<TokenType>, token: Token) -> Self {
        TokenEntry::Token(token_type.into(), token)
    }

    pub fn token_type(&self) -> Option<&TokenType> {
        match self {
            TokenEntry::Token(ty, _) => Some(ty),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            TokenEntry::Token(_, token) | TokenEntry::Eos(token) => Some(token),
            TokenEntry::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&LexerError> {
        match self {
            TokenEntry::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_eos(&self) -> bool {
        matches!(self, TokenEntry::Eos(_))
    }
}
