//! Error taxonomy shared by the engine, the rule model and the driver.
//!
//! - `Lexical`: malformed or exhausted input. The driver captures these while
//!   applying rules and hands them to the parser as [`TokenEntry::Error`].
//! - `Setup`: calling-convention violations (e.g. `next_token` mid-scan).
//! - `Rule`: static defects of a rule table, raised before any scanning.
//! - `Internal`: broken engine invariants.
//!
//! [`TokenEntry::Error`]: crate::TokenEntry::Error

use crate::LexemePosition;

pub type Result<T> = std::result::Result<T, LexerError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("lexical error: {message}{}", located(.position))]
    Lexical { message: String, position: Option<LexemePosition> },

    #[error("lexer setup error: {message}")]
    Setup { message: String },

    #[error("lexer rule error: {message}")]
    Rule { message: String },

    #[error("internal lexer error: {message}{}", located(.position))]
    Internal { message: String, position: Option<LexemePosition> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Setup,
    Rule,
    Internal,
}

impl LexerError {
    pub fn lexical(message: impl Into<String>, position: Option<LexemePosition>) -> Self {
        LexerError::Lexical { message: message.into(), position }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        LexerError::Setup { message: message.into() }
    }

    pub fn rule(message: impl Into<String>) -> Self {
        LexerError::Rule { message: message.into() }
    }

    pub fn internal(message: impl Into<String>, position: Option<LexemePosition>) -> Self {
        LexerError::Internal { message: message.into(), position }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LexerError::Lexical { .. } => ErrorKind::Lexical,
            LexerError::Setup { .. } => ErrorKind::Setup,
            LexerError::Rule { .. } => ErrorKind::Rule,
            LexerError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Where in the source the error was detected, when known.
    pub fn position(&self) -> Option<LexemePosition> {
        match self {
            LexerError::Lexical { position, .. } | LexerError::Internal { position, .. } => *position,
            LexerError::Setup { .. } | LexerError::Rule { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LexerError::Lexical { message, .. }
            | LexerError::Setup { message }
            | LexerError::Rule { message }
            | LexerError::Internal { message, .. } => message,
        }
    }

    /// Errors the scan loop may turn into error entries instead of returning.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Lexical
    }
}

fn located(position: &Option<LexemePosition>) -> String {
    match position {
        Some(pos) => format!(" (line {}, column {})", pos.line(), pos.column()),
        None => String::new(),
    }
}
