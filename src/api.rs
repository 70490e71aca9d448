use crate::error::{LexerError, Result};
use crate::lexer::{Lexer, LexerOptions, LexerStats};
use crate::ruleset::Ruleset;
use crate::TokenEntry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result from [`tokenize`] and [`tokenize_with`].
#[derive(Debug, Clone)]
pub struct TokenizeResult {
    /// The tokenized input text.
    pub text: String,
    /// Every entry up to and including the end-of-stream entry.
    pub entries: Vec<TokenEntry>,
    /// Counters from the run.
    pub stats: LexerStats,
    /// Total elapsed time, lexer setup included.
    pub elapsed: Duration,
}

impl TokenizeResult {
    /// The lexical errors captured along the way.
    pub fn errors(&self) -> impl Iterator<Item = &LexerError> {
        self.entries.iter().filter_map(TokenEntry::error)
    }
}

/// Tokenize `text` with `ruleset` and default [`LexerOptions`].
///
/// # Example
/// ```
/// use rulelex::demo;
///
/// let out = rulelex::tokenize(demo::json_ruleset().unwrap().into(), "[1, 2]").unwrap();
/// assert_eq!(out.entries.len(), 6);
/// assert_eq!(out.errors().count(), 0);
/// ```
pub fn tokenize(ruleset: Arc<Ruleset>, text: &str) -> Result<TokenizeResult> {
    tokenize_with(ruleset, text, LexerOptions::default())
}

/// Tokenize `text` with `ruleset` and the provided `options`.
///
/// Lexical errors are part of the result; other errors stop the run.
pub fn tokenize_with(ruleset: Arc<Ruleset>, text: &str, options: LexerOptions) -> Result<TokenizeResult> {
    let started = Instant::now();
    let mut lexer = Lexer::new(ruleset, options)?;
    lexer.set_input(text)?;
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>()?;

    Ok(TokenizeResult { text: text.to_string(), entries, stats: lexer.stats().clone(), elapsed: started.elapsed() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{demo, ErrorKind, Value};

    #[test]
    fn tokenize_with_returns_entries_and_stats() {
        let ruleset = Arc::new(demo::json_ruleset().unwrap());
        let res = tokenize_with(ruleset, r#"{"a": [true, -1.5]}"#, demo::json_options().unwrap()).unwrap();

        assert_eq!(res.text, r#"{"a": [true, -1.5]}"#);
        assert!(res.elapsed >= res.stats.scan_time);
        assert_eq!(res.errors().count(), 0);
        assert_eq!(res.entries.len(), 10);
        assert_eq!(res.stats.tokens_emitted, 9);

        let number = res.entries.iter().find_map(|entry| entry.token().filter(|t| t.lexeme == "-1.5")).unwrap();
        assert_eq!(number.value, Value::Float(-1.5));
    }

    #[test]
    fn lexical_errors_are_results_setup_errors_are_not() {
        let res = tokenize(Arc::new(demo::json_ruleset().unwrap()), "[1 ? 2]").unwrap();
        assert_eq!(res.errors().count(), 1);
        assert!(res.entries.last().unwrap().is_eos());

        let options = LexerOptions::default().with_main_rule("nope");
        let err = tokenize_with(Arc::new(demo::json_ruleset().unwrap()), "1", options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }
}
