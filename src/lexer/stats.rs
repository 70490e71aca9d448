//! Counters collected while a lexer runs.
//!
//! They are reset by [`Lexer::set_input`](crate::Lexer::set_input) and are
//! meant for reports and regression hunting, not for driving behavior.

use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LexerStats {
    /// Times a main or mode rule was applied by the driver (sub-rules are not counted).
    pub rules_applied: usize,
    /// Tokens that reached the queue, layout tokens included.
    pub tokens_emitted: usize,
    /// Tokens a transform rule dropped.
    pub tokens_dropped: usize,
    /// Lexical errors turned into error entries.
    pub errors_captured: usize,
    pub eol_tokens: usize,
    pub indent_tokens: usize,
    /// Time spent filling the queue.
    pub scan_time: Duration,
}

impl LexerStats {
    pub fn record_queued(&mut self, queued: bool) {
        if queued {
            self.tokens_emitted += 1;
        } else {
            self.tokens_dropped += 1;
        }
    }
}
