//! The lexer driver.
//!
//! [`Lexer::next_token`] fills the token queue when it is empty and hands out
//! its oldest entry. Filling goes one step at a time:
//!
//! 1. Let the engine deal with layout (pending line end, indentation, noise,
//!    end of stream). Indentation and line ends become tokens when the
//!    matching [`LexerFlags`] are set; end of stream becomes the end marker.
//! 2. Otherwise apply the rule of the current mode.
//! 3. Settle the recognition state: a lexical error raised by the rule is
//!    queued as an error entry, an abandoned token is dropped, and a rule that
//!    neither consumed nor produced anything costs it one character.
//!
//! Exactly one end-of-stream entry is produced per input; after it,
//! `next_token` refuses to run until new input is given.

#[path = "lexer/options.rs"]
mod options;
#[path = "lexer/stats.rs"]
mod stats;

#[cfg(test)]
#[path = "lexer/tests.rs"]
mod tests;

pub use options::{DEFAULT_MODE, LexerFlags, LexerOptions};
pub use stats::LexerStats;

use crate::action::{ActionResult, Host};
use crate::engine::{Engine, EngineConfig, LineState, RecognitionState, ScanOutcome};
use crate::error::{LexerError, Result};
use crate::queue::TokenQueue;
use crate::ruleset::Ruleset;
use crate::{Pattern, Token, TokenEntry, TokenType, Value};
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A rule-callable operation registered with [`Lexer::register_message`].
pub type MessageHandler = Arc<dyn Fn(&mut Lexer, &[Value]) -> ActionResult + Send + Sync>;

pub struct Lexer {
    engine: Engine,
    queue: TokenQueue,
    ruleset: Arc<Ruleset>,
    options: LexerOptions,
    modes: Vec<String>,
    messages: HashMap<String, MessageHandler>,
    stats: LexerStats,
    finished: bool,
}

impl Lexer {
    /// Validates `ruleset` and checks that every mode has its rule.
    pub fn new(ruleset: Arc<Ruleset>, options: LexerOptions) -> Result<Self> {
        ruleset.validate()?;
        if ruleset.rule(&options.main_rule).is_none() {
            return Err(LexerError::setup(format!("No main rule named '{}'", options.main_rule)));
        }
        for (mode, rule) in &options.mode_rules {
            if ruleset.rule(rule).is_none() {
                return Err(LexerError::setup(format!("Mode '{mode}' refers to unknown rule '{rule}'")));
            }
        }

        let mut config = options.engine.clone();
        if !options.flags.contains(LexerFlags::SIGNIFICANT_INDENTATION) {
            config.indentation = None;
        } else if config.indentation.is_none() {
            config.indentation = EngineConfig::default().indentation;
        }
        let queue = TokenQueue::with_transforms(options.transforms.iter().cloned())?;
        debug!("lexer ready: {} rules, flags {:?}", ruleset.len(), options.flags);

        Ok(Lexer {
            engine: Engine::new(config),
            queue,
            ruleset,
            options,
            modes: vec![DEFAULT_MODE.to_string()],
            messages: HashMap::new(),
            stats: LexerStats::default(),
            finished: false,
        })
    }

    /// Starts over on `input`: pending entries, modes and stats are discarded.
    pub fn set_input(&mut self, input: impl Into<String>) -> Result<()> {
        self.engine.set_input(input)?;
        self.queue.clear();
        self.modes.truncate(1);
        self.stats = LexerStats::default();
        self.finished = false;
        Ok(())
    }

    /// Makes `name` available to [`Action::SendMessage`](crate::Action::SendMessage).
    /// Registered handlers take precedence over the built-in messages.
    pub fn register_message<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Lexer, &[Value]) -> ActionResult + Send + Sync + 'static,
    {
        self.messages.insert(name.into(), Arc::new(handler));
    }

    /// The next entry for the parser.
    pub fn next_token(&mut self) -> Result<TokenEntry> {
        let state = self.engine.recognition_state();
        if state == RecognitionState::WaitingForInput {
            return Err(LexerError::lexical("No input text was provided", None));
        }
        if self.queue.is_empty() {
            if !matches!(state, RecognitionState::Ready | RecognitionState::Recognized) {
                return Err(LexerError::setup(format!("next_token may not be called in state {state}")));
            }
            let started = Instant::now();
            let filled = self.fill_queue();
            self.stats.scan_time += started.elapsed();
            filled?;
        }
        self.queue.dequeue()
    }

    fn fill_queue(&mut self) -> Result<()> {
        while self.queue.is_empty() {
            match self.engine.scan_layout()? {
                Some(ScanOutcome::Indentation) => {
                    let token_type = self.options.indent_token.clone();
                    if self.enqueue_token(&token_type)?.is_some() {
                        self.stats.indent_tokens += 1;
                    }
                }
                Some(ScanOutcome::Eol) => {
                    if self.options.flags.contains(LexerFlags::EOL_AS_TOKEN) {
                        let token = Token::text(self.engine.lexeme(), self.engine.lexeme_position());
                        let entry = TokenEntry::Token(self.options.eol_token.clone(), token);
                        let queued = self.queue.push_ahead(entry)?.is_some();
                        self.stats.record_queued(queued);
                        if queued {
                            self.stats.eol_tokens += 1;
                        }
                    }
                }
                Some(ScanOutcome::Eos) => self.enqueue_eos_marker()?,
                Some(ScanOutcome::Token) | None => self.apply_mode_rule()?,
            }
        }
        Ok(())
    }

    fn apply_mode_rule(&mut self) -> Result<()> {
        let name = self.mode_rule_name()?.to_string();
        let ruleset = Arc::clone(&self.ruleset);
        let Some(rule) = ruleset.rule(&name) else {
            return Err(LexerError::setup(format!("No rule named '{name}'")));
        };

        let start = self.engine.scan_position();
        let line_state = self.engine.line_state();
        self.stats.rules_applied += 1;
        debug!("apply rule '{name}' at {}", self.engine.current_position());

        let mut captured = false;
        if let Err(err) = rule.apply_to(self) {
            if !err.is_recoverable() {
                return Err(err);
            }
            self.capture(err)?;
            captured = true;
        }

        match self.engine.recognition_state() {
            RecognitionState::Tokenizing | RecognitionState::Failed => self.engine.reset_recognition()?,
            RecognitionState::Done => self.enqueue_eos_marker()?,
            RecognitionState::Aborted => {
                if !captured {
                    let position = self.engine.lexeme_position();
                    self.capture(LexerError::lexical("Premature end of stream", Some(position)))?;
                }
                self.enqueue_eos_marker()?;
            }
            RecognitionState::Ready | RecognitionState::Recognized => {
                // Progress means consumed input or a newly detected line end;
                // queued entries alone do not count.
                let eol_detected = line_state != LineState::AtLineEnd && self.engine.line_state() == LineState::AtLineEnd;
                let stalled = self.engine.scan_position() == start && !eol_detected;
                if stalled {
                    if !captured {
                        let position = self.engine.current_position();
                        self.capture(LexerError::lexical(
                            format!("Rule '{name}' consumed no input"),
                            Some(position),
                        ))?;
                    }
                    self.skip_char()?;
                }
            }
            RecognitionState::WaitingForInput => {
                return Err(LexerError::internal("Lexer lost its input while applying a rule", None));
            }
        }
        Ok(())
    }

    fn skip_char(&mut self) -> Result<()> {
        if let Some(ch) = self.engine.next_char()? {
            debug!("skipped {ch:?} to make progress");
        }
        self.engine.reset_recognition()
    }

    fn capture(&mut self, err: LexerError) -> Result<()> {
        warn!("{err}");
        self.stats.errors_captured += 1;
        self.queue.enqueue(TokenEntry::Error(err))?;
        Ok(())
    }

    fn enqueue_eos_marker(&mut self) -> Result<()> {
        let position = self.engine.current_position();
        debug!("end of stream at {position}");
        self.queue.enqueue(TokenEntry::Eos(Token::eos(position)))?;
        Ok(())
    }

    // --- Modes --------------------------------------------------------------

    pub fn mode(&self) -> &str {
        self.modes.last().map_or(DEFAULT_MODE, String::as_str)
    }

    /// Rule applied by the driver in the current mode.
    pub fn mode_rule_name(&self) -> Result<&str> {
        let mode = self.mode();
        self.options.rule_for_mode(mode).ok_or_else(|| LexerError::setup(format!("Unknown lexer mode '{mode}'")))
    }

    /// Replaces the current mode.
    pub fn set_mode(&mut self, mode: &str) -> Result<()> {
        self.check_mode(mode)?;
        debug!("mode {} -> {mode}", self.mode());
        match self.modes.last_mut() {
            Some(top) => *top = mode.to_string(),
            None => self.modes.push(mode.to_string()),
        }
        Ok(())
    }

    pub fn push_mode(&mut self, mode: &str) -> Result<()> {
        self.check_mode(mode)?;
        debug!("push mode {mode}");
        self.modes.push(mode.to_string());
        Ok(())
    }

    pub fn pop_mode(&mut self) -> Result<()> {
        if self.modes.len() < 2 {
            return Err(LexerError::setup("pop_mode: no mode was pushed"));
        }
        self.modes.pop();
        debug!("back to mode {}", self.mode());
        Ok(())
    }

    fn check_mode(&self, mode: &str) -> Result<()> {
        match self.options.rule_for_mode(mode) {
            Some(_) => Ok(()),
            None => Err(LexerError::setup(format!("Unknown lexer mode '{mode}'"))),
        }
    }

    // --- Accessors ----------------------------------------------------------

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    pub fn queue(&self) -> &TokenQueue {
        &self.queue
    }

    pub fn stats(&self) -> &LexerStats {
        &self.stats
    }

    pub fn complete_state(&self) -> (LineState, RecognitionState) {
        self.engine.complete_state()
    }
}

fn mode_argument<'a>(message: &str, args: &'a [Value]) -> Result<&'a str> {
    args.first()
        .and_then(Value::as_text)
        .ok_or_else(|| LexerError::setup(format!("Message '{message}' needs a mode name argument")))
}

impl Host for Lexer {
    fn next_char(&mut self) -> Result<Option<char>> {
        self.engine.next_char()
    }

    fn scan(&mut self, pattern: &Pattern) -> Result<Option<ScanOutcome>> {
        self.engine.scan(pattern)
    }

    fn lexeme(&self) -> &str {
        self.engine.lexeme()
    }

    fn clear_lexeme(&mut self) {
        self.engine.clear_lexeme();
    }

    fn undo_scan(&mut self) -> Result<()> {
        self.engine.undo_scan()
    }

    fn enqueue_token(&mut self, token_type: &TokenType) -> ActionResult {
        if self.engine.recognition_state().is_terminal() {
            debug!("no {token_type} token after the end of scanning");
            return Ok(None);
        }
        self.engine.mark_recognized()?;
        let token = self.engine.take_token();
        debug!("enqueue {token_type} {:?} at {}", token.lexeme, token.position);
        let queued = self.queue.enqueue(TokenEntry::Token(token_type.clone(), token))?;
        self.stats.record_queued(queued.is_some());
        Ok(queued)
    }

    fn ruleset(&self) -> Arc<Ruleset> {
        Arc::clone(&self.ruleset)
    }

    fn queue_mut(&mut self) -> &mut TokenQueue {
        &mut self.queue
    }

    fn unknown_token(&mut self) -> ActionResult {
        match self.engine.recognition_state() {
            RecognitionState::Done => return Ok(None),
            RecognitionState::Aborted => {
                let message = format!("Premature end of stream after '{}'", self.engine.lexeme());
                return Err(LexerError::lexical(message, Some(self.engine.lexeme_position())));
            }
            _ => {}
        }
        if self.engine.lexeme().is_empty() && self.engine.next_char()?.is_none() {
            return Ok(None);
        }
        let position = self.engine.lexeme_position();
        let message = format!("Unknown token '{}'", self.engine.lexeme());
        self.engine.mark_failed()?;
        Err(LexerError::lexical(message, Some(position)))
    }

    fn send_message(&mut self, message: &str, args: &[Value]) -> ActionResult {
        if let Some(handler) = self.messages.get(message).cloned() {
            debug!("message '{message}' -> registered handler");
            return handler(self, args);
        }
        match message {
            "unknown_token" => return self.unknown_token(),
            "next_char" => {
                self.engine.next_char()?;
            }
            "clear" => self.engine.clear_lexeme(),
            "undo_scan" => self.engine.undo_scan()?,
            "add_snapshot" => self.engine.add_snapshot(),
            "restore_snapshot" => self.engine.restore_snapshot()?,
            "pop_snapshot" => {
                self.engine.pop_snapshot();
            }
            "set_mode" => self.set_mode(mode_argument(message, args)?)?,
            "push_mode" => self.push_mode(mode_argument(message, args)?)?,
            "pop_mode" => self.pop_mode()?,
            _ => return Err(LexerError::setup(format!("No handler for message '{message}'"))),
        }
        Ok(None)
    }
}

impl Iterator for Lexer {
    type Item = Result<TokenEntry>;

    /// Yields entries up to and including the end-of-stream entry, or up to
    /// the first failure.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_token();
        if item.as_ref().map_or(true, TokenEntry::is_eos) {
            self.finished = true;
        }
        Some(item)
    }
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut messages: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        messages.sort_unstable();
        f.debug_struct("Lexer")
            .field("engine", &self.engine)
            .field("queue", &self.queue)
            .field("modes", &self.modes)
            .field("messages", &messages)
            .field("stats", &self.stats)
            .finish()
    }
}
