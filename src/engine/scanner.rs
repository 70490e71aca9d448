use super::config::EngineConfig;
use super::snapshot::EngineSnapshot;
use super::state::{LineEntry, LineEvent, LineState, RecognitionEntry, RecognitionEvent, RecognitionState};
use crate::error::{LexerError, Result};
use crate::{LexemePosition, Pattern, Token};
use log::{debug, trace};
use std::mem;

/// What a call to [`Engine::scan`] found at the scan position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanOutcome {
    Indentation,
    Eos,
    Eol,
    Token,
}

/// Where the current lexeme started: scan position, line counters and line
/// state at the moment its first character was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LexemeAnchor {
    pos: usize,
    lineno: usize,
    line_offset: usize,
    line_state: LineState,
}

impl LexemeAnchor {
    fn origin() -> Self {
        LexemeAnchor { pos: 0, lineno: 1, line_offset: 0, line_state: LineState::AtLineStart }
    }
}

/// Owns the input text, the lexeme buffer, both state machines and the
/// snapshot stack.
///
/// Positions are byte indexes into the input; [`LexemePosition`]s handed out
/// count characters.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    input: String,
    pos: usize,
    lineno: usize,
    /// Byte index where the current line starts.
    line_offset: usize,
    lexeme: String,
    anchor: LexemeAnchor,
    line_state: LineState,
    recognition_state: RecognitionState,
    snapshots: Vec<EngineSnapshot>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            input: String::new(),
            pos: 0,
            lineno: 1,
            line_offset: 0,
            lexeme: String::new(),
            anchor: LexemeAnchor::origin(),
            line_state: LineState::AtLineStart,
            recognition_state: RecognitionState::WaitingForInput,
            snapshots: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the input and starts over at line 1, offset 0.
    pub fn set_input(&mut self, input: impl Into<String>) -> Result<()> {
        if self.recognition_state == RecognitionState::Tokenizing {
            return Err(LexerError::setup("Cannot replace the input while a token is being recognized"));
        }
        self.input = input.into();
        self.fire_recognition(RecognitionEvent::InputGiven)
    }

    // --- Scanning -----------------------------------------------------------

    /// Scans `pattern` at the current position after dealing with pending line
    /// ends, indentation, noise and end of stream.
    ///
    /// `Ok(None)` means the pattern did not match; position and lexeme are
    /// left untouched.
    pub fn scan(&mut self, pattern: &Pattern) -> Result<Option<ScanOutcome>> {
        if let Some(outcome) = self.scan_layout()? {
            trace!("scan {pattern}: {outcome:?}");
            return Ok(Some(outcome));
        }

        let Some(len) = pattern.match_len_at(&self.input, self.pos) else {
            trace!("scan {pattern}: no match at byte {}", self.pos);
            return Ok(None);
        };
        let start = self.pos;
        let anchor = self.anchor_here();
        self.pos += len;
        let matched = self.input[start..self.pos].to_string();
        self.push_lexeme(anchor, &matched);
        if pattern.spans_lines() || matched.contains(['\n', '\r']) {
            self.track_line_breaks(start, &matched);
        }

        self.fire_line(LineEvent::ExpectedCharChecked)?;
        self.fire_recognition(RecognitionEvent::ExpectedCharChecked)?;
        self.fire_recognition(RecognitionEvent::TokenRecognized)?;
        trace!("scan {pattern}: token {matched:?}");
        Ok(Some(ScanOutcome::Token))
    }

    /// Everything `scan` does before trying its pattern. `Ok(None)` means the
    /// scan position is at the body of a line, ready for a pattern or a rule.
    pub(crate) fn scan_layout(&mut self) -> Result<Option<ScanOutcome>> {
        self.ensure_scannable()?;
        if self.recognition_state == RecognitionState::Recognized {
            self.fire_recognition(RecognitionEvent::TokenEnqueued)?;
        }
        if self.line_state == LineState::AtLineEnd && self.recognition_state == RecognitionState::Ready {
            self.fire_line(LineEvent::AfterEol)?;
        }

        if self.line_state == LineState::AtLineStart {
            let indentation = self.config.indentation.as_ref().and_then(|p| p.match_len_at(&self.input, self.pos));
            if let Some(len) = indentation.filter(|len| *len > 0) {
                let anchor = self.anchor_here();
                let start = self.pos;
                self.pos += len;
                let text = self.input[start..self.pos].to_string();
                self.push_lexeme(anchor, &text);
                self.fire_line(LineEvent::IndentationScanned)?;
                self.fire_recognition(RecognitionEvent::TokenRecognized)?;
                return Ok(Some(ScanOutcome::Indentation));
            }
        }

        self.skip_noise();

        if self.is_eos() {
            self.fire_recognition(RecognitionEvent::EosDetected)?;
            return Ok(Some(ScanOutcome::Eos));
        }

        if let Some(len) = self.eol_len_at(self.pos) {
            self.fire_line(LineEvent::EolChecked)?;
            if self.recognition_state == RecognitionState::Ready {
                let anchor = self.anchor_here();
                let separator = self.input[self.pos..self.pos + len].to_string();
                self.lexeme.clear();
                self.push_lexeme(anchor, &separator);
            }
            return Ok(Some(ScanOutcome::Eol));
        }

        Ok(None)
    }

    /// Consumes one character into the lexeme. A line separator is consumed
    /// as a unit (its first character is returned). At end of stream fires
    /// `EosDetected` and returns `None`.
    pub fn next_char(&mut self) -> Result<Option<char>> {
        self.ensure_scannable()?;
        if self.recognition_state == RecognitionState::Recognized {
            self.fire_recognition(RecognitionEvent::TokenEnqueued)?;
        }

        let Some(ch) = self.input.get(self.pos..).and_then(|rest| rest.chars().next()) else {
            self.fire_recognition(RecognitionEvent::EosDetected)?;
            return Ok(None);
        };

        let anchor = self.anchor_here();
        match self.eol_len_at(self.pos) {
            Some(len) => {
                let separator = self.input[self.pos..self.pos + len].to_string();
                // A pending separator already sits in an otherwise empty lexeme.
                let pending = self.line_state == LineState::AtLineEnd;
                let kept = mem::take(&mut self.lexeme);
                let kept = if pending && self.recognition_state == RecognitionState::Ready { String::new() } else { kept };
                if !pending {
                    self.fire_line(LineEvent::EolChecked)?;
                }
                self.fire_line(LineEvent::AfterEol)?;
                self.lexeme = kept;
                self.push_lexeme(anchor, &separator);
            }
            None => {
                self.pos += ch.len_utf8();
                let mut buf = [0u8; 4];
                self.push_lexeme(anchor, ch.encode_utf8(&mut buf));
            }
        }

        self.fire_line(LineEvent::ExpectedCharChecked)?;
        self.fire_recognition(RecognitionEvent::ExpectedCharChecked)?;
        Ok(Some(ch))
    }

    /// Puts the current lexeme back: position, line counters and line state
    /// return to where the lexeme started.
    pub fn undo_scan(&mut self) -> Result<()> {
        if self.lexeme.is_empty() {
            return Ok(());
        }
        let anchor = self.anchor;
        debug!("undo scan of {:?}, back to byte {}", self.lexeme, anchor.pos);
        self.pos = anchor.pos;
        self.lineno = anchor.lineno;
        self.line_offset = anchor.line_offset;
        self.line_state = anchor.line_state;
        self.lexeme.clear();
        self.reset_recognition()
    }

    fn skip_noise(&mut self) {
        let Some(len) = self.config.noise.match_len_at(&self.input, self.pos).filter(|len| *len > 0) else {
            return;
        };
        let start = self.pos;
        self.pos += len;
        let skipped = &self.input[start..self.pos];
        if skipped.contains(['\n', '\r']) {
            let skipped = skipped.to_string();
            self.track_line_breaks(start, &skipped);
        }
    }

    fn track_line_breaks(&mut self, start: usize, text: &str) {
        for end in self.config.eol.match_ends(text) {
            self.lineno += 1;
            self.line_offset = start + end;
        }
    }

    fn eol_len_at(&self, pos: usize) -> Option<usize> {
        self.config.eol.match_len_at(&self.input, pos).filter(|len| *len > 0)
    }

    fn ensure_scannable(&self) -> Result<()> {
        match self.recognition_state {
            RecognitionState::WaitingForInput => Err(LexerError::lexical("No input text was provided", None)),
            state if state.is_terminal() => Err(LexerError::lexical(
                format!("Cannot scan past the end of scanning (state {state})"),
                Some(self.current_position()),
            )),
            _ => Ok(()),
        }
    }

    // --- State machines -----------------------------------------------------

    fn fire_line(&mut self, event: LineEvent) -> Result<()> {
        let Some((next, entry)) = self.line_state.on(event) else {
            return Err(LexerError::internal(
                format!("Event {event:?} is not allowed in line state {}", self.line_state),
                Some(self.current_position()),
            ));
        };
        trace!("line: {} --{event:?}--> {next}", self.line_state);
        self.line_state = next;
        if let Some(LineEntry::BeginLine) = entry {
            self.begin_line();
        }
        Ok(())
    }

    pub(crate) fn fire_recognition(&mut self, event: RecognitionEvent) -> Result<()> {
        let Some((next, entry)) = self.recognition_state.on(event) else {
            return Err(LexerError::internal(
                format!("Event {event:?} is not allowed in recognition state {}", self.recognition_state),
                Some(self.current_position()),
            ));
        };
        trace!("recognition: {} --{event:?}--> {next}", self.recognition_state);
        self.recognition_state = next;
        match entry {
            Some(RecognitionEntry::Reset) => self.reset(),
            Some(RecognitionEntry::ClearLexeme) => self.clear_lexeme(),
            None => {}
        }
        Ok(())
    }

    fn begin_line(&mut self) {
        self.pos += self.eol_len_at(self.pos).unwrap_or(0);
        self.lineno += 1;
        self.line_offset = self.pos;
        self.clear_lexeme();
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.lineno = 1;
        self.line_offset = 0;
        self.lexeme.clear();
        self.anchor = LexemeAnchor::origin();
        self.line_state = LineState::AtLineStart;
        self.snapshots.clear();
    }

    /// `Ready|Tokenizing -> Recognized`; already recognized stays as is.
    pub(crate) fn mark_recognized(&mut self) -> Result<()> {
        match self.recognition_state {
            RecognitionState::Ready | RecognitionState::Tokenizing => {
                self.fire_recognition(RecognitionEvent::TokenRecognized)
            }
            _ => Ok(()),
        }
    }

    /// Marks the token in progress as failed, when there is one.
    pub(crate) fn mark_failed(&mut self) -> Result<()> {
        match self.recognition_state {
            RecognitionState::Tokenizing | RecognitionState::Recognized => {
                self.fire_recognition(RecognitionEvent::UnexpectedCharChecked)
            }
            _ => Ok(()),
        }
    }

    /// Drops a token in progress (or a failed one) and returns to `Ready`.
    pub(crate) fn reset_recognition(&mut self) -> Result<()> {
        match self.recognition_state {
            RecognitionState::Tokenizing | RecognitionState::Recognized | RecognitionState::Failed => {
                self.fire_recognition(RecognitionEvent::RecognitionReset)
            }
            _ => Ok(()),
        }
    }

    // --- Lexeme -------------------------------------------------------------

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn clear_lexeme(&mut self) {
        self.lexeme.clear();
    }

    fn anchor_here(&self) -> LexemeAnchor {
        LexemeAnchor { pos: self.pos, lineno: self.lineno, line_offset: self.line_offset, line_state: self.line_state }
    }

    fn push_lexeme(&mut self, anchor: LexemeAnchor, text: &str) {
        if self.lexeme.is_empty() {
            self.anchor = anchor;
        }
        self.lexeme.push_str(text);
    }

    /// Turns the lexeme into a token positioned where the lexeme started, and
    /// clears the lexeme.
    pub(crate) fn take_token(&mut self) -> Token {
        let position = self.lexeme_position();
        Token::text(mem::take(&mut self.lexeme), position)
    }

    // --- Snapshots ----------------------------------------------------------

    pub fn add_snapshot(&mut self) {
        let snapshot = EngineSnapshot {
            scan_position: self.pos,
            lineno: self.lineno,
            line_offset: self.line_offset,
            lexeme: self.lexeme.clone(),
            anchor: self.anchor,
            line_state: self.line_state,
            recognition_state: self.recognition_state,
        };
        debug!("snapshot #{} at byte {}", self.snapshots.len() + 1, self.pos);
        self.snapshots.push(snapshot);
    }

    /// Pops the most recent snapshot and puts the engine back in that state.
    pub fn restore_snapshot(&mut self) -> Result<()> {
        let Some(snapshot) = self.snapshots.pop() else {
            return Err(LexerError::internal("Cannot restore a snapshot: the stack is empty", Some(self.current_position())));
        };
        debug!("restore snapshot #{} at byte {}", self.snapshots.len() + 1, snapshot.scan_position);
        self.pos = snapshot.scan_position;
        self.lineno = snapshot.lineno;
        self.line_offset = snapshot.line_offset;
        self.lexeme = snapshot.lexeme;
        self.anchor = snapshot.anchor;
        self.line_state = snapshot.line_state;
        self.recognition_state = snapshot.recognition_state;
        Ok(())
    }

    /// Discards the most recent snapshot, keeping the current state.
    pub fn pop_snapshot(&mut self) -> Option<EngineSnapshot> {
        self.snapshots.pop()
    }

    pub fn snapshots(&self) -> &[EngineSnapshot] {
        &self.snapshots
    }

    // --- Accessors ----------------------------------------------------------

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte index of the scan position.
    pub fn scan_position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &str {
        self.input.get(self.pos..).unwrap_or("")
    }

    pub fn lineno(&self) -> usize {
        self.lineno
    }

    /// Byte index where the current line starts.
    pub fn line_offset(&self) -> usize {
        self.line_offset
    }

    pub fn line_state(&self) -> LineState {
        self.line_state
    }

    pub fn recognition_state(&self) -> RecognitionState {
        self.recognition_state
    }

    pub fn complete_state(&self) -> (LineState, RecognitionState) {
        (self.line_state, self.recognition_state)
    }

    pub fn is_eos(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn current_position(&self) -> LexemePosition {
        self.locate(self.pos, self.lineno, self.line_offset)
    }

    /// Position of the lexeme's first character, or the scan position when
    /// the lexeme is empty.
    pub fn lexeme_position(&self) -> LexemePosition {
        if self.lexeme.is_empty() {
            return self.current_position();
        }
        self.locate(self.anchor.pos, self.anchor.lineno, self.anchor.line_offset)
    }

    fn locate(&self, pos: usize, lineno: usize, line_offset: usize) -> LexemePosition {
        let count = |from: usize, to: usize| self.input.get(from..to).map_or(0, |s| s.chars().count());
        LexemePosition::located(count(0, pos), lineno, count(line_offset.min(pos), pos))
    }
}
