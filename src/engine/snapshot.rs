use super::scanner::LexemeAnchor;
use super::state::{LineState, RecognitionState};

/// Everything needed to resume scanning as if no progress had been made since
/// the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub(crate) scan_position: usize,
    pub(crate) lineno: usize,
    pub(crate) line_offset: usize,
    pub(crate) lexeme: String,
    pub(crate) anchor: LexemeAnchor,
    pub(crate) line_state: LineState,
    pub(crate) recognition_state: RecognitionState,
}

impl EngineSnapshot {
    /// Byte index of the scan position.
    pub fn scan_position(&self) -> usize {
        self.scan_position
    }

    pub fn line(&self) -> usize {
        self.lineno
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn line_state(&self) -> LineState {
        self.line_state
    }

    pub fn recognition_state(&self) -> RecognitionState {
        self.recognition_state
    }
}
