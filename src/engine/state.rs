//! The two state machines of the engine as plain transition tables.
//!
//! Both `on` functions are pure: they return the next state and the entry
//! action to run, or `None` when the event is not allowed in that state. The
//! engine owns the side effects.

use std::fmt;

/// Where the scan position sits relative to the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineState {
    AtLineStart,
    AfterIndentation,
    InLineBody,
    /// A line separator is pending at the scan position.
    AtLineEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEvent {
    IndentationScanned,
    EolChecked,
    ExpectedCharChecked,
    AfterEol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEntry {
    /// Consume the pending separator, clear the lexeme, bump the line counter
    /// and record where the new line starts.
    BeginLine,
}

impl LineState {
    pub fn on(self, event: LineEvent) -> Option<(LineState, Option<LineEntry>)> {
        use LineEvent::*;
        use LineState::*;

        match (self, event) {
            (AtLineStart, IndentationScanned) => Some((AfterIndentation, None)),
            (_, EolChecked) => Some((AtLineEnd, None)),
            (AtLineStart | AfterIndentation | InLineBody, ExpectedCharChecked) => Some((InLineBody, None)),
            (AtLineEnd, AfterEol) => Some((AtLineStart, Some(LineEntry::BeginLine))),
            _ => None,
        }
    }
}

/// How far the recognition of the current token has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionState {
    WaitingForInput,
    Ready,
    Tokenizing,
    Recognized,
    Done,
    Failed,
    /// End of stream reached in the middle of a token.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionEvent {
    InputGiven,
    EosDetected,
    ExpectedCharChecked,
    UnexpectedCharChecked,
    TokenRecognized,
    TokenEnqueued,
    /// Drop whatever was in progress and get back to `Ready`.
    RecognitionReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionEntry {
    /// Fresh input: position, line counters, lexeme and snapshots start over.
    Reset,
    ClearLexeme,
}

impl RecognitionState {
    pub fn on(self, event: RecognitionEvent) -> Option<(RecognitionState, Option<RecognitionEntry>)> {
        use RecognitionEvent::*;
        use RecognitionState::*;

        let next = match (self, event) {
            (Tokenizing, InputGiven) => return None,
            (_, InputGiven) => return Some((Ready, Some(RecognitionEntry::Reset))),
            (Ready, EosDetected) => Done,
            (Tokenizing, EosDetected) => Aborted,
            (Ready | Tokenizing, ExpectedCharChecked) => Tokenizing,
            (Tokenizing | Recognized, UnexpectedCharChecked) => Failed,
            (Ready | Tokenizing, TokenRecognized) => Recognized,
            (Recognized, TokenEnqueued) => Ready,
            (Tokenizing | Recognized | Failed, RecognitionReset) => Ready,
            _ => return None,
        };
        let entry = (next == Ready).then_some(RecognitionEntry::ClearLexeme);
        Some((next, entry))
    }

    /// No scanning is possible from these states without fresh input.
    pub fn is_terminal(self) -> bool {
        matches!(self, RecognitionState::Done | RecognitionState::Failed | RecognitionState::Aborted)
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for RecognitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_cycle() {
        use LineEvent::*;
        use LineState::*;

        let cases = [
            (AtLineStart, IndentationScanned, Some(AfterIndentation)),
            (AtLineStart, ExpectedCharChecked, Some(InLineBody)),
            (AfterIndentation, ExpectedCharChecked, Some(InLineBody)),
            (InLineBody, ExpectedCharChecked, Some(InLineBody)),
            (InLineBody, EolChecked, Some(AtLineEnd)),
            (AtLineEnd, EolChecked, Some(AtLineEnd)),
            (AtLineEnd, AfterEol, Some(AtLineStart)),
            (AtLineEnd, ExpectedCharChecked, None),
            (InLineBody, IndentationScanned, None),
            (AtLineStart, AfterEol, None),
        ];
        for (from, event, expected) in cases {
            assert_eq!(from.on(event).map(|(to, _)| to), expected, "{from:?} --{event:?}-->");
        }
        assert_eq!(LineState::AtLineEnd.on(AfterEol), Some((AtLineStart, Some(LineEntry::BeginLine))));
    }

    #[test]
    fn recognition_cycle() {
        use RecognitionEvent::*;
        use RecognitionState::*;

        let cases = [
            (WaitingForInput, InputGiven, Some(Ready)),
            (Done, InputGiven, Some(Ready)),
            (Tokenizing, InputGiven, None),
            (Ready, ExpectedCharChecked, Some(Tokenizing)),
            (Tokenizing, ExpectedCharChecked, Some(Tokenizing)),
            (Tokenizing, TokenRecognized, Some(Recognized)),
            (Ready, TokenRecognized, Some(Recognized)),
            (Recognized, TokenEnqueued, Some(Ready)),
            (Ready, EosDetected, Some(Done)),
            (Tokenizing, EosDetected, Some(Aborted)),
            (Tokenizing, UnexpectedCharChecked, Some(Failed)),
            (Ready, UnexpectedCharChecked, None),
            (Failed, RecognitionReset, Some(Ready)),
            (Done, ExpectedCharChecked, None),
            (WaitingForInput, EosDetected, None),
        ];
        for (from, event, expected) in cases {
            assert_eq!(from.on(event).map(|(to, _)| to), expected, "{from:?} --{event:?}-->");
        }
    }

    #[test]
    fn entering_ready_clears_the_lexeme() {
        use RecognitionEvent::*;
        use RecognitionState::*;

        assert_eq!(Recognized.on(TokenEnqueued), Some((Ready, Some(RecognitionEntry::ClearLexeme))));
        assert_eq!(Done.on(InputGiven), Some((Ready, Some(RecognitionEntry::Reset))));
        assert_eq!(Ready.on(ExpectedCharChecked), Some((Tokenizing, None)));
        assert!(Done.is_terminal() && Failed.is_terminal() && Aborted.is_terminal());
        assert!(!Ready.is_terminal());
    }
}
