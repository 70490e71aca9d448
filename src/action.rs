//! Actions: the small interpreter rules are written in.
//!
//! An [`Action`] is a tree. Leaves consume input or emit tokens through a
//! [`Host`]; combinators sequence and branch. `children` exposes the tree to
//! the ruleset validator without running anything.

use crate::engine::ScanOutcome;
use crate::error::{LexerError, Result};
use crate::queue::TokenQueue;
use crate::ruleset::Ruleset;
use crate::{Pattern, TokenEntry, TokenType, Value};
use log::debug;
use std::sync::Arc;

/// Outcome of applying an action: the entry it produced, if any.
pub type ActionResult = Result<Option<TokenEntry>>;

/// The operations actions call back into. Implemented by [`Lexer`](crate::Lexer).
pub trait Host {
    fn next_char(&mut self) -> Result<Option<char>>;

    fn scan(&mut self, pattern: &Pattern) -> Result<Option<ScanOutcome>>;

    fn lexeme(&self) -> &str;

    fn clear_lexeme(&mut self);

    fn undo_scan(&mut self) -> Result<()>;

    /// Turns the current lexeme into a token of `token_type` and queues it.
    fn enqueue_token(&mut self, token_type: &TokenType) -> ActionResult;

    fn ruleset(&self) -> Arc<Ruleset>;

    fn queue_mut(&mut self) -> &mut TokenQueue;

    /// Reports the lexeme (or the next character) as unrecognizable.
    fn unknown_token(&mut self) -> ActionResult;

    /// Runs a named host operation.
    fn send_message(&mut self, message: &str, args: &[Value]) -> ActionResult;

    /// Scans `pattern` and tells whether it matched as a token.
    fn scan_token(&mut self, pattern: &Pattern) -> Result<bool> {
        Ok(self.scan(pattern)? == Some(ScanOutcome::Token))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Emit the current lexeme as a token of this type.
    EnqueueToken(TokenType),
    SendMessage { message: String, args: Vec<Value> },
    ApplySubrule(String),
    /// Send `message` with `state` as its argument, then apply `then`.
    ChangeState { message: String, state: String, then: Box<Action> },
    /// Branch on the lexeme consumed so far.
    ChoiceOnLexeme { pattern: Pattern, on_match: Box<Action>, otherwise: Option<Box<Action>> },
    /// Branch on a scan of the upcoming text; a match is consumed.
    ChoiceOnLookahead { pattern: Pattern, on_match: Box<Action>, otherwise: Option<Box<Action>> },
    /// Every pattern must scan in turn; the first failure is an unknown token.
    ConditionalSequence(Vec<(Pattern, Action)>),
    Sequence(Vec<Action>),
    UndoScan,
    Clear,
    /// Retype the most recently enqueued token when it has type `from`.
    MutateToken { from: TokenType, to: TokenType },
}

impl Action {
    pub fn enqueue(token_type: impl Into<TokenType>) -> Self {
        Action::EnqueueToken(token_type.into())
    }

    pub fn message(message: impl Into<String>, args: Vec<Value>) -> Self {
        Action::SendMessage { message: message.into(), args }
    }

    pub fn subrule(name: impl Into<String>) -> Self {
        Action::ApplySubrule(name.into())
    }

    pub fn change_state(message: impl Into<String>, state: impl Into<String>, then: Action) -> Self {
        Action::ChangeState { message: message.into(), state: state.into(), then: Box::new(then) }
    }

    pub fn choice(pattern: Pattern, on_match: Action, otherwise: Option<Action>) -> Self {
        Action::ChoiceOnLookahead { pattern, on_match: Box::new(on_match), otherwise: otherwise.map(Box::new) }
    }

    pub fn choice_lexeme(pattern: Pattern, on_match: Action, otherwise: Option<Action>) -> Self {
        Action::ChoiceOnLexeme { pattern, on_match: Box::new(on_match), otherwise: otherwise.map(Box::new) }
    }

    /// Fails on an empty list.
    pub fn pattern_seq(pairs: Vec<(Pattern, Action)>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(LexerError::rule("A pattern sequence needs at least one (pattern, action) pair"));
        }
        Ok(Action::ConditionalSequence(pairs))
    }

    /// Fails on an empty list.
    pub fn sequence(actions: Vec<Action>) -> Result<Self> {
        if actions.is_empty() {
            return Err(LexerError::rule("An action sequence needs at least one action"));
        }
        Ok(Action::Sequence(actions))
    }

    pub fn putback() -> Self {
        Action::UndoScan
    }

    pub fn clear() -> Self {
        Action::Clear
    }

    pub fn mutate(from: impl Into<TokenType>, to: impl Into<TokenType>) -> Self {
        Action::MutateToken { from: from.into(), to: to.into() }
    }

    /// The default action of a rule: report an unknown token.
    pub fn unknown_token() -> Self {
        Action::message("unknown_token", Vec::new())
    }

    pub fn apply_to<H: Host + ?Sized>(&self, host: &mut H) -> ActionResult {
        match self {
            Action::EnqueueToken(token_type) => host.enqueue_token(token_type),
            Action::SendMessage { message, args } => host.send_message(message, args),
            Action::ApplySubrule(name) => {
                let ruleset = host.ruleset();
                let Some(rule) = ruleset.rule(name) else {
                    return Err(LexerError::internal(format!("Unknown subrule '{name}'"), None));
                };
                rule.apply_to(host)
            }
            Action::ChangeState { message, state, then } => {
                host.send_message(message, &[Value::Text(state.clone())])?;
                then.apply_to(host)
            }
            Action::ChoiceOnLexeme { pattern, on_match, otherwise } => {
                let matched = pattern.matches_lexeme(host.lexeme());
                Self::branch(host, matched, on_match, otherwise.as_deref())
            }
            Action::ChoiceOnLookahead { pattern, on_match, otherwise } => {
                let matched = host.scan_token(pattern)?;
                Self::branch(host, matched, on_match, otherwise.as_deref())
            }
            Action::ConditionalSequence(pairs) => {
                let mut last = None;
                for (pattern, action) in pairs {
                    if !host.scan_token(pattern)? {
                        debug!("pattern sequence stopped: {pattern} did not match");
                        return host.unknown_token();
                    }
                    last = action.apply_to(host)?;
                }
                Ok(last)
            }
            Action::Sequence(actions) => {
                let mut last = None;
                for action in actions {
                    last = action.apply_to(host)?;
                }
                Ok(last)
            }
            Action::UndoScan => {
                host.undo_scan()?;
                Ok(None)
            }
            Action::Clear => {
                host.clear_lexeme();
                Ok(None)
            }
            Action::MutateToken { from, to } => {
                let Some(entry) = host.queue_mut().last_enqueued_mut() else {
                    return Ok(None);
                };
                if let TokenEntry::Token(token_type, _) = entry {
                    if token_type == from {
                        debug!("mutate token {from} -> {to}");
                        *token_type = to.clone();
                    }
                }
                Ok(Some(entry.clone()))
            }
        }
    }

    fn branch<H: Host + ?Sized>(
        host: &mut H,
        matched: bool,
        on_match: &Action,
        otherwise: Option<&Action>,
    ) -> ActionResult {
        match (matched, otherwise) {
            (true, _) => on_match.apply_to(host),
            (false, Some(action)) => action.apply_to(host),
            (false, None) => Ok(None),
        }
    }

    /// Direct sub-actions.
    pub fn children(&self) -> Vec<&Action> {
        match self {
            Action::ChangeState { then, .. } => vec![then.as_ref()],
            Action::ChoiceOnLexeme { on_match, otherwise, .. }
            | Action::ChoiceOnLookahead { on_match, otherwise, .. } => {
                std::iter::once(on_match.as_ref()).chain(otherwise.as_deref()).collect()
            }
            Action::ConditionalSequence(pairs) => pairs.iter().map(|(_, action)| action).collect(),
            Action::Sequence(actions) => actions.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// This action followed by all of its descendants, depth first.
    pub fn walk(&self) -> Vec<&Action> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.walk());
        }
        out
    }

    /// Collects into `out` the sub-rules this action may invoke while no input
    /// is known to be consumed, `guarded` telling whether some already was.
    /// Returns whether input is known to be consumed once the action is done.
    ///
    /// A lookahead match guards its branch unless the pattern can match the
    /// empty string. A putback, or a message rewinding the engine, lifts the
    /// guard again.
    pub(crate) fn collect_unguarded<'a>(&'a self, guarded: bool, out: &mut Vec<&'a str>) -> bool {
        match self {
            Action::ApplySubrule(name) => {
                if !guarded {
                    out.push(name.as_str());
                }
                guarded
            }
            Action::UndoScan => false,
            Action::SendMessage { message, .. } => {
                guarded && !matches!(message.as_str(), "undo_scan" | "restore_snapshot")
            }
            Action::ChangeState { then, .. } => then.collect_unguarded(guarded, out),
            Action::ChoiceOnLexeme { on_match, otherwise, .. } => {
                let matched = on_match.collect_unguarded(guarded, out);
                let other = otherwise.as_ref().map_or(guarded, |action| action.collect_unguarded(guarded, out));
                matched && other
            }
            Action::ChoiceOnLookahead { pattern, on_match, otherwise } => {
                let matched = on_match.collect_unguarded(guarded || !pattern.matches_empty(), out);
                let other = otherwise.as_ref().map_or(guarded, |action| action.collect_unguarded(guarded, out));
                matched && other
            }
            Action::ConditionalSequence(pairs) => pairs.iter().fold(guarded, |guarded, (pattern, action)| {
                action.collect_unguarded(guarded || !pattern.matches_empty(), out)
            }),
            Action::Sequence(actions) => {
                actions.iter().fold(guarded, |guarded, action| action.collect_unguarded(guarded, out))
            }
            Action::EnqueueToken(_) | Action::Clear | Action::MutateToken { .. } => guarded,
        }
    }
}
