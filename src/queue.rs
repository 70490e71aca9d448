use crate::error::{LexerError, Result};
use crate::{Token, TokenEntry, TokenType};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

pub type TransformFn = Arc<dyn Fn(Token) -> Option<(TokenType, Token)> + Send + Sync>;

/// Rewrites (or drops, by returning `None`) every token of one type on its way
/// into the queue.
#[derive(Clone)]
pub struct TransformRule {
    token_type: TokenType,
    transform: TransformFn,
}

impl TransformRule {
    pub fn new<F>(token_type: impl Into<TokenType>, transform: F) -> Result<Self>
    where
        F: Fn(Token) -> Option<(TokenType, Token)> + Send + Sync + 'static,
    {
        let token_type = token_type.into();
        if matches!(&token_type, TokenType::Symbol(name) if name.is_empty()) {
            return Err(LexerError::rule("A transform rule needs a non-empty token type"));
        }
        Ok(TransformRule { token_type, transform: Arc::new(transform) })
    }

    /// Drops every token of `token_type`.
    pub fn discard(token_type: impl Into<TokenType>) -> Result<Self> {
        Self::new(token_type, |_| None)
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn apply(&self, token: Token) -> Option<(TokenType, Token)> {
        (self.transform)(token)
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("token_type", &self.token_type)
            .field("transform", &"<function>")
            .finish()
    }
}

/// FIFO of entries waiting for the parser.
///
/// New entries go in at the head and leave from the tail; `push_ahead` puts
/// an entry at the tail so it is delivered before everything pending.
#[derive(Debug, Clone, Default)]
pub struct TokenQueue {
    entries: VecDeque<TokenEntry>,
    transforms: HashMap<TokenType, TransformRule>,
}

impl TokenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when two rules target the same token type.
    pub fn with_transforms(rules: impl IntoIterator<Item = TransformRule>) -> Result<Self> {
        let mut transforms = HashMap::new();
        for rule in rules {
            if transforms.contains_key(rule.token_type()) {
                return Err(LexerError::rule(format!("More than one transform rule for token type {}", rule.token_type())));
            }
            transforms.insert(rule.token_type().clone(), rule);
        }
        Ok(TokenQueue { entries: VecDeque::new(), transforms })
    }

    /// Queues `entry` (after its transform rule, if any) and returns what was
    /// actually queued; `None` when the transform dropped it.
    pub fn enqueue(&mut self, entry: TokenEntry) -> Result<Option<TokenEntry>> {
        let Some(entry) = self.transformed(entry)? else {
            return Ok(None);
        };
        self.entries.push_front(entry.clone());
        Ok(Some(entry))
    }

    /// Like [`enqueue`](Self::enqueue) but the entry is delivered next.
    pub fn push_ahead(&mut self, entry: TokenEntry) -> Result<Option<TokenEntry>> {
        let Some(entry) = self.transformed(entry)? else {
            return Ok(None);
        };
        self.entries.push_back(entry.clone());
        Ok(Some(entry))
    }

    pub fn dequeue(&mut self) -> Result<TokenEntry> {
        self.entries.pop_back().ok_or_else(|| LexerError::internal("Cannot dequeue from an empty token queue", None))
    }

    /// The entry at the head: the most recently queued one.
    pub fn last_enqueued_mut(&mut self) -> Option<&mut TokenEntry> {
        self.entries.front_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pending entries in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenEntry> {
        self.entries.iter().rev()
    }

    fn transformed(&self, entry: TokenEntry) -> Result<Option<TokenEntry>> {
        let (token_type, token) = match check_entry(entry)? {
            TokenEntry::Token(token_type, token) => (token_type, token),
            other => return Ok(Some(other)),
        };
        let Some(rule) = self.transforms.get(&token_type) else {
            return Ok(Some(TokenEntry::Token(token_type, token)));
        };
        match rule.apply(token) {
            Some((new_type, new_token)) => check_entry(TokenEntry::Token(new_type, new_token)).map(Some),
            None => {
                debug!("transform dropped a {token_type} token");
                Ok(None)
            }
        }
    }
}

fn check_entry(entry: TokenEntry) -> Result<TokenEntry> {
    if let TokenEntry::Token(TokenType::Symbol(name), token) = &entry {
        if name.is_empty() {
            return Err(LexerError::internal("Malformed queue entry: empty token type", Some(token.position)));
        }
    }
    Ok(entry)
}
