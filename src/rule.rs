use crate::action::{Action, ActionResult, Host};
use crate::error::{LexerError, Result};
use crate::Pattern;
use log::debug;

/// How a rule picks its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Consume one character, then dispatch on it. Handler patterns are single
    /// characters.
    Standard,
    /// Try each handler pattern against the upcoming text; the first one that
    /// scans a token wins.
    Lookahead,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub pattern: Pattern,
    pub action: Action,
}

/// A named dispatch table from input patterns to actions.
///
/// When no handler applies, `default_action` runs; unless replaced with
/// [`Rule::otherwise`] it reports an unknown token.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    kind: RuleKind,
    before_action: Option<Action>,
    handlers: Vec<Handler>,
    default_action: Action,
}

impl Rule {
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Rule {
            name: name.into(),
            kind,
            before_action: None,
            handlers: Vec::new(),
            default_action: Action::unknown_token(),
        }
    }

    pub fn standard(name: impl Into<String>) -> Self {
        Self::new(name, RuleKind::Standard)
    }

    pub fn lookahead(name: impl Into<String>) -> Self {
        Self::new(name, RuleKind::Lookahead)
    }

    /// Action run before any handler is considered.
    pub fn before(mut self, action: Action) -> Self {
        self.before_action = Some(action);
        self
    }

    pub fn on(mut self, pattern: impl Into<Pattern>, action: Action) -> Self {
        self.handlers.push(Handler { pattern: pattern.into(), action });
        self
    }

    pub fn on_char(self, c: char, action: Action) -> Self {
        self.on(Pattern::Char(c), action)
    }

    /// One handler per character of `chars`, all with the same action.
    pub fn on_chars(mut self, chars: &str, action: Action) -> Self {
        for c in chars.chars() {
            self = self.on_char(c, action.clone());
        }
        self
    }

    pub fn otherwise(mut self, action: Action) -> Self {
        self.default_action = action;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn before_action(&self) -> Option<&Action> {
        self.before_action.as_ref()
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn default_action(&self) -> &Action {
        &self.default_action
    }

    /// Every action reachable from this rule, nested ones included.
    pub fn all_actions(&self) -> Vec<&Action> {
        self.before_action
            .iter()
            .chain(self.handlers.iter().map(|handler| &handler.action))
            .chain(std::iter::once(&self.default_action))
            .flat_map(Action::walk)
            .collect()
    }

    /// Sub-rules this rule may enter before consuming any input.
    pub(crate) fn unguarded_subrules(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let guarded = self.before_action.as_ref().is_some_and(|action| action.collect_unguarded(false, &mut names));
        match self.kind {
            // The dispatch character is consumed before any handler runs.
            RuleKind::Standard => {
                for handler in &self.handlers {
                    handler.action.collect_unguarded(true, &mut names);
                }
                self.default_action.collect_unguarded(true, &mut names);
            }
            RuleKind::Lookahead => {
                for handler in &self.handlers {
                    handler.action.collect_unguarded(guarded || !handler.pattern.matches_empty(), &mut names);
                }
                self.default_action.collect_unguarded(guarded, &mut names);
            }
        }
        names
    }

    /// Shape checks that do not need the rest of the ruleset.
    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LexerError::rule("A rule needs a non-empty name"));
        }
        if self.kind == RuleKind::Standard {
            if let Some(handler) = self.handlers.iter().find(|handler| handler.pattern.single_char().is_none()) {
                return Err(LexerError::rule(format!(
                    "Rule '{}': pattern {} must be a single character",
                    self.name, handler.pattern
                )));
            }
        }
        Ok(())
    }

    pub fn apply_to<H: Host + ?Sized>(&self, host: &mut H) -> ActionResult {
        if let Some(before) = &self.before_action {
            before.apply_to(host)?;
        }

        let handler = match self.kind {
            RuleKind::Standard => {
                let ch = host.next_char()?;
                debug!("rule '{}' dispatches on {ch:?}", self.name);
                ch.and_then(|c| self.handlers.iter().find(|handler| handler.pattern.single_char() == Some(c)))
            }
            RuleKind::Lookahead => {
                let mut found = None;
                for handler in &self.handlers {
                    if host.scan_token(&handler.pattern)? {
                        found = Some(handler);
                        break;
                    }
                }
                debug!("rule '{}' lookahead matched {:?}", self.name, found.map(|h| h.pattern.to_string()));
                found
            }
        };

        match handler {
            Some(handler) => handler.action.apply_to(host),
            None => self.default_action.apply_to(host),
        }
    }
}
