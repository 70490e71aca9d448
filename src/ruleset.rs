use crate::action::Action;
use crate::error::{LexerError, Result};
use crate::rule::Rule;
use crate::TokenType;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::io;

/// Token-type registry plus the rules of one lexer.
///
/// Token types are registered once, before the first rule. Each rule is
/// checked when added (shape, token types it emits); sub-rule references may
/// point forward and are only checked by [`Ruleset::validate`]. Once shared
/// with a [`Lexer`](crate::Lexer) the ruleset is read-only.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    token_types: Option<BTreeMap<TokenType, String>>,
    rules: BTreeMap<String, Rule>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every token type with a description. Only allowed once.
    pub fn set_token_types(&mut self, types: impl IntoIterator<Item = (TokenType, String)>) -> Result<()> {
        if self.token_types.is_some() {
            return Err(LexerError::rule("Token types are already registered"));
        }
        let mut registry = BTreeMap::new();
        for (token_type, description) in types {
            if registry.contains_key(&token_type) {
                return Err(LexerError::rule(format!("Token type {token_type} is registered twice")));
            }
            registry.insert(token_type, description);
        }
        debug!("registered {} token types", registry.len());
        self.token_types = Some(registry);
        Ok(())
    }

    pub fn token_types(&self) -> Option<&BTreeMap<TokenType, String>> {
        self.token_types.as_ref()
    }

    pub fn has_token_type(&self, token_type: &TokenType) -> bool {
        self.token_types.as_ref().is_some_and(|types| types.contains_key(token_type))
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        if self.token_types.is_none() {
            return Err(LexerError::rule(format!(
                "Cannot add rule '{}': the ruleset has no token types yet",
                rule.name()
            )));
        }
        rule.check_shape()?;
        if self.rules.contains_key(rule.name()) {
            return Err(LexerError::rule(format!("Rule named '{}' already exists", rule.name())));
        }
        self.validate_rule(&rule)?;
        debug!("added {:?} rule '{}'", rule.kind(), rule.name());
        self.rules.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Every token type the rule can emit or retype to must be registered.
    pub fn validate_rule(&self, rule: &Rule) -> Result<()> {
        for action in rule.all_actions() {
            let types: Vec<&TokenType> = match action {
                Action::EnqueueToken(token_type) => vec![token_type],
                Action::MutateToken { from, to } => vec![from, to],
                _ => continue,
            };
            if let Some(unknown) = types.into_iter().find(|ty| !self.has_token_type(ty)) {
                return Err(LexerError::rule(format!("Rule '{}' uses unregistered token type {unknown}", rule.name())));
            }
        }
        Ok(())
    }

    /// Whole-set checks: every sub-rule reference resolves, and no rule can
    /// re-enter itself without consuming input.
    pub fn validate(&self) -> Result<()> {
        for rule in self.rules.values() {
            for action in rule.all_actions() {
                if let Action::ApplySubrule(name) = action {
                    if !self.rules.contains_key(name) {
                        return Err(LexerError::rule(format!(
                            "Rule '{}' refers to unknown subrule '{name}'",
                            rule.name()
                        )));
                    }
                }
            }
        }
        self.check_cycles()
    }

    fn check_cycles(&self) -> Result<()> {
        let edges: HashMap<&str, Vec<&str>> =
            self.rules.iter().map(|(name, rule)| (name.as_str(), rule.unguarded_subrules())).collect();
        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for name in self.rules.keys() {
            if let Some(cycle) = visit(name, &edges, &mut marks, &mut path) {
                return Err(LexerError::rule(format!(
                    "Rules can recurse without consuming input: {}",
                    cycle.join(" -> ")
                )));
            }
        }
        Ok(())
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Writes a parser-generator `token` declaration for the symbolic token
    /// types, sorted by name.
    pub fn declare_tokens<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# Declare the tokens (terminal symbols) registered in the lexer.")?;
        writeln!(out, "# Remark special characters are returned 'as is'")?;
        writeln!(out, "token")?;
        for (token_type, description) in self.token_types.iter().flatten() {
            if let TokenType::Symbol(name) = token_type {
                writeln!(out, "\t{name}    # {description}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn visit<'a>(
    name: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<&'a str>> {
    match marks.get(name) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => {
            let start = path.iter().position(|seen| *seen == name).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(name, Mark::Visiting);
    path.push(name);
    for next in edges.get(name).into_iter().flatten() {
        if let Some(cycle) = visit(*next, edges, marks, path) {
            return Some(cycle);
        }
    }
    path.pop();
    marks.insert(name, Mark::Done);
    None
}
