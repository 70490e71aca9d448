use crate::error::{LexerError, Result};
use regex::Regex;
use regex_automata::{Anchored, Input, meta};
use std::fmt;

/// What a rule handler, a choice or the engine matches against the input.
///
/// Characters and literals compare verbatim. Regexes are compiled twice: a
/// meta regex run as an anchored search at the scan position of the whole
/// input, and a plain copy used to search an already-consumed lexeme.
#[derive(Debug, Clone)]
pub enum Pattern {
    Char(char),
    Literal(String),
    Regex(RegexPattern),
}

#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    anchored: meta::Regex,
    search: Regex,
    spans_lines: bool,
}

impl Pattern {
    pub fn char(c: char) -> Self {
        Pattern::Char(c)
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Compiles `source`. A leading inline flag group that enables `s`
    /// (`(?s)`, `(?is:...)`) marks the pattern as line-spanning.
    pub fn regex(source: &str) -> Result<Self> {
        let spans_lines = regex!(r"^\(\?[a-zA-Z]*s[a-zA-Z]*[:)]").is_match(source);
        Self::compile(source, spans_lines)
    }

    /// Compiles `source` with `.` matching line breaks, so a single match may
    /// cover several source lines.
    pub fn multiline(source: &str) -> Result<Self> {
        Self::compile(&format!("(?s:{source})"), true)
    }

    fn compile(source: &str, spans_lines: bool) -> Result<Self> {
        let invalid = |err: regex::Error| LexerError::rule(format!("Invalid pattern /{source}/: {err}"));
        let search = Regex::new(source).map_err(invalid)?;
        let anchored = meta::Regex::new(source)
            .map_err(|err| LexerError::rule(format!("Invalid pattern /{source}/: {err}")))?;
        Ok(Pattern::Regex(RegexPattern { source: source.to_string(), anchored, search, spans_lines }))
    }

    pub fn spans_lines(&self) -> bool {
        match self {
            Pattern::Regex(re) => re.spans_lines,
            Pattern::Char(c) => *c == '\n' || *c == '\r',
            Pattern::Literal(text) => text.contains(['\n', '\r']),
        }
    }

    /// The character this pattern stands for, if it is exactly one character long.
    pub fn single_char(&self) -> Option<char> {
        match self {
            Pattern::Char(c) => Some(*c),
            Pattern::Literal(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            Pattern::Regex(_) => None,
        }
    }

    /// Length in bytes of the match starting exactly at `pos`, if any.
    /// A zero-length match is still a match.
    ///
    /// Regexes see the text before `pos`, so `\b` and `(?m:^)` look at the
    /// preceding character.
    pub fn match_len_at(&self, text: &str, pos: usize) -> Option<usize> {
        let rest = text.get(pos..)?;
        match self {
            Pattern::Char(c) => rest.starts_with(*c).then(|| c.len_utf8()),
            Pattern::Literal(lit) => rest.starts_with(lit.as_str()).then_some(lit.len()),
            Pattern::Regex(re) => {
                let input = Input::new(text).range(pos..).anchored(Anchored::Yes);
                re.anchored.search(&input).map(|m| m.end() - pos)
            }
        }
    }

    /// Whether this pattern can match without consuming anything.
    pub fn matches_empty(&self) -> bool {
        self.match_len_at("", 0) == Some(0)
    }

    /// Tests an already-consumed lexeme: exact comparison for characters and
    /// literals, search anywhere for regexes.
    pub fn matches_lexeme(&self, lexeme: &str) -> bool {
        match self {
            Pattern::Char(c) => lexeme.chars().eq(std::iter::once(*c)),
            Pattern::Literal(lit) => lexeme == lit,
            Pattern::Regex(re) => re.search.is_match(lexeme),
        }
    }

    /// End offsets (relative to `text`) of every non-overlapping match.
    pub fn match_ends(&self, text: &str) -> Vec<usize> {
        match self {
            Pattern::Char(c) => text.match_indices(*c).map(|(at, s)| at + s.len()).collect(),
            Pattern::Literal(lit) if lit.is_empty() => Vec::new(),
            Pattern::Literal(lit) => text.match_indices(lit.as_str()).map(|(at, s)| at + s.len()).collect(),
            Pattern::Regex(re) => re.search.find_iter(text).filter(|m| !m.is_empty()).map(|m| m.end()).collect(),
        }
    }

    pub fn source(&self) -> String {
        match self {
            Pattern::Char(c) => c.to_string(),
            Pattern::Literal(lit) => lit.clone(),
            Pattern::Regex(re) => re.source.clone(),
        }
    }
}

impl From<char> for Pattern {
    fn from(c: char) -> Self {
        Pattern::Char(c)
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::Literal(text.to_string())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Char(a), Pattern::Char(b)) => a == b,
            (Pattern::Literal(a), Pattern::Literal(b)) => a == b,
            (Pattern::Regex(a), Pattern::Regex(b)) => a.source == b.source && a.spans_lines == b.spans_lines,
            _ => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Char(c) => write!(f, "{c:?}"),
            Pattern::Literal(lit) => write!(f, "{lit:?}"),
            Pattern::Regex(re) => write!(f, "/{}/", re.source),
        }
    }
}
