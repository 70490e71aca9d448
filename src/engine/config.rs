use crate::Pattern;

/// Patterns the engine uses between tokens.
///
/// `noise` must not match line separators, otherwise line tracking only sees
/// the breaks it happens to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Line separator.
    pub eol: Pattern,
    /// Whitespace and comments skipped before every scan.
    pub noise: Pattern,
    /// Leading blanks reported as `Indentation` at the start of a line; `None`
    /// leaves them to `noise`.
    pub indentation: Option<Pattern>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eol: pattern!(r"\r\n|\r|\n").clone(),
            noise: pattern!(r"(?:#.*|/\*.*?\*/|[ \t\f])+").clone(),
            indentation: Some(pattern!(r"(?: |\t)+").clone()),
        }
    }
}

impl EngineConfig {
    pub fn with_eol(mut self, eol: Pattern) -> Self {
        self.eol = eol;
        self
    }

    pub fn with_noise(mut self, noise: Pattern) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_indentation(mut self, indentation: Option<Pattern>) -> Self {
        self.indentation = indentation;
        self
    }
}
