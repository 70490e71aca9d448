use crate::error::{LexerError, Result};
use crate::Pattern;

/// Named kinds of text that never become tokens (blanks, comments, ...),
/// combined into the single noise pattern the engine skips.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseRule {
    categories: Vec<(String, String)>,
    pattern: Pattern,
}

impl NoiseRule {
    /// `categories` are `(name, regex source)` pairs; they are tried in order
    /// and a run of any mix of them is skipped in one go.
    pub fn new<N, S>(categories: impl IntoIterator<Item = (N, S)>) -> Result<Self>
    where
        N: Into<String>,
        S: Into<String>,
    {
        let categories: Vec<(String, String)> =
            categories.into_iter().map(|(name, source)| (name.into(), source.into())).collect();
        if categories.is_empty() {
            return Err(LexerError::rule("A noise rule needs at least one category"));
        }
        for (name, source) in &categories {
            Pattern::regex(source)
                .map_err(|err| LexerError::rule(format!("Noise category '{name}': {}", err.message())))?;
        }

        let union = categories.iter().map(|(_, source)| format!("(?:{source})")).collect::<Vec<_>>().join("|");
        let pattern = Pattern::regex(&format!("(?:{union})+"))?;
        Ok(NoiseRule { categories, pattern })
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().map(|(name, source)| (name.as_str(), source.as_str()))
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn into_pattern(self) -> Pattern {
        self.pattern
    }
}
