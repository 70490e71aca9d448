use crate::engine::EngineConfig;
use crate::queue::TransformRule;
use crate::{Pattern, TokenType};
use std::collections::HashMap;

/// Name of the mode a lexer starts in.
pub const DEFAULT_MODE: &str = "default";

bitflags::bitflags! {
    /// Optional layout tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LexerFlags: u8 {
        /// Emit an indentation token for the blanks starting a line.
        const SIGNIFICANT_INDENTATION = 1 << 0;
        /// Emit a token for every line separator.
        const EOL_AS_TOKEN = 1 << 1;
    }
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct LexerOptions {
    pub flags: LexerFlags,
    /// Rule applied in the default mode.
    pub main_rule: String,
    /// Rule applied in each extra mode.
    pub mode_rules: HashMap<String, String>,
    pub eol_token: TokenType,
    pub indent_token: TokenType,
    pub engine: EngineConfig,
    pub transforms: Vec<TransformRule>,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            flags: LexerFlags::empty(),
            main_rule: "main".to_string(),
            mode_rules: HashMap::new(),
            eol_token: TokenType::symbol("T_EOL"),
            indent_token: TokenType::symbol("T_INDENT"),
            engine: EngineConfig::default(),
            transforms: Vec::new(),
        }
    }
}

impl LexerOptions {
    pub fn with_flags(mut self, flags: LexerFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_main_rule(mut self, rule: impl Into<String>) -> Self {
        self.main_rule = rule.into();
        self
    }

    /// While `mode` is active, `rule` replaces the main rule.
    pub fn with_mode(mut self, mode: impl Into<String>, rule: impl Into<String>) -> Self {
        self.mode_rules.insert(mode.into(), rule.into());
        self
    }

    pub fn with_noise(mut self, noise: Pattern) -> Self {
        self.engine = self.engine.with_noise(noise);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_transform(mut self, transform: TransformRule) -> Self {
        self.transforms.push(transform);
        self
    }

    /// The rule to apply while `mode` is active, if the mode exists.
    pub fn rule_for_mode(&self, mode: &str) -> Option<&str> {
        if mode == DEFAULT_MODE {
            return Some(&self.main_rule);
        }
        self.mode_rules.get(mode).map(String::as_str)
    }
}
