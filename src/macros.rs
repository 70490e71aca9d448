#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// A `&'static Pattern` compiled on first use. Only for literal sources known
/// to be valid; runtime sources go through [`Pattern::regex`](crate::Pattern::regex).
#[macro_export]
macro_rules! pattern {
    ($pat:literal) => {{
        static PAT: once_cell::sync::Lazy<$crate::Pattern> =
            once_cell::sync::Lazy::new(|| $crate::Pattern::regex($pat).unwrap());
        &*PAT
    }};
}

/// Builds the `(TokenType, description)` pairs expected by
/// [`Ruleset::set_token_types`](crate::Ruleset::set_token_types).
///
/// ```
/// let types = rulelex::token_types![
///     '{' => "left brace",
///     "NUMBER" => "number literal",
/// ];
/// assert_eq!(types.len(), 2);
/// ```
#[macro_export]
macro_rules! token_types {
    ( $($ty:expr => $desc:expr),* $(,)? ) => {
        vec![ $( ($crate::TokenType::from($ty), ::std::string::String::from($desc)) ),* ]
    };
}
