//! A JSON lexer built from rules, used by the command line tool and as a
//! worked example of the rule vocabulary.
//!
//! Punctuation is dispatched by a standard rule. Strings, numbers and the
//! literal names go through look-ahead sub-rules, the latter two after putting
//! their first character back. Transform rules turn lexemes into values.

use crate::action::Action;
use crate::error::Result;
use crate::lexer::{Lexer, LexerOptions};
use crate::queue::TransformRule;
use crate::rule::Rule;
use crate::ruleset::Ruleset;
use crate::{Token, TokenType, Value};
use std::sync::Arc;

const PUNCTUATION: &str = "{}[],:";

pub fn json_ruleset() -> Result<Ruleset> {
    let mut rules = Ruleset::new();
    rules.set_token_types(token_types![
        '{' => "begin object",
        '}' => "end object",
        '[' => "begin array",
        ']' => "end array",
        ',' => "value separator",
        ':' => "name separator",
        "STRING" => "string literal",
        "NUMBER" => "number literal",
        "TRUE" => "true literal",
        "FALSE" => "false literal",
        "NULL" => "null literal",
    ])?;

    let rescan = |subrule: &str| Action::sequence(vec![Action::putback(), Action::subrule(subrule)]);
    let mut main = Rule::standard("main")
        .on_char('"', Action::subrule("string"))
        .on_chars("tfn", rescan("literal_name")?)
        .on_chars("-0123456789", rescan("number")?);
    for c in PUNCTUATION.chars() {
        main = main.on_char(c, Action::enqueue(c));
    }
    rules.add_rule(main)?;

    rules.add_rule(Rule::lookahead("string").on(
        pattern!(r#"(?:[^"\\\x00-\x1f]|\\(?:["\\/bfnrt]|u[0-9a-fA-F]{4}))*""#).clone(),
        Action::enqueue("STRING"),
    ))?;
    rules.add_rule(
        Rule::lookahead("literal_name")
            .on(pattern!(r"true\b").clone(), Action::enqueue("TRUE"))
            .on(pattern!(r"false\b").clone(), Action::enqueue("FALSE"))
            .on(pattern!(r"null\b").clone(), Action::enqueue("NULL")),
    )?;
    rules.add_rule(Rule::lookahead("number").on(
        pattern!(r"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][-+]?\d+)?").clone(),
        Action::enqueue("NUMBER"),
    ))?;
    rules.validate()?;
    Ok(rules)
}

/// Blanks as noise and the value transforms.
pub fn json_options() -> Result<LexerOptions> {
    Ok(LexerOptions::default()
        .with_noise(pattern!(r"[ \t]+").clone())
        .with_transform(retype_value("STRING", |lexeme| {
            let body = lexeme.get(1..lexeme.len().saturating_sub(1)).unwrap_or("");
            unescape(body).map(Value::Text)
        })?)
        .with_transform(retype_value("NUMBER", number_value)?)
        .with_transform(retype_value("TRUE", |_| Some(Value::Bool(true)))?)
        .with_transform(retype_value("FALSE", |_| Some(Value::Bool(false)))?)
        .with_transform(retype_value("NULL", |_| Some(Value::Null))?))
}

pub fn json_lexer(input: &str) -> Result<Lexer> {
    let mut lexer = Lexer::new(Arc::new(json_ruleset()?), json_options()?)?;
    lexer.set_input(input)?;
    Ok(lexer)
}

/// Keeps the token type and replaces the value; a lexeme `to_value` rejects
/// keeps its text value.
fn retype_value<F>(name: &'static str, to_value: F) -> Result<TransformRule>
where
    F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
{
    let token_type = TokenType::symbol(name);
    let kept = token_type.clone();
    TransformRule::new(token_type, move |token: Token| {
        let value = to_value(&token.lexeme).unwrap_or(token.value);
        Some((kept.clone(), Token { value, ..token }))
    })
}

fn number_value(lexeme: &str) -> Option<Value> {
    if let Ok(int) = lexeme.parse::<i64>() {
        return Some(Value::Int(int));
    }
    lexeme.parse::<f64>().ok().map(Value::Float)
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let high = hex4(&mut chars)?;
                if (0xD800..0xDC00).contains(&high) {
                    let rest = chars.as_str();
                    if !rest.starts_with("\\u") {
                        return None;
                    }
                    chars.nth(1);
                    let low = hex4(&mut chars)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))?
                } else {
                    char::from_u32(high)?
                }
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LexemePosition, TokenEntry};

    fn values(input: &str) -> Vec<(String, Value)> {
        json_lexer(input)
            .unwrap()
            .map(|entry| match entry.unwrap() {
                TokenEntry::Token(token_type, token) => (token_type.to_string(), token.value),
                TokenEntry::Eos(token) => ("EOS".to_string(), token.value),
                TokenEntry::Error(err) => ("ERROR".to_string(), Value::Text(err.message().to_string())),
            })
            .collect()
    }

    #[test]
    fn scalars_get_typed_values() {
        let out = values(r#"[0, -12, 3.25, 1e3, "hi", true, false, null]"#);
        let typed: Vec<&Value> =
            out.iter().filter(|(ty, _)| !ty.starts_with('\'') && ty != "EOS").map(|(_, value)| value).collect();
        assert_eq!(
            typed,
            [
                &Value::Int(0),
                &Value::Int(-12),
                &Value::Float(3.25),
                &Value::Float(1000.0),
                &Value::from("hi"),
                &Value::Bool(true),
                &Value::Bool(false),
                &Value::Null,
            ]
        );
        assert_eq!(out.last().unwrap(), &("EOS".to_string(), Value::from(crate::EOS_LEXEME)));
    }

    #[test]
    fn string_escapes() {
        let out = values(r#""a\"b\\c\né😀""#);
        assert_eq!(out[0], ("STRING".to_string(), Value::from("a\"b\\c\né😀")));
    }

    #[test]
    fn objects_across_lines_keep_positions() {
        let mut lexer = json_lexer("{\n  \"key\": [1,\n    null]\n}").unwrap();
        let entries: Vec<TokenEntry> = lexer.by_ref().collect::<Result<_>>().unwrap();
        let kinds: Vec<String> = entries.iter().filter_map(TokenEntry::token_type).map(ToString::to_string).collect();
        assert_eq!(kinds, ["'{'", "STRING", "':'", "'['", "NUMBER", "','", "NULL", "']'", "'}'"]);

        let null = entries.iter().find(|e| e.token_type() == Some(&TokenType::symbol("NULL"))).unwrap();
        assert_eq!(null.token().unwrap().position, LexemePosition::new(19, 3, 4).unwrap());
        assert_eq!(lexer.stats().errors_captured, 0);
    }

    #[test]
    fn bad_literals_are_reported() {
        let out = values("[nul, 1]");
        assert_eq!(out[1], ("ERROR".to_string(), Value::from("Unknown token 'n'")));
        assert!(out.iter().any(|(ty, v)| ty == "NUMBER" && *v == Value::Int(1)));
        assert_eq!(out.last().unwrap().0, "EOS");
    }

    #[test]
    fn unescape_rejects_broken_escapes() {
        assert_eq!(unescape(r"\q"), None);
        assert_eq!(unescape(r"\u12"), None);
        assert_eq!(unescape(r"\ud83d"), None);
        assert_eq!(unescape("plain"), Some("plain".to_string()));
    }
}
