use super::*;
use crate::action::{Action, Host};
use crate::queue::TransformRule;
use crate::rule::Rule;
use crate::{ErrorKind, LexemePosition};

fn pattern(source: &str) -> Pattern {
    Pattern::regex(source).unwrap()
}

fn registered() -> Ruleset {
    let mut rules = Ruleset::new();
    rules
        .set_token_types(token_types![
            "INT" => "integer literal",
            "IDENT" => "identifier",
            "KEYWORD" => "reserved word",
            "LABEL" => "jump label",
            "STRING" => "string literal",
            '+' => "plus sign",
            '*' => "times sign",
            '=' => "equal sign",
            ',' => "comma",
            '(' => "left paren",
            ')' => "right paren",
        ])
        .unwrap();
    rules
}

fn calc_rules() -> Ruleset {
    let mut rules = registered();
    rules
        .add_rule(
            Rule::lookahead("main")
                .on(pattern(r"\d+"), Action::enqueue("INT"))
                .on(pattern(r"[a-z]\w*"), Action::enqueue("IDENT"))
                .on(Pattern::char('+'), Action::enqueue('+'))
                .on(Pattern::char('*'), Action::enqueue('*'))
                .on(Pattern::char('('), Action::enqueue('('))
                .on(Pattern::char(')'), Action::enqueue(')')),
        )
        .unwrap();
    rules
}

fn string_rules() -> Ruleset {
    let mut rules = registered();
    rules
        .add_rule(
            Rule::standard("main")
                .on_char('"', Action::subrule("string"))
                .on_char(',', Action::enqueue(',')),
        )
        .unwrap();
    rules
        .add_rule(Rule::lookahead("string").on(pattern(r#"(?:[^"\\\n]|\\.)*""#), Action::enqueue("STRING")))
        .unwrap();
    rules
}

fn lexer(rules: Ruleset, options: LexerOptions, input: &str) -> Lexer {
    let mut lexer = Lexer::new(Arc::new(rules), options).unwrap();
    lexer.set_input(input).unwrap();
    lexer
}

fn lex(rules: Ruleset, options: LexerOptions, input: &str) -> Vec<TokenEntry> {
    lexer(rules, options, input).collect::<Result<Vec<_>>>().unwrap()
}

fn describe(entries: &[TokenEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match entry {
            TokenEntry::Token(token_type, token) => format!("{token_type}:{}", token.lexeme),
            TokenEntry::Eos(_) => "EOS".to_string(),
            TokenEntry::Error(err) => format!("error: {}", err.message()),
        })
        .collect()
}

#[test]
fn tokens_then_exactly_one_eos() {
    let mut lexer = lexer(calc_rules(), LexerOptions::default(), "12 + x1*(3)");
    let mut entries = Vec::new();
    loop {
        let entry = lexer.next_token().unwrap();
        let done = entry.is_eos();
        entries.push(entry);
        if done {
            break;
        }
    }
    assert_eq!(describe(&entries), ["INT:12", "'+':+", "IDENT:x1", "'*':*", "'(':(", "INT:3", "')':)", "EOS"]);

    let eos = entries.last().unwrap().token().unwrap();
    assert_eq!(eos.lexeme, crate::EOS_LEXEME);
    assert_eq!(eos.position, LexemePosition::new(11, 1, 11).unwrap());
    assert_eq!(entries[2].token().unwrap().position, LexemePosition::new(5, 1, 5).unwrap());

    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup, "nothing follows the end of stream");
}

#[test]
fn next_token_needs_input() {
    let mut lexer = Lexer::new(Arc::new(calc_rules()), LexerOptions::default()).unwrap();
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lexical);

    let items: Vec<_> = lexer.by_ref().collect();
    assert_eq!(items.len(), 1, "the iterator stops after a failure");
    assert!(items[0].is_err());
}

#[test]
fn empty_input_is_just_eos() {
    let entries = lex(calc_rules(), LexerOptions::default(), "");
    assert_eq!(describe(&entries), ["EOS"]);
    assert_eq!(entries[0].token().unwrap().position, LexemePosition::origin());
}

#[test]
fn set_input_starts_over() {
    let mut lexer = lexer(calc_rules(), LexerOptions::default(), "a");
    assert_eq!(describe(&lexer.by_ref().collect::<Result<Vec<_>>>().unwrap()), ["IDENT:a", "EOS"]);

    lexer.set_input("1 2").unwrap();
    assert_eq!(describe(&lexer.by_ref().collect::<Result<Vec<_>>>().unwrap()), ["INT:1", "INT:2", "EOS"]);
}

#[test]
fn unknown_characters_become_error_entries() {
    let mut lexer = lexer(calc_rules(), LexerOptions::default(), "1 @ 2");
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["INT:1", "error: Unknown token '@'", "INT:2", "EOS"]);

    let err = entries[1].error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), Some(LexemePosition::new(2, 1, 2).unwrap()));

    let stats = lexer.stats();
    assert_eq!(stats.tokens_emitted, 2);
    assert_eq!(stats.errors_captured, 1);
    assert_eq!(stats.rules_applied, 3);
}

#[test]
fn line_ends_as_tokens_on_request() {
    let options = LexerOptions::default().with_flags(LexerFlags::EOL_AS_TOKEN);
    let mut lexer = lexer(calc_rules(), options, "a\r\nb\n");
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["IDENT:a", "T_EOL:\r\n", "IDENT:b", "T_EOL:\n", "EOS"]);
    assert_eq!(entries[1].token().unwrap().position, LexemePosition::new(1, 1, 1).unwrap());
    assert_eq!(entries[2].token().unwrap().position, LexemePosition::new(3, 2, 0).unwrap());
    assert_eq!(entries[4].token().unwrap().position, LexemePosition::new(5, 3, 0).unwrap());
    assert_eq!(lexer.stats().eol_tokens, 2);

    let entries = lex(calc_rules(), LexerOptions::default(), "a\r\nb\n");
    assert_eq!(describe(&entries), ["IDENT:a", "IDENT:b", "EOS"]);
}

#[test]
fn indentation_as_tokens_on_request() {
    let options = LexerOptions::default().with_flags(LexerFlags::SIGNIFICANT_INDENTATION);
    let entries = lex(calc_rules(), options, "a\n  b\n\tc");
    assert_eq!(describe(&entries), ["IDENT:a", "T_INDENT:  ", "IDENT:b", "T_INDENT:\t", "IDENT:c", "EOS"]);
    assert_eq!(entries[1].token().unwrap().position, LexemePosition::new(2, 2, 0).unwrap());

    let entries = lex(calc_rules(), LexerOptions::default(), "a\n  b\n\tc");
    assert_eq!(describe(&entries), ["IDENT:a", "IDENT:b", "IDENT:c", "EOS"]);
}

#[test]
fn standard_rule_hands_over_to_a_subrule() {
    let entries = lex(string_rules(), LexerOptions::default(), r#""ab", "c\"d""#);
    assert_eq!(describe(&entries), [r#"STRING:"ab""#, "',':,", r#"STRING:"c\"d""#, "EOS"]);
    assert_eq!(entries[2].token().unwrap().position, LexemePosition::new(6, 1, 6).unwrap());
}

#[test]
fn transforms_rewrite_and_drop() {
    let unquote = TransformRule::new("STRING", |token: Token| {
        let inner = token.lexeme.get(1..token.lexeme.len() - 1)?.to_string();
        Some((TokenType::symbol("STRING"), Token { value: Value::Text(inner), ..token }))
    })
    .unwrap();
    let options = LexerOptions::default().with_transform(unquote);
    let entries = lex(string_rules(), options, r#""ab""#);
    assert_eq!(entries[0].token().unwrap().value, Value::from("ab"));
    assert_eq!(entries[0].token().unwrap().lexeme, r#""ab""#);

    let options = LexerOptions::default().with_transform(TransformRule::discard("IDENT").unwrap());
    let mut lexer = lexer(calc_rules(), options, "a 1 b");
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["INT:1", "EOS"]);
    assert_eq!(lexer.stats().tokens_dropped, 2);
}

#[test]
fn unterminated_string_reports_and_recovers() {
    let entries = lex(string_rules(), LexerOptions::default(), r#""ab"#);
    let errors: Vec<&LexerError> = entries.iter().filter_map(TokenEntry::error).collect();
    assert_eq!(errors.len(), 3, "{:?}", describe(&entries));
    assert_eq!(errors[0].message(), r#"Unknown token '"'"#);
    assert_eq!(errors[0].position(), Some(LexemePosition::origin()));
    assert!(entries.last().unwrap().is_eos());
}

#[test]
fn premature_end_of_stream() {
    let entries = lex(string_rules(), LexerOptions::default(), "\"");
    assert_eq!(describe(&entries), [r#"error: Premature end of stream after '"'"#, "EOS"]);
}

#[test]
fn lexeme_choice_picks_keywords() {
    let mut rules = registered();
    rules
        .add_rule(Rule::lookahead("main").on(
            pattern(r"[a-z]+"),
            Action::choice_lexeme(pattern("^(?:if|else)$"), Action::enqueue("KEYWORD"), Some(Action::enqueue("IDENT"))),
        ))
        .unwrap();
    let entries = lex(rules, LexerOptions::default(), "if iffy else");
    assert_eq!(describe(&entries), ["KEYWORD:if", "IDENT:iffy", "KEYWORD:else", "EOS"]);
}

#[test]
fn mutate_retypes_the_newest_token() {
    let mut rules = registered();
    let ident = Action::sequence(vec![
        Action::enqueue("IDENT"),
        Action::choice(Pattern::char(':'), Action::mutate("IDENT", "LABEL"), None),
    ])
    .unwrap();
    rules.add_rule(Rule::lookahead("main").on(pattern(r"[a-z]+"), ident)).unwrap();
    let entries = lex(rules, LexerOptions::default(), "start: x");
    assert_eq!(describe(&entries), ["LABEL:start", "IDENT:x", "EOS"]);
}

#[test]
fn pattern_sequence_enqueues_in_order() {
    let mut rules = registered();
    let binding = Action::pattern_seq(vec![
        (pattern(r"[a-z]+"), Action::enqueue("IDENT")),
        (Pattern::char('='), Action::enqueue('=')),
        (pattern(r"\d+"), Action::enqueue("INT")),
    ])
    .unwrap();
    rules.add_rule(Rule::lookahead("main").on(Pattern::literal("let"), binding)).unwrap();

    let entries = lex(rules.clone(), LexerOptions::default(), "let x = 5");
    assert_eq!(describe(&entries), ["IDENT:x", "'=':=", "INT:5", "EOS"]);

    let entries = lex(rules, LexerOptions::default(), "let x 5");
    assert_eq!(describe(&entries), ["IDENT:x", "error: Unknown token '5'", "EOS"]);
    assert_eq!(entries[1].error().unwrap().position(), Some(LexemePosition::new(6, 1, 6).unwrap()));
}

fn comment_mode_rules() -> Ruleset {
    let mut rules = registered();
    rules
        .add_rule(
            Rule::lookahead("main")
                .on(pattern(r"[a-z]+"), Action::enqueue("IDENT"))
                .on(Pattern::literal("/*"), Action::change_state("push_mode", "comment", Action::clear())),
        )
        .unwrap();
    rules
        .add_rule(
            Rule::lookahead("comment")
                .on(Pattern::literal("*/"), Action::message("pop_mode", Vec::new()))
                .on(pattern(r"[^*]+"), Action::clear())
                .on(Pattern::char('*'), Action::clear()),
        )
        .unwrap();
    rules
}

#[test]
fn modes_switch_the_main_rule() {
    let options = LexerOptions::default().with_noise(pattern(r"[ \t]+")).with_mode("comment", "comment");
    let mut lexer = lexer(comment_mode_rules(), options, "a /* b * c */ d");
    assert_eq!(lexer.mode(), DEFAULT_MODE);
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["IDENT:a", "IDENT:d", "EOS"]);
    assert_eq!(lexer.mode(), DEFAULT_MODE);
}

#[test]
fn modes_are_checked() {
    let options = LexerOptions::default().with_mode("comment", "nowhere");
    let err = Lexer::new(Arc::new(comment_mode_rules()), options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);

    let options = LexerOptions::default().with_main_rule("start");
    let err = Lexer::new(Arc::new(comment_mode_rules()), options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);

    let mut lexer = lexer(comment_mode_rules(), LexerOptions::default(), "x");
    assert_eq!(lexer.set_mode("comment").unwrap_err().kind(), ErrorKind::Setup);
    assert_eq!(lexer.pop_mode().unwrap_err().kind(), ErrorKind::Setup);
}

#[test]
fn invalid_rulesets_are_refused() {
    let mut rules = registered();
    rules.add_rule(Rule::lookahead("main").otherwise(Action::subrule("missing"))).unwrap();
    let err = Lexer::new(Arc::new(rules), LexerOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rule);
}

#[test]
fn registered_messages_run_with_arguments() {
    let mut rules = registered();
    let words = vec![Value::from("if"), Value::from("else")];
    rules
        .add_rule(Rule::lookahead("main").on(pattern(r"[a-z]+"), Action::message("keyword_or_ident", words)))
        .unwrap();

    let mut lexer = lexer(rules, LexerOptions::default(), "else x");
    lexer.register_message("keyword_or_ident", |lexer: &mut Lexer, args: &[Value]| {
        let keyword = args.iter().any(|arg| arg.as_text() == Some(lexer.lexeme()));
        lexer.enqueue_token(&TokenType::symbol(if keyword { "KEYWORD" } else { "IDENT" }))
    });
    let entries = lexer.by_ref().collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["KEYWORD:else", "IDENT:x", "EOS"]);
}

#[test]
fn unknown_messages_are_setup_errors() {
    let mut rules = registered();
    rules.add_rule(Rule::lookahead("main").on(pattern(r"[a-z]+"), Action::message("shout", Vec::new()))).unwrap();
    let mut lexer = lexer(rules, LexerOptions::default(), "x");
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Setup);
}

#[test]
fn snapshot_messages_backtrack() {
    let mut lexer = lexer(calc_rules(), LexerOptions::default(), "12 34");
    lexer.send_message("add_snapshot", &[]).unwrap();
    assert!(lexer.scan_token(&pattern(r"\d+")).unwrap());
    assert!(lexer.scan_token(&pattern(r"\d+")).unwrap());
    assert_eq!(lexer.lexeme(), "34");

    lexer.send_message("restore_snapshot", &[]).unwrap();
    assert_eq!(lexer.engine().scan_position(), 0);
    assert_eq!(lexer.complete_state(), (LineState::AtLineStart, RecognitionState::Ready));
    assert_eq!(lexer.engine().snapshots().len(), 0);

    let err = lexer.send_message("restore_snapshot", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    lexer.send_message("add_snapshot", &[]).unwrap();
    lexer.send_message("pop_snapshot", &[]).unwrap();
    assert!(lexer.engine().snapshots().is_empty());

    let entries = lexer.collect::<Result<Vec<_>>>().unwrap();
    assert_eq!(describe(&entries), ["INT:12", "INT:34", "EOS"]);
}

#[test]
fn rules_that_consume_nothing_still_make_progress() {
    let mut rules = registered();
    rules.add_rule(Rule::lookahead("main").otherwise(Action::clear())).unwrap();
    let entries = lex(rules, LexerOptions::default(), "ab");
    assert_eq!(
        describe(&entries),
        ["error: Rule 'main' consumed no input", "error: Rule 'main' consumed no input", "EOS"]
    );
    assert_eq!(entries[1].error().unwrap().position(), Some(LexemePosition::new(1, 1, 1).unwrap()));
}

#[test]
fn putback_lets_a_subrule_rescan() {
    let mut rules = registered();
    rules
        .add_rule(
            Rule::standard("main")
                .on_chars("0123456789", Action::sequence(vec![Action::putback(), Action::subrule("number")]).unwrap())
                .on_char('+', Action::enqueue('+')),
        )
        .unwrap();
    rules.add_rule(Rule::lookahead("number").on(pattern(r"\d+"), Action::enqueue("INT"))).unwrap();
    let entries = lex(rules, LexerOptions::default(), "10+203");
    assert_eq!(describe(&entries), ["INT:10", "'+':+", "INT:203", "EOS"]);
}

#[test]
fn empty_matches_do_not_count_as_progress() {
    let mut rules = registered();
    rules.add_rule(Rule::lookahead("main").on(pattern(r"\d*"), Action::enqueue("INT"))).unwrap();
    let entries = lex(rules, LexerOptions::default(), "a");
    assert_eq!(describe(&entries), ["INT:", "error: Rule 'main' consumed no input", "EOS"]);
    assert_eq!(entries[1].error().unwrap().position(), Some(LexemePosition::origin()));
}

#[test]
fn next_token_refuses_to_interrupt_a_token() {
    let mut lexer = lexer(calc_rules(), LexerOptions::default(), "12");
    lexer.send_message("next_char", &[]).unwrap();
    assert_eq!(lexer.complete_state().1, RecognitionState::Tokenizing);
    assert_eq!(lexer.next_token().unwrap_err().kind(), ErrorKind::Setup);

    assert_eq!(lexer.unknown_token().unwrap_err().kind(), ErrorKind::Lexical);
    assert_eq!(lexer.complete_state().1, RecognitionState::Failed);
    assert_eq!(lexer.next_token().unwrap_err().kind(), ErrorKind::Setup);
}

#[test]
fn word_boundaries_look_behind_the_scan_position() {
    let mut rules = registered();
    let word = Action::sequence(vec![
        Action::enqueue("IDENT"),
        Action::choice(pattern(r"\bif"), Action::enqueue("KEYWORD"), None),
    ])
    .unwrap();
    rules.add_rule(Rule::lookahead("main").on(pattern("[a-z]"), word)).unwrap();
    let entries = lex(rules, LexerOptions::default(), "xif");
    assert_eq!(describe(&entries), ["IDENT:x", "IDENT:i", "IDENT:f", "EOS"]);
}
