mod token_report;

use rulelex::{LexerFlags, demo, tokenize_with};
use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(config: &CliConfig) -> rulelex::Result<()> {
    let ruleset = demo::json_ruleset()?;
    if config.declare {
        ruleset
            .declare_tokens(&mut io::stdout().lock())
            .map_err(|err| rulelex::LexerError::setup(format!("failed to write declarations: {err}")))?;
        return Ok(());
    }

    let mut options = demo::json_options()?;
    if config.eol_tokens {
        options.flags |= LexerFlags::EOL_AS_TOKEN;
    }
    let res = tokenize_with(Arc::new(ruleset), &config.input, options)?;
    token_report::print_run(&res, config.color);
    Ok(())
}

struct CliConfig {
    input: String,
    eol_tokens: bool,
    declare: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut eol_tokens = false;
    let mut declare = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rulelex {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--eol" => eol_tokens = true,
            "--declare" => declare = true,
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    if declare {
        return Ok(CliConfig { input: input.unwrap_or_default(), eol_tokens, declare, color });
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, eol_tokens, declare, color })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rulelex {version}

Tokenizes JSON text with the demo rule table and prints the token stream.

Usage:
  rulelex [OPTIONS] [--] <input...>
  rulelex [OPTIONS] --input <text>
  rulelex --declare

Options:
  -i, --input <text>         Input text to tokenize. If omitted, reads remaining
                             args or stdin when no args are provided.
  --eol                      Report line ends as T_EOL tokens.
  --declare                  Print the parser token declaration and exit.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success (lexical errors are part of the report).
  1  Lexer setup or internal error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
