use rulelex::{TokenEntry, TokenizeResult};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(res: &TokenizeResult, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Tokenizing: {:?}", preview(&res.text)), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tokens ━━━", ansi::GRAY));
    for (idx, entry) in res.entries.iter().enumerate() {
        println!("  {} {}", palette.paint(format!("[{idx}]"), ansi::GRAY), fmt_entry(entry, &palette));
    }

    let errors = res.errors().count();
    if errors > 0 {
        println!("\n{}", palette.paint(format!("{errors} lexical error(s)"), ansi::RED));
    }

    println!("\n{}", palette.paint("━━━ Stats ━━━", ansi::GRAY));
    let stats = &res.stats;
    println!(
        "  Rules: {}  │  Tokens: {}  │  Dropped: {}  │  Errors: {}",
        palette.paint(stats.rules_applied.to_string(), ansi::BLUE),
        palette.paint(stats.tokens_emitted.to_string(), ansi::GREEN),
        palette.dim(stats.tokens_dropped.to_string()),
        palette.paint(stats.errors_captured.to_string(), if errors > 0 { ansi::RED } else { ansi::GREEN }),
    );
    println!(
        "  Total: {}  │  Scanning: {}",
        palette.paint(format!("{:?}", res.elapsed), ansi::GREEN),
        palette.paint(format!("{:?}", stats.scan_time), ansi::CYAN),
    );
    println!();
}

fn fmt_entry(entry: &TokenEntry, palette: &ansi::Palette) -> String {
    match entry {
        TokenEntry::Token(token_type, token) => format!(
            "{} {} {} {}",
            palette.bold(palette.paint(token_type.to_string(), ansi::BLUE)),
            palette.paint(format!("{:?}", token.lexeme), ansi::GREEN),
            palette.dim(format!("= {}", token.value)),
            palette.paint(format!("@ {}", token.position), ansi::YELLOW),
        ),
        TokenEntry::Eos(token) => {
            format!("{} {}", palette.dim("end of stream"), palette.paint(format!("@ {}", token.position), ansi::YELLOW))
        }
        TokenEntry::Error(err) => palette.paint(format!("✗ {err}"), ansi::RED),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}
