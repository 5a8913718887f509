//! Shared CLI output formatting with colors, symbols, and structured display.

use crate::store::stats::ScoreBand;
use std::sync::OnceLock;

/// Global output switches from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSettings {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

static SETTINGS: OnceLock<OutputSettings> = OnceLock::new();

/// Install the switches for this process. Only the first call takes effect.
pub fn init(settings: OutputSettings) {
    let _ = SETTINGS.set(settings);
}

fn settings() -> OutputSettings {
    SETTINGS.get().copied().unwrap_or_default()
}

/// Check if color output is enabled.
pub fn color_enabled() -> bool {
    // Respect NO_COLOR env (https://no-color.org/)
    if std::env::var_os("NO_COLOR").is_some() || settings().no_color {
        return false;
    }
    atty_stderr()
}

/// Human output goes to stderr, so that is the stream to check.
fn atty_stderr() -> bool {
    unsafe { libc_isatty(2) != 0 }
}

#[cfg(unix)]
extern "C" {
    fn isatty(fd: std::os::raw::c_int) -> std::os::raw::c_int;
}

#[cfg(unix)]
unsafe fn libc_isatty(fd: i32) -> i32 {
    unsafe { isatty(fd) }
}

#[cfg(not(unix))]
unsafe fn libc_isatty(_fd: i32) -> i32 {
    0
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    /// Green checkmark symbol.
    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    /// Red X symbol.
    pub fn fail_sym(&self) -> &str {
        if self.use_color {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    /// Yellow warning symbol.
    pub fn warn_sym(&self) -> &str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    /// A score colored by its quality band.
    pub fn score(&self, score: u8) -> String {
        let text = format!("{score:>3}");
        match ScoreBand::of(score) {
            ScoreBand::Excellent => self.green(&text),
            ScoreBand::Good => self.cyan(&text),
            ScoreBand::Fair => self.yellow(&text),
            ScoreBand::Fallback => self.red(&text),
        }
    }
}

/// Print a branded header for CLI output.
pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("relink"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

/// Print a section header (e.g., "Catalog", "Locales").
pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// Print a check result line with symbol and label/value.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<16} {value}");
}

/// Print an indented detail/fix line under a check.
pub fn print_detail(msg: &str) {
    eprintln!("                        {msg}");
}

/// Format a duration in seconds into human-readable (e.g., "2m 14s").
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let m = secs / 60;
        let s = secs % 60;
        format!("{m}m {s}s")
    } else {
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{h}h {m}m")
    }
}

/// Check if --quiet mode is active.
pub fn is_quiet() -> bool {
    settings().quiet
}

/// Check if --verbose mode is active.
pub fn is_verbose() -> bool {
    settings().verbose
}

/// Check if --json mode is active.
pub fn is_json() -> bool {
    settings().json
}

/// Print JSON output to stdout and return.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(134), "2m 14s");
        assert_eq!(format_duration(7260), "2h 1m");
    }

    #[test]
    fn test_switches_default_off_until_initialized() {
        // Unit tests never call `init`, so every switch reads as off.
        assert!(!is_json());
        assert!(!is_quiet());
        assert!(!is_verbose());
        assert_eq!(settings(), OutputSettings::default());
    }

    #[test]
    fn test_plain_styles() {
        let s = Styled { use_color: false };
        assert_eq!(s.ok_sym(), "OK");
        assert_eq!(s.bold("x"), "x");
        assert_eq!(s.score(95), " 95");
    }
}
