//! Console output for `barneys-pay`.
//!
//! Status lines go to stdout, errors to stderr. Values that are secrets
//! pass through [`mask`] before printing.

use colored::Colorize;

/// Width of the key column in [`key_value`] output.
const KEY_WIDTH: usize = 16;

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Section title, preceded by a blank line.
pub fn header(text: &str) {
    println!("\n{}", text.bold().underline());
}

/// One aligned `key: value` row.
pub fn key_value(key: &str, value: &str) {
    let label = format!("{}:", key);
    println!("  {} {}", pad(&label).cyan(), value);
}

pub fn separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// Pretty-printed processor response.
pub fn json(value: &serde_json::Value) {
    if let Ok(pretty) = serde_json::to_string_pretty(value) {
        println!("{}", pretty);
    }
}

/// Keep the first and last four characters of `secret`.
///
/// Secrets of eight characters or fewer are fully hidden.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn pad(label: &str) -> String {
    format!("{:<width$}", label, width = KEY_WIDTH)
}
