//! Terminal output helpers.
//!
//! Colors are disabled when `NO_COLOR` is set.

use colored::Colorize;
use ddc_schema::Violation;
use std::env;

/// Turn colors off for the whole process if `NO_COLOR` is set.
pub fn init_colors() {
    if env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

pub fn pass(message: impl AsRef<str>) {
    println!("{} {}", "✓".green().bold(), message.as_ref());
}

pub fn fail(message: impl AsRef<str>) {
    eprintln!("{} {}", "✗".red().bold(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.as_ref());
}

pub fn heading(title: impl AsRef<str>) {
    println!("{}", title.as_ref().bold().underline());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", label.bold(), value);
}

/// Print every violation on its own line, naming the field and the check.
pub fn violations(source: &str, violations: &[Violation]) {
    fail(format!("{source}: {} schema violation(s)", violations.len()));
    for violation in violations {
        eprintln!("    {} {}", "-".red(), violation);
    }
}
