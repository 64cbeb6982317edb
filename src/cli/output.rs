//! Terminal output for tagtree commands.
//!
//! Data (JSON, ASCII trees, root lists) goes to stdout uncolored so it can be
//! piped; status and errors are colored. `colored` honors NO_COLOR and
//! CLICOLOR_FORCE.

use std::fmt::Display;

use colored::Colorize;

use crate::domain::TagId;

/// Red bold "error:" line on stderr
pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Yellow "warning:" line on stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Heading of one report category with its entry count
pub fn section(category: &str, count: usize) {
    println!("{} {}", category.cyan().bold(), format!("({count})").dimmed());
}

/// One offending entry below a section
pub fn issue(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

/// One tag as `name (id)`, the same label the ASCII tree uses
pub fn tag(name: &str, id: &TagId) {
    println!("{} {}", name, format!("({id})").dimmed());
}

/// Raw payload
pub fn data(payload: &(impl Display + ?Sized)) {
    println!("{}", payload);
}
