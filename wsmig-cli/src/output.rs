//! Styled terminal output utilities.

use owo_colors::OwoColorize;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", "═".repeat(80).dimmed());
    println!("{}", text.bold().cyan());
    println!("{}", "═".repeat(80).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a step indicator
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a numbered list item
pub fn numbered_item(number: usize, text: &str) {
    println!("  {}. {}", number.to_string().dimmed(), text);
}

/// Print a check result line
pub fn check(passed: bool, text: &str) {
    if passed {
        println!("  {} {}", "✔".green().bold(), text);
    } else {
        println!("  {} {}", "✖".red().bold(), text.red());
    }
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Ask for confirmation
pub fn confirm(prompt: &str) -> bool {
    matches!(
        read_answer(&format!("{} {}", prompt, "[y/N]".dimmed())).as_deref(),
        Some("y" | "yes")
    )
}

/// Ask for an exact `yes`. Anything else, including `y`, declines.
pub fn confirm_exact(prompt: &str) -> bool {
    read_answer(&format!("{} {}", prompt, "(yes/no)".dimmed())).as_deref() == Some("yes")
}

fn read_answer(prompt: &str) -> Option<String> {
    use std::io::{self, Write};

    print!("{} ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_lowercase()),
    }
}
