//! Styled terminal output utilities.

use owo_colors::OwoColorize;

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

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Announce a change-set about to run
pub fn running(file: &str) {
    println!("  {} Running {}", "→".bold(), file);
}

/// Report a change-set that completed
pub fn applied(file: &str, duration_ms: i64) {
    println!(
        "  {} {} completed in {}ms",
        "✔".green().bold(),
        file.green(),
        duration_ms
    );
}

/// Report the change-set that failed
pub fn failed(file: &str) {
    eprintln!(
        "  {} {} failed - halting the batch",
        "✖".red().bold(),
        file.red()
    );
}

/// Report a change-set that was never attempted because an earlier one failed
pub fn not_attempted(file: &str) {
    println!("  {} {} not attempted", "•".dimmed(), file.dimmed());
}
