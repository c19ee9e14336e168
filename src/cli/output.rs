//! Leveled, colorized progress lines. Everything goes to stderr so stdout
//! stays free for machine-readable output (`status --json`).

use colored::Colorize;

/// `✓ msg` in green.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// `⚠ msg` in yellow.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// `✗ msg` in red.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// `ℹ msg` in blue.
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Bold section title, preceded by a blank line.
pub fn header(msg: &str) {
    eprintln!();
    eprintln!("{}", msg.bold());
}

/// Braille spinner for long blocking operations such as downloads.
///
/// Hidden automatically when stderr is not a terminal. Call
/// `.finish_and_clear()` when done.
pub fn spinner(msg: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
