use owo_colors::OwoColorize;

use threadwatch_core::{RunSummary, ThreadOutcome};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "threadwatch".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Deliver new messages from forum threads\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{step}/{total}]").dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the per-thread results of a run
pub fn print_summary(summary: &RunSummary) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Run Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for (title, outcome) in &summary.threads {
        let line = format!("{title}: {outcome}");
        match outcome {
            ThreadOutcome::Delivered { .. } => print_success(&line),
            ThreadOutcome::Unchanged { .. } => eprintln!("  {}", line.dimmed()),
            ThreadOutcome::Failed { .. } => print_error(&line),
        }
    }

    eprintln!(
        "\n  {} {}  {} {}\n",
        "Delivered:".dimmed(),
        summary.delivered().to_string().bright_white(),
        "Failed:".dimmed(),
        summary.failed().to_string().bright_white()
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
