//! Terminal output: notification lines, result blocks and spinners.

use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use workflow::{Level, Notification, Notifier, ResultPresenter};

/// Prints notifications to stderr as they arrive.
#[derive(Debug)]
pub struct ConsoleNotifier {
    term: Term,
    errors: usize,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
            errors: 0,
        }
    }
}

impl ConsoleNotifier {
    /// Number of error notifications printed so far.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        if notification.level == Level::Error {
            self.errors += 1;
        }
        let _ = self.term.write_line(&format_notification(&notification));
    }
}

pub fn format_notification(notification: &Notification) -> String {
    match notification.level {
        Level::Success => format!("{} {}", style("✔").green().bold(), notification.message),
        Level::Error => format!("{} {}", style("✖").red().bold(), style(&notification.message).red()),
    }
}

/// Human-readable result block: badge, rendered summary, then the records.
pub fn format_results(presenter: &ResultPresenter<'_>) -> String {
    let mut out = String::new();
    out.push_str(&style(presenter.match_badge()).cyan().bold().to_string());
    out.push_str("\n\n");
    out.push_str(&presenter.render_summary());
    if presenter.match_count() > 0 {
        out.push_str("\n\n");
        out.push_str(&style("Matched records").bold().to_string());
        out.push('\n');
        match presenter.export_json() {
            Ok(json) => out.push_str(&json),
            Err(err) => out.push_str(&format!("(could not render records: {err})")),
        }
    }
    out
}

/// Spinner on stderr while a request is outstanding; hidden when stderr is
/// not a terminal.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
