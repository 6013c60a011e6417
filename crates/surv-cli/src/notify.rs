/*
[INPUT]:  Toasts raised by the login flow and session manager
[OUTPUT]: Styled terminal lines and matching log events
[POS]:    Presentation layer - terminal notifications
[UPDATE]: When toast levels or styling change
*/

use console::style;
use surv_client::{Notifier, ToastLevel};
use tracing::{info, warn};

/// Prints toasts to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

pub fn render(level: ToastLevel, message: &str) -> String {
    let label = match level {
        ToastLevel::Success => style("✔").green().bold(),
        ToastLevel::Info => style("ℹ").cyan().bold(),
        ToastLevel::Warning => style("!").yellow().bold(),
        ToastLevel::Error => style("✘").red().bold(),
    };
    format!("{label} {message}")
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Warning | ToastLevel::Error => warn!(?level, message, "toast"),
            ToastLevel::Success | ToastLevel::Info => info!(?level, message, "toast"),
        }
        eprintln!("{}", render(level, message));
    }
}
