use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::pipeline::PipelineObserver;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}";

/// Terminal progress for a translation run
pub struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }

    /// Observer that tracks progress without drawing, for non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ConsoleObserver {
    fn item_done(&self, original: &str, translated: &str, _success: bool) {
        debug!("{} -> {}", original, translated);
    }

    fn item_error(&self, original: &str, error: &str) {
        debug!("Translation error for '{}': {}", original, error);
    }

    fn progress(&self, done: usize, total: usize, label: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
        self.bar.set_message(label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_progress_events() {
        let observer = ConsoleObserver::hidden();
        observer.progress(0, 4, "Translating mod... 0/4");
        observer.item_done("a", "A", true);
        observer.progress(2, 4, "Translating mod... 2/4");

        assert_eq!(observer.position(), 2);
        assert_eq!(observer.length(), Some(4));
    }
}
