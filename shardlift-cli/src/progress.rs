///! Spinner that follows workflow steps

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use shardlift_core::{Step, WorkflowObserver};
use std::time::Duration;

pub struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    /// Visible spinner, or a hidden one when output must stay machine readable
    pub fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                spinner: ProgressBar::hidden(),
            };
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {elapsed:.dim}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self { spinner }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl WorkflowObserver for SpinnerObserver {
    fn on_step(&self, step: Step) {
        let (n, total) = step.position();
        self.spinner
            .println(format!("{} {}", format!("[{}/{}]", n, total).cyan().bold(), step.describe()));
        self.spinner.set_message(step.describe());
    }

    fn on_poll(&self, condition: &str, attempt: u32) {
        self.spinner
            .set_message(format!("waiting for {} (check {} failed)", condition, attempt));
    }
}

impl Drop for SpinnerObserver {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
