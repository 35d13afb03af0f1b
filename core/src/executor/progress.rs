use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::task::{Task, TaskResult};

use super::observer::RunObserver;

/// Terminal progress for a batch run: one overall bar plus a spinner per
/// in-flight task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<u32, ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    /// `enabled = false` yields a monitor that draws nothing, for
    /// non-interactive output.
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: Mutex::new(HashMap::new()),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    /// Spinner for a long-running loop with no known length, used by stress mode.
    pub fn spinner(message: impl Into<String>, enabled: bool) -> ProgressBar {
        if !enabled {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn finish(&self, passed: usize, failed: usize) {
        if !self.enabled {
            return;
        }
        let icon = if failed == 0 { "✅" } else { "❌" };
        self.overall
            .finish_with_message(format!("{icon} passed={passed} failed={failed}"));
    }

    pub fn clear(&self) {
        if self.enabled {
            self.overall.finish_and_clear();
        }
    }
}

impl RunObserver for ProgressMonitor {
    fn task_started(&self, task: &Task) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
        {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(format!("⏳ {} ({})", task.name, task.kind));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.task_bars.lock() {
            bars.insert(task.id, bar);
        }
    }

    fn task_finished(&self, result: &TaskResult) {
        if !self.enabled {
            return;
        }

        let bar = self
            .task_bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(&result.task_id));
        if let Some(bar) = bar {
            let icon = if result.pass { "✅" } else { "❌" };
            bar.finish_with_message(format!(
                "{} {} ({:.0}ms)",
                icon, result.name, result.duration_ms
            ));
        }

        self.overall.inc(1);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Ok(mut bars) = self.task_bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}
