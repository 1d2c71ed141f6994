use std::time::Duration;

use log::info;

/// Identifies a registered observer, for later removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) usize);

/// Receives progress notifications from a render.
///
/// Observers are called on the thread driving the render, never from the
/// worker threads, so they may keep plain mutable state.
pub trait ProgressObserver {
    /// Called after each batch of pixels, with the number of pixels finished
    /// so far out of `total`. The last call of a render has
    /// `completed == total`.
    fn on_progress(&mut self, completed: usize, total: usize);

    /// Called once the image is complete.
    fn on_complete(&mut self, elapsed: Duration);
}

/// Reports progress through the `log` facade.
///
/// Logs at `info` level whenever progress has advanced by at least
/// `update_frequency` percentage points since the last message, and when a
/// render reaches 100%.
#[derive(Clone, Debug, PartialEq)]
pub struct LogProgress {
    update_frequency: f64,
    last_percentage: f64,
}

impl Default for LogProgress {
    fn default() -> LogProgress {
        LogProgress::new(5.0)
    }
}

impl LogProgress {
    pub fn new(update_frequency: f64) -> LogProgress {
        LogProgress { update_frequency, last_percentage: 0.0 }
    }

    /// The percentage reported by the most recent message.
    pub fn last_percentage(&self) -> f64 {
        self.last_percentage
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }

        let percentage = completed as f64 / total as f64 * 100.0;

        // Progress went backwards: a new render has started
        if percentage < self.last_percentage {
            self.last_percentage = 0.0;
        }

        if percentage - self.last_percentage >= self.update_frequency
            || percentage >= 100.0 {
            info!("rendering: {:.1}% complete ({}/{} pixels)",
                percentage, completed, total);
            self.last_percentage = percentage;
        }
    }

    fn on_complete(&mut self, elapsed: Duration) {
        info!("rendering complete in {:.2} seconds", elapsed.as_secs_f64());
    }
}

/* Tests */

#[test]
fn log_progress_waits_for_threshold() {
    let mut p = LogProgress::default();

    p.on_progress(4, 100);
    assert_eq!(p.last_percentage(), 0.0);

    p.on_progress(5, 100);
    assert_eq!(p.last_percentage(), 5.0);

    p.on_progress(9, 100);
    assert_eq!(p.last_percentage(), 5.0);
}

#[test]
fn log_progress_always_reports_completion() {
    let mut p = LogProgress::new(50.0);

    p.on_progress(40, 100);
    assert_eq!(p.last_percentage(), 0.0);

    p.on_progress(60, 100);
    assert_eq!(p.last_percentage(), 60.0);

    // Only 40 points further, but completion is always reported
    p.on_progress(100, 100);
    assert_eq!(p.last_percentage(), 100.0);
}

#[test]
fn log_progress_restarts_with_new_render() {
    let mut p = LogProgress::default();
    p.on_progress(10, 10);
    assert_eq!(p.last_percentage(), 100.0);

    p.on_progress(1, 10);
    assert_eq!(p.last_percentage(), 10.0);
}

#[test]
fn log_progress_ignores_empty_renders() {
    let mut p = LogProgress::default();
    p.on_progress(0, 0);

    assert_eq!(p.last_percentage(), 0.0);
}
