use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Default wake-up interval for [`ProgressTracker::poll_until_done`].
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared completed-row counter.
///
/// Workers bump it once per finished row while the controlling thread polls it. The mutex is held
/// only for the increment; contention is per row, never per pixel.
#[derive(Debug)]
pub struct ProgressTracker {
    total_rows: u32,
    done: Mutex<u32>,
    changed: Condvar,
}

impl ProgressTracker {
    /// Tracker for a frame of `total_rows` rows.
    pub fn new(total_rows: u32) -> Self {
        Self {
            total_rows,
            done: Mutex::new(0),
            changed: Condvar::new(),
        }
    }

    /// Record one finished row.
    pub fn row_done(&self) {
        let mut done = self.done.lock();
        *done += 1;
        drop(done);
        self.changed.notify_one();
    }

    /// Rows finished so far.
    pub fn completed(&self) -> u32 {
        *self.done.lock()
    }

    /// Rows in the frame.
    pub fn total(&self) -> u32 {
        self.total_rows
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total_rows == 0 {
            return 1.0;
        }
        self.completed() as f32 / self.total_rows as f32
    }

    /// Reset the counter before reusing the tracker for another frame.
    pub fn reset(&self) {
        *self.done.lock() = 0;
    }

    /// Report the fraction to `report` on every wake-up until all rows are done.
    ///
    /// Wakes when a row completes or after `interval`, whichever comes first. The final 1.0 is not
    /// reported here; the pool join is the authoritative completion signal.
    pub fn poll_until_done(&self, interval: Duration, mut report: impl FnMut(f32)) {
        let mut done = self.done.lock();
        while *done < self.total_rows {
            let fraction = *done as f32 / self.total_rows as f32;
            drop(done);
            report(fraction);
            done = self.done.lock();
            if *done < self.total_rows {
                let _ = self.changed.wait_for(&mut done, interval);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/progress.rs"]
mod tests;
