use std::time::Duration;

use crate::foundation::error::{FractalError, FractalResult};
use crate::fractal::escape::FractalView;
use crate::render::frame::FrameBuffer;
use crate::render::progress::ProgressTracker;

/// Fixed-size worker pool that renders one frame per call.
///
/// Each call is a fork-join: the frame's rows are split into `threads` strided sets, one task per
/// set, and the call returns only after every task has finished. Rows are disjoint, so workers
/// never synchronize on pixel data; the only shared state is the optional progress counter.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl WorkerPool {
    /// Build a pool with exactly `threads` worker threads.
    pub fn new(threads: usize) -> FractalResult<Self> {
        if threads == 0 {
            return Err(FractalError::invalid_args(
                "worker pool 'threads' must be >= 1",
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fractal-worker-{i}"))
            .build()
            .map_err(|e| FractalError::thread_spawn(format!("failed to build worker pool: {e}")))?;
        tracing::debug!(threads, "worker pool ready");
        Ok(Self { pool, threads })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Render `view` into `frame`, blocking until every row is written.
    pub fn render(&self, view: &FractalView, frame: &mut FrameBuffer) -> FractalResult<()> {
        self.run(view, frame, None, |_| {})
    }

    /// Render `view` into `frame` while reporting the completed-row fraction from the calling
    /// thread every time `tracker` changes or `interval` elapses.
    pub fn render_with_progress(
        &self,
        view: &FractalView,
        frame: &mut FrameBuffer,
        tracker: &ProgressTracker,
        interval: Duration,
        report: impl FnMut(f32),
    ) -> FractalResult<()> {
        tracker.reset();
        self.run(view, frame, Some((tracker, interval)), report)
    }

    fn run(
        &self,
        view: &FractalView,
        frame: &mut FrameBuffer,
        progress: Option<(&ProgressTracker, Duration)>,
        report: impl FnMut(f32),
    ) -> FractalResult<()> {
        if frame.width() != view.width || frame.height() != view.height {
            return Err(FractalError::invalid_args(format!(
                "frame size mismatch: buffer is {}x{}, view is {}x{}",
                frame.width(),
                frame.height(),
                view.width,
                view.height
            )));
        }
        let tracker = progress.map(|(t, _)| t);

        self.pool.in_place_scope(|scope| {
            for set in frame.partition_rows(self.threads) {
                scope.spawn(move |_| {
                    for (row, pixels) in set {
                        view.fill_row(row, pixels);
                        if let Some(t) = tracker {
                            t.row_done();
                        }
                    }
                });
            }
            if let Some((t, interval)) = progress {
                t.poll_until_done(interval, report);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
