use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::foundation::core::{FractalConfig, VideoParams};
use crate::foundation::error::{FractalError, FractalResult};
use crate::fractal::palette::PaletteCache;
use crate::job::cancel::CancellationToken;
use crate::job::events::{JobEvent, JobHandle, JobKind, JobOutcome};
use crate::job::photo::{PhotoJob, run_photo};
use crate::job::state::{BusyGuard, JobState, JobStateCell};
use crate::job::video::{VideoJob, run_video};

#[derive(Debug, Default)]
struct Shared {
    state: Arc<JobStateCell>,
    palettes: Mutex<PaletteCache>,
    stop: Mutex<CancellationToken>,
}

/// Single-flight entry point for render jobs.
///
/// At most one job runs at a time. A request made while a job is running is rejected with
/// [`FractalError::Busy`]; it is never queued and never affects the running job. Accepted jobs run
/// on their own thread and report back through the returned [`JobHandle`].
///
/// Cloning yields another handle to the same controller.
#[derive(Clone, Debug, Default)]
pub struct JobController {
    shared: Arc<Shared>,
}

impl JobController {
    /// New idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.shared.state.load()
    }

    /// Number of palette tables built so far. Jobs with an unchanged iteration cap reuse the
    /// previous table.
    pub fn palette_builds(&self) -> u64 {
        self.shared.palettes.lock().builds()
    }

    /// Start rendering one still image of `config` into the PNG file at `path`.
    ///
    /// With `progress`, the handle receives `Progress(0.0)` immediately and then the completed-row
    /// fraction while the frame renders.
    pub fn begin_photo(
        &self,
        config: &FractalConfig,
        path: impl AsRef<Path>,
        progress: bool,
    ) -> FractalResult<JobHandle> {
        let path = path.as_ref();
        require_path(path)?;
        config.validate()?;
        let guard = self.acquire("photo")?;

        let config = config.clone();
        let palette = self.shared.palettes.lock().get(config.max_iterations);
        let (tx, rx) = crossbeam_channel::unbounded();
        if progress {
            let _ = tx.send(JobEvent::Progress(0.0));
        }
        let job = PhotoJob {
            config,
            palette,
            path: path.to_path_buf(),
            progress,
        };
        tracing::info!(path = %path.display(), progress, "photo job accepted");

        spawn_job("fractal-photo", move || {
            let result = run_photo(&job, |p| {
                let _ = tx.send(JobEvent::Progress(p));
            });
            complete(guard, &tx, result);
        });
        Ok(JobHandle::new(JobKind::Photo, rx))
    }

    /// Start a zooming video of `config` into `path`.
    ///
    /// The handle receives `Progress(0.0)` immediately and then, once per frame, the seconds of
    /// video written so far. The job runs until [`Self::request_stop_video`] or until
    /// `params.frame_limit` frames are written, then finalizes the file.
    pub fn begin_video(
        &self,
        config: &FractalConfig,
        params: VideoParams,
        path: impl AsRef<Path>,
    ) -> FractalResult<JobHandle> {
        let path = path.as_ref();
        require_path(path)?;
        config.validate()?;
        params.validate()?;
        let guard = self.acquire("video")?;

        let stop = CancellationToken::new();
        *self.shared.stop.lock() = stop.clone();

        let config = config.clone();
        let palette = self.shared.palettes.lock().get(config.max_iterations);
        let (tx, rx) = crossbeam_channel::unbounded();
        let _ = tx.send(JobEvent::Progress(0.0));
        let job = VideoJob {
            config,
            palette,
            params,
            path: path.to_path_buf(),
        };
        tracing::info!(
            path = %path.display(),
            zoom_start = params.zoom_start,
            zoom_step = params.zoom_step,
            framerate = params.framerate,
            "video job accepted"
        );

        spawn_job("fractal-video", move || {
            let result = run_video(&job, &stop, |secs| {
                let _ = tx.send(JobEvent::Progress(secs));
            });
            complete(guard, &tx, result);
        });
        Ok(JobHandle::new(JobKind::Video, rx))
    }

    /// Ask the running video job to stop after its current frame and finalize. Idempotent, and a
    /// no-op when no video job is running.
    pub fn request_stop_video(&self) {
        self.shared.stop.lock().cancel();
        tracing::info!("video stop requested");
    }

    fn acquire(&self, kind: &str) -> FractalResult<BusyGuard> {
        self.shared.state.try_acquire().ok_or_else(|| {
            tracing::warn!(kind, "job rejected: another job is running");
            FractalError::Busy
        })
    }
}

fn require_path(path: &Path) -> FractalResult<()> {
    if path.as_os_str().is_empty() {
        return Err(FractalError::invalid_args("output filename must not be empty"));
    }
    Ok(())
}

fn spawn_job(name: &str, body: impl FnOnce() + Send + 'static) {
    if let Err(e) = std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(body)
    {
        super::fatal(&FractalError::thread_spawn(format!(
            "failed to spawn {name} thread: {e}"
        )));
    }
}

/// Release the controller, then report the outcome. The order lets a caller that reacts to the
/// completion event start the next job straight away.
fn complete(guard: BusyGuard, tx: &Sender<JobEvent>, result: FractalResult<std::path::PathBuf>) {
    let outcome = match result {
        Ok(path) => {
            tracing::info!(path = %path.display(), "job saved");
            JobOutcome::Saved(path)
        }
        Err(e @ FractalError::ThreadSpawn(_)) => super::fatal(&e),
        Err(e) => {
            tracing::error!(error = %e, "job failed");
            JobOutcome::Failed(e.to_string())
        }
    };
    drop(guard);
    let _ = tx.send(JobEvent::Complete(outcome));
}

#[cfg(test)]
#[path = "../../tests/unit/job/controller.rs"]
mod tests;
