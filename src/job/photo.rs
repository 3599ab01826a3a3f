use std::path::PathBuf;
use std::sync::Arc;

use crate::encode::png::write_png;
use crate::foundation::core::FractalConfig;
use crate::foundation::error::FractalResult;
use crate::fractal::escape::FractalView;
use crate::fractal::palette::Palette;
use crate::render::frame::FrameBuffer;
use crate::render::pool::WorkerPool;
use crate::render::progress::{PROGRESS_POLL_INTERVAL, ProgressTracker};

/// Everything a still-image job needs, captured when the job is accepted.
#[derive(Clone, Debug)]
pub(crate) struct PhotoJob {
    pub(crate) config: FractalConfig,
    pub(crate) palette: Arc<Palette>,
    pub(crate) path: PathBuf,
    pub(crate) progress: bool,
}

/// Render `config` with `palette` into a fresh frame using `config.threads` workers.
pub(crate) fn render_still(
    config: &FractalConfig,
    palette: Arc<Palette>,
    progress: Option<&mut dyn FnMut(f32)>,
) -> FractalResult<FrameBuffer> {
    let pool = WorkerPool::new(config.threads)?;
    let view = FractalView::from_config(config, palette);
    let mut frame = FrameBuffer::new(config.width, config.height)?;
    match progress {
        Some(report) => {
            let tracker = ProgressTracker::new(config.height);
            pool.render_with_progress(
                &view,
                &mut frame,
                &tracker,
                PROGRESS_POLL_INTERVAL,
                report,
            )?;
        }
        None => pool.render(&view, &mut frame)?,
    }
    Ok(frame)
}

/// Still-image pipeline: one pool pass, then a lossless PNG.
#[tracing::instrument(skip(job, report), fields(path = %job.path.display(), width = job.config.width, height = job.config.height))]
pub(crate) fn run_photo(job: &PhotoJob, mut report: impl FnMut(f32)) -> FractalResult<PathBuf> {
    let progress: Option<&mut dyn FnMut(f32)> = if job.progress {
        Some(&mut report)
    } else {
        None
    };
    let frame = render_still(&job.config, job.palette.clone(), progress)?;
    write_png(&frame, &job.path)?;
    Ok(job.path.clone())
}

#[cfg(test)]
#[path = "../../tests/unit/job/photo.rs"]
mod tests;
