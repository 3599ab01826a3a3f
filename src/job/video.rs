use std::path::PathBuf;
use std::sync::Arc;

use crate::encode::mux::Metadata;
use crate::encode::sequencer::FrameSink;
use crate::encode::session::VideoSession;
use crate::foundation::core::{FractalConfig, VideoParams};
use crate::foundation::error::FractalResult;
use crate::fractal::escape::FractalView;
use crate::fractal::palette::Palette;
use crate::job::cancel::CancellationToken;
use crate::render::frame::FrameBuffer;
use crate::render::pool::WorkerPool;

/// Everything a video job needs, captured when the job is accepted.
#[derive(Clone, Debug)]
pub(crate) struct VideoJob {
    pub(crate) config: FractalConfig,
    pub(crate) palette: Arc<Palette>,
    pub(crate) params: VideoParams,
    pub(crate) path: PathBuf,
}

/// Frames produced by a finished zoom loop, plus whatever the sink returned.
#[derive(Debug)]
pub(crate) struct ZoomSummary<T> {
    pub(crate) output: T,
    pub(crate) frames: u64,
}

/// Render zoom frames into `sink` until `stop` is set or the frame limit is reached, then
/// finish the sink.
///
/// `stop` is checked once per frame, before rendering. After each submitted frame `on_frame`
/// receives the seconds of video written so far. A submission error returns immediately and
/// drops the sink without finishing it.
pub(crate) fn run_zoom<S: FrameSink>(
    pool: &WorkerPool,
    mut view: FractalView,
    params: &VideoParams,
    mut sink: S,
    stop: &CancellationToken,
    mut on_frame: impl FnMut(f32),
) -> FractalResult<ZoomSummary<S::Output>> {
    let mut frame = FrameBuffer::new(view.width, view.height)?;
    let mut zoom = params.first_frame_zoom();
    view.set_zoom(zoom);

    let mut frames = 0u64;
    while !stop.is_cancelled() && params.frame_limit.is_none_or(|limit| frames < limit) {
        pool.render(&view, &mut frame)?;
        let pts = sink.push_frame(&frame)?;
        frames += 1;
        tracing::debug!(frame = frames, zoom, "frame submitted");
        on_frame(pts as f32 / params.framerate as f32);

        zoom *= params.zoom_step;
        view.set_zoom(zoom);
    }

    let output = sink.finish()?;
    Ok(ZoomSummary { output, frames })
}

/// Video pipeline: open the output, run the zoom loop, finalize.
#[tracing::instrument(skip(job, stop, on_frame), fields(path = %job.path.display(), framerate = job.params.framerate))]
pub(crate) fn run_video(
    job: &VideoJob,
    stop: &CancellationToken,
    on_frame: impl FnMut(f32),
) -> FractalResult<PathBuf> {
    let pool = WorkerPool::new(job.config.threads)?;
    let view = FractalView::from_config(&job.config, job.palette.clone());
    let session = VideoSession::create(
        &job.path,
        job.config.width,
        job.config.height,
        job.params.framerate,
        Metadata::titled(job.config.title()),
    )?;

    match run_zoom(&pool, view, &job.params, session, stop, on_frame) {
        Ok(summary) => {
            tracing::info!(frames = summary.frames, "video finished");
            Ok(summary.output)
        }
        Err(e) => {
            // The stream is broken; a truncated file is not a usable result.
            let _ = std::fs::remove_file(&job.path);
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/video.rs"]
mod tests;
