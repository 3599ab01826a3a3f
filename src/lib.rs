//! Mandelbrot and Julia set renderer with still-image and zooming-video output.
//!
//! # Pipeline overview
//!
//! 1. **Configure**: a [`FractalConfig`] (view center, zoom, Julia seed, size, iteration cap,
//!    worker count), usually loaded from JSON.
//! 2. **Render**: a [`FractalView`] maps pixels to the complex plane; a [`WorkerPool`] splits the
//!    frame into strided row sets and fills them in parallel, optionally reporting progress.
//! 3. **Encode**: stills become PNG files; video frames go through an [`EncodeSequencer`] that
//!    interleaves them with a silent placeholder audio track and writes an AVI container, which
//!    [`VideoSession`] either keeps or streams into the system `ffmpeg` for HEVC/H.264 output.
//! 4. **Jobs**: a [`JobController`] runs one job at a time on a background thread and streams
//!    [`JobEvent`]s back through a [`JobHandle`].
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single flight**: a request made while a job runs is rejected with [`FractalError::Busy`].
//! - **Frame-boundary cancellation**: a video stop takes effect after the frame in progress.
//! - **Deterministic pixels**: output does not depend on the worker count.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod encode;
mod foundation;
mod fractal;
mod job;
mod render;

pub use encode::audio::{
    AUDIO_CHANNELS, AUDIO_FRAME_SIZE, AUDIO_SAMPLE_RATE, AudioFormat, PcmEncoder, PlanarAudio,
    SampleConverter, TONE_FREQUENCY_HZ, TONE_VOLUME, ToneSource,
};
pub use encode::avi::{AviMuxer, AviStreamMuxer, SEGMENT_LIMIT, SUPER_INDEX_ENTRIES};
pub use encode::codec::{Encoder, Packet, Received, StreamKind};
pub use encode::ffmpeg::{
    FfmpegOpts, FfmpegPipe, VIDEO_CODECS, VIDEO_CRF, ensure_parent_dir, ffmpeg_has_encoder,
    is_ffmpeg_on_path, pick_video_codec,
};
pub use encode::mux::{DEFAULT_COPYRIGHT, InMemoryMuxer, Metadata, Muxer, StreamDesc};
pub use encode::png::write_png;
pub use encode::sequencer::{EncodeSequencer, FrameSink};
pub use encode::session::{VideoSession, is_avi_path};
pub use encode::video::{RawVideoEncoder, YuvFrame, rgb24_to_yuv420p};
pub use foundation::core::{FractalConfig, Rgb8, VideoParams};
pub use foundation::error::{FractalError, FractalResult};
pub use foundation::math::{TimeBase, compare_ts};
pub use fractal::escape::{BAILOUT_SQ, FractalView, Variant, escape_iterations};
pub use fractal::palette::{Palette, PaletteCache};
pub use job::cancel::CancellationToken;
pub use job::controller::JobController;
pub use job::events::{JobEvent, JobHandle, JobKind, JobOutcome};
pub use job::state::JobState;
pub use render::frame::{BYTES_PER_PIXEL, FrameBuffer, RowSet};
pub use render::pool::WorkerPool;
pub use render::progress::{PROGRESS_POLL_INTERVAL, ProgressTracker};
