use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::encode::avi::{AviMuxer, AviStreamMuxer};
use crate::encode::codec::Packet;
use crate::encode::ffmpeg::{
    FfmpegOpts, FfmpegPipe, ensure_parent_dir, is_ffmpeg_on_path, pick_video_codec,
};
use crate::encode::mux::{Metadata, Muxer, StreamDesc};
use crate::encode::sequencer::{EncodeSequencer, FrameSink};
use crate::foundation::error::{FractalError, FractalResult};
use crate::render::frame::FrameBuffer;

/// Where the sequencer's packets go.
#[derive(Debug)]
enum Container {
    /// The requested `.avi` file itself.
    File(AviMuxer<BufWriter<File>>),
    /// An AVI stream into ffmpeg, which writes the requested container.
    Pipe(AviStreamMuxer<BufWriter<FfmpegPipe>>),
}

impl Container {
    fn close(self) -> FractalResult<()> {
        match self {
            Self::File(muxer) => {
                muxer.into_inner().into_inner().map_err(|e| {
                    FractalError::encode_write(format!("failed to flush video file: {}", e.error()))
                })?;
                Ok(())
            }
            Self::Pipe(muxer) => {
                let pipe = muxer.into_inner().into_inner().map_err(|e| {
                    FractalError::encode_write(format!("failed to flush ffmpeg input: {}", e.error()))
                })?;
                pipe.finish()
            }
        }
    }
}

impl Muxer for Container {
    fn write_header(&mut self, streams: &[StreamDesc], metadata: &Metadata) -> FractalResult<()> {
        match self {
            Self::File(m) => m.write_header(streams, metadata),
            Self::Pipe(m) => m.write_header(streams, metadata),
        }
    }

    fn write_packet(&mut self, packet: &Packet) -> FractalResult<()> {
        match self {
            Self::File(m) => m.write_packet(packet),
            Self::Pipe(m) => m.write_packet(packet),
        }
    }

    fn write_trailer(&mut self) -> FractalResult<()> {
        match self {
            Self::File(m) => m.write_trailer(),
            Self::Pipe(m) => m.write_trailer(),
        }
    }
}

/// Whether `path` asks for the native AVI container.
pub fn is_avi_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avi"))
}

/// One open video output: the sequencer writing into the requested file.
///
/// `.avi` paths are written directly, growing into OpenDML segments past 1 GiB. Any other
/// extension is streamed as AVI into an `ffmpeg` process that encodes the requested container as
/// frames arrive; that needs `ffmpeg` on `PATH` with an HEVC or H.264 encoder, checked up front.
#[derive(Debug)]
pub struct VideoSession {
    sequencer: EncodeSequencer<Container>,
    output: PathBuf,
}

impl VideoSession {
    /// Open `output` for `width × height` frames at `framerate`.
    #[tracing::instrument(skip(output, metadata), fields(output = %output.display()))]
    pub fn create(
        output: &Path,
        width: u32,
        height: u32,
        framerate: u32,
        metadata: Metadata,
    ) -> FractalResult<Self> {
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(FractalError::encoder_init(
                "video width/height must be even (required for yuv420p output)",
            ));
        }
        ensure_parent_dir(output).map_err(|e| FractalError::encoder_init(e.to_string()))?;

        let container = if is_avi_path(output) {
            let file = File::create(output).map_err(|e| {
                FractalError::encoder_init(format!("failed to create '{}': {e}", output.display()))
            })?;
            Container::File(AviMuxer::new(BufWriter::new(file))?)
        } else {
            if !is_ffmpeg_on_path() {
                return Err(FractalError::encoder_init(format!(
                    "ffmpeg is required to write '{}', but was not found on PATH (use a .avi output instead)",
                    output.display()
                )));
            }
            let video_codec = pick_video_codec().ok_or_else(|| {
                FractalError::encoder_init("ffmpeg has neither libx265 nor libx264 available")
            })?;
            let pipe = FfmpegPipe::spawn(&FfmpegOpts {
                output: output.to_path_buf(),
                framerate,
                video_codec,
                metadata: metadata.clone(),
            })?;
            Container::Pipe(AviStreamMuxer::new(BufWriter::new(pipe)))
        };

        let sequencer = EncodeSequencer::new(container, width, height, framerate, &metadata)?;
        tracing::info!(width, height, framerate, "video output opened");

        Ok(Self {
            sequencer,
            output: output.to_path_buf(),
        })
    }

    /// Final output path.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl FrameSink for VideoSession {
    type Output = PathBuf;

    fn push_frame(&mut self, frame: &FrameBuffer) -> FractalResult<i64> {
        self.sequencer.push_frame(frame)
    }

    fn finish(self) -> FractalResult<PathBuf> {
        self.sequencer.finish()?.close()?;
        tracing::info!(output = %self.output.display(), "video output finalized");
        Ok(self.output)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/session.rs"]
mod tests;
