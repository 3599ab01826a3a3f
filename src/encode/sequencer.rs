use std::cmp::Ordering;

use crate::encode::audio::{
    AUDIO_FRAME_SIZE, AudioFormat, PcmEncoder, PlanarAudio, SampleConverter, ToneSource,
};
use crate::encode::codec::{Encoder, Received};
use crate::encode::mux::{Metadata, Muxer, StreamDesc};
use crate::encode::video::{RawVideoEncoder, YuvFrame, rgb24_to_yuv420p};
use crate::foundation::error::{FractalError, FractalResult};
use crate::foundation::math::{TimeBase, compare_ts};
use crate::render::frame::FrameBuffer;

/// Sink contract for consuming rendered frames in presentation order.
///
/// Ordering contract: `push_frame` is called once per frame in presentation order, then `finish`
/// exactly once. `finish` consumes the sink, so a second finalize cannot be expressed.
pub trait FrameSink {
    /// Value produced by a successful `finish`.
    type Output;

    /// Submit one frame. Returns the next video timestamp (frames written so far).
    fn push_frame(&mut self, frame: &FrameBuffer) -> FractalResult<i64>;

    /// Flush everything and close the output.
    fn finish(self) -> FractalResult<Self::Output>;
}

/// Interleaves the video frames with the placeholder audio track and hands packets to a muxer in
/// non-decreasing presentation-time order.
#[derive(Debug)]
pub struct EncodeSequencer<M: Muxer> {
    muxer: M,
    video: RawVideoEncoder,
    audio: PcmEncoder,
    tone: ToneSource,
    converter: SampleConverter,
    video_tb: TimeBase,
    audio_tb: TimeBase,
    yuv: YuvFrame,
    audio_frame: PlanarAudio,
    scratch: Vec<i16>,
    video_pts: i64,
    audio_pts: i64,
}

impl<M: Muxer> EncodeSequencer<M> {
    /// Set up both encoders and write the container header.
    ///
    /// Every failure here is [`FractalError::EncoderInit`]; nothing has been encoded yet.
    pub fn new(
        mut muxer: M,
        width: u32,
        height: u32,
        framerate: u32,
        metadata: &Metadata,
    ) -> FractalResult<Self> {
        let video = RawVideoEncoder::new(width, height, framerate)?;
        let yuv = YuvFrame::new(width, height)?;

        let format = AudioFormat::STEREO_44K;
        let audio = PcmEncoder::new(format, AUDIO_FRAME_SIZE)?;
        let converter = SampleConverter::new(format, format)?;

        let streams = [
            StreamDesc::Video {
                width,
                height,
                framerate,
            },
            StreamDesc::Audio {
                sample_rate: format.sample_rate,
                channels: format.channels,
            },
        ];
        muxer.write_header(&streams, metadata).map_err(|e| match e {
            FractalError::EncodeWrite(msg) => FractalError::EncoderInit(msg),
            other => other,
        })?;

        tracing::debug!(width, height, framerate, "encode sequencer ready");
        Ok(Self {
            muxer,
            video_tb: video.time_base(),
            audio_tb: audio.time_base(),
            video,
            tone: ToneSource::placeholder(format),
            converter,
            yuv,
            audio_frame: PlanarAudio::new(format.channels, AUDIO_FRAME_SIZE),
            scratch: vec![0; AUDIO_FRAME_SIZE * usize::from(format.channels)],
            audio,
            video_pts: 0,
            audio_pts: 0,
        })
    }

    /// Next video timestamp, in frames.
    pub fn video_pts(&self) -> i64 {
        self.video_pts
    }

    /// Next audio timestamp, in samples.
    pub fn audio_pts(&self) -> i64 {
        self.audio_pts
    }

    /// Borrow the muxer.
    pub fn muxer(&self) -> &M {
        &self.muxer
    }

    /// Catch audio up to the video clock, then encode and write `frame`.
    pub fn submit_frame(&mut self, frame: &FrameBuffer) -> FractalResult<i64> {
        while compare_ts(self.audio_pts, self.audio_tb, self.video_pts, self.video_tb)
            == Ordering::Less
        {
            self.write_audio_frame()?;
        }

        rgb24_to_yuv420p(frame, &mut self.yuv)?;
        self.yuv.pts = self.video_pts;
        self.video_pts += 1;
        self.video.send_frame(Some(&self.yuv))?;
        drain_into(&mut self.video, &mut self.muxer)?;
        tracing::trace!(pts = self.yuv.pts, "video frame written");
        Ok(self.video_pts)
    }

    fn write_audio_frame(&mut self) -> FractalResult<()> {
        self.tone.fill(self.audio_pts, &mut self.scratch);
        self.converter.convert(&self.scratch, &mut self.audio_frame)?;
        self.audio_frame.pts = self.audio_pts;
        self.audio_pts += AUDIO_FRAME_SIZE as i64;
        self.audio.send_frame(Some(&self.audio_frame))?;
        drain_into(&mut self.audio, &mut self.muxer)
    }

    /// Flush audio, then video, then write the trailer. Returns the muxer.
    pub fn finalize(mut self) -> FractalResult<M> {
        self.audio.send_frame(None)?;
        drain_into(&mut self.audio, &mut self.muxer)?;
        self.video.send_frame(None)?;
        drain_into(&mut self.video, &mut self.muxer)?;
        self.muxer.write_trailer()?;
        tracing::debug!(
            frames = self.video_pts,
            samples = self.audio_pts,
            "encode sequencer finalized"
        );
        Ok(self.muxer)
    }
}

impl<M: Muxer> FrameSink for EncodeSequencer<M> {
    type Output = M;

    fn push_frame(&mut self, frame: &FrameBuffer) -> FractalResult<i64> {
        self.submit_frame(frame)
    }

    fn finish(self) -> FractalResult<M> {
        self.finalize()
    }
}

fn drain_into<E: Encoder, M: Muxer>(encoder: &mut E, muxer: &mut M) -> FractalResult<()> {
    loop {
        match encoder.receive_packet()? {
            Received::Packet(p) => muxer.write_packet(&p)?,
            Received::Again | Received::EndOfStream => return Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sequencer.rs"]
mod tests;
