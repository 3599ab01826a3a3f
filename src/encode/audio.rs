//! Audio side of the encode pipeline.
//!
//! There is no real audio source; the container still needs a timed audio track, so a placeholder
//! tone (silent at the default volume) flows through the same chain a real source would:
//! interleaved s16 → [`SampleConverter`] → planar f32 → [`PcmEncoder`] → interleaved s16le packets.

use std::f64::consts::PI;

use crate::encode::codec::{Encoder, Packet, PacketQueue, Received, StreamKind};
use crate::foundation::error::{FractalError, FractalResult};
use crate::foundation::math::TimeBase;

/// Output sample rate of the audio track.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
/// Output channel count (stereo).
pub const AUDIO_CHANNELS: u16 = 2;
/// Samples per channel in every audio frame.
pub const AUDIO_FRAME_SIZE: usize = 1024;
/// Placeholder tone frequency in Hz.
pub const TONE_FREQUENCY_HZ: f64 = 200.0;
/// Placeholder tone volume; `0.0` keeps the track silent.
pub const TONE_VOLUME: f64 = 0.0;

/// Sample rate and channel layout of a PCM stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second, per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl AudioFormat {
    /// 44.1 kHz stereo.
    pub const STEREO_44K: Self = Self {
        sample_rate: AUDIO_SAMPLE_RATE,
        channels: AUDIO_CHANNELS,
    };
}

/// Sine tone generator writing interleaved s16 samples.
#[derive(Clone, Debug)]
pub struct ToneSource {
    format: AudioFormat,
    frequency: f64,
    volume: f64,
}

impl ToneSource {
    /// Tone at `frequency` Hz scaled by `volume` (`0.0..=1.0`).
    pub fn new(format: AudioFormat, frequency: f64, volume: f64) -> Self {
        Self {
            format,
            frequency,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// The silent placeholder used by the video pipeline.
    pub fn placeholder(format: AudioFormat) -> Self {
        Self::new(format, TONE_FREQUENCY_HZ, TONE_VOLUME)
    }

    /// Fill `out` (interleaved, `out.len() / channels` samples) starting at sample `start`.
    pub fn fill(&self, start: i64, out: &mut [i16]) {
        let channels = usize::from(self.format.channels.max(1));
        let rate = i64::from(self.format.sample_rate.max(1));
        let amplitude = f64::from(i16::MAX) * self.volume;
        for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
            let t = (start + i as i64).rem_euclid(rate) as f64 / rate as f64;
            let v = ((2.0 * PI * self.frequency * t).sin() * amplitude) as i16;
            frame.fill(v);
        }
    }
}

/// One frame of planar f32 audio.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanarAudio {
    /// One plane per channel, each `nb_samples` long.
    pub planes: Vec<Vec<f32>>,
    /// Presentation timestamp in samples.
    pub pts: i64,
}

impl PlanarAudio {
    /// Zeroed frame with `channels` planes of `nb_samples`.
    pub fn new(channels: u16, nb_samples: usize) -> Self {
        Self {
            planes: vec![vec![0.0; nb_samples]; usize::from(channels)],
            pts: 0,
        }
    }

    /// Samples per channel.
    pub fn nb_samples(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }
}

/// Converts interleaved s16 into planar f32 at the same rate and layout.
///
/// Both sides of the conversion are fixed when the converter is created; a request for an actual
/// rate or layout change is an init error.
#[derive(Clone, Debug)]
pub struct SampleConverter {
    format: AudioFormat,
}

impl SampleConverter {
    /// Converter from `input` to `output`.
    pub fn new(input: AudioFormat, output: AudioFormat) -> FractalResult<Self> {
        if input != output {
            return Err(FractalError::encoder_init(format!(
                "sample converter cannot resample {}Hz/{}ch to {}Hz/{}ch",
                input.sample_rate, input.channels, output.sample_rate, output.channels
            )));
        }
        if input.channels == 0 || input.sample_rate == 0 {
            return Err(FractalError::encoder_init(
                "sample converter needs a non-zero rate and channel count",
            ));
        }
        Ok(Self { format: input })
    }

    /// Convert `src` into the planes of `dst`. Returns the number of samples per channel written.
    pub fn convert(&self, src: &[i16], dst: &mut PlanarAudio) -> FractalResult<usize> {
        let channels = usize::from(self.format.channels);
        if dst.planes.len() != channels {
            return Err(FractalError::encode_write(
                "planar frame channel count does not match converter",
            ));
        }
        let samples = (src.len() / channels).min(dst.nb_samples());
        for (i, frame) in src.chunks_exact(channels).take(samples).enumerate() {
            for (c, &s) in frame.iter().enumerate() {
                dst.planes[c][i] = f32::from(s) / 32768.0;
            }
        }
        Ok(samples)
    }
}

/// Planar f32 → interleaved little-endian s16 PCM encoder with a fixed frame size.
#[derive(Debug)]
pub struct PcmEncoder {
    format: AudioFormat,
    frame_size: usize,
    queue: PacketQueue,
}

impl PcmEncoder {
    /// Encoder for `format` consuming `frame_size` samples per channel per frame.
    pub fn new(format: AudioFormat, frame_size: usize) -> FractalResult<Self> {
        if format.sample_rate == 0 || format.channels == 0 || frame_size == 0 {
            return Err(FractalError::encoder_init(
                "pcm encoder needs a non-zero rate, channel count and frame size",
            ));
        }
        Ok(Self {
            format,
            frame_size,
            queue: PacketQueue::default(),
        })
    }

    /// Samples per channel per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Stream format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Bytes per sample across all channels.
    pub fn block_align(&self) -> u16 {
        self.format.channels * 2
    }
}

impl Encoder for PcmEncoder {
    type Frame = PlanarAudio;

    fn time_base(&self) -> TimeBase {
        TimeBase::per_second(self.format.sample_rate)
    }

    fn send_frame(&mut self, frame: Option<&PlanarAudio>) -> FractalResult<()> {
        let Some(frame) = frame else {
            return self.queue.flush();
        };
        if frame.planes.len() != usize::from(self.format.channels) {
            return Err(FractalError::encode_write(
                "audio frame channel count does not match encoder",
            ));
        }
        let n = frame.nb_samples();
        if n != self.frame_size {
            return Err(FractalError::encode_write(format!(
                "audio frame has {n} samples, encoder expects {}",
                self.frame_size
            )));
        }
        let mut data = Vec::with_capacity(n * usize::from(self.block_align()));
        for i in 0..n {
            for plane in &frame.planes {
                let s = (plane[i].clamp(-1.0, 1.0) * 32767.0).round() as i16;
                data.extend_from_slice(&s.to_le_bytes());
            }
        }
        self.queue.push(Packet {
            stream: StreamKind::Audio,
            pts: frame.pts,
            duration: n as i64,
            keyframe: true,
            data,
        })
    }

    fn receive_packet(&mut self) -> FractalResult<Received> {
        Ok(self.queue.pop())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/audio.rs"]
mod tests;
