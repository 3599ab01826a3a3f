use crate::encode::codec::{Packet, StreamKind};
use crate::foundation::error::FractalResult;
use crate::foundation::math::TimeBase;

/// Stream description handed to a [`Muxer`] before any packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamDesc {
    /// Uncompressed I420 video.
    Video {
        /// Picture width in pixels.
        width: u32,
        /// Picture height in pixels.
        height: u32,
        /// Frames per second.
        framerate: u32,
    },
    /// Interleaved s16le PCM audio.
    Audio {
        /// Samples per second.
        sample_rate: u32,
        /// Channel count.
        channels: u16,
    },
}

impl StreamDesc {
    /// Stream this description applies to.
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Video { .. } => StreamKind::Video,
            Self::Audio { .. } => StreamKind::Audio,
        }
    }

    /// Time base packet timestamps are expressed in.
    pub fn time_base(&self) -> TimeBase {
        match *self {
            Self::Video { framerate, .. } => TimeBase::per_second(framerate),
            Self::Audio { sample_rate, .. } => TimeBase::per_second(sample_rate),
        }
    }
}

/// Container-level tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// `title` tag.
    pub title: String,
    /// `copyright` tag.
    pub copyright: String,
}

/// Default `copyright` tag for generated videos.
pub const DEFAULT_COPYRIGHT: &str = "Fractal generator, licensed under GPL-3.0";

impl Metadata {
    /// Metadata with `title` and the default copyright line.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            copyright: DEFAULT_COPYRIGHT.to_owned(),
        }
    }
}

/// Container writer contract.
///
/// Ordering contract: `write_header` once, then any number of `write_packet`, then
/// `write_trailer` once. Packets arrive in the order they should be stored.
pub trait Muxer {
    /// Declare the streams and tags.
    fn write_header(&mut self, streams: &[StreamDesc], metadata: &Metadata) -> FractalResult<()>;
    /// Store one packet.
    fn write_packet(&mut self, packet: &Packet) -> FractalResult<()>;
    /// Finish the container.
    fn write_trailer(&mut self) -> FractalResult<()>;
}

/// In-memory muxer for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryMuxer {
    streams: Vec<StreamDesc>,
    metadata: Option<Metadata>,
    packets: Vec<Packet>,
    finished: bool,
}

impl InMemoryMuxer {
    /// Create an empty muxer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams declared in `write_header`.
    pub fn streams(&self) -> &[StreamDesc] {
        &self.streams
    }

    /// Tags declared in `write_header`, if it was called.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Packets in write order.
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Whether `write_trailer` was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Presentation time in seconds of `packet`, using the declared stream time base.
    pub fn seconds_of(&self, packet: &Packet) -> Option<f64> {
        self.streams
            .iter()
            .find(|s| s.kind() == packet.stream)
            .map(|s| s.time_base().seconds(packet.pts))
    }
}

impl Muxer for InMemoryMuxer {
    fn write_header(&mut self, streams: &[StreamDesc], metadata: &Metadata) -> FractalResult<()> {
        self.streams = streams.to_vec();
        self.metadata = Some(metadata.clone());
        self.packets.clear();
        self.finished = false;
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet) -> FractalResult<()> {
        self.packets.push(packet.clone());
        Ok(())
    }

    fn write_trailer(&mut self) -> FractalResult<()> {
        self.finished = true;
        Ok(())
    }
}
