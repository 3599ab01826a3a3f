use std::collections::VecDeque;

use crate::foundation::error::{FractalError, FractalResult};
use crate::foundation::math::TimeBase;

/// Which elementary stream a packet belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// The fractal frames.
    Video,
    /// The placeholder audio track.
    Audio,
}

/// One encoded unit ready for the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Owning stream.
    pub stream: StreamKind,
    /// Presentation timestamp in the stream's time base.
    pub pts: i64,
    /// Duration in the stream's time base.
    pub duration: i64,
    /// Decodable without reference to other packets.
    pub keyframe: bool,
    /// Encoded payload.
    pub data: Vec<u8>,
}

/// Result of asking an encoder for output.
#[derive(Debug, PartialEq, Eq)]
pub enum Received {
    /// A packet is ready.
    Packet(Packet),
    /// Nothing buffered; send more input.
    Again,
    /// The encoder was flushed and is fully drained.
    EndOfStream,
}

/// Send/receive encoder contract.
///
/// `send_frame(Some(..))` queues input, `send_frame(None)` starts the flush. After a flush,
/// `receive_packet` drains what is left and then reports [`Received::EndOfStream`] forever.
pub trait Encoder {
    /// Input frame type.
    type Frame;

    /// Time base of the timestamps this encoder emits.
    fn time_base(&self) -> TimeBase;

    /// Queue one frame, or `None` to flush.
    fn send_frame(&mut self, frame: Option<&Self::Frame>) -> FractalResult<()>;

    /// Pull the next encoded packet.
    fn receive_packet(&mut self) -> FractalResult<Received>;
}

/// Output queue shared by the built-in encoders.
#[derive(Debug, Default)]
pub(crate) struct PacketQueue {
    ready: VecDeque<Packet>,
    flushing: bool,
}

impl PacketQueue {
    pub(crate) fn push(&mut self, packet: Packet) -> FractalResult<()> {
        if self.flushing {
            return Err(FractalError::encode_write(
                "encoder received a frame after it was flushed",
            ));
        }
        self.ready.push_back(packet);
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> FractalResult<()> {
        if self.flushing {
            return Err(FractalError::encode_write("encoder flushed twice"));
        }
        self.flushing = true;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Received {
        match self.ready.pop_front() {
            Some(p) => Received::Packet(p),
            None if self.flushing => Received::EndOfStream,
            None => Received::Again,
        }
    }
}
