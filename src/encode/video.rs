//! Video side of the encode pipeline: RGB24 → planar YUV 4:2:0 conversion and the raw I420
//! packetizer.

use crate::encode::codec::{Encoder, Packet, PacketQueue, Received, StreamKind};
use crate::foundation::error::{FractalError, FractalResult};
use crate::foundation::math::TimeBase;
use crate::render::frame::FrameBuffer;

/// Planar YUV 4:2:0 picture (BT.601, limited range). Width and height are even.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YuvFrame {
    width: u32,
    height: u32,
    /// Luma plane, `width × height`.
    pub y: Vec<u8>,
    /// Blue-difference plane, `width/2 × height/2`.
    pub u: Vec<u8>,
    /// Red-difference plane, `width/2 × height/2`.
    pub v: Vec<u8>,
    /// Presentation timestamp in the video time base.
    pub pts: i64,
}

impl YuvFrame {
    /// Allocate a black picture.
    pub fn new(width: u32, height: u32) -> FractalResult<Self> {
        if width == 0 || height == 0 || !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(FractalError::encoder_init(
                "yuv420p frames need non-zero even width/height",
            ));
        }
        let luma = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            y: vec![16; luma],
            u: vec![128; luma / 4],
            v: vec![128; luma / 4],
            pts: 0,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of one packed I420 picture in bytes.
    pub fn packed_len(&self) -> usize {
        self.y.len() + self.u.len() + self.v.len()
    }
}

/// Convert a packed RGB24 frame into `dst`. Chroma is taken from the average of each 2×2 block.
pub fn rgb24_to_yuv420p(src: &FrameBuffer, dst: &mut YuvFrame) -> FractalResult<()> {
    if src.width() != dst.width || src.height() != dst.height {
        return Err(FractalError::encode_write(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            src.width(),
            src.height(),
            dst.width,
            dst.height
        )));
    }

    let w = dst.width as usize;
    let stride = src.stride();
    let data = src.data();

    for (row, luma) in dst.y.chunks_exact_mut(w).enumerate() {
        let line = &data[row * stride..(row + 1) * stride];
        for (y, px) in luma.iter_mut().zip(line.chunks_exact(3)) {
            *y = luma_of(px[0], px[1], px[2]);
        }
    }

    let cw = w / 2;
    for (crow, (u_line, v_line)) in dst
        .u
        .chunks_exact_mut(cw)
        .zip(dst.v.chunks_exact_mut(cw))
        .enumerate()
    {
        let top = &data[2 * crow * stride..(2 * crow + 1) * stride];
        let bottom = &data[(2 * crow + 1) * stride..(2 * crow + 2) * stride];
        for ccol in 0..cw {
            let i = ccol * 6;
            let avg = |c: usize| {
                (u32::from(top[i + c])
                    + u32::from(top[i + 3 + c])
                    + u32::from(bottom[i + c])
                    + u32::from(bottom[i + 3 + c])
                    + 2)
                    / 4
            };
            let (r, g, b) = (avg(0) as i32, avg(1) as i32, avg(2) as i32);
            u_line[ccol] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
            v_line[ccol] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
        }
    }
    Ok(())
}

fn luma_of(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(0, 255) as u8
}

/// Uncompressed I420 encoder. Every packet is an intra frame.
#[derive(Debug)]
pub struct RawVideoEncoder {
    width: u32,
    height: u32,
    time_base: TimeBase,
    queue: PacketQueue,
}

impl RawVideoEncoder {
    /// Encoder for `width × height` pictures at `framerate` frames per second.
    pub fn new(width: u32, height: u32, framerate: u32) -> FractalResult<Self> {
        if framerate == 0 {
            return Err(FractalError::encoder_init("video framerate must be >= 1"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(FractalError::encoder_init(
                "video width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(Self {
            width,
            height,
            time_base: TimeBase::per_second(framerate),
            queue: PacketQueue::default(),
        })
    }

    /// Size of every emitted packet.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3 / 2
    }
}

impl Encoder for RawVideoEncoder {
    type Frame = YuvFrame;

    fn time_base(&self) -> TimeBase {
        self.time_base
    }

    fn send_frame(&mut self, frame: Option<&YuvFrame>) -> FractalResult<()> {
        let Some(frame) = frame else {
            return self.queue.flush();
        };
        if frame.width != self.width || frame.height != self.height {
            return Err(FractalError::encode_write(
                "video frame does not match encoder dimensions",
            ));
        }
        let mut data = Vec::with_capacity(frame.packed_len());
        data.extend_from_slice(&frame.y);
        data.extend_from_slice(&frame.u);
        data.extend_from_slice(&frame.v);
        self.queue.push(Packet {
            stream: StreamKind::Video,
            pts: frame.pts,
            duration: 1,
            keyframe: true,
            data,
        })
    }

    fn receive_packet(&mut self) -> FractalResult<Received> {
        Ok(self.queue.pop())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/video.rs"]
mod tests;
