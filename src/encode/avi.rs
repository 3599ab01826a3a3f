//! RIFF/AVI writers for uncompressed I420 video plus s16le PCM audio.
//!
//! [`AviMuxer`] writes a seekable file:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'  avih, one LIST 'strl' (strh, strf, indx slot) per stream, LIST 'odml' (dmlh)
//!   LIST 'INFO'  INAM (title), ICOP (copyright)
//!   LIST 'movi'  '00dc' / '01wb' data chunks in write order
//!   idx1         one entry per data chunk of the first RIFF
//! RIFF 'AVIX'    one more segment each time the previous one reaches SEGMENT_LIMIT
//!   LIST 'movi'  data chunks, then one 'ix##' standard index per stream
//! ```
//!
//! A file that never outgrows its first segment is plain AVI 1.0 and its `indx` slots stay
//! `JUNK`. Past that, every segment carries `ix##` standard indexes and the `indx` super indexes
//! point at them (OpenDML). Sizes and counts are placeholders until [`Muxer::write_trailer`]
//! patches them, so the writer needs [`Seek`].
//!
//! [`AviStreamMuxer`] writes the same header forward-only, for pipes. Every size field stays zero
//! ("length unknown") and no index is written.

use std::io::{Seek, SeekFrom, Write};

use crate::encode::codec::{Packet, StreamKind};
use crate::encode::mux::{Metadata, Muxer, StreamDesc};
use crate::foundation::error::{FractalError, FractalResult};

/// Size a RIFF segment may reach before the next chunk opens a new `AVIX` segment.
pub const SEGMENT_LIMIT: u64 = 1 << 30;

/// Super index slots reserved per stream; one slot per segment.
pub const SUPER_INDEX_ENTRIES: usize = 4096;

const AVIF_HASINDEX: u32 = 0x10;
const AVIF_ISINTERLEAVED: u32 = 0x100;
const AVIIF_KEYFRAME: u32 = 0x10;
const MAIN_HEADER_LEN: u32 = 56;
const STREAM_HEADER_LEN: u32 = 56;
const BITMAP_INFO_LEN: u32 = 40;
const WAVE_FORMAT_LEN: u32 = 18;
const WAVE_FORMAT_PCM: u16 = 1;
const EXTENDED_HEADER_LEN: u32 = 248;
const SUPER_INDEX_LEN: u32 = 24 + 16 * SUPER_INDEX_ENTRIES as u32;
const AVI_INDEX_OF_INDEXES: u8 = 0x00;
const AVI_INDEX_OF_CHUNKS: u8 = 0x01;
/// Set in an `ix##` entry size for chunks that are not keyframes.
const DELTA_FRAME: u32 = 0x8000_0000;

#[derive(Clone, Copy, Debug)]
struct IndexEntry {
    ckid: [u8; 4],
    flags: u32,
    offset: u32,
    size: u32,
}

#[derive(Clone, Copy, Debug)]
struct SuperEntry {
    /// Absolute offset of the `ix##` chunk.
    offset: u64,
    size: u32,
    duration: u32,
}

#[derive(Debug)]
struct StreamSlot {
    kind: StreamKind,
    ckid: [u8; 4],
    ix_id: [u8; 4],
    /// Offset of `strh.dwLength`.
    length_at: u64,
    /// Offset of the reserved `indx` chunk; `None` for forward-only output.
    super_index_at: Option<u64>,
    /// Bytes per audio sample frame; `0` for video.
    block_align: u32,
    /// Frames (video) or samples (audio) written so far.
    length: u64,
    /// Chunks of the open segment: absolute data offset, size, keyframe.
    segment_chunks: Vec<(u64, u32, bool)>,
    segment_length: u64,
    super_entries: Vec<SuperEntry>,
}

impl StreamSlot {
    fn ticks(&self, packet: &Packet) -> u64 {
        match self.kind {
            StreamKind::Video => 1,
            StreamKind::Audio => packet.data.len() as u64 / u64::from(self.block_align.max(1)),
        }
    }

    /// Append this stream's `ix##` chunk for the segment whose `movi` fourcc sits at `movi_at`.
    fn write_standard_index<W: Write>(
        &mut self,
        sink: &mut Sink<W>,
        movi_at: u64,
    ) -> FractalResult<()> {
        if self.segment_chunks.is_empty() {
            return Ok(());
        }
        if self.super_entries.len() >= SUPER_INDEX_ENTRIES {
            return Err(FractalError::encode_write(format!(
                "avi: stream {} outgrew its {SUPER_INDEX_ENTRIES}-segment index",
                String::from_utf8_lossy(&self.ckid)
            )));
        }
        let n = self.segment_chunks.len();
        let mut ix = Vec::with_capacity(32 + 8 * n);
        ix.extend_from_slice(&self.ix_id);
        put_u32(&mut ix, fits_u32(24 + 8 * n as u64, "standard index")?);
        put_u16(&mut ix, 2);
        ix.push(0);
        ix.push(AVI_INDEX_OF_CHUNKS);
        put_u32(&mut ix, n as u32);
        ix.extend_from_slice(&self.ckid);
        put_u64(&mut ix, movi_at);
        put_u32(&mut ix, 0);
        for &(data_at, size, keyframe) in &self.segment_chunks {
            put_u32(&mut ix, fits_u32(data_at - movi_at, "segment offset")?);
            put_u32(&mut ix, if keyframe { size } else { size | DELTA_FRAME });
        }

        let offset = sink.absolute();
        sink.emit(&ix)?;
        self.super_entries.push(SuperEntry {
            offset,
            size: ix.len() as u32,
            duration: fits_u32(self.segment_length, "segment duration")?,
        });
        self.segment_chunks.clear();
        self.segment_length = 0;
        Ok(())
    }

    /// The full `indx` chunk, padded to the reserved slot.
    fn super_index(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(8 + SUPER_INDEX_LEN as usize);
        b.extend_from_slice(b"indx");
        put_u32(&mut b, SUPER_INDEX_LEN);
        put_u16(&mut b, 4);
        b.push(0);
        b.push(AVI_INDEX_OF_INDEXES);
        put_u32(&mut b, self.super_entries.len() as u32);
        b.extend_from_slice(&self.ckid);
        for _ in 0..3 {
            put_u32(&mut b, 0);
        }
        for e in &self.super_entries {
            put_u64(&mut b, e.offset);
            put_u32(&mut b, e.size);
            put_u32(&mut b, e.duration);
        }
        b.resize(8 + SUPER_INDEX_LEN as usize, 0);
        b
    }
}

/// Byte sink tracking the write position relative to where the container started.
#[derive(Debug)]
struct Sink<W> {
    out: W,
    pos: u64,
    base: u64,
}

impl<W: Write> Sink<W> {
    fn emit(&mut self, bytes: &[u8]) -> FractalResult<()> {
        self.out
            .write_all(bytes)
            .map_err(|e| FractalError::encode_write(format!("avi: write failed: {e}")))?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    fn absolute(&self) -> u64 {
        self.base + self.pos
    }

    fn flush(&mut self) -> FractalResult<()> {
        self.out
            .flush()
            .map_err(|e| FractalError::encode_write(format!("avi: flush failed: {e}")))
    }
}

impl<W: Write + Seek> Sink<W> {
    /// Overwrite bytes at `at`, then return to the write position.
    fn patch_bytes(&mut self, at: u64, bytes: &[u8]) -> FractalResult<()> {
        let end = self.absolute();
        self.out
            .seek(SeekFrom::Start(self.base + at))
            .and_then(|_| self.out.write_all(bytes))
            .and_then(|_| self.out.seek(SeekFrom::Start(end)))
            .map(|_| ())
            .map_err(|e| FractalError::encode_write(format!("avi: failed to patch header: {e}")))
    }

    fn patch(&mut self, at: u64, value: u32) -> FractalResult<()> {
        self.patch_bytes(at, &value.to_le_bytes())
    }
}

#[derive(Debug)]
struct Segment {
    /// Offset of the RIFF size field.
    riff_size_at: u64,
    movi_size_at: u64,
    chunks: usize,
}

impl Segment {
    fn movi_at(&self) -> u64 {
        self.movi_size_at + 4
    }
}

#[derive(Debug)]
struct Opened {
    streams: Vec<StreamSlot>,
    total_frames_at: u64,
    dmlh_frames_at: u64,
    segment: Segment,
    /// Segments already closed.
    closed: usize,
    /// `idx1` entries; only the first segment has them.
    legacy: Vec<IndexEntry>,
    first_segment_frames: u64,
}

impl Opened {
    fn video_frames(&self) -> u64 {
        self.streams
            .iter()
            .find(|s| s.kind == StreamKind::Video)
            .map_or(0, |s| s.length)
    }

    fn close_segment<W: Write + Seek>(
        &mut self,
        sink: &mut Sink<W>,
        last: bool,
    ) -> FractalResult<()> {
        if !last || self.closed > 0 {
            let movi_at = sink.base + self.segment.movi_at();
            for slot in &mut self.streams {
                slot.write_standard_index(sink, movi_at)?;
            }
        }
        let movi_size = fits_u32(sink.pos - self.segment.movi_at(), "movi size")?;
        sink.patch(self.segment.movi_size_at, movi_size)?;

        if self.closed == 0 {
            let mut idx = Vec::with_capacity(8 + self.legacy.len() * 16);
            idx.extend_from_slice(b"idx1");
            put_u32(&mut idx, fits_u32(self.legacy.len() as u64 * 16, "index size")?);
            for e in &self.legacy {
                idx.extend_from_slice(&e.ckid);
                put_u32(&mut idx, e.flags);
                put_u32(&mut idx, e.offset);
                put_u32(&mut idx, e.size);
            }
            sink.emit(&idx)?;
            self.legacy = Vec::new();
            self.first_segment_frames = self.video_frames();
        }

        let riff_size = fits_u32(sink.pos - self.segment.riff_size_at - 4, "RIFF size")?;
        sink.patch(self.segment.riff_size_at, riff_size)?;
        self.closed += 1;
        Ok(())
    }

    fn open_segment<W: Write>(&mut self, sink: &mut Sink<W>) -> FractalResult<()> {
        let start = sink.pos;
        let mut head = Vec::with_capacity(24);
        head.extend_from_slice(b"RIFF");
        put_u32(&mut head, 0);
        head.extend_from_slice(b"AVIX");
        let movi_size_at = open_list(&mut head, b"movi") as u64;
        sink.emit(&head)?;
        self.segment = Segment {
            riff_size_at: start + 4,
            movi_size_at: start + movi_size_at,
            chunks: 0,
        };
        tracing::debug!(segment = self.closed, at = start, "avi segment opened");
        Ok(())
    }
}

/// AVI writer over any seekable byte sink, with OpenDML segments for files past 1 GiB.
#[derive(Debug)]
pub struct AviMuxer<W: Write + Seek> {
    sink: Sink<W>,
    segment_limit: u64,
    state: Option<Opened>,
    finished: bool,
}

impl<W: Write + Seek> AviMuxer<W> {
    /// Wrap `out`. The RIFF header is written at the current position.
    pub fn new(mut out: W) -> FractalResult<Self> {
        let base = out
            .stream_position()
            .map_err(|e| FractalError::encoder_init(format!("avi: failed to query position: {e}")))?;
        Ok(Self {
            sink: Sink { out, pos: 0, base },
            segment_limit: SEGMENT_LIMIT,
            state: None,
            finished: false,
        })
    }

    /// Use `bytes` instead of [`SEGMENT_LIMIT`] as the segment size.
    pub(crate) fn with_segment_limit(mut self, bytes: u64) -> Self {
        self.segment_limit = bytes;
        self
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.sink.out
    }
}

impl<W: Write + Seek> Muxer for AviMuxer<W> {
    fn write_header(&mut self, streams: &[StreamDesc], metadata: &Metadata) -> FractalResult<()> {
        if self.state.is_some() || self.finished {
            return Err(FractalError::encoder_init("avi: header already written"));
        }
        let header = build_header(streams, metadata, true)?;
        self.sink.emit(&header.bytes).map_err(into_init)?;
        self.state = Some(Opened {
            streams: header.streams,
            total_frames_at: header.total_frames_at,
            dmlh_frames_at: header.dmlh_frames_at,
            segment: Segment {
                riff_size_at: 4,
                movi_size_at: header.movi_size_at,
                chunks: 0,
            },
            closed: 0,
            legacy: Vec::new(),
            first_segment_frames: 0,
        });
        tracing::debug!(streams = streams.len(), "avi header written");
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet) -> FractalResult<()> {
        if self.finished {
            return Err(FractalError::encode_write("avi: packet after trailer"));
        }
        let Some(st) = self.state.as_mut() else {
            return Err(FractalError::encode_write("avi: packet before header"));
        };
        let Some(si) = st.streams.iter().position(|s| s.kind == packet.stream) else {
            return Err(FractalError::encode_write(format!(
                "avi: no {:?} stream declared",
                packet.stream
            )));
        };
        let size = fits_u32(packet.data.len() as u64, "chunk size")?;
        if size & DELTA_FRAME != 0 {
            return Err(FractalError::encode_write("avi: chunk larger than 2 GiB"));
        }

        let chunk_len = 8 + u64::from(size) + u64::from(size % 2);
        let segment_len = self.sink.pos + chunk_len - (st.segment.riff_size_at - 4);
        if st.segment.chunks > 0 && segment_len > self.segment_limit {
            st.close_segment(&mut self.sink, false)?;
            st.open_segment(&mut self.sink)?;
        }

        let ckid = st.streams[si].ckid;
        if st.closed == 0 {
            let offset = fits_u32(self.sink.pos - st.segment.movi_at(), "movi offset")?;
            st.legacy.push(IndexEntry {
                ckid,
                flags: if packet.keyframe { AVIIF_KEYFRAME } else { 0 },
                offset,
                size,
            });
        }

        let data_at = self.sink.absolute() + 8;
        let mut head = [0u8; 8];
        head[..4].copy_from_slice(&ckid);
        head[4..].copy_from_slice(&size.to_le_bytes());
        self.sink.emit(&head)?;
        self.sink.emit(&packet.data)?;
        if size % 2 == 1 {
            self.sink.emit(&[0])?;
        }

        let slot = &mut st.streams[si];
        let ticks = slot.ticks(packet);
        slot.length += ticks;
        slot.segment_length += ticks;
        slot.segment_chunks.push((data_at, size, packet.keyframe));
        st.segment.chunks += 1;
        Ok(())
    }

    fn write_trailer(&mut self) -> FractalResult<()> {
        if self.finished {
            return Err(FractalError::encode_write("avi: trailer already written"));
        }
        let Some(mut st) = self.state.take() else {
            return Err(FractalError::encode_write("avi: trailer before header"));
        };
        self.finished = true;

        st.close_segment(&mut self.sink, true)?;
        for slot in &st.streams {
            self.sink
                .patch(slot.length_at, fits_u32(slot.length, "stream length")?)?;
        }
        let total = fits_u32(st.video_frames(), "frame count")?;
        self.sink.patch(
            st.total_frames_at,
            fits_u32(st.first_segment_frames, "frame count")?,
        )?;
        self.sink.patch(st.dmlh_frames_at, total)?;
        if st.closed > 1 {
            for slot in &st.streams {
                if let Some(at) = slot.super_index_at {
                    self.sink.patch_bytes(at, &slot.super_index())?;
                }
            }
        }
        self.sink.flush()?;
        tracing::debug!(
            segments = st.closed,
            frames = total,
            bytes = self.sink.pos,
            "avi trailer written"
        );
        Ok(())
    }
}

/// Forward-only AVI writer for non-seekable sinks such as a pipe into `ffmpeg`.
///
/// Length fields are written as zero, which readers take as "until end of input".
#[derive(Debug)]
pub struct AviStreamMuxer<W: Write> {
    sink: Sink<W>,
    streams: Option<Vec<StreamSlot>>,
    finished: bool,
}

impl<W: Write> AviStreamMuxer<W> {
    /// Wrap `out`.
    pub fn new(out: W) -> Self {
        Self {
            sink: Sink {
                out,
                pos: 0,
                base: 0,
            },
            streams: None,
            finished: false,
        }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.sink.pos
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.sink.out
    }
}

impl<W: Write> Muxer for AviStreamMuxer<W> {
    fn write_header(&mut self, streams: &[StreamDesc], metadata: &Metadata) -> FractalResult<()> {
        if self.streams.is_some() || self.finished {
            return Err(FractalError::encoder_init("avi: header already written"));
        }
        let header = build_header(streams, metadata, false)?;
        self.sink.emit(&header.bytes).map_err(into_init)?;
        self.streams = Some(header.streams);
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet) -> FractalResult<()> {
        if self.finished {
            return Err(FractalError::encode_write("avi: packet after trailer"));
        }
        let Some(streams) = self.streams.as_ref() else {
            return Err(FractalError::encode_write("avi: packet before header"));
        };
        let Some(slot) = streams.iter().find(|s| s.kind == packet.stream) else {
            return Err(FractalError::encode_write(format!(
                "avi: no {:?} stream declared",
                packet.stream
            )));
        };
        let size = fits_u32(packet.data.len() as u64, "chunk size")?;
        let mut head = [0u8; 8];
        head[..4].copy_from_slice(&slot.ckid);
        head[4..].copy_from_slice(&size.to_le_bytes());
        self.sink.emit(&head)?;
        self.sink.emit(&packet.data)?;
        if size % 2 == 1 {
            self.sink.emit(&[0])?;
        }
        Ok(())
    }

    fn write_trailer(&mut self) -> FractalResult<()> {
        if self.finished {
            return Err(FractalError::encode_write("avi: trailer already written"));
        }
        if self.streams.take().is_none() {
            return Err(FractalError::encode_write("avi: trailer before header"));
        }
        self.finished = true;
        self.sink.flush()
    }
}

fn into_init(e: FractalError) -> FractalError {
    match e {
        FractalError::EncodeWrite(msg) => FractalError::EncoderInit(msg),
        other => other,
    }
}

fn fits_u32(v: u64, what: &str) -> FractalResult<u32> {
    u32::try_from(v).map_err(|_| FractalError::encode_write(format!("avi: {what} exceeds 4 GiB")))
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn patch_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

/// Open a `LIST` chunk; returns the offset of its size field.
fn open_list(buf: &mut Vec<u8>, kind: &[u8; 4]) -> usize {
    buf.extend_from_slice(b"LIST");
    let at = buf.len();
    put_u32(buf, 0);
    buf.extend_from_slice(kind);
    at
}

fn close_list(buf: &mut [u8], size_at: usize) {
    let size = (buf.len() - size_at - 4) as u32;
    patch_u32(buf, size_at, size);
}

fn put_text_chunk(buf: &mut Vec<u8>, id: &[u8; 4], text: &str) {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    buf.extend_from_slice(id);
    put_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(&bytes);
    if bytes.len() % 2 == 1 {
        buf.push(0);
    }
}

fn two_digits(index: usize) -> [u8; 2] {
    [b'0' + (index / 10 % 10) as u8, b'0' + (index % 10) as u8]
}

fn chunk_id(index: usize, kind: StreamKind) -> [u8; 4] {
    let [tens, ones] = two_digits(index);
    match kind {
        StreamKind::Video => [tens, ones, b'd', b'c'],
        StreamKind::Audio => [tens, ones, b'w', b'b'],
    }
}

fn index_id(index: usize) -> [u8; 4] {
    let [tens, ones] = two_digits(index);
    [b'i', b'x', tens, ones]
}

#[derive(Debug)]
struct Header {
    bytes: Vec<u8>,
    streams: Vec<StreamSlot>,
    total_frames_at: u64,
    dmlh_frames_at: u64,
    movi_size_at: u64,
}

/// Everything from `RIFF` up to and including the `movi` fourcc. With `indexed`, the header
/// reserves the OpenDML super index slots and extended header.
fn build_header(
    streams: &[StreamDesc],
    metadata: &Metadata,
    indexed: bool,
) -> FractalResult<Header> {
    if streams.is_empty() || streams.len() > 100 {
        return Err(FractalError::encoder_init(
            "avi: container needs between 1 and 100 streams",
        ));
    }
    for (i, s) in streams.iter().enumerate() {
        if streams[..i].iter().any(|o| o.kind() == s.kind()) {
            return Err(FractalError::encoder_init(format!(
                "avi: duplicate {:?} stream",
                s.kind()
            )));
        }
    }

    let (width, height, framerate) = streams
        .iter()
        .find_map(|s| match *s {
            StreamDesc::Video {
                width,
                height,
                framerate,
            } => Some((width, height, framerate)),
            StreamDesc::Audio { .. } => None,
        })
        .unwrap_or((0, 0, 0));

    let mut max_bytes_per_sec = 0u64;
    for s in streams {
        match *s {
            StreamDesc::Video {
                width,
                height,
                framerate,
            } => {
                if framerate == 0 || width == 0 || height == 0 {
                    return Err(FractalError::encoder_init(
                        "avi: video stream needs non-zero size and framerate",
                    ));
                }
                max_bytes_per_sec +=
                    u64::from(width) * u64::from(height) * 3 / 2 * u64::from(framerate);
            }
            StreamDesc::Audio {
                sample_rate,
                channels,
            } => {
                if sample_rate == 0 || channels == 0 {
                    return Err(FractalError::encoder_init(
                        "avi: audio stream needs non-zero rate and channel count",
                    ));
                }
                max_bytes_per_sec += u64::from(sample_rate) * u64::from(channels) * 2;
            }
        }
    }

    let mut head = Vec::with_capacity(1024);
    head.extend_from_slice(b"RIFF");
    put_u32(&mut head, 0);
    head.extend_from_slice(b"AVI ");

    let hdrl_at = open_list(&mut head, b"hdrl");
    head.extend_from_slice(b"avih");
    put_u32(&mut head, MAIN_HEADER_LEN);
    let us_per_frame = if framerate == 0 {
        0
    } else {
        (1_000_000 + framerate / 2) / framerate
    };
    put_u32(&mut head, us_per_frame);
    put_u32(&mut head, u32::try_from(max_bytes_per_sec).unwrap_or(u32::MAX));
    put_u32(&mut head, 0); // padding granularity
    let flags = if indexed {
        AVIF_HASINDEX | AVIF_ISINTERLEAVED
    } else {
        AVIF_ISINTERLEAVED
    };
    put_u32(&mut head, flags);
    let total_frames_at = head.len() as u64;
    put_u32(&mut head, 0);
    put_u32(&mut head, 0); // initial frames
    put_u32(&mut head, streams.len() as u32);
    put_u32(&mut head, 0); // suggested buffer size
    put_u32(&mut head, width);
    put_u32(&mut head, height);
    for _ in 0..4 {
        put_u32(&mut head, 0);
    }

    let mut slots = Vec::with_capacity(streams.len());
    for (i, s) in streams.iter().enumerate() {
        let strl_at = open_list(&mut head, b"strl");
        head.extend_from_slice(b"strh");
        put_u32(&mut head, STREAM_HEADER_LEN);
        let length_at;
        let mut block_align = 0u32;
        match *s {
            StreamDesc::Video {
                width,
                height,
                framerate,
            } => {
                head.extend_from_slice(b"vids");
                head.extend_from_slice(b"I420");
                put_u32(&mut head, 0); // flags
                put_u16(&mut head, 0); // priority
                put_u16(&mut head, 0); // language
                put_u32(&mut head, 0); // initial frames
                put_u32(&mut head, 1); // scale
                put_u32(&mut head, framerate); // rate
                put_u32(&mut head, 0); // start
                length_at = head.len() as u64;
                put_u32(&mut head, 0);
                put_u32(&mut head, width.saturating_mul(height).saturating_mul(3) / 2);
                put_u32(&mut head, u32::MAX); // quality: default
                put_u32(&mut head, 0); // sample size: variable
                put_u16(&mut head, 0);
                put_u16(&mut head, 0);
                put_u16(&mut head, width.min(u32::from(u16::MAX)) as u16);
                put_u16(&mut head, height.min(u32::from(u16::MAX)) as u16);

                head.extend_from_slice(b"strf");
                put_u32(&mut head, BITMAP_INFO_LEN);
                put_u32(&mut head, BITMAP_INFO_LEN);
                put_u32(&mut head, width);
                put_u32(&mut head, height);
                put_u16(&mut head, 1); // planes
                put_u16(&mut head, 12); // bits per pixel
                head.extend_from_slice(b"I420");
                put_u32(&mut head, width.saturating_mul(height).saturating_mul(3) / 2);
                for _ in 0..4 {
                    put_u32(&mut head, 0);
                }
            }
            StreamDesc::Audio {
                sample_rate,
                channels,
            } => {
                block_align = u32::from(channels) * 2;
                head.extend_from_slice(b"auds");
                put_u32(&mut head, 0); // handler
                put_u32(&mut head, 0); // flags
                put_u16(&mut head, 0);
                put_u16(&mut head, 0);
                put_u32(&mut head, 0);
                put_u32(&mut head, block_align); // scale
                put_u32(&mut head, sample_rate * block_align); // rate
                put_u32(&mut head, 0);
                length_at = head.len() as u64;
                put_u32(&mut head, 0);
                put_u32(&mut head, sample_rate * block_align);
                put_u32(&mut head, u32::MAX);
                put_u32(&mut head, block_align);
                for _ in 0..4 {
                    put_u16(&mut head, 0);
                }

                head.extend_from_slice(b"strf");
                put_u32(&mut head, WAVE_FORMAT_LEN);
                put_u16(&mut head, WAVE_FORMAT_PCM);
                put_u16(&mut head, channels);
                put_u32(&mut head, sample_rate);
                put_u32(&mut head, sample_rate * block_align);
                put_u16(&mut head, block_align as u16);
                put_u16(&mut head, 16);
                put_u16(&mut head, 0);
            }
        }

        let super_index_at = if indexed {
            // Rewritten as 'indx' once the file needs a second segment.
            let at = head.len() as u64;
            head.extend_from_slice(b"JUNK");
            put_u32(&mut head, SUPER_INDEX_LEN);
            head.resize(head.len() + SUPER_INDEX_LEN as usize, 0);
            Some(at)
        } else {
            None
        };
        close_list(&mut head, strl_at);
        slots.push(StreamSlot {
            kind: s.kind(),
            ckid: chunk_id(i, s.kind()),
            ix_id: index_id(i),
            length_at,
            super_index_at,
            block_align,
            length: 0,
            segment_chunks: Vec::new(),
            segment_length: 0,
            super_entries: Vec::new(),
        });
    }

    let mut dmlh_frames_at = 0;
    if indexed {
        let odml_at = open_list(&mut head, b"odml");
        head.extend_from_slice(b"dmlh");
        put_u32(&mut head, EXTENDED_HEADER_LEN);
        dmlh_frames_at = head.len() as u64;
        head.resize(head.len() + EXTENDED_HEADER_LEN as usize, 0);
        close_list(&mut head, odml_at);
    }
    close_list(&mut head, hdrl_at);

    if !metadata.title.is_empty() || !metadata.copyright.is_empty() {
        let info_at = open_list(&mut head, b"INFO");
        if !metadata.title.is_empty() {
            put_text_chunk(&mut head, b"INAM", &metadata.title);
        }
        if !metadata.copyright.is_empty() {
            put_text_chunk(&mut head, b"ICOP", &metadata.copyright);
        }
        close_list(&mut head, info_at);
    }

    let movi_size_at = open_list(&mut head, b"movi") as u64;
    Ok(Header {
        bytes: head,
        streams: slots,
        total_frames_at,
        dmlh_frames_at,
        movi_size_at,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/avi.rs"]
mod tests;
