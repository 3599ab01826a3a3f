use super::*;
use crate::encode::codec::{Packet, StreamKind};
use crate::encode::mux::InMemoryMuxer;

fn frame(width: u32, height: u32, shade: u8) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height).unwrap();
    for set in fb.partition_rows(1) {
        for (_, row) in set {
            row.fill(shade);
        }
    }
    fb
}

fn run(frames: u32, framerate: u32) -> InMemoryMuxer {
    let mut seq =
        EncodeSequencer::new(InMemoryMuxer::new(), 4, 2, framerate, &Metadata::titled("t")).unwrap();
    for i in 0..frames {
        let pts = seq.push_frame(&frame(4, 2, i as u8)).unwrap();
        assert_eq!(pts, i64::from(i) + 1);
    }
    seq.finish().unwrap()
}

#[test]
fn header_declares_video_then_audio() {
    let mux = run(1, 30);
    assert_eq!(
        mux.streams(),
        &[
            StreamDesc::Video {
                width: 4,
                height: 2,
                framerate: 30
            },
            StreamDesc::Audio {
                sample_rate: 44_100,
                channels: 2
            },
        ]
    );
    assert_eq!(mux.metadata().map(|m| m.title.as_str()), Some("t"));
    assert!(mux.is_finished());
}

#[test]
fn first_packet_is_video_and_order_is_non_decreasing() {
    let mux = run(10, 30);
    let packets = mux.packets();
    assert_eq!(packets[0].stream, StreamKind::Video);

    let times: Vec<f64> = packets.iter().map(|p| mux.seconds_of(p).unwrap()).collect();
    for w in times.windows(2) {
        assert!(w[0] <= w[1], "{times:?}");
    }
}

#[test]
fn audio_never_runs_ahead_of_later_video() {
    let mux = run(12, 24);
    let mut latest_audio = f64::NEG_INFINITY;
    for p in mux.packets() {
        let t = mux.seconds_of(p).unwrap();
        match p.stream {
            StreamKind::Audio => latest_audio = latest_audio.max(t),
            StreamKind::Video => assert!(latest_audio <= t, "audio {latest_audio} > video {t}"),
        }
    }
}

#[test]
fn audio_covers_the_video_clock() {
    let n = 10u64;
    let mux = run(n as u32, 30);
    let video: Vec<&Packet> = mux
        .packets()
        .iter()
        .filter(|p| p.stream == StreamKind::Video)
        .collect();
    let audio: Vec<&Packet> = mux
        .packets()
        .iter()
        .filter(|p| p.stream == StreamKind::Audio)
        .collect();
    assert_eq!(video.len() as u64, n);
    assert_eq!(
        video.iter().map(|p| p.pts).collect::<Vec<_>>(),
        (0..n as i64).collect::<Vec<_>>()
    );

    // Audio is topped up to the last frame's timestamp and no further.
    let needed = ((n - 1) * 44_100).div_ceil(30 * AUDIO_FRAME_SIZE as u64);
    assert_eq!(audio.len() as u64, needed);
    for (i, p) in audio.iter().enumerate() {
        assert_eq!(p.pts, (i * AUDIO_FRAME_SIZE) as i64);
        assert_eq!(p.data.len(), AUDIO_FRAME_SIZE * 4);
        assert!(p.data.iter().all(|&b| b == 0), "placeholder tone is silent");
    }
}

#[test]
fn odd_dimensions_fail_at_init() {
    let err = EncodeSequencer::new(InMemoryMuxer::new(), 5, 4, 30, &Metadata::default())
        .unwrap_err();
    assert!(matches!(err, FractalError::EncoderInit(_)), "{err}");
}

#[test]
fn mismatched_frame_is_a_write_error() {
    let mut seq =
        EncodeSequencer::new(InMemoryMuxer::new(), 4, 2, 30, &Metadata::default()).unwrap();
    let err = seq.submit_frame(&frame(2, 2, 0)).unwrap_err();
    assert!(matches!(err, FractalError::EncodeWrite(_)), "{err}");
}

#[derive(Debug, Default)]
struct FailingMuxer {
    budget: usize,
}

impl Muxer for FailingMuxer {
    fn write_header(&mut self, _: &[StreamDesc], _: &Metadata) -> FractalResult<()> {
        Ok(())
    }

    fn write_packet(&mut self, _: &Packet) -> FractalResult<()> {
        if self.budget == 0 {
            return Err(FractalError::encode_write("disk full"));
        }
        self.budget -= 1;
        Ok(())
    }

    fn write_trailer(&mut self) -> FractalResult<()> {
        Ok(())
    }
}

#[test]
fn muxer_failures_surface_from_submit() {
    let mut seq =
        EncodeSequencer::new(FailingMuxer { budget: 1 }, 4, 2, 30, &Metadata::default()).unwrap();
    assert_eq!(seq.submit_frame(&frame(4, 2, 0)).unwrap(), 1);
    let err = seq.submit_frame(&frame(4, 2, 0)).unwrap_err();
    assert!(matches!(err, FractalError::EncodeWrite(_)), "{err}");
}
