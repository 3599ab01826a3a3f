use super::*;
use crate::encode::codec::StreamKind;
use crate::encode::mux::InMemoryMuxer;
use crate::encode::sequencer::EncodeSequencer;
use crate::foundation::error::FractalError;

fn config(width: u32, height: u32) -> FractalConfig {
    FractalConfig {
        x: -0.745,
        y: 0.1,
        width,
        height,
        max_iterations: 64,
        threads: 3,
        ..FractalConfig::default()
    }
}

fn view_for(cfg: &FractalConfig) -> FractalView {
    FractalView::from_config(cfg, Arc::new(Palette::build(cfg.max_iterations)))
}

/// Keeps a copy of every frame; optionally fails on the nth push.
#[derive(Default)]
struct RecordingSink {
    frames: Vec<Vec<u8>>,
    fail_at: Option<usize>,
}

impl FrameSink for RecordingSink {
    type Output = Vec<Vec<u8>>;

    fn push_frame(&mut self, frame: &FrameBuffer) -> FractalResult<i64> {
        if self.fail_at == Some(self.frames.len()) {
            return Err(FractalError::encode_write("sink full"));
        }
        self.frames.push(frame.data().to_vec());
        Ok(self.frames.len() as i64)
    }

    fn finish(self) -> FractalResult<Vec<Vec<u8>>> {
        Ok(self.frames)
    }
}

#[test]
fn stop_after_five_frames_yields_exactly_five() {
    let cfg = config(16, 8);
    let pool = WorkerPool::new(cfg.threads).unwrap();
    let params = VideoParams::new(0.8, 1.02, 30);
    let seq = EncodeSequencer::new(InMemoryMuxer::new(), 16, 8, 30, &Metadata::titled("t")).unwrap();
    let stop = CancellationToken::new();

    let mut elapsed = Vec::new();
    let summary = run_zoom(&pool, view_for(&cfg), &params, seq, &stop, |s| {
        elapsed.push(s);
        if elapsed.len() == 5 {
            stop.cancel();
        }
    })
    .unwrap();

    assert_eq!(summary.frames, 5);
    let mux = summary.output;
    assert!(mux.is_finished());
    let video: Vec<i64> = mux
        .packets()
        .iter()
        .filter(|p| p.stream == StreamKind::Video)
        .map(|p| p.pts)
        .collect();
    assert_eq!(video, vec![0, 1, 2, 3, 4]);
    let expected: Vec<f32> = (1..=5).map(|n| n as f32 / 30.0).collect();
    assert_eq!(elapsed, expected);
}

#[test]
fn frame_limit_stops_the_loop() {
    let cfg = config(8, 8);
    let pool = WorkerPool::new(2).unwrap();
    let params = VideoParams::new(1.0, 1.1, 10).with_frame_limit(3);
    let summary = run_zoom(
        &pool,
        view_for(&cfg),
        &params,
        RecordingSink::default(),
        &CancellationToken::new(),
        |_| {},
    )
    .unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.output.len(), 3);
}

#[test]
fn preset_stop_still_finalizes_an_empty_stream() {
    let cfg = config(8, 8);
    let pool = WorkerPool::new(1).unwrap();
    let stop = CancellationToken::new();
    stop.cancel();
    let seq = EncodeSequencer::new(InMemoryMuxer::new(), 8, 8, 30, &Metadata::default()).unwrap();
    let summary = run_zoom(
        &pool,
        view_for(&cfg),
        &VideoParams::new(1.0, 1.1, 30),
        seq,
        &stop,
        |_| {},
    )
    .unwrap();
    assert_eq!(summary.frames, 0);
    assert!(summary.output.is_finished());
    assert!(summary.output.packets().is_empty());
}

#[test]
fn each_frame_multiplies_zoom_by_step() {
    let cfg = config(12, 10);
    let pool = WorkerPool::new(2).unwrap();
    let params = VideoParams::new(2.0, 1.5, 24).with_frame_limit(3);
    let summary = run_zoom(
        &pool,
        view_for(&cfg),
        &params,
        RecordingSink::default(),
        &CancellationToken::new(),
        |_| {},
    )
    .unwrap();

    let mut zoom = params.first_frame_zoom();
    for recorded in &summary.output {
        let mut view = view_for(&cfg);
        view.set_zoom(zoom);
        let mut expected = FrameBuffer::new(12, 10).unwrap();
        pool.render(&view, &mut expected).unwrap();
        assert_eq!(recorded.as_slice(), expected.data());
        zoom *= 1.5;
    }
}

#[test]
fn first_frame_scale_is_zoom_start_times_height() {
    let cfg = config(12, 10);
    let pool = WorkerPool::new(2).unwrap();
    let params = VideoParams::new(3.0, 1.5, 24).with_frame_limit(1);
    let summary = run_zoom(
        &pool,
        view_for(&cfg),
        &params,
        RecordingSink::default(),
        &CancellationToken::new(),
        |_| {},
    )
    .unwrap();

    let mut view = view_for(&cfg);
    view.scale = 3.0 * 10.0;
    let mut expected = FrameBuffer::new(12, 10).unwrap();
    pool.render(&view, &mut expected).unwrap();
    assert_eq!(summary.output[0].as_slice(), expected.data());

    // Same picture as a still at twice the zoom.
    let still = view_for(&FractalConfig {
        zoom: 6.0,
        ..cfg.clone()
    });
    assert_eq!(still.scale, view.scale);
}

#[test]
fn submission_failure_aborts_without_finishing() {
    let cfg = config(8, 8);
    let pool = WorkerPool::new(2).unwrap();
    let sink = RecordingSink {
        fail_at: Some(2),
        ..RecordingSink::default()
    };
    let mut frames_reported = 0;
    let err = run_zoom(
        &pool,
        view_for(&cfg),
        &VideoParams::new(1.0, 1.1, 30),
        sink,
        &CancellationToken::new(),
        |_| frames_reported += 1,
    )
    .unwrap_err();
    assert!(matches!(err, FractalError::EncodeWrite(_)));
    assert_eq!(frames_reported, 2);
}

#[test]
fn run_video_writes_avi_with_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(16, 8);
    let job = VideoJob {
        palette: Arc::new(Palette::build(cfg.max_iterations)),
        config: cfg,
        params: VideoParams::new(0.8, 1.02, 30).with_frame_limit(4),
        path: dir.path().join("zoom.avi"),
    };
    let mut calls = 0;
    let out = run_video(&job, &CancellationToken::new(), |_| calls += 1).unwrap();
    assert_eq!(out, job.path);
    assert_eq!(calls, 4);

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes([bytes[48], bytes[49], bytes[50], bytes[51]]), 4);
}

#[test]
fn run_video_rejects_odd_dimensions_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(15, 8);
    let job = VideoJob {
        palette: Arc::new(Palette::build(cfg.max_iterations)),
        config: cfg,
        params: VideoParams::new(0.8, 1.02, 30).with_frame_limit(1),
        path: dir.path().join("odd.avi"),
    };
    let err = run_video(&job, &CancellationToken::new(), |_| {}).unwrap_err();
    assert!(matches!(err, FractalError::EncoderInit(_)), "{err}");
    assert!(!job.path.exists());
}
