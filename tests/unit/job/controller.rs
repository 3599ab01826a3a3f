use std::path::PathBuf;
use std::time::Duration;

use super::*;

fn small_config() -> FractalConfig {
    FractalConfig {
        x: -0.5,
        y: 0.0,
        zoom: 0.8,
        width: 16,
        height: 8,
        max_iterations: 32,
        threads: 2,
        ..FractalConfig::default()
    }
}

fn avi_frames(path: &Path) -> u32 {
    let b = std::fs::read(path).unwrap();
    assert_eq!(&b[0..4], b"RIFF");
    assert_eq!(
        u32::from_le_bytes([b[4], b[5], b[6], b[7]]) as usize,
        b.len() - 8
    );
    u32::from_le_bytes([b[48], b[49], b[50], b[51]])
}

/// Drain events until completion, checking the controller is idle by then.
fn finish(ctl: &JobController, handle: JobHandle) -> (Vec<f32>, JobOutcome) {
    let mut progress = Vec::new();
    loop {
        match handle
            .events()
            .recv_timeout(Duration::from_secs(60))
            .unwrap()
        {
            JobEvent::Progress(p) => progress.push(p),
            JobEvent::Complete(outcome) => {
                assert_eq!(ctl.state(), JobState::Idle);
                return (progress, outcome);
            }
        }
    }
}

#[test]
fn invalid_requests_are_rejected_synchronously() {
    let ctl = JobController::new();
    let cfg = small_config();

    let err = ctl.begin_photo(&cfg, "", false).unwrap_err();
    assert!(matches!(err, FractalError::InvalidArgs(_)), "{err}");

    let bad = FractalConfig {
        width: 0,
        ..small_config()
    };
    let err = ctl.begin_photo(&bad, "x.png", false).unwrap_err();
    assert!(matches!(err, FractalError::InvalidArgs(_)), "{err}");

    let err = ctl
        .begin_video(&cfg, VideoParams::new(1.0, 1.02, 0), "x.avi")
        .unwrap_err();
    assert!(matches!(err, FractalError::InvalidArgs(_)), "{err}");
    assert!(err.is_rejection());

    assert_eq!(ctl.state(), JobState::Idle);
}

#[test]
fn photo_job_reports_zero_first_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.png");
    let ctl = JobController::new();

    let handle = ctl.begin_photo(&small_config(), &path, true).unwrap();
    assert_eq!(handle.kind(), JobKind::Photo);
    assert_eq!(handle.events().try_recv(), Ok(JobEvent::Progress(0.0)));

    let (progress, outcome) = finish(&ctl, handle);
    assert_eq!(outcome, JobOutcome::Saved(path.clone()));
    assert!(progress.iter().all(|p| (0.0..1.0).contains(p)));
    assert!(path.is_file());
}

#[test]
fn photo_without_progress_sends_only_completion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quiet.png");
    let ctl = JobController::new();
    let handle = ctl.begin_photo(&small_config(), &path, false).unwrap();
    let (progress, outcome) = finish(&ctl, handle);
    assert!(progress.is_empty());
    assert_eq!(outcome, JobOutcome::Saved(path));
}

#[test]
fn photo_write_failure_is_reported_and_controller_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let ctl = JobController::new();

    let handle = ctl
        .begin_photo(&small_config(), blocker.join("out.png"), false)
        .unwrap();
    let (_, outcome) = finish(&ctl, handle);
    assert!(matches!(outcome, JobOutcome::Failed(_)), "{outcome:?}");

    let ok = dir.path().join("ok.png");
    let handle = ctl.begin_photo(&small_config(), &ok, false).unwrap();
    assert_eq!(finish(&ctl, handle).1, JobOutcome::Saved(ok));
}

#[test]
fn video_with_frame_limit_writes_exactly_that_many_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("five.avi");
    let ctl = JobController::new();
    let params = VideoParams::new(0.8, 1.02, 30).with_frame_limit(5);

    let handle = ctl.begin_video(&small_config(), params, &path).unwrap();
    assert_eq!(handle.kind(), JobKind::Video);
    let (progress, outcome) = finish(&ctl, handle);

    assert_eq!(outcome, JobOutcome::Saved(path.clone()));
    let expected: Vec<f32> = (0..=5).map(|n| n as f32 / 30.0).collect();
    assert_eq!(progress, expected);
    assert_eq!(avi_frames(&path), 5);
}

#[test]
fn busy_rejects_without_disturbing_the_running_video() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("open_ended.avi");
    let ctl = JobController::new();

    let handle = ctl
        .begin_video(&small_config(), VideoParams::new(0.8, 1.01, 30), &path)
        .unwrap();
    let events = handle.events();
    assert_eq!(events.recv().unwrap(), JobEvent::Progress(0.0));
    // Wait for the first encoded frame so the job is definitely mid-stream.
    assert!(matches!(
        events.recv_timeout(Duration::from_secs(60)).unwrap(),
        JobEvent::Progress(p) if p > 0.0
    ));
    assert_eq!(ctl.state(), JobState::Busy);

    let other = dir.path().join("other.png");
    assert!(matches!(
        ctl.begin_photo(&small_config(), &other, true),
        Err(FractalError::Busy)
    ));
    assert!(matches!(
        ctl.begin_video(&small_config(), VideoParams::new(1.0, 1.0, 30), &other),
        Err(FractalError::Busy)
    ));

    ctl.request_stop_video();
    ctl.request_stop_video();
    let (rest, outcome) = finish(&ctl, handle);
    assert_eq!(outcome, JobOutcome::Saved(path.clone()));
    assert!(!other.exists());

    // One frame seen above plus one progress event per later frame.
    let frames = 1 + rest.len() as u32;
    assert_eq!(avi_frames(&path), frames);
}

#[test]
fn stop_request_while_idle_does_not_leak_into_next_video() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.avi");
    let ctl = JobController::new();
    ctl.request_stop_video();

    let params = VideoParams::new(0.8, 1.02, 30).with_frame_limit(2);
    let handle = ctl.begin_video(&small_config(), params, &path).unwrap();
    let (_, outcome) = finish(&ctl, handle);
    assert_eq!(outcome, JobOutcome::Saved(path.clone()));
    assert_eq!(avi_frames(&path), 2);
}

#[test]
fn palette_is_rebuilt_only_when_the_cap_changes() {
    let dir = tempfile::tempdir().unwrap();
    let ctl = JobController::new();
    let run = |cfg: &FractalConfig, name: &str| {
        let path: PathBuf = dir.path().join(name);
        let handle = ctl.begin_photo(cfg, &path, false).unwrap();
        assert_eq!(finish(&ctl, handle).1, JobOutcome::Saved(path));
    };

    run(&small_config(), "a.png");
    run(&small_config(), "b.png");
    assert_eq!(ctl.palette_builds(), 1);

    run(
        &FractalConfig {
            max_iterations: 48,
            ..small_config()
        },
        "c.png",
    );
    assert_eq!(ctl.palette_builds(), 2);
}

#[test]
fn failed_video_setup_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let ctl = JobController::new();
    let odd = FractalConfig {
        width: 15,
        ..small_config()
    };
    let handle = ctl
        .begin_video(
            &odd,
            VideoParams::new(1.0, 1.0, 30).with_frame_limit(1),
            dir.path().join("odd.avi"),
        )
        .unwrap();
    let (progress, outcome) = finish(&ctl, handle);
    assert_eq!(progress, vec![0.0]);
    assert!(matches!(outcome, JobOutcome::Failed(ref m) if m.contains("even")), "{outcome:?}");
}
