use super::*;
use crate::foundation::core::FractalConfig;
use crate::fractal::palette::Palette;
use crate::render::progress::PROGRESS_POLL_INTERVAL;
use std::sync::Arc;

fn cfg(width: u32, height: u32) -> FractalConfig {
    FractalConfig {
        x: -0.75,
        y: 0.1,
        zoom: 1.3,
        width,
        height,
        max_iterations: 128,
        threads: 1,
        ..FractalConfig::default()
    }
}

fn view(c: &FractalConfig) -> FractalView {
    FractalView::from_config(c, Arc::new(Palette::build(c.max_iterations)))
}

fn reference(v: &FractalView) -> Vec<u8> {
    let mut out = vec![0u8; v.width as usize * v.height as usize * 3];
    for (row, chunk) in out.chunks_exact_mut(v.width as usize * 3).enumerate() {
        v.fill_row(row as u32, chunk);
    }
    out
}

#[test]
fn zero_threads_is_rejected() {
    assert!(matches!(
        WorkerPool::new(0),
        Err(FractalError::InvalidArgs(_))
    ));
}

#[test]
fn output_is_independent_of_thread_count() {
    let c = cfg(37, 23);
    let v = view(&c);
    let expected = reference(&v);
    for threads in [1usize, 2, 3, 4, 8, 40] {
        let pool = WorkerPool::new(threads).unwrap();
        let mut fb = FrameBuffer::new(c.width, c.height).unwrap();
        pool.render(&v, &mut fb).unwrap();
        assert_eq!(fb.data(), expected.as_slice(), "threads={threads}");
    }
}

#[test]
fn size_mismatch_is_rejected() {
    let c = cfg(16, 16);
    let v = view(&c);
    let pool = WorkerPool::new(2).unwrap();
    let mut fb = FrameBuffer::new(8, 16).unwrap();
    assert!(pool.render(&v, &mut fb).is_err());
}

#[test]
fn progress_counts_every_row() {
    let c = cfg(64, 97);
    let v = view(&c);
    let pool = WorkerPool::new(4).unwrap();
    let tracker = ProgressTracker::new(c.height);
    let mut fb = FrameBuffer::new(c.width, c.height).unwrap();
    let mut reports = Vec::new();
    pool.render_with_progress(&v, &mut fb, &tracker, PROGRESS_POLL_INTERVAL, |f| {
        reports.push(f)
    })
    .unwrap();

    assert_eq!(tracker.completed(), c.height);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert!(reports.iter().all(|f| *f < 1.0));
    assert_eq!(fb.data(), reference(&v).as_slice());

    // Reusing the tracker starts from zero again.
    pool.render_with_progress(&v, &mut fb, &tracker, PROGRESS_POLL_INTERVAL, |_| {})
        .unwrap();
    assert_eq!(tracker.completed(), c.height);
}
