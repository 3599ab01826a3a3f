use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Whether a render job is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    /// Ready to accept a job.
    Idle = 0,
    /// A job is running; new requests are rejected.
    Busy = 1,
}

/// Atomic [`JobState`] with a checked `Idle -> Busy` transition.
#[derive(Debug, Default)]
pub(crate) struct JobStateCell(AtomicU8);

impl JobStateCell {
    pub(crate) fn load(&self) -> JobState {
        match self.0.load(Ordering::Acquire) {
            0 => JobState::Idle,
            _ => JobState::Busy,
        }
    }

    /// Move `Idle -> Busy`. Returns `None` if a job already holds the cell.
    pub(crate) fn try_acquire(self: &Arc<Self>) -> Option<BusyGuard> {
        self.0
            .compare_exchange(
                JobState::Idle as u8,
                JobState::Busy as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| BusyGuard(Arc::clone(self)))
    }
}

/// Proof of a successful acquire. Dropping it moves the cell back to `Idle`, on every exit path.
#[derive(Debug)]
pub(crate) struct BusyGuard(Arc<JobStateCell>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.0.store(JobState::Idle as u8, Ordering::Release);
    }
}
