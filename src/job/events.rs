use std::path::PathBuf;

use crossbeam_channel::Receiver;

/// Which pipeline a job runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Single PNG still.
    Photo,
    /// Zooming video.
    Video,
}

/// Final result of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// The output file was written.
    Saved(PathBuf),
    /// The job stopped early; the message describes why.
    Failed(String),
}

/// Message from a job thread to its caller.
#[derive(Clone, Debug, PartialEq)]
pub enum JobEvent {
    /// Photo: completed-row fraction in `0.0..1.0`. Video: seconds of video encoded so far.
    Progress(f32),
    /// Sent exactly once, after the controller is idle again.
    Complete(JobOutcome),
}

/// Caller side of an accepted job.
#[derive(Debug)]
pub struct JobHandle {
    kind: JobKind,
    events: Receiver<JobEvent>,
}

impl JobHandle {
    pub(crate) fn new(kind: JobKind, events: Receiver<JobEvent>) -> Self {
        Self { kind, events }
    }

    /// Pipeline this job runs.
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Raw event stream, for callers that multiplex it with other channels.
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Block until the job completes, forwarding every progress value to `on_progress`.
    pub fn wait(self, mut on_progress: impl FnMut(f32)) -> JobOutcome {
        for event in self.events.iter() {
            match event {
                JobEvent::Progress(p) => on_progress(p),
                JobEvent::Complete(outcome) => return outcome,
            }
        }
        JobOutcome::Failed("job thread exited without reporting completion".to_owned())
    }
}
