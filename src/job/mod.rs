//! Job layer: the single-flight controller, its events, and the photo and video pipelines that
//! run on the job thread.

pub(crate) mod cancel;
pub(crate) mod controller;
pub(crate) mod events;
pub(crate) mod photo;
pub(crate) mod state;
pub(crate) mod video;

use crate::foundation::error::FractalError;

/// Log `err` and abort the process. Used when threads cannot be created.
pub(crate) fn fatal(err: &FractalError) -> ! {
    tracing::error!(error = %err, "unrecoverable error, aborting");
    std::process::abort()
}
