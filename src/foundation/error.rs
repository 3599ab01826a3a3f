/// Convenience result type used across the crate.
pub type FractalResult<T> = Result<T, FractalError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FractalError {
    /// A required job parameter is missing or out of range. No job was started.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// A render job is already running. The request was rejected, not queued.
    #[error("busy: a render job is already running")]
    Busy,

    /// Container, codec, resampler or output setup failed before any frame was produced.
    #[error("encoder init error: {0}")]
    EncoderInit(String),

    /// A frame failed to encode or write after the stream was started.
    #[error("encode write error: {0}")]
    EncodeWrite(String),

    /// Worker or job threads could not be created. Callers treat this as fatal.
    #[error("thread creation error: {0}")]
    ThreadSpawn(String),

    /// Still-image encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FractalError {
    /// Build a [`FractalError::InvalidArgs`] value.
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Build a [`FractalError::EncoderInit`] value.
    pub fn encoder_init(msg: impl Into<String>) -> Self {
        Self::EncoderInit(msg.into())
    }

    /// Build a [`FractalError::EncodeWrite`] value.
    pub fn encode_write(msg: impl Into<String>) -> Self {
        Self::EncodeWrite(msg.into())
    }

    /// Build a [`FractalError::ThreadSpawn`] value.
    pub fn thread_spawn(msg: impl Into<String>) -> Self {
        Self::ThreadSpawn(msg.into())
    }

    /// `true` for the errors returned synchronously by job submission.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidArgs(_) | Self::Busy)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
