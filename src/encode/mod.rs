//! Output side: PNG stills, and the video path from RGB frames to a finished container.
//!
//! Video frames flow through [`sequencer::EncodeSequencer`], which interleaves them with the
//! placeholder audio track and writes AVI: into a file via [`avi::AviMuxer`], or as a stream via
//! [`avi::AviStreamMuxer`] into an `ffmpeg` process for other containers. [`session::VideoSession`]
//! picks between the two.

pub(crate) mod audio;
pub(crate) mod avi;
pub(crate) mod codec;
pub(crate) mod ffmpeg;
pub(crate) mod mux;
pub(crate) mod png;
pub(crate) mod sequencer;
pub(crate) mod session;
pub(crate) mod video;
