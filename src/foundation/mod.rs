//! Shared building blocks: configuration types, the error taxonomy and timestamp math.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
