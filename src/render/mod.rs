//! Parallel rasterization: owned frame buffers, the row-partitioned worker pool and progress.

pub(crate) mod frame;
pub(crate) mod pool;
pub(crate) mod progress;
