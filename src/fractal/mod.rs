//! Fractal math: the iteration-count palette and the escape-time evaluator.

pub(crate) mod escape;
pub(crate) mod palette;
