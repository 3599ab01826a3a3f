use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{FractalError, FractalResult};

/// Packed 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Render configuration for one fractal view.
///
/// In Mandelbrot mode the view is centered on (`x`, `y`) at `zoom`. In Julia mode (`x`, `y`)
/// becomes the fixed Julia seed and the view is centered on (`julia_x`, `julia_y`) at
/// `julia_zoom`.
///
/// Jobs take a copy of this value when they are accepted, so callers can keep editing their
/// working copy while a job runs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    /// Mandelbrot view center, real part (Julia seed in Julia mode).
    pub x: f64,
    /// Mandelbrot view center, imaginary part (Julia seed in Julia mode).
    pub y: f64,
    /// Mandelbrot zoom factor. `1.0` maps half the image height to one plane unit.
    pub zoom: f64,
    /// Render the Julia set seeded at (`x`, `y`) instead of the Mandelbrot set.
    pub use_julia: bool,
    /// Julia view center, real part.
    pub julia_x: f64,
    /// Julia view center, imaginary part.
    pub julia_y: f64,
    /// Julia zoom factor.
    pub julia_zoom: f64,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Iteration cap; also the in-set palette index.
    pub max_iterations: u32,
    /// Worker threads used per frame.
    pub threads: usize,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            x: -0.5,
            y: 0.0,
            zoom: 0.8,
            use_julia: false,
            julia_x: 0.0,
            julia_y: 0.0,
            julia_zoom: 0.8,
            width: 1280,
            height: 720,
            max_iterations: 256,
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl FractalConfig {
    /// Load a config from a JSON file. Missing fields take their default values.
    pub fn from_path(path: &Path) -> FractalResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that every field is usable for a render job.
    pub fn validate(&self) -> FractalResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FractalError::invalid_args(
                "config width/height must be non-zero",
            ));
        }
        if self.max_iterations == 0 {
            return Err(FractalError::invalid_args(
                "config max_iterations must be >= 1",
            ));
        }
        if self.threads == 0 {
            return Err(FractalError::invalid_args("config threads must be >= 1"));
        }
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("julia_x", self.julia_x),
            ("julia_y", self.julia_y),
        ] {
            if !v.is_finite() {
                return Err(FractalError::invalid_args(format!(
                    "config {name} must be finite"
                )));
            }
        }
        for (name, v) in [("zoom", self.zoom), ("julia_zoom", self.julia_zoom)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(FractalError::invalid_args(format!(
                    "config {name} must be finite and > 0"
                )));
            }
        }
        Ok(())
    }

    /// Zoom of whichever view (Mandelbrot or Julia) is active.
    pub fn active_zoom(&self) -> f64 {
        if self.use_julia {
            self.julia_zoom
        } else {
            self.zoom
        }
    }

    /// Replace the zoom of the active view.
    pub fn set_active_zoom(&mut self, zoom: f64) {
        if self.use_julia {
            self.julia_zoom = zoom;
        } else {
            self.zoom = zoom;
        }
    }

    /// Human readable title used in video container metadata.
    pub fn title(&self) -> String {
        let (cx, cy) = if self.use_julia {
            (self.julia_x, self.julia_y)
        } else {
            (self.x, self.y)
        };
        format!("Fractal cartesian coordinates: ({cx:.4} , {cy:.4})")
    }
}

/// Parameters specific to zooming video jobs.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoParams {
    /// Zoom of the first frame as plane-scale per pixel of image height
    /// (`scale = zoom_start * height`). This is twice the unit of [`FractalConfig::zoom`],
    /// which is relative to half the height; see [`VideoParams::first_frame_zoom`].
    pub zoom_start: f64,
    /// Per-frame zoom multiplier.
    pub zoom_step: f64,
    /// Output frames per second.
    pub framerate: u32,
    /// Stop on its own after this many frames. `None` runs until a stop request.
    pub frame_limit: Option<u64>,
}

impl VideoParams {
    /// Parameters for an open-ended zoom stopped by [`crate::JobController::request_stop_video`].
    pub fn new(zoom_start: f64, zoom_step: f64, framerate: u32) -> Self {
        Self {
            zoom_start,
            zoom_step,
            framerate,
            frame_limit: None,
        }
    }

    /// Stop automatically after `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// `zoom_start` converted to [`FractalConfig::zoom`] units.
    pub fn first_frame_zoom(&self) -> f64 {
        self.zoom_start * 2.0
    }

    /// Check that the parameters describe a usable video.
    pub fn validate(&self) -> FractalResult<()> {
        if self.framerate == 0 {
            return Err(FractalError::invalid_args("video framerate must be >= 1"));
        }
        if !self.zoom_start.is_finite() || self.zoom_start <= 0.0 {
            return Err(FractalError::invalid_args(
                "video zoom_start must be finite and > 0",
            ));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(FractalError::invalid_args(
                "video zoom_step must be finite and > 0",
            ));
        }
        if self.frame_limit == Some(0) {
            return Err(FractalError::invalid_args(
                "video frame_limit must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
