//! Escape-time iteration for the Mandelbrot and Julia families.

use crate::foundation::core::{FractalConfig, Rgb8};
use crate::fractal::palette::Palette;

/// Squared bailout radius (radius 2).
pub const BAILOUT_SQ: f64 = 4.0;

/// Which recurrence constant to use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Variant {
    /// `c` is the sampled point itself.
    Mandelbrot,
    /// `c` is a fixed seed shared by every pixel.
    Julia {
        /// Seed, real part.
        x0: f64,
        /// Seed, imaginary part.
        y0: f64,
    },
}

/// Count iterations of `z' = z² + c` starting at `z = (xc, yc)` until `|z|² > 4` or the cap.
///
/// Returns a value in `0..=max_iterations`; the cap itself means the point never escaped.
#[inline]
pub fn escape_iterations(variant: Variant, xc: f64, yc: f64, max_iterations: u32) -> u32 {
    let (cx, cy) = match variant {
        Variant::Mandelbrot => (xc, yc),
        Variant::Julia { x0, y0 } => (x0, y0),
    };
    let (mut x, mut y) = (xc, yc);
    let mut iterations = 0;
    while iterations < max_iterations {
        let xx = x * x;
        let yy = y * y;
        if xx + yy > BAILOUT_SQ {
            break;
        }
        y = 2.0 * x * y + cy;
        x = xx - yy + cx;
        iterations += 1;
    }
    iterations
}

/// Pixel-to-plane mapping plus everything a worker needs to color one pixel.
///
/// This is the per-frame snapshot handed to the worker pool; it is `Copy` apart from the shared
/// palette so every worker reads the same immutable view.
#[derive(Clone, Debug)]
pub struct FractalView {
    /// Plane coordinate at the image center, real part.
    pub center_x: f64,
    /// Plane coordinate at the image center, imaginary part.
    pub center_y: f64,
    /// Pixels per plane unit.
    pub scale: f64,
    /// Recurrence variant.
    pub variant: Variant,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Shared color table; its limit is the iteration cap.
    pub palette: std::sync::Arc<Palette>,
}

impl FractalView {
    /// Build the view described by `cfg`, coloring with `palette`.
    pub fn from_config(cfg: &FractalConfig, palette: std::sync::Arc<Palette>) -> Self {
        let (center_x, center_y, variant) = if cfg.use_julia {
            (
                cfg.julia_x,
                cfg.julia_y,
                Variant::Julia {
                    x0: cfg.x,
                    y0: cfg.y,
                },
            )
        } else {
            (cfg.x, cfg.y, Variant::Mandelbrot)
        };
        Self {
            center_x,
            center_y,
            scale: scale_for(cfg.active_zoom(), cfg.height),
            variant,
            width: cfg.width,
            height: cfg.height,
            palette,
        }
    }

    /// Replace the zoom factor, keeping center and variant.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.scale = scale_for(zoom, self.height);
    }

    /// Plane coordinate of pixel (`col`, `row`). Rows grow downward, imaginary axis upward.
    #[inline]
    pub fn plane_point(&self, col: u32, row: u32) -> (f64, f64) {
        let half_w = f64::from(self.width) / 2.0;
        let half_h = f64::from(self.height) / 2.0;
        (
            self.center_x + (f64::from(col) - half_w) / self.scale,
            self.center_y - (f64::from(row) - half_h) / self.scale,
        )
    }

    /// Escape count of pixel (`col`, `row`).
    #[inline]
    pub fn iterations_at(&self, col: u32, row: u32) -> u32 {
        let (xc, yc) = self.plane_point(col, row);
        escape_iterations(self.variant, xc, yc, self.palette.max_iterations())
    }

    /// Color of pixel (`col`, `row`).
    #[inline]
    pub fn color_at(&self, col: u32, row: u32) -> Rgb8 {
        self.palette.color(self.iterations_at(col, row))
    }

    /// Fill one packed RGB row.
    pub fn fill_row(&self, row: u32, out: &mut [u8]) {
        for (col, px) in out.chunks_exact_mut(3).enumerate() {
            let c = self.color_at(col as u32, row);
            px[0] = c.r;
            px[1] = c.g;
            px[2] = c.b;
        }
    }
}

/// `zoom` is relative to half the image height.
fn scale_for(zoom: f64, height: u32) -> f64 {
    zoom * f64::from(height) / 2.0
}

#[cfg(test)]
#[path = "../../tests/unit/fractal/escape.rs"]
mod tests;
