use crate::foundation::core::Rgb8;

const RED_GAIN: f64 = 256.0 * 9.4;
const GREEN_GAIN: f64 = 256.0 * 15.9;
const BLUE_GAIN: f64 = 256.0 * 9.4;

/// Color table indexed by escape iteration count, `0..=max_iterations`.
///
/// The gradient runs dark → bright → dark, so both "escaped immediately" (index 0) and
/// "never escaped" (index `max_iterations`) are black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    max_iterations: u32,
    colors: Vec<Rgb8>,
}

impl Palette {
    /// Build the table for `max_iterations` (treated as at least 1).
    pub fn build(max_iterations: u32) -> Self {
        let max_iterations = max_iterations.max(1);
        let n = f64::from(max_iterations);
        let colors = (0..=max_iterations)
            .map(|i| {
                let t = f64::from(i) / n;
                let s = 1.0 - t;
                Rgb8::new(
                    channel(RED_GAIN * s * t * t * t),
                    channel(GREEN_GAIN * s * s * t * t),
                    channel(BLUE_GAIN * s * s * s * t),
                )
            })
            .collect();
        Self {
            max_iterations,
            colors,
        }
    }

    /// Iteration cap this table was built for.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Number of entries (`max_iterations + 1`).
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; a palette has at least two entries.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for an iteration count. Counts above the cap map to the in-set color.
    pub fn color(&self, iterations: u32) -> Rgb8 {
        let idx = iterations.min(self.max_iterations) as usize;
        self.colors[idx]
    }

    /// Color used for points that never escaped.
    pub fn in_set(&self) -> Rgb8 {
        self.colors[self.max_iterations as usize]
    }

    /// Borrow the whole table.
    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }
}

fn channel(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Memoized palette: rebuilt only when the requested limit changes.
#[derive(Debug, Default)]
pub struct PaletteCache {
    current: Option<std::sync::Arc<Palette>>,
    builds: u64,
}

impl PaletteCache {
    /// Empty cache; the first request always builds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table for `max_iterations`, building it only if the cached limit differs.
    pub fn get(&mut self, max_iterations: u32) -> std::sync::Arc<Palette> {
        match &self.current {
            Some(p) if p.max_iterations() == max_iterations.max(1) => p.clone(),
            _ => {
                tracing::debug!(max_iterations, "rebuilding palette");
                let p = std::sync::Arc::new(Palette::build(max_iterations));
                self.current = Some(p.clone());
                self.builds += 1;
                p
            }
        }
    }

    /// How many times a table was actually built.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fractal/palette.rs"]
mod tests;
