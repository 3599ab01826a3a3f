use crate::foundation::error::{FractalError, FractalResult};

/// Bytes per packed RGB pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// Owned, row-major packed RGB24 pixel buffer.
///
/// Exactly one buffer is live per job. It moves by value between the worker pool, the pipeline
/// and the encoder, and is never aliased outside the job that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed `width × height` buffer.
    pub fn new(width: u32, height: u32) -> FractalResult<Self> {
        if width == 0 || height == 0 {
            return Err(FractalError::invalid_args(
                "frame buffer width/height must be non-zero",
            ));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| FractalError::invalid_args("frame buffer size overflows usize"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw packed pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (`col`, `row`).
    pub fn pixel(&self, col: u32, row: u32) -> Option<[u8; 3]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = row as usize * self.stride() + col as usize * BYTES_PER_PIXEL;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Split the buffer into `workers` disjoint row sets, worker `k` owning rows
    /// `k, k + workers, k + 2·workers, …`.
    pub fn partition_rows(&mut self, workers: usize) -> Vec<RowSet<'_>> {
        let workers = workers.max(1);
        let mut sets: Vec<RowSet<'_>> = (0..workers)
            .map(|worker| RowSet {
                worker,
                rows: Vec::with_capacity(self.height as usize / workers + 1),
            })
            .collect();
        let stride = self.stride();
        for (row, slice) in self.data.chunks_exact_mut(stride).enumerate() {
            sets[row % workers].rows.push((row as u32, slice));
        }
        sets
    }

    /// Consume the buffer, returning its pixels.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Rows owned by one worker for one frame.
#[derive(Debug)]
pub struct RowSet<'a> {
    worker: usize,
    rows: Vec<(u32, &'a mut [u8])>,
}

impl<'a> RowSet<'a> {
    /// Index of the worker this set belongs to.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Number of rows in the set.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the worker has no rows (more workers than rows).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row indices in ascending order.
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter().map(|(r, _)| *r)
    }
}

impl<'a> IntoIterator for RowSet<'a> {
    type Item = (u32, &'a mut [u8]);
    type IntoIter = std::vec::IntoIter<(u32, &'a mut [u8])>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
