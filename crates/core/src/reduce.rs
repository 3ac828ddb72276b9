//! Reduction of an RGBA8 readback into a [`ColorGrid`] plus an average color.
//!
//! The readback is row-major, 4 bytes per texel in R, G, B, A order, with
//! the bottom row first as the GPU stores it. Texel `p` of a W×H buffer
//! lands in `grid[x = p % W][y = p / W]`, so `y = 0` is the bottom row.
//! Alpha is ignored. The average is the truncating integer mean of every
//! texel's channels.
//!
//! [`PixelReducer`] owns the staging buffer, the grid, and the average so
//! that steady-state frames of equal size never allocate.

use crate::color::Color;
use crate::error::CaptureError;
use crate::grid::ColorGrid;

/// Bytes per RGBA8 texel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Returns the number of bytes a `width` x `height` RGBA8 frame occupies.
pub fn frame_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(BYTES_PER_PIXEL)
}

/// Reduces `pixels` into `grid` and returns the average color.
///
/// Only the first `grid.width() * grid.height() * 4` bytes are read; a
/// larger (reused) buffer is fine. This is a pure function of `pixels`
/// and the grid dimensions: every cell is overwritten.
///
/// Returns `CaptureError::BufferTooSmall` if `pixels` is too short.
pub fn reduce_rgba(pixels: &[u8], grid: &mut ColorGrid) -> Result<Color, CaptureError> {
    let (width, height) = (grid.width(), grid.height());
    let needed = frame_len(width, height).ok_or(CaptureError::InvalidDimensions)?;
    if pixels.len() < needed {
        return Err(CaptureError::BufferTooSmall {
            needed,
            actual: pixels.len(),
        });
    }

    let (mut sum_r, mut sum_g, mut sum_b) = (0u64, 0u64, 0u64);
    for (p, texel) in pixels[..needed].chunks_exact(BYTES_PER_PIXEL).enumerate() {
        let (r, g, b) = (texel[0], texel[1], texel[2]);
        sum_r += u64::from(r);
        sum_g += u64::from(g);
        sum_b += u64::from(b);
        grid.cell_mut(p % width, p / width).set(r, g, b);
    }

    let count = (width * height) as u64;
    Ok(Color::new(
        (sum_r / count) as u8,
        (sum_g / count) as u8,
        (sum_b / count) as u8,
    ))
}

/// Grow-only RGBA8 staging buffer for GPU readback.
///
/// The backing storage is never shrunk, so switching between dimensions
/// only allocates when a frame larger than any seen before is requested.
#[derive(Debug, Default, Clone)]
pub struct PixelBuffer {
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes currently available.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Grows the buffer so it holds at least one `width` x `height` frame.
    pub fn ensure_frame(&mut self, width: usize, height: usize) -> Result<(), CaptureError> {
        let needed = frame_len(width, height).ok_or(CaptureError::InvalidDimensions)?;
        if self.bytes.len() < needed {
            self.bytes.resize(needed, 0);
        }
        Ok(())
    }

    /// The first `width` x `height` frame of the buffer, for the backend to fill.
    pub fn frame_mut(&mut self, width: usize, height: usize) -> Result<&mut [u8], CaptureError> {
        let needed = frame_len(width, height).ok_or(CaptureError::InvalidDimensions)?;
        let actual = self.bytes.len();
        self.bytes
            .get_mut(..needed)
            .ok_or(CaptureError::BufferTooSmall { needed, actual })
    }

    /// Read-only access to the whole buffer.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Owns the per-frame reduction state: staging buffer, grid, and average.
#[derive(Debug, Clone)]
pub struct PixelReducer {
    buffer: PixelBuffer,
    grid: ColorGrid,
    average: Color,
}

impl PixelReducer {
    /// Creates a reducer for a `width` x `height` grid.
    ///
    /// Returns `CaptureError::InvalidDimensions` if either dimension is zero
    /// or a frame of that size would overflow `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, CaptureError> {
        let mut buffer = PixelBuffer::new();
        buffer.ensure_frame(width, height)?;
        let grid = ColorGrid::new(width, height)?;
        Ok(Self {
            buffer,
            grid,
            average: Color::BLACK,
        })
    }

    /// Matches the grid to `width` x `height`.
    ///
    /// Reallocates (and blackens) the grid and resets the average only when
    /// the dimensions differ. The staging buffer only ever grows. Returns
    /// `true` if anything was reallocated.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<bool, CaptureError> {
        if self.grid.has_dimensions(width, height) {
            return Ok(false);
        }
        self.buffer.ensure_frame(width, height)?;
        self.grid = ColorGrid::new(width, height)?;
        self.average = Color::BLACK;
        Ok(true)
    }

    /// Blackens the grid and average, keeping every allocation.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.average = Color::BLACK;
    }

    /// Staging bytes for exactly one frame at the current grid size.
    pub fn staging_mut(&mut self) -> Result<&mut [u8], CaptureError> {
        self.buffer.frame_mut(self.grid.width(), self.grid.height())
    }

    /// Reduces the staged frame into the grid and average.
    pub fn reduce(&mut self) -> Result<Color, CaptureError> {
        self.average = reduce_rgba(self.buffer.as_bytes(), &mut self.grid)?;
        Ok(self.average)
    }

    /// The grid produced by the last reduction.
    pub fn grid(&self) -> &ColorGrid {
        &self.grid
    }

    /// The average produced by the last reduction.
    pub fn average(&self) -> Color {
        self.average
    }

    /// Bytes held by the staging buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }
}
