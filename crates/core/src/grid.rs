//! Two-dimensional grid of [`Color`] cells addressed as `[x][y]`.
//!
//! A `ColorGrid` stores `width * height` colors column by column, so all
//! cells of column `x` are contiguous. This matches the `[x][y]` indexing
//! consumers use when walking a strip of lights left to right. Cells are
//! mutated in place; the grid is only reallocated when its dimensions change.

use crate::color::Color;
use crate::error::CaptureError;
use std::ops::Index;

/// A W×H grid of colors, every cell starting black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGrid {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl ColorGrid {
    /// Creates a black grid of the given dimensions.
    ///
    /// Returns `CaptureError::InvalidDimensions` if either dimension is zero
    /// or if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(CaptureError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            cells: vec![Color::BLACK; len],
        })
    }

    /// Grid width in cells (the `x` extent).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells (the `y` extent).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if the grid already has the given dimensions.
    pub fn has_dimensions(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    fn index_of(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Returns the cell at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.width && y < self.height).then(|| self.cells[self.index_of(x, y)])
    }

    /// Mutable access to the cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Color {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) out of bounds for {}x{} grid",
            self.width,
            self.height
        );
        let idx = self.index_of(x, y);
        &mut self.cells[idx]
    }

    /// The cells of column `x`, bottom to top.
    pub fn column(&self, x: usize) -> Option<&[Color]> {
        (x < self.width).then(|| {
            let start = x * self.height;
            &self.cells[start..start + self.height]
        })
    }

    /// Iterates over the columns left to right.
    pub fn columns(&self) -> impl Iterator<Item = &[Color]> {
        self.cells.chunks_exact(self.height)
    }

    /// Read-only access to all cells in column-major order.
    pub fn cells(&self) -> &[Color] {
        &self.cells
    }

    /// Resets every cell to black without reallocating.
    pub fn clear(&mut self) {
        self.cells.fill(Color::BLACK);
    }
}

impl Index<(usize, usize)> for ColorGrid {
    type Output = Color;

    fn index(&self, (x, y): (usize, usize)) -> &Color {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) out of bounds for {}x{} grid",
            self.width,
            self.height
        );
        &self.cells[self.index_of(x, y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_black_grid_with_correct_dimensions() {
        let grid = ColorGrid::new(4, 3).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.cells().len(), 12);
        assert!(grid.cells().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn new_rejects_zero_width() {
        assert!(matches!(
            ColorGrid::new(0, 4),
            Err(CaptureError::InvalidDimensions)
        ));
    }

    #[test]
    fn new_rejects_zero_height() {
        assert!(matches!(
            ColorGrid::new(4, 0),
            Err(CaptureError::InvalidDimensions)
        ));
    }

    #[test]
    fn new_rejects_overflowing_dimensions() {
        assert!(matches!(
            ColorGrid::new(usize::MAX, 2),
            Err(CaptureError::InvalidDimensions)
        ));
    }

    #[test]
    fn cell_mut_writes_are_visible_through_get_and_index() {
        let mut grid = ColorGrid::new(3, 2).unwrap();
        grid.cell_mut(2, 1).set(7, 8, 9);
        assert_eq!(grid.get(2, 1), Some(Color::new(7, 8, 9)));
        assert_eq!(grid[(2, 1)], Color::new(7, 8, 9));
        assert_eq!(grid.get(1, 1), Some(Color::BLACK));
    }

    #[test]
    fn get_out_of_bounds_returns_none() {
        let grid = ColorGrid::new(2, 2).unwrap();
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_out_of_bounds_panics() {
        let grid = ColorGrid::new(2, 2).unwrap();
        let _ = grid[(5, 0)];
    }

    #[test]
    fn columns_are_contiguous_in_storage() {
        let mut grid = ColorGrid::new(2, 3).unwrap();
        grid.cell_mut(1, 0).set(1, 1, 1);
        grid.cell_mut(1, 2).set(3, 3, 3);
        let col = grid.column(1).unwrap();
        assert_eq!(col, &[Color::new(1, 1, 1), Color::BLACK, Color::new(3, 3, 3)]);
        assert_eq!(grid.columns().count(), 2);
        assert!(grid.column(2).is_none());
    }

    #[test]
    fn clear_resets_cells_and_keeps_dimensions() {
        let mut grid = ColorGrid::new(2, 2).unwrap();
        grid.cell_mut(0, 0).set(200, 100, 50);
        grid.clear();
        assert!(grid.has_dimensions(2, 2));
        assert!(grid.cells().iter().all(|&c| c == Color::BLACK));
    }
}
