//! Shaping capture results for terminal and JSON output.

use framelight_core::{Color, ColorGrid, StrategySet};
use serde_json::{json, Value};

/// Grid rows in display order: top row first, left to right.
///
/// The grid stores `y = 0` as the bottom row, as read back from the GPU.
pub fn rows_top_down(grid: &ColorGrid) -> Vec<Vec<Color>> {
    (0..grid.height())
        .rev()
        .map(|y| (0..grid.width()).map(|x| grid[(x, y)]).collect())
        .collect()
}

/// Text rendering: one line per row of hex colors.
pub fn grid_text(grid: &ColorGrid) -> String {
    rows_top_down(grid)
        .iter()
        .map(|row| row.iter().map(|c| c.to_hex()).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn reduction_json(
    image: &str,
    (width, height): (u32, u32),
    frames: usize,
    average: Color,
    grid: &ColorGrid,
) -> Value {
    let rows: Vec<Vec<String>> = rows_top_down(grid)
        .iter()
        .map(|row| row.iter().map(|c| c.to_hex()).collect())
        .collect();
    json!({
        "image": image,
        "width": width,
        "height": height,
        "dimension": grid.width(),
        "frames": frames,
        "average": average.to_hex(),
        "grid": rows,
    })
}

pub fn strategies_json(version: &str, strategies: &StrategySet) -> Value {
    let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
    json!({
        "version": version,
        "strategies": names,
    })
}
