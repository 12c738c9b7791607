//! Stitch color resolution.
//!
//! A knit stitch takes the color of its own row. A slipped stitch is carried
//! up from below, so it shows the color of the most recent row in which that
//! column was knit, or the foundation color if the column has not been knit
//! yet.

use crate::chart::{check_shape, Cell, Chart, Color, Grid};
use crate::error::Result;

// ============================================================================
// OutputMatrix
// ============================================================================

/// The visible color of every stitch, in the same shape as the source grid.
///
/// Row 0 is the first knitted row. The matrix is a derived value; it is
/// recomputed from the chart rather than edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputMatrix {
    colors: Vec<Color>,
    rows: usize,
    stitches: usize,
}

impl OutputMatrix {
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn stitch_count(&self) -> usize {
        self.stitches
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, row: usize, stitch: usize) -> Option<Color> {
        if row < self.rows && stitch < self.stitches {
            Some(self.colors[row * self.stitches + stitch])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[Color]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.stitches;
        Some(&self.colors[start..start + self.stitches])
    }

    /// Iterates rows from index 0 (bottom) upwards.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> + '_ {
        (0..self.rows).filter_map(move |r| self.row(r))
    }

    pub fn to_rows(&self) -> Vec<Vec<Color>> {
        self.rows().map(<[Color]>::to_vec).collect()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Computes the visible color of every stitch.
///
/// Fails with [`ChartError::ShapeMismatch`](crate::ChartError::ShapeMismatch)
/// if `row_colors` does not have exactly one entry per grid row. An empty
/// grid resolves to an empty matrix.
pub fn resolve(grid: &Grid, row_colors: &[Color], foundation: Color) -> Result<OutputMatrix> {
    check_shape(grid, row_colors)?;
    Ok(resolve_checked(grid, row_colors, foundation))
}

/// Resolves a chart snapshot. Charts are shape-checked on construction, so
/// this cannot fail.
pub fn resolve_chart(chart: &Chart) -> OutputMatrix {
    resolve_checked(chart.grid(), chart.row_colors(), chart.foundation())
}

fn resolve_checked(grid: &Grid, row_colors: &[Color], foundation: Color) -> OutputMatrix {
    let stitches = grid.stitch_count();
    let mut colors = Vec::with_capacity(grid.row_count() * stitches);

    // Last row in which each column was knit.
    let mut last_knit: Vec<Option<usize>> = vec![None; stitches];

    for (row_index, row) in grid.rows().enumerate() {
        for (stitch, cell) in row.iter().enumerate() {
            let color = match cell {
                Cell::Knit => {
                    last_knit[stitch] = Some(row_index);
                    row_colors[row_index]
                }
                Cell::Slip => last_knit[stitch].map_or(foundation, |r| row_colors[r]),
            };
            colors.push(color);
        }
    }

    OutputMatrix {
        colors,
        rows: grid.row_count(),
        stitches,
    }
}
