//! Chart types: stitches, colors and the knit/slip grid.
//!
//! Row index 0 is always the first knitted row, which sits at the bottom of
//! a chart in knitting convention. The foundation (cast-on) row lives below
//! row 0 and is never part of the [`Grid`].

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};

// ============================================================================
// Cell
// ============================================================================

/// A single stitch in the pattern grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Worked in the current row's color.
    #[default]
    Knit,
    /// Passed over; shows the color of the last row in which it was knit.
    Slip,
}

impl Cell {
    /// Returns the other stitch state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Knit => Self::Slip,
            Self::Slip => Self::Knit,
        }
    }

    /// Single-letter chart notation (`K` / `S`).
    pub fn symbol(self) -> char {
        match self {
            Self::Knit => 'K',
            Self::Slip => 'S',
        }
    }

    /// Parses the single-letter chart notation, case-insensitively.
    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            'K' | 'k' => Ok(Self::Knit),
            'S' | 's' => Ok(Self::Slip),
            other => Err(ChartError::InvalidCell(other)),
        }
    }
}

// ============================================================================
// Color
// ============================================================================

/// An opaque 8-bit RGB color.
///
/// Equality is exact channel equality; there is no color-distance tolerance.
/// The canonical text form is `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let rgb = Srgb::<u8>::from_str(hex.trim())
            .map_err(|_| ChartError::InvalidColor(hex.to_string()))?;
        Ok(rgb.into())
    }

    /// Formats the color as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// True when the mean of the three channels is below 128.
    ///
    /// This is the knit/slip threshold used when reading chart images.
    pub fn is_dark(&self) -> bool {
        u16::from(self.r) + u16::from(self.g) + u16::from(self.b) < 384
    }

    /// True for exactly `#000000` or `#ffffff`.
    pub fn is_black_or_white(&self) -> bool {
        *self == Self::BLACK || *self == Self::WHITE
    }

    /// Returns the fully opaque RGBA pixel for this color.
    pub fn to_rgba(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl From<Srgb<u8>> for Color {
    fn from(rgb: Srgb<u8>) -> Self {
        Self::new(rgb.red, rgb.green, rgb.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(color: Color) -> Self {
        Srgb::new(color.r, color.g, color.b)
    }
}

/// Alpha is ignored.
impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        let [r, g, b, _] = pixel.0;
        Self::new(r, g, b)
    }
}

impl From<Cell> for Color {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Knit => Self::BLACK,
            Cell::Slip => Self::WHITE,
        }
    }
}

impl FromStr for Color {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ChartError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for Color {
    fn schema_name() -> String {
        "Color".to_owned()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

// ============================================================================
// Palette
// ============================================================================

/// Number of swatches in a [`Palette`].
pub const PALETTE_SIZE: usize = 4;

/// A fixed set of swatches offered to the user when picking row colors.
///
/// Nothing in the resolver or codec checks palette membership; charts may
/// use any color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Palette(pub [Color; PALETTE_SIZE]);

impl Default for Palette {
    fn default() -> Self {
        Self([
            Color::BLACK,
            Color::WHITE,
            Color::new(0xcc, 0x33, 0x33),
            Color::new(0x33, 0x66, 0xcc),
        ])
    }
}

impl Palette {
    pub fn colors(&self) -> &[Color; PALETTE_SIZE] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.0.get(index).copied()
    }

    /// Replaces one swatch. Returns false if `index` is out of range.
    pub fn set(&mut self, index: usize, color: Color) -> bool {
        match self.0.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Grid
// ============================================================================

/// A rectangular knit/slip grid, stored row-major.
///
/// All rows have the same stitch count; the constructors enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    stitches: usize,
}

impl Grid {
    /// Creates a grid with every cell set to `fill`.
    pub fn new(rows: usize, stitches: usize, fill: Cell) -> Self {
        Self {
            cells: vec![fill; rows * stitches],
            rows,
            stitches,
        }
    }

    /// Builds a grid from explicit rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let stitches = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * stitches);

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != stitches {
                return Err(ChartError::RaggedGrid {
                    row: index,
                    expected: stitches,
                    actual: row.len(),
                });
            }
            cells.extend(row);
        }

        Ok(Self {
            cells,
            rows: row_count,
            stitches,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn stitch_count(&self) -> usize {
        self.stitches
    }

    /// True if the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, stitch: usize) -> Option<Cell> {
        self.index(row, stitch).map(|i| self.cells[i])
    }

    /// Sets one cell. Returns false if the position is out of range.
    pub fn set(&mut self, row: usize, stitch: usize, cell: Cell) -> bool {
        match self.index(row, stitch) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Returns the cells of one row, or `None` if out of range.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.stitches;
        Some(&self.cells[start..start + self.stitches])
    }

    /// Iterates rows from index 0 (bottom) upwards.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        (0..self.rows).filter_map(move |r| self.row(r))
    }

    /// Copies the grid out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.rows().map(<[Cell]>::to_vec).collect()
    }

    fn index(&self, row: usize, stitch: usize) -> Option<usize> {
        (row < self.rows && stitch < self.stitches).then(|| row * self.stitches + stitch)
    }
}

// ============================================================================
// Chart
// ============================================================================

/// A complete chart snapshot: grid, one color per row, and the foundation color.
///
/// The row color count always matches the grid's row count, so a `Chart`
/// can be resolved or encoded without further validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chart {
    grid: Grid,
    row_colors: Vec<Color>,
    foundation: Color,
}

impl Chart {
    /// Bundles a grid with its colors, checking that every row has a color.
    pub fn new(grid: Grid, row_colors: Vec<Color>, foundation: Color) -> Result<Self> {
        check_shape(&grid, &row_colors)?;
        Ok(Self {
            grid,
            row_colors,
            foundation,
        })
    }

    /// A chart where every stitch is knit in `row_color`.
    pub fn filled(rows: usize, stitches: usize, row_color: Color, foundation: Color) -> Self {
        Self {
            grid: Grid::new(rows, stitches, Cell::Knit),
            row_colors: vec![row_color; rows],
            foundation,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn row_colors(&self) -> &[Color] {
        &self.row_colors
    }

    pub fn foundation(&self) -> Color {
        self.foundation
    }

    pub fn into_parts(self) -> (Grid, Vec<Color>, Color) {
        (self.grid, self.row_colors, self.foundation)
    }

    /// Returns a copy with one stitch changed, or `None` if out of range.
    pub fn with_cell(&self, row: usize, stitch: usize, cell: Cell) -> Option<Self> {
        let mut grid = self.grid.clone();
        grid.set(row, stitch, cell).then(|| Self {
            grid,
            row_colors: self.row_colors.clone(),
            foundation: self.foundation,
        })
    }

    /// Returns a copy with one row recolored, or `None` if out of range.
    pub fn with_row_color(&self, row: usize, color: Color) -> Option<Self> {
        let mut row_colors = self.row_colors.clone();
        *row_colors.get_mut(row)? = color;
        Some(Self {
            grid: self.grid.clone(),
            row_colors,
            foundation: self.foundation,
        })
    }

    /// Returns a copy with a different foundation color.
    pub fn with_foundation(&self, foundation: Color) -> Self {
        Self {
            foundation,
            ..self.clone()
        }
    }
}

/// Fails with [`ChartError::ShapeMismatch`] unless there is one color per row.
pub(crate) fn check_shape(grid: &Grid, row_colors: &[Color]) -> Result<()> {
    if row_colors.len() != grid.row_count() {
        return Err(ChartError::ShapeMismatch {
            expected: grid.row_count(),
            actual: row_colors.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_forms() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("FF8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::new(10, 0, 255).to_hex(), "#0a00ff");
        assert!(matches!(
            Color::from_hex("#12345"),
            Err(ChartError::InvalidColor(_))
        ));
        assert!(Color::from_hex("purple").is_err());
    }

    #[test]
    fn color_brightness_threshold() {
        // (127 + 128 + 128) / 3 = 127.67 -> dark
        assert!(Color::new(127, 128, 128).is_dark());
        // exactly 128 average -> light
        assert!(!Color::new(128, 128, 128).is_dark());
        assert!(Color::BLACK.is_dark());
        assert!(!Color::WHITE.is_dark());
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::new(1, 2, 3));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn grid_rejects_ragged_rows() {
        let err = Grid::from_rows(vec![vec![Cell::Knit, Cell::Slip], vec![Cell::Knit]]);
        assert!(matches!(
            err,
            Err(ChartError::RaggedGrid {
                row: 1,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn grid_access_and_bounds() {
        let mut grid = Grid::new(2, 3, Cell::Knit);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.stitch_count(), 3);
        assert!(grid.set(1, 2, Cell::Slip));
        assert!(!grid.set(2, 0, Cell::Slip));
        assert_eq!(grid.get(1, 2), Some(Cell::Slip));
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.row(1).unwrap(), &[Cell::Knit, Cell::Knit, Cell::Slip]);
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn grid_with_rows_but_no_stitches() {
        let grid = Grid::from_rows(vec![vec![], vec![]]).unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.stitch_count(), 0);
        assert!(grid.is_empty());
        assert_eq!(grid.to_rows(), vec![Vec::<Cell>::new(), Vec::new()]);
    }

    #[test]
    fn chart_requires_one_color_per_row() {
        let grid = Grid::new(3, 2, Cell::Knit);
        let err = Chart::new(grid, vec![Color::BLACK; 2], Color::WHITE);
        assert!(matches!(
            err,
            Err(ChartError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn chart_edits_leave_the_original_untouched() {
        let chart = Chart::filled(2, 2, Color::BLACK, Color::WHITE);

        let edited = chart.with_cell(1, 0, Cell::Slip).unwrap();
        assert_eq!(edited.grid().get(1, 0), Some(Cell::Slip));
        assert_eq!(chart.grid().get(1, 0), Some(Cell::Knit));
        assert!(chart.with_cell(2, 0, Cell::Slip).is_none());

        let recolored = chart.with_row_color(0, Color::new(9, 9, 9)).unwrap();
        assert_eq!(recolored.row_colors()[0], Color::new(9, 9, 9));
        assert_eq!(chart.row_colors()[0], Color::BLACK);
        assert!(chart.with_row_color(5, Color::BLACK).is_none());

        assert_eq!(chart.with_foundation(Color::BLACK).foundation(), Color::BLACK);
    }

    #[test]
    fn palette_set_bounds() {
        let mut palette = Palette::default();
        assert!(palette.set(3, Color::new(1, 1, 1)));
        assert!(!palette.set(4, Color::BLACK));
        assert_eq!(palette.get(3), Some(Color::new(1, 1, 1)));
    }

    #[test]
    fn cell_symbols() {
        assert_eq!(Cell::from_symbol('k').unwrap(), Cell::Knit);
        assert_eq!(Cell::Slip.symbol(), 'S');
        assert_eq!(Cell::Knit.toggled(), Cell::Slip);
        assert!(matches!(Cell::from_symbol('x'), Err(ChartError::InvalidCell('x'))));
    }
}
