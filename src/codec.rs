//! Chart images: exporting a chart to a pixel grid and reading it back.
//!
//! Knit stitches are black pixels and slipped stitches are white. Row 0 is
//! drawn at the bottom of the image (largest `y`), matching the way a chart
//! is knitted from the bottom up.
//!
//! # Layouts
//!
//! ```text
//!  Plain (S x R)              Annotated ((S+1) x (R+1))
//!
//!  y=0    row R-1             y=0    ■ ■ ■ ■ | foundation color
//!  ...                        y=1    row R-1 | color of row R-1
//!  y=R-1  row 0               ...
//!                             y=R    row 0   | color of row 0
//! ```
//!
//! The annotated layout adds a color column on the right and a foundation
//! row whose stitch pixels are always black. On import the rightmost column
//! is treated as color data when it holds anything other than pure black
//! or pure white; otherwise both readings are returned and the caller has to
//! pick one (see [`DecodeOutcome`]).

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::chart::{check_shape, Cell, Chart, Color, Grid};
use crate::error::{ChartError, Result};
use crate::resolve::OutputMatrix;

/// An RGBA raster holding an encoded chart.
pub type PixelBuffer = RgbaImage;

/// Largest per-stitch block size accepted by [`render_preview`].
pub const MAX_PREVIEW_SCALE: u32 = 10;

// ============================================================================
// Layout
// ============================================================================

/// How a chart is laid out in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Pattern pixels only; one pixel per stitch.
    #[default]
    Plain,
    /// Pattern pixels plus a trailing color column and a foundation row.
    Annotated,
}

impl Layout {
    pub fn from_color_column(include_color_column: bool) -> Self {
        if include_color_column {
            Self::Annotated
        } else {
            Self::Plain
        }
    }

    pub fn has_color_column(self) -> bool {
        self == Self::Annotated
    }

    /// Image `(width, height)` for a chart of `rows` x `stitches`.
    pub fn image_size(self, rows: usize, stitches: usize) -> Result<(u32, u32)> {
        let extra = usize::from(self.has_color_column());
        Ok((
            pixel_dim("stitches", stitches.saturating_add(extra))?,
            pixel_dim("rows", rows.saturating_add(extra))?,
        ))
    }
}

// ============================================================================
// Decoded charts
// ============================================================================

/// Row and foundation colors recovered from an annotated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartColors {
    /// One color per row, row 0 first.
    pub row_colors: Vec<Color>,
    pub foundation: Color,
}

/// One interpretation of an imported image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub grid: Grid,
    /// Present only when the image was read with a color column.
    pub colors: Option<ChartColors>,
}

impl Decoded {
    pub fn has_color_info(&self) -> bool {
        self.colors.is_some()
    }

    /// Turns the decoded grid into a chart.
    ///
    /// Plain images carry no colors, so every row gets `default_row_color`
    /// and the foundation is `default_foundation`.
    pub fn into_chart(self, default_row_color: Color, default_foundation: Color) -> Result<Chart> {
        let rows = self.grid.row_count();
        let (row_colors, foundation) = match self.colors {
            Some(colors) => (colors.row_colors, colors.foundation),
            None => (vec![default_row_color; rows], default_foundation),
        };
        Chart::new(self.grid, row_colors, foundation)
    }
}

/// Both readings of an image whose last column is pure black and white.
///
/// Such a column may be real stitches or row colors that happen to be black
/// and white. The codec never guesses; the caller decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChoice {
    plain: Decoded,
    annotated: Decoded,
}

impl PendingChoice {
    /// Full-width reading with no color information.
    pub fn plain(&self) -> &Decoded {
        &self.plain
    }

    /// Reading that treats the last column as colors and the top row as
    /// the foundation.
    pub fn annotated(&self) -> &Decoded {
        &self.annotated
    }

    /// Selects one reading. `true` uses the last column as colors.
    pub fn resolve(self, use_color_column: bool) -> Decoded {
        if use_color_column {
            self.annotated
        } else {
            self.plain
        }
    }
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The image could only be read one way.
    Direct(Decoded),
    /// The caller must choose whether the last column holds colors.
    AwaitingChoice(PendingChoice),
}

impl DecodeOutcome {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AwaitingChoice(_))
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a grid into a pixel buffer.
///
/// With `include_color_column` the annotated layout is used and the row
/// colors and foundation color are embedded; otherwise only the pattern is
/// written. Fails with [`ChartError::ShapeMismatch`] if `row_colors` does not
/// match the grid's row count.
pub fn encode(
    grid: &Grid,
    row_colors: &[Color],
    foundation: Color,
    include_color_column: bool,
) -> Result<PixelBuffer> {
    check_shape(grid, row_colors)?;
    encode_parts(
        grid,
        row_colors,
        foundation,
        Layout::from_color_column(include_color_column),
    )
}

/// Encodes a chart snapshot in the given layout.
pub fn encode_chart(chart: &Chart, layout: Layout) -> Result<PixelBuffer> {
    encode_parts(chart.grid(), chart.row_colors(), chart.foundation(), layout)
}

fn encode_parts(
    grid: &Grid,
    row_colors: &[Color],
    foundation: Color,
    layout: Layout,
) -> Result<PixelBuffer> {
    let rows = grid.row_count();
    let (width, height) = layout.image_size(rows, grid.stitch_count())?;

    // Unwritten pixels are the annotated foundation row's stitches.
    let mut buffer = RgbaImage::from_pixel(width, height, Color::BLACK.to_rgba());

    for (row_index, row) in grid.rows().enumerate() {
        let image_row = match layout {
            Layout::Plain => rows - 1 - row_index,
            Layout::Annotated => rows - row_index,
        };
        let y = image_row as u32;

        for (stitch, cell) in row.iter().enumerate() {
            buffer.put_pixel(stitch as u32, y, Color::from(*cell).to_rgba());
        }
        if layout == Layout::Annotated {
            buffer.put_pixel(width - 1, y, row_colors[row_index].to_rgba());
        }
    }

    if layout == Layout::Annotated {
        buffer.put_pixel(width - 1, 0, foundation.to_rgba());
    }

    debug!(?layout, width, height, "encoded chart image");
    Ok(buffer)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a chart image, deciding whether the last column holds colors.
///
/// If any pixel in the rightmost column is neither pure black nor pure
/// white, the image is read as annotated. Otherwise both readings are
/// returned as a [`PendingChoice`], unless the image is too small to be
/// annotated, in which case the plain reading is returned directly.
pub fn decode(buffer: &PixelBuffer) -> Result<DecodeOutcome> {
    let (width, height) = buffer.dimensions();
    require(width >= 1 && height >= 1, buffer, "image has no pixels")?;

    let last = width - 1;
    let has_color_info =
        (0..height).any(|y| !Color::from(*buffer.get_pixel(last, y)).is_black_or_white());

    if has_color_info {
        debug!(width, height, "last column holds colors");
        return decode_annotated(buffer).map(DecodeOutcome::Direct);
    }

    let plain = decode_plain(buffer)?;
    if width < 2 || height < 2 {
        debug!(width, height, "image too small for a color column, reading as plain");
        return Ok(DecodeOutcome::Direct(plain));
    }

    debug!(width, height, "last column is black and white only, awaiting choice");
    let annotated = decode_annotated(buffer)?;
    Ok(DecodeOutcome::AwaitingChoice(PendingChoice { plain, annotated }))
}

/// Reads every pixel as a stitch.
pub fn decode_plain(buffer: &PixelBuffer) -> Result<Decoded> {
    let (width, height) = buffer.dimensions();
    require(width >= 1 && height >= 1, buffer, "image has no pixels")?;

    Ok(Decoded {
        grid: read_grid(buffer, width, height)?,
        colors: None,
    })
}

/// Reads the image as pattern plus color column plus foundation row.
pub fn decode_annotated(buffer: &PixelBuffer) -> Result<Decoded> {
    let (width, height) = buffer.dimensions();
    require(width >= 1 && height >= 1, buffer, "image has no pixels")?;
    require(
        width >= 2,
        buffer,
        "annotated charts need a stitch column and a color column",
    )?;
    require(
        height >= 2,
        buffer,
        "annotated charts need a foundation row and a pattern row",
    )?;

    let color_x = width - 1;
    let rows = height - 1;
    let row_colors = (0..rows)
        .map(|r| Color::from(*buffer.get_pixel(color_x, height - 1 - r)))
        .collect();
    let foundation = Color::from(*buffer.get_pixel(color_x, 0));

    Ok(Decoded {
        grid: read_grid(buffer, width - 1, rows)?,
        colors: Some(ChartColors {
            row_colors,
            foundation,
        }),
    })
}

/// Reads `rows` pattern rows of `stitches` pixels, row 0 from the bottom.
fn read_grid(buffer: &PixelBuffer, stitches: u32, rows: u32) -> Result<Grid> {
    let height = buffer.height();
    let cells: Vec<Vec<Cell>> = (0..rows)
        .map(|r| {
            let y = height - 1 - r;
            (0..stitches)
                .map(|x| classify(buffer.get_pixel(x, y)))
                .collect()
        })
        .collect();
    Grid::from_rows(cells)
}

fn classify(pixel: &Rgba<u8>) -> Cell {
    if Color::from(*pixel).is_dark() {
        Cell::Knit
    } else {
        Cell::Slip
    }
}

fn require(condition: bool, buffer: &PixelBuffer, reason: &'static str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ChartError::MalformedImage {
            width: buffer.width(),
            height: buffer.height(),
            reason,
        })
    }
}

fn pixel_dim(name: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| ChartError::DimensionOutOfRange {
        name,
        value,
        min: 0,
        max: u32::MAX as usize,
    })
}

// ============================================================================
// PNG files
// ============================================================================

/// Encodes a buffer as PNG bytes. PNG is lossless, so colors survive exactly.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    buffer.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decodes PNG bytes into an RGBA buffer.
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

pub fn write_png(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<()> {
    buffer.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

pub fn read_png(path: impl AsRef<Path>) -> Result<PixelBuffer> {
    Ok(image::open(path)?.to_rgba8())
}

// ============================================================================
// Previews
// ============================================================================

/// Rasterizes resolved stitch colors, each stitch as a `scale` x `scale`
/// block with row 0 at the bottom.
///
/// `scale` is clamped to `1..=MAX_PREVIEW_SCALE`.
pub fn render_preview(output: &OutputMatrix, scale: u32) -> Result<PixelBuffer> {
    let scale = scale.clamp(1, MAX_PREVIEW_SCALE);
    let rows = pixel_dim("rows", output.row_count())?;
    let stitches = pixel_dim("stitches", output.stitch_count())?;
    let width = stitches
        .checked_mul(scale)
        .ok_or_else(|| too_large("preview width", output.stitch_count()))?;
    let height = rows
        .checked_mul(scale)
        .ok_or_else(|| too_large("preview height", output.row_count()))?;

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let row = (rows - 1 - y / scale) as usize;
        output
            .get(row, (x / scale) as usize)
            .unwrap_or_default()
            .to_rgba()
    }))
}

/// Repeats a buffer `across` times horizontally and `up` times vertically,
/// to show a motif as an all-over pattern. Counts below 1 are treated as 1.
pub fn tile(buffer: &PixelBuffer, across: u32, up: u32) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    let across = across.max(1);
    let up = up.max(1);
    let tiled_width = width
        .checked_mul(across)
        .ok_or_else(|| too_large("tiled width", across as usize))?;
    let tiled_height = height
        .checked_mul(up)
        .ok_or_else(|| too_large("tiled height", up as usize))?;

    Ok(RgbaImage::from_fn(tiled_width, tiled_height, |x, y| {
        *buffer.get_pixel(x % width, y % height)
    }))
}

fn too_large(name: &'static str, value: usize) -> ChartError {
    ChartError::DimensionOutOfRange {
        name,
        value,
        min: 1,
        max: u32::MAX as usize,
    }
}
