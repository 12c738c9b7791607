//! slipstitch: slip-stitch colorwork charts
//!
//! A chart is a knit/slip grid plus one yarn color per row and a foundation
//! (cast-on) color. This crate works out which color each stitch actually
//! shows and exchanges charts as PNG images.
//!
//! # Example
//!
//! ```
//! use slipstitch::{resolve, Cell, Color, Grid};
//!
//! let red = Color::new(255, 0, 0);
//! let blue = Color::new(0, 0, 255);
//! let grid = Grid::from_rows(vec![
//!     vec![Cell::Knit, Cell::Slip],
//!     vec![Cell::Slip, Cell::Knit],
//! ])
//! .unwrap();
//!
//! let output = resolve(&grid, &[red, blue], Color::WHITE).unwrap();
//!
//! // The slipped stitch in row 1 still shows row 0's red.
//! assert_eq!(output.get(1, 0), Some(red));
//! // Nothing was knit below the slipped stitch in row 0.
//! assert_eq!(output.get(0, 1), Some(Color::WHITE));
//! ```
//!
//! # Chart Images
//!
//! ```
//! use slipstitch::{decode, encode, Cell, Color, DecodeOutcome, Grid};
//!
//! let grid = Grid::new(2, 3, Cell::Knit);
//! let colors = [Color::new(200, 30, 30), Color::new(30, 30, 200)];
//! let buffer = encode(&grid, &colors, Color::WHITE, true).unwrap();
//!
//! match decode(&buffer).unwrap() {
//!     DecodeOutcome::Direct(decoded) => assert_eq!(decoded.grid, grid),
//!     DecodeOutcome::AwaitingChoice(_) => unreachable!("row colors are not black or white"),
//! }
//! ```

mod chart;
mod codec;
mod editor;
mod error;
mod profile;
mod resolve;

pub use chart::{Cell, Chart, Color, Grid, Palette, PALETTE_SIZE};
pub use codec::{
    decode, decode_annotated, decode_plain, decode_png, encode, encode_chart, encode_png,
    read_png, render_preview, tile, write_png, ChartColors, DecodeOutcome, Decoded, Layout,
    PendingChoice, PixelBuffer, MAX_PREVIEW_SCALE,
};
pub use editor::{Configurable, ImportState, ImportStatus, PatternEditor};
pub use error::{ChartError, Result};
pub use profile::{ChartDocument, EditorSettings, MAX_DIMENSION, MIN_DIMENSION};
pub use resolve::{resolve, resolve_chart, OutputMatrix};
