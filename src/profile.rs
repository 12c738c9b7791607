//! Serializable chart documents and editor settings.
//!
//! A [`ChartDocument`] is the JSON form of a [`Chart`]; [`EditorSettings`]
//! holds the defaults a [`PatternEditor`](crate::PatternEditor) starts from.
//!
//! # Example
//!
//! ```
//! use slipstitch::{Chart, ChartDocument, Color};
//!
//! let chart = Chart::filled(2, 3, Color::BLACK, Color::WHITE);
//! let json = ChartDocument::from(&chart).to_json().unwrap();
//!
//! let restored = ChartDocument::from_json(&json).unwrap().into_chart().unwrap();
//! assert_eq!(restored, chart);
//! ```

use serde::{Deserialize, Serialize};

use crate::chart::{Cell, Chart, Color, Grid, Palette};
use crate::error::{ChartError, Result};

/// Smallest accepted row or stitch count in the editor.
pub const MIN_DIMENSION: usize = 1;
/// Largest accepted row or stitch count in the editor.
pub const MAX_DIMENSION: usize = 100;

// ============================================================================
// ChartDocument
// ============================================================================

/// JSON representation of a chart.
///
/// Each row is a string of `K` (knit) and `S` (slip); `rows[0]` is the first
/// knitted row.
///
/// ```json
/// {
///   "rows": ["KSK", "SSS"],
///   "rowColors": ["#cc3333", "#3366cc"],
///   "foundationColor": "#cccccc"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ChartDocument {
    pub rows: Vec<String>,
    pub row_colors: Vec<Color>,
    pub foundation_color: Color,
}

impl ChartDocument {
    /// Validates the document and builds a chart from it.
    pub fn into_chart(self) -> Result<Chart> {
        let rows = self
            .rows
            .iter()
            .map(|row| row.chars().map(Cell::from_symbol).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Chart::new(Grid::from_rows(rows)?, self.row_colors, self.foundation_color)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&Chart> for ChartDocument {
    fn from(chart: &Chart) -> Self {
        Self {
            rows: chart
                .grid()
                .rows()
                .map(|row| row.iter().map(|cell| cell.symbol()).collect())
                .collect(),
            row_colors: chart.row_colors().to_vec(),
            foundation_color: chart.foundation(),
        }
    }
}

impl TryFrom<ChartDocument> for Chart {
    type Error = ChartError;

    fn try_from(document: ChartDocument) -> Result<Self> {
        document.into_chart()
    }
}

// ============================================================================
// EditorSettings
// ============================================================================

/// Defaults and preferences for a pattern editor.
///
/// Every field has a default, so `{}` is a valid settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EditorSettings {
    /// Rows in a new chart.
    pub rows: usize,
    /// Stitches per row in a new chart.
    pub stitches: usize,
    /// Color given to every row of a new or plain-imported chart.
    pub default_row_color: Color,
    /// Cast-on color of a new chart.
    pub foundation_color: Color,
    /// Swatches offered when picking row colors.
    pub palette: Palette,
    /// Pixels per stitch in rendered previews.
    pub preview_scale: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            rows: 10,
            stitches: 10,
            default_row_color: Color::BLACK,
            foundation_color: Color::new(0xcc, 0xcc, 0xcc),
            palette: Palette::default(),
            preview_scale: 2,
        }
    }
}

impl EditorSettings {
    /// Checks that the chart dimensions are within the editor's limits.
    pub fn validate(&self) -> Result<()> {
        check_dimension("rows", self.rows)?;
        check_dimension("stitches", self.stitches)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub(crate) fn check_dimension(name: &'static str, value: usize) -> Result<()> {
    if (MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        Ok(())
    } else {
        Err(ChartError::DimensionOutOfRange {
            name,
            value,
            min: MIN_DIMENSION,
            max: MAX_DIMENSION,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
