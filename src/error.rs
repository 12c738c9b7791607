//! Error types shared by the resolver, codec and editor.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChartError>;

/// Errors produced while building, resolving or (de)serializing a chart.
///
/// Every operation fails atomically: when one of these is returned, no
/// editor state has been modified.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The pixel buffer cannot hold a chart in the requested layout.
    #[error("malformed chart image ({width}x{height}): {reason}")]
    MalformedImage {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    /// The number of row colors does not match the number of grid rows.
    #[error("expected {expected} row colors, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A grid row has a different stitch count than the first row.
    #[error("row {row} has {actual} stitches, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A color string is not a valid hex color.
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    /// A chart document row contains something other than `K` or `S`.
    #[error("invalid stitch '{0}', expected 'K' or 'S'")]
    InvalidCell(char),

    /// A chart dimension is outside the supported range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    DimensionOutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    /// A color column choice was made while no import was awaiting one.
    #[error("no import is awaiting a color column choice")]
    NoPendingImport,

    /// PNG encoding or decoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = ChartError::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "expected 3 row colors, got 2");

        let err = ChartError::MalformedImage {
            width: 1,
            height: 1,
            reason: "annotated charts need a foundation row",
        };
        assert!(err.to_string().contains("1x1"));
    }
}
