//! Editor state: the single owner of the chart being designed.

use tracing::{debug, warn};

use crate::chart::{Cell, Chart, Color, Palette};
use crate::codec::{
    decode, decode_annotated, decode_plain, decode_png, encode_chart, encode_png, render_preview,
    DecodeOutcome, Decoded, Layout, PendingChoice, PixelBuffer,
};
use crate::error::{ChartError, Result};
use crate::profile::{check_dimension, EditorSettings, MAX_DIMENSION, MIN_DIMENSION};
use crate::resolve::{resolve_chart, OutputMatrix};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from [`EditorSettings`].
pub trait Configurable {
    /// Applies settings to this instance.
    fn apply_settings(&mut self, settings: &EditorSettings) -> Result<()>;

    /// Exports the current settings.
    fn export_settings(&self) -> EditorSettings;
}

// ============================================================================
// Import state
// ============================================================================

/// Where an import currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportState {
    #[default]
    Idle,
    /// The image was decoded but the caller must say whether its last
    /// column holds row colors.
    AwaitingColorColumnChoice(PendingChoice),
}

/// What [`PatternEditor::begin_import`] did with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    /// The chart was replaced.
    Applied,
    /// Nothing changed yet; call [`PatternEditor::choose_color_column`].
    AwaitingColorColumnChoice,
}

// ============================================================================
// PatternEditor
// ============================================================================

/// Owns the authoritative chart and applies edits to it.
///
/// Every edit builds a new [`Chart`] and swaps it in, so a snapshot taken
/// with [`chart`](Self::chart) never changes under the caller.
///
/// # Example
///
/// ```
/// use slipstitch::{Color, ImportStatus, Layout, PatternEditor};
///
/// let mut editor = PatternEditor::new();
/// editor.set_dimensions(2, 3).unwrap();
/// editor.toggle_cell(0, 1);
/// editor.set_row_color(1, Color::new(200, 0, 0));
///
/// let png = editor.export_png(Layout::Annotated).unwrap();
///
/// let mut other = PatternEditor::new();
/// assert_eq!(other.import_png(&png).unwrap(), ImportStatus::Applied);
/// assert_eq!(other.chart(), editor.chart());
/// ```
#[derive(Debug, Clone)]
pub struct PatternEditor {
    settings: EditorSettings,
    chart: Chart,
    /// Incremented on every chart replacement.
    version: u64,
    output_cache: Option<(u64, OutputMatrix)>,
    import: ImportState,
}

impl Default for PatternEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternEditor {
    /// Creates an editor with the default 10 x 10 all-knit chart.
    pub fn new() -> Self {
        let settings = EditorSettings::default();
        Self {
            chart: fresh_chart(&settings, settings.foundation_color),
            settings,
            version: 0,
            output_cache: None,
            import: ImportState::Idle,
        }
    }

    /// Creates an editor from settings, rejecting out-of-range dimensions.
    pub fn with_settings(settings: EditorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            chart: fresh_chart(&settings, settings.foundation_color),
            settings,
            version: 0,
            output_cache: None,
            import: ImportState::Idle,
        })
    }

    /// The current chart snapshot.
    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn palette(&self) -> &Palette {
        &self.settings.palette
    }

    /// Replaces one palette swatch. Returns false if `index` is out of range.
    pub fn set_palette_color(&mut self, index: usize, color: Color) -> bool {
        self.settings.palette.set(index, color)
    }

    // ---- Editing ----

    /// Resizes the chart, starting over with an all-knit grid.
    ///
    /// Both dimensions must be in `1..=100`. The foundation color is kept;
    /// every row gets the default row color.
    pub fn set_dimensions(&mut self, rows: usize, stitches: usize) -> Result<()> {
        if let Err(err) = check_dimension("rows", rows).and(check_dimension("stitches", stitches)) {
            warn!(rows, stitches, "rejected chart size");
            return Err(err);
        }
        self.settings.rows = rows;
        self.settings.stitches = stitches;
        let chart = fresh_chart(&self.settings, self.chart.foundation());
        self.replace_chart(chart);
        Ok(())
    }

    /// Sets one stitch. Returns false if the position is out of range.
    pub fn set_cell(&mut self, row: usize, stitch: usize, cell: Cell) -> bool {
        match self.chart.with_cell(row, stitch, cell) {
            Some(chart) => {
                self.replace_chart(chart);
                true
            }
            None => false,
        }
    }

    /// Flips one stitch between knit and slip.
    pub fn toggle_cell(&mut self, row: usize, stitch: usize) -> bool {
        match self.chart.grid().get(row, stitch) {
            Some(cell) => self.set_cell(row, stitch, cell.toggled()),
            None => false,
        }
    }

    /// Recolors one row. Returns false if `row` is out of range.
    pub fn set_row_color(&mut self, row: usize, color: Color) -> bool {
        match self.chart.with_row_color(row, color) {
            Some(chart) => {
                self.replace_chart(chart);
                true
            }
            None => false,
        }
    }

    pub fn set_foundation_color(&mut self, color: Color) {
        let chart = self.chart.with_foundation(color);
        self.replace_chart(chart);
    }

    fn replace_chart(&mut self, chart: Chart) {
        self.chart = chart;
        self.version = self.version.wrapping_add(1);
        self.output_cache = None;
    }

    // ---- Output ----

    /// The resolved stitch colors of the current chart.
    ///
    /// Computed once per chart version.
    pub fn output(&mut self) -> &OutputMatrix {
        let version = self.version;
        if self
            .output_cache
            .as_ref()
            .is_some_and(|(cached, _)| *cached != version)
        {
            self.output_cache = None;
        }
        let chart = &self.chart;
        &self
            .output_cache
            .get_or_insert_with(|| (version, resolve_chart(chart)))
            .1
    }

    /// Renders the resolved colors at the configured preview scale.
    pub fn preview(&mut self) -> Result<PixelBuffer> {
        let scale = self.settings.preview_scale;
        render_preview(self.output(), scale)
    }

    pub fn export(&self, layout: Layout) -> Result<PixelBuffer> {
        encode_chart(&self.chart, layout)
    }

    pub fn export_png(&self, layout: Layout) -> Result<Vec<u8>> {
        encode_png(&self.export(layout)?)
    }

    // ---- Import ----

    pub fn import_state(&self) -> &ImportState {
        &self.import
    }

    /// Decodes an image and applies it if it can only be read one way.
    ///
    /// If the last column could be either stitches or colors, the chart is
    /// left alone and the editor waits for [`choose_color_column`](Self::choose_color_column).
    /// Starting a new import discards any pending one. On error nothing changes.
    pub fn begin_import(&mut self, buffer: &PixelBuffer) -> Result<ImportStatus> {
        match decode(buffer)? {
            DecodeOutcome::Direct(decoded) => {
                self.apply_decoded(decoded)?;
                self.import = ImportState::Idle;
                Ok(ImportStatus::Applied)
            }
            DecodeOutcome::AwaitingChoice(choice) => {
                debug!("import awaiting color column choice");
                self.import = ImportState::AwaitingColorColumnChoice(choice);
                Ok(ImportStatus::AwaitingColorColumnChoice)
            }
        }
    }

    /// Imports an image read in a fixed layout, skipping the color column
    /// guess. Any pending import is discarded.
    pub fn import_as(&mut self, buffer: &PixelBuffer, layout: Layout) -> Result<()> {
        let decoded = match layout {
            Layout::Plain => decode_plain(buffer)?,
            Layout::Annotated => decode_annotated(buffer)?,
        };
        debug!(?layout, "forced import layout");
        self.apply_decoded(decoded)?;
        self.import = ImportState::Idle;
        Ok(())
    }

    /// Decodes PNG bytes and starts an import.
    pub fn import_png(&mut self, bytes: &[u8]) -> Result<ImportStatus> {
        let buffer = decode_png(bytes)?;
        self.begin_import(&buffer)
    }

    /// Completes a pending import. `true` reads the last column as row
    /// colors, `false` reads it as stitches.
    pub fn choose_color_column(&mut self, use_color_column: bool) -> Result<()> {
        match std::mem::take(&mut self.import) {
            ImportState::AwaitingColorColumnChoice(choice) => {
                debug!(use_color_column, "color column chosen");
                self.apply_decoded(choice.resolve(use_color_column))
            }
            ImportState::Idle => Err(ChartError::NoPendingImport),
        }
    }

    /// Drops a pending import. Returns true if one was pending.
    pub fn cancel_import(&mut self) -> bool {
        let pending = matches!(self.import, ImportState::AwaitingColorColumnChoice(_));
        self.import = ImportState::Idle;
        pending
    }

    fn apply_decoded(&mut self, decoded: Decoded) -> Result<()> {
        let chart = decoded.into_chart(self.settings.default_row_color, self.chart.foundation())?;
        debug!(
            rows = chart.grid().row_count(),
            stitches = chart.grid().stitch_count(),
            "imported chart"
        );
        self.replace_chart(chart);
        Ok(())
    }
}

impl Configurable for PatternEditor {
    /// Applies settings. The chart is started over only when the
    /// dimensions change.
    fn apply_settings(&mut self, settings: &EditorSettings) -> Result<()> {
        settings.validate()?;
        let resize = settings.rows != self.chart.grid().row_count()
            || settings.stitches != self.chart.grid().stitch_count();
        self.settings = settings.clone();
        if resize {
            let chart = fresh_chart(&self.settings, self.settings.foundation_color);
            self.replace_chart(chart);
        }
        Ok(())
    }

    /// Exports the current settings, with dimensions taken from the chart.
    ///
    /// An imported chart may exceed the editor limits; its dimensions are
    /// clamped so the exported settings always validate.
    fn export_settings(&self) -> EditorSettings {
        let clamp = |n: usize| n.clamp(MIN_DIMENSION, MAX_DIMENSION);
        EditorSettings {
            rows: clamp(self.chart.grid().row_count()),
            stitches: clamp(self.chart.grid().stitch_count()),
            ..self.settings.clone()
        }
    }
}

fn fresh_chart(settings: &EditorSettings, foundation: Color) -> Chart {
    Chart::filled(
        settings.rows,
        settings.stitches,
        settings.default_row_color,
        foundation,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Grid;
    use crate::codec::encode;
    use crate::resolve::resolve;
    use image::{Rgba, RgbaImage};

    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    #[test]
    fn new_editor_defaults() {
        let editor = PatternEditor::new();
        let chart = editor.chart();
        assert_eq!(chart.grid().row_count(), 10);
        assert_eq!(chart.grid().stitch_count(), 10);
        assert!(chart.grid().rows().all(|row| row.iter().all(|c| *c == Cell::Knit)));
        assert!(chart.row_colors().iter().all(|c| *c == Color::BLACK));
        assert_eq!(editor.import_state(), &ImportState::Idle);
    }

    #[test]
    fn resize_limits() {
        let mut editor = PatternEditor::new();
        assert!(editor.set_dimensions(100, 1).is_ok());
        assert_eq!(editor.chart().grid().row_count(), 100);

        let before = editor.chart().clone();
        assert!(matches!(
            editor.set_dimensions(0, 5),
            Err(ChartError::DimensionOutOfRange { name: "rows", .. })
        ));
        assert!(editor.set_dimensions(5, 101).is_err());
        assert_eq!(editor.chart(), &before);
    }

    #[test]
    fn resize_starts_over() {
        let mut editor = PatternEditor::new();
        editor.toggle_cell(0, 0);
        editor.set_foundation_color(RED);
        editor.set_dimensions(3, 4).unwrap();
        assert_eq!(editor.chart().grid().get(0, 0), Some(Cell::Knit));
        assert_eq!(editor.chart().row_colors().len(), 3);
        assert_eq!(editor.chart().foundation(), RED);
    }

    #[test]
    fn edits_replace_snapshots() {
        let mut editor = PatternEditor::new();
        let snapshot = editor.chart().clone();
        let version = editor.version();

        assert!(editor.toggle_cell(2, 3));
        assert!(editor.set_row_color(2, RED));
        assert!(!editor.toggle_cell(10, 0));
        assert!(!editor.set_row_color(10, RED));

        assert_eq!(snapshot.grid().get(2, 3), Some(Cell::Knit));
        assert_eq!(editor.chart().grid().get(2, 3), Some(Cell::Slip));
        assert_eq!(editor.chart().row_colors()[2], RED);
        assert_eq!(editor.version(), version + 2);
    }

    #[test]
    fn output_tracks_edits() {
        let mut editor = PatternEditor::new();
        editor.set_dimensions(2, 1).unwrap();
        editor.set_row_color(0, RED);
        editor.set_row_color(1, BLUE);
        assert_eq!(editor.output().to_rows(), vec![vec![RED], vec![BLUE]]);

        editor.toggle_cell(1, 0);
        assert_eq!(editor.output().to_rows(), vec![vec![RED], vec![RED]]);

        let chart = editor.chart().clone();
        let expected = resolve(chart.grid(), chart.row_colors(), chart.foundation()).unwrap();
        assert_eq!(editor.output(), &expected);
        assert_eq!(editor.output(), &expected);
    }

    #[test]
    fn preview_uses_configured_scale() {
        let mut editor = PatternEditor::new();
        editor.set_dimensions(2, 3).unwrap();
        assert_eq!(editor.preview().unwrap().dimensions(), (6, 4));
    }

    #[test]
    fn direct_import_replaces_chart() {
        let mut source = PatternEditor::new();
        source.set_dimensions(3, 2).unwrap();
        source.toggle_cell(1, 1);
        source.set_row_color(0, RED);
        source.set_foundation_color(BLUE);
        let buffer = source.export(Layout::Annotated).unwrap();

        let mut editor = PatternEditor::new();
        assert_eq!(editor.begin_import(&buffer).unwrap(), ImportStatus::Applied);
        assert_eq!(editor.chart(), source.chart());
        assert_eq!(editor.import_state(), &ImportState::Idle);
    }

    #[test]
    fn ambiguous_import_waits_for_choice() {
        let grid = Grid::from_rows(vec![vec![Cell::Slip, Cell::Knit]]).unwrap();
        let buffer = encode(&grid, &[Color::WHITE], Color::BLACK, true).unwrap();

        let mut editor = PatternEditor::new();
        let before = editor.chart().clone();
        assert_eq!(
            editor.begin_import(&buffer).unwrap(),
            ImportStatus::AwaitingColorColumnChoice
        );
        assert_eq!(editor.chart(), &before);

        editor.choose_color_column(true).unwrap();
        assert_eq!(editor.chart().grid(), &grid);
        assert_eq!(editor.chart().row_colors(), &[Color::WHITE]);
        assert_eq!(editor.chart().foundation(), Color::BLACK);
        assert_eq!(editor.import_state(), &ImportState::Idle);
    }

    #[test]
    fn plain_choice_uses_default_colors() {
        let grid = Grid::from_rows(vec![vec![Cell::Slip, Cell::Knit]]).unwrap();
        let buffer = encode(&grid, &[Color::WHITE], Color::BLACK, true).unwrap();

        let mut editor = PatternEditor::new();
        editor.set_foundation_color(RED);
        editor.begin_import(&buffer).unwrap();
        editor.choose_color_column(false).unwrap();

        assert_eq!(editor.chart().grid().stitch_count(), 3);
        assert_eq!(editor.chart().grid().row_count(), 2);
        assert_eq!(editor.chart().row_colors(), &[Color::BLACK, Color::BLACK]);
        assert_eq!(editor.chart().foundation(), RED);
    }

    #[test]
    fn forced_plain_import_ignores_row_colors() {
        let mut source = PatternEditor::new();
        source.set_dimensions(2, 2).unwrap();
        source.set_row_color(0, RED);
        let buffer = source.export(Layout::Annotated).unwrap();

        let blank = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let mut editor = PatternEditor::new();
        editor.begin_import(&blank).unwrap();
        editor.import_as(&buffer, Layout::Plain).unwrap();

        assert_eq!(editor.chart().grid().row_count(), 3);
        assert_eq!(editor.chart().grid().stitch_count(), 3);
        assert!(editor.chart().row_colors().iter().all(|c| *c == Color::BLACK));
        assert_eq!(editor.import_state(), &ImportState::Idle);

        editor.import_as(&buffer, Layout::Annotated).unwrap();
        assert_eq!(editor.chart(), source.chart());
    }

    #[test]
    fn large_import_exports_valid_settings() {
        let grid = Grid::new(120, 3, Cell::Knit);
        let buffer = encode(&grid, &vec![RED; 120], BLUE, true).unwrap();

        let mut editor = PatternEditor::new();
        assert_eq!(editor.begin_import(&buffer).unwrap(), ImportStatus::Applied);
        assert_eq!(editor.chart().grid().row_count(), 120);

        let settings = editor.export_settings();
        assert_eq!(settings.rows, MAX_DIMENSION);
        assert_eq!(settings.stitches, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn cancel_discards_pending_import() {
        let buffer = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let mut editor = PatternEditor::new();
        let before = editor.chart().clone();

        editor.begin_import(&buffer).unwrap();
        assert!(editor.cancel_import());
        assert!(!editor.cancel_import());
        assert_eq!(editor.chart(), &before);
        assert!(matches!(
            editor.choose_color_column(true),
            Err(ChartError::NoPendingImport)
        ));
    }

    #[test]
    fn failed_import_changes_nothing() {
        let mut editor = PatternEditor::new();
        editor.toggle_cell(0, 0);
        let before = editor.chart().clone();
        let version = editor.version();

        let bad = RgbaImage::from_pixel(1, 1, Rgba([20, 40, 60, 255]));
        assert!(editor.begin_import(&bad).is_err());
        assert!(editor.import_png(b"garbage").is_err());
        assert_eq!(editor.chart(), &before);
        assert_eq!(editor.version(), version);
    }

    #[test]
    fn settings_apply_and_export() {
        let mut editor = PatternEditor::new();
        let mut settings = EditorSettings::default();
        settings.default_row_color = BLUE;
        settings.preview_scale = 4;

        // Same dimensions: chart kept.
        editor.toggle_cell(0, 0);
        editor.apply_settings(&settings).unwrap();
        assert_eq!(editor.chart().grid().get(0, 0), Some(Cell::Slip));

        // New dimensions: chart started over with the new defaults.
        settings.rows = 2;
        editor.apply_settings(&settings).unwrap();
        assert_eq!(editor.chart().row_colors(), &[BLUE, BLUE]);

        settings.rows = 0;
        assert!(editor.apply_settings(&settings).is_err());

        let exported = editor.export_settings();
        assert_eq!(exported.rows, 2);
        assert_eq!(exported.preview_scale, 4);
    }

    #[test]
    fn palette_swatches() {
        let mut editor = PatternEditor::new();
        assert!(editor.set_palette_color(0, RED));
        assert!(!editor.set_palette_color(4, RED));
        assert_eq!(editor.palette().get(0), Some(RED));
        assert_eq!(editor.export_settings().palette.get(0), Some(RED));
    }
}
