//! slipstitch command-line tool
//!
//! Creates chart documents, exports them as chart images, reads chart
//! images back, and renders color previews.
//!
//! # Usage
//!
//! ```bash
//! slipstitch new --rows 12 --stitches 8 -o chart.json
//! slipstitch export chart.json -o chart.png --annotated
//! slipstitch import chart.png -o chart.json --color-column yes
//! slipstitch render chart.json -o preview.png --scale 6
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slipstitch::{
    encode_chart, read_png, render_preview, resolve_chart, tile, write_png, Chart, ChartDocument,
    EditorSettings, ImportStatus, Layout, PatternEditor,
};

/// Slip-stitch colorwork chart tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new all-knit chart document
    New {
        /// Editor settings JSON supplying the defaults
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,

        #[arg(long)]
        rows: Option<usize>,

        #[arg(long)]
        stitches: Option<usize>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Export a chart document as a chart image
    Export {
        #[arg(value_name = "FILE")]
        chart: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Embed row colors and the foundation row
        #[arg(long)]
        annotated: bool,
    },

    /// Read a chart image into a chart document
    Import {
        #[arg(value_name = "FILE")]
        image: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Read the last column as row colors (yes) or stitches (no).
        /// Without it the layout is guessed from the image.
        #[arg(long, value_enum)]
        color_column: Option<Answer>,
    },

    /// Render the colors a chart shows when knitted
    Render {
        #[arg(value_name = "FILE")]
        chart: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Pixels per stitch
        #[arg(long, default_value = "2")]
        scale: u32,

        /// Repeat the motif this many times in each direction
        #[arg(long, default_value = "1")]
        repeat: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Answer {
    Yes,
    No,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::New {
            settings,
            rows,
            stitches,
            output,
        } => {
            let mut settings = match settings {
                Some(path) => load_settings(&path)?,
                None => EditorSettings::default(),
            };
            settings.rows = rows.unwrap_or(settings.rows);
            settings.stitches = stitches.unwrap_or(settings.stitches);

            let editor = PatternEditor::with_settings(settings)?;
            save_chart(editor.chart(), &output)?;
            info!("Created {}", output.display());
        }
        Command::Export {
            chart,
            output,
            annotated,
        } => {
            let chart = load_chart(&chart)?;
            let buffer = encode_chart(&chart, Layout::from_color_column(annotated))?;
            write_png(&buffer, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Exported {}", output.display());
        }
        Command::Import {
            image,
            output,
            color_column,
        } => {
            let buffer = read_png(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let mut editor = PatternEditor::new();
            match color_column {
                Some(Answer::Yes) => editor.import_as(&buffer, Layout::Annotated)?,
                Some(Answer::No) => editor.import_as(&buffer, Layout::Plain)?,
                None => {
                    if editor.begin_import(&buffer)? == ImportStatus::AwaitingColorColumnChoice {
                        bail!(
                            "The last column of {} is only black and white; \
                             pass --color-column yes or --color-column no",
                            image.display()
                        );
                    }
                }
            }
            save_chart(editor.chart(), &output)?;
            info!("Imported {}", output.display());
        }
        Command::Render {
            chart,
            output,
            scale,
            repeat,
        } => {
            let chart = load_chart(&chart)?;
            let preview = render_preview(&resolve_chart(&chart), scale)?;
            let preview = tile(&preview, repeat, repeat)?;
            write_png(&preview, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Rendered {}", output.display());
        }
    }

    Ok(())
}

fn load_settings(path: &Path) -> anyhow::Result<EditorSettings> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    Ok(EditorSettings::from_json(&json)?)
}

fn load_chart(path: &Path) -> anyhow::Result<Chart> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read chart {}", path.display()))?;
    Ok(ChartDocument::from_json(&json)?.into_chart()?)
}

fn save_chart(chart: &Chart, path: &Path) -> anyhow::Result<()> {
    let json = ChartDocument::from(chart).to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write chart {}", path.display()))
}
