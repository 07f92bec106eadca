//! Scatter plots of AA mismatches against bitscore, one subplot per sensitivity setting.
use std::path::Path;

use itertools::Itertools;
use log::info;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use crate::{
    config::OutputFormat,
    error::{Error, Result},
    sweep::{SettingResult, SweepResults},
};

/// Unmatched trials are stacked below zero in steps of this size.
pub const MISS_SCALE: f64 = 2.0;

/// Number of subplot columns.
pub const COLUMNS: usize = 3;

const MATCH_COLOR: RGBColor = RGBColor(70, 130, 180);
const MISS_COLOR: RGBColor = RGBColor(255, 99, 71);
const SIZE: (u32, u32) = (1200, 900);
/// Height of one line of the figure title, in pixels.
const TITLE_LINE: u32 = 18;

/// A single dot in a subplot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub matched: bool,
}

/// Context shown in the figure title.
#[derive(Debug, Clone)]
pub struct FigureInfo {
    pub aligner_version: String,
    pub timestamp: String,
    pub system: String,
}

/// One point per trial.
///
/// Matched trials are placed at their bitscore. The `k`th unmatched trial of an identity level
/// is placed at `-k * MISS_SCALE`, so misses remain countable without touching the score range.
pub fn scatter_points(result: &SettingResult) -> Vec<ScatterPoint> {
    let mut misses = 0;
    let mut level = None;
    result
        .trials
        .iter()
        .map(|t| {
            if level != Some(t.substitutions) {
                level = Some(t.substitutions);
                misses = 0;
            }
            let x = t.substitutions as f64;
            match t.bitscore.score() {
                Some(y) => ScatterPoint { x, y, matched: true },
                None => {
                    misses += 1;
                    ScatterPoint {
                        x,
                        y: -(misses as f64) * MISS_SCALE,
                        matched: false,
                    }
                }
            }
        })
        .collect()
}

/// Rows and columns of the subplot grid.
pub fn grid_shape(subplots: usize) -> (usize, usize) {
    (subplots.div_ceil(COLUMNS).max(1), COLUMNS)
}

/// The vertical range of a subplot.
pub fn y_range(result: &SettingResult, iterations: usize) -> (f64, f64) {
    let low = -((iterations + 1) as f64) * MISS_SCALE;
    let high = result.max_score().unwrap_or(0.0) + 5.0;
    (low, high)
}

/// The figure title, one entry per line.
pub fn title(results: &SweepResults, info: &FigureInfo) -> [String; 3] {
    [
        format!(
            "AA mismatch count vs DIAMOND (v{}) bitscore.",
            info.aligner_version
        ),
        format!(
            "Sequence length {} with {} iterations at each identity level.",
            results.length, results.iterations
        ),
        format!("Run at {} on {}", info.timestamp, info.system),
    ]
}

/// Render all subplots into `path`.
pub fn plot_sweep(
    results: &SweepResults,
    info: &FigureInfo,
    path: &Path,
    format: OutputFormat,
    dot_size: u32,
) -> Result<()> {
    match format {
        OutputFormat::Svg => draw(
            SVGBackend::new(path, SIZE).into_drawing_area(),
            results,
            info,
            dot_size,
        )
        .map_err(|e| Error::Plot(e.to_string()))?,
        OutputFormat::Bitmap => draw(
            BitMapBackend::new(path, SIZE).into_drawing_area(),
            results,
            info,
            dot_size,
        )
        .map_err(|e| Error::Plot(e.to_string()))?,
    }
    info!("Wrote plot to {}", path.display());
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    results: &SweepResults,
    info: &FigureInfo,
    dot_size: u32,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (header, root) = root.split_vertically(TITLE_LINE * 3 + 10);
    let style = TextStyle::from(("sans-serif", 14).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    let center = header.dim_in_pixel().0 as i32 / 2;
    for (i, line) in title(results, info).iter().enumerate() {
        header.draw_text(line, &style, (center, 5 + (i as u32 * TITLE_LINE) as i32))?;
    }

    let (rows, cols) = grid_shape(results.settings.len());
    let panels = root.split_evenly((rows, cols));

    // Unused trailing panels stay blank.
    for (i, (result, panel)) in results.settings.iter().zip(&panels).enumerate() {
        let (row, col) = (i / cols, i % cols);
        subplot(
            panel,
            result,
            results,
            dot_size,
            row == rows - 1,
            col == 0,
            col == cols - 1,
        )?;
    }

    root.present()?;
    Ok(())
}

fn subplot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    result: &SettingResult,
    results: &SweepResults,
    dot_size: u32,
    bottom: bool,
    lhs: bool,
    rhs: bool,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_max = (results.length + 1) as f64;
    let (y_min, y_max) = y_range(result, results.iterations);

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("{} ({}s)", result.name(), result.elapsed.as_secs()),
            ("sans-serif", 16),
        )
        .margin(6)
        .x_label_area_size(if bottom { 35 } else { 20 })
        .y_label_area_size(45)
        .right_y_label_area_size(40)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?
        .set_secondary_coord(0f64..x_max, 0f64..1.05f64);

    let mut mesh = chart.configure_mesh();
    mesh.label_style(("sans-serif", 10).into_font());
    if bottom {
        mesh.x_desc("AA mismatches");
    }
    if lhs {
        mesh.y_desc("DIAMOND bitscore");
    }
    mesh.draw()?;

    let mut secondary = chart.configure_secondary_axes();
    if rhs {
        secondary.y_desc("DIAMOND match detection rate");
    }
    secondary.draw()?;

    let (matched, missed): (Vec<_>, Vec<_>) =
        scatter_points(result).into_iter().partition(|p| p.matched);
    chart.draw_series(
        matched
            .iter()
            .map(|p| Circle::new((p.x, p.y), dot_size, MATCH_COLOR.filled())),
    )?;
    chart.draw_series(
        missed
            .iter()
            .map(|p| Circle::new((p.x, p.y), dot_size, MISS_COLOR.filled())),
    )?;

    let rates = result
        .detection_rates()
        .into_iter()
        .map(|(level, rate)| (level as f64, rate))
        .collect_vec();
    chart.draw_secondary_series(LineSeries::new(rates, &BLACK))?;

    Ok(())
}
