//! Correlation-vs-lag charts.
//!
//! Curves are taken from a [`CrossCorrelationMatrix`] (x = row lag in
//! seconds, y = r) and rendered to PNG, either one chart per column or all
//! columns on one chart. The best lag of each curve is marked with a
//! vertical line.
//!
//! The x axis is the shift applied to the reference, the same key as the
//! matrix rows. It has the opposite sign to the lag in the ranking report:
//! a column reported at `+30s` peaks at `-30s` on its chart.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::analysis::CrossCorrelationMatrix;
use crate::error::{CorrelationError, Result};

/// Line colors, cycled per curve
pub const CHART_COLORS: &[[u8; 3]] = &[
    [113, 120, 78],  // Olive green
    [71, 108, 155],  // Blue
    [253, 193, 73],  // Amber
    [159, 166, 119], // Sage green
    [100, 149, 237], // Cornflower blue
    [255, 127, 80],  // Coral
    [144, 238, 144], // Light green
    [246, 247, 235], // Cream
];

const MARKER_COLOR: Rgba<u8> = Rgba([191, 78, 48, 255]);
const AXIS_COLOR: Rgba<u8> = Rgba([90, 90, 90, 255]);
const BACKGROUND: Rgba<u8> = Rgba([30, 30, 30, 255]);
const CHART_BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// Which matrix columns to draw
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ColumnSelection {
    #[default]
    All,
    Names(Vec<String>),
    /// Positions in the matrix column order (rank order for search output)
    Ranks(Vec<usize>),
}

/// Chart size and layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    /// One chart per column instead of a combined chart
    pub separate: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 700,
            separate: true,
        }
    }
}

/// One column's correlation curve.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationCurve {
    pub column: String,
    /// `[lag seconds, r]` in lag order
    pub points: Vec<[f64; 2]>,
    /// Point of largest `|r|`, `None` if every value is `NaN`.
    /// Its x value is the negated report lag.
    pub best: Option<[f64; 2]>,
}

/// Resolve a selection to column names, validating every entry.
pub fn select_columns(
    matrix: &CrossCorrelationMatrix,
    selection: &ColumnSelection,
) -> Result<Vec<String>> {
    match selection {
        ColumnSelection::All => Ok(matrix.columns.clone()),
        ColumnSelection::Names(names) => names
            .iter()
            .map(|name| match matrix.column_position(name) {
                Some(_) => Ok(name.clone()),
                None => Err(CorrelationError::InvalidColumnSelection(format!(
                    "column '{}' is not in the correlation matrix",
                    name
                ))),
            })
            .collect(),
        ColumnSelection::Ranks(ranks) => ranks
            .iter()
            .map(|&rank| {
                matrix.columns.get(rank).cloned().ok_or_else(|| {
                    CorrelationError::InvalidColumnSelection(format!(
                        "rank {} out of range for {} columns",
                        rank,
                        matrix.num_columns()
                    ))
                })
            })
            .collect(),
    }
}

/// Build curves for the selected columns.
pub fn correlation_curves(
    matrix: &CrossCorrelationMatrix,
    selection: &ColumnSelection,
) -> Result<Vec<CorrelationCurve>> {
    let xs: Vec<f64> = matrix
        .lags
        .iter()
        .map(|lag| lag.num_milliseconds() as f64 / 1000.0)
        .collect();

    let curves = select_columns(matrix, selection)?
        .into_iter()
        .filter_map(|column| {
            let ys = matrix.column_values(&column)?;
            let points: Vec<[f64; 2]> = xs.iter().zip(&ys).map(|(&x, &y)| [x, y]).collect();
            let best = points
                .iter()
                .filter(|p| !p[1].is_nan())
                .fold(None, |best: Option<[f64; 2]>, p| match best {
                    Some(b) if p[1].abs() <= b[1].abs() => Some(b),
                    _ => Some(*p),
                });
            Some(CorrelationCurve {
                column,
                points,
                best,
            })
        })
        .collect();
    Ok(curves)
}

/// Render curves to PNG files in `out_dir`, returning the written paths.
pub fn render_png(
    curves: &[CorrelationCurve],
    options: &PlotOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if options.width < 200 || options.height < 150 {
        return Err(CorrelationError::InvalidParameter(format!(
            "chart size {}x{} is too small",
            options.width, options.height
        )));
    }
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    if options.separate {
        for (i, curve) in curves.iter().enumerate() {
            let image = render_chart(&[curve], options);
            let path = out_dir.join(format!("{:02}_{}.png", i, file_safe(&curve.column)));
            image.save(&path)?;
            written.push(path);
        }
    } else {
        let refs: Vec<&CorrelationCurve> = curves.iter().collect();
        let image = render_chart(&refs, options);
        let path = out_dir.join("cross_correlation.png");
        image.save(&path)?;
        written.push(path);
    }

    tracing::info!("Wrote {} chart(s) to {:?}", written.len(), out_dir);
    Ok(written)
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn render_chart(curves: &[&CorrelationCurve], options: &PlotOptions) -> RgbaImage {
    let (width, height) = (options.width, options.height);
    let mut imgbuf = RgbaImage::from_pixel(width, height, BACKGROUND);

    let chart_left = 60u32;
    let chart_right = width - 30;
    let chart_top = 30u32;
    let chart_bottom = height - 50;

    for y in chart_top..chart_bottom {
        for x in chart_left..chart_right {
            imgbuf.put_pixel(x, y, CHART_BACKGROUND);
        }
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in curves.iter().flat_map(|c| c.points.iter()) {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
    }
    if !min_x.is_finite() {
        return imgbuf;
    }
    if max_x - min_x < f64::EPSILON {
        min_x -= 1.0;
        max_x += 1.0;
    }

    let chart_width = (chart_right - chart_left) as f64;
    let chart_height = (chart_bottom - chart_top) as f64;
    let to_px = |x: f64, y: f64| -> (u32, u32) {
        let px = chart_left as f64 + (x - min_x) / (max_x - min_x) * chart_width;
        // r is plotted on a fixed [-1, 1] scale
        let py = chart_bottom as f64 - (y.clamp(-1.0, 1.0) + 1.0) / 2.0 * chart_height;
        (px.round() as u32, py.round() as u32)
    };

    // Axes: r = 0 and lag = 0
    let (x0, y0) = to_px(min_x, 0.0);
    let (x1, _) = to_px(max_x, 0.0);
    draw_line(&mut imgbuf, x0, y0, x1, y0, AXIS_COLOR);
    if min_x <= 0.0 && max_x >= 0.0 {
        let (zx, _) = to_px(0.0, 0.0);
        draw_line(&mut imgbuf, zx, chart_top, zx, chart_bottom, AXIS_COLOR);
    }

    for (i, curve) in curves.iter().enumerate() {
        let color = CHART_COLORS[i % CHART_COLORS.len()];
        let pixel_color = Rgba([color[0], color[1], color[2], 255]);

        let mut prev: Option<(u32, u32)> = None;
        for p in &curve.points {
            if p[1].is_nan() {
                prev = None;
                continue;
            }
            let (x, y) = to_px(p[0], p[1]);
            if let Some((px, py)) = prev {
                draw_line(&mut imgbuf, px, py, x, y, pixel_color);
            }
            prev = Some((x, y));
        }

        if let Some(best) = curve.best {
            let (bx, _) = to_px(best[0], best[1]);
            draw_line(&mut imgbuf, bx, chart_top, bx, chart_bottom, MARKER_COLOR);
        }
    }

    imgbuf
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let dx = (x1 as i32 - x0 as i32).abs();
    let dy = -(y1 as i32 - y0 as i32).abs();
    let sx: i32 = if x0 < x1 { 1 } else { -1 };
    let sy: i32 = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0 as i32;
    let mut y = y0 as i32;

    let (width, height) = img.dimensions();

    loop {
        if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
            img.put_pixel(x as u32, y as u32, color);
        }

        if x == x1 as i32 && y == y1 as i32 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
