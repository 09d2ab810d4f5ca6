// ABOUTME: Chart rendering for the deckhand library
// ABOUTME: Resolves chart data from manual series or bound tables and rasterizes it to PNG

use crate::errors::{DeckError, Result};
use crate::media::{ImageData, ImageFormat};
use crate::model::{ChartSpec, ChartType};
use crate::table::{ColumnData, Table, TableBindings};
use crate::theme::{Color, ResolvedSlideStyle};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use log::debug;
use std::f64::consts::PI;

/// Raster size of rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

/// Smallest and largest raster edge, in pixels.
pub const MIN_CHART_SIZE: u32 = 64;
pub const MAX_CHART_SIZE: u32 = 4096;

impl ChartOptions {
    pub fn validate(&self) -> Result<()> {
        let range = MIN_CHART_SIZE..=MAX_CHART_SIZE;
        if !range.contains(&self.width) || !range.contains(&self.height) {
            return Err(DeckError::ChartDataError(format!(
                "Chart size {}x{} outside {}..={} pixels",
                self.width, self.height, MIN_CHART_SIZE, MAX_CHART_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// A rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ChartImage {
    pub fn byte_size(&self) -> usize {
        self.png.len()
    }

    pub fn into_image_data(self, name: &str) -> ImageData {
        ImageData {
            name: name.to_string(),
            format: ImageFormat::Png,
            bytes: self.png.into(),
        }
    }
}

/// Plot-ready data extracted from a [`ChartSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Categorical {
        categories: Vec<String>,
        values: Vec<f64>,
    },
    /// Scatter points, one group per distinct category (a single group when
    /// the chart has no category column).
    Points { groups: Vec<(String, Vec<(f64, f64)>)> },
}

const PALETTE: [Color; 6] = [
    Color::rgb(0x4E, 0x79, 0xA7),
    Color::rgb(0xF2, 0x8E, 0x2B),
    Color::rgb(0xE1, 0x57, 0x59),
    Color::rgb(0x76, 0xB7, 0xB2),
    Color::rgb(0x59, 0xA1, 0x4F),
    Color::rgb(0xED, 0xC9, 0x48),
];

/// Render `spec` as a PNG using the slide's resolved style.
pub fn render(
    spec: &ChartSpec,
    style: &ResolvedSlideStyle,
    tables: &TableBindings,
    options: &ChartOptions,
) -> Result<ChartImage> {
    options.validate()?;
    let series = resolve_series(spec, tables)?;
    let chart_type = spec.chart_type();
    debug!(
        "Rendering {} chart at {}x{}",
        chart_type.name(),
        options.width,
        options.height
    );

    let mut canvas = Canvas::new(options.width, options.height);
    let colors = Palette::new(style.font_color);
    match (chart_type, &series) {
        (ChartType::Pie, Series::Categorical { values, .. }) => canvas.pie(values, &colors)?,
        (ChartType::Bar, Series::Categorical { values, .. }) => {
            canvas.bars(values, style.font_color, colors.series())
        }
        (ChartType::Line, Series::Categorical { values, .. }) => {
            canvas.line_chart(values, style.font_color, colors.series())
        }
        (ChartType::Scatter, Series::Points { groups }) => {
            canvas.scatter(groups, style.font_color, &colors)
        }
        _ => {
            return Err(DeckError::ChartDataError(format!(
                "Series shape does not fit a {} chart",
                chart_type.name()
            )))
        }
    }
    canvas.encode()
}

/// Pull plot data out of a chart spec, looking up dataset columns in `tables`.
pub fn resolve_series(spec: &ChartSpec, tables: &TableBindings) -> Result<Series> {
    spec.validate()?;
    match spec {
        ChartSpec::Manual {
            categories, values, ..
        } => Ok(Series::Categorical {
            categories: categories.clone(),
            values: values.clone(),
        }),
        ChartSpec::Dataset {
            chart_type,
            source_table,
            x_col,
            y_col,
            category_col,
        } => {
            let table = tables.get(source_table).ok_or_else(|| {
                DeckError::ChartDataError(format!("No table bound as '{}'", source_table))
            })?;
            if table.row_count() == 0 {
                return Err(DeckError::ChartDataError(format!(
                    "Table '{}' has no rows",
                    source_table
                )));
            }
            let x = column(table, source_table, x_col)?;
            let y = numeric_column(table, source_table, y_col)?;
            let category = match category_col {
                Some(name) => Some(column(table, source_table, name)?),
                None => None,
            };

            if *chart_type == ChartType::Scatter {
                let ColumnData::Numeric(xs) = x else {
                    return Err(DeckError::ChartDataError(format!(
                        "Column '{}' must be numeric for a scatter chart, found {}",
                        x_col,
                        x.type_name()
                    )));
                };
                let groups = group_points(xs, y, category);
                if groups.is_empty() {
                    return Err(DeckError::ChartDataError(format!(
                        "Column '{}' has no finite values to plot",
                        x_col
                    )));
                }
                return Ok(Series::Points { groups });
            }

            let labels = category.unwrap_or(x);
            let (categories, values) = aggregate(labels, y);
            if categories.is_empty() {
                return Err(DeckError::ChartDataError(
                    "Dataset produced no data points".to_string(),
                ));
            }
            Ok(Series::Categorical { categories, values })
        }
    }
}

fn column<'a>(table: &'a Table, table_name: &str, name: &str) -> Result<&'a ColumnData> {
    table.column(name).map(|c| &c.data).ok_or_else(|| {
        DeckError::ChartDataError(format!(
            "Column '{}' not found in table '{}'",
            name, table_name
        ))
    })
}

fn numeric_column<'a>(table: &'a Table, table_name: &str, name: &str) -> Result<&'a [f64]> {
    match column(table, table_name, name)? {
        ColumnData::Numeric(values) => {
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(DeckError::ChartDataError(format!(
                    "Column '{}' contains non-finite value {}",
                    name, v
                )));
            }
            Ok(values)
        }
        other => Err(DeckError::ChartDataError(format!(
            "Column '{}' must be numeric, found {}",
            name,
            other.type_name()
        ))),
    }
}

/// Sum `values` per distinct label, keeping first-seen label order.
fn aggregate(labels: &ColumnData, values: &[f64]) -> (Vec<String>, Vec<f64>) {
    let mut categories: Vec<String> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        let Some(label) = labels.label(row) else {
            continue;
        };
        match categories.iter().position(|c| *c == label) {
            Some(i) => sums[i] += value,
            None => {
                categories.push(label);
                sums.push(*value);
            }
        }
    }
    (categories, sums)
}

fn group_points(
    xs: &[f64],
    ys: &[f64],
    category: Option<&ColumnData>,
) -> Vec<(String, Vec<(f64, f64)>)> {
    let mut groups: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for (row, (x, y)) in xs.iter().zip(ys).enumerate() {
        if !x.is_finite() {
            continue;
        }
        let label = category.and_then(|c| c.label(row)).unwrap_or_default();
        match groups.iter_mut().find(|(name, _)| *name == label) {
            Some((_, points)) => points.push((*x, *y)),
            None => groups.push((label, vec![(*x, *y)])),
        }
    }
    groups
}

struct Palette {
    accent: Color,
}

impl Palette {
    fn new(accent: Color) -> Self {
        Self { accent }
    }

    fn series(&self) -> Color {
        PALETTE[0]
    }

    /// Slice or group colors. The theme's font color leads so charts pick up
    /// the deck's accent.
    fn nth(&self, i: usize) -> Color {
        if i == 0 {
            self.accent
        } else {
            PALETTE[(i - 1) % PALETTE.len()]
        }
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

const MARGIN: f64 = 48.0;

struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0])),
        }
    }

    fn width(&self) -> f64 {
        self.image.width() as f64
    }

    fn height(&self) -> f64 {
        self.image.height() as f64
    }

    fn plot_area(&self) -> (f64, f64, f64, f64) {
        (
            MARGIN,
            MARGIN,
            self.width() - MARGIN,
            self.height() - MARGIN,
        )
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height()
        {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        let (left, right) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
        let (top, bottom) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
        let color = rgba(color);
        for y in top..bottom {
            for x in left..right {
                self.put(x, y, color);
            }
        }
    }

    fn disc(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        let color = rgba(color);
        let r = radius.ceil() as i64;
        let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f64) <= radius * radius {
                    self.put(cxi + dx, cyi + dy, color);
                }
            }
        }
    }

    fn segment(&mut self, from: (f64, f64), to: (f64, f64), thickness: f64, color: Color) {
        let length = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
        let steps = length.ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            self.disc(x, y, thickness / 2.0, color);
        }
    }

    fn axes(&mut self, color: Color, baseline: f64) {
        let (left, top, right, bottom) = self.plot_area();
        self.segment((left, top), (left, bottom), 2.0, color);
        self.segment((left, baseline), (right, baseline), 2.0, color);
    }

    fn pie(&mut self, values: &[f64], palette: &Palette) -> Result<()> {
        if let Some(v) = values.iter().find(|v| **v < 0.0) {
            return Err(DeckError::ChartDataError(format!(
                "Pie charts cannot show negative value {}",
                v
            )));
        }
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return Err(DeckError::ChartDataError(
                "Pie chart values sum to zero".to_string(),
            ));
        }

        // Slice end angles, clockwise from 12 o'clock.
        let mut bounds = Vec::with_capacity(values.len());
        let mut acc = 0.0;
        for value in values {
            acc += value / total * 2.0 * PI;
            bounds.push(acc);
        }

        let (left, top, right, bottom) = self.plot_area();
        let cx = (left + right) / 2.0;
        let cy = (top + bottom) / 2.0;
        let radius = ((right - left).min(bottom - top)) / 2.0;
        let colors: Vec<Rgba<u8>> = (0..values.len()).map(|i| rgba(palette.nth(i))).collect();

        let (w, h) = (self.image.width(), self.image.height());
        for y in 0..h {
            for x in 0..w {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let mut angle = dx.atan2(-dy);
                if angle < 0.0 {
                    angle += 2.0 * PI;
                }
                let slice = bounds
                    .iter()
                    .position(|end| angle < *end)
                    .unwrap_or(values.len() - 1);
                self.image.put_pixel(x, y, colors[slice]);
            }
        }
        Ok(())
    }

    fn value_range(values: &[f64]) -> (f64, f64) {
        let min = values.iter().cloned().fold(0.0_f64, f64::min);
        let max = values.iter().cloned().fold(0.0_f64, f64::max);
        if max - min == 0.0 {
            (min, min + 1.0)
        } else {
            (min, max)
        }
    }

    fn bars(&mut self, values: &[f64], axis: Color, fill: Color) {
        let (left, top, right, bottom) = self.plot_area();
        let (min, max) = Self::value_range(values);
        let scale = (bottom - top) / (max - min);
        let baseline = bottom - (0.0 - min) * scale;
        let slot = (right - left) / values.len() as f64;

        for (i, value) in values.iter().enumerate() {
            let x0 = left + slot * i as f64 + slot * 0.15;
            let x1 = x0 + slot * 0.7;
            let y = baseline - value * scale;
            self.fill_rect(x0, baseline, x1, y, fill);
        }
        self.axes(axis, baseline);
    }

    fn line_chart(&mut self, values: &[f64], axis: Color, stroke: Color) {
        let (left, top, right, bottom) = self.plot_area();
        let (min, max) = Self::value_range(values);
        let scale = (bottom - top) / (max - min);
        let baseline = bottom - (0.0 - min) * scale;
        let slot = (right - left) / values.len() as f64;

        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (left + slot * (i as f64 + 0.5), baseline - v * scale))
            .collect();
        self.axes(axis, baseline);
        for pair in points.windows(2) {
            self.segment(pair[0], pair[1], 3.0, stroke);
        }
        for (x, y) in points {
            self.disc(x, y, 5.0, stroke);
        }
    }

    fn scatter(&mut self, groups: &[(String, Vec<(f64, f64)>)], axis: Color, palette: &Palette) {
        let all = groups.iter().flat_map(|(_, points)| points.iter());
        let (mut x_min, mut x_max, mut y_min, mut y_max) =
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for (x, y) in all {
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        if y_max <= y_min {
            y_max = y_min + 1.0;
        }

        let (left, top, right, bottom) = self.plot_area();
        let inset = 8.0;
        let sx = (right - left - 2.0 * inset) / (x_max - x_min);
        let sy = (bottom - top - 2.0 * inset) / (y_max - y_min);
        self.axes(axis, bottom);
        for (i, (_, points)) in groups.iter().enumerate() {
            let color = palette.nth(i + 1);
            for (x, y) in points {
                let px = left + inset + (x - x_min) * sx;
                let py = bottom - inset - (y - y_min) * sy;
                self.disc(px, py, 5.0, color);
            }
        }
    }

    fn encode(self) -> Result<ChartImage> {
        let (width, height) = (self.image.width(), self.image.height());
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(self.image.as_raw(), width, height, ColorType::Rgba8)?;
        Ok(ChartImage { png, width, height })
    }
}
