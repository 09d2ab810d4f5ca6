// ABOUTME: Slide geometry for the deckhand exporter
// ABOUTME: Places titles, text blocks, pictures, charts and the logo on the page in EMUs

use crate::errors::DeckError;
use crate::model::{ContentBlock, Slide};
use crate::theme::{Layout, ResolvedSlideStyle};
use log::warn;
use std::str::FromStr;

pub const EMU_PER_INCH: i64 = 914_400;
pub const EMU_PER_POINT: i64 = 12_700;

const fn inches(tenths: i64) -> i64 {
    tenths * EMU_PER_INCH / 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Standard,
    Widescreen,
}

impl AspectRatio {
    /// Page size in EMUs.
    pub fn dimensions(&self) -> (i64, i64) {
        match self {
            AspectRatio::Standard => (9_144_000, 6_858_000),
            AspectRatio::Widescreen => (9_144_000, 5_143_500),
        }
    }

    pub fn slide_size_type(&self) -> &'static str {
        match self {
            AspectRatio::Standard => "screen4x3",
            AspectRatio::Widescreen => "screen16x9",
        }
    }

    /// Parse "4:3" or "16:9", falling back to 4:3 with a warning.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("Unsupported aspect ratio: {}. Using 4:3 instead.", value);
            AspectRatio::Standard
        })
    }
}

impl FromStr for AspectRatio {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "4:3" => Ok(AspectRatio::Standard),
            "16:9" => Ok(AspectRatio::Widescreen),
            other => Err(DeckError::ConfigError(format!(
                "Unsupported aspect ratio: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.cy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Body,
    Caption,
}

/// Which picture a [`Shape::Picture`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRef {
    /// The n-th image block of the slide.
    Block(usize),
    Chart,
    Logo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text {
        role: TextRole,
        lines: Vec<String>,
        frame: Frame,
    },
    Picture {
        media: MediaRef,
        frame: Frame,
        description: String,
    },
}

/// Pixel sizes of everything the slide will embed.
#[derive(Debug, Clone, Default)]
pub struct MediaSizes {
    /// One entry per image block, in block order.
    pub blocks: Vec<(u32, u32)>,
    pub chart: Option<(u32, u32)>,
    pub logo: Option<(u32, u32)>,
}

const MARGIN: i64 = inches(5);
const GAP: i64 = inches(1);
const CAPTION_HEIGHT: i64 = inches(4);
const MAX_PICTURE_WIDTH: i64 = inches(40);
const MIN_PICTURE_HEIGHT: i64 = inches(5);

fn scaled_height(width: i64, (px_w, px_h): (u32, u32)) -> i64 {
    if px_w == 0 {
        return width;
    }
    width * px_h as i64 / px_w as i64
}

fn text_height(lines: usize, font_size: u32) -> i64 {
    let line = font_size as i64 * EMU_PER_POINT * 6 / 5;
    line * lines.max(1) as i64 + inches(1)
}

/// Lay out one slide on a page of `page` EMUs.
pub fn layout_slide(
    slide: &Slide,
    style: &ResolvedSlideStyle,
    page: (i64, i64),
    media: &MediaSizes,
) -> Vec<Shape> {
    let (width, height) = page;
    let content_width = width - 2 * MARGIN;
    let mut shapes = Vec::new();

    let title_frame = match style.layout {
        Layout::TitleSlide => Frame::new(MARGIN, height * 7 / 20, content_width, inches(15)),
        Layout::TitleAndContent => Frame::new(MARGIN, inches(3), content_width, inches(10)),
        Layout::Blank => Frame::new(MARGIN, MARGIN, content_width, inches(10)),
    };
    shapes.push(Shape::Text {
        role: TextRole::Title,
        lines: vec![slide.title.clone()],
        frame: title_frame,
    });
    let content_top = match style.layout {
        Layout::TitleSlide => title_frame.bottom() + inches(2),
        _ => inches(15),
    };

    let inline_chart = slide
        .blocks
        .iter()
        .any(|b| matches!(b, ContentBlock::ChartRef));
    let side_chart = slide.chart.is_some() && !inline_chart;

    let column_width = if side_chart {
        width / 2 - MARGIN
    } else {
        content_width
    };

    if side_chart {
        let x = width / 2 + MARGIN;
        let chart_width = width - x - MARGIN;
        let chart_height = media
            .chart
            .map(|size| scaled_height(chart_width, size))
            .unwrap_or(chart_width * 3 / 4);
        push_chart(
            &mut shapes,
            slide,
            Frame::new(x, content_top, chart_width, chart_height),
        );
    }

    let mut cursor = content_top;
    let mut image_index = 0;
    for block in &slide.blocks {
        match block {
            ContentBlock::Text { lines } => {
                let cy = text_height(lines.len(), style.font_size);
                shapes.push(Shape::Text {
                    role: TextRole::Body,
                    lines: lines.clone(),
                    frame: Frame::new(MARGIN, cursor, column_width, cy),
                });
                cursor += cy + GAP;
            }
            ContentBlock::Image(image) => {
                let size = media.blocks.get(image_index).copied().unwrap_or((4, 3));
                let mut cx = column_width.min(MAX_PICTURE_WIDTH);
                let mut cy = scaled_height(cx, size);
                let room = (height - MARGIN - cursor).max(MIN_PICTURE_HEIGHT);
                if cy > room {
                    cx = cx * room / cy;
                    cy = room;
                }
                shapes.push(Shape::Picture {
                    media: MediaRef::Block(image_index),
                    frame: Frame::new(MARGIN, cursor, cx, cy),
                    description: image.name.clone(),
                });
                image_index += 1;
                cursor += cy + GAP;
            }
            ContentBlock::ChartRef => {
                let cx = column_width.min(inches(60));
                let cy = media
                    .chart
                    .map(|size| scaled_height(cx, size))
                    .unwrap_or(cx * 3 / 4);
                let frame = Frame::new(MARGIN, cursor, cx, cy);
                push_chart(&mut shapes, slide, frame);
                cursor = frame.bottom() + CAPTION_HEIGHT + GAP;
            }
        }
    }

    if let Some(size) = media.logo {
        let cx = inches(10);
        shapes.push(Shape::Picture {
            media: MediaRef::Logo,
            frame: Frame::new(width - inches(15), inches(2), cx, scaled_height(cx, size)),
            description: "Logo".to_string(),
        });
    }
    shapes
}

/// Caption band on top, chart picture below it.
fn push_chart(shapes: &mut Vec<Shape>, slide: &Slide, frame: Frame) {
    shapes.push(Shape::Text {
        role: TextRole::Caption,
        lines: vec![format!("{} Chart", slide.title)],
        frame: Frame::new(frame.x, frame.y, frame.cx, CAPTION_HEIGHT),
    });
    shapes.push(Shape::Picture {
        media: MediaRef::Chart,
        frame: Frame::new(frame.x, frame.y + CAPTION_HEIGHT, frame.cx, frame.cy),
        description: format!("{} Chart", slide.title),
    });
}
