// ABOUTME: Slide and document model for the deckhand library
// ABOUTME: Immutable-style document operations: every edit returns a new document or a typed error

use crate::errors::{DeckError, Result};
use crate::media::ImageData;
use crate::theme::{self, SlideStyleOverride, Theme, ThemeInput, Transition, MAX_FONT_SIZE};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Stable slide identifier. Never reused within a document's lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideId(u64);

impl SlideId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Pie,
    Bar,
    Line,
    Scatter,
}

impl ChartType {
    pub fn name(&self) -> &'static str {
        match self {
            ChartType::Pie => "pie",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
        }
    }
}

impl FromStr for ChartType {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pie" => Ok(ChartType::Pie),
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "scatter" => Ok(ChartType::Scatter),
            _ => Err(DeckError::ChartDataError(format!("Unknown chart type: {}", s))),
        }
    }
}

/// A chart before rendering: its type plus where the numbers come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Manual {
        chart_type: ChartType,
        categories: Vec<String>,
        values: Vec<f64>,
    },
    Dataset {
        chart_type: ChartType,
        source_table: String,
        x_col: String,
        y_col: String,
        category_col: Option<String>,
    },
}

impl ChartSpec {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartSpec::Manual { chart_type, .. } | ChartSpec::Dataset { chart_type, .. } => {
                *chart_type
            }
        }
    }

    /// Structural checks that do not need the bound table.
    pub fn validate(&self) -> Result<()> {
        match self {
            ChartSpec::Manual {
                chart_type,
                categories,
                values,
            } => {
                if *chart_type == ChartType::Scatter {
                    return Err(DeckError::ChartDataError(
                        "Scatter charts need a dataset source".to_string(),
                    ));
                }
                if categories.len() != values.len() {
                    return Err(DeckError::ChartDataError(format!(
                        "{} categories but {} values",
                        categories.len(),
                        values.len()
                    )));
                }
                if categories.is_empty() {
                    return Err(DeckError::ChartDataError(
                        "Chart needs at least one data point".to_string(),
                    ));
                }
                if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                    return Err(DeckError::ChartDataError(format!(
                        "Chart value {} is not a finite number",
                        v
                    )));
                }
                Ok(())
            }
            ChartSpec::Dataset {
                source_table,
                x_col,
                y_col,
                category_col,
                ..
            } => {
                if source_table.trim().is_empty() {
                    return Err(DeckError::ChartDataError(
                        "Dataset chart needs a source table".to_string(),
                    ));
                }
                let named = [Some(x_col), Some(y_col), category_col.as_ref()];
                if named.iter().flatten().any(|c| c.trim().is_empty()) {
                    return Err(DeckError::ChartDataError(
                        "Dataset chart column names must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { lines: Vec<String> },
    Image(ImageData),
    /// Places the slide's chart inline at this point of the content flow.
    ChartRef,
}

impl ContentBlock {
    pub fn text<S: Into<String>>(line: S) -> Self {
        ContentBlock::Text {
            lines: vec![line.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: SlideId,
    pub title: String,
    pub blocks: Vec<ContentBlock>,
    pub chart: Option<ChartSpec>,
    pub style_override: SlideStyleOverride,
    /// `None` inherits the theme's default transition.
    pub transition: Option<Transition>,
}

impl Slide {
    pub fn new(id: SlideId) -> Self {
        Self {
            id,
            title: String::new(),
            blocks: Vec::new(),
            chart: None,
            style_override: SlideStyleOverride::default(),
            transition: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(chart) = &self.chart {
            chart.validate()?;
        }
        let chart_refs = self
            .blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::ChartRef))
            .count();
        if chart_refs > 1 {
            return Err(DeckError::ChartDataError(
                "A slide can place its chart only once".to_string(),
            ));
        }
        if chart_refs == 1 && self.chart.is_none() {
            return Err(DeckError::ChartDataError(
                "Chart placement without a chart".to_string(),
            ));
        }
        if let Some(size) = self.style_override.font_size {
            if size == 0 || size > MAX_FONT_SIZE {
                return Err(DeckError::ConfigError(format!(
                    "font_size override must be between 1 and {}, got {}",
                    MAX_FONT_SIZE, size
                )));
            }
        }
        Ok(())
    }
}

/// A field-level edit applied by [`Document::update_slide`].
#[derive(Debug, Clone, PartialEq)]
pub enum SlideUpdate {
    Title(String),
    Blocks(Vec<ContentBlock>),
    Chart(Option<ChartSpec>),
    Style(SlideStyleOverride),
    Transition(Option<Transition>),
}

impl SlideUpdate {
    fn apply_to(self, slide: &mut Slide) {
        match self {
            SlideUpdate::Title(title) => slide.title = title,
            SlideUpdate::Blocks(blocks) => slide.blocks = blocks,
            SlideUpdate::Chart(chart) => slide.chart = chart,
            SlideUpdate::Style(style) => slide.style_override = style,
            SlideUpdate::Transition(transition) => slide.transition = transition,
        }
    }
}

/// One document edit, as recorded by the history engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddSlide { position: Option<usize> },
    RemoveSlide(SlideId),
    DuplicateSlide(SlideId),
    Reorder { id: SlideId, new_index: usize },
    UpdateSlide { id: SlideId, update: SlideUpdate },
    SetTheme(ThemeInput),
    SetLogo(Option<ImageData>),
}

/// Result of a successful [`Operation`].
#[derive(Debug, Clone)]
pub struct Applied {
    pub document: Document,
    /// Set by operations that create a slide.
    pub slide_id: Option<SlideId>,
}

impl Applied {
    fn document(document: Document) -> Self {
        Self {
            document,
            slide_id: None,
        }
    }
}

/// The full presentation: ordered slides plus the active theme.
///
/// Clones share the id counter, so a slide id handed out once is never
/// handed out again by any snapshot of the same document.
#[derive(Debug, Clone)]
pub struct Document {
    id: Uuid,
    slides: Vec<Slide>,
    theme: Theme,
    logo: Option<ImageData>,
    ids: Arc<AtomicU64>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.slides == other.slides
            && self.theme == other.theme
            && self.logo == other.logo
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with the default theme.
    pub fn new() -> Self {
        Self::with_theme(Theme::default())
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self {
            id: Uuid::new_v4(),
            slides: Vec::new(),
            theme,
            logo: None,
            ids: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn logo(&self) -> Option<&ImageData> {
        self.logo.as_ref()
    }

    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|s| s.id).collect()
    }

    pub(crate) fn allocate_id(&self) -> SlideId {
        SlideId(self.ids.fetch_add(1, Ordering::Relaxed))
    }

    /// Append an already-validated slide while building a fresh document.
    pub(crate) fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    fn require_index(&self, id: SlideId) -> Result<usize> {
        self.index_of(id).ok_or(DeckError::NotFoundError(id))
    }

    /// Insert an empty slide at `position`, or append when `None`.
    pub fn add_slide(&self, position: Option<usize>) -> Result<(Document, SlideId)> {
        let index = position.unwrap_or(self.slides.len());
        if index > self.slides.len() {
            return Err(DeckError::RangeError {
                index,
                len: self.slides.len(),
            });
        }
        let id = self.allocate_id();
        let mut next = self.clone();
        next.slides.insert(index, Slide::new(id));
        debug!("Added slide {} at {}", id, index);
        Ok((next, id))
    }

    pub fn remove_slide(&self, id: SlideId) -> Result<Document> {
        let index = self.require_index(id)?;
        let mut next = self.clone();
        next.slides.remove(index);
        debug!("Removed slide {}", id);
        Ok(next)
    }

    /// Deep-copy a slide under a new id, directly after the source.
    pub fn duplicate_slide(&self, id: SlideId) -> Result<(Document, SlideId)> {
        let index = self.require_index(id)?;
        let new_id = self.allocate_id();
        let mut copy = self.slides[index].clone();
        copy.id = new_id;
        let mut next = self.clone();
        next.slides.insert(index + 1, copy);
        debug!("Duplicated slide {} as {}", id, new_id);
        Ok((next, new_id))
    }

    pub fn reorder(&self, id: SlideId, new_index: usize) -> Result<Document> {
        let from = self.require_index(id)?;
        if new_index >= self.slides.len() {
            return Err(DeckError::RangeError {
                index: new_index,
                len: self.slides.len(),
            });
        }
        let mut next = self.clone();
        let slide = next.slides.remove(from);
        next.slides.insert(new_index, slide);
        debug!("Moved slide {} from {} to {}", id, from, new_index);
        Ok(next)
    }

    /// Apply a field-level update. The updated slide is validated before
    /// the new document is returned.
    pub fn update_slide(&self, id: SlideId, update: SlideUpdate) -> Result<Document> {
        let index = self.require_index(id)?;
        let mut slide = self.slides[index].clone();
        update.apply_to(&mut slide);
        slide.validate()?;
        let mut next = self.clone();
        next.slides[index] = slide;
        Ok(next)
    }

    pub fn set_theme(&self, input: &ThemeInput) -> Result<Document> {
        let theme = theme::resolve(input)?;
        let mut next = self.clone();
        next.theme = theme;
        Ok(next)
    }

    pub fn set_logo(&self, logo: Option<ImageData>) -> Result<Document> {
        let mut next = self.clone();
        next.logo = logo;
        Ok(next)
    }

    /// Run one [`Operation`] against this document.
    pub fn apply(&self, op: Operation) -> Result<Applied> {
        match op {
            Operation::AddSlide { position } => {
                let (document, id) = self.add_slide(position)?;
                Ok(Applied {
                    document,
                    slide_id: Some(id),
                })
            }
            Operation::RemoveSlide(id) => self.remove_slide(id).map(Applied::document),
            Operation::DuplicateSlide(id) => {
                let (document, new_id) = self.duplicate_slide(id)?;
                Ok(Applied {
                    document,
                    slide_id: Some(new_id),
                })
            }
            Operation::Reorder { id, new_index } => {
                self.reorder(id, new_index).map(Applied::document)
            }
            Operation::UpdateSlide { id, update } => {
                self.update_slide(id, update).map(Applied::document)
            }
            Operation::SetTheme(input) => self.set_theme(&input).map(Applied::document),
            Operation::SetLogo(logo) => self.set_logo(logo).map(Applied::document),
        }
    }
}
