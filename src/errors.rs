// ABOUTME: Error types for the deckhand library
// ABOUTME: Provides one typed failure per stage: import, theming, charts, editing, history, export

use crate::model::SlideId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    /// Malformed outline JSON. `index` is the offending slide, when known.
    #[error("Schema error{}: field `{field}`: {message}", slide_suffix(.index))]
    SchemaError {
        index: Option<usize>,
        field: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Chart data error: {0}")]
    ChartDataError(String),

    #[error("Slide not found: {0}")]
    NotFoundError(SlideId),

    #[error("Index {index} out of range for {len} slides")]
    RangeError { index: usize, len: usize },

    #[error("Nothing to {0}")]
    HistoryEmptyError(&'static str),

    #[error("Export failed{}: {source}", slide_suffix(.slide))]
    ExportError {
        slide: Option<usize>,
        #[source]
        source: Box<DeckError>,
    },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

fn slide_suffix(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" in slide {}", i),
        None => String::new(),
    }
}

impl DeckError {
    pub fn schema(index: Option<usize>, field: &str, message: impl Into<String>) -> Self {
        DeckError::SchemaError {
            index,
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a lower-level failure raised while exporting slide `slide`.
    pub fn export(slide: Option<usize>, source: DeckError) -> Self {
        DeckError::ExportError {
            slide,
            source: Box::new(source),
        }
    }
}

impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<image::ImageError> for DeckError {
    fn from(err: image::ImageError) -> Self {
        DeckError::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::schema(None, "$", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
