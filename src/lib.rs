// ABOUTME: Library module for the deckhand presentation editor.
// ABOUTME: Document model, undo history, theming, charts, outline import and PPTX export.

pub mod chart;
pub mod config;
pub mod errors;
pub mod history;
pub mod layout;
pub mod media;
pub mod model;
pub mod outline;
pub mod pptx;
pub mod session;
pub mod table;
pub mod theme;
pub mod utils;

// Reexport common types and functions
pub use chart::{ChartImage, ChartOptions};
pub use config::Config;
pub use errors::{DeckError, Result};
pub use history::History;
pub use layout::AspectRatio;
pub use media::{ImageData, MediaLibrary};
pub use model::{ChartSpec, ChartType, ContentBlock, Document, Operation, Slide, SlideId, SlideUpdate};
pub use pptx::{export, export_to_file, export_with_cancel, CancelToken, ExportConfig};
pub use session::Session;
pub use table::{Table, TableBindings};
pub use theme::{PresetName, Theme, ThemeInput};

#[cfg(test)]
mod tests;
