// ABOUTME: Editing session for deckhand: a document, its undo history and export settings
// ABOUTME: Front door used by the CLI and by embedders driving the editor

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::history::History;
use crate::media::{ImageData, MediaLibrary};
use crate::model::{Document, Operation, SlideId, SlideUpdate};
use crate::outline;
use crate::pptx::{self, CancelToken, ExportConfig};
use crate::table::TableBindings;
use crate::theme::ThemeInput;
use log::info;

#[derive(Debug, Clone)]
pub struct Session {
    history: History,
    config: Config,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}

impl Session {
    pub fn new(max_depth: usize) -> Self {
        Self::from_config(Config {
            history_depth: max_depth,
            ..Config::default()
        })
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            history: History::new(config.history_depth),
            config,
        }
    }

    pub fn document(&self) -> &Document {
        self.history.present()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the document and start a fresh history.
    pub fn load(&mut self, document: Document) {
        info!("Loaded document with {} slides", document.len());
        self.history = History::with_document(document, self.config.history_depth);
    }

    /// Import an outline as the new document. On error the session is unchanged.
    pub fn import_json(&mut self, json: &str, media: &MediaLibrary) -> Result<()> {
        let document = outline::parse_with_media(json, media)?;
        self.load(document);
        Ok(())
    }

    pub fn export_json(&self) -> Result<String> {
        outline::to_json(self.document())
    }

    pub fn apply(&mut self, op: Operation) -> Result<Option<SlideId>> {
        self.history.apply(op)
    }

    pub fn add_slide(&mut self, position: Option<usize>) -> Result<SlideId> {
        self.apply(Operation::AddSlide { position })?
            .ok_or_else(|| DeckError::UnknownError("AddSlide returned no slide id".to_string()))
    }

    pub fn remove_slide(&mut self, id: SlideId) -> Result<()> {
        self.apply(Operation::RemoveSlide(id)).map(|_| ())
    }

    pub fn duplicate_slide(&mut self, id: SlideId) -> Result<SlideId> {
        self.apply(Operation::DuplicateSlide(id))?.ok_or_else(|| {
            DeckError::UnknownError("DuplicateSlide returned no slide id".to_string())
        })
    }

    pub fn reorder(&mut self, id: SlideId, new_index: usize) -> Result<()> {
        self.apply(Operation::Reorder { id, new_index }).map(|_| ())
    }

    pub fn update_slide(&mut self, id: SlideId, update: SlideUpdate) -> Result<()> {
        self.apply(Operation::UpdateSlide { id, update }).map(|_| ())
    }

    pub fn set_theme(&mut self, input: ThemeInput) -> Result<()> {
        self.apply(Operation::SetTheme(input)).map(|_| ())
    }

    pub fn set_logo(&mut self, logo: Option<ImageData>) -> Result<()> {
        self.apply(Operation::SetLogo(logo)).map(|_| ())
    }

    pub fn undo(&mut self) -> Result<&Document> {
        self.history.undo()
    }

    pub fn redo(&mut self) -> Result<&Document> {
        self.history.redo()
    }

    /// Export settings derived from the session config.
    pub fn export_config(&self) -> ExportConfig {
        self.config.get_export_config(None, None, None, None)
    }

    pub fn export(
        &self,
        tables: &TableBindings,
        config: &ExportConfig,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        pptx::export_with_cancel(self.document(), tables, config, cancel)
    }
}
