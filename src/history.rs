// ABOUTME: Linear undo/redo history over document snapshots
// ABOUTME: Every successful operation pushes the previous document; failures leave history untouched

use crate::errors::{DeckError, Result};
use crate::model::{Document, Operation, SlideId};
use log::debug;
use std::collections::VecDeque;

/// Default number of retained undo steps.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Past, present and future document snapshots.
///
/// `past` is ordered oldest to newest; `future` has the next redo at the front.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Document>,
    present: Document,
    future: VecDeque<Document>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl History {
    /// Start from an empty document.
    pub fn new(max_depth: usize) -> Self {
        Self::with_document(Document::new(), max_depth)
    }

    pub fn with_document(document: Document, max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: document,
            future: VecDeque::new(),
            max_depth,
        }
    }

    pub fn present(&self) -> &Document {
        &self.present
    }

    pub fn past(&self) -> impl Iterator<Item = &Document> {
        self.past.iter()
    }

    pub fn future(&self) -> impl Iterator<Item = &Document> {
        self.future.iter()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Run `op` against the present document and record the result.
    ///
    /// Returns the id of the slide the operation created, if any.
    pub fn apply(&mut self, op: Operation) -> Result<Option<SlideId>> {
        let applied = self.present.apply(op)?;
        let previous = std::mem::replace(&mut self.present, applied.document);
        self.push_past(previous);
        self.future.clear();
        debug!(
            "Applied operation; undo depth {}, redo cleared",
            self.past.len()
        );
        Ok(applied.slide_id)
    }

    pub fn undo(&mut self) -> Result<&Document> {
        let previous = self
            .past
            .pop_back()
            .ok_or(DeckError::HistoryEmptyError("undo"))?;
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        while self.future.len() > self.max_depth {
            self.future.pop_back();
        }
        debug!(
            "Undo; {} step(s) left, {} redo step(s)",
            self.past.len(),
            self.future.len()
        );
        Ok(&self.present)
    }

    pub fn redo(&mut self) -> Result<&Document> {
        let next = self
            .future
            .pop_front()
            .ok_or(DeckError::HistoryEmptyError("redo"))?;
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        debug!(
            "Redo; {} undo step(s), {} redo step(s) left",
            self.past.len(),
            self.future.len()
        );
        Ok(&self.present)
    }

    fn push_past(&mut self, document: Document) {
        self.past.push_back(document);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
    }
}
