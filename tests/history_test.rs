// ABOUTME: Property tests for the undo/redo history
// ABOUTME: Random edit sequences must undo back through every snapshot and redo forward again

use deckhand::model::{Operation, SlideUpdate};
use deckhand::theme::PresetName;
use deckhand::{ContentBlock, Document, History};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Add(usize),
    Remove(usize),
    Duplicate(usize),
    Move(usize, usize),
    Rewrite(usize, String),
    Theme(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..8).prop_map(Edit::Add),
        (0usize..8).prop_map(Edit::Remove),
        (0usize..8).prop_map(Edit::Duplicate),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Edit::Move(a, b)),
        (0usize..8, "[a-z]{1,8}").prop_map(|(i, t)| Edit::Rewrite(i, t)),
        (0usize..3).prop_map(Edit::Theme),
    ]
}

/// Turn an edit into an operation against `document`. Indexes may point
/// past the end so that failing operations are exercised too.
fn to_operation(edit: &Edit, document: &Document) -> Option<Operation> {
    let ids = document.slide_ids();
    let pick = |i: usize| ids.get(i % ids.len().max(1)).copied();
    match edit {
        Edit::Add(i) => Some(Operation::AddSlide {
            position: Some(*i % (ids.len() + 2)),
        }),
        Edit::Remove(i) => pick(*i).map(Operation::RemoveSlide),
        Edit::Duplicate(i) => pick(*i).map(Operation::DuplicateSlide),
        Edit::Move(i, to) => pick(*i).map(|id| Operation::Reorder { id, new_index: *to }),
        Edit::Rewrite(i, text) => pick(*i).map(|id| Operation::UpdateSlide {
            id,
            update: SlideUpdate::Blocks(vec![ContentBlock::text(text.clone())]),
        }),
        Edit::Theme(i) => Some(Operation::SetTheme(PresetName::ALL[*i].into())),
    }
}

proptest! {
    #[test]
    fn undo_redo_walks_every_snapshot(edits in prop::collection::vec(edit_strategy(), 0..24)) {
        let mut history = History::new(64);
        let mut snapshots = vec![history.present().clone()];

        for edit in &edits {
            let Some(op) = to_operation(edit, history.present()) else { continue };
            let before = history.present().clone();
            match history.apply(op) {
                Ok(_) => snapshots.push(history.present().clone()),
                Err(_) => prop_assert_eq!(history.present(), &before),
            }
        }
        prop_assert_eq!(history.undo_depth(), snapshots.len() - 1);

        for expected in snapshots.iter().rev().skip(1) {
            prop_assert_eq!(history.undo().unwrap(), expected);
        }
        prop_assert!(history.undo().is_err());

        for expected in snapshots.iter().skip(1) {
            prop_assert_eq!(history.redo().unwrap(), expected);
        }
        prop_assert!(history.redo().is_err());
    }

    #[test]
    fn depth_is_bounded(count in 0usize..40, depth in 0usize..10) {
        let mut history = History::new(depth);
        for _ in 0..count {
            history.apply(Operation::AddSlide { position: None }).unwrap();
        }
        prop_assert_eq!(history.undo_depth(), count.min(depth));

        let undone = (0..count).take_while(|_| history.undo().is_ok()).count();
        prop_assert_eq!(undone, count.min(depth));
        prop_assert_eq!(history.present().len(), count - count.min(depth));
    }
}
