use super::*;
use crate::theme::{CustomTheme, Transition};

fn titled(session: &mut Session, title: &str) -> SlideId {
    let id = session.add_slide(None).expect("add slide");
    session
        .update_slide(id, SlideUpdate::Title(title.to_string()))
        .expect("set title");
    id
}

fn titles(document: &Document) -> Vec<String> {
    document.slides().iter().map(|s| s.title.clone()).collect()
}

#[test]
fn test_reorder_moves_last_slide_to_front() {
    let mut session = Session::new(10);
    titled(&mut session, "A");
    titled(&mut session, "B");
    let c = titled(&mut session, "C");

    session.reorder(c, 0).unwrap();
    assert_eq!(titles(session.document()), vec!["C", "A", "B"]);

    session.undo().unwrap();
    assert_eq!(titles(session.document()), vec!["A", "B", "C"]);
}

#[test]
fn test_duplicate_is_independent_copy() {
    let mut session = Session::new(10);
    let original = titled(&mut session, "Original");
    session
        .update_slide(
            original,
            SlideUpdate::Blocks(vec![ContentBlock::text("Point")]),
        )
        .unwrap();

    let copy = session.duplicate_slide(original).unwrap();
    assert_ne!(copy, original);
    assert_eq!(session.document().index_of(copy), Some(1));

    session
        .update_slide(copy, SlideUpdate::Title("Copy".to_string()))
        .unwrap();
    let document = session.document();
    assert_eq!(document.slide(original).unwrap().title, "Original");
    assert_eq!(document.slide(copy).unwrap().title, "Copy");
    assert_eq!(
        document.slide(copy).unwrap().blocks,
        document.slide(original).unwrap().blocks
    );
}

#[test]
fn test_failed_operation_changes_nothing() {
    let mut session = Session::new(10);
    let id = titled(&mut session, "Only");
    let ghost = session.add_slide(None).unwrap();
    session.remove_slide(ghost).unwrap();
    session.remove_slide(id).unwrap();
    session.undo().unwrap();
    assert!(session.history().can_redo());

    let before = session.document().clone();
    let depth = session.history().undo_depth();

    let missing = session.duplicate_slide(ghost);
    assert!(matches!(missing, Err(DeckError::NotFoundError(_))));
    assert!(matches!(
        session.reorder(id, 1),
        Err(DeckError::RangeError { index: 1, len: 1 })
    ));
    assert!(matches!(
        session.add_slide(Some(5)),
        Err(DeckError::RangeError { index: 5, len: 1 })
    ));

    assert_eq!(session.document(), &before);
    assert_eq!(session.history().undo_depth(), depth);
    assert!(session.history().can_redo());
}

#[test]
fn test_history_depth_evicts_oldest() {
    let mut session = Session::new(3);
    for _ in 0..4 {
        session.add_slide(None).unwrap();
    }
    assert_eq!(session.history().undo_depth(), 3);

    for _ in 0..3 {
        session.undo().unwrap();
    }
    assert_eq!(session.document().len(), 1);
    assert!(matches!(
        session.undo(),
        Err(DeckError::HistoryEmptyError("undo"))
    ));

    for _ in 0..3 {
        session.redo().unwrap();
    }
    assert_eq!(session.document().len(), 4);
}

#[test]
fn test_ids_not_reused_after_undo() {
    let mut session = Session::new(10);
    let first = session.add_slide(None).unwrap();
    session.undo().unwrap();
    let second = session.add_slide(None).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_invalid_theme_leaves_history_alone() {
    let mut session = Session::new(10);
    let incomplete = CustomTheme {
        font_family: Some("Verdana".to_string()),
        ..Default::default()
    };
    let result = session.set_theme(ThemeInput::Custom(incomplete));
    assert!(matches!(result, Err(DeckError::ConfigError(_))));
    assert!(!session.history().can_undo());

    session.set_theme(PresetName::Creative.into()).unwrap();
    assert_eq!(session.document().theme().font_family, "Georgia");
    session.undo().unwrap();
    assert_eq!(session.document().theme(), &PresetName::Professional.theme());
}

#[test]
fn test_update_rejects_chart_ref_without_chart() {
    let mut session = Session::new(10);
    let id = titled(&mut session, "Numbers");
    let result = session.update_slide(id, SlideUpdate::Blocks(vec![ContentBlock::ChartRef]));
    assert!(matches!(result, Err(DeckError::ChartDataError(_))));
    assert!(session.document().slide(id).unwrap().blocks.is_empty());
}

#[test]
fn test_import_replaces_document_and_resets_history() {
    let mut session = Session::new(10);
    titled(&mut session, "Scratch");
    let outline = r#"[{"title": "Intro", "content": ["Hello"], "transition": "Push"}]"#;

    session.import_json(outline, &MediaLibrary::new()).unwrap();
    assert_eq!(titles(session.document()), vec!["Intro"]);
    assert_eq!(
        session.document().slides()[0].transition,
        Some(Transition::Push)
    );
    assert!(!session.history().can_undo());

    let broken = session.import_json(r#"[{"content": []}]"#, &MediaLibrary::new());
    assert!(matches!(
        broken,
        Err(DeckError::SchemaError { index: Some(0), .. })
    ));
    assert_eq!(titles(session.document()), vec!["Intro"]);
}

#[test]
fn test_export_config_overrides() {
    let config = Config::new();
    let defaults = config.get_export_config(None, None, None, None);
    assert_eq!(defaults.title, "Presentation");
    assert_eq!(defaults.aspect_ratio, AspectRatio::Standard);
    assert_eq!(defaults.chart, ChartOptions::default());

    let custom = config.get_export_config(
        Some("Board Deck".to_string()),
        Some("16:9".to_string()),
        Some(640),
        None,
    );
    assert_eq!(custom.title, "Board Deck");
    assert_eq!(custom.aspect_ratio, AspectRatio::Widescreen);
    assert_eq!(custom.chart.width, 640);
    assert_eq!(custom.chart.height, 600);
}

#[test]
fn test_update_rejects_invalid_chart_spec() {
    let mut session = Session::new(10);
    let id = titled(&mut session, "Numbers");
    let before = session.document().clone();
    let depth = session.history().undo_depth();

    let mismatched = ChartSpec::Manual {
        chart_type: ChartType::Bar,
        categories: vec!["A".to_string(), "B".to_string()],
        values: vec![1.0, 2.0, 3.0],
    };
    let manual_scatter = ChartSpec::Manual {
        chart_type: ChartType::Scatter,
        categories: vec!["A".to_string()],
        values: vec![1.0],
    };
    for spec in [mismatched, manual_scatter] {
        let result = session.update_slide(id, SlideUpdate::Chart(Some(spec)));
        assert!(matches!(result, Err(DeckError::ChartDataError(_))));
    }

    assert_eq!(session.document(), &before);
    assert_eq!(session.history().undo_depth(), depth);
}

#[test]
fn test_update_rejects_out_of_range_font_size() {
    let mut session = Session::new(10);
    let id = titled(&mut session, "Big");
    let depth = session.history().undo_depth();

    for size in [0, theme::MAX_FONT_SIZE + 1, 50_000_000] {
        let style = theme::SlideStyleOverride {
            font_size: Some(size),
            ..Default::default()
        };
        let result = session.update_slide(id, SlideUpdate::Style(style));
        assert!(matches!(result, Err(DeckError::ConfigError(_))));
    }
    assert_eq!(session.history().undo_depth(), depth);

    let style = theme::SlideStyleOverride {
        font_size: Some(theme::MAX_FONT_SIZE),
        ..Default::default()
    };
    session.update_slide(id, SlideUpdate::Style(style)).unwrap();
    let config = ExportConfig {
        parallel: false,
        ..Default::default()
    };
    assert!(export(session.document(), &TableBindings::new(), &config).is_ok());
}
