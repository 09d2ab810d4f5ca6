// ABOUTME: Integration tests for outline import and PPTX export
// ABOUTME: Imports JSON outlines, exports them and inspects the resulting zip package

use deckhand::table::Table;
use deckhand::theme::PresetName;
use deckhand::{
    export, export_to_file, export_with_cancel, outline, CancelToken, ChartSpec, ChartType,
    ContentBlock, DeckError, ExportConfig, ImageData, MediaLibrary, TableBindings,
};
use image::{ImageOutputFormat, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use tempfile::tempdir;
use zip::ZipArchive;

const INTRO: &str = r#"[{"title":"Intro","content":["A","B"],"chart":"pie","chart_input_type":"Manual","chart_data":{"categories":["A","B"],"values":[60,40]}}]"#;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

fn sequential() -> ExportConfig {
    ExportConfig {
        parallel: false,
        ..Default::default()
    }
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes)).expect("Failed to open PPTX");
    archive.file_names().map(str::to_string).collect()
}

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("Failed to open PPTX");
    let mut file = archive.by_name(name).expect("Missing entry");
    let mut content = String::new();
    file.read_to_string(&mut content).expect("Entry is not UTF-8");
    content
}

#[test]
fn test_intro_outline_imports_and_exports() {
    let document = outline::parse(INTRO).unwrap();
    assert_eq!(document.len(), 1);

    let slide = &document.slides()[0];
    assert_eq!(slide.title, "Intro");
    assert_eq!(
        slide.blocks,
        vec![ContentBlock::text("A"), ContentBlock::text("B")]
    );
    assert_eq!(
        slide.chart,
        Some(ChartSpec::Manual {
            chart_type: ChartType::Pie,
            categories: vec!["A".to_string(), "B".to_string()],
            values: vec![60.0, 40.0],
        })
    );

    let bytes = export(&document, &TableBindings::new(), &ExportConfig::default()).unwrap();
    let names = entry_names(&bytes);
    let slides: Vec<_> = names
        .iter()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .collect();
    let media: Vec<_> = names.iter().filter(|n| n.starts_with("ppt/media/")).collect();
    assert_eq!(slides.len(), 1);
    assert_eq!(media.len(), 1);
    assert!(names.contains(&"[Content_Types].xml".to_string()));
    assert!(names.contains(&"ppt/presentation.xml".to_string()));

    let slide_xml = read_entry(&bytes, "ppt/slides/slide1.xml");
    assert!(slide_xml.contains("<a:t>Intro</a:t>"));
    assert!(slide_xml.contains("<a:t>Intro Chart</a:t>"));
    assert!(slide_xml.contains("<p:pic>"));
    // Professional theme defaults to a fade.
    assert!(slide_xml.contains("<p:fade/>"));
}

#[test]
fn test_schema_errors_name_slide_and_field() {
    let missing_title = r#"[{"title":"Ok"},{"content":["x"]}]"#;
    match outline::parse(missing_title) {
        Err(DeckError::SchemaError { index, field, .. }) => {
            assert_eq!(index, Some(1));
            assert_eq!(field, "title");
        }
        other => panic!("Expected a schema error, got {:?}", other),
    }

    let bad_values = r#"[{"title":"T","chart":"bar","chart_input_type":"Manual","chart_data":{"categories":["a"],"values":["x"]}}]"#;
    assert!(matches!(
        outline::parse(bad_values),
        Err(DeckError::SchemaError { field, .. }) if field == "chart_data.values"
    ));

    let mismatched = r#"[{"title":"T","chart":"bar","chart_input_type":"Manual","chart_data":{"categories":["a","b"],"values":[1]}}]"#;
    assert!(matches!(
        outline::parse(mismatched),
        Err(DeckError::SchemaError { field, .. }) if field == "chart_data"
    ));

    let not_array = r#"{"title":"T"}"#;
    assert!(matches!(
        outline::parse(not_array),
        Err(DeckError::SchemaError { index: None, .. })
    ));

    let unknown = r#"[{"title":"T","speaker":"me"}]"#;
    assert!(matches!(
        outline::parse(unknown),
        Err(DeckError::SchemaError { field, .. }) if field == "speaker"
    ));
}

#[test]
fn test_outline_round_trip_keeps_slides() {
    let json = r#"[
        {"title":"Intro","content":["Hello","World"],"transition":"Wipe"},
        {"title":"Sales","chart":"bar","chart_input_type":"Dataset","chart_data":{"table":"sales","x_col":"region","y_col":"revenue"},"style":{"bold":true,"alignment":"center"}}
    ]"#;
    let document = outline::parse(json).unwrap();
    let written = outline::to_json(&document).unwrap();
    let reparsed = outline::parse(&written).unwrap();

    let strip = |d: &deckhand::Document| {
        d.slides()
            .iter()
            .map(|s| {
                (
                    s.title.clone(),
                    s.blocks.clone(),
                    s.chart.clone(),
                    s.style_override.clone(),
                    s.transition,
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&document), strip(&reparsed));
}

#[test]
fn test_images_resolve_through_media_library() {
    let mut media = MediaLibrary::new();
    media.insert("photo.png", png_bytes(40, 20)).unwrap();

    let json = r#"[{"title":"Photo","image":"photo.png"}]"#;
    let document = outline::parse_with_media(json, &media).unwrap();
    let bytes = export(&document, &TableBindings::new(), &sequential()).unwrap();
    assert!(entry_names(&bytes).contains(&"ppt/media/image1.png".to_string()));

    let rels = read_entry(&bytes, "ppt/slides/_rels/slide1.xml.rels");
    assert!(rels.contains("../media/image1.png"));

    let missing = r#"[{"title":"Photo","images":["photo.png","nope.png"]}]"#;
    assert!(matches!(
        outline::parse_with_media(missing, &media),
        Err(DeckError::SchemaError { field, .. }) if field == "images"
    ));
}

#[test]
fn test_dataset_chart_reads_bound_table() {
    let json = r#"[{"title":"Sales","chart":"line","chart_input_type":"Dataset","chart_data":{"table":"sales","x_col":"month","y_col":"revenue"}}]"#;
    let document = outline::parse(json).unwrap();

    let mut tables = TableBindings::new();
    tables.insert(
        "sales".to_string(),
        Table::new()
            .with_text("month", vec!["Jan", "Feb", "Mar"])
            .unwrap()
            .with_numeric("revenue", vec![3.0, 5.0, 4.0])
            .unwrap(),
    );
    let bytes = export(&document, &tables, &sequential()).unwrap();
    assert!(entry_names(&bytes).contains(&"ppt/media/chart1.png".to_string()));
}

#[test]
fn test_export_failure_names_the_slide() {
    let json = r#"[
        {"title":"Fine"},
        {"title":"Broken","chart":"bar","chart_input_type":"Dataset","chart_data":{"x_col":"a","y_col":"b"}}
    ]"#;
    let document = outline::parse(json).unwrap();

    for config in [ExportConfig::default(), sequential()] {
        match export(&document, &TableBindings::new(), &config) {
            Err(DeckError::ExportError { slide, source }) => {
                assert_eq!(slide, Some(1));
                assert!(matches!(*source, DeckError::ChartDataError(_)));
            }
            other => panic!("Expected an export error, got {:?}", other.map(|b| b.len())),
        }
    }
}

#[test]
fn test_failed_export_writes_no_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out/deck.pptx");
    let json = r#"[{"title":"Broken","chart":"pie","chart_input_type":"Manual","chart_data":{"categories":["a","b"],"values":[-1,2]}}]"#;
    let document = outline::parse(json).unwrap();

    let result = export_to_file(
        &document,
        &TableBindings::new(),
        &sequential(),
        &output,
        &CancelToken::new(),
    );
    assert!(result.is_err());
    assert!(!output.exists());
    assert!(!dir.path().join("out").exists());

    let cancel = CancelToken::new();
    cancel.cancel();
    let fine = outline::parse(r#"[{"title":"Fine"}]"#).unwrap();
    let cancelled = export_to_file(&fine, &TableBindings::new(), &sequential(), &output, &cancel);
    assert!(matches!(cancelled, Err(DeckError::Cancelled)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_cancelled_export_returns_cancelled() {
    let document = outline::parse(INTRO).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        export_with_cancel(&document, &TableBindings::new(), &sequential(), &cancel),
        Err(DeckError::Cancelled)
    ));
}

#[test]
fn test_export_to_file_with_logo_and_theme() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("deck.pptx");
    let json = r#"[{"title":"One"},{"title":"Two","transition":"None"}]"#;
    let document = outline::parse(json)
        .unwrap()
        .set_theme(&PresetName::Minimalist.into())
        .unwrap()
        .set_logo(Some(ImageData::new("logo.png", png_bytes(10, 10)).unwrap()))
        .unwrap();

    let config = ExportConfig {
        title: "Quarterly <Review>".to_string(),
        ..sequential()
    };
    export_to_file(
        &document,
        &TableBindings::new(),
        &config,
        &output,
        &CancelToken::new(),
    )
    .unwrap();

    let bytes = std::fs::read(&output).unwrap();
    let names = entry_names(&bytes);
    assert_eq!(
        names.iter().filter(|n| n.starts_with("ppt/media/")).count(),
        1
    );
    assert!(names.contains(&"ppt/media/logo.png".to_string()));

    let core = read_entry(&bytes, "docProps/core.xml");
    assert!(core.contains("Quarterly &lt;Review&gt;"));

    let second = read_entry(&bytes, "ppt/slides/slide2.xml");
    assert!(!second.contains("<p:transition"));
    assert!(second.contains(r#"typeface="Arial""#));
    assert!(second.contains(r#"<a:srgbClr val="FFFFFF"/>"#));

    let presentation = read_entry(&bytes, "ppt/presentation.xml");
    assert!(presentation.contains(r#"type="screen4x3""#));
    assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId3"/>"#));
}

#[test]
fn test_notes_and_title_shadow_are_exported() {
    let json = r#"[{"title":"One"},{"title":"Two","transition":"Wipe"}]"#;
    let document = outline::parse(json).unwrap();
    let bytes = export(&document, &TableBindings::new(), &sequential()).unwrap();
    let names = entry_names(&bytes);
    assert!(names.contains(&"ppt/notesMasters/notesMaster1.xml".to_string()));
    assert!(names.contains(&"ppt/notesSlides/notesSlide2.xml".to_string()));

    let first = read_entry(&bytes, "ppt/notesSlides/notesSlide1.xml");
    assert!(first.contains("Recommended transition: Fade"));
    let second = read_entry(&bytes, "ppt/notesSlides/notesSlide2.xml");
    assert!(second.contains("Recommended transition: Wipe"));

    let rels = read_entry(&bytes, "ppt/slides/_rels/slide2.xml.rels");
    assert!(rels.contains("../notesSlides/notesSlide2.xml"));
    let types = read_entry(&bytes, "[Content_Types].xml");
    assert!(types.contains("/ppt/notesSlides/notesSlide1.xml"));
    let presentation = read_entry(&bytes, "ppt/presentation.xml");
    assert!(presentation.contains("<p:notesMasterIdLst>"));

    let slide = read_entry(&bytes, "ppt/slides/slide1.xml");
    assert!(slide.contains(r#"<a:outerShdw blurRad="38100" dist="25400" dir="2700000""#));
    assert_eq!(slide.matches("<a:outerShdw").count(), 1);
}

#[test]
fn test_oversized_style_font_is_a_style_error() {
    let json = r#"[{"title":"Loud","style":{"font_size":5000}}]"#;
    assert!(matches!(
        outline::parse(json),
        Err(DeckError::SchemaError { index: Some(0), field, .. }) if field == "style"
    ));
}
