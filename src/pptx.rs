// ABOUTME: PPTX export for the deckhand library
// ABOUTME: Resolves styles, renders charts per slide, and packages the document into a PresentationML zip

use crate::chart::{self, ChartOptions};
use crate::errors::{DeckError, Result};
use crate::layout::{self, AspectRatio, Frame, MediaRef, MediaSizes, Shape, TextRole};
use crate::media::ImageData;
use crate::model::{ContentBlock, Document, Slide};
use crate::table::TableBindings;
use crate::theme::{self, Alignment, Background, Layout, ResolvedSlideStyle, Theme, Transition};
use crate::utils;
use log::{debug, info, warn};
use quick_xml::escape::escape;
use rayon::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Configuration for PPTX generation
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub title: String,
    pub aspect_ratio: AspectRatio,
    pub chart: ChartOptions,
    /// Render slides on the rayon pool instead of one after another.
    pub parallel: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Presentation".to_string(),
            aspect_ratio: AspectRatio::Standard,
            chart: ChartOptions::default(),
            parallel: true,
        }
    }
}

/// Cooperative cancellation for a running export. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DeckError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One slide with everything resolved: style, rendered chart, placed shapes.
struct PreparedSlide {
    style: ResolvedSlideStyle,
    shapes: Vec<Shape>,
    images: Vec<ImageData>,
    chart: Option<ImageData>,
}

/// Export a document to PPTX bytes.
pub fn export(document: &Document, tables: &TableBindings, config: &ExportConfig) -> Result<Vec<u8>> {
    export_with_cancel(document, tables, config, &CancelToken::new())
}

/// Export a document to PPTX bytes, giving up as soon as `cancel` fires.
pub fn export_with_cancel(
    document: &Document,
    tables: &TableBindings,
    config: &ExportConfig,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    info!("Exporting {} slides to PPTX", document.len());
    cancel.check()?;

    let logo_size = document
        .logo()
        .map(ImageData::dimensions)
        .transpose()
        .map_err(|e| DeckError::export(None, e))?;

    let prepare =
        |(index, slide): (usize, &Slide)| prepare_slide(index, slide, document, tables, config, cancel, logo_size);
    let results: Vec<Result<PreparedSlide>> = if config.parallel {
        document.slides().par_iter().enumerate().map(prepare).collect()
    } else {
        document.slides().iter().enumerate().map(prepare).collect()
    };

    let mut prepared = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(slide) => prepared.push(slide),
            Err(DeckError::Cancelled) => return Err(DeckError::Cancelled),
            Err(e) => return Err(DeckError::export(Some(index), e)),
        }
    }

    cancel.check()?;
    let bytes = write_package(document, &prepared, config)?;
    info!("PPTX package assembled ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Export straight to a file. Nothing is written unless the export succeeds.
pub fn export_to_file(
    document: &Document,
    tables: &TableBindings,
    config: &ExportConfig,
    output_file: &Path,
    cancel: &CancelToken,
) -> Result<()> {
    let bytes = export_with_cancel(document, tables, config, cancel)?;
    cancel.check()?;
    utils::ensure_parent_directory_exists(output_file)?;

    let partial = output_file.with_extension("pptx.partial");
    let written = fs::write(&partial, &bytes).and_then(|()| fs::rename(&partial, output_file));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial) {
            warn!("Failed to remove {:?}: {}", partial, cleanup);
        }
        return Err(DeckError::FileReadError(e));
    }
    info!("PPTX file created at {:?}", output_file);
    Ok(())
}

fn prepare_slide(
    index: usize,
    slide: &Slide,
    document: &Document,
    tables: &TableBindings,
    config: &ExportConfig,
    cancel: &CancelToken,
    logo_size: Option<(u32, u32)>,
) -> Result<PreparedSlide> {
    cancel.check()?;
    debug!("Preparing slide {} '{}'", index + 1, slide.title);

    let style = theme::slide_style(document.theme(), &slide.style_override, slide.transition);
    let mut sizes = MediaSizes {
        logo: logo_size,
        ..Default::default()
    };

    let mut images = Vec::new();
    for block in &slide.blocks {
        if let ContentBlock::Image(image) = block {
            sizes.blocks.push(image.dimensions()?);
            images.push(image.clone());
        }
    }

    let chart = match &slide.chart {
        Some(spec) => {
            let rendered = chart::render(spec, &style, tables, &config.chart)?;
            sizes.chart = Some((rendered.width, rendered.height));
            Some(rendered.into_image_data(&format!("chart{}.png", index + 1)))
        }
        None => None,
    };

    let shapes = layout::layout_slide(slide, &style, config.aspect_ratio.dimensions(), &sizes);
    Ok(PreparedSlide {
        style,
        shapes,
        images,
        chart,
    })
}

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn part(&mut self, name: &str, content: &str) -> Result<()> {
        debug!("Writing part {}", name);
        self.zip.start_file(name, FileOptions::default())?;
        self.zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Media is already compressed; store it as-is.
    fn media(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        debug!("Adding media {}", name);
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file(name, options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Relationship targets of one slide, in rId order after the layout (rId1).
struct SlideRels {
    blocks: Vec<String>,
    chart: Option<String>,
    logo: Option<String>,
}

impl SlideRels {
    fn rel_id(&self, media: MediaRef) -> Option<String> {
        let index = match media {
            MediaRef::Block(i) if i < self.blocks.len() => i,
            MediaRef::Chart if self.chart.is_some() => self.blocks.len(),
            MediaRef::Logo if self.logo.is_some() => {
                self.blocks.len() + usize::from(self.chart.is_some())
            }
            _ => return None,
        };
        Some(format!("rId{}", index + 2))
    }

    fn targets(&self) -> impl Iterator<Item = &String> {
        self.blocks.iter().chain(self.chart.iter()).chain(self.logo.iter())
    }
}

fn write_package(document: &Document, slides: &[PreparedSlide], config: &ExportConfig) -> Result<Vec<u8>> {
    let mut package = PackageWriter::new();

    package.part("[Content_Types].xml", &content_types_xml(slides.len()))?;
    package.part("_rels/.rels", &root_rels_xml())?;
    package.part("docProps/app.xml", &app_xml(slides.len()))?;
    package.part("docProps/core.xml", &core_xml(document, &config.title))?;
    package.part("ppt/presentation.xml", &presentation_xml(slides.len(), config.aspect_ratio))?;
    package.part(
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slides.len()),
    )?;
    package.part("ppt/theme/theme1.xml", &theme_xml(document.theme()))?;
    package.part("ppt/theme/theme2.xml", &theme_xml(document.theme()))?;
    package.part("ppt/notesMasters/notesMaster1.xml", &notes_master_xml())?;
    package.part(
        "ppt/notesMasters/_rels/notesMaster1.xml.rels",
        &relationships_xml(&[(
            "rId1".to_string(),
            "theme",
            "../theme/theme2.xml".to_string(),
        )]),
    )?;
    package.part("ppt/slideMasters/slideMaster1.xml", &slide_master_xml())?;
    package.part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &slide_master_rels_xml(),
    )?;
    for layout in Layout::ALL {
        let n = layout.part_number();
        package.part(
            &format!("ppt/slideLayouts/slideLayout{}.xml", n),
            &slide_layout_xml(layout),
        )?;
        package.part(
            &format!("ppt/slideLayouts/_rels/slideLayout{}.xml.rels", n),
            &relationships_xml(&[(
                "rId1".to_string(),
                "slideMaster",
                "../slideMasters/slideMaster1.xml".to_string(),
            )]),
        )?;
    }

    let logo_target = match document.logo() {
        Some(logo) => {
            let name = format!("logo.{}", logo.format.extension());
            package.media(&format!("ppt/media/{}", name), &logo.bytes)?;
            Some(format!("../media/{}", name))
        }
        None => None,
    };

    let mut image_counter = 0;
    for (i, slide) in slides.iter().enumerate() {
        let slide_num = i + 1;
        let mut rels = SlideRels {
            blocks: Vec::with_capacity(slide.images.len()),
            chart: None,
            logo: logo_target.clone(),
        };
        for image in &slide.images {
            image_counter += 1;
            let name = format!("image{}.{}", image_counter, image.format.extension());
            package.media(&format!("ppt/media/{}", name), &image.bytes)?;
            rels.blocks.push(format!("../media/{}", name));
        }
        if let Some(chart) = &slide.chart {
            let name = format!("chart{}.png", slide_num);
            package.media(&format!("ppt/media/{}", name), &chart.bytes)?;
            rels.chart = Some(format!("../media/{}", name));
        }

        let mut entries = vec![(
            "rId1".to_string(),
            "slideLayout",
            format!("../slideLayouts/slideLayout{}.xml", slide.style.layout.part_number()),
        )];
        for (n, target) in rels.targets().enumerate() {
            entries.push((format!("rId{}", n + 2), "image", target.clone()));
        }
        entries.push((
            format!("rId{}", entries.len() + 1),
            "notesSlide",
            format!("../notesSlides/notesSlide{}.xml", slide_num),
        ));
        package.part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            &relationships_xml(&entries),
        )?;
        package.part(
            &format!("ppt/slides/slide{}.xml", slide_num),
            &slide_xml(slide, &rels)?,
        )?;
        package.part(
            &format!("ppt/notesSlides/notesSlide{}.xml", slide_num),
            &notes_slide_xml(slide.style.transition),
        )?;
        package.part(
            &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", slide_num),
            &relationships_xml(&[
                (
                    "rId1".to_string(),
                    "notesMaster",
                    "../notesMasters/notesMaster1.xml".to_string(),
                ),
                (
                    "rId2".to_string(),
                    "slide",
                    format!("../slides/slide{}.xml", slide_num),
                ),
            ]),
        )?;
    }

    info!("Finalizing PPTX package");
    package.finish()
}

fn relationships_xml(entries: &[(String, &str, String)]) -> String {
    let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_DECL, NS_PKG_RELS);
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_BASE, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn content_types_xml(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="jpg" ContentType="image/jpeg"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/ppt/theme/theme2.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/ppt/notesMasters/notesMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
        XML_DECL
    );
    for layout in Layout::ALL {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slideLayouts/slideLayout{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            layout.part_number()
        ));
    }
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/notesSlides/notesSlide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#,
            n = n
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{}/extended-properties" Target="docProps/app.xml"/></Relationships>"#,
        XML_DECL, NS_PKG_RELS, REL_BASE, REL_BASE
    )
}

fn app_xml(slide_count: usize) -> String {
    format!(
        r#"{}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>deckhand</Application><Slides>{}</Slides></Properties>"#,
        XML_DECL, slide_count
    )
}

fn core_xml(document: &Document, title: &str) -> String {
    format!(
        r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>deckhand</dc:creator><dc:identifier>urn:uuid:{}</dc:identifier><dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created><cp:revision>1</cp:revision></cp:coreProperties>"#,
        XML_DECL,
        escape(title),
        document.id(),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    )
}

fn presentation_xml(slide_count: usize, aspect_ratio: AspectRatio) -> String {
    let (cx, cy) = aspect_ratio.dimensions();
    let mut xml = format!(
        r#"{}<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId{}"/></p:notesMasterIdLst>"#,
        XML_DECL,
        NS_A,
        NS_R,
        NS_P,
        slide_count + 3
    );
    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..slide_count {
            xml.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2));
        }
        xml.push_str("</p:sldIdLst>");
    }
    xml.push_str(&format!(
        r#"<p:sldSz cx="{}" cy="{}" type="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        cx,
        cy,
        aspect_ratio.slide_size_type()
    ));
    xml
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut entries = vec![(
        "rId1".to_string(),
        "slideMaster",
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for i in 0..slide_count {
        entries.push((
            format!("rId{}", i + 2),
            "slide",
            format!("slides/slide{}.xml", i + 1),
        ));
    }
    entries.push((
        format!("rId{}", slide_count + 2),
        "theme",
        "theme/theme1.xml".to_string(),
    ));
    entries.push((
        format!("rId{}", slide_count + 3),
        "notesMaster",
        "notesMasters/notesMaster1.xml".to_string(),
    ));
    relationships_xml(&entries)
}

const GROUP_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const NOTES_BODY: &str = r#"<p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#;

fn notes_master_xml() -> String {
    format!(
        r#"{}<p:notesMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}<p:sp>{}<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/></p:notesMaster>"#,
        XML_DECL, NS_A, NS_R, NS_P, GROUP_HEADER, NOTES_BODY
    )
}

/// Speaker notes naming the slide's transition.
fn notes_slide_xml(transition: Transition) -> String {
    format!(
        r#"{}<p:notes xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}<p:sp>{}<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>Recommended transition: {}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#,
        XML_DECL,
        NS_A,
        NS_R,
        NS_P,
        GROUP_HEADER,
        NOTES_BODY,
        transition.name()
    )
}

fn slide_master_xml() -> String {
    let mut layouts = String::new();
    for layout in Layout::ALL {
        let n = layout.part_number();
        layouts.push_str(&format!(
            r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#,
            2147483648u64 + n as u64,
            n
        ));
    }
    format!(
        r#"{}<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
        XML_DECL, NS_A, NS_R, NS_P, GROUP_HEADER, layouts
    )
}

fn slide_master_rels_xml() -> String {
    let mut entries: Vec<(String, &str, String)> = Layout::ALL
        .iter()
        .map(|layout| {
            let n = layout.part_number();
            (
                format!("rId{}", n),
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", n),
            )
        })
        .collect();
    entries.push((
        format!("rId{}", Layout::ALL.len() + 1),
        "theme",
        "../theme/theme1.xml".to_string(),
    ));
    relationships_xml(&entries)
}

fn title_placeholder(layout: Layout) -> Option<&'static str> {
    match layout {
        Layout::TitleSlide => Some("ctrTitle"),
        Layout::TitleAndContent => Some("title"),
        Layout::Blank => None,
    }
}

fn slide_layout_xml(layout: Layout) -> String {
    let (kind, shapes) = match layout {
        Layout::TitleSlide => ("title", placeholder_shape_xml("ctrTitle")),
        Layout::TitleAndContent => ("obj", placeholder_shape_xml("title")),
        Layout::Blank => ("blank", String::new()),
    };
    format!(
        r#"{}<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="{}" preserve="1"><p:cSld name="{}"><p:spTree>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        XML_DECL,
        NS_A,
        NS_R,
        NS_P,
        kind,
        layout.display_name(),
        GROUP_HEADER,
        shapes
    )
}

fn placeholder_shape_xml(ph_type: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="{}"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        ph_type
    )
}

fn theme_xml(theme: &Theme) -> String {
    let font = escape(&theme.font_family);
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="9525">{}</a:ln>"#, fill);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        r#"{}<a:theme xmlns:a="{}" name="Deckhand"><a:themeElements><a:clrScheme name="Deckhand"><a:dk1><a:srgbClr val="{}"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4E79A7"/></a:accent1><a:accent2><a:srgbClr val="F28E2B"/></a:accent2><a:accent3><a:srgbClr val="E15759"/></a:accent3><a:accent4><a:srgbClr val="76B7B2"/></a:accent4><a:accent5><a:srgbClr val="59A14F"/></a:accent5><a:accent6><a:srgbClr val="EDC948"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Deckhand"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Deckhand"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        XML_DECL,
        NS_A,
        theme.font_color.hex(),
        font = font,
        fill = fill,
        line = line,
        effect = effect
    )
}

fn slide_xml(slide: &PreparedSlide, rels: &SlideRels) -> Result<String> {
    let mut xml = format!(
        r#"{}<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld>"#,
        XML_DECL, NS_A, NS_R, NS_P
    );
    xml.push_str(&background_xml(&slide.style.background));
    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_HEADER);

    for (i, shape) in slide.shapes.iter().enumerate() {
        let shape_id = i + 2;
        match shape {
            Shape::Text { role, lines, frame } => {
                xml.push_str(&text_shape_xml(shape_id, *role, lines, *frame, &slide.style));
            }
            Shape::Picture {
                media,
                frame,
                description,
            } => {
                let rel_id = rels.rel_id(*media).ok_or_else(|| {
                    DeckError::PptxError(format!("No relationship for picture {:?}", media))
                })?;
                xml.push_str(&picture_xml(shape_id, &rel_id, *frame, description));
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str(&transition_xml(slide.style.transition));
    xml.push_str("</p:sld>");
    Ok(xml)
}

fn background_xml(background: &Background) -> String {
    let fill = match background {
        Background::Solid { color } => format!(
            r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
            color.hex()
        ),
        Background::Gradient { stops } => {
            let mut gs = String::new();
            for stop in stops {
                gs.push_str(&format!(
                    r#"<a:gs pos="{}"><a:srgbClr val="{}"/></a:gs>"#,
                    (stop.position * 100_000.0).round() as i64,
                    stop.color.hex()
                ));
            }
            // 90 degrees: top to bottom.
            format!(
                r#"<a:gradFill rotWithShape="1"><a:gsLst>{}</a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill>"#,
                gs
            )
        }
    };
    format!("<p:bg><p:bgPr>{}<a:effectLst/></p:bgPr></p:bg>", fill)
}

fn transition_xml(transition: Transition) -> String {
    let effect = match transition {
        Transition::None => return String::new(),
        // Morph has no portable element; fade is the closest stand-in.
        Transition::Fade | Transition::Morph => "<p:fade/>",
        Transition::Push => r#"<p:push dir="u"/>"#,
        Transition::Wipe => r#"<p:wipe dir="d"/>"#,
        Transition::Zoom => r#"<p:zoom dir="in"/>"#,
    };
    format!(r#"<p:transition spd="med">{}</p:transition>"#, effect)
}

fn xfrm_xml(frame: Frame) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn alignment_value(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "l",
        Alignment::Center => "ctr",
        Alignment::Right => "r",
    }
}

/// 2pt drop shadow at 45 degrees in #646464.
const TITLE_SHADOW: &str = r#"<a:effectLst><a:outerShdw blurRad="38100" dist="25400" dir="2700000" algn="tl" rotWithShape="0"><a:srgbClr val="646464"/></a:outerShdw></a:effectLst>"#;

fn text_shape_xml(
    id: usize,
    role: TextRole,
    lines: &[String],
    frame: Frame,
    style: &ResolvedSlideStyle,
) -> String {
    let (size, bold, italic, alignment) = match role {
        TextRole::Title => (
            style.title_font_size,
            true,
            false,
            if style.layout == Layout::TitleSlide {
                Alignment::Center
            } else {
                Alignment::Left
            },
        ),
        TextRole::Body => (style.font_size, style.bold, style.italic, style.alignment),
        TextRole::Caption => (14, false, false, Alignment::Center),
    };

    let placeholder = match role {
        TextRole::Title => title_placeholder(style.layout),
        _ => None,
    };
    let (name, nv) = match placeholder {
        Some(ph) => (
            format!("Title {}", id - 1),
            format!(
                r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="{}"/></p:nvPr>"#,
                ph
            ),
        ),
        None => (
            format!("TextBox {}", id - 1),
            r#"<p:cNvSpPr txBox="1"/><p:nvPr/>"#.to_string(),
        ),
    };

    let effects = match role {
        TextRole::Title => TITLE_SHADOW,
        _ => "",
    };
    let mut xml = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/>{}</p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>{}</p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
        id,
        name,
        nv,
        xfrm_xml(frame),
        effects
    );
    for line in lines {
        xml.push_str(&format!(
            r#"<a:p><a:pPr algn="{}"/><a:r><a:rPr lang="en-US" sz="{}" b="{}" i="{}" dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r></a:p>"#,
            alignment_value(alignment),
            u64::from(size) * 100,
            u8::from(bold),
            u8::from(italic),
            style.font_color.hex(),
            escape(&style.font_family),
            escape(line)
        ));
    }
    xml.push_str("</p:txBody></p:sp>");
    xml
}

fn picture_xml(id: usize, rel_id: &str, frame: Frame, description: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        id,
        id - 1,
        escape(description),
        rel_id,
        xfrm_xml(frame)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Color, GradientStop};

    #[test]
    fn test_transition_elements() {
        assert_eq!(transition_xml(Transition::None), "");
        assert!(transition_xml(Transition::Morph).contains("<p:fade/>"));
        assert!(transition_xml(Transition::Push).contains(r#"<p:push dir="u"/>"#));
    }

    #[test]
    fn test_slide_rel_ids_follow_blocks_chart_logo() {
        let rels = SlideRels {
            blocks: vec!["a".to_string(), "b".to_string()],
            chart: Some("c".to_string()),
            logo: Some("l".to_string()),
        };
        assert_eq!(rels.rel_id(MediaRef::Block(1)).as_deref(), Some("rId3"));
        assert_eq!(rels.rel_id(MediaRef::Chart).as_deref(), Some("rId4"));
        assert_eq!(rels.rel_id(MediaRef::Logo).as_deref(), Some("rId5"));
        assert_eq!(rels.rel_id(MediaRef::Block(2)), None);

        let no_chart = SlideRels {
            blocks: Vec::new(),
            chart: None,
            logo: Some("l".to_string()),
        };
        assert_eq!(no_chart.rel_id(MediaRef::Logo).as_deref(), Some("rId2"));
        assert_eq!(no_chart.rel_id(MediaRef::Chart), None);
    }

    #[test]
    fn test_gradient_background_positions() {
        let xml = background_xml(&Background::Gradient {
            stops: vec![
                GradientStop {
                    color: Color::rgb(0xDD, 0xE4, 0xFF),
                    position: 0.0,
                },
                GradientStop {
                    color: Color::rgb(0xFF, 0xFF, 0xFF),
                    position: 0.5,
                },
            ],
        });
        assert!(xml.contains(r#"<a:gs pos="0"><a:srgbClr val="DDE4FF"/></a:gs>"#));
        assert!(xml.contains(r#"<a:gs pos="50000"><a:srgbClr val="FFFFFF"/></a:gs>"#));
    }

    #[test]
    fn test_empty_document_is_a_valid_package() {
        let bytes = export(&Document::new(), &TableBindings::new(), &ExportConfig::default()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"ppt/presentation.xml"));
        assert!(names.contains(&"ppt/slideLayouts/slideLayout3.xml"));
        assert!(!names.iter().any(|n| n.starts_with("ppt/slides/")));
    }
}
