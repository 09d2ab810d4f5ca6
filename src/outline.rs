// ABOUTME: JSON outline import and export-model for the deckhand library
// ABOUTME: Schema-checks outline JSON into a document and writes documents back to the same format

use crate::errors::{DeckError, Result};
use crate::media::MediaLibrary;
use crate::model::{ChartSpec, ChartType, ContentBlock, Document, Slide, SlideId};
use crate::table::DEFAULT_TABLE;
use crate::theme::{SlideStyleOverride, Transition};
use log::{debug, info};
use serde_json::{json, Map, Value};

const SLIDE_FIELDS: [&str; 9] = [
    "title",
    "content",
    "chart",
    "chart_input_type",
    "chart_data",
    "transition",
    "image",
    "images",
    "style",
];

/// Parse an outline that references no images.
pub fn parse(json: &str) -> Result<Document> {
    parse_with_media(json, &MediaLibrary::new())
}

/// Parse an outline, resolving `image`/`images` names against `media`.
///
/// Either every slide parses or the call fails; no partial document is returned.
pub fn parse_with_media(json: &str, media: &MediaLibrary) -> Result<Document> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| DeckError::schema(None, "$", format!("Invalid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(DeckError::schema(
            None,
            "$",
            "Outline must be an array of slides",
        ));
    };

    let mut document = Document::new();
    for (index, item) in items.iter().enumerate() {
        let slide = parse_slide(index, item, document.allocate_id(), media)?;
        document.push_slide(slide);
    }
    info!("Imported outline with {} slides", document.len());
    Ok(document)
}

fn parse_slide(index: usize, item: &Value, id: SlideId, media: &MediaLibrary) -> Result<Slide> {
    let at = Some(index);
    let obj = item
        .as_object()
        .ok_or_else(|| DeckError::schema(at, "$", "Slide must be an object"))?;

    if let Some(key) = obj.keys().find(|k| !SLIDE_FIELDS.contains(&k.as_str())) {
        return Err(DeckError::schema(at, key, "Unknown field"));
    }

    let mut slide = Slide::new(id);
    slide.title = match obj.get("title") {
        Some(Value::String(title)) => title.clone(),
        Some(_) => return Err(DeckError::schema(at, "title", "Expected a string")),
        None => return Err(DeckError::schema(at, "title", "Missing required field")),
    };

    if let Some(lines) = optional(obj, "content") {
        for line in string_array(at, "content", lines)? {
            slide.blocks.push(ContentBlock::text(line));
        }
    }

    if let Some(value) = optional(obj, "image") {
        let name = value
            .as_str()
            .ok_or_else(|| DeckError::schema(at, "image", "Expected a string"))?;
        slide.blocks.push(lookup_image(at, "image", name, media)?);
    }
    if let Some(value) = optional(obj, "images") {
        for name in string_array(at, "images", value)? {
            slide.blocks.push(lookup_image(at, "images", &name, media)?);
        }
    }

    slide.chart = parse_chart(at, obj)?;

    if let Some(value) = optional(obj, "transition") {
        let name = value
            .as_str()
            .ok_or_else(|| DeckError::schema(at, "transition", "Expected a string"))?;
        let transition = name
            .parse::<Transition>()
            .map_err(|e| DeckError::schema(at, "transition", e.to_string()))?;
        slide.transition = Some(transition);
    }

    if let Some(value) = optional(obj, "style") {
        slide.style_override = serde_json::from_value::<SlideStyleOverride>(value.clone())
            .map_err(|e| DeckError::schema(at, "style", e.to_string()))?;
    }

    slide.validate().map_err(|e| {
        let field = match e {
            DeckError::ChartDataError(_) => "chart_data",
            _ => "style",
        };
        DeckError::schema(at, field, e.to_string())
    })?;
    debug!("Parsed slide {} '{}'", index, slide.title);
    Ok(slide)
}

fn lookup_image(
    at: Option<usize>,
    field: &str,
    name: &str,
    media: &MediaLibrary,
) -> Result<ContentBlock> {
    media
        .get(name)
        .map(|image| ContentBlock::Image(image.clone()))
        .ok_or_else(|| DeckError::schema(at, field, format!("Unknown image '{}'", name)))
}

/// A field counts as absent when missing or `null`.
fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn string_array(at: Option<usize>, field: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| DeckError::schema(at, field, "Expected an array of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| DeckError::schema(at, field, "Expected an array of strings"))
        })
        .collect()
}

fn required_str(at: Option<usize>, data: &Map<String, Value>, field: &str) -> Result<String> {
    let path = format!("chart_data.{}", field);
    match data.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DeckError::schema(at, &path, "Expected a string")),
        None => Err(DeckError::schema(at, &path, "Missing required field")),
    }
}

fn parse_chart(at: Option<usize>, obj: &Map<String, Value>) -> Result<Option<ChartSpec>> {
    // An empty chart string means "no chart".
    let chart = optional(obj, "chart").filter(|v| v.as_str() != Some(""));
    let input_type = optional(obj, "chart_input_type");
    let data = optional(obj, "chart_data");

    let Some(chart) = chart else {
        if input_type.is_some() {
            return Err(DeckError::schema(
                at,
                "chart",
                "chart_input_type given without chart",
            ));
        }
        if data.is_some() {
            return Err(DeckError::schema(at, "chart", "chart_data given without chart"));
        }
        return Ok(None);
    };

    let chart_type = chart
        .as_str()
        .ok_or_else(|| DeckError::schema(at, "chart", "Expected a string"))?
        .parse::<ChartType>()
        .map_err(|e| DeckError::schema(at, "chart", e.to_string()))?;
    let input_type = input_type
        .ok_or_else(|| DeckError::schema(at, "chart_input_type", "Required when chart is set"))?
        .as_str()
        .ok_or_else(|| DeckError::schema(at, "chart_input_type", "Expected a string"))?;
    let data = data
        .ok_or_else(|| DeckError::schema(at, "chart_data", "Required when chart is set"))?
        .as_object()
        .ok_or_else(|| DeckError::schema(at, "chart_data", "Expected an object"))?;

    let spec = match input_type {
        "Manual" => {
            let categories = data
                .get("categories")
                .ok_or_else(|| {
                    DeckError::schema(at, "chart_data.categories", "Missing required field")
                })
                .and_then(|v| string_array(at, "chart_data.categories", v))?;
            let values = data
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    DeckError::schema(at, "chart_data.values", "Expected an array of numbers")
                })?
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        DeckError::schema(at, "chart_data.values", "Expected an array of numbers")
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            ChartSpec::Manual {
                chart_type,
                categories,
                values,
            }
        }
        "Dataset" => {
            let category_col = match data.get("category_col").filter(|v| !v.is_null()) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    return Err(DeckError::schema(
                        at,
                        "chart_data.category_col",
                        "Expected a string",
                    ))
                }
                None => None,
            };
            let source_table = match data.get("table").filter(|v| !v.is_null()) {
                Some(Value::String(s)) => s.clone(),
                Some(_) => {
                    return Err(DeckError::schema(at, "chart_data.table", "Expected a string"))
                }
                None => DEFAULT_TABLE.to_string(),
            };
            ChartSpec::Dataset {
                chart_type,
                source_table,
                x_col: required_str(at, data, "x_col")?,
                y_col: required_str(at, data, "y_col")?,
                category_col,
            }
        }
        other => {
            return Err(DeckError::schema(
                at,
                "chart_input_type",
                format!("Unknown input type '{}', expected Manual or Dataset", other),
            ))
        }
    };

    spec.validate()
        .map_err(|e| DeckError::schema(at, "chart_data", e.to_string()))?;
    Ok(Some(spec))
}

/// Write a document back to the outline format.
///
/// Multi-line text blocks flatten to one `content` entry per line and inline
/// chart placement is not represented.
pub fn to_json(document: &Document) -> Result<String> {
    let slides: Vec<Value> = document.slides().iter().map(slide_to_json).collect();
    serde_json::to_string_pretty(&slides)
        .map_err(|e| DeckError::ValidationError(format!("Failed to serialize outline: {}", e)))
}

fn slide_to_json(slide: &Slide) -> Value {
    let mut obj = Map::new();
    obj.insert("title".to_string(), json!(slide.title));

    let mut content = Vec::new();
    let mut images = Vec::new();
    for block in &slide.blocks {
        match block {
            ContentBlock::Text { lines } => content.extend(lines.iter().cloned()),
            ContentBlock::Image(image) => images.push(image.name.clone()),
            ContentBlock::ChartRef => {}
        }
    }
    if !content.is_empty() {
        obj.insert("content".to_string(), json!(content));
    }
    match images.len() {
        0 => {}
        1 => {
            obj.insert("image".to_string(), json!(images[0]));
        }
        _ => {
            obj.insert("images".to_string(), json!(images));
        }
    }

    if let Some(chart) = &slide.chart {
        obj.insert("chart".to_string(), json!(chart.chart_type().name()));
        let (input_type, data) = match chart {
            ChartSpec::Manual {
                categories, values, ..
            } => (
                "Manual",
                json!({ "categories": categories, "values": values }),
            ),
            ChartSpec::Dataset {
                source_table,
                x_col,
                y_col,
                category_col,
                ..
            } => {
                let mut data = json!({ "table": source_table, "x_col": x_col, "y_col": y_col });
                if let Some(category) = category_col {
                    data["category_col"] = json!(category);
                }
                ("Dataset", data)
            }
        };
        obj.insert("chart_input_type".to_string(), json!(input_type));
        obj.insert("chart_data".to_string(), data);
    }

    if let Some(transition) = slide.transition {
        obj.insert("transition".to_string(), json!(transition.name()));
    }
    if !slide.style_override.is_empty() {
        obj.insert("style".to_string(), json!(slide.style_override));
    }
    Value::Object(obj)
}
