// ABOUTME: Theme resolution for the deckhand library
// ABOUTME: Turns presets or custom style configs into fully-resolved themes and per-slide styles

use crate::errors::{DeckError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex form without the leading `#`, as DrawingML expects it.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl FromStr for Color {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DeckError::ConfigError(format!(
                "Invalid color '{}', expected #RRGGBB",
                s
            )));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self { r, g, b }),
            _ => Err(DeckError::ConfigError(format!("Invalid color '{}'", s))),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = DeckError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Color,
    /// Offset along the gradient, 0.0 to 1.0.
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Background {
    Solid { color: Color },
    Gradient { stops: Vec<GradientStop> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layout {
    TitleSlide,
    #[default]
    TitleAndContent,
    Blank,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::TitleSlide, Layout::TitleAndContent, Layout::Blank];

    pub fn display_name(&self) -> &'static str {
        match self {
            Layout::TitleSlide => "Title Slide",
            Layout::TitleAndContent => "Title and Content",
            Layout::Blank => "Blank",
        }
    }

    /// 1-based index of this layout's part in the exported package.
    pub fn part_number(&self) -> usize {
        match self {
            Layout::TitleSlide => 1,
            Layout::TitleAndContent => 2,
            Layout::Blank => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transition {
    #[default]
    None,
    Fade,
    Push,
    Wipe,
    Morph,
    Zoom,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::None => "None",
            Transition::Fade => "Fade",
            Transition::Push => "Push",
            Transition::Wipe => "Wipe",
            Transition::Morph => "Morph",
            Transition::Zoom => "Zoom",
        }
    }
}

impl FromStr for Transition {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Transition::None),
            "fade" => Ok(Transition::Fade),
            "push" => Ok(Transition::Push),
            "wipe" => Ok(Transition::Wipe),
            "morph" => Ok(Transition::Morph),
            "zoom" => Ok(Transition::Zoom),
            _ => Err(DeckError::ValidationError(format!(
                "Unknown transition: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A fully-resolved theme. Presets and custom configs both end up here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    /// Body text size in points.
    pub font_size: u32,
    /// Title text size in points.
    pub title_font_size: u32,
    pub font_color: Color,
    pub background: Background,
    pub default_layout: Layout,
    pub default_transition: Transition,
}

impl Default for Theme {
    fn default() -> Self {
        PresetName::Professional.theme()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetName {
    Professional,
    Minimalist,
    Creative,
}

impl PresetName {
    pub const ALL: [PresetName; 3] = [
        PresetName::Professional,
        PresetName::Minimalist,
        PresetName::Creative,
    ];

    /// The built-in values behind a preset.
    pub fn theme(&self) -> Theme {
        match self {
            PresetName::Professional => Theme {
                font_family: "Calibri".to_string(),
                font_size: 18,
                title_font_size: 28,
                font_color: Color::rgb(0x00, 0x00, 0x80),
                background: Background::Gradient {
                    stops: vec![
                        GradientStop {
                            color: Color::rgb(0xDD, 0xE4, 0xFF),
                            position: 0.0,
                        },
                        GradientStop {
                            color: Color::rgb(0xFF, 0xFF, 0xFF),
                            position: 1.0,
                        },
                    ],
                },
                default_layout: Layout::TitleAndContent,
                default_transition: Transition::Fade,
            },
            PresetName::Minimalist => Theme {
                font_family: "Arial".to_string(),
                font_size: 16,
                title_font_size: 24,
                font_color: Color::rgb(0x33, 0x33, 0x33),
                background: Background::Solid {
                    color: Color::rgb(0xFF, 0xFF, 0xFF),
                },
                default_layout: Layout::TitleAndContent,
                default_transition: Transition::None,
            },
            PresetName::Creative => Theme {
                font_family: "Georgia".to_string(),
                font_size: 20,
                title_font_size: 32,
                font_color: Color::rgb(0xFF, 0xFF, 0xFF),
                background: Background::Gradient {
                    stops: vec![
                        GradientStop {
                            color: Color::rgb(0x6A, 0x0D, 0xAD),
                            position: 0.0,
                        },
                        GradientStop {
                            color: Color::rgb(0xFF, 0x6F, 0x61),
                            position: 1.0,
                        },
                    ],
                },
                default_layout: Layout::TitleAndContent,
                default_transition: Transition::Zoom,
            },
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetName::Professional => "Professional",
            PresetName::Minimalist => "Minimalist",
            PresetName::Creative => "Creative",
        };
        f.write_str(name)
    }
}

impl FromStr for PresetName {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        PresetName::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeckError::ConfigError(format!("Unknown theme preset: {}", s)))
    }
}

/// A user-supplied theme. Every field is required by [`resolve`]; they are
/// optional here only so the resolver can report all missing ones at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomTheme {
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub title_font_size: Option<u32>,
    pub font_color: Option<Color>,
    pub background: Option<Background>,
    pub default_layout: Option<Layout>,
    pub default_transition: Option<Transition>,
}

impl From<Theme> for CustomTheme {
    fn from(theme: Theme) -> Self {
        Self {
            font_family: Some(theme.font_family),
            font_size: Some(theme.font_size),
            title_font_size: Some(theme.title_font_size),
            font_color: Some(theme.font_color),
            background: Some(theme.background),
            default_layout: Some(theme.default_layout),
            default_transition: Some(theme.default_transition),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeInput {
    Preset(PresetName),
    Custom(CustomTheme),
}

impl From<PresetName> for ThemeInput {
    fn from(preset: PresetName) -> Self {
        ThemeInput::Preset(preset)
    }
}

impl From<CustomTheme> for ThemeInput {
    fn from(custom: CustomTheme) -> Self {
        ThemeInput::Custom(custom)
    }
}

/// Largest font size, in points, a theme or slide override may use.
pub const MAX_FONT_SIZE: u32 = 400;

/// Resolve a preset name or custom config into a complete [`Theme`].
pub fn resolve(input: &ThemeInput) -> Result<Theme> {
    match input {
        ThemeInput::Preset(preset) => {
            debug!("Resolving theme preset {}", preset);
            Ok(preset.theme())
        }
        ThemeInput::Custom(custom) => resolve_custom(custom),
    }
}

fn resolve_custom(custom: &CustomTheme) -> Result<Theme> {
    let mut missing = Vec::new();
    if custom.font_family.is_none() {
        missing.push("font_family");
    }
    if custom.font_size.is_none() {
        missing.push("font_size");
    }
    if custom.title_font_size.is_none() {
        missing.push("title_font_size");
    }
    if custom.font_color.is_none() {
        missing.push("font_color");
    }
    if custom.background.is_none() {
        missing.push("background");
    }
    if custom.default_layout.is_none() {
        missing.push("default_layout");
    }
    if custom.default_transition.is_none() {
        missing.push("default_transition");
    }

    match (
        &custom.font_family,
        custom.font_size,
        custom.title_font_size,
        custom.font_color,
        &custom.background,
        custom.default_layout,
        custom.default_transition,
    ) {
        (
            Some(font_family),
            Some(font_size),
            Some(title_font_size),
            Some(font_color),
            Some(background),
            Some(default_layout),
            Some(default_transition),
        ) => {
            let theme = Theme {
                font_family: font_family.clone(),
                font_size,
                title_font_size,
                font_color,
                background: background.clone(),
                default_layout,
                default_transition,
            };
            validate(&theme)?;
            debug!("Resolved custom theme using font {}", theme.font_family);
            Ok(theme)
        }
        _ => Err(DeckError::ConfigError(format!(
            "Custom theme is missing required field(s): {}",
            missing.join(", ")
        ))),
    }
}

fn validate(theme: &Theme) -> Result<()> {
    if theme.font_family.trim().is_empty() {
        return Err(DeckError::ConfigError(
            "font_family must not be empty".to_string(),
        ));
    }
    for (name, size) in [
        ("font_size", theme.font_size),
        ("title_font_size", theme.title_font_size),
    ] {
        if size == 0 || size > MAX_FONT_SIZE {
            return Err(DeckError::ConfigError(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_FONT_SIZE, size
            )));
        }
    }
    if let Background::Gradient { stops } = &theme.background {
        if stops.len() < 2 {
            return Err(DeckError::ConfigError(
                "Gradient background needs at least two stops".to_string(),
            ));
        }
        let mut last = 0.0;
        for stop in stops {
            if !(0.0..=1.0).contains(&stop.position) || stop.position < last {
                return Err(DeckError::ConfigError(format!(
                    "Gradient stop positions must be ascending within 0.0..=1.0, got {}",
                    stop.position
                )));
            }
            last = stop.position;
        }
    }
    Ok(())
}

/// Per-slide formatting overrides. `None` fields inherit from the theme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideStyleOverride {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub font_size: Option<u32>,
    pub alignment: Option<Alignment>,
}

impl SlideStyleOverride {
    pub fn is_empty(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.font_size.is_none()
            && self.alignment.is_none()
    }
}

/// The effective style of one slide at export time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlideStyle {
    pub font_family: String,
    pub font_size: u32,
    pub title_font_size: u32,
    pub font_color: Color,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub background: Background,
    pub layout: Layout,
    pub transition: Transition,
}

impl ResolvedSlideStyle {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            font_family: theme.font_family.clone(),
            font_size: theme.font_size,
            title_font_size: theme.title_font_size,
            font_color: theme.font_color,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
            background: theme.background.clone(),
            layout: theme.default_layout,
            transition: theme.default_transition,
        }
    }

    /// Replace only the fields the override sets explicitly.
    pub fn with_override(mut self, style: &SlideStyleOverride) -> Self {
        if let Some(bold) = style.bold {
            self.bold = bold;
        }
        if let Some(italic) = style.italic {
            self.italic = italic;
        }
        if let Some(size) = style.font_size {
            self.font_size = size;
        }
        if let Some(alignment) = style.alignment {
            self.alignment = alignment;
        }
        self
    }
}

/// Export-time style for a slide: the theme with the slide's overrides applied.
pub fn slide_style(
    theme: &Theme,
    style: &SlideStyleOverride,
    transition: Option<Transition>,
) -> ResolvedSlideStyle {
    let mut resolved = ResolvedSlideStyle::from_theme(theme).with_override(style);
    if let Some(transition) = transition {
        resolved.transition = transition;
    }
    resolved
}

/// Serialize a theme to the JSON theme format.
pub fn to_json(theme: &Theme) -> Result<String> {
    serde_json::to_string_pretty(theme)
        .map_err(|e| DeckError::ConfigError(format!("Failed to serialize theme: {}", e)))
}

/// Parse the JSON theme format. Missing fields are reported together.
pub fn from_json(json: &str) -> Result<Theme> {
    let custom: CustomTheme = serde_json::from_str(json)
        .map_err(|e| DeckError::ConfigError(format!("Invalid theme JSON: {}", e)))?;
    resolve(&ThemeInput::Custom(custom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("#000080".parse::<Color>().unwrap(), Color::rgb(0, 0, 0x80));
        assert_eq!("ddE4ff".parse::<Color>().unwrap(), Color::rgb(0xDD, 0xE4, 0xFF));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_preset_names() {
        assert_eq!("minimalist".parse::<PresetName>().unwrap(), PresetName::Minimalist);
        assert!(matches!(
            "Brutalist".parse::<PresetName>(),
            Err(DeckError::ConfigError(_))
        ));
    }

    #[test]
    fn test_custom_theme_reports_every_missing_field() {
        let custom = CustomTheme {
            font_family: Some("Arial".to_string()),
            font_size: Some(18),
            ..Default::default()
        };
        let err = resolve(&ThemeInput::Custom(custom)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("title_font_size"));
        assert!(message.contains("font_color"));
        assert!(message.contains("background"));
        assert!(message.contains("default_transition"));
        assert!(!message.contains("font_family"));
    }

    #[test]
    fn test_gradient_stops_validated() {
        let mut custom = CustomTheme::from(PresetName::Professional.theme());
        custom.background = Some(Background::Gradient {
            stops: vec![GradientStop {
                color: Color::rgb(0, 0, 0),
                position: 0.5,
            }],
        });
        assert!(matches!(
            resolve(&custom.into()),
            Err(DeckError::ConfigError(_))
        ));
    }

    #[test]
    fn test_override_replaces_only_set_fields() {
        let theme = PresetName::Minimalist.theme();
        let style = SlideStyleOverride {
            italic: Some(true),
            alignment: Some(Alignment::Center),
            ..Default::default()
        };
        let resolved = slide_style(&theme, &style, None);
        assert!(resolved.italic);
        assert!(!resolved.bold);
        assert_eq!(resolved.alignment, Alignment::Center);
        assert_eq!(resolved.font_size, theme.font_size);
        assert_eq!(resolved.transition, theme.default_transition);

        let resolved = slide_style(&theme, &style, Some(Transition::Wipe));
        assert_eq!(resolved.transition, Transition::Wipe);
    }

    #[test]
    fn test_theme_json_round_trip() {
        for preset in PresetName::ALL {
            let theme = preset.theme();
            let json = to_json(&theme).unwrap();
            assert_eq!(from_json(&json).unwrap(), theme);
        }
    }
}
