// ABOUTME: Configuration module for deckhand
// ABOUTME: Reads DECKHAND_* environment variables and builds export settings from them

use crate::chart::ChartOptions;
use crate::history::DEFAULT_MAX_DEPTH;
use crate::layout::AspectRatio;
use crate::pptx::ExportConfig;
use std::env;

/// Global configuration for an editing session
#[derive(Debug, Clone)]
pub struct Config {
    pub history_depth: usize,
    pub aspect_ratio: AspectRatio,
    pub chart_width: u32,
    pub chart_height: u32,
    pub parallel_export: bool,
    pub title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_MAX_DEPTH,
            aspect_ratio: AspectRatio::Standard,
            chart_width: 800,
            chart_height: 600,
            parallel_export: true,
            title: "Presentation".to_string(),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables, keeping defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let aspect_ratio = env::var("DECKHAND_ASPECT_RATIO")
            .ok()
            .map(|s| AspectRatio::parse_or_default(&s))
            .unwrap_or(defaults.aspect_ratio);
        let parallel_export = env::var("DECKHAND_PARALLEL")
            .ok()
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(defaults.parallel_export);

        Self {
            history_depth: parsed_var("DECKHAND_HISTORY_DEPTH").unwrap_or(defaults.history_depth),
            aspect_ratio,
            chart_width: parsed_var("DECKHAND_CHART_WIDTH").unwrap_or(defaults.chart_width),
            chart_height: parsed_var("DECKHAND_CHART_HEIGHT").unwrap_or(defaults.chart_height),
            parallel_export,
            title: env::var("DECKHAND_TITLE").unwrap_or(defaults.title),
        }
    }

    /// Export settings from this config, with per-call overrides.
    pub fn get_export_config(
        &self,
        title: Option<String>,
        aspect_ratio: Option<String>,
        chart_width: Option<u32>,
        chart_height: Option<u32>,
    ) -> ExportConfig {
        ExportConfig {
            title: title.unwrap_or_else(|| self.title.clone()),
            aspect_ratio: aspect_ratio
                .map(|s| AspectRatio::parse_or_default(&s))
                .unwrap_or(self.aspect_ratio),
            chart: ChartOptions {
                width: chart_width.unwrap_or(self.chart_width),
                height: chart_height.unwrap_or(self.chart_height),
            },
            parallel: self.parallel_export,
        }
    }
}
