use crate::sketch::model::{StrokeConfig, Theme};
use crate::sketch::overlay::{OverlayLayout, Position};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MAX_STROKE_WIDTH: u32 = 256;
const MAX_TIMEOUT_SECONDS: u64 = 600;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceProvider {
    /// Gemini `generateContent` with the image as inline data.
    Gemini,
    /// Plain JSON endpoint: `{image, bindings}` in, entry array out.
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecognitionSettings {
    #[serde(default = "default_provider")]
    pub provider: ServiceProvider,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the service credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SketchSettings {
    #[serde(default = "default_ink_width")]
    pub ink_width: u32,
    #[serde(default = "default_erase_width")]
    pub erase_width: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_annotation_anchor_x")]
    pub annotation_anchor_x: f32,
    #[serde(default = "default_annotation_anchor_y")]
    pub annotation_anchor_y: f32,
    #[serde(default = "default_annotation_spacing")]
    pub annotation_spacing: f32,
    #[serde(default = "default_label_char_width")]
    pub label_char_width: f32,
    #[serde(default = "default_label_line_height")]
    pub label_line_height: f32,
    #[serde(default = "default_flatten_snapshot")]
    pub flatten_snapshot: bool,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub recognition: RecognitionSettings,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            ink_width: default_ink_width(),
            erase_width: default_erase_width(),
            theme: Theme::default(),
            annotation_anchor_x: default_annotation_anchor_x(),
            annotation_anchor_y: default_annotation_anchor_y(),
            annotation_spacing: default_annotation_spacing(),
            label_char_width: default_label_char_width(),
            label_line_height: default_label_line_height(),
            flatten_snapshot: default_flatten_snapshot(),
            debug_logging: false,
            log_file: None,
            recognition: RecognitionSettings::default(),
        }
    }
}

impl SketchSettings {
    /// Clamps values a hand-edited file may have pushed out of range.
    pub fn sanitize(&mut self) {
        self.ink_width = self.ink_width.clamp(1, MAX_STROKE_WIDTH);
        self.erase_width = self.erase_width.clamp(1, MAX_STROKE_WIDTH);
        if !self.annotation_spacing.is_finite() || self.annotation_spacing <= 0.0 {
            self.annotation_spacing = default_annotation_spacing();
        }
        if !self.annotation_anchor_x.is_finite() {
            self.annotation_anchor_x = default_annotation_anchor_x();
        }
        if !self.annotation_anchor_y.is_finite() {
            self.annotation_anchor_y = default_annotation_anchor_y();
        }
        if !self.label_char_width.is_finite() || self.label_char_width <= 0.0 {
            self.label_char_width = default_label_char_width();
        }
        if !self.label_line_height.is_finite() || self.label_line_height <= 0.0 {
            self.label_line_height = default_label_line_height();
        }
        self.recognition.timeout_seconds = self
            .recognition
            .timeout_seconds
            .clamp(1, MAX_TIMEOUT_SECONDS);
        if self.recognition.endpoint.trim().is_empty() {
            self.recognition.endpoint = default_endpoint();
        }
        if self.recognition.api_key_env.trim().is_empty() {
            self.recognition.api_key_env = default_api_key_env();
        }
    }

    pub fn stroke_config(&self) -> StrokeConfig {
        StrokeConfig::new(self.ink_width, self.erase_width)
    }

    pub fn overlay_layout(&self) -> OverlayLayout {
        OverlayLayout {
            anchor: Position::new(self.annotation_anchor_x, self.annotation_anchor_y),
            spacing: self.annotation_spacing,
            char_width: self.label_char_width,
            line_height: self.label_line_height,
        }
    }
}

fn default_provider() -> ServiceProvider {
    ServiceProvider::Gemini
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_ink_width() -> u32 {
    StrokeConfig::DEFAULT_INK_WIDTH
}

fn default_erase_width() -> u32 {
    StrokeConfig::DEFAULT_ERASE_WIDTH
}

fn default_annotation_anchor_x() -> f32 {
    30.0
}

fn default_annotation_anchor_y() -> f32 {
    200.0
}

fn default_annotation_spacing() -> f32 {
    30.0
}

fn default_label_char_width() -> f32 {
    9.0
}

fn default_label_line_height() -> f32 {
    24.0
}

fn default_flatten_snapshot() -> bool {
    true
}
