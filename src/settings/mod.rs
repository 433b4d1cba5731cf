//! Persisted watermark settings.
//!
//! This module is the serializable mirror of the engine types: what the UI
//! layer assembles from user-entered values and what gets written to disk
//! between sessions. Settings round-trip through JSON and resolve into
//! borrow-based engine specs at render time.
//!
//! ```json
//! {
//!   "watermark": {
//!     "type": "text",
//!     "text": "Copyright 2025",
//!     "color": "#FFFFFF",
//!     "opacity": 0.5
//!   },
//!   "placement": {"mode": "preset", "position": "bottom-right", "margin": 20}
//! }
//! ```

use crate::compositor::{
    parse_hex_color, FontFamily, ImageSpec, PlacementSpec, TextSpec, WatermarkSpec,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Default values
fn default_font_family() -> String {
    FontFamily::Sans.as_name().to_string()
}

fn default_font_size() -> f32 {
    24.0
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_opacity() -> f32 {
    0.5
}

fn default_scale() -> f32 {
    0.2
}

/// Watermark settings - either text or image.
///
/// Uses a serde tag to distinguish the two in JSON:
/// ```json
/// {"type": "text", "text": "Copyright", "opacity": 0.5}
/// {"type": "image", "source": "logo.png", "scale": 0.25}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatermarkSettings {
    Text(TextSettings),
    Image(ImageSettings),
}

/// Text watermark settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextSettings {
    /// Text content.
    pub text: String,

    /// Font family name: "sans", "sans-bold", or "mono" (default: "sans")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font size in pixels (default: 24)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Text color as hex string (default: "#FFFFFF")
    #[serde(default = "default_color")]
    pub color: String,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque) (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Rotation angle in degrees, clockwise (default: 0)
    #[serde(default)]
    pub rotation: f32,
}

/// Image watermark settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSettings {
    /// Path to the watermark image file.
    pub source: PathBuf,

    /// Uniform scale factor applied to the source (default: 0.2)
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque) (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Rotation angle in degrees, clockwise (default: 0)
    #[serde(default)]
    pub rotation: f32,
}

/// Complete persisted settings: what to draw and where to draw it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub watermark: WatermarkSettings,
    pub placement: PlacementSpec,
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;
        Self::from_json(&json)
    }

    /// Parse settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to write settings file: {}", e))
    }

    /// Validate every level of the settings.
    pub fn validate(&self) -> Result<(), String> {
        self.watermark.validate()?;
        self.placement
            .validate()
            .map_err(|e| format!("Placement settings invalid: {}", e))
    }
}

impl WatermarkSettings {
    /// Validate the watermark settings.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Text(settings) => settings.validate(),
            Self::Image(settings) => settings.validate(),
        }
    }
}

impl TextSettings {
    /// Validate the text watermark settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.is_empty() {
            return Err("Text watermark 'text' field cannot be empty".to_string());
        }

        if FontFamily::from_name(&self.font_family).is_none() {
            return Err(format!(
                "Unknown font family '{}'; expected one of: sans, sans-bold, mono",
                self.font_family
            ));
        }

        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(format!(
                "Text watermark font size must be > 0, got {}",
                self.font_size
            ));
        }

        parse_hex_color(&self.color)
            .map_err(|e| format!("Text watermark color invalid: {}", e))?;

        validate_opacity(self.opacity, "Text")?;
        validate_rotation(self.rotation, "Text")
    }

    /// Resolve into an engine spec.
    pub fn to_spec(&self) -> Result<TextSpec, String> {
        self.validate()?;

        Ok(TextSpec {
            text: self.text.clone(),
            font: FontFamily::from_name(&self.font_family)
                .ok_or_else(|| format!("Unknown font family '{}'", self.font_family))?,
            font_size: self.font_size,
            color: parse_hex_color(&self.color).map_err(|e| e.to_string())?,
            opacity: self.opacity,
            rotation_degrees: self.rotation,
        })
    }
}

impl ImageSettings {
    /// Validate the image watermark settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.source.as_os_str().is_empty() {
            return Err("Image watermark 'source' field cannot be empty".to_string());
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(format!(
                "Image watermark scale must be > 0, got {}",
                self.scale
            ));
        }

        validate_opacity(self.opacity, "Image")?;
        validate_rotation(self.rotation, "Image")
    }

    /// Resolve into an engine spec borrowing the decoded source raster.
    ///
    /// Loading the raster from `self.source` is the caller's job; one decoded
    /// image can back any number of concurrent render requests.
    pub fn to_spec<'a>(&self, source: &'a RgbaImage) -> ImageSpec<'a> {
        ImageSpec {
            source,
            scale: self.scale,
            opacity: self.opacity,
            rotation_degrees: self.rotation,
        }
    }
}

/// Build the engine watermark spec for these settings.
///
/// `source` must be `Some` decoded raster for image watermarks and is ignored
/// for text watermarks.
pub fn to_watermark_spec<'a>(
    settings: &WatermarkSettings,
    source: Option<&'a RgbaImage>,
) -> Result<WatermarkSpec<'a>, String> {
    match settings {
        WatermarkSettings::Text(text) => Ok(WatermarkSpec::Text(text.to_spec()?)),
        WatermarkSettings::Image(image) => {
            let source =
                source.ok_or_else(|| "Image watermark requires a decoded source".to_string())?;
            image.validate()?;
            Ok(WatermarkSpec::Image(image.to_spec(source)))
        }
    }
}

// Check for NaN/Infinity and valid range
fn validate_opacity(opacity: f32, kind: &str) -> Result<(), String> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(format!(
            "{} watermark opacity must be a finite value between 0.0 and 1.0, got {}",
            kind, opacity
        ));
    }
    Ok(())
}

fn validate_rotation(rotation: f32, kind: &str) -> Result<(), String> {
    if !rotation.is_finite() {
        return Err(format!(
            "{} watermark rotation must be a finite number of degrees, got {}",
            kind, rotation
        ));
    }
    Ok(())
}
