//! Placement calculation for watermark layers.
//!
//! This module decides where a transformed watermark layer lands on the base
//! image. Three modes are supported:
//!
//! - **Fixed**: a single anchor point, in pixels or normalized 0-1 fractions,
//!   interpreted as the layer center or top-left corner
//! - **Preset**: one of nine grid positions with a margin from the edges
//! - **Tiled**: a repeating grid with a fixed step in each axis, bleeding
//!   half a footprint off every edge so coverage is uniform
//!
//! Origins may land partially or fully outside the base image; the blend
//! stage clips, so no placement is ever an error.

use super::error::RenderError;
use serde::{Deserialize, Serialize};

fn default_margin() -> u32 {
    10
}

/// Dimensions of the base image.
#[derive(Debug, Clone, Copy)]
pub struct BaseExtent {
    pub width: u32,
    pub height: u32,
}

/// Axis-aligned bounding box of the transformed watermark layer.
#[derive(Debug, Clone, Copy)]
pub struct LayerFootprint {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of one layer instance, in base-image coordinates.
///
/// Coordinates may be negative when the layer bleeds off an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerOrigin {
    pub x: i32,
    pub y: i32,
}

impl LayerOrigin {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// How a fixed anchor coordinate is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorMode {
    /// The layer center lands on the anchor point.
    #[default]
    Center,
    /// The layer's top-left corner lands on the anchor point.
    TopLeft,
}

/// Units for fixed anchor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordUnit {
    /// Absolute base-image pixels.
    #[default]
    Pixels,
    /// Fractions of the base image size, 0.0 to 1.0.
    Fraction,
}

/// Nine-grid preset position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Where the watermark goes: a single anchor, a preset grid slot, or a
/// repeating tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PlacementSpec {
    /// Single placement at an explicit anchor point.
    Fixed {
        x: f32,
        y: f32,
        #[serde(default)]
        unit: CoordUnit,
        #[serde(default)]
        anchor: AnchorMode,
    },
    /// Single placement at a nine-grid slot with a margin from the edges.
    Preset {
        position: GridPosition,
        #[serde(default = "default_margin")]
        margin: u32,
    },
    /// Repeating grid with the given step in each axis.
    Tiled { spacing_x: u32, spacing_y: u32 },
}

impl PlacementSpec {
    /// Fixed placement in pixels with the default center anchor.
    pub fn fixed_px(x: f32, y: f32) -> Self {
        Self::Fixed {
            x,
            y,
            unit: CoordUnit::Pixels,
            anchor: AnchorMode::Center,
        }
    }

    /// Fixed placement in 0-1 fractions with the default center anchor.
    pub fn fixed_fraction(x: f32, y: f32) -> Self {
        Self::Fixed {
            x,
            y,
            unit: CoordUnit::Fraction,
            anchor: AnchorMode::Center,
        }
    }

    /// Validate placement parameters.
    pub fn validate(&self) -> Result<(), RenderError> {
        match self {
            Self::Fixed { x, y, .. } => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(RenderError::InvalidSpec(format!(
                        "anchor coordinates must be finite, got ({}, {})",
                        x, y
                    )));
                }
                Ok(())
            }
            Self::Preset { .. } => Ok(()),
            Self::Tiled {
                spacing_x,
                spacing_y,
            } => {
                if *spacing_x == 0 || *spacing_y == 0 {
                    return Err(RenderError::InvalidSpec(format!(
                        "tile spacing must be > 0 in both axes, got ({}, {})",
                        spacing_x, spacing_y
                    )));
                }
                Ok(())
            }
        }
    }

    /// Resolve this placement into layer origins for the given base/footprint.
    pub fn origins(&self, base: &BaseExtent, layer: &LayerFootprint) -> Vec<LayerOrigin> {
        match *self {
            Self::Fixed {
                x,
                y,
                unit,
                anchor,
            } => vec![fixed_origin(x, y, unit, anchor, base, layer)],
            Self::Preset { position, margin } => vec![preset_origin(position, base, layer, margin)],
            Self::Tiled {
                spacing_x,
                spacing_y,
            } => tiled_origins(base, layer, spacing_x, spacing_y),
        }
    }
}

/// Resolve a fixed anchor into a layer origin.
pub fn fixed_origin(
    x: f32,
    y: f32,
    unit: CoordUnit,
    anchor: AnchorMode,
    base: &BaseExtent,
    layer: &LayerFootprint,
) -> LayerOrigin {
    let (px, py) = match unit {
        CoordUnit::Pixels => (x, y),
        CoordUnit::Fraction => (x * base.width as f32, y * base.height as f32),
    };

    match anchor {
        AnchorMode::TopLeft => LayerOrigin::new(px.round() as i32, py.round() as i32),
        AnchorMode::Center => LayerOrigin::new(
            (px - layer.width as f32 / 2.0).round() as i32,
            (py - layer.height as f32 / 2.0).round() as i32,
        ),
    }
}

/// Resolve a nine-grid preset into a layer origin.
pub fn preset_origin(
    position: GridPosition,
    base: &BaseExtent,
    layer: &LayerFootprint,
    margin: u32,
) -> LayerOrigin {
    let img_w = base.width as i32;
    let img_h = base.height as i32;
    let wm_w = layer.width as i32;
    let wm_h = layer.height as i32;
    let m = margin as i32;

    match position {
        // Top row
        GridPosition::TopLeft => LayerOrigin::new(m, m),
        GridPosition::TopCenter => LayerOrigin::new((img_w - wm_w) / 2, m),
        GridPosition::TopRight => LayerOrigin::new(img_w - wm_w - m, m),

        // Center row
        GridPosition::CenterLeft => LayerOrigin::new(m, (img_h - wm_h) / 2),
        GridPosition::Center => LayerOrigin::new((img_w - wm_w) / 2, (img_h - wm_h) / 2),
        GridPosition::CenterRight => LayerOrigin::new(img_w - wm_w - m, (img_h - wm_h) / 2),

        // Bottom row
        GridPosition::BottomLeft => LayerOrigin::new(m, img_h - wm_h - m),
        GridPosition::BottomCenter => LayerOrigin::new((img_w - wm_w) / 2, img_h - wm_h - m),
        GridPosition::BottomRight => LayerOrigin::new(img_w - wm_w - m, img_h - wm_h - m),
    }
}

/// Calculate origins for tiled placement.
///
/// The grid origin sits at (0,0) minus half the layer footprint so tiles
/// bleed consistently off all four edges, and one instance is produced for
/// every grid step whose footprint intersects the base extent. With the step
/// equal to the footprint this covers every base pixel exactly once.
pub fn tiled_origins(
    base: &BaseExtent,
    layer: &LayerFootprint,
    spacing_x: u32,
    spacing_y: u32,
) -> Vec<LayerOrigin> {
    let fw = layer.width as i64;
    let fh = layer.height as i64;
    let sx = spacing_x as i64;
    let sy = spacing_y as i64;

    if fw == 0 || fh == 0 {
        return Vec::new();
    }

    let ox = -(fw / 2);
    let oy = -(fh / 2);

    // Index range such that i*s + o + footprint > 0 and i*s + o < extent.
    let range = |origin: i64, step: i64, footprint: i64, extent: i64| {
        let min = (-(origin + footprint)).div_euclid(step) + 1;
        let max = (extent - origin - 1).div_euclid(step);
        (min, max)
    };

    let (i_min, i_max) = range(ox, sx, fw, base.width as i64);
    let (j_min, j_max) = range(oy, sy, fh, base.height as i64);

    let mut origins = Vec::new();
    for j in j_min..=j_max {
        for i in i_min..=i_max {
            origins.push(LayerOrigin::new(
                (i * sx + ox) as i32,
                (j * sy + oy) as i32,
            ));
        }
    }

    origins
}

/// Check if a layer instance is at least partially visible within the base.
pub fn is_visible(origin: &LayerOrigin, base: &BaseExtent, layer: &LayerFootprint) -> bool {
    let right = origin.x + layer.width as i32;
    let bottom = origin.y + layer.height as i32;

    origin.x < base.width as i32 && origin.y < base.height as i32 && right > 0 && bottom > 0
}
