//! Watermark layer construction and transform.
//!
//! A layer is a transparent RGBA raster holding only the watermark content,
//! sized to its natural bounding box: rendered glyphs for text watermarks,
//! resampled source pixels for image watermarks. After construction the layer
//! is rotated about its own center, expanding to the rotated footprint's
//! axis-aligned bounds so no corner is cropped.
//!
//! Text is rasterized with the embedded fonts at full alpha; the spec opacity
//! is applied later as a uniform multiplier during blending.

use super::error::RenderError;
use super::spec::{ImageSpec, TextSpec, WatermarkSpec};
use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{imageops::FilterType, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// Embedded DejaVu faces (public domain-style license, commonly available).
const SANS_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");
const SANS_BOLD_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");
const MONO_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

static SANS_FONT: OnceLock<FontRef<'static>> = OnceLock::new();
static SANS_BOLD_FONT: OnceLock<FontRef<'static>> = OnceLock::new();
static MONO_FONT: OnceLock<FontRef<'static>> = OnceLock::new();

/// Font family for text watermarks, resolved against the embedded registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    /// DejaVu Sans (default).
    #[default]
    Sans,
    /// DejaVu Sans Bold.
    SansBold,
    /// DejaVu Sans Mono, for predictable glyph widths.
    Mono,
}

impl FontFamily {
    /// Resolve a family name as it appears in persisted settings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sans" => Some(Self::Sans),
            "sans-bold" => Some(Self::SansBold),
            "mono" => Some(Self::Mono),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Self::Sans => "sans",
            Self::SansBold => "sans-bold",
            Self::Mono => "mono",
        }
    }

    fn font(&self) -> &'static FontRef<'static> {
        let (cell, data) = match self {
            Self::Sans => (&SANS_FONT, SANS_FONT_DATA),
            Self::SansBold => (&SANS_BOLD_FONT, SANS_BOLD_FONT_DATA),
            Self::Mono => (&MONO_FONT, MONO_FONT_DATA),
        };
        cell.get_or_init(|| {
            FontRef::try_from_slice(data).expect("Failed to load embedded font - this is a bug")
        })
    }
}

/// Calculate the natural bounding box of rendered text.
///
/// Returns (width, height) in pixels, kerning-aware.
pub fn measure_text(text: &str, family: FontFamily, font_size: f32) -> (u32, u32) {
    let font = family.font();
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);

    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }

        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.height();

    // Small padding so anti-aliased edges are not clipped
    let padding = 2;
    (
        width.ceil() as u32 + padding,
        height.ceil() as u32 + padding,
    )
}

/// Build the transformed watermark layer for a spec.
///
/// The result is the layer after scale and rotation, at full alpha; the spec
/// opacity has NOT been applied yet.
pub(crate) fn build_layer(spec: &WatermarkSpec<'_>) -> Result<RgbaImage, RenderError> {
    let layer = match spec {
        WatermarkSpec::Text(text) => rasterize_text(text),
        WatermarkSpec::Image(img) => scale_source(img),
    };

    let rotation = spec.rotation_degrees().rem_euclid(360.0);
    if rotation == 0.0 {
        Ok(layer)
    } else {
        Ok(rotate_layer(&layer, rotation))
    }
}

/// Rasterize text onto a transparent layer sized to its bounding box.
fn rasterize_text(spec: &TextSpec) -> RgbaImage {
    let font = spec.font.font();
    let scale = PxScale::from(spec.font_size);
    let scaled_font = font.as_scaled(scale);

    let (width, height) = measure_text(&spec.text, spec.font, spec.font_size);
    let mut layer = RgbaImage::new(width.max(1), height.max(1));

    let baseline_y = scaled_font.ascent();
    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in spec.text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && (x as u32) < layer.width() && (y as u32) < layer.height() {
                    let alpha = (coverage * 255.0).round().clamp(0.0, 255.0) as u8;
                    let pixel = Rgba([spec.color.r, spec.color.g, spec.color.b, alpha]);

                    // Overlapping glyph outlines keep the stronger coverage
                    let existing = *layer.get_pixel(x as u32, y as u32);
                    if alpha > existing[3] {
                        layer.put_pixel(x as u32, y as u32, pixel);
                    }
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    layer
}

/// Resample the source raster of an image watermark by its scale factor.
fn scale_source(spec: &ImageSpec<'_>) -> RgbaImage {
    if spec.scale == 1.0 {
        return spec.source.clone();
    }

    let width = ((spec.source.width() as f32 * spec.scale).round() as u32).max(1);
    let height = ((spec.source.height() as f32 * spec.scale).round() as u32).max(1);

    image::imageops::resize(spec.source, width, height, FilterType::Lanczos3)
}

/// Rotate a layer by the specified degrees (clockwise) around its center.
///
/// The output canvas expands to the rotated footprint's axis-aligned bounds;
/// pixels are sampled from the source with bilinear interpolation.
pub(crate) fn rotate_layer(layer: &RgbaImage, degrees: f32) -> RgbaImage {
    let radians = -degrees.to_radians(); // Negative for clockwise
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = layer.width() as f32;
    let src_h = layer.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    // Axis-aligned bounds of the rotated footprint
    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];

    let rotated_corners: Vec<(f32, f32)> = corners
        .iter()
        .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos))
        .collect();

    let min_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::INFINITY, f32::min);
    let max_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::NEG_INFINITY, f32::max);
    let min_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::INFINITY, f32::min);
    let max_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::NEG_INFINITY, f32::max);

    // Snap near-integer extents so exact quarter turns do not grow a pixel
    let snap = |v: f32| {
        if (v - v.round()).abs() < 1e-3 {
            v.round()
        } else {
            v.ceil()
        }
    };
    let dst_w = (snap(max_x - min_x) as u32).max(1);
    let dst_h = (snap(max_y - min_y) as u32).max(1);

    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Inverse rotation for sampling
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    // Neighbors outside the source contribute transparent pixels
    let sample = |x: i64, y: i64| -> Rgba<u8> {
        if x >= 0 && y >= 0 && (x as u32) < layer.width() && (y as u32) < layer.height() {
            *layer.get_pixel(x as u32, y as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    };

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;

            let sx = rx * inv_cos - ry * inv_sin + cx - 0.5;
            let sy = rx * inv_sin + ry * inv_cos + cy - 0.5;

            if sx <= -1.0 || sy <= -1.0 || sx >= src_w || sy >= src_h {
                continue;
            }

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            let fx = sx - x0 as f32;
            let fy = sy - y0 as f32;

            let p00 = sample(x0, y0);
            let p10 = sample(x0 + 1, y0);
            let p01 = sample(x0, y0 + 1);
            let p11 = sample(x0 + 1, y0 + 1);

            let interpolate = |c: usize| -> f32 {
                p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
                    + p10[c] as f32 * fx * (1.0 - fy)
                    + p01[c] as f32 * (1.0 - fx) * fy
                    + p11[c] as f32 * fx * fy
            };

            let alpha = interpolate(3);
            if alpha > 0.0 {
                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba([
                        interpolate(0).round().clamp(0.0, 255.0) as u8,
                        interpolate(1).round().clamp(0.0, 255.0) as u8,
                        interpolate(2).round().clamp(0.0, 255.0) as u8,
                        alpha.round().clamp(0.0, 255.0) as u8,
                    ]),
                );
            }
        }
    }

    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::spec::Color;

    #[test]
    fn test_font_family_from_name() {
        assert_eq!(FontFamily::from_name("sans"), Some(FontFamily::Sans));
        assert_eq!(
            FontFamily::from_name("sans-bold"),
            Some(FontFamily::SansBold)
        );
        assert_eq!(FontFamily::from_name("mono"), Some(FontFamily::Mono));
        assert_eq!(FontFamily::from_name("comic"), None);
    }

    #[test]
    fn test_font_family_name_round_trip() {
        for family in [FontFamily::Sans, FontFamily::SansBold, FontFamily::Mono] {
            assert_eq!(FontFamily::from_name(family.as_name()), Some(family));
        }
    }

    #[test]
    fn test_font_size_affects_dimensions() {
        let (w1, h1) = measure_text("Hello", FontFamily::Sans, 12.0);
        let (w2, h2) = measure_text("Hello", FontFamily::Sans, 24.0);
        let (w3, h3) = measure_text("Hello", FontFamily::Sans, 48.0);

        assert!(w2 > w1);
        assert!(h2 > h1);
        assert!(w3 > w2);
        assert!(h3 > h2);
    }

    #[test]
    fn test_rasterize_text_has_content() {
        let spec = TextSpec {
            text: "Hello".to_string(),
            font_size: 24.0,
            color: Color::white(),
            opacity: 1.0,
            ..TextSpec::default()
        };

        let layer = rasterize_text(&spec);

        assert!(layer.width() > 0);
        assert!(layer.height() > 0);
        let has_content = layer.pixels().any(|p| p[3] > 0);
        assert!(has_content, "Rendered text should have visible pixels");
    }

    #[test]
    fn test_rasterize_text_full_alpha() {
        // The layer is built at full alpha; opacity is applied at blend time
        let spec = TextSpec {
            text: "W".to_string(),
            font_size: 48.0,
            color: Color::black(),
            opacity: 0.25,
            ..TextSpec::default()
        };

        let layer = rasterize_text(&spec);
        let max_alpha = layer.pixels().map(|p| p[3]).max().unwrap_or(0);
        assert_eq!(max_alpha, 255);
    }

    #[test]
    fn test_rasterize_text_color_applied() {
        let spec = TextSpec {
            text: "M".to_string(),
            font_size: 36.0,
            color: Color::new(200, 30, 90),
            opacity: 1.0,
            ..TextSpec::default()
        };

        let layer = rasterize_text(&spec);
        let inked = layer.pixels().find(|p| p[3] > 0).unwrap();
        assert_eq!((inked[0], inked[1], inked[2]), (200, 30, 90));
    }

    #[test]
    fn test_scale_source_identity() {
        let source = RgbaImage::from_pixel(20, 10, Rgba([10, 20, 30, 255]));
        let spec = ImageSpec {
            source: &source,
            scale: 1.0,
            opacity: 1.0,
            rotation_degrees: 0.0,
        };

        let layer = scale_source(&spec);
        assert_eq!(layer.dimensions(), (20, 10));
        assert_eq!(layer.get_pixel(5, 5), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_scale_source_downscale() {
        let source = RgbaImage::from_pixel(100, 40, Rgba([0, 255, 0, 255]));
        let spec = ImageSpec {
            source: &source,
            scale: 0.5,
            opacity: 1.0,
            rotation_degrees: 0.0,
        };

        let layer = scale_source(&spec);
        assert_eq!(layer.dimensions(), (50, 20));
    }

    #[test]
    fn test_scale_source_minimum_one_pixel() {
        let source = RgbaImage::new(4, 4);
        let spec = ImageSpec {
            source: &source,
            scale: 0.01,
            opacity: 1.0,
            rotation_degrees: 0.0,
        };

        let layer = scale_source(&spec);
        assert_eq!(layer.dimensions(), (1, 1));
    }

    #[test]
    fn test_rotate_layer_expands_bounds() {
        let layer = RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]));
        let rotated = rotate_layer(&layer, 45.0);

        // 45 degree rotation of 40x20: bounds ~ (40+20)/sqrt(2) ~ 42.4 each way
        assert!(rotated.width() > 40);
        assert!(rotated.height() > 20);
        let has_content = rotated.pixels().any(|p| p[3] > 0);
        assert!(has_content);
    }

    #[test]
    fn test_rotate_layer_90_preserves_area() {
        let layer = RgbaImage::from_pixel(30, 10, Rgba([0, 0, 255, 255]));
        let rotated = rotate_layer(&layer, 90.0);

        assert_eq!(rotated.dimensions(), (10, 30));
        // Center pixel keeps the source color
        let center = rotated.get_pixel(5, 15);
        assert_eq!(center[2], 255);
        assert_eq!(center[3], 255);
    }

    #[test]
    fn test_build_layer_skips_rotation_for_full_turns() {
        let source = RgbaImage::from_pixel(16, 16, Rgba([5, 6, 7, 255]));
        let spec = WatermarkSpec::Image(ImageSpec {
            source: &source,
            scale: 1.0,
            opacity: 1.0,
            rotation_degrees: 720.0,
        });

        let layer = build_layer(&spec).unwrap();
        assert_eq!(layer.dimensions(), (16, 16));
        assert_eq!(layer.get_pixel(8, 8), &Rgba([5, 6, 7, 255]));
    }
}
