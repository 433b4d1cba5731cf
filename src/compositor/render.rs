//! Watermark rendering and alpha compositing.
//!
//! This module owns the top-level [`render`] pipeline: build the watermark
//! layer, resolve placement origins, and alpha-blend each instance onto a
//! copy of the base image.
//!
//! Rendering is purely functional: the base is borrowed read-only, the output
//! is a fresh raster with identical dimensions, and identical requests yield
//! byte-identical output. Pixels the watermark never touches are bit-for-bit
//! the base pixels.

use super::error::RenderError;
use super::layer::build_layer;
use super::placement::{is_visible, BaseExtent, LayerFootprint, LayerOrigin};
use super::spec::RenderRequest;
use image::{imageops::FilterType, Rgba, RgbaImage};

/// Render a watermark onto the base image, returning a new raster.
///
/// The output has the same dimensions as the base. Out-of-bounds watermark
/// pixels are clipped, never an error.
///
/// # Errors
///
/// [`RenderError::InvalidSpec`] for malformed style parameters and
/// [`RenderError::EmptyImage`] for a zero-dimension base. The placement and
/// blend math is total over valid inputs.
pub fn render(request: &RenderRequest<'_>) -> Result<RgbaImage, RenderError> {
    request.validate()?;

    let mut output = request.base.clone();

    let opacity = request.spec.opacity();
    if opacity == 0.0 {
        // Fully transparent watermark leaves the base untouched
        return Ok(output);
    }

    let layer = build_layer(&request.spec)?;

    let base_extent = BaseExtent {
        width: output.width(),
        height: output.height(),
    };
    let footprint = LayerFootprint {
        width: layer.width(),
        height: layer.height(),
    };

    for origin in request.placement.origins(&base_extent, &footprint) {
        if is_visible(&origin, &base_extent, &footprint) {
            blend_layer(&mut output, &layer, origin, opacity);
        }
    }

    Ok(output)
}

/// Render at full resolution, then downscale the result for display.
///
/// Compositing always happens at the base image's native resolution, so a
/// preview produced here agrees pixel-for-pixel (before downscaling) with the
/// full-size export of the same request.
pub fn render_preview(
    request: &RenderRequest<'_>,
    max_edge: u32,
) -> Result<RgbaImage, RenderError> {
    if max_edge == 0 {
        return Err(RenderError::InvalidSpec(
            "preview max edge must be > 0".to_string(),
        ));
    }

    let full = render(request)?;

    let (w, h) = full.dimensions();
    let longest = w.max(h);
    if longest <= max_edge {
        return Ok(full);
    }

    let ratio = max_edge as f32 / longest as f32;
    let nw = ((w as f32 * ratio).round() as u32).max(1);
    let nh = ((h as f32 * ratio).round() as u32).max(1);

    // Preview favors speed over resampling quality
    Ok(image::imageops::resize(&full, nw, nh, FilterType::Triangle))
}

/// Blend one layer instance onto the target at the given origin.
///
/// The visible region is clamped to the target bounds; everything outside is
/// discarded.
fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, origin: LayerOrigin, opacity: f32) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let layer_width = layer.width() as i32;
    let layer_height = layer.height() as i32;

    let x_start = origin.x.max(0);
    let y_start = origin.y.max(0);
    let x_end = (origin.x + layer_width).min(target_width);
    let y_end = (origin.y + layer_height).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let lx = (tx - origin.x) as u32;
            let ly = (ty - origin.y) as u32;

            let layer_pixel = layer.get_pixel(lx, ly);
            let target_pixel = target.get_pixel(tx as u32, ty as u32);

            let blended = blend_pixels(*target_pixel, *layer_pixel, opacity);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Blend two pixels using alpha compositing with an extra uniform opacity.
///
/// Uses the Porter-Duff "over" operator with the foreground's effective alpha
/// being `alpha_channel * opacity`. Zero effective alpha returns the
/// background bit-identically; full effective alpha returns the foreground
/// color exactly.
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity;

    if fg_alpha <= 0.0 {
        return background;
    }
    if fg_alpha >= 1.0 {
        return Rgba([foreground[0], foreground[1], foreground[2], 255]);
    }

    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
