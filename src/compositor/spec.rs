//! Watermark specification types.
//!
//! A [`WatermarkSpec`] describes the watermark content and its style
//! parameters; together with a base image and a
//! [`PlacementSpec`](super::placement::PlacementSpec) it forms an immutable
//! [`RenderRequest`]. Requests are never mutated after creation — every
//! preview or export call builds a fresh one, which is what makes rendering a
//! pure function of its inputs.

use super::error::RenderError;
use super::layer::FontFamily;
use super::placement::PlacementSpec;
use image::RgbaImage;

/// RGB text color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, RenderError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| RenderError::InvalidSpec("color must start with '#'".to_string()))?;

    match hex.len() {
        3 => {
            // #RGB format - each character represents a hex digit, doubled
            let r = u8::from_str_radix(&hex[0..1], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            let g = u8::from_str_radix(&hex[1..2], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            let b = u8::from_str_radix(&hex[2..3], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            // Double each component: 0xF -> 0xFF, 0xA -> 0xAA
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => {
            // #RRGGBB format
            let r = u8::from_str_radix(&hex[0..2], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            let g = u8::from_str_radix(&hex[2..4], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            let b = u8::from_str_radix(&hex[4..6], 16)
                .map_err(|_| RenderError::InvalidSpec("invalid hex digit".to_string()))?;
            Ok(Color::new(r, g, b))
        }
        _ => Err(RenderError::InvalidSpec(format!(
            "color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Text watermark content and style.
#[derive(Debug, Clone)]
pub struct TextSpec {
    /// The text to render.
    pub text: String,
    /// Font family resolved against the embedded font registry.
    pub font: FontFamily,
    /// Font size in pixels. Must be > 0.
    pub font_size: f32,
    /// Text color (RGB).
    pub color: Color,
    /// Opacity from 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
    /// Rotation in degrees (clockwise) around the layer center.
    pub rotation_degrees: f32,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: FontFamily::Sans,
            font_size: 24.0,
            color: Color::white(),
            opacity: 0.5,
            rotation_degrees: 0.0,
        }
    }
}

/// Image watermark content and style.
///
/// The source raster is owned externally; the compositor only borrows the
/// pixel data, so one decoded watermark can be shared read-only across any
/// number of concurrent renders.
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec<'a> {
    /// Source pixels for the watermark.
    pub source: &'a RgbaImage,
    /// Uniform scale factor applied to the source. Must be > 0.
    pub scale: f32,
    /// Opacity from 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
    /// Rotation in degrees (clockwise) around the layer center.
    pub rotation_degrees: f32,
}

/// Watermark content - either rendered text or a borrowed source image.
#[derive(Debug, Clone)]
pub enum WatermarkSpec<'a> {
    Text(TextSpec),
    Image(ImageSpec<'a>),
}

impl WatermarkSpec<'_> {
    /// Uniform opacity multiplier for the whole layer.
    pub fn opacity(&self) -> f32 {
        match self {
            Self::Text(spec) => spec.opacity,
            Self::Image(spec) => spec.opacity,
        }
    }

    /// Rotation angle in degrees.
    pub fn rotation_degrees(&self) -> f32 {
        match self {
            Self::Text(spec) => spec.rotation_degrees,
            Self::Image(spec) => spec.rotation_degrees,
        }
    }

    /// Validate the style parameters.
    pub fn validate(&self) -> Result<(), RenderError> {
        let (opacity, rotation) = match self {
            Self::Text(spec) => {
                if spec.text.is_empty() {
                    return Err(RenderError::InvalidSpec(
                        "text content cannot be empty".to_string(),
                    ));
                }
                if !spec.font_size.is_finite() || spec.font_size <= 0.0 {
                    return Err(RenderError::InvalidSpec(format!(
                        "font size must be > 0, got {}",
                        spec.font_size
                    )));
                }
                (spec.opacity, spec.rotation_degrees)
            }
            Self::Image(spec) => {
                if !spec.scale.is_finite() || spec.scale <= 0.0 {
                    return Err(RenderError::InvalidSpec(format!(
                        "scale factor must be > 0, got {}",
                        spec.scale
                    )));
                }
                (spec.opacity, spec.rotation_degrees)
            }
        };

        // Check for NaN/Infinity and valid range
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(RenderError::InvalidSpec(format!(
                "opacity must be a finite value between 0.0 and 1.0, got {}",
                opacity
            )));
        }

        if !rotation.is_finite() {
            return Err(RenderError::InvalidSpec(format!(
                "rotation must be a finite number of degrees, got {}",
                rotation
            )));
        }

        Ok(())
    }
}

/// An immutable render request: base image, watermark spec, placement.
///
/// Rendering is a pure function of this value - identical requests always
/// produce byte-identical output, so a low-resolution preview and the final
/// export can share one request and are guaranteed to agree.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    /// The image to watermark. Borrowed read-only, never modified.
    pub base: &'a RgbaImage,
    /// Watermark content and style.
    pub spec: WatermarkSpec<'a>,
    /// Where the watermark goes.
    pub placement: PlacementSpec,
}

impl<'a> RenderRequest<'a> {
    pub fn new(base: &'a RgbaImage, spec: WatermarkSpec<'a>, placement: PlacementSpec) -> Self {
        Self {
            base,
            spec,
            placement,
        }
    }

    /// Validate the request: base image dimensions, spec, and placement.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.base.width() == 0 || self.base.height() == 0 {
            return Err(RenderError::EmptyImage);
        }
        self.spec.validate()?;
        self.placement.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::placement::PlacementSpec;

    // Test: Hex color parsing (#RGB, #RRGGBB)
    #[test]
    fn test_parse_hex_color_rrggbb() {
        let color = parse_hex_color("#FF0000").unwrap();
        assert_eq!(color, Color::new(255, 0, 0));

        let color = parse_hex_color("#00FF00").unwrap();
        assert_eq!(color, Color::new(0, 255, 0));

        let color = parse_hex_color("#FFFFFF").unwrap();
        assert_eq!(color, Color::new(255, 255, 255));

        let color = parse_hex_color("#000000").unwrap();
        assert_eq!(color, Color::new(0, 0, 0));
    }

    #[test]
    fn test_parse_hex_color_rgb() {
        let color = parse_hex_color("#F00").unwrap();
        assert_eq!(color, Color::new(255, 0, 0));

        let color = parse_hex_color("#ABC").unwrap();
        // A=10*17=170, B=11*17=187, C=12*17=204
        assert_eq!(color, Color::new(170, 187, 204));
    }

    #[test]
    fn test_parse_hex_color_lowercase() {
        let color = parse_hex_color("#ff0000").unwrap();
        assert_eq!(color, Color::new(255, 0, 0));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        // Missing #
        assert!(parse_hex_color("FF0000").is_err());

        // Wrong length
        assert!(parse_hex_color("#FF00").is_err());
        assert!(parse_hex_color("#FF00000").is_err());

        // Invalid hex
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    fn text_spec() -> TextSpec {
        TextSpec {
            text: "Copyright".to_string(),
            ..TextSpec::default()
        }
    }

    #[test]
    fn test_text_spec_validate_ok() {
        assert!(WatermarkSpec::Text(text_spec()).validate().is_ok());
    }

    #[test]
    fn test_text_spec_validate_empty_text() {
        let spec = TextSpec {
            text: String::new(),
            ..TextSpec::default()
        };
        let result = WatermarkSpec::Text(spec).validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_text_spec_validate_zero_font_size() {
        let spec = TextSpec {
            font_size: 0.0,
            ..text_spec()
        };
        let err = WatermarkSpec::Text(spec).validate().unwrap_err();
        assert!(err.to_string().contains("font size"));
    }

    #[test]
    fn test_text_spec_validate_opacity_out_of_range() {
        let spec = TextSpec {
            opacity: 1.5,
            ..text_spec()
        };
        let err = WatermarkSpec::Text(spec).validate().unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }

    #[test]
    fn test_text_spec_validate_nan_opacity() {
        let spec = TextSpec {
            opacity: f32::NAN,
            ..text_spec()
        };
        assert!(WatermarkSpec::Text(spec).validate().is_err());
    }

    #[test]
    fn test_text_spec_validate_infinite_rotation() {
        let spec = TextSpec {
            rotation_degrees: f32::INFINITY,
            ..text_spec()
        };
        assert!(WatermarkSpec::Text(spec).validate().is_err());
    }

    #[test]
    fn test_image_spec_validate_zero_scale() {
        let source = RgbaImage::new(10, 10);
        let spec = ImageSpec {
            source: &source,
            scale: 0.0,
            opacity: 0.5,
            rotation_degrees: 0.0,
        };
        let err = WatermarkSpec::Image(spec).validate().unwrap_err();
        assert!(err.to_string().contains("scale"));
    }

    #[test]
    fn test_request_validate_empty_base() {
        let base = RgbaImage::new(0, 0);
        let request = RenderRequest::new(
            &base,
            WatermarkSpec::Text(text_spec()),
            PlacementSpec::fixed_px(0.0, 0.0),
        );
        assert_eq!(request.validate(), Err(RenderError::EmptyImage));
    }

    #[test]
    fn test_request_validate_ok() {
        let base = RgbaImage::new(10, 10);
        let request = RenderRequest::new(
            &base,
            WatermarkSpec::Text(text_spec()),
            PlacementSpec::fixed_px(5.0, 5.0),
        );
        assert!(request.validate().is_ok());
    }
}
