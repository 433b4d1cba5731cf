//! Watermark compositing engine.
//!
//! The engine computes pixel-accurate placement, blending, and tiling of a
//! watermark layer onto an arbitrary base image. It is one cohesive transform
//! pipeline:
//!
//! 1. **Layer construction** - rasterize text or resample a source image onto
//!    a transparent layer sized to its natural bounding box
//! 2. **Transform** - rotate about the layer center, expanding to the rotated
//!    footprint's axis-aligned bounds
//! 3. **Placement** - a single anchored instance or a repeating tile grid,
//!    clipped to the base image
//! 4. **Blend** - Porter-Duff "over" per pixel, with the spec opacity as a
//!    uniform alpha multiplier
//!
//! # Purity
//!
//! [`render`] is a pure function of its [`RenderRequest`]: no I/O, no shared
//! mutable state, and identical inputs yield byte-identical output. That is
//! what guarantees an interactive preview and a full-size export agree - both
//! composite at native resolution from the same request.
//!
//! # Example
//!
//! ```ignore
//! use photomark::compositor::{
//!     render, Color, PlacementSpec, RenderRequest, TextSpec, WatermarkSpec,
//! };
//!
//! let spec = WatermarkSpec::Text(TextSpec {
//!     text: "Copyright 2025".to_string(),
//!     opacity: 0.5,
//!     ..TextSpec::default()
//! });
//!
//! let request = RenderRequest::new(&base, spec, PlacementSpec::fixed_px(400.0, 300.0));
//! let watermarked = render(&request)?;
//! ```

pub mod error;
pub mod layer;
pub mod placement;
pub mod render;
pub mod spec;

// Re-export main types for convenience
pub use error::RenderError;
pub use layer::{measure_text, FontFamily};
pub use placement::{
    fixed_origin, is_visible, preset_origin, tiled_origins, AnchorMode, BaseExtent, CoordUnit,
    GridPosition, LayerFootprint, LayerOrigin, PlacementSpec,
};
pub use render::{render, render_preview};
pub use spec::{parse_hex_color, Color, ImageSpec, RenderRequest, TextSpec, WatermarkSpec};
