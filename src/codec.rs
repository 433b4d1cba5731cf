//! Image file decode/encode.
//!
//! The compositing engine is pure and never touches the filesystem; this
//! module is the I/O collaborator that loads base and watermark rasters and
//! writes rendered output. Input formats are detected from content, output
//! formats from the target path extension. `UnsupportedFormat` lives here,
//! not in the engine.

use image::io::Reader as ImageReader;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions accepted for output encoding.
///
/// Inputs are sniffed from content instead, so anything the image decoders
/// understand loads regardless of its extension.
pub const OUTPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Errors from image file I/O.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported image format for {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Load an image file and convert it to RGBA.
///
/// The format is guessed from the file content, not the extension.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, CodecError> {
    let path = path.as_ref();

    let data = std::fs::read(path).map_err(|e| CodecError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| CodecError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

    if reader.format().is_none() {
        return Err(CodecError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let image = reader.decode().map_err(|e| CodecError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(image.to_rgba8())
}

/// Write an RGBA raster to a file, encoding by the path extension.
///
/// JPEG has no alpha channel, so `.jpg`/`.jpeg` targets are flattened to RGB
/// first.
pub fn save_rgba<P: AsRef<Path>>(path: P, image: &RgbaImage) -> Result<(), CodecError> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !OUTPUT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CodecError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let result = match extension.as_str() {
        "jpg" | "jpeg" => DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path),
        _ => image.save(path),
    };

    result.map_err(|e| CodecError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
