//! Batch watermark application over many files.
//!
//! Each input image is an independent render: files are processed in
//! parallel, a failure on one file never aborts the others, and the caller
//! gets back a per-file report. Cancellation is coarse - the flag is checked
//! between items, and a render already in progress runs to completion.

use crate::codec;
use crate::compositor::{render, RenderRequest};
use crate::settings::{to_watermark_spec, Settings, WatermarkSettings};
use image::RgbaImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Suffix appended to output file stems.
const OUTPUT_SUFFIX: &str = "_watermarked";

/// Outcome of one file in a batch run.
#[derive(Debug)]
pub enum FileOutcome {
    /// Watermarked image written to this path.
    Written(PathBuf),
    /// This file failed; the rest of the batch continued.
    Failed(String),
    /// Batch was cancelled before this file started.
    Cancelled,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Per-file result of a batch run, in input order.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

/// Apply the settings to every input file, writing results into `output_dir`.
///
/// Returns one report per input, in input order. Only setup problems (bad
/// settings, unreadable watermark source, output directory creation) fail the
/// whole call; per-file errors are isolated into their reports.
pub fn process_files(
    inputs: &[PathBuf],
    settings: &Settings,
    output_dir: &Path,
    cancel: &AtomicBool,
) -> Result<Vec<FileReport>, String> {
    settings.validate()?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    // Image watermark sources are decoded once and shared read-only across
    // all parallel renders.
    let watermark_source = match &settings.watermark {
        WatermarkSettings::Image(image) => Some(
            codec::load_rgba(&image.source)
                .map_err(|e| format!("Failed to load watermark image: {}", e))?,
        ),
        WatermarkSettings::Text(_) => None,
    };

    let reports: Vec<FileReport> = inputs
        .par_iter()
        .map(|input| FileReport {
            input: input.clone(),
            outcome: process_one(
                input,
                settings,
                watermark_source.as_ref(),
                output_dir,
                cancel,
            ),
        })
        .collect();

    let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
    tracing::info!(
        total = reports.len(),
        succeeded,
        failed = reports.len() - succeeded,
        "Batch run finished"
    );

    Ok(reports)
}

fn process_one(
    input: &Path,
    settings: &Settings,
    watermark_source: Option<&RgbaImage>,
    output_dir: &Path,
    cancel: &AtomicBool,
) -> FileOutcome {
    if cancel.load(Ordering::Relaxed) {
        return FileOutcome::Cancelled;
    }

    let base = match codec::load_rgba(input) {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!(input = %input.display(), error = %e, "Skipping file");
            return FileOutcome::Failed(e.to_string());
        }
    };

    let spec = match to_watermark_spec(&settings.watermark, watermark_source) {
        Ok(spec) => spec,
        Err(e) => return FileOutcome::Failed(e),
    };

    let request = RenderRequest::new(&base, spec, settings.placement);
    let rendered = match render(&request) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!(input = %input.display(), error = %e, "Render failed");
            return FileOutcome::Failed(e.to_string());
        }
    };

    let output = output_path(input, output_dir);
    match codec::save_rgba(&output, &rendered) {
        Ok(()) => {
            tracing::info!(input = %input.display(), output = %output.display(), "Watermarked");
            FileOutcome::Written(output)
        }
        Err(e) => FileOutcome::Failed(e.to_string()),
    }
}

/// Output path for an input: `<output_dir>/<stem>_watermarked.<ext>`.
///
/// Extensions we cannot encode (animated and web-only input formats) fall
/// back to PNG.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| codec::OUTPUT_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| "png".to_string());

    output_dir.join(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::PlacementSpec;
    use crate::settings::TextSettings;
    use image::Rgba;

    fn text_settings() -> Settings {
        Settings {
            watermark: WatermarkSettings::Text(TextSettings {
                text: "TEST".to_string(),
                font_family: "sans".to_string(),
                font_size: 16.0,
                color: "#FF0000".to_string(),
                opacity: 1.0,
                rotation: 0.0,
            }),
            placement: PlacementSpec::fixed_px(32.0, 32.0),
        }
    }

    fn write_test_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let image = RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]));
        codec::save_rgba(&path, &image).unwrap();
        path
    }

    #[test]
    fn test_batch_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let inputs = vec![
            write_test_image(dir.path(), "a.png"),
            write_test_image(dir.path(), "b.png"),
            write_test_image(dir.path(), "c.png"),
        ];

        let cancel = AtomicBool::new(false);
        let reports = process_files(&inputs, &text_settings(), &out, &cancel).unwrap();

        assert_eq!(reports.len(), 3);
        for report in &reports {
            match &report.outcome {
                FileOutcome::Written(path) => assert!(path.exists()),
                other => panic!("expected success, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_batch_reports_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let inputs = vec![
            write_test_image(dir.path(), "z.png"),
            write_test_image(dir.path(), "a.png"),
        ];

        let cancel = AtomicBool::new(false);
        let reports = process_files(&inputs, &text_settings(), &out, &cancel).unwrap();

        assert_eq!(reports[0].input, inputs[0]);
        assert_eq!(reports[1].input, inputs[1]);
    }

    #[test]
    fn test_batch_isolates_per_file_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let inputs = vec![
            write_test_image(dir.path(), "good1.png"),
            bad,
            write_test_image(dir.path(), "good2.png"),
        ];

        let cancel = AtomicBool::new(false);
        let reports = process_files(&inputs, &text_settings(), &out, &cancel).unwrap();

        assert!(reports[0].outcome.is_success());
        assert!(matches!(reports[1].outcome, FileOutcome::Failed(_)));
        assert!(reports[2].outcome.is_success());
    }

    #[test]
    fn test_batch_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let inputs = vec![write_test_image(dir.path(), "a.png")];

        let cancel = AtomicBool::new(true);
        let reports = process_files(&inputs, &text_settings(), &out, &cancel).unwrap();

        assert!(matches!(reports[0].outcome, FileOutcome::Cancelled));
    }

    #[test]
    fn test_batch_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = text_settings();
        if let WatermarkSettings::Text(ref mut text) = settings.watermark {
            text.opacity = 5.0;
        }

        let cancel = AtomicBool::new(false);
        let result = process_files(&[], &settings, dir.path(), &cancel);
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_missing_watermark_source_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            watermark: WatermarkSettings::Image(crate::settings::ImageSettings {
                source: dir.path().join("missing.png"),
                scale: 0.2,
                opacity: 0.5,
                rotation: 0.0,
            }),
            placement: PlacementSpec::fixed_px(10.0, 10.0),
        };

        let cancel = AtomicBool::new(false);
        let result = process_files(&[], &settings, dir.path(), &cancel);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_path_suffix_and_fallback() {
        let out = Path::new("/out");
        assert_eq!(
            output_path(Path::new("/in/photo.jpg"), out),
            PathBuf::from("/out/photo_watermarked.jpg")
        );
        // Formats we cannot encode fall back to PNG
        assert_eq!(
            output_path(Path::new("/in/anim.gif"), out),
            PathBuf::from("/out/anim_watermarked.png")
        );
        assert_eq!(
            output_path(Path::new("/in/noext"), out),
            PathBuf::from("/out/noext_watermarked.png")
        );
    }
}
