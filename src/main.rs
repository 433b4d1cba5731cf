use clap::Parser;
use photomark::batch::{self, FileOutcome};
use photomark::settings::Settings;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// PhotoMark - apply text and image watermarks to photos in batch
#[derive(Parser, Debug)]
#[command(name = "photomark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the watermark settings file
    #[arg(short, long, default_value = "settings.json")]
    settings: PathBuf,

    /// Directory for watermarked output files
    #[arg(short, long, default_value = "watermarked")]
    out_dir: PathBuf,

    /// Validate the settings file and exit
    #[arg(long)]
    validate_only: bool,

    /// Input image files
    #[arg(required_unless_present = "validate_only")]
    inputs: Vec<PathBuf>,
}

fn main() {
    // Initialize logging subsystem
    photomark::logging::init_subscriber().expect("Failed to initialize logging subsystem");

    // Parse command-line arguments
    let args = Args::parse();

    // Load watermark settings from file
    let settings = Settings::from_file(&args.settings).unwrap_or_else(|e| {
        eprintln!("Failed to load settings: {}", e);
        std::process::exit(1);
    });

    if args.validate_only {
        println!("{}: OK", args.settings.display());
        return;
    }

    tracing::info!(
        settings_file = %args.settings.display(),
        out_dir = %args.out_dir.display(),
        inputs = args.inputs.len(),
        "Settings loaded successfully"
    );

    // A render in progress runs to completion; Ctrl-C skips remaining files
    let cancel = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&cancel))
        .expect("Failed to register SIGINT handler");

    let reports = batch::process_files(&args.inputs, &settings, &args.out_dir, &cancel)
        .unwrap_or_else(|e| {
            eprintln!("Batch setup failed: {}", e);
            std::process::exit(1);
        });

    let mut failed = 0usize;
    for report in &reports {
        match &report.outcome {
            FileOutcome::Written(path) => println!("{}", path.display()),
            FileOutcome::Failed(message) => {
                failed += 1;
                eprintln!("{}: {}", report.input.display(), message);
            }
            FileOutcome::Cancelled => {
                eprintln!("{}: cancelled", report.input.display());
            }
        }
    }

    let cancelled = cancel.load(Ordering::Relaxed);
    if failed > 0 || cancelled {
        eprintln!(
            "{} of {} files written ({} failed{})",
            reports.iter().filter(|r| r.outcome.is_success()).count(),
            reports.len(),
            failed,
            if cancelled { ", run cancelled" } else { "" }
        );
        std::process::exit(1);
    }
}
