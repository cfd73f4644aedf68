// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk — Document scanner: auto-crop, enhance, OCR, searchable PDF.
//
// Entry point. Initialises logging, loads the configuration, and dispatches
// the command-line subcommands onto a `ScanSession`.

mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use scanwerk_core::config::config_dir;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::humanize_error;
use scanwerk_core::{AppConfig, EnhanceMode, PaperSize};
use scanwerk_document::{TextRecognizer, detect_document};

use session::ScanSession;

#[derive(Parser)]
#[command(name = "scanwerk")]
#[command(about = "Scan documents: auto-crop, enhance, OCR, and export searchable PDFs", long_about = None)]
struct Cli {
    /// Directory holding config.json (default: $XDG_CONFIG_HOME/scanwerk)
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the document in a photo, rectify it, and save the result
    Crop {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image (.png or .jpg)
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        adjust: Adjustments,

        /// Fall back to Hough line detection when no contour qualifies
        #[arg(long)]
        line_fallback: bool,
    },

    /// Print the detected document outline as JSON
    Detect {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(long)]
        line_fallback: bool,
    },

    /// Recognise the text in a photographed document
    Ocr {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Skip auto-crop and run OCR on the whole photo
        #[arg(long)]
        no_crop: bool,

        /// Directory containing text-detection.rten and text-recognition.rten
        #[arg(long, value_name = "DIR")]
        models: Option<PathBuf>,
    },

    /// Combine photos into one searchable PDF, one page per photo
    Pdf {
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long)]
        no_crop: bool,

        #[command(flatten)]
        adjust: Adjustments,

        /// Run OCR and place the text under each page image
        #[arg(long)]
        ocr: bool,

        #[arg(long, value_name = "DIR", requires = "ocr")]
        models: Option<PathBuf>,

        /// Paper size: a4, a3, a5, letter, legal, tabloid, or WxHmm
        #[arg(long, value_name = "SIZE")]
        paper: Option<PaperSize>,
    },

    /// Take a photo with the device camera
    Capture {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Show the configuration, or write it with --init
    Config {
        /// Write the current settings (defaults if none exist) to config.json
        #[arg(long)]
        init: bool,
    },
}

#[derive(clap::Args)]
struct Adjustments {
    /// Brightness offset, -50 to 50
    #[arg(long, allow_negative_numbers = true)]
    brightness: Option<i32>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Color,
    Grayscale,
    Bw,
    Otsu,
}

impl From<ModeArg> for EnhanceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Color => EnhanceMode::Color,
            ModeArg::Grayscale => EnhanceMode::Grayscale,
            ModeArg::Bw => EnhanceMode::BlackAndWhite,
            ModeArg::Otsu => EnhanceMode::Otsu,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let dir = cli.config_dir.unwrap_or_else(config_dir);
    let config = AppConfig::load_or_default(&dir);

    match cli.command {
        Command::Crop {
            input,
            output,
            adjust,
            line_fallback,
        } => {
            let mut config = config;
            config.detection.line_fallback |= line_fallback;
            let mut session = ScanSession::new(config);
            session.open_image(&input)?;
            session.auto_crop()?;
            apply_adjustments(&mut session, &adjust);
            session.save_cropped(&output)?;
            tracing::info!(output = %output.display(), "Cropped image saved");
        }

        Command::Detect {
            input,
            line_fallback,
        } => {
            let mut detection_config = config.detection.clone();
            detection_config.line_fallback |= line_fallback;
            let image = scanwerk_document::ImageProcessor::open(&input)?.into_dynamic();
            let detection =
                detect_document(&image, &detection_config).ok_or(ScanwerkError::DocumentNotFound)?;
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }

        Command::Ocr {
            input,
            no_crop,
            models,
        } => {
            let recognizer = load_recognizer(&config, models.as_deref())?;
            let mut session = ScanSession::new(config);
            session.open_image(&input)?;
            if !no_crop {
                crop_or_keep(&mut session, &input)?;
            }
            println!("{}", session.extract_text(&*recognizer)?);
        }

        Command::Pdf {
            inputs,
            output,
            no_crop,
            adjust,
            ocr,
            models,
            paper,
        } => {
            let recognizer = if ocr {
                Some(load_recognizer(&config, models.as_deref())?)
            } else {
                None
            };
            let mut config = config;
            if let Some(paper) = paper {
                config.paper_size = paper;
            }

            let mut session = ScanSession::new(config);
            for input in &inputs {
                session.open_image(input)?;
                if !no_crop {
                    crop_or_keep(&mut session, input)?;
                }
                apply_adjustments(&mut session, &adjust);
                let count = session.add_page(recognizer.as_deref())?;
                tracing::info!(input = %input.display(), page = count, "Page queued");
            }

            let written = session.export_pdf(&output)?;
            println!("Exported {written} page(s) to {}", output.display());
        }

        Command::Capture { output } => {
            let bridge = scanwerk_bridge::platform_bridge();
            tracing::info!(platform = bridge.platform_name(), "Capturing from camera");
            let quality = config.jpeg_quality;
            let mut session = ScanSession::new(config);
            session.capture(bridge.as_ref())?;
            if let Some(image) = session.current_image() {
                scanwerk_document::ImageProcessor::from_dynamic(image.clone())
                    .save(&output, quality)?;
                println!("Saved {}", output.display());
            }
        }

        Command::Config { init } => {
            if init {
                let path = config.save_to(&dir)?;
                println!("Wrote {}", path.display());
            } else {
                println!("# {}", dir.join("config.json").display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn apply_adjustments(session: &mut ScanSession, adjust: &Adjustments) {
    if let Some(mode) = adjust.mode {
        session.set_enhance_mode(mode.into());
    }
    if let Some(brightness) = adjust.brightness {
        let used = session.set_brightness(brightness);
        if used != brightness {
            tracing::warn!(requested = brightness, used, "Brightness clamped");
        }
    }
}

/// Auto-crop, keeping the whole photo when no document outline is found.
fn crop_or_keep(session: &mut ScanSession, input: &Path) -> Result<()> {
    match session.auto_crop() {
        Ok(()) => Ok(()),
        Err(ScanwerkError::DocumentNotFound) => {
            tracing::warn!(input = %input.display(), "No document edges found; using the whole image");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(feature = "ocr")]
fn load_recognizer(config: &AppConfig, models: Option<&Path>) -> Result<Box<dyn TextRecognizer>> {
    use scanwerk_document::{OcrConfig, OcrEngine};

    let dir = models.or(config.ocr_model_dir.as_deref());
    Ok(Box::new(OcrEngine::new(OcrConfig::from_optional_dir(dir))?))
}

#[cfg(not(feature = "ocr"))]
fn load_recognizer(_config: &AppConfig, _models: Option<&Path>) -> Result<Box<dyn TextRecognizer>> {
    Err(ScanwerkError::OcrUnavailable)
}
