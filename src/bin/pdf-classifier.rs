//! CLI binary for pdf-classifier.
//!
//! A thin shim over the library crate: maps flags to `ClassifierConfig`,
//! makes sure pdfium is available, then serves the web form or classifies
//! a single URL.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_classifier::{
    pdfium_locator, server, Artifacts, ClassifierConfig, PdfClassifier, Prediction,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web form on http://127.0.0.1:7860
  pdf-classifier serve

  # Listen on all interfaces
  pdf-classifier serve --bind 0.0.0.0:8080

  # Classify one document from the terminal
  pdf-classifier classify https://example.com/datasheets/fuse-holder.pdf

  # JSON output
  pdf-classifier classify --json https://example.com/catalogue.pdf

  # Show the loaded model
  pdf-classifier inspect-model --model-dir ./models

ENVIRONMENT VARIABLES:
  PDF_CLASSIFIER_MODEL_DIR         Directory holding the model artifacts
  PDF_CLASSIFIER_BIND              Web server bind address (host:port)
  PDF_CLASSIFIER_DOWNLOAD_TIMEOUT  Seconds before a PDF download is abandoned
  PDFIUM_LIB_PATH                  Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR            Override the default pdfium cache directory
  RUST_LOG                         Override the log filter

SETUP:
  Export the fitted vectorizer, model and label list as JSON into models/:
    models/tfidf_vectorizer.json
    models/product_classifier_model.json
    models/labels.json

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf-classifier/pdfium-7690/.
"#;

/// Classify PDF documents into product categories.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-classifier",
    version,
    about = "Classify PDF documents fetched from a URL into product categories",
    long_about = "Fetch a PDF from a URL, extract and normalize its text, and predict one of \
the trained categories (Lighting, Fuses, Cables, Others) with a TF-IDF text model. \
Runs as a small web form or as a one-shot command.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_CLASSIFIER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF_CLASSIFIER_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Directory holding the exported model artifacts.
    #[arg(long, global = true, env = "PDF_CLASSIFIER_MODEL_DIR", default_value = "models")]
    model_dir: PathBuf,

    /// Classifier file name inside --model-dir.
    #[arg(long, global = true, env = "PDF_CLASSIFIER_MODEL_FILE",
          default_value = "product_classifier_model.json")]
    model_file: String,

    /// Vectorizer file name inside --model-dir.
    #[arg(long, global = true, env = "PDF_CLASSIFIER_VECTORIZER_FILE",
          default_value = "tfidf_vectorizer.json")]
    vectorizer_file: String,

    /// Label list file name inside --model-dir.
    #[arg(long, global = true, env = "PDF_CLASSIFIER_LABELS_FILE", default_value = "labels.json")]
    labels_file: String,

    /// Seconds before a PDF download is abandoned (unbounded when unset).
    #[arg(long, global = true, env = "PDF_CLASSIFIER_DOWNLOAD_TIMEOUT")]
    download_timeout: Option<u64>,

    /// Path to an existing pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web form and JSON API.
    Serve {
        /// Address to bind the HTTP server to (host:port).
        #[arg(long, env = "PDF_CLASSIFIER_BIND", default_value = "127.0.0.1:7860")]
        bind: String,
    },
    /// Classify the PDF at URL and print the result.
    Classify {
        /// HTTP/HTTPS URL of the PDF.
        url: String,

        /// Output structured JSON instead of text.
        #[arg(long, env = "PDF_CLASSIFIER_JSON")]
        json: bool,
    },
    /// Load the model artifacts and print a summary (no pdfium needed).
    InspectModel {
        /// Output structured JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let bind = match cli.command {
        Command::Serve { ref bind } => Some(bind.clone()),
        _ => None,
    };
    let config = build_config(&cli.model, bind)?;

    match cli.command {
        Command::InspectModel { json } => inspect_model(&config, json),
        Command::Serve { .. } => {
            let classifier = load_classifier(&config, cli.quiet)?;
            if !cli.quiet {
                eprintln!(
                    "{} {}",
                    green("◆"),
                    bold(&format!("Serving on http://{}", config.bind_addr))
                );
            }
            server::serve(Arc::new(classifier), config.bind_addr)
                .await
                .context("Web server failed")
        }
        Command::Classify { ref url, json } => {
            let classifier = load_classifier(&config, cli.quiet)?;
            let prediction = classifier.classify_url(url).await;
            print_prediction(&prediction, json)?;
            if !prediction.is_classified() {
                std::process::exit(2);
            }
            Ok(())
        }
    }
}

/// Map CLI args to `ClassifierConfig`.
fn build_config(args: &ModelArgs, bind: Option<String>) -> Result<ClassifierConfig> {
    let mut builder = ClassifierConfig::builder()
        .model_dir(&args.model_dir)
        .model_file(&args.model_file)
        .vectorizer_file(&args.vectorizer_file)
        .labels_file(&args.labels_file);

    if let Some(bind) = bind {
        builder = builder.bind_addr(bind);
    }
    if let Some(secs) = args.download_timeout {
        builder = builder.download_timeout_secs(secs);
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }

    builder.build().context("Invalid configuration")
}

/// Make sure pdfium is on disk (with a download bar on first run), then
/// load the artifacts and bind.
fn load_classifier(config: &ClassifierConfig, quiet: bool) -> Result<PdfClassifier> {
    let locator = pdfium_locator(config);

    if !locator.is_cached() {
        if quiet {
            tokio::task::block_in_place(|| locator.ensure(None))
                .context("Failed to download PDFium engine")?;
        } else {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                locator.ensure(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        }
    }

    tokio::task::block_in_place(|| PdfClassifier::from_config(config))
        .context("Failed to start classifier")
}

fn print_prediction(prediction: &Prediction, json: bool) -> Result<()> {
    if json {
        let body = serde_json::json!({
            "label": prediction.label_text(),
            "probabilities": prediction.probabilities(),
            "error": prediction.error(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialise output")?
        );
        return Ok(());
    }

    match prediction {
        Prediction::Classified(c) => {
            println!("{} {}", green("✔"), bold(&c.label));
            for (label, p) in c.probabilities.iter() {
                let line = format!("  {label:<12} {p:.4}");
                if label == c.label {
                    println!("{line}");
                } else {
                    println!("{}", dim(&line));
                }
            }
        }
        Prediction::ExtractionFailed(_) => {
            println!("{} {}", red("✘"), prediction.label_text());
        }
    }
    Ok(())
}

fn inspect_model(config: &ClassifierConfig, json: bool) -> Result<()> {
    let artifacts = Artifacts::load(config).context("Failed to load model artifacts")?;
    let vectorizer = artifacts.vectorizer();
    let model = artifacts.model();

    if json {
        let body = serde_json::json!({
            "model_dir": config.model_dir,
            "model": model.kind(),
            "labels": artifacts.labels(),
            "features": vectorizer.n_features(),
            "ngram_range": vectorizer.ngram_range(),
            "sublinear_tf": vectorizer.sublinear_tf(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialise model summary")?
        );
        return Ok(());
    }

    println!("Model dir:    {}", config.model_dir.display());
    println!("Model:        {}", model.kind());
    println!("Labels:       {}", artifacts.labels().join(", "));
    println!("Features:     {}", vectorizer.n_features());
    let (lo, hi) = vectorizer.ngram_range();
    println!("N-grams:      {lo}..={hi}");
    println!("Sublinear TF: {}", vectorizer.sublinear_tf());
    Ok(())
}
