use clap::Parser;
use classifier::{ClassifierConfig, InferenceContext, logging::setup_logging};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[cfg(feature = "ort-backend")]
use classifier::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The `classify` binary needs the 'ort-backend' feature");

/// Classify plant leaf images. Model and label paths come from MODEL_PATH and CLASS_INDICES_PATH.
#[derive(Parser)]
#[command(name = "classify", version)]
struct Args {
    /// Image files to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Serialize)]
struct Line<'a> {
    path: &'a Path,
    #[serde(flatten)]
    prediction: classifier::PredictionResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ClassifierConfig::from_env()?;

    let _telemetry = setup_logging(&config)?;

    tracing::info!(config = ?config, "Loaded configuration");

    let mut context = InferenceContext::<Backend>::initialize(&config)?;
    tracing::info!(classes = context.labels().len(), "Classifier ready");

    let mut failures = 0usize;
    for path in &args.images {
        let _span = tracing::info_span!("classify_image", path = %path.display()).entered();

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read image");
                failures += 1;
                continue;
            }
        };

        match context.predict(&bytes) {
            Ok(prediction) => {
                println!("{}", serde_json::to_string(&Line { path, prediction })?);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to classify image");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} images could not be classified", args.images.len());
    }

    Ok(())
}
