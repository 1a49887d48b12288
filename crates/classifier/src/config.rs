use crate::backend::ExecutionProvider;
use crate::preprocessing::DEFAULT_INPUT_SIZE;
use std::env;
use std::path::PathBuf;

pub use common::Environment;

pub const DEFAULT_MODEL_PATH: &str = "models/plant_disease_model.onnx";
pub const DEFAULT_CLASS_INDICES_PATH: &str = "models/class_indices.json";

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub environment: Environment,
    pub model_path: PathBuf,
    pub class_indices_path: PathBuf,
    pub input_size: (u32, u32),
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
    pub otel_endpoint: Option<String>,
}

impl ClassifierConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let model_path = env::var("MODEL_PATH")
            .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
            .into();

        let class_indices_path = env::var("CLASS_INDICES_PATH")
            .unwrap_or_else(|_| DEFAULT_CLASS_INDICES_PATH.to_string())
            .into();

        let input_width = env::var("INPUT_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&w: &u32| w > 0)
            .unwrap_or(DEFAULT_INPUT_SIZE.0);

        let input_height = env::var("INPUT_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&h: &u32| h > 0)
            .unwrap_or(DEFAULT_INPUT_SIZE.1);

        let execution_provider = match env::var("EXECUTION_PROVIDER") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => ExecutionProvider::Cpu,
        };

        let intra_threads = env::var("INTRA_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let otel_endpoint = env::var("OTEL_ENDPOINT").ok().filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            model_path,
            class_indices_path,
            input_size: (input_width, input_height),
            execution_provider,
            intra_threads,
            otel_endpoint,
        })
    }

    /// Configuration pointing at explicit files, everything else default.
    pub fn with_paths(
        model_path: impl Into<PathBuf>,
        class_indices_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            environment: Environment::Development,
            model_path: model_path.into(),
            class_indices_path: class_indices_path.into(),
            input_size: DEFAULT_INPUT_SIZE,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 1,
            otel_endpoint: None,
        }
    }
}
