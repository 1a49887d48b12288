use super::{ExecutionProvider, InferenceBackend};
use crate::config::ClassifierConfig;
use crate::error::{ClassifierError, Result};
use crate::preprocessing::ImageTensor;
use ndarray::{Array2, Ix2};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::path::Path;

/// ONNX Runtime session holding the classifier graph.
pub struct OrtBackend {
    session: Session,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &Path,
        provider: ExecutionProvider,
        intra_threads: usize,
    ) -> Result<Self> {
        let session = build_session(path, provider, intra_threads).map_err(|e| {
            ClassifierError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            }
        })?;

        tracing::info!(path = %path.display(), %provider, intra_threads, "Model loaded");
        Ok(Self { session })
    }
}

fn build_session(
    path: &Path,
    provider: ExecutionProvider,
    intra_threads: usize,
) -> anyhow::Result<Session> {
    if !path.is_file() {
        anyhow::bail!("no such file");
    }

    // Initialize ORT environment (idempotent)
    let _ = ort::init().commit();

    #[allow(unused_mut)]
    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads.max(1))?;

    match provider {
        #[cfg(feature = "cuda")]
        ExecutionProvider::Cuda => {
            tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
            builder = builder.with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default()
                    .with_device_id(0)
                    .build()
                    .error_on_failure(),
            ])?;
        }
        #[cfg(not(feature = "cuda"))]
        ExecutionProvider::Cuda => {
            tracing::warn!("Built without the `cuda` feature, falling back to CPU");
        }
        ExecutionProvider::Cpu => {
            tracing::info!("Initializing ONNX Runtime with CPU execution provider");
        }
    }

    Ok(builder.commit_from_file(path)?)
}

impl InferenceBackend for OrtBackend {
    fn load_model(config: &ClassifierConfig) -> Result<Self> {
        Self::load_model_with_provider(
            &config.model_path,
            config.execution_provider,
            config.intra_threads,
        )
    }

    fn infer(&mut self, input: &ImageTensor) -> Result<Array2<f32>> {
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores = scores.into_dimensionality::<Ix2>().map_err(|e| {
            ClassifierError::Inference(format!("expected a 1 x N score matrix: {e}"))
        })?;

        Ok(scores.to_owned())
    }
}
