use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::preprocessing::ImageTensor;
use ndarray::Array2;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

pub trait InferenceBackend {
    /// Load the model named by `config.model_path`.
    fn load_model(config: &ClassifierConfig) -> Result<Self>
    where
        Self: Sized;

    /// Run one forward pass and return the `1 x N` class scores.
    fn infer(&mut self, input: &ImageTensor) -> Result<Array2<f32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionProvider::Cpu => "cpu",
            ExecutionProvider::Cuda => "cuda",
        }
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            other => Err(format!(
                "{other} is not a supported execution provider. Use either `cpu` or `cuda`."
            )),
        }
    }
}
