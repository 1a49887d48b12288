pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod postprocessing;
pub mod preprocessing;

// Re-export commonly used types for convenience
pub use backend::InferenceBackend;
#[cfg(feature = "ort-backend")]
pub use backend::ort::OrtBackend;
pub use config::ClassifierConfig;
pub use context::{InferenceContext, PredictionResult};
pub use error::{ClassifierError, ErrorKind};
pub use labels::{ClassIndexMap, UNKNOWN_DISEASE};
pub use preprocessing::{ImageTensor, transform};
