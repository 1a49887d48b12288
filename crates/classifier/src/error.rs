use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`ClassifierError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Model or label map could not be loaded. The process must not serve.
    Startup,
    /// The caller sent something that cannot be classified.
    Request,
    /// Broken contract between preprocessing and the model.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Startup => "startup",
            ErrorKind::Request => "request",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed class index file {}: {reason}", path.display())]
    LabelMap { path: PathBuf, reason: String },

    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("decoded image has zero width or height")]
    EmptyImage,

    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl ClassifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::Io { .. }
            | ClassifierError::LabelMap { .. }
            | ClassifierError::ModelLoad { .. } => ErrorKind::Startup,
            ClassifierError::Decode(_) | ClassifierError::EmptyImage => ErrorKind::Request,
            ClassifierError::Preprocess(_) | ClassifierError::Inference(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = ClassifierError::Io {
            path: PathBuf::from("models/class_indices.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read models/class_indices.json: file not found",
            "Io should name the path and the cause"
        );

        let err = ClassifierError::LabelMap {
            path: PathBuf::from("labels.json"),
            reason: "key \"x\" is not a non-negative integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed class index file labels.json: key \"x\" is not a non-negative integer"
        );

        assert_eq!(
            ClassifierError::EmptyImage.to_string(),
            "decoded image has zero width or height"
        );
    }

    #[test]
    fn test_error_kinds() {
        let startup = ClassifierError::ModelLoad {
            path: PathBuf::from("model.onnx"),
            reason: "bad protobuf".to_string(),
        };
        assert_eq!(startup.kind(), ErrorKind::Startup);

        let decode = image::load_from_memory(b"definitely not an image").unwrap_err();
        let request: ClassifierError = decode.into();
        assert_eq!(request.kind(), ErrorKind::Request);
        assert!(matches!(request, ClassifierError::Decode(_)));

        assert_eq!(ClassifierError::EmptyImage.kind(), ErrorKind::Request);
        assert_eq!(
            ClassifierError::Inference("empty output".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }
}
