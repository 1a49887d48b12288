use crate::{
    backend::InferenceBackend,
    config::ClassifierConfig,
    error::Result,
    labels::ClassIndexMap,
    metrics::PredictionMetrics,
    postprocessing::top_class,
    preprocessing::{ImageTensor, transform},
};
use common::span;
use serde::Serialize;
use std::time::Instant;

/// Outcome of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub disease_name: String,
    /// Score of the winning class exactly as the model emitted it.
    pub confidence: f32,
}

/// Label map and model, loaded once and reused for every prediction.
///
/// `predict` needs `&mut self` because a model session runs one forward pass at a
/// time. Hosts serving several threads share the context behind a `Mutex`.
pub struct InferenceContext<B: InferenceBackend> {
    labels: ClassIndexMap,
    backend: B,
    input_size: (u32, u32),
    metrics: PredictionMetrics,
}

impl<B: InferenceBackend> InferenceContext<B> {
    /// Load the class index map and the model named in `config`.
    ///
    /// Any error here is fatal: the host must not start serving.
    pub fn initialize(config: &ClassifierConfig) -> Result<Self> {
        let _s = span!("initialize");

        let labels = ClassIndexMap::load(&config.class_indices_path)?;

        tracing::info!(
            model_path = %config.model_path.display(),
            provider = %config.execution_provider,
            "Loading classification model"
        );
        let backend = B::load_model(config)?;

        Ok(Self::new(labels, backend, config.input_size))
    }

    pub fn new(labels: ClassIndexMap, backend: B, input_size: (u32, u32)) -> Self {
        Self {
            labels,
            backend,
            input_size,
            metrics: PredictionMetrics::default(),
        }
    }

    /// Classify encoded image bytes (JPEG, PNG, ...).
    pub fn predict(&mut self, image_bytes: &[u8]) -> Result<PredictionResult> {
        let start = Instant::now();

        let result = transform(image_bytes, self.input_size.0, self.input_size.1)
            .and_then(|tensor| self.run(&tensor));

        match &result {
            Ok(prediction) => {
                self.metrics.record_success(start.elapsed().as_secs_f64());
                tracing::debug!(
                    disease = %prediction.disease_name,
                    confidence = prediction.confidence,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Image classified"
                );
            }
            Err(e) => {
                self.metrics.record_failure(e.kind());
                tracing::warn!(error = %e, kind = e.kind().as_str(), "Prediction failed");
            }
        }

        result
    }

    /// Run the model on an already preprocessed image.
    pub fn run(&mut self, tensor: &ImageTensor) -> Result<PredictionResult> {
        debug_assert_eq!(
            tensor.size(),
            self.input_size,
            "tensor was not preprocessed for this model"
        );

        let scores = {
            let _s = span!("model_inference");
            self.backend.infer(tensor)?
        };

        let top = top_class(&scores.view())?;

        Ok(PredictionResult {
            disease_name: self.lookup(top.index as i64).to_string(),
            confidence: top.confidence,
        })
    }

    /// Label for a class index, `"Unknown Disease"` when unmapped.
    pub fn lookup(&self, index: i64) -> &str {
        self.labels.lookup(index)
    }

    pub fn labels(&self) -> &ClassIndexMap {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::labels::UNKNOWN_DISEASE;
    use crate::preprocessing::DEFAULT_INPUT_SIZE;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use ndarray::Array2;
    use std::io::Cursor;

    /// Returns the same scores for every input and counts its calls.
    struct FixedScores {
        scores: Vec<f32>,
        calls: usize,
    }

    impl InferenceBackend for FixedScores {
        fn load_model(_config: &ClassifierConfig) -> Result<Self> {
            Ok(Self {
                scores: vec![0.1, 0.9],
                calls: 0,
            })
        }

        fn infer(&mut self, input: &ImageTensor) -> Result<Array2<f32>> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            self.calls += 1;
            Ok(Array2::from_shape_vec((1, self.scores.len()), self.scores.clone()).unwrap())
        }
    }

    fn context(scores: Vec<f32>) -> InferenceContext<FixedScores> {
        let labels: ClassIndexMap = [
            (0, "Corn___Common_rust".to_string()),
            (1, "Corn___healthy".to_string()),
            (2, "Grape___Black_rot".to_string()),
            (3, "Potato___Early_blight".to_string()),
            (4, "Potato___healthy".to_string()),
            (5, "Tomato___Leaf_Mold".to_string()),
        ]
        .into_iter()
        .collect();

        InferenceContext::new(labels, FixedScores { scores, calls: 0 }, DEFAULT_INPUT_SIZE)
    }

    fn black_png() -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(224, 224))
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_predict_maps_argmax_to_label() {
        let mut ctx = context(vec![0.01, 0.02, 0.9, 0.03, 0.02, 0.02]);

        let result = ctx.predict(&black_png()).unwrap();
        assert_eq!(result.disease_name, "Grape___Black_rot");
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_tie_selects_lower_index() {
        let mut ctx = context(vec![0.0, 0.1, 0.35, 0.1, 0.1, 0.35]);

        let result = ctx.predict(&black_png()).unwrap();
        assert_eq!(result.disease_name, "Grape___Black_rot");
        assert_eq!(result.confidence, 0.35);
    }

    #[test]
    fn test_index_beyond_label_map_is_unknown() {
        let mut scores = vec![0.0; 10];
        scores[8] = 0.7;
        let mut ctx = context(scores);

        let result = ctx.predict(&black_png()).unwrap();
        assert_eq!(result.disease_name, UNKNOWN_DISEASE);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_decode_failure_skips_the_model() {
        let mut ctx = context(vec![1.0]);

        let err = ctx.predict(b"{\"not\": \"an image\"}").unwrap_err();
        assert!(matches!(err, ClassifierError::Decode(_)));
        assert_eq!(ctx.backend.calls, 0, "Model must not run on a failed decode");
    }

    #[test]
    fn test_lookup_delegates_to_label_map() {
        let ctx = context(vec![1.0]);

        assert_eq!(ctx.lookup(4), "Potato___healthy");
        assert_eq!(ctx.lookup(-1), UNKNOWN_DISEASE);
        assert_eq!(ctx.lookup(6), UNKNOWN_DISEASE);
        assert_eq!(ctx.labels().len(), 6);
    }

    #[test]
    fn test_result_serializes_to_wire_shape() {
        let result = PredictionResult {
            disease_name: "Tomato___Leaf_Mold".to_string(),
            confidence: 0.5,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"disease_name": "Tomato___Leaf_Mold", "confidence": 0.5})
        );
    }

    #[test]
    fn test_initialize_fails_without_label_map() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig::with_paths(
            dir.path().join("model.onnx"),
            dir.path().join("class_indices.json"),
        );

        let err = InferenceContext::<FixedScores>::initialize(&config)
            .err()
            .unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Startup);
    }
}
