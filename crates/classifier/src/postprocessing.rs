use crate::error::{ClassifierError, Result};
use ndarray::{ArrayView1, ArrayView2};

/// Winning class of one forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopClass {
    pub index: usize,
    /// Raw score of the winning class, as emitted by the model.
    pub confidence: f32,
}

/// Reduce a `1 x N` score matrix to its best class.
#[tracing::instrument(level = "trace", skip(scores), fields(shape = ?scores.shape()))]
pub fn top_class(scores: &ArrayView2<f32>) -> Result<TopClass> {
    if scores.nrows() != 1 {
        return Err(ClassifierError::Inference(format!(
            "expected a single row of class scores, got shape {:?}",
            scores.shape()
        )));
    }

    argmax(&scores.row(0)).ok_or_else(|| {
        ClassifierError::Inference("model produced no class scores".to_string())
    })
}

/// First-occurrence arg-max: on ties the lowest index wins.
///
/// A NaN ranks above every number, so the first NaN wins and is reported as the confidence.
pub fn argmax(scores: &ArrayView1<f32>) -> Option<TopClass> {
    let mut iter = scores.iter().copied().enumerate();
    let (mut index, mut confidence) = iter.next()?;

    if confidence.is_nan() {
        return Some(TopClass { index, confidence });
    }

    for (i, score) in iter {
        if score.is_nan() {
            return Some(TopClass {
                index: i,
                confidence: score,
            });
        }
        if score > confidence {
            index = i;
            confidence = score;
        }
    }

    Some(TopClass { index, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    #[test]
    fn test_picks_highest_score() {
        let scores = array![[0.05f32, 0.10, 0.70, 0.15]];

        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 2);
        assert_eq!(top.confidence, 0.70);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let scores = array![[0.1f32, 0.0, 0.4, 0.05, 0.0, 0.4, 0.05]];

        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 2, "Equal maxima at 2 and 5 should resolve to 2");
        assert_eq!(top.confidence, 0.4);
    }

    #[test]
    fn test_all_equal_scores_pick_first() {
        let scores = Array2::<f32>::from_elem((1, 38), 1.0 / 38.0);

        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 0);
    }

    #[test]
    fn test_confidence_is_not_rescaled() {
        // Logits instead of probabilities pass through untouched
        let scores = array![[-3.5f32, 7.25, 2.0]];

        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 1);
        assert_eq!(top.confidence, 7.25);

        let scores = array![[-3.5f32, -1.0, -2.0]];
        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 1);
        assert_eq!(top.confidence, -1.0);
    }

    #[test]
    fn test_first_nan_wins() {
        let scores = array![[0.9f32, f32::NAN, 0.1]];

        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 1, "NaN after a real maximum should still win");
        assert!(top.confidence.is_nan());

        let scores = array![[f32::NAN, 0.9]];
        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 0);
        assert!(top.confidence.is_nan());

        let scores = array![[0.3f32, f32::NAN, 0.8, f32::NAN]];
        let top = top_class(&scores.view()).unwrap();
        assert_eq!(top.index, 1, "Only the first NaN counts");
    }

    #[test]
    fn test_rejects_empty_output() {
        let scores = Array2::<f32>::zeros((1, 0));

        let err = top_class(&scores.view()).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }

    #[test]
    fn test_rejects_batched_output() {
        let scores = Array2::<f32>::zeros((2, 4));

        let err = top_class(&scores.view()).unwrap_err();
        assert!(err.to_string().contains("single row"));
    }
}
