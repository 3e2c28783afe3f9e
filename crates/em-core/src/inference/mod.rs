//! Classification oracle contract.
//!
//! The monitor treats the classifier as a black box that maps text to a
//! label and to a probability distribution over a fixed label set. The
//! stored confidence of a prediction is the maximum of that distribution,
//! so [`ClassificationOracle::predict`] refuses to produce a prediction
//! whose label is not an argmax of its distribution.

pub mod lexicon;

pub use lexicon::LexiconOracle;

use em_common::EmotionLabel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for distribution sums and argmax comparisons.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Errors from a classification oracle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("invalid class distribution: {0}")]
    InvalidDistribution(String),

    #[error("classifier returned {label} but the most probable class is {argmax}")]
    InconsistentLabel {
        label: EmotionLabel,
        argmax: EmotionLabel,
    },
}

impl From<InferenceError> for em_common::Error {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::InvalidDistribution(reason) => {
                em_common::Error::InvalidDistribution(reason)
            }
            other => em_common::Error::InferenceFailure(other.to_string()),
        }
    }
}

/// Probability of one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: EmotionLabel,
    pub probability: f64,
}

/// A validated probability distribution over distinct labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDistribution {
    classes: Vec<ClassProbability>,
}

impl ClassDistribution {
    /// Validate and wrap `(label, probability)` pairs.
    ///
    /// Requires at least one class, no repeated label, every probability
    /// finite and in [0, 1], and a total of 1 within
    /// [`DISTRIBUTION_TOLERANCE`].
    pub fn new(
        pairs: impl IntoIterator<Item = (EmotionLabel, f64)>,
    ) -> Result<Self, InferenceError> {
        let classes: Vec<ClassProbability> = pairs
            .into_iter()
            .map(|(label, probability)| ClassProbability { label, probability })
            .collect();

        if classes.is_empty() {
            return Err(InferenceError::InvalidDistribution(
                "no classes".to_string(),
            ));
        }
        for (i, class) in classes.iter().enumerate() {
            if !class.probability.is_finite() || !(0.0..=1.0).contains(&class.probability) {
                return Err(InferenceError::InvalidDistribution(format!(
                    "probability of {} is {}",
                    class.label, class.probability
                )));
            }
            if classes[..i].iter().any(|c| c.label == class.label) {
                return Err(InferenceError::InvalidDistribution(format!(
                    "label {} appears twice",
                    class.label
                )));
            }
        }
        let total: f64 = classes.iter().map(|c| c.probability).sum();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(InferenceError::InvalidDistribution(format!(
                "probabilities sum to {}",
                total
            )));
        }

        Ok(ClassDistribution { classes })
    }

    /// Probability of `label`, if it is in the label set.
    pub fn get(&self, label: EmotionLabel) -> Option<f64> {
        self.classes
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.probability)
    }

    /// The largest probability.
    pub fn max(&self) -> f64 {
        self.classes
            .iter()
            .map(|c| c.probability)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The most probable label; the earliest class wins ties.
    pub fn argmax(&self) -> EmotionLabel {
        let max = self.max();
        self.classes
            .iter()
            .find(|c| c.probability == max)
            .map(|c| c.label)
            .unwrap_or(self.classes[0].label)
    }

    /// Whether `label` is within tolerance of the maximum.
    pub fn is_argmax(&self, label: EmotionLabel) -> bool {
        self.get(label)
            .is_some_and(|p| self.max() - p <= DISTRIBUTION_TOLERANCE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassProbability> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// A label together with the distribution it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: EmotionLabel,
    /// `max` of `distribution`.
    pub confidence: f64,
    pub distribution: ClassDistribution,
}

/// A text classifier over a fixed label set.
///
/// Implementations must be deterministic: the same text against the same
/// model always yields the same label and distribution.
pub trait ClassificationOracle: Send + Sync {
    /// The fixed label set, in class order.
    fn labels(&self) -> &[EmotionLabel];

    /// Most likely label for `text`.
    fn classify(&self, text: &str) -> Result<EmotionLabel, InferenceError>;

    /// Probabilities over every label for `text`.
    fn class_distribution(&self, text: &str) -> Result<ClassDistribution, InferenceError>;

    /// Label, distribution, and confidence in one call.
    fn predict(&self, text: &str) -> Result<Prediction, InferenceError> {
        let label = self.classify(text)?;
        let distribution = self.class_distribution(text)?;
        if !distribution.is_argmax(label) {
            return Err(InferenceError::InconsistentLabel {
                label,
                argmax: distribution.argmax(),
            });
        }
        Ok(Prediction {
            label,
            confidence: distribution.max(),
            distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOracle {
        label: EmotionLabel,
        pairs: Vec<(EmotionLabel, f64)>,
    }

    impl ClassificationOracle for FixedOracle {
        fn labels(&self) -> &[EmotionLabel] {
            &EmotionLabel::ALL
        }

        fn classify(&self, _text: &str) -> Result<EmotionLabel, InferenceError> {
            Ok(self.label)
        }

        fn class_distribution(&self, _text: &str) -> Result<ClassDistribution, InferenceError> {
            ClassDistribution::new(self.pairs.clone())
        }
    }

    #[test]
    fn test_distribution_validation() {
        assert!(ClassDistribution::new(Vec::new()).is_err());
        assert!(ClassDistribution::new([(EmotionLabel::Joy, 0.7)]).is_err());
        assert!(
            ClassDistribution::new([(EmotionLabel::Joy, 1.2), (EmotionLabel::Sad, -0.2)]).is_err()
        );
        assert!(ClassDistribution::new([(EmotionLabel::Joy, f64::NAN)]).is_err());
        assert!(
            ClassDistribution::new([(EmotionLabel::Joy, 0.5), (EmotionLabel::Joy, 0.5)]).is_err()
        );
        let ok = ClassDistribution::new([(EmotionLabel::Joy, 0.25), (EmotionLabel::Sad, 0.75)])
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.get(EmotionLabel::Sad), Some(0.75));
        assert_eq!(ok.get(EmotionLabel::Fear), None);
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        let d = ClassDistribution::new([
            (EmotionLabel::Fear, 0.4),
            (EmotionLabel::Anger, 0.4),
            (EmotionLabel::Joy, 0.2),
        ])
        .unwrap();
        assert_eq!(d.argmax(), EmotionLabel::Fear);
        assert!(d.is_argmax(EmotionLabel::Anger));
        assert!(!d.is_argmax(EmotionLabel::Joy));
        assert_eq!(d.max(), 0.4);
    }

    #[test]
    fn test_predict_confidence_is_max() {
        let oracle = FixedOracle {
            label: EmotionLabel::Happy,
            pairs: vec![(EmotionLabel::Happy, 0.8), (EmotionLabel::Sad, 0.2)],
        };
        let prediction = oracle.predict("anything").unwrap();
        assert_eq!(prediction.label, EmotionLabel::Happy);
        assert_eq!(prediction.confidence, 0.8);
    }

    #[test]
    fn test_predict_rejects_label_that_is_not_argmax() {
        let oracle = FixedOracle {
            label: EmotionLabel::Sad,
            pairs: vec![(EmotionLabel::Happy, 0.8), (EmotionLabel::Sad, 0.2)],
        };
        let err = oracle.predict("anything").unwrap_err();
        assert_eq!(
            err,
            InferenceError::InconsistentLabel {
                label: EmotionLabel::Sad,
                argmax: EmotionLabel::Happy,
            }
        );
    }

    #[test]
    fn test_error_mapping() {
        let err: em_common::Error = InferenceError::EmptyInput.into();
        assert_eq!(err.code(), 30);
        let err: em_common::Error = InferenceError::InvalidDistribution("x".into()).into();
        assert_eq!(err.code(), 31);
    }
}
