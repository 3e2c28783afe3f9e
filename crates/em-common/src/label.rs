//! Emotion labels produced by the classifier.
//!
//! The label set is closed: every label has exactly one emoji and display
//! name, so presentation code can never hit an unmapped label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed emotion classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Anger,
    Disgust,
    Fear,
    Happy,
    Joy,
    Neutral,
    Sad,
    Sadness,
    Shame,
    Surprise,
}

impl EmotionLabel {
    /// All labels in the classifier's class order.
    pub const ALL: [EmotionLabel; 10] = [
        EmotionLabel::Anger,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Joy,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Sadness,
        EmotionLabel::Shame,
        EmotionLabel::Surprise,
    ];

    /// Stored form of the label (the `prediction` column).
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Anger => "anger",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Joy => "joy",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Shame => "shame",
            EmotionLabel::Surprise => "surprise",
        }
    }

    /// Emoji shown next to a detected emotion.
    pub fn emoji(&self) -> &'static str {
        match self {
            EmotionLabel::Anger => "😠",
            EmotionLabel::Disgust => "🤮",
            EmotionLabel::Fear => "😨",
            EmotionLabel::Happy => "🤗",
            EmotionLabel::Joy => "😂",
            EmotionLabel::Neutral => "😐",
            EmotionLabel::Sad | EmotionLabel::Sadness => "😔",
            EmotionLabel::Shame => "😳",
            EmotionLabel::Surprise => "😮",
        }
    }

    /// Capitalized name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            EmotionLabel::Anger => "Anger",
            EmotionLabel::Disgust => "Disgust",
            EmotionLabel::Fear => "Fear",
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Joy => "Joy",
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Sadness => "Sadness",
            EmotionLabel::Shame => "Shame",
            EmotionLabel::Surprise => "Surprise",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string names no known label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == lowered)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}
