//! Keyword-lexicon reference classifier.
//!
//! Each label owns a list of keywords. A text's tokens are matched against
//! every list; each hit adds [`HIT_WEIGHT`] to the label's logit, and the
//! logits go through a softmax. `neutral` carries a small prior so that a
//! text matching nothing is neutral.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use em_common::EmotionLabel;

use super::{ClassDistribution, ClassificationOracle, InferenceError};

/// Logit added per keyword hit.
pub const HIT_WEIGHT: f64 = 2.0;

/// Logit of `neutral` before any hit.
pub const NEUTRAL_PRIOR: f64 = 0.5;

const BUILTIN: &[(EmotionLabel, &[&str])] = &[
    (
        EmotionLabel::Anger,
        &[
            "angry", "anger", "furious", "mad", "rage", "annoyed", "irritated", "hate", "outraged",
        ],
    ),
    (
        EmotionLabel::Disgust,
        &[
            "disgust", "disgusting", "gross", "nasty", "revolting", "sickening", "yuck", "vile",
        ],
    ),
    (
        EmotionLabel::Fear,
        &[
            "afraid", "scared", "fear", "terrified", "anxious", "nervous", "worried", "panic",
            "frightened",
        ],
    ),
    (
        EmotionLabel::Happy,
        &[
            "happy", "glad", "pleased", "cheerful", "delighted", "great", "wonderful", "content",
            "grateful",
        ],
    ),
    (
        EmotionLabel::Joy,
        &[
            "joy", "joyful", "laugh", "laughing", "fun", "hilarious", "haha", "lol", "celebrate",
            "excited",
        ],
    ),
    (EmotionLabel::Neutral, &["okay", "fine", "normal", "usual", "meh"]),
    (EmotionLabel::Sad, &["sad", "unhappy", "down", "crying", "cry", "tears", "upset", "lonely"]),
    (
        EmotionLabel::Sadness,
        &[
            "sadness", "grief", "sorrow", "miserable", "heartbroken", "depressed", "hopeless",
            "mourning",
        ],
    ),
    (
        EmotionLabel::Shame,
        &[
            "ashamed", "shame", "embarrassed", "guilty", "humiliated", "regret", "mortified",
        ],
    ),
    (
        EmotionLabel::Surprise,
        &[
            "surprised", "surprise", "shocked", "amazed", "astonished", "unexpected", "wow",
            "stunned",
        ],
    ),
];

/// Deterministic keyword classifier over the full label set.
#[derive(Debug, Clone)]
pub struct LexiconOracle {
    keywords: HashMap<String, Vec<EmotionLabel>>,
}

impl Default for LexiconOracle {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LexiconOracle {
    /// The built-in English lexicon.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN
                .iter()
                .map(|(label, words)| (*label, words.iter().map(|w| w.to_string()).collect())),
        )
    }

    /// Build from `label -> keywords` entries. Keywords are lowercased.
    pub fn from_entries(entries: impl IntoIterator<Item = (EmotionLabel, Vec<String>)>) -> Self {
        let mut keywords: HashMap<String, Vec<EmotionLabel>> = HashMap::new();
        for (label, words) in entries {
            for word in words {
                let labels = keywords.entry(word.trim().to_lowercase()).or_default();
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }
        LexiconOracle { keywords }
    }

    /// Load a JSON object mapping label names to keyword arrays.
    pub fn from_json_file(path: &Path) -> em_common::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            em_common::Error::InvalidLexicon(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
            .map_err(|e| em_common::Error::InvalidLexicon(format!("{}: {}", path.display(), e)))
    }

    /// Parse a JSON lexicon.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let entries: BTreeMap<EmotionLabel, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Number of distinct keywords.
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    fn logits(&self, text: &str) -> Result<[f64; 10], InferenceError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(InferenceError::EmptyInput);
        }

        let mut logits = [0.0; 10];
        logits[class_index(EmotionLabel::Neutral)] = NEUTRAL_PRIOR;
        for token in &tokens {
            if let Some(labels) = self.keywords.get(token) {
                for label in labels {
                    logits[class_index(*label)] += HIT_WEIGHT;
                }
            }
        }
        Ok(logits)
    }
}

impl ClassificationOracle for LexiconOracle {
    fn labels(&self) -> &[EmotionLabel] {
        &EmotionLabel::ALL
    }

    fn classify(&self, text: &str) -> Result<EmotionLabel, InferenceError> {
        Ok(self.class_distribution(text)?.argmax())
    }

    fn class_distribution(&self, text: &str) -> Result<ClassDistribution, InferenceError> {
        let probabilities = softmax(&self.logits(text)?);
        ClassDistribution::new(EmotionLabel::ALL.into_iter().zip(probabilities))
    }
}

/// Lowercased alphanumeric runs.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn class_index(label: EmotionLabel) -> usize {
    EmotionLabel::ALL
        .iter()
        .position(|l| *l == label)
        .unwrap_or_default()
}

fn softmax(logits: &[f64; 10]) -> [f64; 10] {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out = logits.map(|l| (l - max).exp());
    let total: f64 = out.iter().sum();
    for p in &mut out {
        *p /= total;
    }
    out
}
