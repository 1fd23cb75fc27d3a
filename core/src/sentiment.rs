//! Keyword-based sentiment classification of persona responses

use serde::{Deserialize, Serialize};

/// Phrases counted as positive cues
pub const POSITIVE_CUES: &[&str] = &[
    "love",
    "great",
    "amazing",
    "fantastic",
    "excellent",
    "perfect",
    "definitely",
    "would buy",
    "i'd buy",
    "sign me up",
    "excited",
    "awesome",
    "wonderful",
    "brilliant",
    "yes",
    "absolutely",
    "interested",
    "want",
    "need this",
    "can't wait",
    "impressive",
];

/// Phrases counted as negative cues
pub const NEGATIVE_CUES: &[&str] = &[
    "don't like",
    "wouldn't",
    "not interested",
    "dislike",
    "hate",
    "terrible",
    "awful",
    "no way",
    "pass",
    "skip",
    "not for me",
    "waste",
    "disappointed",
    "overpriced",
    "cheap",
    "wouldn't buy",
    "don't need",
    "not worth",
    "ugly",
    "boring",
];

/// Sentiment label attached to every task result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// More positive cues than negative
    Positive,
    /// More negative cues than positive
    Negative,
    /// Tie, including no cues at all
    #[default]
    Neutral,
}

impl Sentiment {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of distinct positive and negative cue phrases found in a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CueCounts {
    /// Positive phrases present
    pub positive: usize,
    /// Negative phrases present
    pub negative: usize,
}

/// Count cue phrases present in `text`, case-insensitively.
///
/// Each phrase counts at most once no matter how often it occurs.
pub fn count_cues(text: &str) -> CueCounts {
    let lower = text.to_lowercase();
    let present = |cues: &[&str]| cues.iter().filter(|cue| lower.contains(*cue)).count();

    CueCounts {
        positive: present(POSITIVE_CUES),
        negative: present(NEGATIVE_CUES),
    }
}

/// Classify a response text by comparing raw cue counts.
pub fn classify(text: &str) -> Sentiment {
    let counts = count_cues(text);
    if counts.positive > counts.negative {
        Sentiment::Positive
    } else if counts.negative > counts.positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
