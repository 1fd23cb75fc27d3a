//! Sentiment and segment breakdowns over a batch
//!
//! Error-marked results are excluded: they carry a neutral label that says
//! nothing about the persona's reaction.

use crowdtest_core::{Sentiment, TaskResult};
use serde::{Deserialize, Serialize};

/// Number of quotes kept per segment
pub const KEY_QUOTES_PER_SEGMENT: usize = 3;

/// Sentiment counts and percentages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    /// Positive responses
    pub positive: usize,
    /// Neutral responses
    pub neutral: usize,
    /// Negative responses
    pub negative: usize,
    /// Share of positive responses, percent with one decimal
    pub positive_pct: f64,
    /// Share of neutral responses, percent with one decimal
    pub neutral_pct: f64,
    /// Share of negative responses, percent with one decimal
    pub negative_pct: f64,
}

impl SentimentBreakdown {
    /// Count the non-error results
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TaskResult>) -> Self {
        let mut breakdown = Self::default();
        for result in results.into_iter().filter(|r| !r.is_error()) {
            match result.sentiment {
                Sentiment::Positive => breakdown.positive += 1,
                Sentiment::Neutral => breakdown.neutral += 1,
                Sentiment::Negative => breakdown.negative += 1,
            }
        }

        let total = breakdown.total();
        breakdown.positive_pct = percent(breakdown.positive, total);
        breakdown.neutral_pct = percent(breakdown.neutral, total);
        breakdown.negative_pct = percent(breakdown.negative, total);
        breakdown
    }

    /// Responses counted
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Overall leaning: a label wins only with a strict plurality
    pub fn dominant(&self) -> Leaning {
        if self.positive > self.negative && self.positive > self.neutral {
            Leaning::Positive
        } else if self.negative > self.positive && self.negative > self.neutral {
            Leaning::Negative
        } else {
            Leaning::Mixed
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Dominant reaction within a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leaning {
    /// Positive plurality
    Positive,
    /// Negative plurality
    Negative,
    /// No strict plurality
    Mixed,
}

/// Per-segment summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// Segment name (the results' primary segment)
    pub segment_name: String,
    /// Non-error responses in the segment
    pub count: usize,
    /// Dominant reaction
    pub sentiment: Leaning,
    /// Counts within the segment
    pub breakdown: SentimentBreakdown,
    /// A few response texts from the segment
    pub key_quotes: Vec<String>,
}

/// Group results by segment, in order of first appearance
pub fn segment_summaries(results: &[TaskResult]) -> Vec<SegmentSummary> {
    let mut order: Vec<&str> = Vec::new();
    for result in results.iter().filter(|r| !r.is_error()) {
        if !order.contains(&result.segment.as_str()) {
            order.push(&result.segment);
        }
    }

    order
        .into_iter()
        .map(|segment| {
            let members: Vec<&TaskResult> = results
                .iter()
                .filter(|r| !r.is_error() && r.segment == segment)
                .collect();
            let breakdown = SentimentBreakdown::from_results(members.iter().copied());

            SegmentSummary {
                segment_name: segment.to_string(),
                count: members.len(),
                sentiment: breakdown.dominant(),
                key_quotes: members
                    .iter()
                    .take(KEY_QUOTES_PER_SEGMENT)
                    .map(|r| r.response_text.clone())
                    .collect(),
                breakdown,
            }
        })
        .collect()
}
