//! Task inputs and results

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ERROR_MARKER_PREFIX};
use crate::sentiment::{classify, Sentiment};

/// Segment reported when a task has no tags
pub const UNKNOWN_SEGMENT: &str = "unknown";

/// Length of the task-id prefix used when no display name is known
pub const DISPLAY_NAME_PREFIX_LEN: usize = 12;

/// Display metadata copied from a manifest entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Age of the persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Segment tags; the first one is the primary segment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<String>,
}

impl TaskMetadata {
    /// Display name, falling back to a prefix of the task id
    pub fn display_name_or(&self, task_id: &str) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => task_id.chars().take(DISPLAY_NAME_PREFIX_LEN).collect(),
        }
    }

    /// Age, defaulting to 0
    pub fn age_or_default(&self) -> u32 {
        self.age.unwrap_or(0)
    }

    /// First segment tag, or `"unknown"`
    pub fn primary_segment(&self) -> &str {
        self.segments
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SEGMENT)
    }
}

/// A resolved, ready-to-execute task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    /// Opaque task identifier
    pub task_id: String,

    /// Full persona text
    pub persona: String,

    /// Display metadata
    pub metadata: TaskMetadata,
}

impl TaskInput {
    /// Create a new task input
    pub fn new(task_id: impl Into<String>, persona: impl Into<String>, metadata: TaskMetadata) -> Self {
        Self {
            task_id: task_id.into(),
            persona: persona.into(),
            metadata,
        }
    }
}

/// Outcome of a single task
///
/// Field names on the wire match the panel API consumed by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task identifier
    #[serde(rename = "agent_id")]
    pub task_id: String,

    /// Display name
    #[serde(rename = "profile_name")]
    pub display_name: String,

    /// Age of the persona (0 when unknown)
    pub age: u32,

    /// Primary segment
    pub segment: String,

    /// Response text, or an `[Error: <kind>]` marker
    pub response_text: String,

    /// Sentiment of the response (always neutral on failure)
    pub sentiment: Sentiment,

    /// Milliseconds spent in the task, rounded to one decimal
    pub response_time_ms: f64,
}

impl TaskResult {
    /// Build a successful result, classifying the response text
    pub fn success(
        task_id: &str,
        metadata: &TaskMetadata,
        response_text: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let response_text = response_text.into();
        let sentiment = classify(&response_text);
        Self {
            task_id: task_id.to_string(),
            display_name: metadata.display_name_or(task_id),
            age: metadata.age_or_default(),
            segment: metadata.primary_segment().to_string(),
            response_text,
            sentiment,
            response_time_ms: round_ms(elapsed),
        }
    }

    /// Build an error-marked result
    pub fn failure(
        task_id: &str,
        metadata: &TaskMetadata,
        kind: ErrorKind,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_id: task_id.to_string(),
            display_name: metadata.display_name_or(task_id),
            age: metadata.age_or_default(),
            segment: metadata.primary_segment().to_string(),
            response_text: kind.marker(),
            sentiment: Sentiment::Neutral,
            response_time_ms: round_ms(elapsed),
        }
    }

    /// Whether the response text carries an error marker
    pub fn is_error(&self) -> bool {
        self.response_text.starts_with(ERROR_MARKER_PREFIX)
    }

    /// Error kind encoded in the marker, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_marker(&self.response_text)
    }
}

/// Milliseconds rounded to one decimal place
pub fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 10_000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> TaskMetadata {
        TaskMetadata {
            display_name: Some("Maja".into()),
            age: Some(34),
            segments: vec!["trend_seeker".into(), "sale_shopper".into()],
        }
    }

    #[test]
    fn test_metadata_defaults() {
        let empty = TaskMetadata::default();
        assert_eq!(empty.display_name_or("0123456789abcdef"), "0123456789ab");
        assert_eq!(empty.display_name_or("short"), "short");
        assert_eq!(empty.age_or_default(), 0);
        assert_eq!(empty.primary_segment(), "unknown");
    }

    #[test]
    fn test_success_result() {
        let result = TaskResult::success(
            "c-1",
            &metadata(),
            "I love it, sign me up",
            Duration::from_micros(1_234_567),
        );

        assert_eq!(result.display_name, "Maja");
        assert_eq!(result.age, 34);
        assert_eq!(result.segment, "trend_seeker");
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.response_time_ms, 1234.6);
        assert!(!result.is_error());
        assert_eq!(result.error_kind(), None);
    }

    #[test]
    fn test_failure_result() {
        let result = TaskResult::failure(
            "c-2",
            &TaskMetadata::default(),
            ErrorKind::CallFailed,
            Duration::from_millis(15),
        );

        assert_eq!(result.response_text, "[Error: CallFailed]");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.segment, "unknown");
        assert_eq!(result.response_time_ms, 15.0);
        assert!(result.is_error());
        assert_eq!(result.error_kind(), Some(ErrorKind::CallFailed));
    }

    #[test]
    fn test_failure_never_classified() {
        // the marker text is not scored even if it were to contain cue words
        let result = TaskResult::failure(
            "c-3",
            &metadata(),
            ErrorKind::UnexpectedFailure,
            Duration::ZERO,
        );
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.response_time_ms, 0.0);
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(Duration::from_micros(1_049)), 1.0);
        assert_eq!(round_ms(Duration::from_micros(1_060)), 1.1);
        assert_eq!(round_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_result_json_format() {
        let result = TaskResult::success("c-1", &metadata(), "Okay", Duration::from_millis(2));
        let json = serde_json::to_string(&result).unwrap();

        assert!(json.contains("\"agent_id\":\"c-1\""));
        assert!(json.contains("\"profile_name\":\"Maja\""));
        assert!(json.contains("\"sentiment\":\"neutral\""));
        assert!(json.contains("\"response_time_ms\":2.0"));
    }
}
