//! Batch summary aggregation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::TaskResult;

/// Counters describing a finished batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of results (equals the number of submitted tasks)
    pub total: usize,

    /// Results carrying an error marker
    pub failures: usize,

    /// Wall-clock time of the whole batch
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Mean per-task response time over all results, in milliseconds
    pub mean_response_ms: f64,
}

impl BatchSummary {
    /// Successful results
    pub fn succeeded(&self) -> usize {
        self.total - self.failures
    }

    /// Get the success rate (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            self.succeeded() as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Get the failure rate (0.0 - 1.0)
    pub fn failure_rate(&self) -> f64 {
        if self.total > 0 {
            self.failures as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Batch wall-clock time divided by task count, in milliseconds
    pub fn wall_ms_per_task(&self) -> f64 {
        if self.total > 0 {
            self.duration.as_secs_f64() * 1000.0 / self.total as f64
        } else {
            0.0
        }
    }
}

/// Summarize an ordered batch of results
pub fn summarize(results: &[TaskResult], duration: Duration) -> BatchSummary {
    let total = results.len();
    let failures = results.iter().filter(|r| r.is_error()).count();
    let mean_response_ms = if total > 0 {
        results.iter().map(|r| r.response_time_ms).sum::<f64>() / total as f64
    } else {
        0.0
    };

    BatchSummary {
        total,
        failures,
        duration,
        mean_response_ms,
    }
}

/// Everything a batch run returns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// One result per submitted task, in submission order
    pub results: Vec<TaskResult>,

    /// Counters over `results`
    pub summary: BatchSummary,
}

impl BatchOutcome {
    /// Results carrying an error marker
    pub fn failed(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| r.is_error())
    }
}
