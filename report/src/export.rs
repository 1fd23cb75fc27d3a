//! Batch report and JSON export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crowdtest_core::{BatchOutcome, BatchSummary, TaskResult};
use serde::{Deserialize, Serialize};

use crate::breakdown::{segment_summaries, SegmentSummary, SentimentBreakdown};

/// Everything known about one panel run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Product description the panel evaluated
    pub product_description: String,

    /// When the report was built
    pub created_at: DateTime<Utc>,

    /// Batch counters
    pub summary: BatchSummary,

    /// Sentiment over all non-error responses
    pub sentiment_breakdown: SentimentBreakdown,

    /// Per-segment summaries
    pub segments: Vec<SegmentSummary>,

    /// Number of tasks in the batch
    pub total_agents: usize,

    /// Share of tasks that produced a response (0.0 - 1.0)
    pub response_rate: f64,

    /// Results in submission order
    pub responses: Vec<TaskResult>,
}

impl BatchReport {
    /// Build a report from a finished batch
    pub fn new(product_description: impl Into<String>, outcome: &BatchOutcome) -> Self {
        Self {
            product_description: product_description.into(),
            created_at: Utc::now(),
            summary: outcome.summary.clone(),
            sentiment_breakdown: SentimentBreakdown::from_results(&outcome.results),
            segments: segment_summaries(&outcome.results),
            total_agents: outcome.summary.total,
            response_rate: outcome.summary.success_rate(),
            responses: outcome.results.clone(),
        }
    }
}

/// Writes reports as pretty-printed JSON
pub struct JsonExporter;

impl JsonExporter {
    /// Export a report to `path`
    pub fn export(report: &BatchReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;

        Ok(())
    }
}
