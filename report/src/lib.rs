//! Report generation for panel results
//!
//! This crate provides:
//!
//! - Sentiment breakdowns (overall and per segment)
//! - A serializable batch report
//! - JSON export

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod breakdown;
pub mod export;

pub use breakdown::{segment_summaries, Leaning, SegmentSummary, SentimentBreakdown};
pub use export::{BatchReport, JsonExporter};
