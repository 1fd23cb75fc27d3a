//! crowdtest-core: Core orchestration for persona evaluation panels
//!
//! This crate provides everything needed to run a panel of persona tasks
//! against a generative-response service, including:
//!
//! - Manifest loading and task resolution
//! - Prompt templates and the single-task executor
//! - The concurrency gate and batch orchestrator
//! - Keyword sentiment classification
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod manifest;
pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod resolver;
pub mod result;
pub mod sentiment;
pub mod sink;
pub mod traits;

pub use channel::ChannelConfig;
pub use config::*;
pub use error::*;
pub use executor::TaskExecutor;
pub use gate::{ConcurrencyGate, GatePermit};
pub use manifest::{Manifest, ManifestEntry, TaskDescriptor, MANIFEST_FILE};
pub use orchestrator::{
    summarize, BatchOutcome, BatchState, BatchSummary, Orchestrator, OrchestratorBuilder,
};
pub use prompt::PromptTemplates;
pub use request::*;
pub use resolver::{ResolvedTask, TaskResolver};
pub use result::*;
pub use sentiment::{classify, Sentiment};
pub use sink::{sink_fn, CompletionSink, FnSink};
pub use traits::*;
