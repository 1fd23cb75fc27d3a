//! Orchestrator for batch lifecycle management
//!
//! The Orchestrator coordinates one persona panel batch:
//! - Spawning one unit per task
//! - Bounding concurrent calls via the concurrency gate
//! - Converting lost units into error-marked results
//! - Notifying a completion sink and returning ordered results
//!
//! # Example
//!
//! ```ignore
//! use crowdtest_core::{sink_fn, OrchestratorBuilder};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .concurrency(10)
//!     .client(client)
//!     .build()?;
//!
//! let outcome = orchestrator
//!     .run_from_manifest("A linen shirt", Some(sink_fn(|r| println!("{}", r.task_id))))
//!     .await?;
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{summarize, BatchOutcome, BatchSummary};
pub use builder::OrchestratorBuilder;
pub use executor::{BatchState, Orchestrator};

#[cfg(test)]
mod tests;
