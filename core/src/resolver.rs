//! Task resolution
//!
//! Turns manifest descriptors into executable task inputs by reading each
//! persona file. A descriptor whose content cannot be found is kept in place
//! as [`ResolvedTask::Missing`] so the batch keeps its manifest order.

use std::path::{Path, PathBuf};

use crate::error::PanelResult;
use crate::manifest::{Manifest, TaskDescriptor};
use crate::result::{TaskInput, TaskMetadata};

/// Outcome of resolving one manifest descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTask {
    /// Persona text was read
    Ready(TaskInput),

    /// No candidate location could be read
    Missing {
        /// Task identifier
        task_id: String,
        /// Display metadata from the manifest
        metadata: TaskMetadata,
        /// Which locations were tried
        reason: String,
    },
}

impl ResolvedTask {
    /// Task identifier
    pub fn task_id(&self) -> &str {
        match self {
            ResolvedTask::Ready(input) => &input.task_id,
            ResolvedTask::Missing { task_id, .. } => task_id,
        }
    }

    /// Display metadata
    pub fn metadata(&self) -> &TaskMetadata {
        match self {
            ResolvedTask::Ready(input) => &input.metadata,
            ResolvedTask::Missing { metadata, .. } => metadata,
        }
    }

    /// Whether the persona text was found
    pub fn is_ready(&self) -> bool {
        matches!(self, ResolvedTask::Ready(_))
    }
}

/// Resolves a processed-content directory into an ordered task list
#[derive(Debug, Clone)]
pub struct TaskResolver {
    manifest_dir: PathBuf,
    ceiling: Option<usize>,
}

impl TaskResolver {
    /// Create a resolver for the directory holding `manifest.json`
    pub fn new(manifest_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest_dir: manifest_dir.into(),
            ceiling: None,
        }
    }

    /// Keep only the first `ceiling` manifest entries
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Load the manifest and resolve every retained entry
    ///
    /// Fails only when the manifest itself cannot be loaded.
    pub fn resolve(&self) -> PanelResult<Vec<ResolvedTask>> {
        let manifest = Manifest::load(&self.manifest_dir)?;
        Ok(self.resolve_manifest(&manifest))
    }

    /// Resolve the entries of an already loaded manifest
    pub fn resolve_manifest(&self, manifest: &Manifest) -> Vec<ResolvedTask> {
        let limit = self.ceiling.unwrap_or(usize::MAX);
        let tasks: Vec<_> = manifest
            .descriptors()
            .iter()
            .take(limit)
            .map(|descriptor| self.resolve_one(descriptor))
            .collect();

        let missing = tasks.iter().filter(|t| !t.is_ready()).count();
        tracing::info!(
            dir = %self.manifest_dir.display(),
            manifest_entries = manifest.len(),
            resolved = tasks.len() - missing,
            missing,
            "Resolved tasks"
        );

        tasks
    }

    fn resolve_one(&self, descriptor: &TaskDescriptor) -> ResolvedTask {
        let metadata = descriptor.entry.metadata();
        let candidates = candidate_paths(&self.manifest_dir, &descriptor.entry.persona_file);

        let mut failures = Vec::with_capacity(candidates.len());
        for path in &candidates {
            match std::fs::read_to_string(path) {
                Ok(persona) => {
                    tracing::trace!(
                        task_id = %descriptor.task_id,
                        path = %path.display(),
                        "Resolved persona"
                    );
                    return ResolvedTask::Ready(TaskInput::new(
                        descriptor.task_id.clone(),
                        persona,
                        metadata,
                    ));
                }
                Err(e) => failures.push(format!("{}: {e}", path.display())),
            }
        }

        let reason = if failures.is_empty() {
            "no candidate path".to_string()
        } else {
            failures.join("; ")
        };
        tracing::warn!(
            task_id = %descriptor.task_id,
            error_kind = "ContentMissing",
            reason = %reason,
            "Persona file not found"
        );

        ResolvedTask::Missing {
            task_id: descriptor.task_id.clone(),
            metadata,
            reason,
        }
    }
}

/// Locations tried for a persona file, in order:
/// the path as given, the path under `dir`, then its file name under `dir`.
pub fn candidate_paths(dir: &Path, persona_file: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![persona_file.to_path_buf()];

    if persona_file.is_relative() {
        candidates.push(dir.join(persona_file));
    }
    if let Some(name) = persona_file.file_name() {
        candidates.push(dir.join(name));
    }

    candidates.dedup();
    candidates
}
