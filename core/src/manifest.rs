//! Manifest loading
//!
//! A manifest is a JSON object mapping task ids to entries that point at a
//! persona file and carry optional display fields. Entry order in the file is
//! the task order of the batch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PanelError, PanelResult};
use crate::result::TaskMetadata;

/// File name of the manifest inside a processed-content directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// One manifest record
///
/// Unknown fields (gender, location, purchase counts, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Location of the persona text, absolute or relative
    pub persona_file: PathBuf,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Display name as written by older manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Age of the persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Segment tags
    #[serde(default, deserialize_with = "null_as_empty")]
    pub segments: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ManifestEntry {
    /// Display name, preferring `display_name` over `name`
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }

    /// Display metadata carried into task inputs and results
    pub fn metadata(&self) -> TaskMetadata {
        TaskMetadata {
            display_name: self.display_name().map(str::to_string),
            age: self.age,
            segments: self.segments.clone(),
        }
    }
}

/// A manifest entry together with its task id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Opaque task identifier (the manifest key)
    pub task_id: String,

    /// The manifest record
    pub entry: ManifestEntry,
}

/// A parsed manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    descriptors: Vec<TaskDescriptor>,
}

impl Manifest {
    /// Load `manifest.json` from a processed-content directory
    pub fn load(dir: &Path) -> PanelResult<Self> {
        let path = dir.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| {
            PanelError::ManifestNotFound {
                path: path.clone(),
                source,
            }
        })?;
        Self::parse(path, &text)
    }

    /// Parse manifest text; `path` is used for diagnostics and to locate the
    /// manifest directory
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> PanelResult<Self> {
        let path = path.into();
        let malformed = |message: String| PanelError::ManifestMalformed {
            path: path.clone(),
            message,
        };

        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;

        let descriptors = raw
            .into_iter()
            .map(|(task_id, value)| {
                let entry: ManifestEntry = serde_json::from_value(value)
                    .map_err(|e| malformed(format!("entry {task_id}: {e}")))?;
                Ok(TaskDescriptor { task_id, entry })
            })
            .collect::<PanelResult<Vec<_>>>()?;

        tracing::debug!(
            path = %path.display(),
            entries = descriptors.len(),
            "Loaded manifest"
        );

        Ok(Self { path, descriptors })
    }

    /// Path of the manifest file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Descriptors in manifest order
    pub fn descriptors(&self) -> &[TaskDescriptor] {
        &self.descriptors
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the manifest has no entries
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
