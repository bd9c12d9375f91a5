//! Static (non-cluster) dashboard entries.
//!
//! Every `*.json` file in a directory holds either one definition object or
//! an array of them:
//!
//! ```json
//! { "name": "wiki", "namespace": "external", "title": "Team Wiki",
//!   "urls": ["https://wiki.example.com"] }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info, instrument};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::types::{Record, Reference};

/// One static entry as written on disk.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Definition {
    /// Entry name
    pub name: String,
    /// Group the entry is listed under
    pub namespace: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Logo URL
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Links, in display order
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Definition {
    /// Converts the definition into a static record.
    pub fn into_record(self) -> Record {
        let mut record = Record::new("", self.namespace, self.name);
        record.title = self.title.unwrap_or_default();
        record.description = self.description.unwrap_or_default();
        record.logo_url = self.logo_url.unwrap_or_default();
        record.refs = self.urls.into_iter().map(Reference::fixed).collect();
        record
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<Definition>),
    One(Definition),
}

/// Loads every definition file in `dir`, in file name order.
#[instrument]
pub async fn load_definitions(dir: impl AsRef<Path> + std::fmt::Debug) -> Result<Vec<Record>> {
    let dir = dir.as_ref();
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        DashboardError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to read definitions directory {}: {}", dir.display(), e),
        ))
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut records = Vec::new();
    for path in files {
        let loaded = load_file(&path).await?;
        debug!(path = %path.display(), count = loaded.len(), "Loaded definition file");
        records.extend(loaded);
    }

    info!(count = records.len(), "Loaded static definitions");
    Ok(records)
}

async fn load_file(path: &Path) -> Result<Vec<Record>> {
    let contents = fs::read_to_string(path).await?;
    let invalid = |reason: String| DashboardError::InvalidDefinition {
        path: path.display().to_string(),
        reason,
    };

    let definitions = match serde_json::from_str::<DefinitionFile>(&contents) {
        Ok(DefinitionFile::Many(list)) => list,
        Ok(DefinitionFile::One(single)) => vec![single],
        Err(e) => return Err(invalid(e.to_string())),
    };

    definitions
        .into_iter()
        .map(|def| {
            if def.name.is_empty() {
                return Err(invalid("definition has an empty name".into()));
            }
            Ok(def.into_record())
        })
        .collect()
}
