//! Metadata files to upload

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candymine_core::WorkItem;

/// One file of the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFile {
    pub path: PathBuf,
    pub name: String,
    /// Metadata address the file belongs to, derived from its name
    pub identifier: String,
}

impl WorkItem for MetadataFile {
    fn label(&self) -> &str {
        &self.name
    }
}

/// File name up to its first `.json`; names without one are kept whole.
pub fn identifier_of(name: &str) -> &str {
    name.split(".json").next().unwrap_or(name)
}

/// Regular files of `dir`, sorted by name.
///
/// A missing or unreadable directory is an error; entries that cannot be
/// inspected or whose names are not UTF-8 are skipped with a warning.
pub fn metadata_files(dir: &Path) -> Result<Vec<MetadataFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Cannot list {}", dir.display()))?;
        let path = entry.path();
        match entry.file_type() {
            Ok(t) if t.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                log::warn!("{}: {e}, skipping", path.display());
                continue;
            }
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::warn!("{}: file name is not UTF-8, skipping", path.display());
            continue;
        };
        files.push(MetadataFile {
            identifier: identifier_of(&name).to_string(),
            name,
            path,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
