//! Readiness checks over a finished output directory.
//!
//! A folder is ready for upload when it holds a recipe and at least one
//! GeoJSON file, which is what the downstream uploader looks for.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use thiserror::Error;
use tileprep_fs::{EntryKind, list_names};

use super::RECIPE_FILE_NAME;

/// Errors raised while scanning an output directory.
#[derive(Debug, Error)]
#[error("failed to scan output directory {path}")]
pub struct ScanError {
    pub path: Utf8PathBuf,
    #[source]
    pub source: io::Error,
}

/// What a region folder contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStatus {
    pub name: String,
    pub has_recipe: bool,
    pub geojson_files: Vec<String>,
}

impl FolderStatus {
    /// Whether the folder can be uploaded as a tileset.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.has_recipe && !self.geojson_files.is_empty()
    }
}

/// Inspect every immediate subfolder of `root`, sorted by name.
pub fn scan_output_folders(root: &Utf8Path) -> Result<Vec<FolderStatus>, ScanError> {
    let folders = list_names(root, EntryKind::Dir).map_err(|source| ScanError {
        path: root.to_path_buf(),
        source,
    })?;
    folders
        .into_iter()
        .map(|name| {
            let dir = root.join(&name);
            let files = list_names(&dir, EntryKind::File)
                .map_err(|source| ScanError { path: dir, source })?;
            let has_recipe = files.iter().any(|file| file == RECIPE_FILE_NAME);
            let geojson_files = files
                .into_iter()
                .filter(|file| {
                    Utf8Path::new(file)
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson"))
                })
                .collect();
            Ok(FolderStatus {
                name,
                has_recipe,
                geojson_files,
            })
        })
        .collect()
}
