//! Region output: GeoJSON feature files, recipes and folder scanning.

mod geojson;
mod recipe;
mod scan;

pub use self::geojson::{CloseReport, FeatureSink, OutputDirectory};
pub use recipe::{RECIPE_FILE_NAME, write_recipe_once};
pub use scan::{FolderStatus, ScanError, scan_output_folders};

use camino::{Utf8Path, Utf8PathBuf};
use tileprep_core::RegionKey;

/// Folder holding everything written for `region`.
#[must_use]
pub fn region_dir(root: &Utf8Path, region: &RegionKey) -> Utf8PathBuf {
    root.join(region.as_str())
}

/// Path of the GeoJSON file for `region`.
#[must_use]
pub fn geojson_path(root: &Utf8Path, region: &RegionKey) -> Utf8PathBuf {
    region_dir(root, region).join(format!("{region}.geojson"))
}
