//! Streaming GeoJSON writers, one per region.
//!
//! A region file is opened on the first flush that reaches it during a run:
//! the folder is created, the recipe is written if absent, and the
//! FeatureCollection header is emitted. Later flushes append features. The
//! collection is closed once, when the run finishes.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::File;
use dashmap::DashMap;
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tileprep_core::{Record, RecipeTemplate, RegionKey};
use tileprep_fs::{create_truncate, ensure_dir};

use super::{geojson_path, recipe::write_recipe_once, region_dir};
use crate::WriteError;

const CRS_NAME: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";
const FEATURE_SEPARATOR: &[u8] = b",\n";
const COLLECTION_FOOTER: &[u8] = b"\n]}\n";

/// Destination for flushed region batches.
pub trait FeatureSink: Sync {
    /// Append `records` to the output for `region`, preserving their order.
    fn write_batch(&self, region: &RegionKey, records: &[Record]) -> Result<(), WriteError>;

    /// Give `region` a display name. Only the first name for a region counts,
    /// and only if it arrives before the region's first batch.
    fn name_region(&self, _region: &RegionKey, _name: &str) {}
}

/// Outcome of closing every region file at the end of a run.
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Features written per region.
    pub features: BTreeMap<RegionKey, u64>,
    /// Regions whose footer could not be written.
    pub failures: Vec<(RegionKey, WriteError)>,
}

/// Shared output root holding one open writer per region.
///
/// # Examples
/// ```no_run
/// use tileprep_core::{RecipeTemplate, RegionKey};
/// use tileprep_data::output::{FeatureSink, OutputDirectory};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let template = RecipeTemplate::new("acme", 1, 13, Vec::new())?;
/// let output = OutputDirectory::new("output".into(), "region", template);
/// output.write_batch(&RegionKey::parse("54", 2)?, &[])?;
/// let report = output.close();
/// assert!(report.failures.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OutputDirectory {
    root: Utf8PathBuf,
    region_property: String,
    recipe: RecipeTemplate,
    names: DashMap<RegionKey, String>,
    regions: DashMap<RegionKey, Arc<Mutex<RegionFile>>>,
}

impl OutputDirectory {
    #[must_use]
    pub fn new(root: Utf8PathBuf, region_property: impl Into<String>, recipe: RecipeTemplate) -> Self {
        Self {
            root,
            region_property: region_property.into(),
            recipe,
            names: DashMap::new(),
            regions: DashMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn region(&self, region: &RegionKey) -> Result<Arc<Mutex<RegionFile>>, WriteError> {
        if let Some(entry) = self.regions.get(region) {
            return Ok(Arc::clone(entry.value()));
        }
        self.regions
            .entry(region.clone())
            .or_try_insert_with(|| self.open_region(region).map(|file| Arc::new(Mutex::new(file))))
            .map(|entry| Arc::clone(entry.value()))
    }

    fn open_region(&self, region: &RegionKey) -> Result<RegionFile, WriteError> {
        let dir = region_dir(&self.root, region);
        ensure_dir(&dir).map_err(|source| WriteError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        if write_recipe_once(&dir, &self.recipe.render(region))? {
            debug!("wrote recipe for region {region}");
        }
        let name = self
            .names
            .get(region)
            .map_or_else(|| region.to_string(), |name| name.value().clone());
        RegionFile::create(geojson_path(&self.root, region), &name)
    }

    /// Serialise `records` as comma-separated compact features.
    fn encode(&self, region: &RegionKey, records: &[Record]) -> Result<Vec<u8>, WriteError> {
        let mut buffer = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if index > 0 {
                buffer.extend_from_slice(FEATURE_SEPARATOR);
            }
            let feature = ::geojson::Feature {
                bbox: None,
                geometry: Some(::geojson::Geometry::new(::geojson::Value::from(
                    record.geometry(),
                ))),
                id: None,
                properties: Some(record.properties(&self.region_property)),
                foreign_members: None,
            };
            serde_json::to_writer(&mut buffer, &feature).map_err(|source| {
                WriteError::Serialise {
                    region: region.to_string(),
                    source,
                }
            })?;
        }
        Ok(buffer)
    }

    /// Close every region file and report per-region feature counts.
    pub fn close(self) -> CloseReport {
        let mut report = CloseReport::default();
        for (region, file) in self.regions {
            let mut guard = file.lock();
            report.features.insert(region.clone(), guard.features);
            if let Err(err) = guard.finish() {
                warn!("failed to close output for region {region}: {err}");
                report.failures.push((region, err));
            }
        }
        report
    }
}

impl FeatureSink for OutputDirectory {
    fn write_batch(&self, region: &RegionKey, records: &[Record]) -> Result<(), WriteError> {
        let file = self.region(region)?;
        if records.is_empty() {
            return Ok(());
        }
        let encoded = self.encode(region, records)?;
        let count = u64::try_from(records.len()).unwrap_or(u64::MAX);
        file.lock().append(&encoded, count)
    }

    fn name_region(&self, region: &RegionKey, name: &str) {
        self.names
            .entry(region.clone())
            .or_insert_with(|| name.to_owned());
    }
}

#[derive(Debug)]
struct RegionFile {
    path: Utf8PathBuf,
    writer: BufWriter<File>,
    features: u64,
    closed: bool,
}

impl RegionFile {
    fn create(path: Utf8PathBuf, name: &str) -> Result<Self, WriteError> {
        let file = create_truncate(&path).map_err(|source| WriteError::Create {
            path: path.clone(),
            source,
        })?;
        let mut region_file = Self {
            path,
            writer: BufWriter::new(file),
            features: 0,
            closed: false,
        };
        let header = collection_header(name);
        region_file.write(header.as_bytes())?;
        Ok(region_file)
    }

    fn append(&mut self, encoded: &[u8], count: u64) -> Result<(), WriteError> {
        if self.features > 0 {
            self.write(FEATURE_SEPARATOR)?;
        }
        self.write(encoded)?;
        self.features += count;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), WriteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.write(COLLECTION_FOOTER)?;
        self.writer.flush().map_err(|source| WriteError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.writer.write_all(bytes).map_err(|source| WriteError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn collection_header(name: &str) -> String {
    let name = Value::from(name);
    let crs = json!({"type": "name", "properties": {"name": CRS_NAME}});
    format!("{{\"type\":\"FeatureCollection\",\"name\":{name},\"crs\":{crs},\"features\":[\n")
}
