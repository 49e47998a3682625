//! Tileset recipe documents.
//!
//! A recipe tells the tiling service how to build a tileset from the
//! uploaded GeoJSON source. Each region gets one recipe with a single layer
//! named after the region key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RegionKey;

/// Highest zoom level the tiling service accepts.
pub const MAX_ZOOM_LIMIT: u8 = 22;
/// Default minimum zoom level.
pub const DEFAULT_MIN_ZOOM: u8 = 1;
/// Default maximum zoom level.
pub const DEFAULT_MAX_ZOOM: u8 = 13;

const RECIPE_VERSION: u32 = 1;

/// Recipe document written beside each region's GeoJSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub version: u32,
    pub layers: BTreeMap<String, RecipeLayer>,
}

/// One layer block of a [`Recipe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLayer {
    /// Tileset source URI the layer reads from.
    pub source: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub features: LayerFeatures,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFeatures {
    pub attributes: LayerAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerAttributes {
    /// Feature properties kept in the tiles.
    pub allowed_output: Vec<String>,
}

/// Errors raised by [`RecipeTemplate::new`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("tileset source profile must not be empty")]
    EmptyProfile,
    #[error("minimum zoom {min} exceeds maximum zoom {max}")]
    ZoomOrder { min: u8, max: u8 },
    #[error("maximum zoom {max} exceeds the limit of {limit}", limit = MAX_ZOOM_LIMIT)]
    ZoomLimit { max: u8 },
}

/// Region-independent recipe parameters.
///
/// # Examples
/// ```
/// use tileprep_core::{RecipeTemplate, RegionKey};
///
/// let template = RecipeTemplate::new("acme", 1, 13, vec!["farmNumber".into()])?;
/// let recipe = template.render(&RegionKey::parse("19", 2)?);
///
/// let layer = &recipe.layers["19"];
/// assert_eq!(layer.source, "mapbox://tileset-source/acme/19");
/// assert_eq!(layer.maxzoom, 13);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeTemplate {
    profile: String,
    min_zoom: u8,
    max_zoom: u8,
    allowed_output: Vec<String>,
}

impl RecipeTemplate {
    /// Validate the tiling parameters.
    pub fn new(
        profile: impl Into<String>,
        min_zoom: u8,
        max_zoom: u8,
        allowed_output: Vec<String>,
    ) -> Result<Self, RecipeError> {
        let profile = profile.into();
        if profile.trim().is_empty() {
            return Err(RecipeError::EmptyProfile);
        }
        if max_zoom > MAX_ZOOM_LIMIT {
            return Err(RecipeError::ZoomLimit { max: max_zoom });
        }
        if min_zoom > max_zoom {
            return Err(RecipeError::ZoomOrder {
                min: min_zoom,
                max: max_zoom,
            });
        }
        Ok(Self {
            profile: profile.trim().to_owned(),
            min_zoom,
            max_zoom,
            allowed_output,
        })
    }

    /// Tileset source URI for `region`.
    #[must_use]
    pub fn source_uri(&self, region: &RegionKey) -> String {
        format!("mapbox://tileset-source/{}/{region}", self.profile)
    }

    /// Produce the recipe for `region`.
    #[must_use]
    pub fn render(&self, region: &RegionKey) -> Recipe {
        let layer = RecipeLayer {
            source: self.source_uri(region),
            minzoom: self.min_zoom,
            maxzoom: self.max_zoom,
            features: LayerFeatures {
                attributes: LayerAttributes {
                    allowed_output: self.allowed_output.clone(),
                },
            },
        };
        Recipe {
            version: RECIPE_VERSION,
            layers: BTreeMap::from([(region.to_string(), layer)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn renders_expected_shape() {
        let template =
            RecipeTemplate::new("acme", 1, 13, vec!["area".into(), "centroid".into()])
                .expect("valid template");
        let region = RegionKey::parse("1", 2).expect("valid key");
        let value = serde_json::to_value(template.render(&region)).expect("serialise recipe");
        assert_eq!(
            value,
            json!({
                "version": 1,
                "layers": {
                    "01": {
                        "source": "mapbox://tileset-source/acme/01",
                        "minzoom": 1,
                        "maxzoom": 13,
                        "features": {"attributes": {"allowed_output": ["area", "centroid"]}}
                    }
                }
            })
        );
    }

    #[rstest]
    #[case(" ", 1, 13, RecipeError::EmptyProfile)]
    #[case("acme", 14, 13, RecipeError::ZoomOrder { min: 14, max: 13 })]
    #[case("acme", 0, 23, RecipeError::ZoomLimit { max: 23 })]
    fn rejects_invalid_parameters(
        #[case] profile: &str,
        #[case] min: u8,
        #[case] max: u8,
        #[case] expected: RecipeError,
    ) {
        assert_eq!(
            RecipeTemplate::new(profile, min, max, Vec::new()),
            Err(expected)
        );
    }
}
