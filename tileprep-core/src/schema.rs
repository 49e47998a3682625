//! Column schema descriptors for delimited exports.
//!
//! A [`Schema`] is the serialisable description supplied at startup (either
//! loaded from JSON or taken from a built-in preset). [`Schema::compile`]
//! validates it once and resolves every column reference into an index,
//! producing the [`RowSchema`] the record parser works from.

use std::{collections::HashSet, io::Read};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::region::DEFAULT_REGION_WIDTH;

const DEFAULT_DELIMITER: char = '|';
const DEFAULT_REGION_PROPERTY: &str = "region";
/// Export nulls plus the missing-value tokens common to tabular tooling.
const DEFAULT_NULL_MARKERS: [&str; 21] = [
    "", "NULL", "NUL", "null", "nul", "NA", "N/A", "n/a", "<NA>", "#N/A", "#N/A N/A", "#NA",
    "NaN", "-NaN", "nan", "-nan", "None", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

/// Serialisable description of a delimited export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    /// Column names in file order. Files carry no header row.
    pub columns: Vec<String>,
    /// Field separator.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Where each row's geometry comes from.
    pub geometry: GeometrySpec,
    /// Where each row's region key comes from.
    pub region: RegionSpec,
    /// Properties emitted on every feature, in order.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    /// Raw values treated as null.
    #[serde(default = "default_null_markers")]
    pub null_markers: Vec<String>,
    /// Emit polygons as single-member multipolygons.
    #[serde(default)]
    pub promote_polygons: bool,
    /// Feature property that receives the region key.
    #[serde(default = "default_region_property")]
    pub region_property: String,
}

/// Geometry source for each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometrySpec {
    /// A single column holding well-known text.
    Wkt { column: String },
    /// Two numeric columns holding longitude (`x`) and latitude (`y`).
    Point { x: String, y: String },
}

/// Region key source for each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSpec {
    /// Read the key from a column and pad it to `width`.
    Column {
        column: String,
        #[serde(default = "default_region_width")]
        width: usize,
    },
    /// Derive the key from the state name embedded in the input file name
    /// (`clu26_WestVirginia_STR.txt`), mapped to its FIPS code.
    FileState,
}

/// One emitted feature property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Property name in the output.
    pub name: String,
    /// How the value is produced.
    pub source: AttributeSource,
}

/// Producer for a feature property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeSource {
    /// Copy a column, converting it to `value`.
    Column {
        column: String,
        #[serde(default)]
        value: ValueKind,
    },
    /// Interpolate `{column}` placeholders; null if any referenced column is.
    Template { template: String },
    /// The `[x, y]` centroid of the row geometry.
    Centroid,
}

/// Target type for column attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    String,
    /// Parsed as a float and truncated toward zero.
    Integer,
    Float,
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_region_property() -> String {
    DEFAULT_REGION_PROPERTY.to_owned()
}

fn default_null_markers() -> Vec<String> {
    DEFAULT_NULL_MARKERS.iter().map(|m| (*m).to_owned()).collect()
}

const fn default_region_width() -> usize {
    DEFAULT_REGION_WIDTH
}

/// Errors raised while loading or validating a [`Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("schema declares no columns")]
    NoColumns,
    #[error("column {name:?} is declared more than once")]
    DuplicateColumn { name: String },
    #[error("{context} references unknown column {column:?}")]
    UnknownColumn { context: String, column: String },
    #[error("attribute {name:?} is declared more than once")]
    DuplicateAttribute { name: String },
    #[error("attribute {name:?} clashes with the region property")]
    ReservedAttribute { name: String },
    #[error("template for attribute {name:?} is invalid: {reason}")]
    InvalidTemplate { name: String, reason: &'static str },
    #[error("region key width must be at least 1")]
    ZeroRegionWidth,
    #[error("delimiter {delimiter:?} cannot separate fields")]
    InvalidDelimiter { delimiter: char },
}

impl Schema {
    /// Parse a schema from JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        serde_json::from_reader(reader).map_err(|source| SchemaError::Parse { source })
    }

    /// Schema for the CLU field-boundary exports (`clu<nn>_<State>_STR.txt`).
    ///
    /// Geometry is WKT in the `Shape` column and the region is derived from
    /// the state name in the file name.
    #[must_use]
    pub fn clu() -> Self {
        const COLUMNS: [&str; 39] = [
            "objectid",
            "Shape",
            "clu_identifier",
            "clu_number",
            "tract_number",
            "farm_number",
            "clu_classification_code",
            "clu_calculated_acreage",
            "highly_erodible_land_type_code",
            "comments",
            "state_code",
            "county_code",
            "data_source_site_identifier",
            "creation_date",
            "last_change_date",
            "data_source",
            "admin_state",
            "admin_county",
            "cropland_indicator_3cm",
            "sap_crp",
            "clu_status",
            "cdist_fips",
            "edit_reason",
            "clu_alt_id",
            "last_chg_user_nm",
            "cims_as_of_date",
            "cimsfile",
            "cims_loc_state",
            "cims_loc_county",
            "shape_length",
            "shape_area",
            "BoundingBox",
            "StateCode",
            "PrincipalMeridian",
            "TownshipNumber",
            "TownshipDirection",
            "RangeNumber",
            "RangeDirection",
            "SectionNumber",
        ];
        let column = |name: &str, column: &str, value: ValueKind| AttributeSpec {
            name: name.to_owned(),
            source: AttributeSource::Column {
                column: column.to_owned(),
                value,
            },
        };
        Self {
            columns: COLUMNS.iter().map(|c| (*c).to_owned()).collect(),
            delimiter: DEFAULT_DELIMITER,
            geometry: GeometrySpec::Wkt {
                column: "Shape".to_owned(),
            },
            region: RegionSpec::FileState,
            attributes: vec![
                column("cluIdentifier", "clu_identifier", ValueKind::String),
                column("area", "clu_calculated_acreage", ValueKind::Float),
                column(
                    "cluCalculatedAcreage",
                    "clu_calculated_acreage",
                    ValueKind::Float,
                ),
                column("tractNumber", "tract_number", ValueKind::Integer),
                column("farmNumber", "farm_number", ValueKind::Integer),
                column("fieldNumber", "clu_number", ValueKind::Integer),
                AttributeSpec {
                    name: "legalDescription".to_owned(),
                    source: AttributeSource::Template {
                        template: "{SectionNumber}-{TownshipNumber}{TownshipDirection}-{RangeNumber}{RangeDirection}"
                            .to_owned(),
                    },
                },
                AttributeSpec {
                    name: "centroid".to_owned(),
                    source: AttributeSource::Centroid,
                },
            ],
            null_markers: default_null_markers(),
            promote_polygons: true,
            region_property: default_region_property(),
        }
    }

    /// Validate the descriptor and resolve column names to indices.
    pub fn compile(&self) -> Result<RowSchema, SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }
        if matches!(self.delimiter, '\n' | '\r' | '"') {
            return Err(SchemaError::InvalidDelimiter {
                delimiter: self.delimiter,
            });
        }
        let mut seen = HashSet::new();
        for name in &self.columns {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateColumn { name: name.clone() });
            }
        }

        let geometry = match &self.geometry {
            GeometrySpec::Wkt { column } => GeometryColumns::Wkt(self.index_of(column, "geometry")?),
            GeometrySpec::Point { x, y } => GeometryColumns::Point {
                x: self.index_of(x, "geometry")?,
                y: self.index_of(y, "geometry")?,
            },
        };

        let region = match &self.region {
            RegionSpec::Column { column, width } => {
                if *width == 0 {
                    return Err(SchemaError::ZeroRegionWidth);
                }
                RegionSource::Column {
                    index: self.index_of(column, "region")?,
                    width: *width,
                }
            }
            RegionSpec::FileState => RegionSource::FileState,
        };

        let mut names = HashSet::new();
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for spec in &self.attributes {
            if spec.name == self.region_property {
                return Err(SchemaError::ReservedAttribute {
                    name: spec.name.clone(),
                });
            }
            if !names.insert(spec.name.as_str()) {
                return Err(SchemaError::DuplicateAttribute {
                    name: spec.name.clone(),
                });
            }
            attributes.push(CompiledAttribute {
                name: spec.name.clone(),
                source: self.compile_source(spec)?,
            });
        }

        Ok(RowSchema {
            column_count: self.columns.len(),
            delimiter: self.delimiter,
            column_names: self.columns.clone(),
            geometry,
            region,
            attributes,
            null_markers: self.null_markers.clone(),
            promote_polygons: self.promote_polygons,
            region_property: self.region_property.clone(),
        })
    }

    fn compile_source(&self, spec: &AttributeSpec) -> Result<CompiledSource, SchemaError> {
        let context = format!("attribute {:?}", spec.name);
        Ok(match &spec.source {
            AttributeSource::Column { column, value } => CompiledSource::Column {
                index: self.index_of(column, &context)?,
                kind: *value,
            },
            AttributeSource::Template { template } => {
                let parts = parse_template(template).map_err(|reason| {
                    SchemaError::InvalidTemplate {
                        name: spec.name.clone(),
                        reason,
                    }
                })?;
                let parts = parts
                    .into_iter()
                    .map(|part| match part {
                        RawPart::Literal(text) => Ok(TemplatePart::Literal(text)),
                        RawPart::Column(name) => {
                            self.index_of(&name, &context).map(TemplatePart::Column)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                CompiledSource::Template(parts)
            }
            AttributeSource::Centroid => CompiledSource::Centroid,
        })
    }

    fn index_of(&self, column: &str, context: &str) -> Result<usize, SchemaError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                context: context.to_owned(),
                column: column.to_owned(),
            })
    }
}

enum RawPart {
    Literal(String),
    Column(String),
}

fn parse_template(template: &str) -> Result<Vec<RawPart>, &'static str> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err("nested `{`"),
                        other => name.push(other),
                    }
                }
                if !closed {
                    return Err("unclosed `{`");
                }
                if name.is_empty() {
                    return Err("empty placeholder");
                }
                if !literal.is_empty() {
                    parts.push(RawPart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(RawPart::Column(name));
            }
            '}' => return Err("unmatched `}`"),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        parts.push(RawPart::Literal(literal));
    }
    if !parts.iter().any(|p| matches!(p, RawPart::Column(_))) {
        return Err("template references no columns");
    }
    Ok(parts)
}

/// A validated schema with column references resolved to indices.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSchema {
    column_count: usize,
    delimiter: char,
    column_names: Vec<String>,
    pub(crate) geometry: GeometryColumns,
    pub(crate) region: RegionSource,
    pub(crate) attributes: Vec<CompiledAttribute>,
    null_markers: Vec<String>,
    pub(crate) promote_polygons: bool,
    region_property: String,
}

impl RowSchema {
    /// Number of fields every row must carry.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    /// Field separator.
    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Name of the column at `index`, if any.
    #[must_use]
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.column_names.get(index).map(String::as_str)
    }

    /// Output property names in emission order, excluding the region property.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    /// Feature property holding the region key.
    #[must_use]
    pub fn region_property(&self) -> &str {
        &self.region_property
    }

    /// Whether region keys come from the input file name.
    #[must_use]
    pub const fn region_from_file_name(&self) -> bool {
        matches!(self.region, RegionSource::FileState)
    }

    pub(crate) fn is_null(&self, value: &str) -> bool {
        self.null_markers.iter().any(|marker| marker == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeometryColumns {
    Wkt(usize),
    Point { x: usize, y: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionSource {
    Column { index: usize, width: usize },
    FileState,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledAttribute {
    pub(crate) name: String,
    pub(crate) source: CompiledSource,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompiledSource {
    Column { index: usize, kind: ValueKind },
    Template(Vec<TemplatePart>),
    Centroid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplatePart {
    Literal(String),
    Column(usize),
}
