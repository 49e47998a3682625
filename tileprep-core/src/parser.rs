//! Row parsing against a compiled [`RowSchema`].
//!
//! Parsing is a pure function of the line, the schema and (for schemas keyed
//! by file name) the file's region. Failures are reported as
//! [`MalformedRow`]; callers count and skip them.

use geo::{Centroid, Coord, Geometry, MultiPolygon, Point};
use thiserror::Error;
use wkt::TryFromWkt;

use crate::{
    AttributeValue, Record, RegionKey, RegionKeyError,
    schema::{CompiledSource, GeometryColumns, RegionSource, RowSchema, TemplatePart, ValueKind},
};

/// Reasons a row is rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MalformedRow {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("column {column:?} holds non-numeric or out-of-range coordinate {value:?}")]
    InvalidCoordinate { column: String, value: String },
    #[error("column {column:?} holds invalid geometry: {message}")]
    InvalidGeometry { column: String, message: String },
    #[error("column {column:?} holds no geometry")]
    MissingGeometry { column: String },
    #[error(transparent)]
    Region(#[from] RegionKeyError),
}

/// Parses delimited lines into [`Record`]s.
///
/// # Examples
/// ```
/// use tileprep_core::{RecordParser, Schema};
///
/// let schema: Schema = serde_json::from_str(r#"{
///     "columns": ["state", "lon", "lat"],
///     "geometry": {"kind": "point", "x": "lon", "y": "lat"},
///     "region": {"kind": "column", "column": "state"}
/// }"#)?;
/// let schema = schema.compile()?;
/// let parser = RecordParser::new(&schema);
///
/// let record = parser.parse_line("6|-122.4|37.8")?;
/// assert_eq!(record.region().as_str(), "06");
/// assert!(parser.parse_line("|-122.4|37.8").is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecordParser<'a> {
    schema: &'a RowSchema,
    file_region: Option<RegionKey>,
}

impl<'a> RecordParser<'a> {
    #[must_use]
    pub const fn new(schema: &'a RowSchema) -> Self {
        Self {
            schema,
            file_region: None,
        }
    }

    /// Region applied to every row when the schema keys regions by file name.
    #[must_use]
    pub fn with_file_region(mut self, region: RegionKey) -> Self {
        self.file_region = Some(region);
        self
    }

    /// Number of fields in `line` under this schema's delimiter.
    #[must_use]
    pub fn field_count(&self, line: &str) -> usize {
        line.split(self.schema.delimiter()).count()
    }

    /// Parse one line.
    pub fn parse_line(&self, line: &str) -> Result<Record, MalformedRow> {
        let fields: Vec<&str> = line.split(self.schema.delimiter()).map(str::trim).collect();
        if fields.len() != self.schema.column_count() {
            return Err(MalformedRow::FieldCount {
                expected: self.schema.column_count(),
                found: fields.len(),
            });
        }
        let row = Row {
            fields: &fields,
            schema: self.schema,
        };

        let region = match self.schema.region {
            RegionSource::Column { index, width } => RegionKey::parse(row.text(index), width)?,
            RegionSource::FileState => self.file_region.clone().ok_or(RegionKeyError::Empty)?,
        };
        let geometry = self.geometry(&row)?;
        let attributes = self
            .schema
            .attributes
            .iter()
            .map(|attribute| {
                let value = match &attribute.source {
                    CompiledSource::Column { index, kind } => row.value(*index, *kind),
                    CompiledSource::Template(parts) => row.template(parts),
                    CompiledSource::Centroid => centroid(&geometry),
                };
                (attribute.name.clone(), value)
            })
            .collect();

        Ok(Record::new(region, geometry, attributes))
    }

    fn geometry(&self, row: &Row<'_>) -> Result<Geometry<f64>, MalformedRow> {
        match self.schema.geometry {
            GeometryColumns::Wkt(index) => {
                let column = row.name(index);
                let raw = row.nullable(index).ok_or_else(|| MalformedRow::MissingGeometry {
                    column: column.clone(),
                })?;
                let geometry = Geometry::<f64>::try_from_wkt_str(raw).map_err(|err| {
                    MalformedRow::InvalidGeometry {
                        column,
                        message: err.to_string(),
                    }
                })?;
                Ok(self.promote(geometry))
            }
            GeometryColumns::Point { x, y } => {
                let lon = row.coordinate(x)?;
                let lat = row.coordinate(y)?;
                validated_coord(lon, lat)
                    .map(|coord| Geometry::Point(Point(coord)))
                    .ok_or_else(|| MalformedRow::InvalidCoordinate {
                        column: row.name(if (-180.0..=180.0).contains(&lon) { y } else { x }),
                        value: format!("{lon},{lat}"),
                    })
            }
        }
    }

    fn promote(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match geometry {
            Geometry::Polygon(polygon) if self.schema.promote_polygons => {
                Geometry::MultiPolygon(MultiPolygon::new(vec![polygon]))
            }
            other => other,
        }
    }
}

struct Row<'r> {
    fields: &'r [&'r str],
    schema: &'r RowSchema,
}

impl Row<'_> {
    fn text(&self, index: usize) -> &str {
        self.fields.get(index).copied().unwrap_or_default()
    }

    fn nullable(&self, index: usize) -> Option<&str> {
        let text = self.text(index);
        (!self.schema.is_null(text)).then_some(text)
    }

    fn name(&self, index: usize) -> String {
        self.schema
            .column_name(index)
            .unwrap_or_default()
            .to_owned()
    }

    fn coordinate(&self, index: usize) -> Result<f64, MalformedRow> {
        let raw = self.text(index);
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| MalformedRow::InvalidCoordinate {
                column: self.name(index),
                value: raw.to_owned(),
            })
    }

    fn value(&self, index: usize, kind: ValueKind) -> AttributeValue {
        let Some(raw) = self.nullable(index) else {
            return AttributeValue::Null;
        };
        match kind {
            ValueKind::String => AttributeValue::String(raw.to_owned()),
            ValueKind::Float => parse_finite(raw).map_or(AttributeValue::Null, AttributeValue::Float),
            ValueKind::Integer => parse_finite(raw)
                .and_then(truncate_to_i64)
                .map_or(AttributeValue::Null, AttributeValue::Integer),
        }
    }

    fn template(&self, parts: &[TemplatePart]) -> AttributeValue {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Column(index) => match self.nullable(*index) {
                    Some(value) => out.push_str(value),
                    None => return AttributeValue::Null,
                },
            }
        }
        AttributeValue::String(out)
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn truncate_to_i64(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_807.0;
    let truncated = value.trunc();
    (truncated >= -LIMIT && truncated < LIMIT).then_some(truncated as i64)
}

fn centroid(geometry: &Geometry<f64>) -> AttributeValue {
    geometry
        .centroid()
        .map_or(AttributeValue::Null, |point| {
            AttributeValue::Coordinate([point.x(), point.y()])
        })
}

fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    ((-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat))
        .then_some(Coord { x: lon, y: lat })
}
