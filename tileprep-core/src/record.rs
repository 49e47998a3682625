use geo::Geometry;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::RegionKey;

/// A scalar feature property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    /// An `[x, y]` coordinate pair, used for centroids.
    Coordinate([f64; 2]),
}

impl AttributeValue {
    /// Convert into a JSON value; non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::String(text) => Value::String(text.clone()),
            Self::Integer(number) => Value::Number((*number).into()),
            Self::Float(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
            Self::Coordinate([x, y]) => match (Number::from_f64(*x), Number::from_f64(*y)) {
                (Some(x), Some(y)) => Value::Array(vec![Value::Number(x), Value::Number(y)]),
                _ => Value::Null,
            },
        }
    }
}

/// One parsed row: region key, geometry and ordered attributes.
///
/// # Examples
/// ```
/// use geo::{Geometry, Point};
/// use tileprep_core::{AttributeValue, Record, RegionKey};
///
/// let record = Record::new(
///     RegionKey::parse("1", 2)?,
///     Geometry::Point(Point::new(-86.8, 33.5)),
///     vec![("name".into(), AttributeValue::String("Birmingham".into()))],
/// );
/// assert_eq!(record.region().as_str(), "01");
/// assert_eq!(record.attribute("name"), Some(&AttributeValue::String("Birmingham".into())));
/// # Ok::<(), tileprep_core::RegionKeyError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    region: RegionKey,
    geometry: Geometry<f64>,
    attributes: Vec<(String, AttributeValue)>,
}

impl Record {
    /// Assemble a record from already-validated parts.
    #[must_use]
    pub const fn new(
        region: RegionKey,
        geometry: Geometry<f64>,
        attributes: Vec<(String, AttributeValue)>,
    ) -> Self {
        Self {
            region,
            geometry,
            attributes,
        }
    }

    #[must_use]
    pub const fn region(&self) -> &RegionKey {
        &self.region
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Attributes in schema order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, AttributeValue)] {
        &self.attributes
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Build the feature property object, adding the region key under
    /// `region_property`.
    #[must_use]
    pub fn properties(&self, region_property: &str) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(
            region_property.to_owned(),
            Value::String(self.region.to_string()),
        );
        for (name, value) in &self.attributes {
            properties.insert(name.clone(), value.to_json());
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(AttributeValue::Null, json!(null))]
    #[case(AttributeValue::String("x".into()), json!("x"))]
    #[case(AttributeValue::Integer(-4), json!(-4))]
    #[case(AttributeValue::Float(1.5), json!(1.5))]
    #[case(AttributeValue::Float(f64::NAN), json!(null))]
    #[case(AttributeValue::Coordinate([1.0, 2.0]), json!([1.0, 2.0]))]
    fn converts_values_to_json(#[case] value: AttributeValue, #[case] expected: Value) {
        assert_eq!(value.to_json(), expected);
    }

    #[rstest]
    fn properties_carry_region_key() {
        let record = Record::new(
            RegionKey::parse("48", 2).expect("valid key"),
            Geometry::Point(Point::new(0.0, 0.0)),
            vec![("farm".into(), AttributeValue::Integer(7))],
        );
        let properties = record.properties("state");
        assert_eq!(properties.get("state"), Some(&json!("48")));
        assert_eq!(properties.get("farm"), Some(&json!(7)));
    }
}
