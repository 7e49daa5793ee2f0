//! GeoJSON feature model.
//!
//! Features are kept close to the wire format: geometry stays an opaque
//! JSON value and properties a JSON object. The loader only ever reads two
//! things from a feature: its identity property and (for in-memory
//! sources) its geometry extent.

mod accumulator;

pub use accumulator::{AccumulateReport, FeatureAccumulator};

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::coord::BBox;

fn feature_type() -> String {
    "Feature".to_string()
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

/// GeoJSON allows `"properties": null`; treat it as an empty object.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One geometry plus attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,

    #[serde(default)]
    pub geometry: Value,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl Feature {
    /// Create a feature from a geometry and property object.
    pub fn new(geometry: Value, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            geometry,
            properties,
            id: None,
        }
    }

    /// Identity of this feature under `property`.
    pub fn identity(&self, property: &str) -> IdentityKey {
        IdentityKey::from_property(self.properties.get(property))
    }

    /// Extent of the geometry's coordinates, or `None` if it has none.
    pub fn geometry_bbox(&self) -> Option<BBox> {
        let mut bbox = None;
        extend_bbox(&self.geometry, &mut bbox);
        bbox
    }
}

/// Walk a GeoJSON geometry, growing `bbox` by every position found.
fn extend_bbox(value: &Value, bbox: &mut Option<BBox>) {
    let Value::Object(object) = value else {
        return;
    };

    if let Some(Value::Array(geometries)) = object.get("geometries") {
        for geometry in geometries {
            extend_bbox(geometry, bbox);
        }
    }
    if let Some(coordinates) = object.get("coordinates") {
        extend_positions(coordinates, bbox);
    }
}

fn extend_positions(value: &Value, bbox: &mut Option<BBox>) {
    let Value::Array(items) = value else {
        return;
    };

    match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => {
            *bbox = Some(match *bbox {
                Some(mut b) => {
                    b.expand(x, y);
                    b
                }
                None => BBox::from_point(x, y),
            });
        }
        _ => {
            for item in items {
                extend_positions(item, bbox);
            }
        }
    }
}

/// Value of a feature's identity property, used for deduplication.
///
/// Values compare by their JSON encoding, so the number `1` and the string
/// `"1"` are different identities. Integral floats are keyed as integers:
/// `1.0` and `1` are the same identity. A missing or `null` property maps to
/// the single [`IdentityKey::Missing`] identity, which means all such
/// features deduplicate together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Missing,
    Value(String),
}

impl IdentityKey {
    pub fn from_property(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => IdentityKey::Missing,
            Some(Value::Number(n)) => IdentityKey::Value(number_key(n)),
            Some(v) => IdentityKey::Value(v.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, IdentityKey::Missing)
    }
}

fn number_key(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return (f as i64).to_string();
            }
        }
    }
    n.to_string()
}

impl From<Value> for IdentityKey {
    fn from(value: Value) -> Self {
        IdentityKey::from_property(Some(&value))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Missing => write!(f, "<missing>"),
            IdentityKey::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered list of features, serialized as a GeoJSON FeatureCollection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,

    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self {
            kind: collection_type(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parse a GeoJSON FeatureCollection.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_point_feature() {
        let f = parse(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [13.4, 52.5]},
            "properties": {"id": 7, "name": "Berlin"}
        }));

        assert_eq!(f.kind, "Feature");
        assert_eq!(f.identity("id"), IdentityKey::Value("7".to_string()));
        assert_eq!(f.geometry_bbox(), Some(BBox::from_point(13.4, 52.5)));
    }

    #[test]
    fn test_null_properties_become_empty() {
        let f = parse(json!({"type": "Feature", "geometry": null, "properties": null}));
        assert!(f.properties.is_empty());
        assert_eq!(f.geometry_bbox(), None);
    }

    #[test]
    fn test_identity_number_and_string_differ() {
        assert_ne!(IdentityKey::from(json!(1)), IdentityKey::from(json!("1")));
    }

    #[test]
    fn test_identity_integral_float_matches_integer() {
        assert_eq!(IdentityKey::from(json!(1)), IdentityKey::from(json!(1.0)));
        assert_eq!(IdentityKey::from(json!(-7.0)), IdentityKey::from(json!(-7)));
        assert_eq!(IdentityKey::from(json!(0)), IdentityKey::from(json!(-0.0)));
        assert_ne!(IdentityKey::from(json!(1)), IdentityKey::from(json!(1.5)));
        assert_eq!(IdentityKey::from(json!(1.5)).to_string(), "1.5");
        assert_eq!(IdentityKey::from(json!(u64::MAX)).to_string(), u64::MAX.to_string());
    }

    #[test]
    fn test_identity_missing_and_null_are_shared() {
        let missing = parse(json!({"properties": {}}));
        let null = parse(json!({"properties": {"id": null}}));

        assert!(missing.identity("id").is_missing());
        assert_eq!(missing.identity("id"), null.identity("id"));
    }

    #[test]
    fn test_polygon_bbox() {
        let f = parse(json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 3.0], [0.0, 0.0]]]
            },
            "properties": {}
        }));
        assert_eq!(f.geometry_bbox(), Some(BBox::new(0.0, 0.0, 4.0, 3.0)));
    }

    #[test]
    fn test_geometry_collection_bbox() {
        let f = parse(json!({
            "type": "Feature",
            "geometry": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Point", "coordinates": [-1.0, 2.0]},
                    {"type": "LineString", "coordinates": [[3.0, -4.0], [5.0, 6.0]]}
                ]
            },
            "properties": {}
        }));
        assert_eq!(f.geometry_bbox(), Some(BBox::new(-1.0, -4.0, 5.0, 6.0)));
    }

    #[test]
    fn test_collection_roundtrip_shape() {
        let fc = FeatureCollection::from(vec![Feature::new(Value::Null, Map::new())]);
        let value = serde_json::to_value(&fc).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert!(value["features"][0].get("id").is_none());
    }
}
