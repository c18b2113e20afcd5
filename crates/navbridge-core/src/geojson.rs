// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal GeoJSON model (RFC 7946) covering what crosses the bridge:
// FeatureCollections of Point and LineString features.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::{Coordinate, Place};

/// Property keys attached to every geocoded place feature.
pub const PROP_PLACE_NAME: &str = "place_name";
pub const PROP_TEXT: &str = "text";
pub const PROP_ADDRESS: &str = "address";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CollectionKind {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureKind {
    Feature,
}

/// Geometry variants emitted by the bridge. Positions are `[lon, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl Geometry {
    pub fn point(at: Coordinate) -> Self {
        Self::Point {
            coordinates: at.to_pair(),
        }
    }

    pub fn line_string(path: &[Coordinate]) -> Self {
        Self::LineString {
            coordinates: path.iter().map(|c| c.to_pair()).collect(),
        }
    }

    /// GeoJSON `type` member of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::LineString { .. } => "LineString",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: FeatureKind,
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            kind: FeatureKind::Feature,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }

    /// String property lookup; `None` when absent or not a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Point feature for a matched place; a missing address becomes `""`.
    pub fn from_place(place: &Place) -> Self {
        Self::new(Geometry::point(place.coordinate))
            .with_property(PROP_PLACE_NAME, place.place_name.clone())
            .with_property(PROP_TEXT, place.text.clone())
            .with_property(PROP_ADDRESS, place.address.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: CollectionKind,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            features,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn single(feature: Feature) -> Self {
        Self::new(vec![feature])
    }

    pub fn from_places(places: &[Place]) -> Self {
        Self::new(places.iter().map(Feature::from_place).collect())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// GeoJSON allows `"properties": null`; treat it as an empty object.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    #[test]
    fn line_string_collection_shape() {
        let path = [coord(114.1869509, 22.3528619), coord(114.1893649, 22.3522368)];
        let fc = FeatureCollection::single(Feature::new(Geometry::line_string(&path)));
        let value: Value = serde_json::from_str(&fc.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "LineString");
        assert_eq!(value["features"][0]["geometry"]["coordinates"][0][0], 114.1869509);
        assert_eq!(value["features"][0]["geometry"]["coordinates"][1][1], 22.3522368);
    }

    #[test]
    fn route_collection_survives_round_trip() {
        let path = [coord(1.5, 2.5), coord(1.6, 2.4), coord(1.7, 2.3)];
        let fc = FeatureCollection::single(Feature::new(Geometry::line_string(&path)));
        let back = FeatureCollection::from_json(&fc.to_json().unwrap()).unwrap();
        assert_eq!(back, fc);
        assert_eq!(back.features[0].geometry.type_name(), "LineString");
    }

    #[test]
    fn place_feature_has_string_properties() {
        let place = Place {
            place_name: "Sha Tin Park, Hong Kong".into(),
            text: "Sha Tin Park".into(),
            address: None,
            coordinate: coord(114.19, 22.38),
        };
        let feature = Feature::from_place(&place);
        assert_eq!(feature.property_str(PROP_PLACE_NAME), Some("Sha Tin Park, Hong Kong"));
        assert_eq!(feature.property_str(PROP_TEXT), Some("Sha Tin Park"));
        assert_eq!(feature.property_str(PROP_ADDRESS), Some(""));
        assert_eq!(feature.geometry, Geometry::Point { coordinates: [114.19, 22.38] });
    }

    #[test]
    fn parses_foreign_geojson_with_null_properties() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,2.0]},"properties":null},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[3.0,4.0]}}
        ]}"#;
        let fc = FeatureCollection::from_json(text).unwrap();
        assert_eq!(fc.len(), 2);
        assert!(fc.features[0].properties.is_empty());
        assert!(fc.features[1].properties.is_empty());
    }

    #[test]
    fn rejects_wrong_collection_type() {
        let text = r#"{"type":"Feature","features":[]}"#;
        assert!(FeatureCollection::from_json(text).is_err());
    }

    #[test]
    fn empty_collection_serializes_empty_array() {
        assert_eq!(
            FeatureCollection::empty().to_json().unwrap(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }
}
