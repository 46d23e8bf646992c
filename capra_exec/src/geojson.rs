//! # GeoJSON export
//!
//! Converts a [`Route`] into a GeoJSON `FeatureCollection` so it can be shown on a map. The
//! collection holds one `LineString` feature running through every node in stored order, followed
//! by one `Point` feature per node.
//!
//! GeoJSON orders coordinates as `[longitude, latitude]`, so node positions are written as
//! `[y, x]`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::{Node, Route};
use serde::Serialize;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A route as a GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonRoute {
    #[serde(rename = "type")]
    collection_type: &'static str,

    pub features: Vec<Feature>
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,

    pub properties: Map<String, Value>,

    pub geometry: Geometry
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub coordinates: Value,

    #[serde(rename = "type")]
    pub geometry_type: GeometryType
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum GeometryType {
    Point,
    LineString
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GeoJsonRoute {
    /// An empty feature collection.
    pub fn new() -> Self {
        Self {
            collection_type: "FeatureCollection",
            features: Vec::new()
        }
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Build the collection for a route.
    pub fn from_route(route: &Route) -> Self {
        let mut collection = Self::new();

        let mut line_props = Map::new();
        line_props.insert("path_uuid".into(), Value::from(route.path_uuid.as_str()));

        let mut line = Feature::line_string(line_props);
        for node in route.nodes.iter() {
            line.add_coordinate(node);
        }
        collection.add_feature(line);

        for node in route.nodes.iter() {
            let mut props = Map::new();
            props.insert("uuid".into(), Value::from(node.uuid.as_str()));
            props.insert("sequence_number".into(), Value::from(node.sequence_number));

            collection.add_feature(Feature::point(props, node));
        }

        collection
    }

    /// Serialise the collection to a JSON value.
    pub fn to_value(&self) -> Value {
        // Every field is a string, number or JSON value, so this cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for GeoJsonRoute {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature {
    /// An empty line string feature.
    pub fn line_string(properties: Map<String, Value>) -> Self {
        Self {
            feature_type: "Feature",
            properties,
            geometry: Geometry {
                coordinates: Value::Array(Vec::new()),
                geometry_type: GeometryType::LineString
            }
        }
    }

    /// A point feature at the node's position.
    pub fn point(properties: Map<String, Value>, node: &Node) -> Self {
        Self {
            feature_type: "Feature",
            properties,
            geometry: Geometry {
                coordinates: lon_lat(node),
                geometry_type: GeometryType::Point
            }
        }
    }

    /// Append the node's position to a line string.
    ///
    /// Points have a single position, adding a coordinate to one replaces it.
    pub fn add_coordinate(&mut self, node: &Node) {
        match self.geometry.geometry_type {
            GeometryType::LineString => {
                if let Value::Array(ref mut coords) = self.geometry.coordinates {
                    coords.push(lon_lat(node));
                }
            },
            GeometryType::Point => self.geometry.coordinates = lon_lat(node)
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn lon_lat(node: &Node) -> Value {
    json!([node.position.y, node.position.x])
}
