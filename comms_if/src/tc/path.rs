//! # Path telecommands
//!
//! A [`Route`] is the path format used by the robot's navigation system: an ordered list of
//! waypoints (nodes) and the directed segments (edges) joining them. The same shape is used for path
//! files on disk and for the payload published on [`TOPIC_SEND_PATH`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::{Telecommand, TOPIC_SEND_PATH};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// UUID of the drive action attached to edges created by the [`RouteBuilder`].
pub const DRIVE_ACTION_UUID: &str = "drive";

/// Parameter type tag the firmware uses for 32-bit float parameters.
pub const PARAM_TYPE_FLOAT32: i64 = 2;

/// Speed used by the default drive action.
pub const DEFAULT_DRIVE_SPEED: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A full route as understood by the robot's navigation system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path_uuid: String,

    #[serde(default)]
    pub path_encoding: i64,

    pub nodes: Vec<Node>,

    #[serde(default)]
    pub edges: Vec<Edge>
}

/// A waypoint of the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,

    /// Index of the node within the route. Nodes are expected to be stored in ascending order of
    /// this value.
    pub sequence_number: i64,

    pub position: Position
}

/// Position of a node.
///
/// For geodetic paths `x` is the latitude and `y` the longitude, in decimal degrees. Some path
/// files store planar coordinates instead, so no range is enforced here.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,

    #[serde(default)]
    pub z: f64
}

/// A directed segment between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub uuid: String,
    pub start_node_uuid: String,
    pub end_node_uuid: String,

    #[serde(default)]
    pub actions: Vec<Action>
}

/// An action performed by the robot while traversing an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub uuid: String,

    #[serde(default)]
    pub parameters: Vec<ActionParam>
}

/// A single parameter of an action.
///
/// Only the key and type are fixed, the value is stored under a type-dependent name (such as
/// `value_float32`) which is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParam {
    pub key: String,

    #[serde(rename = "type")]
    pub param_type: i64,

    #[serde(flatten)]
    pub value: serde_json::Map<String, serde_json::Value>
}

/// Incrementally builds a [`Route`].
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    route: Route
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Structural problems found in a route.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("The route contains no nodes")]
    NoNodes,

    #[error("Node UUID {0} is used by more than one node")]
    DuplicateNode(String),

    #[error("Edge {edge} references node {node} which is not part of the route")]
    UnknownNode {
        edge: String,
        node: String
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Route {
    /// Check the structural invariants of the route.
    ///
    /// The route must have at least one node, node UUIDs must be unique and every edge must start
    /// and end on a node of this route. Nodes which are not in ascending sequence order are
    /// reported with a warning but are accepted, as consumers iterate nodes in stored order.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.nodes.is_empty() {
            return Err(RouteError::NoNodes)
        }

        let mut uuids = HashSet::new();
        for node in self.nodes.iter() {
            if !uuids.insert(node.uuid.as_str()) {
                return Err(RouteError::DuplicateNode(node.uuid.clone()))
            }
        }

        for edge in self.edges.iter() {
            for node in [&edge.start_node_uuid, &edge.end_node_uuid].iter() {
                if !uuids.contains(node.as_str()) {
                    return Err(RouteError::UnknownNode {
                        edge: edge.uuid.clone(),
                        node: (*node).clone()
                    })
                }
            }
        }

        if !self.is_sequence_ordered() {
            warn!(
                "Nodes of route {} are not stored in ascending sequence order, stored order will be \
                used",
                self.path_uuid
            );
        }

        Ok(())
    }

    /// Return true if the nodes are stored in ascending `sequence_number` order.
    pub fn is_sequence_ordered(&self) -> bool {
        self.nodes
            .windows(2)
            .all(|w| w[0].sequence_number < w[1].sequence_number)
    }

    /// Get a node by its UUID.
    pub fn node(&self, uuid: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.uuid == uuid)
    }
}

impl Telecommand for Route {
    const TOPIC: &'static str = TOPIC_SEND_PATH;
}

impl Node {
    pub fn new(uuid: &str, sequence_number: i64, x: f64, y: f64, z: f64) -> Self {
        Self {
            uuid: String::from(uuid),
            sequence_number,
            position: Position { x, y, z }
        }
    }
}

impl Edge {
    /// Create a new edge carrying the default drive action.
    pub fn new(uuid: &str, start_node_uuid: &str, end_node_uuid: &str) -> Self {
        Self {
            uuid: String::from(uuid),
            start_node_uuid: String::from(start_node_uuid),
            end_node_uuid: String::from(end_node_uuid),
            actions: vec![Action::drive(DEFAULT_DRIVE_SPEED)]
        }
    }
}

impl Action {
    /// A drive action at the given speed.
    pub fn drive(speed: f64) -> Self {
        Self {
            uuid: String::from(DRIVE_ACTION_UUID),
            parameters: vec![ActionParam::float32("speed", speed)]
        }
    }
}

impl ActionParam {
    /// Create a float parameter, stored under `value_float32`.
    pub fn float32(key: &str, value: f64) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(String::from("value_float32"), serde_json::Value::from(value));

        Self {
            key: String::from(key),
            param_type: PARAM_TYPE_FLOAT32,
            value: map
        }
    }
}

impl RouteBuilder {
    /// Start a new, empty route.
    pub fn new(path_uuid: &str) -> Self {
        Self::with_encoding(path_uuid, 0)
    }

    pub fn with_encoding(path_uuid: &str, path_encoding: i64) -> Self {
        Self {
            route: Route {
                path_uuid: String::from(path_uuid),
                path_encoding,
                nodes: Vec::new(),
                edges: Vec::new()
            }
        }
    }

    /// Append a node to the route.
    pub fn add_node(mut self, node: Node) -> Self {
        self.route.nodes.push(node);
        self
    }

    /// Append an edge to the route.
    pub fn add_edge(mut self, edge: Edge) -> Self {
        self.route.edges.push(edge);
        self
    }

    /// Validate and return the route.
    pub fn build(self) -> Result<Route, RouteError> {
        self.route.validate()?;
        Ok(self.route)
    }
}
