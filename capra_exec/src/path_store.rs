//! # Path store
//!
//! Loads path documents written by the Capra Commander application (or anything else producing the
//! same JSON shape).
//!
//! Loading only checks that the file exists and contains JSON. The structure of the document is
//! checked where it is used: extracting node positions for distance calculations, or converting
//! into a typed [`Route`] before it is sent to the robot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::{Route, RouteError};
use log::{debug, warn};
use serde_json::Value;
use std::{
    fs,
    io,
    path::{Path, PathBuf}
};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path document as loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDocument {
    source: PathBuf,
    raw: Value
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PathError {
    #[error("The file {0:?} was not found")]
    FileNotFound(PathBuf),

    #[error("Cannot read the path file {0:?}: {1}")]
    ReadError(PathBuf, io::Error),

    #[error("Invalid data format in path document: {0}")]
    MalformedPathData(String),

    #[error("The route is invalid: {0}")]
    InvalidRoute(RouteError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathDocument {
    /// Wrap an already parsed JSON value.
    pub fn from_value<P: AsRef<Path>>(raw: Value, source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            raw
        }
    }

    /// The file this document was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The document as it was read.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Number of entries in the document's `nodes` array, if there is one.
    pub fn num_nodes(&self) -> Option<usize> {
        self.raw["nodes"].as_array().map(|n| n.len())
    }

    /// Extract the `(x, y)` position of every node, in stored order.
    ///
    /// Fails with [`PathError::MalformedPathData`] if the `nodes` array or any position field is
    /// missing or not a number.
    pub fn node_positions(&self) -> Result<Vec<(f64, f64)>, PathError> {
        let nodes = self.raw["nodes"]
            .as_array()
            .ok_or_else(|| malformed("expected \"nodes\" to be an array"))?;

        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let position = &node["position"];
                if !position.is_object() {
                    return Err(malformed(format!("node {} has no \"position\"", i)))
                }

                let coord = |axis: &str| {
                    position[axis].as_f64().ok_or_else(|| malformed(format!(
                        "node {} has no numeric \"position.{}\"",
                        i, axis
                    )))
                };

                Ok((coord("x")?, coord("y")?))
            })
            .collect()
    }

    /// Return true if the node sequence numbers ascend in stored order.
    ///
    /// Nodes without a sequence number are ignored.
    pub fn is_sequence_ordered(&self) -> bool {
        let seq: Vec<i64> = match self.raw["nodes"].as_array() {
            Some(nodes) => nodes
                .iter()
                .filter_map(|n| n["sequence_number"].as_i64())
                .collect(),
            None => return true
        };

        seq.windows(2).all(|w| w[0] < w[1])
    }

    /// Convert the document into a validated [`Route`].
    pub fn route(&self) -> Result<Route, PathError> {
        let route: Route = serde_json::from_value(self.raw.clone())
            .map_err(|e| malformed(e.to_string()))?;

        route.validate().map_err(PathError::InvalidRoute)?;

        Ok(route)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a path document from the given file.
pub fn load<P: AsRef<Path>>(locator: P) -> Result<PathDocument, PathError> {
    let path = locator.as_ref().to_path_buf();

    let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PathError::FileNotFound(path.clone()),
        _ => PathError::ReadError(path.clone(), e)
    })?;

    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| malformed(format!("{:?} is not valid JSON: {}", path, e)))?;

    let doc = PathDocument::from_value(raw, &path);

    match doc.num_nodes() {
        Some(n) => debug!("Loaded path document {:?} with {} nodes", path, n),
        None => warn!("Path document {:?} has no \"nodes\" array", path)
    }

    Ok(doc)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn malformed<S: Into<String>>(msg: S) -> PathError {
    PathError::MalformedPathData(msg.into())
}
