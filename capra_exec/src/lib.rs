//! # Capra control library.
//!
//! This library contains the robot-side logic of the Capra control software: geospatial
//! calculations over recorded paths, loading of path files, and the motion controller which drives
//! the robot through a [`comms_if::net::RobotSession`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geospatial calculations - distances and bearings between coordinates and along paths
pub mod geo;

/// GeoJSON export of routes
pub mod geojson;

/// Motion control - mode transitions and timed velocity streaming
pub mod motion_ctrl;

/// Path store - loads path documents from disk
pub mod path_store;
