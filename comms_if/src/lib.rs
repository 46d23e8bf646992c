//! # Communications interface crate.
//!
//! Provides the wire interface to the Capra robot: the telecommand payloads the firmware
//! understands and the network session used to publish them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions and their wire encoding
pub mod tc;

/// Network module
pub mod net;
