//! # Telecommand module
//!
//! This module provides the telecommands that can be sent to the robot, and their encoding into
//! the JSON text the robot's firmware expects.
//!
//! The firmware compares payloads produced by its own (Python) tooling, so all telecommands are
//! encoded with `", "` between items and `": "` between keys and values, rather than the compact
//! form `serde_json` produces by default. Use [`Telecommand::to_json`] rather than
//! `serde_json::to_string` for anything that goes on the wire.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive;
pub mod mode;
pub mod path;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io;
use thiserror::Error;

// Exports
pub use drive::{DrivingInstruction, VelocityCmd};
pub use mode::{ModeCmd, OperationMode};
pub use path::{Action, ActionParam, Edge, Node, Position, Route, RouteBuilder, RouteError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Topic on which full paths are uploaded to the robot.
pub const TOPIC_SEND_PATH: &str = "capra/navigation/send_path";

/// Topic on which direct velocity commands are streamed to the robot.
pub const TOPIC_REMOTE: &str = "capra/remote/direct_velocity";

/// Topic on which the robot's operation mode is set.
pub const TOPIC_SET_MODE: &str = "capra/robot/set_operation_mode";

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A message which can be published to the robot.
///
/// Each telecommand is bound to exactly one topic, so callers never pick the topic themselves.
pub trait Telecommand: Serialize {
    /// The topic this telecommand is published on.
    const TOPIC: &'static str;

    /// Encode the telecommand into the JSON text expected by the robot.
    fn to_json(&self) -> Result<String, TcError> {
        to_wire_json(self)
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors when building or encoding telecommands.
#[derive(Debug, Error)]
pub enum TcError {
    #[error("Could not serialize the telecommand: {0}")]
    SerializationError(serde_json::Error),

    #[error("Encoded telecommand is not valid UTF-8")]
    NonUtf8Payload,

    #[error("Invalid command value for {field}: {value}")]
    InvalidCommandValue {
        field: &'static str,
        value: String
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// `serde_json` formatter which reproduces the item separators used by the robot's tooling.
#[derive(Debug, Default, Clone, Copy)]
struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write
    {
        writer.write_all(b": ")
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Serialize any value using the robot's wire formatting.
pub fn to_wire_json<T>(value: &T) -> Result<String, TcError>
where
    T: Serialize + ?Sized
{
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, WireFormatter);

    value.serialize(&mut ser)
        .map_err(TcError::SerializationError)?;

    String::from_utf8(buf).map_err(|_| TcError::NonUtf8Payload)
}
