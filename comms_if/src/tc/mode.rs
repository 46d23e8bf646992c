//! # Operation mode telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};

use super::{TcError, Telecommand, TOPIC_SET_MODE};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The robot-wide operation mode.
///
/// The discriminants are the values the firmware expects in the `operation_mode` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
#[repr(u8)]
pub enum OperationMode {
    Stopped = 1,
    Running = 2,
    Aborting = 3,
    Aborted = 4,
    Paused = 5
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command setting the operation mode of the robot, published on [`TOPIC_SET_MODE`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCmd {
    pub operation_mode: OperationMode
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OperationMode {
    /// All modes, in order of their wire value.
    pub const ALL: [OperationMode; 5] = [
        OperationMode::Stopped,
        OperationMode::Running,
        OperationMode::Aborting,
        OperationMode::Aborted,
        OperationMode::Paused
    ];

    /// Return the integer sent on the wire for this mode.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Get the mode matching the given wire value.
    pub fn from_code(code: i64) -> Result<Self, TcError> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or_else(|| TcError::InvalidCommandValue {
                field: "operation_mode",
                value: code.to_string()
            })
    }
}

impl TryFrom<i64> for OperationMode {
    type Error = TcError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<OperationMode> for i64 {
    fn from(mode: OperationMode) -> Self {
        mode.code()
    }
}

impl FromStr for OperationMode {
    type Err = TcError;

    /// Parse either the mode's name (`"stopped"`, `"RUNNING"`, ...) or its wire value (`"2"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stopped" => Ok(OperationMode::Stopped),
            "running" => Ok(OperationMode::Running),
            "aborting" => Ok(OperationMode::Aborting),
            "aborted" => Ok(OperationMode::Aborted),
            "paused" => Ok(OperationMode::Paused),
            other => match other.parse::<i64>() {
                Ok(code) => Self::from_code(code),
                Err(_) => Err(TcError::InvalidCommandValue {
                    field: "operation_mode",
                    value: s.to_string()
                })
            }
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationMode::Stopped => "STOPPED",
            OperationMode::Running => "RUNNING",
            OperationMode::Aborting => "ABORTING",
            OperationMode::Aborted => "ABORTED",
            OperationMode::Paused => "PAUSED"
        };

        write!(f, "{}", name)
    }
}

impl ModeCmd {
    pub fn new(operation_mode: OperationMode) -> Self {
        Self { operation_mode }
    }
}

impl From<OperationMode> for ModeCmd {
    fn from(mode: OperationMode) -> Self {
        Self::new(mode)
    }
}

impl Telecommand for ModeCmd {
    const TOPIC: &'static str = TOPIC_SET_MODE;
}
