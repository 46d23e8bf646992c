//! Motion control module
//!
//! Drives the robot by streaming velocity commands at a fixed rate, and changes the robot's
//! operation mode subject to a transition table.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod clock;
mod params;
mod state;
mod transitions;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::{net::SessionError, tc::OperationMode};

// Internal
pub use clock::*;
pub use params::*;
pub use state::*;
pub use transitions::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period between two velocity commands of a drive.
///
/// Units: seconds
pub const TICK_PERIOD_S: f64 = 0.1;

/// Distance, and per tick step, used for a zero speed drive so that exactly one command is sent.
pub const ZERO_SPEED_DISTANCE: f64 = 0.1;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Robot session error: {0}")]
    SessionError(SessionError),

    #[error("Invalid value for {field}: {value}")]
    InvalidCommandValue {
        field: &'static str,
        value: String
    },

    #[error("Cannot change the operation mode from {from} to {to}")]
    IllegalTransition {
        from: OperationMode,
        to: OperationMode
    }
}
