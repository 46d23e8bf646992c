//! Operation mode transition table

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tc::OperationMode::{self, *};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Modes which can be entered from the given mode.
///
/// Requesting the current mode again is always allowed. Once an abort has started the robot can
/// only finish it, and can only leave `Aborted` by being stopped.
pub fn allowed_transitions(from: OperationMode) -> &'static [OperationMode] {
    match from {
        Stopped => &[Stopped, Running, Paused, Aborting],
        Running => &[Running, Stopped, Paused, Aborting],
        Paused => &[Paused, Running, Stopped, Aborting],
        Aborting => &[Aborting, Aborted],
        Aborted => &[Aborted, Stopped]
    }
}

/// Return true if the robot may move from `from` to `to`.
///
/// When the current mode is unknown (`None`) any mode may be requested.
pub fn is_transition_allowed(from: Option<OperationMode>, to: OperationMode) -> bool {
    match from {
        Some(f) => allowed_transitions(f).contains(&to),
        None => true
    }
}
