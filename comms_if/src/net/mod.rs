//! # Network Module
//!
//! This module provides the [`RobotSession`], the single owner of the connection to the robot.
//! Telecommands are published through the session, which guarantees that at most one publish is
//! in flight at any time so that concurrent callers cannot interleave their messages on the wire.
//!
//! The session is generic over a [`Transport`]. The robot is reached through an MQTT broker
//! ([`MqttTransport`]), other transports can be provided for testing or simulation.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod mqtt;
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use std::sync::{Mutex, MutexGuard};

use crate::tc::{ModeCmd, OperationMode, Route, TcError, Telecommand, VelocityCmd};

// Exports
pub use mqtt::MqttTransport;
pub use params::NetParams;
pub use rumqttc;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A fire-and-forget message transport.
pub trait Transport: Send {
    /// Publish the payload on the given topic.
    ///
    /// Returning `Ok` does not mean the message was delivered, only that the transport accepted
    /// it.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError>;

    /// Return whether the transport is still connected.
    fn connected(&self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A session with the robot.
pub struct RobotSession {
    transport: Mutex<Box<dyn Transport>>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a connection to the robot could not be established.
///
/// Only refused, aborted and reset connections are told apart. Everything else, including the
/// broker refusing the client in its ConnAck, is `Other`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionFailure {
    #[error("Connection refused")]
    Refused,

    #[error("Connection aborted")]
    Aborted,

    #[error("Connection reset")]
    Reset,

    #[error("An unexpected error occured during connection: {0}")]
    Other(String)
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("The session is not connected to the robot")]
    NotConnected,

    #[error("The transport could not publish the message: {0}")]
    TransportError(String),

    #[error("Could not encode the telecommand: {0}")]
    EncodeError(TcError),

    #[error("Another thread panicked while publishing, the session is unusable")]
    Poisoned
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not connect to the robot: {0}")]
    ConnectionFailure(ConnectionFailure),

    #[error("Publish failure: {0}")]
    PublishFailure(PublishError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobotSession {
    /// Connect to the robot's broker.
    ///
    /// A failed connection is reported and never retried.
    pub fn connect(params: &NetParams) -> Result<Self, SessionError> {
        info!(
            "Connecting to the robot at {}:{}",
            params.broker_address, params.broker_port
        );

        let transport = MqttTransport::connect(params)
            .map_err(SessionError::ConnectionFailure)?;

        Ok(Self::with_transport(transport))
    }

    /// Create a session over an already connected transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Mutex::new(Box::new(transport))
        }
    }

    /// Return whether the underlying transport is still connected.
    pub fn connected(&self) -> bool {
        match self.lock() {
            Ok(t) => t.connected(),
            Err(_) => false
        }
    }

    /// Publish a raw payload on the given topic.
    ///
    /// Holds the session lock for the duration of the publish.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<(), SessionError> {
        let mut transport = self.lock().map_err(SessionError::PublishFailure)?;

        debug!("Publishing on {}: {}", topic, payload);

        transport
            .publish(topic, payload)
            .map_err(SessionError::PublishFailure)
    }

    /// Encode and publish a telecommand on its topic.
    pub fn publish_tc<T: Telecommand>(&self, tc: &T) -> Result<(), SessionError> {
        let payload = tc
            .to_json()
            .map_err(|e| SessionError::PublishFailure(PublishError::EncodeError(e)))?;

        self.publish(T::TOPIC, &payload)
    }

    /// Publish a single velocity command.
    pub fn send_instruction(&self, speed: i64, angle: f64) -> Result<(), SessionError> {
        self.publish_tc(&VelocityCmd::new(speed, angle))
    }

    /// Publish an operation mode command.
    ///
    /// No transition checks are made here, see `MotionCtrl::set_mode` for the checked version.
    pub fn send_mode(&self, mode: OperationMode) -> Result<(), SessionError> {
        self.publish_tc(&ModeCmd::new(mode))?;
        info!("Mode set to: {}", mode);
        Ok(())
    }

    /// Upload a full route to the robot.
    pub fn send_path(&self, route: &Route) -> Result<(), SessionError> {
        self.publish_tc(route)?;
        info!("Path {} sent", route.path_uuid);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Transport>>, PublishError> {
        self.transport.lock().map_err(|_| PublishError::Poisoned)
    }
}

impl std::fmt::Debug for RobotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotSession")
            .field("connected", &self.connected())
            .finish()
    }
}
