//! # MQTT transport
//!
//! Publishes telecommands to the robot's MQTT broker.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use rumqttc::{
    Client, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, Outgoing, Packet,
    QoS
};
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc
    },
    thread,
    time::Duration
};

use super::{ConnectionFailure, NetParams, PublishError, Transport};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An MQTT client which is monitored providing additional information.
///
/// A background thread drives the client's event loop and updates whether or not the broker is
/// still connected. The thread exits when the connection is lost or the client is dropped, the
/// connection is never re-established automatically.
pub struct MqttTransport {
    client: Client,

    join_handle: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MqttTransport {
    /// Connect to the broker described by `params`.
    ///
    /// This blocks until the broker has acknowledged the connection or the connection attempt
    /// failed.
    pub fn connect(params: &NetParams) -> Result<Self, ConnectionFailure> {
        let mut options = MqttOptions::new(
            params.client_id.clone(),
            params.broker_address.clone(),
            params.broker_port
        );
        options.set_keep_alive(Duration::from_secs(params.keep_alive_s));
        options.set_clean_session(true);

        let (client, mut connection) = Client::new(options, params.request_cap);

        // Block until the broker accepts or refuses us
        wait_for_connack(&mut connection)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let connected = Arc::new(AtomicBool::new(true));

        // Create clones for use by the monitor thread
        let shutdown_clone = shutdown.clone();
        let connected_clone = connected.clone();

        let join_handle = thread::spawn(move || monitor_connection(
            connection,
            shutdown_clone,
            connected_clone
        ));

        info!(
            "Connected to broker at {}:{}",
            params.broker_address, params.broker_port
        );

        Ok(Self {
            client,
            join_handle: Some(join_handle),
            shutdown,
            connected
        })
    }
}

impl Transport for MqttTransport {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        if !self.connected() {
            return Err(PublishError::NotConnected)
        }

        // QoS 0: no acknowledgement, at most once delivery
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| PublishError::TransportError(e.to_string()))
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Disconnecting wakes the event loop so the monitor sees the shutdown flag
        if let Err(e) = self.client.disconnect() {
            debug!("Could not send disconnect to the broker: {}", e);
        }

        if let Some(jh) = self.join_handle.take() {
            if jh.join().is_err() {
                warn!("MQTT monitor thread panicked");
            }
        }
    }
}

impl From<io::Error> for ConnectionFailure {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => ConnectionFailure::Refused,
            io::ErrorKind::ConnectionAborted => ConnectionFailure::Aborted,
            io::ErrorKind::ConnectionReset => ConnectionFailure::Reset,
            _ => ConnectionFailure::Other(e.to_string())
        }
    }
}

impl From<ConnectionError> for ConnectionFailure {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::Io(e) => e.into(),
            ConnectionError::ConnectionRefused(code) => broker_refused(code),
            e => ConnectionFailure::Other(e.to_string())
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// A refusal in the broker's ConnAck.
fn broker_refused(code: ConnectReturnCode) -> ConnectionFailure {
    ConnectionFailure::Other(format!("broker refused: {:?}", code))
}

/// Drive the connection until the broker's ConnAck is received.
fn wait_for_connack(connection: &mut Connection) -> Result<(), ConnectionFailure> {
    loop {
        let event = match connection.iter().next() {
            Some(e) => e,
            None => return Err(ConnectionFailure::Other(
                String::from("Client closed before the connection was established")
            ))
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    code => Err(broker_refused(code))
                }
            },
            Ok(_) => continue,
            Err(e) => return Err(e.into())
        }
    }
}

fn monitor_connection(
    mut connection: Connection,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>
) {
    for event in connection.iter() {
        match event {
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!("Broker closed the connection");
                break;
            },
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Disconnected from the broker");
                break;
            },
            Ok(_) => (),
            Err(e) => {
                // Expected once the client is dropped
                if !shutdown.load(Ordering::Relaxed) {
                    warn!("Connection to the broker lost: {}", e);
                }
                break;
            }
        }

        if shutdown.load(Ordering::Relaxed) {
            break;
        }
    }

    connected.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_connack_refusal_maps_to_other() {
        let failure = ConnectionFailure::from(
            ConnectionError::ConnectionRefused(ConnectReturnCode::NotAuthorized)
        );

        assert_eq!(
            failure,
            ConnectionFailure::Other(String::from("broker refused: NotAuthorized"))
        );
    }

    #[test]
    fn test_connection_io_error_keeps_kind() {
        let failure = ConnectionFailure::from(ConnectionError::Io(
            io::Error::from(io::ErrorKind::ConnectionReset)
        ));

        assert_eq!(failure, ConnectionFailure::Reset);
    }
}
