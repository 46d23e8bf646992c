//! Network parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing how to reach the robot's message broker.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Address of the broker, usually the robot itself.
    pub broker_address: String,

    /// Port of the broker.
    pub broker_port: u16,

    /// Client ID presented to the broker.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep alive interval.
    ///
    /// Units: seconds
    #[serde(default = "default_keep_alive_s")]
    pub keep_alive_s: u64,

    /// Number of outgoing requests which may be queued before a publish blocks.
    #[serde(default = "default_request_cap")]
    pub request_cap: usize
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetParams {
    /// Parameters for the given broker, with defaults for all other values.
    pub fn new(broker_address: &str, broker_port: u16) -> Self {
        Self {
            broker_address: String::from(broker_address),
            broker_port,
            client_id: default_client_id(),
            keep_alive_s: default_keep_alive_s(),
            request_cap: default_request_cap()
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_client_id() -> String {
    String::from("capra_exec")
}

fn default_keep_alive_s() -> u64 {
    5
}

fn default_request_cap() -> usize {
    10
}
