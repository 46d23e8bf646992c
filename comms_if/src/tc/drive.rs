//! # Direct drive telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::{clap::AppSettings, StructOpt};

use super::{Telecommand, TOPIC_REMOTE};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Frame ID sent in the header of every velocity command.
///
/// The firmware matches this literal, it is not the name of any real frame.
pub const FRAME_ID: &str = "frame_id";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An instruction to drive the robot at a given speed and angle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(setting = AppSettings::AllowNegativeNumbers)]
pub struct DrivingInstruction {
    /// The speed of the robot along its linear X axis.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards".
    #[structopt(allow_hyphen_values = true)]
    pub speed: i64,

    /// The angular rate about the robot's Z+ (upwards) axis, in radians.
    #[structopt(default_value = "0.0", allow_hyphen_values = true)]
    pub angle: f64
}

/// A velocity command in the twist-stamped shape expected on [`TOPIC_REMOTE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityCmd {
    pub header: Header,
    pub twist: Twist
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub frame_id: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Linear,
    pub angular: Angular
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    pub x: i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Angular {
    pub z: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DrivingInstruction {
    pub fn new(speed: i64, angle: f64) -> Self {
        Self { speed, angle }
    }

    /// Encode this instruction as a velocity command.
    pub fn to_velocity_cmd(&self) -> VelocityCmd {
        VelocityCmd::new(self.speed, self.angle)
    }
}

impl VelocityCmd {
    /// Create a new velocity command from the given speed and angle.
    pub fn new(speed: i64, angle: f64) -> Self {
        Self {
            header: Header {
                frame_id: String::from(FRAME_ID)
            },
            twist: Twist {
                linear: Linear { x: speed },
                angular: Angular { z: angle }
            }
        }
    }
}

impl From<DrivingInstruction> for VelocityCmd {
    fn from(instr: DrivingInstruction) -> Self {
        instr.to_velocity_cmd()
    }
}

impl Telecommand for VelocityCmd {
    const TOPIC: &'static str = TOPIC_REMOTE;
}
