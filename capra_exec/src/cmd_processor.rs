//! # Command processor module
//!
//! Parses operator commands, typed into the shell or given on the command line, and executes
//! them against the robot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{info, warn};
use std::path::{Path, PathBuf};
use structopt::{clap::{self, AppSettings}, StructOpt};

// Internal
use capra_lib::{
    geo::{self, Coordinate},
    geojson::GeoJsonRoute,
    motion_ctrl::MotionCtrl,
    path_store::{self, PathDocument}
};
use comms_if::{
    net::{NetParams, RobotSession},
    tc::{DrivingInstruction, OperationMode}
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command given by the operator.
#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(name = "capra_exec", about = "Capra robot control")]
pub(crate) enum Cmd {
    /// Connect to the robot's broker.
    #[structopt(name = "connect")]
    Connect,

    /// Set the operation mode, by name or number.
    #[structopt(name = "mode")]
    Mode {
        mode: OperationMode
    },

    /// Stop the robot.
    #[structopt(name = "stop")]
    Stop,

    /// Set the robot running.
    #[structopt(name = "run")]
    Run,

    /// Pause the robot.
    #[structopt(name = "pause")]
    Pause,

    /// Abort the robot's current operation.
    #[structopt(name = "abort")]
    Abort,

    /// Drive a distance at the given speed and angle.
    #[structopt(name = "drive", setting = AppSettings::AllowNegativeNumbers)]
    Drive {
        /// Distance to drive, one unit is one second of travel at speed 1.
        #[structopt(allow_hyphen_values = true)]
        distance: f64,

        #[structopt(flatten)]
        instruction: DrivingInstruction
    },

    /// Load a path file, making it the current path.
    #[structopt(name = "load")]
    Load {
        #[structopt(parse(from_os_str))]
        file: PathBuf
    },

    /// Print the geodesic distance of each segment of a path, in metres.
    #[structopt(name = "distances")]
    Distances {
        /// Path file, the current path is used if not given.
        #[structopt(parse(from_os_str))]
        file: Option<PathBuf>
    },

    /// Upload a path to the robot.
    #[structopt(name = "send-path")]
    SendPath {
        /// Path file, the current path is used if not given.
        #[structopt(parse(from_os_str))]
        file: Option<PathBuf>
    },

    /// Export a path as GeoJSON.
    #[structopt(name = "geojson")]
    GeoJson {
        /// Path file, the current path is used if not given.
        #[structopt(parse(from_os_str))]
        file: Option<PathBuf>,

        /// Write to this file instead of printing.
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>
    },

    /// Great circle distance (km), central angle and initial bearing between two points.
    #[structopt(name = "haversine", setting = AppSettings::AllowNegativeNumbers)]
    Haversine {
        #[structopt(allow_hyphen_values = true)]
        lat1: f64,
        #[structopt(allow_hyphen_values = true)]
        lon1: f64,
        #[structopt(allow_hyphen_values = true)]
        lat2: f64,
        #[structopt(allow_hyphen_values = true)]
        lon2: f64
    },

    /// Exit the shell.
    #[structopt(name = "exit")]
    Exit
}

/// What the shell should do after a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds everything commands act on between invocations.
pub(crate) struct CmdProcessor {
    net_params: NetParams,

    motion_ctrl: MotionCtrl,

    robot: Option<RobotSession>,

    /// The last path loaded with `load`.
    current_path: Option<PathDocument>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Cmd {
    /// Parse a line typed into the shell.
    ///
    /// Returns `Ok(None)` for an empty line. Help requests and usage errors are returned as clap
    /// errors for the caller to print.
    pub(crate) fn from_line(line: &str) -> Result<Option<Self>, clap::Error> {
        let words: Vec<&str> = line.split_whitespace().collect();

        if words.is_empty() {
            return Ok(None)
        }

        Self::from_iter_safe(std::iter::once("capra_exec").chain(words)).map(Some)
    }

    /// Return true if the command has to talk to the robot.
    pub(crate) fn needs_robot(&self) -> bool {
        matches!(
            self,
            Cmd::Mode { .. }
                | Cmd::Stop
                | Cmd::Run
                | Cmd::Pause
                | Cmd::Abort
                | Cmd::Drive { .. }
                | Cmd::SendPath { .. }
        )
    }
}

impl CmdProcessor {
    pub(crate) fn new(net_params: NetParams, motion_ctrl: MotionCtrl) -> Self {
        Self {
            net_params,
            motion_ctrl,
            robot: None,
            current_path: None
        }
    }

    pub(crate) fn motion_ctrl(&self) -> &MotionCtrl {
        &self.motion_ctrl
    }

    /// Connect to the robot, replacing any existing connection.
    pub(crate) fn connect(&mut self) -> Result<(), Report> {
        // Drop the old session first so its client disconnects before the new one connects
        self.robot = None;

        let robot = RobotSession::connect(&self.net_params)
            .wrap_err("Could not connect to the robot")?;

        info!("Connected to the robot");
        self.robot = Some(robot);

        Ok(())
    }

    /// Execute a command.
    pub(crate) fn exec(&mut self, cmd: Cmd) -> Result<Flow, Report> {
        match cmd {
            Cmd::Connect => self.connect()?,
            Cmd::Mode { mode } => {
                let robot = connected(&self.robot)?;
                self.motion_ctrl.set_mode(robot, mode)?;
            },
            Cmd::Stop => self.motion_ctrl.stop(connected(&self.robot)?)?,
            Cmd::Run => self.motion_ctrl.run(connected(&self.robot)?)?,
            Cmd::Pause => self.motion_ctrl.pause(connected(&self.robot)?)?,
            Cmd::Abort => self.motion_ctrl.abort(connected(&self.robot)?)?,
            Cmd::Drive { distance, instruction } => {
                let DrivingInstruction { speed, angle } = instruction;

                self.motion_ctrl
                    .params()
                    .limits
                    .check(distance, speed, angle)
                    .wrap_err("Drive request rejected")?;

                let robot = connected(&self.robot)?;
                let report = self.motion_ctrl.drive_distance(robot, distance, speed, angle)?;

                if report.cancelled {
                    println!(
                        "Drive cancelled after {} commands ({} covered)",
                        report.instructions_sent, report.distance_covered
                    );
                }
                else {
                    println!("Drive complete: {} commands sent", report.instructions_sent);
                }
            },
            Cmd::Load { file } => {
                let doc = path_store::load(&file)
                    .wrap_err_with(|| format!("Could not load {:?}", file))?;

                match doc.num_nodes() {
                    Some(n) => println!("Loaded {:?}: {} nodes", file, n),
                    None => println!("Loaded {:?}: no nodes", file)
                }
                if !doc.is_sequence_ordered() {
                    warn!("Nodes of {:?} are not in sequence order", file);
                }

                self.current_path = Some(doc);
            },
            Cmd::Distances { file } => {
                let doc = self.path(file.as_deref())?;
                let distances = geo::segment_distances(&doc)?;

                for (i, d) in distances.iter().enumerate() {
                    println!("{:>4}: {:.3} m", i, d);
                }
                println!("Total: {:.3} m", distances.iter().sum::<f64>());
            },
            Cmd::SendPath { file } => {
                let route = self.path(file.as_deref())?.route()?;
                connected(&self.robot)?.send_path(&route)?;
                println!("Sent path {} ({} nodes)", route.path_uuid, route.nodes.len());
            },
            Cmd::GeoJson { file, output } => {
                let route = self.path(file.as_deref())?.route()?;
                let text = serde_json::to_string_pretty(&GeoJsonRoute::from_route(&route))?;

                match output {
                    Some(out) => {
                        std::fs::write(&out, text)
                            .wrap_err_with(|| format!("Could not write {:?}", out))?;
                        println!("GeoJSON written to {:?}", out);
                    },
                    None => println!("{}", text)
                }
            },
            Cmd::Haversine { lat1, lon1, lat2, lon2 } => {
                let a = Coordinate::geodetic(lat1, lon1)?;
                let b = Coordinate::geodetic(lat2, lon2)?;

                let result = geo::pairwise_distance_and_bearing(a, b);

                println!("Distance:       {:.4} km", result.distance_km);
                println!("Central angle:  {:.4} rad", result.central_angle_rad);
                println!("Bearing:        {:.4} rad", geo::initial_bearing(a, b));
            },
            Cmd::Exit => return Ok(Flow::Exit)
        }

        Ok(Flow::Continue)
    }

    /// Get the path document from the file, or the current path if no file is given.
    fn path(&self, file: Option<&Path>) -> Result<PathDocument, Report> {
        match file {
            Some(f) => path_store::load(f).wrap_err_with(|| format!("Could not load {:?}", f)),
            None => self
                .current_path
                .clone()
                .ok_or_else(|| eyre!("No path given and no path loaded, use `load <file>` first"))
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn connected(robot: &Option<RobotSession>) -> Result<&RobotSession, Report> {
    robot
        .as_ref()
        .ok_or_else(|| eyre!("Not connected to the robot, use `connect` first"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_drive() {
        assert_eq!(
            Cmd::from_line("drive 2.5 -1 0.3").unwrap(),
            Some(Cmd::Drive {
                distance: 2.5,
                instruction: DrivingInstruction::new(-1, 0.3)
            })
        );

        // Angle defaults to straight ahead
        assert_eq!(
            Cmd::from_line("drive 1 2").unwrap(),
            Some(Cmd::Drive {
                distance: 1.0,
                instruction: DrivingInstruction::new(2, 0.0)
            })
        );

        assert_eq!(
            Cmd::from_line("drive 1 -2").unwrap(),
            Some(Cmd::Drive {
                distance: 1.0,
                instruction: DrivingInstruction::new(-2, 0.0)
            })
        );
        assert_eq!(
            Cmd::from_line("drive 1 1 -0.5").unwrap(),
            Some(Cmd::Drive {
                distance: 1.0,
                instruction: DrivingInstruction::new(1, -0.5)
            })
        );

        assert!(Cmd::from_line("drive 1").is_err());
        assert!(Cmd::from_line("drive 1 fast").is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(
            Cmd::from_line("mode running").unwrap(),
            Some(Cmd::Mode { mode: OperationMode::Running })
        );
        assert_eq!(
            Cmd::from_line("mode 5").unwrap(),
            Some(Cmd::Mode { mode: OperationMode::Paused })
        );
        assert!(Cmd::from_line("mode 9").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Cmd::from_line("   ").unwrap(), None);
        assert_eq!(Cmd::from_line("exit").unwrap(), Some(Cmd::Exit));
        assert_eq!(
            Cmd::from_line("haversine 52.2 21.0 -33.9 -151.2").unwrap(),
            Some(Cmd::Haversine { lat1: 52.2, lon1: 21.0, lat2: -33.9, lon2: -151.2 })
        );
        assert_eq!(
            Cmd::from_line("haversine -33.9 151.2 40.7 -74.0").unwrap(),
            Some(Cmd::Haversine { lat1: -33.9, lon1: 151.2, lat2: 40.7, lon2: -74.0 })
        );
        assert_eq!(
            Cmd::from_line("geojson route.json -o out.geojson").unwrap(),
            Some(Cmd::GeoJson {
                file: Some(PathBuf::from("route.json")),
                output: Some(PathBuf::from("out.geojson"))
            })
        );
        assert!(Cmd::from_line("fly").is_err());
    }

    #[test]
    fn test_needs_robot() {
        assert!(Cmd::Stop.needs_robot());
        assert!(Cmd::SendPath { file: None }.needs_robot());
        assert!(!Cmd::Distances { file: None }.needs_robot());
        assert!(!Cmd::Connect.needs_robot());
    }

    #[test]
    fn test_robot_commands_need_connection() {
        let mut processor = CmdProcessor::new(
            NetParams::new("127.0.0.1", 1883),
            MotionCtrl::new(Default::default())
        );

        assert!(processor.exec(Cmd::Run).is_err());
        assert!(processor.exec(Cmd::Distances { file: None }).is_err());
        assert_eq!(processor.exec(Cmd::Exit).unwrap(), Flow::Exit);
    }
}
