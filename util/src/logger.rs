//! Logger initialisation
//!
//! Log records go to stdout, with coloured level tags, and to the session's log file as plain
//! text. Every record is stamped with the number of seconds since the session epoch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::Colorize;
use log::{self, info, Level};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Crates which are too verbose below `Info`.
const QUIET_DEPENDENCIES: [&str; 2] = ["rumqttc", "mio"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be `INFO` or more verbose, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `Info` or more verbose, so that the information records emitted by the
/// executables are never lost. Can only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Record::from_log(record, message, true)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Record::from_log(record, message, false)))
        })
        .chain(log_file);

    let mut dispatch = fern::Dispatch::new().level(min_level);
    for dep in QUIET_DEPENDENCIES.iter() {
        dispatch = dispatch.level_for(*dep, LevelFilter::Info);
    }

    dispatch
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE
// ---------------------------------------------------------------------------

/// A single formatted log line.
struct Record<'a> {
    elapsed_s: f64,
    level: Level,
    target: &'a str,
    message: &'a dyn fmt::Display,
    colour: bool
}

impl<'a> Record<'a> {
    fn from_log(record: &'a log::Record, message: &'a dyn fmt::Display, colour: bool) -> Self {
        Self {
            elapsed_s: session::get_elapsed_seconds(),
            level: record.level(),
            target: record.target(),
            message,
            colour
        }
    }
}

impl<'a> fmt::Display for Record<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = level_tag(self.level);

        write!(f, "[{:10.6} ", self.elapsed_s)?;

        if self.colour {
            let tag = match self.level {
                Level::Trace => tag.dimmed().italic(),
                Level::Debug => tag.dimmed(),
                Level::Info => tag.normal(),
                Level::Warn => tag.yellow(),
                Level::Error => tag.red().bold()
            };
            write!(f, "{}]", tag)?;
        }
        else {
            write!(f, "{}]", tag)?;
        }

        // Targets are only useful when debugging
        if self.level > Level::Info {
            write!(f, " {}:", self.target)?;
        }

        write!(f, " {}", self.message)
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR"
    }
}
