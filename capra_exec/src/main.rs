//! Capra control executable entry point.
//!
//! # Usage
//!
//! Without arguments an interactive shell is started, type `help` for the list of commands. With
//! arguments a single command is executed, connecting to the robot first if the command needs it,
//! for example:
//!
//! ```text
//! capra_exec drive 2.0 1 0.2
//! ```
//!
//! A drive in progress is cancelled with Ctrl-C.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::env;
use structopt::StructOpt;

// Internal
use capra_lib::motion_ctrl::{self, MotionCtrl};
use cmd_processor::{Cmd, CmdProcessor, Flow};
use comms_if::net::NetParams;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "capra $ ";

/// Name of the shell history file, kept in the sessions directory.
const HISTORY_FILE: &str = "capra_exec_history.txt";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("capra_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Capra Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;
    let motion_params: motion_ctrl::Params = util::params::load("motion_ctrl.toml")
        .wrap_err("Could not load motion control params")?;

    info!("Exec parameters loaded");
    debug!("Drive limits: {:?}", motion_params.limits);

    // ---- INITIALISE MODULES ----

    let mut processor = CmdProcessor::new(net_params, MotionCtrl::new(motion_params));

    let cancel = processor.motion_ctrl().cancel_token();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling drive");
        cancel.cancel();
    })
    .wrap_err("Failed to set the interrupt handler")?;

    // ---- RUN ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    if args.len() > 1 {
        run_once(&mut processor, &args)
    }
    else {
        run_shell(&mut processor, &session)
    }
}

/// Execute the single command given on the command line.
fn run_once(processor: &mut CmdProcessor, args: &[String]) -> Result<(), Report> {
    let cmd = match Cmd::from_iter_safe(args) {
        Ok(c) => c,
        Err(e) => e.exit()
    };

    if cmd.needs_robot() {
        processor.connect()?;
    }

    processor.exec(cmd)?;

    Ok(())
}

/// Run the interactive shell until `exit`, Ctrl-C or Ctrl-D.
fn run_shell(processor: &mut CmdProcessor, session: &Session) -> Result<(), Report> {
    let mut rl = DefaultEditor::new().wrap_err("Failed to start the shell")?;

    let history_path = session
        .session_root
        .parent()
        .map(|p| p.join(HISTORY_FILE));

    if let Some(ref p) = history_path {
        if rl.load_history(p).is_err() {
            info!("No shell history found at {:?}", p);
        }
    }

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Shell error: {}", e);
                break
            }
        };

        rl.add_history_entry(line.as_str()).ok();

        let cmd = match Cmd::from_line(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e.message);
                continue
            }
        };

        debug!("Executing {:?}", cmd);

        match processor.exec(cmd) {
            Ok(Flow::Continue) => (),
            Ok(Flow::Exit) => break,
            Err(e) => error!("{:?}", e)
        }
    }

    if let Some(p) = history_path {
        if let Err(e) = rl.save_history(&p) {
            warn!("Could not save shell history to {:?}: {}", p, e);
        }
    }

    info!("Exiting");

    Ok(())
}
