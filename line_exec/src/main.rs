//! Main line follower executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the equipment, either the simulation rig or a replay of
//!       recorded reflections
//!     - Run the mission loop until the second marker or Ctrl-C:
//!         - Reflection acquisition and marker detection
//!         - Line following or line loss recovery
//!         - Tick logging
//!     - Stop the drive and write the tick log
//!
//! # Usage
//!
//! ```text
//! line_exec [--replay <reflections file>]
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Internal
use line_if::eqpt::{DriveActuator, ReflectionSource};
use line_lib::{
    line_ctrl::{run_mission, LineCtrl, MissionOutcome, MissionReport},
    params::LineExecParams,
    sim::{RecordingDrive, ScriptedSensor, SimRig},
    tick_log::TickLog,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("line_exec", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let exec_params: LineExecParams =
        util::params::load("line_exec.toml").wrap_err("Could not load exec params")?;

    // Initialise logger
    let level = match exec_params.trace {
        true => LevelFilter::Trace,
        false => LevelFilter::Debug,
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Line Follower Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    let sw_root = host::get_line_sw_root().wrap_err("Failed to get the software root")?;
    let tick_log_path = exec_params.tick_log_path_in(&sw_root);

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut line_ctrl = LineCtrl::init(&exec_params.line_ctrl_params)
        .wrap_err("Failed to initialise LineCtrl")?;
    info!("LineCtrl init complete");

    let mut tick_log = TickLog::new(&tick_log_path);
    info!("Tick log will be written to {:?}", tick_log_path);

    info!("Module initialisation complete\n");

    // ---- CANCELLATION ----

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
        })
        .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE EQUIPMENT AND RUN ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let report = match args.len() {
        1 => {
            let rig =
                SimRig::init(&exec_params.sim_params).wrap_err("Failed to initialise the SimRig")?;
            info!("No replay file provided, running on the SimRig\n");

            let mut sensor = rig.clone();
            let mut drive = rig.clone();
            let report = run(&mut line_ctrl, &mut sensor, &mut drive, &mut tick_log, &cancel)?;

            if let Ok((position, heading)) = rig.pose() {
                info!(
                    "Final simulated pose: ({:.2}, {:.2}) cm, heading {:.1} deg",
                    position.x,
                    position.y,
                    heading.to_degrees()
                );
            }

            report
        }
        3 if args[1] == "--replay" => {
            info!("Replaying reflections from \"{}\"\n", &args[2]);

            let mut sensor =
                ScriptedSensor::from_file(&args[2]).wrap_err("Failed to load the replay file")?;
            let mut drive = RecordingDrive::default();
            let report = run(&mut line_ctrl, &mut sensor, &mut drive, &mut tick_log, &cancel)?;

            info!("{} drive demands issued", drive.dems.len());

            report
        }
        _ => {
            return Err(eyre!(
                "Expected either no arguments or `--replay <file>`, found {:?}",
                &args[1..]
            ))
        }
    };

    // ---- SHUTDOWN ----

    match report.outcome {
        MissionOutcome::Completed => info!("Mission completed"),
        MissionOutcome::Cancelled => info!("Mission cancelled by the operator"),
    }
    info!(
        "{} ticks executed, {} markers detected",
        report.num_ticks, report.marker_count
    );
    if !report.flush_ok {
        warn!("The tick log was not written, see the warnings above");
    }

    session.exit();

    info!("End of execution");

    Ok(())
}

/// Run a mission on the given equipment.
fn run<S, D>(
    line_ctrl: &mut LineCtrl,
    sensor: &mut S,
    drive: &mut D,
    tick_log: &mut TickLog,
    cancel: &AtomicBool,
) -> Result<MissionReport, Report>
where
    S: ReflectionSource,
    D: DriveActuator,
{
    info!("Beginning main loop\n");

    run_mission(line_ctrl, sensor, drive, tick_log, cancel)
        .wrap_err("The mission was aborted by a fault")
}
