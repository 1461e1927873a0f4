//! Ground executable, reconstructs the path driven by the line follower.
//!
//! # Usage
//!
//! ```text
//! gnd_exec <tick log>
//! ```
//!
//! The tick log is parsed, the trajectory reconstructed, and the result saved
//! as `trajectory.json` in the session's archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info};
use std::env;
use std::fs;

// Internal
use gnd_lib::recon::{self, ReconError};
use line_if::tick_log::parse_log;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("gnd_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Line Follower Ground Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: recon::Params = util::params::load("gnd_exec.toml")
        .map_err(ReconError::ParamLoadError)
        .wrap_err("Could not load reconstruction params")?;

    info!("Parameters loaded");

    // ---- LOAD LOG ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected a single argument, the path to the tick log, found {}",
            args.len() - 1
        ));
    }

    let contents = fs::read_to_string(&args[1])
        .wrap_err_with(|| format!("Could not read the tick log \"{}\"", &args[1]))?;

    let records = parse_log(&contents).wrap_err("Could not parse the tick log")?;

    info!("Loaded {} records from \"{}\"", records.len(), &args[1]);

    // ---- RECONSTRUCT ----

    let traj = recon::reconstruct(&records, &params).wrap_err("Reconstruction failed")?;

    match (traj.start(), traj.end()) {
        (Some(start), Some(end)) => {
            info!(
                "Start: ({:.2}, {:.2}) cm, heading {:.1} deg",
                start.position_cm.x,
                start.position_cm.y,
                start.heading_rad.to_degrees()
            );
            info!(
                "End: ({:.2}, {:.2}) cm, heading {:.1} deg",
                end.position_cm.x,
                end.position_cm.y,
                end.heading_rad.to_degrees()
            );
        }
        _ => info!("The tick log is empty, nothing to reconstruct"),
    }

    for m in traj.markers.iter() {
        info!(
            "Marker {} at t = {:.2} s: ({:.2}, {:.2}) cm",
            m.marker_count, m.timestamp_s, m.pose.position_cm.x, m.pose.position_cm.y
        );
    }

    info!("Path length: {:.2} cm", traj.path_length_cm());

    // ---- SAVE ----

    session.save("trajectory.json", traj);

    session.exit();

    info!("End of execution");

    Ok(())
}
