//! Mission runner, the line follower's main loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use super::{LineCtrl, LineCtrlError, MissionState};
use crate::tick_log::TickLog;
use line_if::{
    eqpt::{DriveActuator, ReflectionSource},
    tick_log::LogRecord,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a finished mission.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MissionReport {
    pub outcome: MissionOutcome,

    /// Number of control ticks executed, equal to the number of log records.
    pub num_ticks: u64,

    /// Number of markers accepted during the mission.
    pub marker_count: u32,

    /// False if the drive could not be stopped at the end of the mission.
    pub stop_ok: bool,

    /// False if the tick log could not be written.
    pub flush_ok: bool,
}

/// Stops the drive and flushes the tick log when the mission ends, however
/// it ends.
///
/// The normal exit path calls `finish`, any other exit (an error returned
/// with `?` or a panic) runs the same cleanup from `Drop`.
struct MissionGuard<'a, D: DriveActuator> {
    drive: &'a mut D,
    tick_log: &'a mut TickLog,
    done: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MissionOutcome {
    /// The second marker was reached.
    Completed,

    /// The cancel flag was raised.
    Cancelled,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run line control until the mission completes, the cancel flag is raised,
/// or an equipment fault occurs.
///
/// One [`LogRecord`] is appended to `tick_log` per tick, timestamped at the
/// end of the tick relative to the start of the mission. On every exit path
/// the drive is stopped and the tick log flushed. Failing to flush the log
/// is reported in the returned [`MissionReport`] and as a warning, it does
/// not fail the mission.
///
/// The cancel flag is only checked between ticks, so a blocking manouvre or
/// recovery search is always allowed to finish.
pub fn run_mission<S, D>(
    ctrl: &mut LineCtrl,
    sensor: &mut S,
    drive: &mut D,
    tick_log: &mut TickLog,
    cancel: &AtomicBool,
) -> Result<MissionReport, LineCtrlError>
where
    S: ReflectionSource,
    D: DriveActuator,
{
    let cycle_period = Duration::from_secs_f64(ctrl.params().cycle_period_s);
    let mission_start = Instant::now();
    let mut guard = MissionGuard {
        drive,
        tick_log,
        done: false,
    };
    let mut num_ticks: u64 = 0;

    info!("Beginning mission, tick period {:.3} s", cycle_period.as_secs_f64());

    let outcome = loop {
        if cancel.load(Ordering::Relaxed) {
            info!("Mission cancelled after {} ticks", num_ticks);
            break MissionOutcome::Cancelled;
        }

        let cycle_start_instant = Instant::now();

        let (output, report) = ctrl.proc(sensor, &mut *guard.drive)?;
        num_ticks += 1;

        // ---- CYCLE MANAGEMENT ----

        if output.state != MissionState::Stopped {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                // Manouvres and searches are expected to take longer than a
                // tick
                None if report.blocked => debug!(
                    "Tick {} blocked for {:.06} s ({:?})",
                    num_ticks,
                    cycle_dur.as_secs_f64(),
                    output.action
                ),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                ),
            }
        }

        // ---- TICK LOG ----

        let (left_speed, right_speed) = ctrl.logged_speeds(&output);
        guard.tick_log.append(LogRecord {
            timestamp_s: mission_start.elapsed().as_secs_f64(),
            reflection: output.reflection,
            left_speed,
            right_speed,
            marker_count: output.marker_count,
        });

        if output.state == MissionState::Stopped {
            info!("Mission complete after {} ticks", num_ticks);
            break MissionOutcome::Completed;
        }
    };

    let (stop_ok, flush_ok) = guard.finish();

    Ok(MissionReport {
        outcome,
        num_ticks,
        marker_count: ctrl.marker_count(),
        stop_ok,
        flush_ok,
    })
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a, D: DriveActuator> MissionGuard<'a, D> {
    /// Run the cleanup on the normal exit path, returning whether the stop
    /// and the flush succeeded.
    fn finish(mut self) -> (bool, bool) {
        self.done = true;
        self.cleanup()
    }

    fn cleanup(&mut self) -> (bool, bool) {
        let stop_ok = match self.drive.stop() {
            Ok(()) => true,
            Err(e) => {
                error!("Could not stop the drive: {}", e);
                false
            }
        };

        let flush_ok = match self.tick_log.flush() {
            Ok(()) => {
                info!(
                    "Tick log ({} records) written to {:?}",
                    self.tick_log.len(),
                    self.tick_log.path()
                );
                true
            }
            Err(e) => {
                warn!("Could not write the tick log: {}", e);
                false
            }
        };

        (stop_ok, flush_ok)
    }
}

impl<'a, D: DriveActuator> Drop for MissionGuard<'a, D> {
    fn drop(&mut self) {
        if !self.done {
            warn!("Mission ended abnormally, stopping the drive and writing the tick log");
            self.cleanup();
        }
    }
}
