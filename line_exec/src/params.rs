//! # Line Follower Executable Parameters
//!
//! This module provides parameters for the line follower executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineExecParams {
    /// Path the tick log is written to at the end of the mission. Relative paths are relative to
    /// the software root. The file is overwritten by every mission.
    pub tick_log_path: PathBuf,

    /// Parameter file for line control, relative to the params directory
    pub line_ctrl_params: String,

    /// Parameter file for the simulation rig, relative to the params directory
    pub sim_params: String,

    /// Show per-tick trace messages
    #[serde(default)]
    pub trace: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LineExecParams {
    /// Resolve the tick log path against the given software root.
    pub fn tick_log_path_in<P: AsRef<Path>>(&self, sw_root: P) -> PathBuf {
        if self.tick_log_path.is_absolute() {
            self.tick_log_path.clone()
        }
        else {
            sw_root.as_ref().join(&self.tick_log_path)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tick_log_path() {
        let mut p: LineExecParams = util::params::parse(
            r#"
            tick_log_path = "logs/movement_log.txt"
            line_ctrl_params = "line_ctrl.toml"
            sim_params = "sim.toml"
            "#,
        )
        .unwrap();

        assert!(!p.trace);
        assert_eq!(
            p.tick_log_path_in("/opt/line"),
            PathBuf::from("/opt/line/logs/movement_log.txt")
        );

        p.tick_log_path = PathBuf::from("/tmp/movement_log.txt");
        assert_eq!(p.tick_log_path_in("/opt/line"), PathBuf::from("/tmp/movement_log.txt"));
    }
}
