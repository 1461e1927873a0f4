//! # Tick log
//!
//! The tick log keeps one [`LogRecord`] per control tick in memory for the duration of a mission.
//! Nothing touches the disk until [`TickLog::flush`] is called, which writes the whole log as a
//! single batch. The batch is written to a temporary file next to the target which is then renamed
//! over it, so a reader never sees a partially written log.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use line_if::tick_log::{write_records, LogRecord};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// In-memory, append only, log of control ticks.
#[derive(Debug)]
pub struct TickLog {
    path: PathBuf,
    records: Vec<LogRecord>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TickLogError {
    #[error("Could not create the tick log directory {0:?}: {1}")]
    CreateDirError(PathBuf, std::io::Error),

    #[error("Could not serialise the tick log: {0}")]
    SerialiseError(csv::Error),

    #[error("Could not write the tick log to {0:?}: {1}")]
    WriteError(PathBuf, std::io::Error),

    #[error("Could not move the tick log into place at {0:?}: {1}")]
    RenameError(PathBuf, std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TickLog {
    /// Create a new empty log which will be flushed to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every record to the log file, replacing any previous file.
    ///
    /// Records are kept in memory, so flushing again rewrites the same complete log.
    pub fn flush(&self) -> Result<(), TickLogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| TickLogError::CreateDirError(parent.to_path_buf(), e))?;
            }
        }

        let mut buf = Vec::new();
        write_records(&mut buf, &self.records).map_err(TickLogError::SerialiseError)?;

        let tmp_path = self.tmp_path();

        fs::write(&tmp_path, &buf).map_err(|e| TickLogError::WriteError(tmp_path.clone(), e))?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            fs::remove_file(&tmp_path).ok();
            return Err(TickLogError::RenameError(self.path.clone(), e));
        }

        debug!("Flushed {} tick records to {:?}", self.records.len(), self.path);

        Ok(())
    }

    /// Path of the temporary file, `<file name>.tmp` in the same directory as the log.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("tick_log"));
        name.push(".tmp");

        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use line_if::tick_log::parse_log;

    fn rec(t: f64, c: u32) -> LogRecord {
        LogRecord {
            timestamp_s: t,
            reflection: 30.0,
            left_speed: 15.0,
            right_speed: 15.0,
            marker_count: c,
        }
    }

    #[test]
    fn test_flush_writes_all_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movement_log.txt");

        let mut log = TickLog::new(&path);
        for i in 0..5 {
            log.append(rec(i as f64 * 0.5, i / 3));
        }
        log.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 5);
        assert_eq!(contents.lines().next(), Some("0.00,30.00,15.00,15.00,0.00"));
        assert_eq!(parse_log(&contents).unwrap(), log.records());
        assert!(!dir.path().join("movement_log.txt.tmp").exists());
    }

    #[test]
    fn test_flush_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let mut log = TickLog::new(&path);
        log.append(rec(0.0, 0));
        log.append(rec(0.05, 1));

        log.flush().unwrap();
        let first = fs::read_to_string(&path).unwrap();
        log.flush().unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_flush_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "stale\nstale\nstale\n").unwrap();

        let mut log = TickLog::new(&path);
        log.append(rec(0.0, 0));
        log.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "0.00,30.00,15.00,15.00,0.00\n");
    }

    #[test]
    fn test_flush_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run").join("log.txt");

        let log = TickLog::new(&path);
        log.flush().unwrap();

        assert!(path.exists());
        assert!(log.is_empty());
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        // A directory where the log file should be
        let path = dir.path().join("log.txt");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut log = TickLog::new(&path);
        log.append(rec(0.0, 0));

        assert!(log.flush().is_err());
        assert!(!dir.path().join("log.txt.tmp").exists());
    }
}
