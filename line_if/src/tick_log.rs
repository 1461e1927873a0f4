//! # Tick log records
//!
//! One [`LogRecord`] is produced per control tick. On disk the records are stored as plain text,
//! one record per line, with the fields
//!
//! ```text
//! timestamp,reflection,left_speed,right_speed,marker_count
//! ```
//!
//! each printed with two decimal places. There is no header row.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io;

use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of fields in one record line.
pub const NUM_FIELDS: usize = 5;

/// Field names in on-disk order, used in error reports.
pub const FIELD_NAMES: [&str; NUM_FIELDS] = [
    "timestamp",
    "reflection",
    "left_speed",
    "right_speed",
    "marker_count",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The record of a single control tick.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Time since the start of the mission.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// The reflected light sample read on this tick.
    ///
    /// Units: percent
    pub reflection: f64,

    /// Left wheel speed.
    ///
    /// Units: device speed units
    pub left_speed: f64,

    /// Right wheel speed.
    ///
    /// Units: device speed units
    pub right_speed: f64,

    /// Number of markers accepted so far.
    pub marker_count: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while reading a tick log.
///
/// `line` is the 1-based line number of the offending row in the file.
#[derive(Debug, thiserror::Error)]
pub enum LogParseError {
    #[error("Line {line}: expected {expected} fields but found {found} (\"{raw}\")")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
        raw: String,
    },

    #[error("Line {line}: field `{field}` is not a number (\"{raw}\")")]
    NotNumeric {
        line: u64,
        field: &'static str,
        raw: String,
    },

    #[error("Line {line}: marker count must be a non-negative whole number (\"{raw}\")")]
    InvalidMarkerCount { line: u64, raw: String },

    #[error("Could not read the tick log: {0}")]
    Csv(#[from] csv::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogRecord {
    /// The record's fields formatted for the log file.
    pub fn to_fields(&self) -> [String; NUM_FIELDS] {
        [
            format!("{:.2}", self.timestamp_s),
            format!("{:.2}", self.reflection),
            format!("{:.2}", self.left_speed),
            format!("{:.2}", self.right_speed),
            format!("{:.2}", self.marker_count as f64),
        ]
    }

    /// The record as a single log file line, without the line terminator.
    pub fn to_line(&self) -> String {
        self.to_fields().join(",")
    }

    fn from_string_record(record: &StringRecord, line: u64) -> Result<Self, LogParseError> {
        let raw = || record.iter().collect::<Vec<_>>().join(",");

        if record.len() != NUM_FIELDS {
            return Err(LogParseError::FieldCount {
                line,
                expected: NUM_FIELDS,
                found: record.len(),
                raw: raw(),
            });
        }

        let mut values = [0f64; NUM_FIELDS];
        for (i, field) in record.iter().enumerate() {
            values[i] = match field.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    return Err(LogParseError::NotNumeric {
                        line,
                        field: FIELD_NAMES[i],
                        raw: raw(),
                    })
                }
            };
        }

        let count = values[4];
        if count < 0.0 || count.fract() != 0.0 || count > u32::MAX as f64 {
            return Err(LogParseError::InvalidMarkerCount { line, raw: raw() });
        }

        Ok(Self {
            timestamp_s: values[0],
            reflection: values[1],
            left_speed: values[2],
            right_speed: values[3],
            marker_count: count as u32,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Write all records to the writer in order, one per line.
pub fn write_records<W: io::Write>(writer: W, records: &[LogRecord]) -> Result<(), csv::Error> {
    let mut w = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    for record in records {
        w.write_record(&record.to_fields())?;
    }

    w.flush()?;

    Ok(())
}

/// Read every record from a tick log.
///
/// Blank lines (including a trailing newline) are ignored. The first malformed row aborts the
/// read, no partial result is returned.
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<LogRecord>, LogParseError> {
    let mut r = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();

    for (i, result) in r.records().enumerate() {
        let string_record = result?;

        if string_record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let line = string_record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 1);

        records.push(LogRecord::from_string_record(&string_record, line)?);
    }

    Ok(records)
}

/// Parse the contents of a tick log file.
pub fn parse_log(contents: &str) -> Result<Vec<LogRecord>, LogParseError> {
    read_records(contents.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    fn rec(t: f64, r: f64, l: f64, rs: f64, c: u32) -> LogRecord {
        LogRecord {
            timestamp_s: t,
            reflection: r,
            left_speed: l,
            right_speed: rs,
            marker_count: c,
        }
    }

    #[test]
    fn test_line_format() {
        let r = rec(0.05, 50.0, 5.0, 25.0, 1);
        assert_eq!(r.to_line(), "0.05,50.00,5.00,25.00,1.00");

        let r = rec(1.23456, 32.0, -4.5, 34.5, 0);
        assert_eq!(r.to_line(), "1.23,32.00,-4.50,34.50,0.00");
    }

    #[test]
    fn test_write_has_no_header() {
        let mut out = Vec::new();
        write_records(&mut out, &[rec(0.0, 30.0, 15.0, 15.0, 0), rec(0.1, 2.0, 0.0, 0.0, 0)])
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0.00,30.00,15.00,15.00,0.00\n0.10,2.00,0.00,0.00,0.00\n"
        );
    }

    #[test]
    fn test_parse_tolerates_trailing_newline() {
        let records = parse_log("0.00,30.00,15.00,15.00,0.00\n0.05,32.00,16.00,14.00,1.00\n\n")
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], rec(0.05, 32.0, 16.0, 14.0, 1));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let err = parse_log("0.00,30.00,15.00,15.00,0.00\n0.05,32.00,16.00\n").unwrap_err();

        match err {
            LogParseError::FieldCount {
                line,
                expected,
                found,
                raw,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 5);
                assert_eq!(found, 3);
                assert_eq!(raw, "0.05,32.00,16.00");
            }
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_parse_non_numeric() {
        let err = parse_log("0.00,30.00,fast,15.00,0.00\n").unwrap_err();

        match err {
            LogParseError::NotNumeric { line, field, .. } => {
                assert_eq!(line, 1);
                assert_eq!(field, "left_speed");
            }
            e => panic!("Unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_parse_bad_marker_count() {
        assert!(matches!(
            parse_log("0.00,30.00,15.00,15.00,1.50\n"),
            Err(LogParseError::InvalidMarkerCount { line: 1, .. })
        ));
        assert!(matches!(
            parse_log("0.00,30.00,15.00,15.00,-1.00\n"),
            Err(LogParseError::InvalidMarkerCount { line: 1, .. })
        ));
    }

    #[test]
    fn test_written_log_reads_back() {
        let records = vec![rec(0.0, 30.0, 15.0, 15.0, 0), rec(0.05, 33.0, 13.5, 16.5, 1)];
        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();

        assert_eq!(read_records(out.as_slice()).unwrap(), records);
    }
}
