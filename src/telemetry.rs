//! Telemetry record schema shared by the simulator and the log parser,
//! plus the writer for the bracket-timestamped line format.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Number of comma separated values in one payload.
pub const FIELD_COUNT: usize = 10;

/// Payload column order. Position is the only source of truth.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "delta_time",
    "angular_position",
    "right_solenoid",
    "left_solenoid",
    "gyro_x",
    "gyro_y",
    "gyro_z",
    "pid_output",
    "error",
    "derivative",
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub delta_time: f64,
    pub angular_position: f64,
    pub right_solenoid: bool,
    pub left_solenoid: bool,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub pid_output: f64,
    pub error: f64,
    pub derivative: f64,
    /// Running sum of `delta_time` over the sequence this record belongs to.
    pub cumulative_time: f64,
}

impl TelemetryRecord {
    /// Builds a record from payload values in column order.
    ///
    /// Solenoid columns count as on for any non-zero value. `cumulative_time`
    /// is left at zero until the whole sequence is known.
    pub fn from_fields(fields: &[f64; FIELD_COUNT]) -> Self {
        Self {
            delta_time: fields[0],
            angular_position: fields[1],
            right_solenoid: fields[2] != 0.0,
            left_solenoid: fields[3] != 0.0,
            gyro_x: fields[4],
            gyro_y: fields[5],
            gyro_z: fields[6],
            pid_output: fields[7],
            error: fields[8],
            derivative: fields[9],
            cumulative_time: 0.0,
        }
    }

    pub fn to_fields(&self) -> [f64; FIELD_COUNT] {
        [
            self.delta_time,
            self.angular_position,
            solenoid_value(self.right_solenoid),
            solenoid_value(self.left_solenoid),
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
            self.pid_output,
            self.error,
            self.derivative,
        ]
    }

    /// +1 while the right thruster fires, -1 for the left, 0 when idle.
    pub fn thruster_signal(&self) -> i8 {
        i8::from(self.right_solenoid) - i8::from(self.left_solenoid)
    }

    pub fn payload(&self) -> String {
        self.to_fields()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Formats the record as `[<elapsed seconds>] v0,...,v9`.
    pub fn to_log_line(&self) -> String {
        format!("[{:.3}] {}", self.cumulative_time, self.payload())
    }
}

fn solenoid_value(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Fills `cumulative_time` with the prefix sum of `delta_time`.
pub fn assign_cumulative_time(records: &mut [TelemetryRecord]) {
    let mut elapsed = 0.0;
    for record in records.iter_mut() {
        elapsed += record.delta_time;
        record.cumulative_time = elapsed;
    }
}

/// Writes `records` as a log file the parser can read back.
///
/// The header block has no bracket prefix, so it is skipped on parse.
pub fn write_log(path: &Path, source: &str, records: &[TelemetryRecord]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "Telemetry Log Started: {}", source)?;
    writeln!(writer, "Columns: {}", FIELD_NAMES.join(","))?;
    writeln!(writer, "{}", "-".repeat(50))?;
    writeln!(writer)?;

    for record in records {
        writeln!(writer, "{}", record.to_log_line())?;
    }

    writer.flush()?;
    tracing::info!("Wrote {} telemetry records to {}", records.len(), path.display());
    Ok(())
}
