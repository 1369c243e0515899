//! Reconstructs telemetry records from hardware serial logs.
//!
//! A data line looks like `[<timestamp>] v0,v1,...,v9`. Anything else is
//! dropped and noted in the [`ParseReport`]; malformed lines never abort a
//! parse.

use crate::config::ParserConfig;
use crate::log_files::LogFileError;
use crate::telemetry::{assign_cumulative_time, TelemetryRecord, FIELD_COUNT};
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

type Payload = ArrayVec<f64, FIELD_COUNT>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No `[...]` timestamp prefix.
    MissingTimestamp,
    /// Timestamp present but nothing comma separated after it.
    NoPayload,
    /// Payload starts with one of the configured non-data markers.
    Marker(String),
    /// A field did not parse as a finite number.
    NotNumeric { field: usize },
    /// Wrong number of fields.
    FieldCount { found: usize },
    /// Negative `delta_time` would run the clock backwards.
    NegativeDeltaTime,
    /// A zero interval carries no elapsed time.
    ZeroDeltaTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedLine {
    /// 1-based line number in the input.
    pub line_number: usize,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseReport {
    pub records: Vec<TelemetryRecord>,
    pub rejected: Vec<RejectedLine>,
    pub lines_read: usize,
}

impl ParseReport {
    /// True when no line was accepted. Not an error; callers decide.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    /// Rejections excluding blank lines and header text without a timestamp.
    pub fn malformed(&self) -> impl Iterator<Item = &RejectedLine> {
        self.rejected
            .iter()
            .filter(|r| r.reason != RejectReason::MissingTimestamp)
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryLogParser {
    reject_markers: Vec<String>,
}

impl Default for TelemetryLogParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl TelemetryLogParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            reject_markers: config.reject_markers.clone(),
        }
    }

    /// Parses an in-memory log.
    pub fn parse(&self, raw_text: &str) -> ParseReport {
        let mut report = ParseReport::default();
        for line in raw_text.lines() {
            self.accept_line(&mut report, line);
        }
        self.finish(report)
    }

    /// Streams a log file line by line.
    ///
    /// A missing file is reported before any parsing starts. Bytes that are
    /// not valid UTF-8 are replaced, so serial noise only costs its own line.
    pub fn parse_file(&self, path: &Path) -> Result<ParseReport, LogFileError> {
        if !path.is_file() {
            return Err(LogFileError::NotFound(path.to_path_buf()));
        }
        let mut reader = BufReader::new(File::open(path)?);

        let mut report = ParseReport::default();
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buffer);
            self.accept_line(&mut report, line.trim_end_matches(&['\n', '\r'][..]));
        }
        info!("Parsed {}", path.display());
        Ok(self.finish(report))
    }

    pub fn parse_line(&self, line: &str) -> Result<TelemetryRecord, RejectReason> {
        let payload = split_timestamp(line)?;

        if let Some(marker) = self
            .reject_markers
            .iter()
            .find(|m| payload.starts_with(m.as_str()))
        {
            return Err(RejectReason::Marker(marker.clone()));
        }
        if !payload.contains(',') {
            return Err(RejectReason::NoPayload);
        }

        let fields = parse_payload(payload)?;
        let record = TelemetryRecord::from_fields(&fields);
        if record.delta_time < 0.0 {
            return Err(RejectReason::NegativeDeltaTime);
        }
        if record.delta_time == 0.0 {
            return Err(RejectReason::ZeroDeltaTime);
        }
        Ok(record)
    }

    fn accept_line(&self, report: &mut ParseReport, line: &str) {
        report.lines_read += 1;
        match self.parse_line(line) {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                debug!("Skipping line {}: {:?}", report.lines_read, reason);
                report.rejected.push(RejectedLine {
                    line_number: report.lines_read,
                    reason,
                });
            }
        }
    }

    fn finish(&self, mut report: ParseReport) -> ParseReport {
        // Rejected lines never occupy a time slot
        assign_cumulative_time(&mut report.records);
        info!(
            "Accepted {} of {} lines ({} malformed)",
            report.accepted(),
            report.lines_read,
            report.malformed().count()
        );
        report
    }
}

/// Returns the text after the `[...]` timestamp, trimmed.
fn split_timestamp(line: &str) -> Result<&str, RejectReason> {
    let rest = line
        .strip_prefix('[')
        .ok_or(RejectReason::MissingTimestamp)?;
    let (_timestamp, payload) = rest
        .split_once(']')
        .ok_or(RejectReason::MissingTimestamp)?;
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(RejectReason::NoPayload);
    }
    Ok(payload)
}

fn parse_payload(payload: &str) -> Result<[f64; FIELD_COUNT], RejectReason> {
    let mut values = Payload::new();
    let mut found = 0;
    for (index, field) in payload.split(',').enumerate() {
        found += 1;
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| RejectReason::NotNumeric { field: index })?;
        if !value.is_finite() {
            return Err(RejectReason::NotNumeric { field: index });
        }
        // Keep counting past capacity so the report shows the real arity
        let _ = values.try_push(value);
    }

    values
        .into_inner()
        .map_err(|_| RejectReason::FieldCount { found })
}
