//! Control performance metrics over a telemetry sequence.
//!
//! Every function here is pure: the same records always give the same
//! report, whether they came from the simulator or a hardware log.

use crate::config::{AnalysisConfig, DEFAULT_ROLLING_WINDOW};
use crate::telemetry::TelemetryRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no telemetry records to analyze")]
    NoData,
    #[error("rolling window must hold at least one sample")]
    InvalidWindow,
}

/// Mean, spread and extremes of one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub rms: f64,
    pub min: f64,
    pub max: f64,
    pub max_abs: f64,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Result<Self, AnalysisError> {
        if values.is_empty() {
            return Err(AnalysisError::NoData);
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mean_square = values.iter().map(|v| v * v).sum::<f64>() / n;

        Ok(Self {
            mean,
            std_dev: variance.sqrt(),
            rms: mean_square.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            max_abs: values.iter().map(|v| v.abs()).fold(0.0, f64::max),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyCycle {
    pub right_percent: f64,
    pub left_percent: f64,
    pub right_on_time_s: f64,
    pub left_on_time_s: f64,
    pub total_elapsed_s: f64,
}

impl DutyCycle {
    pub fn total_active_time_s(&self) -> f64 {
        self.right_on_time_s + self.left_on_time_s
    }
}

/// Sliding-window duty cycle per thruster. `None` until the window fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingDutyCycle {
    pub window: usize,
    pub right_percent: Vec<Option<f64>>,
    pub left_percent: Vec<Option<f64>>,
}

/// Error and controller output aligned sample by sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSeries {
    pub time: Vec<f64>,
    pub error: Vec<f64>,
    pub pid_output: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub sample_count: usize,
    pub error: SeriesStats,
    pub position: SeriesStats,
    pub duty_cycle: DutyCycle,
    pub rolling_duty_cycle: RollingDutyCycle,
    pub phase: PhaseSeries,
    /// +1 right, -1 left, 0 idle, aligned with `phase.time`.
    pub thruster_signal: Vec<i8>,
}

impl AnalysisReport {
    /// Scalar results keyed by metric name.
    pub fn metrics(&self) -> BTreeMap<&'static str, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("sample_count", self.sample_count as f64);
        metrics.insert("mean_error", self.error.mean);
        metrics.insert("error_std_dev", self.error.std_dev);
        metrics.insert("rms_error", self.error.rms);
        metrics.insert("max_error", self.error.max_abs);
        metrics.insert("mean_position", self.position.mean);
        metrics.insert("position_std_dev", self.position.std_dev);
        metrics.insert("min_position", self.position.min);
        metrics.insert("max_position", self.position.max);
        metrics.insert("right_duty_cycle_percent", self.duty_cycle.right_percent);
        metrics.insert("left_duty_cycle_percent", self.duty_cycle.left_percent);
        metrics.insert("total_active_time_s", self.duty_cycle.total_active_time_s());
        metrics.insert("total_elapsed_s", self.duty_cycle.total_elapsed_s);
        metrics
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    rolling_window: usize,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl PerformanceAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::with_window(config.rolling_window)
    }

    pub fn with_window(rolling_window: usize) -> Result<Self, AnalysisError> {
        if rolling_window == 0 {
            return Err(AnalysisError::InvalidWindow);
        }
        Ok(Self { rolling_window })
    }

    pub fn rolling_window(&self) -> usize {
        self.rolling_window
    }

    pub fn analyze(&self, records: &[TelemetryRecord]) -> Result<AnalysisReport, AnalysisError> {
        if records.is_empty() {
            return Err(AnalysisError::NoData);
        }

        let errors: Vec<f64> = records.iter().map(|r| r.error).collect();
        let positions: Vec<f64> = records.iter().map(|r| r.angular_position).collect();

        Ok(AnalysisReport {
            sample_count: records.len(),
            error: SeriesStats::from_values(&errors)?,
            position: SeriesStats::from_values(&positions)?,
            duty_cycle: duty_cycle(records)?,
            rolling_duty_cycle: RollingDutyCycle {
                window: self.rolling_window,
                right_percent: rolling_duty_cycle(records, self.rolling_window, |r| r.right_solenoid),
                left_percent: rolling_duty_cycle(records, self.rolling_window, |r| r.left_solenoid),
            },
            phase: phase_series(records),
            thruster_signal: records.iter().map(TelemetryRecord::thruster_signal).collect(),
        })
    }
}

/// Time span covered by the sequence, including the first sample's interval.
///
/// For a sequence whose cumulative time starts at its first `delta_time`
/// this is the sum of all intervals.
pub fn total_elapsed_time(records: &[TelemetryRecord]) -> f64 {
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => {
            last.cumulative_time - (first.cumulative_time - first.delta_time)
        }
        _ => 0.0,
    }
}

/// Overall duty cycle per thruster.
///
/// On-time uses the mean sample interval as each sample's weight. Zero
/// elapsed time yields 0 % for both thrusters.
pub fn duty_cycle(records: &[TelemetryRecord]) -> Result<DutyCycle, AnalysisError> {
    if records.is_empty() {
        return Err(AnalysisError::NoData);
    }

    let n = records.len() as f64;
    let mean_dt = records.iter().map(|r| r.delta_time).sum::<f64>() / n;
    let right_on = records.iter().filter(|r| r.right_solenoid).count() as f64 * mean_dt;
    let left_on = records.iter().filter(|r| r.left_solenoid).count() as f64 * mean_dt;
    let total = total_elapsed_time(records);

    let percent = |on_time: f64| {
        if total > 0.0 {
            (on_time * 100.0 / total).clamp(0.0, 100.0)
        } else {
            0.0
        }
    };

    Ok(DutyCycle {
        right_percent: percent(right_on),
        left_percent: percent(left_on),
        right_on_time_s: right_on,
        left_on_time_s: left_on,
        total_elapsed_s: total,
    })
}

/// Moving average of a solenoid state over `window` samples, in percent.
///
/// Positions before the window first fills are `None`.
pub fn rolling_duty_cycle<F>(records: &[TelemetryRecord], window: usize, state: F) -> Vec<Option<f64>>
where
    F: Fn(&TelemetryRecord) -> bool,
{
    if window == 0 {
        return vec![None; records.len()];
    }

    let mut on_in_window = 0usize;
    let mut rolling = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if state(record) {
            on_in_window += 1;
        }
        if index >= window && state(&records[index - window]) {
            on_in_window -= 1;
        }

        if index + 1 >= window {
            rolling.push(Some(on_in_window as f64 * 100.0 / window as f64));
        } else {
            rolling.push(None);
        }
    }
    rolling
}

pub fn phase_series(records: &[TelemetryRecord]) -> PhaseSeries {
    PhaseSeries {
        time: records.iter().map(|r| r.cumulative_time).collect(),
        error: records.iter().map(|r| r.error).collect(),
        pid_output: records.iter().map(|r| r.pid_output).collect(),
    }
}
