//! # Spin Axis Attitude Control Simulator
//!
//! Closed-loop model and telemetry analysis for a spin-stabilized test body
//! steered by two opposing solenoid thrusters.
//!
//! ## Features
//!
//! - **Rigid body dynamics**: explicit single-axis integration under applied torque
//! - **PID control**: configurable gains, anti-windup and angle wrapping
//! - **Bang-bang actuation**: controller output discretized into thruster firings
//! - **Telemetry parsing**: timestamped hardware logs into the simulator's record schema
//! - **Performance analysis**: error statistics, duty cycles and phase series
//!
//! ## Quick Start
//!
//! ```rust
//! use spinsim::{GncConfig, PerformanceAnalyzer, SimulationLoop};
//!
//! let mut config = GncConfig::default();
//! config.disturbance.seed = Some(1);
//!
//! let run = SimulationLoop::from_config(&config)?.run();
//! let report = PerformanceAnalyzer::default().analyze(&run.records)?;
//! println!("RMS error: {:.3} rad", report.error.rms);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`dynamics`] - Rigid body model and append-only state history
//! - [`pid`] - Heading controller
//! - [`control_law`] - Output to thruster command mapping
//! - [`disturbance`] - Random environmental torque
//! - [`simulation`] - Closed loop composing the above
//! - [`telemetry`] - Record schema and log writer
//! - [`log_parser`] - Hardware log reconstruction
//! - [`log_files`] - Log naming and lookup
//! - [`analysis`] - Performance metrics
//! - [`config`] - TOML configuration

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod config;
pub mod control_law;
pub mod disturbance;
pub mod dynamics;
pub mod log_files;
pub mod log_parser;
pub mod pid;
pub mod simulation;
pub mod telemetry;

// Re-export main public types for convenience
pub use analysis::{AnalysisError, AnalysisReport, PerformanceAnalyzer};
pub use config::{ConfigError, GncConfig};
pub use control_law::{ControlLawMapper, ThrusterCommand};
pub use dynamics::{DynamicsModel, RigidBody, SimulationState, StateSample};
pub use log_files::LogFileError;
pub use log_parser::{ParseReport, TelemetryLogParser};
pub use pid::PidController;
pub use simulation::{SimulationLoop, SimulationRun};
pub use telemetry::TelemetryRecord;
