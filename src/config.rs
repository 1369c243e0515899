use crate::control_law::ControlLawConfig;
use crate::disturbance::DisturbanceConfig;
use crate::dynamics::RigidBody;
use crate::pid::{AntiWindup, PidConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

// Reference test article: solid aluminium cylinder on an air bearing
const DEFAULT_BODY_MASS_KG: f64 = 10.0;
const DEFAULT_BODY_RADIUS_M: f64 = 0.25;

// 20 s run sampled 1000 times
const DEFAULT_DURATION_S: f64 = 20.0;
const DEFAULT_SAMPLE_COUNT: usize = 1000;

pub const DEFAULT_ROLLING_WINDOW: usize = 50;
pub const DEFAULT_REJECT_MARKERS: [&str; 2] = ["ERROR", "DEBUG"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("moment of inertia must be positive, got {0}")]
    InvalidInertia(f64),
    #[error("body {field} must be positive, got {value}")]
    InvalidBodyGeometry { field: &'static str, value: f64 },
    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("rolling window must hold at least one sample")]
    ZeroRollingWindow,
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Physical description of the spinning test body.
///
/// When `moment_of_inertia` is set it wins over the cylinder geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub mass_kg: f64,
    pub radius_m: f64,
    pub moment_of_inertia: Option<f64>,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass_kg: DEFAULT_BODY_MASS_KG,
            radius_m: DEFAULT_BODY_RADIUS_M,
            moment_of_inertia: None,
        }
    }
}

impl BodyConfig {
    pub fn rigid_body(&self) -> Result<RigidBody, ConfigError> {
        match self.moment_of_inertia {
            Some(inertia) => RigidBody::new(inertia),
            None => RigidBody::solid_cylinder(self.mass_kg, self.radius_m),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub duration_s: f64,
    pub sample_count: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_s: DEFAULT_DURATION_S,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl SimulationConfig {
    pub fn time_step(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.duration_s / self.sample_count as f64
    }

    /// One control step per sample interval, the initial sample excluded.
    pub fn step_count(&self) -> usize {
        self.sample_count.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub reject_markers: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reject_markers: DEFAULT_REJECT_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub rolling_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

/// Top level configuration, one TOML table per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GncConfig {
    pub body: BodyConfig,
    pub simulation: SimulationConfig,
    pub pid: PidConfig,
    pub control_law: ControlLawConfig,
    pub disturbance: DisturbanceConfig,
    pub parser: ParserConfig,
    pub analysis: AnalysisConfig,
}

impl GncConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects every setting that would make a run meaningless before it starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.body.rigid_body()?;

        let dt = self.simulation.time_step();
        if dt <= 0.0 || !dt.is_finite() {
            return Err(ConfigError::NonPositiveTimeStep(dt));
        }

        ensure_finite("pid.kp", self.pid.kp)?;
        ensure_finite("pid.ki", self.pid.ki)?;
        ensure_finite("pid.kd", self.pid.kd)?;
        ensure_finite("pid.setpoint", self.pid.setpoint)?;
        if let AntiWindup::Clamp { limit } = self.pid.anti_windup {
            ensure_non_negative("pid.anti_windup.limit", limit)?;
        }

        ensure_non_negative("control_law.dead_zone", self.control_law.dead_zone)?;
        ensure_non_negative("control_law.torque_magnitude", self.control_law.torque_magnitude)?;
        ensure_non_negative("disturbance.max_torque", self.disturbance.max_torque)?;

        if self.analysis.rolling_window == 0 {
            return Err(ConfigError::ZeroRollingWindow);
        }

        Ok(())
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}
