use serde::{Deserialize, Serialize};

// Any non-zero controller output fires a thruster
const DEFAULT_DEAD_ZONE: f64 = 0.0;
// Torque delivered by one solenoid at full pressure (N*m)
const DEFAULT_TORQUE_MAGNITUDE: f64 = 1.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLawConfig {
    /// Outputs with magnitude at or below this value leave both thrusters off.
    pub dead_zone: f64,
    pub torque_magnitude: f64,
}

impl Default for ControlLawConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            torque_magnitude: DEFAULT_TORQUE_MAGNITUDE,
        }
    }
}

/// Discrete firing command for the two opposing solenoids.
///
/// The right solenoid produces negative torque, the left one positive torque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrusterCommand {
    Off,
    FireRight,
    FireLeft,
}

impl ThrusterCommand {
    pub fn right_solenoid(self) -> bool {
        self == ThrusterCommand::FireRight
    }

    pub fn left_solenoid(self) -> bool {
        self == ThrusterCommand::FireLeft
    }

    /// Sign of the torque this command produces.
    pub fn direction(self) -> f64 {
        match self {
            ThrusterCommand::Off => 0.0,
            ThrusterCommand::FireRight => -1.0,
            ThrusterCommand::FireLeft => 1.0,
        }
    }
}

/// Bang-bang discretization of the continuous controller output.
#[derive(Debug, Clone)]
pub struct ControlLawMapper {
    config: ControlLawConfig,
}

impl ControlLawMapper {
    pub fn new(config: ControlLawConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ControlLawConfig {
        &self.config
    }

    pub fn command(&self, output: f64) -> ThrusterCommand {
        // NaN compares false everywhere and falls through to Off
        if output.abs() > self.config.dead_zone {
            if output > 0.0 {
                return ThrusterCommand::FireRight;
            }
            if output < 0.0 {
                return ThrusterCommand::FireLeft;
            }
        }
        ThrusterCommand::Off
    }

    pub fn torque(&self, command: ThrusterCommand) -> f64 {
        command.direction() * self.config.torque_magnitude
    }

    /// Maps an output straight to the torque the thrusters apply.
    pub fn torque_command(&self, output: f64) -> f64 {
        self.torque(self.command(output))
    }
}

impl Default for ControlLawMapper {
    fn default() -> Self {
        Self::new(ControlLawConfig::default())
    }
}
