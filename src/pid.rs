//! # PID Control
//!
//! Heading controller for the spin axis. The controller keeps the running
//! integral and the previous error between calls and reports the terms it
//! used so they can be logged alongside the output.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const DEFAULT_KP: f64 = 0.9;
const DEFAULT_KI: f64 = 0.0;
const DEFAULT_KD: f64 = 0.45;
// Half a turn from the rest heading
const DEFAULT_SETPOINT_RAD: f64 = PI;

/// How the integral accumulator is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AntiWindup {
    /// The accumulator grows without bound.
    Unclamped,
    /// The accumulator is held inside `[-|limit|, |limit|]` after every update.
    /// A NaN limit disables the clamp.
    Clamp { limit: f64 },
}

/// Wrapping applied to the error before the terms are computed.
///
/// With wrapping the controller always turns the short way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleWrap {
    None,
    Degrees,
    Radians,
}

impl AngleWrap {
    pub fn apply(self, angle: f64) -> f64 {
        match self {
            AngleWrap::None => angle,
            AngleWrap::Degrees => wrap_half_turn(angle, 180.0),
            AngleWrap::Radians => wrap_half_turn(angle, PI),
        }
    }
}

/// Maps `angle` into `(-half_turn, half_turn]`.
fn wrap_half_turn(angle: f64, half_turn: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let full_turn = 2.0 * half_turn;
    let wrapped = (angle + half_turn).rem_euclid(full_turn) - half_turn;
    if wrapped == -half_turn {
        half_turn
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    pub anti_windup: AntiWindup,
    pub angle_wrap: AngleWrap,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            setpoint: DEFAULT_SETPOINT_RAD,
            anti_windup: AntiWindup::Unclamped,
            angle_wrap: AngleWrap::None,
        }
    }
}

/// Controller memory carried from one step to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    pub previous_error: f64,
    pub integral_accumulator: f64,
    pub last_derivative: f64,
    pub last_output: f64,
}

#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    state: PidState,
}

impl PidController {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            state: PidState::default(),
        }
    }

    pub fn with_gains(kp: f64, ki: f64, kd: f64, setpoint: f64) -> Self {
        Self::new(PidConfig {
            kp,
            ki,
            kd,
            setpoint,
            ..PidConfig::default()
        })
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn state(&self) -> &PidState {
        &self.state
    }

    pub fn setpoint(&self) -> f64 {
        self.config.setpoint
    }

    /// Computes the control signal for one step.
    ///
    /// Callers must reject `dt < 0`; a zero `dt` contributes no derivative.
    pub fn compute(&mut self, measured_position: f64, dt: f64) -> f64 {
        debug_assert!(dt >= 0.0, "negative time step {} reached the controller", dt);

        let error = self.config.angle_wrap.apply(self.config.setpoint - measured_position);

        self.state.integral_accumulator += error * dt;
        if let AntiWindup::Clamp { limit } = self.config.anti_windup {
            // Only the magnitude counts; a NaN limit leaves the integral unbounded
            if !limit.is_nan() {
                let bound = limit.abs();
                self.state.integral_accumulator =
                    self.state.integral_accumulator.clamp(-bound, bound);
            }
        }

        let derivative = if dt > 0.0 {
            (error - self.state.previous_error) / dt
        } else {
            0.0
        };

        let output = self.config.kp * error
            + self.config.ki * self.state.integral_accumulator
            + self.config.kd * derivative;

        self.state.previous_error = error;
        self.state.last_derivative = derivative;
        self.state.last_output = output;

        output
    }

    pub fn last_error(&self) -> f64 {
        self.state.previous_error
    }

    pub fn last_derivative(&self) -> f64 {
        self.state.last_derivative
    }

    pub fn reset(&mut self) {
        self.state = PidState::default();
    }
}
