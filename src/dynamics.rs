//! Single-axis rigid body rotation.
//!
//! Integration is explicit: each step derives the next position and rate
//! from the current sample and the torque applied over the interval. The
//! scheme drifts over long horizons, which is acceptable for the short
//! fixed-length runs the simulator performs.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// One entry of the integration history.
///
/// `alpha` and `tau` are the acceleration and torque that were applied over
/// the interval ending at this sample. The initial entry carries zeros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    pub theta: f64,
    pub omega: f64,
    pub alpha: f64,
    pub tau: f64,
}

impl StateSample {
    pub const REST: StateSample = StateSample {
        theta: 0.0,
        omega: 0.0,
        alpha: 0.0,
        tau: 0.0,
    };
}

/// Append-only history of integration steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    samples: Vec<StateSample>,
}

impl SimulationState {
    pub fn new(initial: StateSample) -> Self {
        Self {
            samples: vec![initial],
        }
    }

    pub fn current(&self) -> StateSample {
        // Never empty: constructed with an initial sample and only appended to
        self.samples[self.samples.len() - 1]
    }

    pub fn samples(&self) -> &[StateSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn thetas(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.theta)
    }

    fn push(&mut self, sample: StateSample) {
        self.samples.push(sample);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    moment_of_inertia: f64,
}

impl RigidBody {
    pub fn new(moment_of_inertia: f64) -> Result<Self, ConfigError> {
        if moment_of_inertia <= 0.0 || !moment_of_inertia.is_finite() {
            return Err(ConfigError::InvalidInertia(moment_of_inertia));
        }
        Ok(Self { moment_of_inertia })
    }

    /// Solid cylinder spinning about its axis: I = 1/2 M R^2.
    pub fn solid_cylinder(mass_kg: f64, radius_m: f64) -> Result<Self, ConfigError> {
        if mass_kg <= 0.0 || !mass_kg.is_finite() {
            return Err(ConfigError::InvalidBodyGeometry {
                field: "mass_kg",
                value: mass_kg,
            });
        }
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Err(ConfigError::InvalidBodyGeometry {
                field: "radius_m",
                value: radius_m,
            });
        }
        Self::new(0.5 * mass_kg * radius_m * radius_m)
    }

    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }

    /// Advances `current` by `dt` seconds under constant torque `tau`.
    pub fn step(&self, current: &StateSample, tau: f64, dt: f64) -> StateSample {
        let alpha = tau / self.moment_of_inertia;
        StateSample {
            theta: current.theta + current.omega * dt + 0.5 * alpha * dt * dt,
            omega: current.omega + alpha * dt,
            alpha,
            tau,
        }
    }
}

/// Rigid body bound to a fixed time step, accumulating its history.
#[derive(Debug, Clone)]
pub struct DynamicsModel {
    body: RigidBody,
    dt: f64,
    state: SimulationState,
}

impl DynamicsModel {
    pub fn new(body: RigidBody, dt: f64) -> Result<Self, ConfigError> {
        Self::with_initial_state(body, dt, StateSample::REST)
    }

    pub fn with_initial_state(
        body: RigidBody,
        dt: f64,
        initial: StateSample,
    ) -> Result<Self, ConfigError> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(ConfigError::NonPositiveTimeStep(dt));
        }
        Ok(Self {
            body,
            dt,
            state: SimulationState::new(initial),
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn current(&self) -> StateSample {
        self.state.current()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }

    pub fn apply_torque(&mut self, tau: f64) -> StateSample {
        let next = self.body.step(&self.state.current(), tau, self.dt);
        self.state.push(next);
        next
    }

    /// Open-loop run over a prescribed torque profile.
    pub fn integrate(&mut self, torques: &[f64]) -> &SimulationState {
        for &tau in torques {
            self.apply_torque(tau);
        }
        &self.state
    }
}
