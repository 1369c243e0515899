use crate::config::{ConfigError, GncConfig};
use crate::control_law::{ControlLawMapper, ThrusterCommand};
use crate::disturbance::DisturbanceTorque;
use crate::dynamics::{DynamicsModel, RigidBody, SimulationState};
use crate::pid::PidController;
use crate::telemetry::{assign_cumulative_time, TelemetryRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PROGRESS_LOG_INTERVAL: usize = 100;

/// Everything produced by one closed-loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub records: Vec<TelemetryRecord>,
    pub state: SimulationState,
    pub setpoint: f64,
    pub dt: f64,
}

impl SimulationRun {
    pub fn final_position(&self) -> f64 {
        self.state.current().theta
    }
}

/// Closed loop of controller, bang-bang mapper, disturbance and dynamics.
///
/// Owns all mutable state for a single run; consumed by [`SimulationLoop::run`].
#[derive(Debug)]
pub struct SimulationLoop {
    dynamics: DynamicsModel,
    pid: PidController,
    mapper: ControlLawMapper,
    disturbance: DisturbanceTorque,
    steps: usize,
}

impl SimulationLoop {
    pub fn new(
        dynamics: DynamicsModel,
        pid: PidController,
        mapper: ControlLawMapper,
        disturbance: DisturbanceTorque,
        steps: usize,
    ) -> Self {
        Self {
            dynamics,
            pid,
            mapper,
            disturbance,
            steps,
        }
    }

    pub fn from_config(config: &GncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let body: RigidBody = config.body.rigid_body()?;
        let dynamics = DynamicsModel::new(body, config.simulation.time_step())?;

        Ok(Self::new(
            dynamics,
            PidController::new(config.pid.clone()),
            ControlLawMapper::new(config.control_law.clone()),
            DisturbanceTorque::new(&config.disturbance),
            config.simulation.step_count(),
        ))
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Runs every step to completion and returns the telemetry trace.
    ///
    /// Each record describes the sample the controller observed and the
    /// command it issued for the following interval.
    pub fn run(mut self) -> SimulationRun {
        let dt = self.dynamics.dt();
        let setpoint = self.pid.setpoint();
        info!(
            "Starting simulation: {} steps, dt = {} s, I = {} kg*m^2, setpoint = {}",
            self.steps,
            dt,
            self.dynamics.body().moment_of_inertia(),
            setpoint
        );

        let mut records = Vec::with_capacity(self.steps);
        for step in 0..self.steps {
            let current = self.dynamics.current();

            let output = self.pid.compute(current.theta, dt);
            let command: ThrusterCommand = self.mapper.command(output);
            let tau = self.mapper.torque(command) + self.disturbance.sample();

            records.push(TelemetryRecord {
                delta_time: dt,
                angular_position: current.theta,
                right_solenoid: command.right_solenoid(),
                left_solenoid: command.left_solenoid(),
                gyro_x: 0.0,
                gyro_y: 0.0,
                gyro_z: current.omega,
                pid_output: output,
                error: self.pid.last_error(),
                derivative: self.pid.last_derivative(),
                cumulative_time: 0.0,
            });

            self.dynamics.apply_torque(tau);

            if step % PROGRESS_LOG_INTERVAL == 0 {
                debug!(
                    "t = {:.2}s, theta = {:.2}, omega = {:.2}, tau = {:.3}",
                    step as f64 * dt,
                    current.theta,
                    current.omega,
                    tau
                );
            }
        }

        assign_cumulative_time(&mut records);

        let state = self.dynamics.into_state();
        info!(
            "Simulation finished: final theta = {:.4}, {} state samples",
            state.current().theta,
            state.len()
        );

        SimulationRun {
            records,
            state,
            setpoint,
            dt,
        }
    }
}
