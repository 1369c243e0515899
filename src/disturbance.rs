use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_DISTURBANCE_TORQUE: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceConfig {
    /// Half-width of the uniform torque range, N*m. Zero disables the source.
    pub max_torque: f64,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            max_torque: DEFAULT_MAX_DISTURBANCE_TORQUE,
            seed: None,
        }
    }
}

impl DisturbanceConfig {
    pub fn calm() -> Self {
        Self {
            max_torque: 0.0,
            seed: None,
        }
    }
}

/// Unmodeled environmental torque, redrawn every step.
#[derive(Debug, Clone)]
pub struct DisturbanceTorque {
    range: Option<Uniform<f64>>,
    rng: StdRng,
}

impl DisturbanceTorque {
    pub fn new(config: &DisturbanceConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let range = if config.max_torque > 0.0 && config.max_torque.is_finite() {
            Some(Uniform::new_inclusive(-config.max_torque, config.max_torque))
        } else {
            None
        };
        Self { range, rng }
    }

    pub fn none() -> Self {
        Self::new(&DisturbanceConfig::calm())
    }

    pub fn is_active(&self) -> bool {
        self.range.is_some()
    }

    pub fn sample(&mut self) -> f64 {
        match &self.range {
            Some(range) => range.sample(&mut self.rng),
            None => 0.0,
        }
    }
}
