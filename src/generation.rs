//! Stochastic models of available conventional generation.
//!
//! The simulator only depends on the [`GenerationDistribution`] trait. [`ConvGenDistribution`] is
//! the time-dependent model used by the program: a fleet of independent generating units, each of
//! which switches between being available and being on outage according to a two-state Markov
//! chain.
use anyhow::{Context, Result, ensure};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fmt::Debug;

/// A model which can simulate available generation capacity for one area.
pub trait GenerationDistribution: Debug {
    /// Simulate available generation for `n_sim` independent peak seasons.
    ///
    /// Each season has `n_timesteps + 1` time steps and seasons are stacked one after another, so
    /// the result has `n_sim * (n_timesteps + 1)` values. The output must be a pure function of
    /// the arguments.
    fn simulate(&self, n_sim: usize, n_timesteps: usize, seed: u64) -> Result<Array1<f64>>;
}

/// A single conventional generating unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorUnit {
    /// Maximum output when available (MW)
    pub capacity: f64,
    /// Long-run proportion of time the unit is available
    pub availability: f64,
    /// Mean time to repair, in time steps
    pub mttr: f64,
}

impl GeneratorUnit {
    /// Check that the unit's parameters describe a valid Markov chain
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity.is_finite() && self.capacity >= 0.0,
            "Generator capacity must be a finite number greater than or equal to zero"
        );
        ensure!(
            self.availability > 0.0 && self.availability <= 1.0,
            "Generator availability must be greater than 0 and less than or equal to 1"
        );
        ensure!(
            self.mttr.is_finite() && self.mttr >= 1.0,
            "Generator mean time to repair must be at least one time step"
        );
        ensure!(
            self.failure_probability() <= 1.0,
            "Generator availability of {} is too low for a mean time to repair of {}",
            self.availability,
            self.mttr
        );

        Ok(())
    }

    /// Probability of moving from outage back to available in one time step
    fn repair_probability(&self) -> f64 {
        1.0 / self.mttr
    }

    /// Probability of moving from available to outage in one time step.
    ///
    /// Chosen so that the chain's stationary distribution matches `availability`.
    fn failure_probability(&self) -> f64 {
        self.repair_probability() * (1.0 - self.availability) / self.availability
    }
}

/// Time-dependent available generation for a fleet of independent units.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvGenDistribution {
    units: Vec<GeneratorUnit>,
}

impl ConvGenDistribution {
    /// Create a new fleet, validating every unit
    pub fn new(units: Vec<GeneratorUnit>) -> Result<Self> {
        ensure!(!units.is_empty(), "A generation fleet needs at least one unit");
        for (idx, unit) in units.iter().enumerate() {
            unit.validate()
                .with_context(|| format!("Invalid generator unit {idx}"))?;
        }

        Ok(Self { units })
    }

    /// The sum of all units' capacities
    pub fn installed_capacity(&self) -> f64 {
        self.units.iter().map(|unit| unit.capacity).sum()
    }

    /// The expected available capacity in any time step
    pub fn expected_capacity(&self) -> f64 {
        self.units
            .iter()
            .map(|unit| unit.capacity * unit.availability)
            .sum()
    }
}

impl GenerationDistribution for ConvGenDistribution {
    fn simulate(&self, n_sim: usize, n_timesteps: usize, seed: u64) -> Result<Array1<f64>> {
        let season_length = n_timesteps + 1;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut output = Array1::zeros(n_sim * season_length);

        for mut season in output.exact_chunks_mut(season_length) {
            for unit in &self.units {
                let p_fail = unit.failure_probability();
                let p_repair = unit.repair_probability();

                // Initial state is drawn from the stationary distribution
                let mut available = rng.gen_bool(unit.availability);
                for value in season.iter_mut() {
                    if available {
                        *value += unit.capacity;
                    }
                    available = if available {
                        !rng.gen_bool(p_fail)
                    } else {
                        rng.gen_bool(p_repair)
                    };
                }
            }
        }

        Ok(output)
    }
}
