//! The model represents the static input data provided by the user.
use crate::area::{AreaID, AreaMap};
use crate::generation::{ConvGenDistribution, GenerationDistribution};
use crate::policy::Interconnection;
use crate::simulator::HindcastMarginSimulator;
use anyhow::{Result, ensure};
use ndarray::Array2;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Areas for the model
    pub areas: AreaMap,
    /// Hindcast demand, one column per area
    pub demand: Array2<f64>,
    /// Hindcast renewable generation, one column per area
    pub renewables: Array2<f64>,
    /// Conventional generation fleet of each area
    pub fleets: Vec<ConvGenDistribution>,
}

impl Model {
    /// Create a new [`Model`], checking that the parts are consistent with each other.
    ///
    /// Shortfalls are always assessed after interconnection, so exactly two areas are required.
    pub fn new(
        model_path: PathBuf,
        parameters: ModelParameters,
        areas: AreaMap,
        demand: Array2<f64>,
        renewables: Array2<f64>,
        fleets: Vec<ConvGenDistribution>,
    ) -> Result<Self> {
        ensure!(
            areas.len() == 2,
            "Models must have exactly two areas, but {} were given",
            areas.len()
        );

        let model = Self {
            model_path,
            parameters,
            areas,
            demand,
            renewables,
            fleets,
        };

        // Check demand, renewables and fleets agree
        model.build_simulator()?;

        Ok(model)
    }

    /// The number of time steps in the hindcast peak season
    pub fn season_length(&self) -> usize {
        self.demand.nrows()
    }

    /// Iterate over the model's area IDs, in column order
    pub fn iter_area_ids(&self) -> impl Iterator<Item = &AreaID> {
        self.areas.keys()
    }

    /// The interconnector described by the model parameters
    pub fn interconnection(&self) -> Result<Interconnection> {
        Interconnection::new(
            self.parameters.policy,
            self.parameters.interconnector_capacity,
        )
    }

    /// Create a simulator for this model with an empty generation cache
    pub fn build_simulator(&self) -> Result<HindcastMarginSimulator> {
        let gen_dists = self
            .fleets
            .iter()
            .map(|fleet| Box::new(fleet.clone()) as Box<dyn GenerationDistribution>)
            .collect();

        HindcastMarginSimulator::new(&self.demand, &self.renewables, gen_dists)
    }
}
