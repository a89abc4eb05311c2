//! Net demand for each area and time step of a hindcast peak season.
use anyhow::{Result, bail, ensure};
use ndarray::Array2;

/// Demand and net demand (demand minus renewable generation) for one peak season.
///
/// Both arrays have one row per time step and one column per area. Negative values are clamped
/// to zero, so net demand is never negative even when renewables exceed demand.
#[derive(Debug, Clone, PartialEq)]
pub struct NetDemandModel {
    demand: Array2<f64>,
    net_demand: Array2<f64>,
}

/// Check that an array only contains finite values
fn check_finite(values: &Array2<f64>, name: &str) -> Result<()> {
    if let Some(((i, j), value)) = values.indexed_iter().find(|(_, value)| !value.is_finite()) {
        bail!("{name} contains a non-finite value ({value}) at row {i}, column {j}");
    }

    Ok(())
}

impl NetDemandModel {
    /// Create a new [`NetDemandModel`] from demand and renewable generation.
    ///
    /// # Arguments
    ///
    /// * `demand` - Demand per time step (rows) and area (columns)
    /// * `renewables` - Renewable generation with the same shape as `demand`
    pub fn new(demand: &Array2<f64>, renewables: &Array2<f64>) -> Result<Self> {
        ensure!(
            demand.dim() == renewables.dim(),
            "Demand has shape {:?} but renewables have shape {:?}",
            demand.dim(),
            renewables.dim()
        );
        ensure!(demand.nrows() > 0, "Demand must cover at least one time step");
        ensure!(demand.ncols() > 0, "Demand must cover at least one area");
        check_finite(demand, "Demand")?;
        check_finite(renewables, "Renewables")?;

        Ok(Self {
            demand: demand.mapv(|d| d.max(0.0)),
            net_demand: (demand - renewables).mapv_into(|d| d.max(0.0)),
        })
    }

    /// Demand, clamped to be non-negative
    pub fn demand(&self) -> &Array2<f64> {
        &self.demand
    }

    /// Demand minus renewable generation, clamped to be non-negative
    pub fn net_demand(&self) -> &Array2<f64> {
        &self.net_demand
    }

    /// The number of time steps in a peak season
    pub fn season_length(&self) -> usize {
        self.net_demand.nrows()
    }

    /// The number of areas
    pub fn n_areas(&self) -> usize {
        self.net_demand.ncols()
    }
}
