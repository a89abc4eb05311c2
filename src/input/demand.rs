//! Code for reading hindcast demand and renewable generation from a CSV file.
use super::*;
use crate::area::AreaMap;
use crate::id::IDCollection;
use ndarray::Array2;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";

/// A row of the demand CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct DemandRaw {
    area_id: String,
    time: usize,
    demand: f64,
    renewables: f64,
}

/// Read demand and renewable generation for every area.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `areas` - The model's areas
///
/// # Returns
///
/// Demand and renewables arrays, with one row per time step and one column per area (in the
/// same order as `areas`).
pub fn read_demand(model_dir: &Path, areas: &AreaMap) -> Result<(Array2<f64>, Array2<f64>)> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let demand_csv = read_csv(&file_path)?;
    read_demand_from_iter(demand_csv, areas).with_context(|| input_err_msg(&file_path))
}

fn read_demand_from_iter<I>(iter: I, areas: &AreaMap) -> Result<(Array2<f64>, Array2<f64>)>
where
    I: Iterator<Item = DemandRaw>,
{
    // Values for each area, keyed by time
    let mut values: Vec<BTreeMap<usize, (f64, f64)>> = vec![BTreeMap::new(); areas.len()];
    for row in iter {
        let (area_idx, area_id) = areas.get_id_by_str(&row.area_id)?;
        ensure!(
            row.demand.is_finite() && row.renewables.is_finite(),
            "Demand and renewables must be finite numbers (area {area_id}, time {})",
            row.time
        );
        ensure!(
            values[area_idx]
                .insert(row.time, (row.demand, row.renewables))
                .is_none(),
            "Duplicate demand entry for area {area_id} at time {}",
            row.time
        );
    }

    // Every area must cover the same, contiguous range of times starting at zero
    let season_length = values.iter().map(BTreeMap::len).max().unwrap_or_default();
    let mut demand = Array2::zeros((season_length, areas.len()));
    let mut renewables = Array2::zeros((season_length, areas.len()));
    for (area_idx, (area_id, area_values)) in areas.keys().zip(values).enumerate() {
        ensure!(!area_values.is_empty(), "No demand data for area {area_id}");

        // Keys are sorted, so any gap shows up as a time which differs from its position
        let mut times = area_values.into_iter();
        for time in 0..season_length {
            let (d, r) = match times.next() {
                Some((t, values)) if t == time => values,
                _ => bail!("Missing demand for area {area_id} at time {time}"),
            };
            demand[[time, area_idx]] = d;
            renewables[[time, area_idx]] = r;
        }
    }

    Ok((demand, renewables))
}
