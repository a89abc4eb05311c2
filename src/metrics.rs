//! Risk metrics estimated from simulated shortfalls.
//!
//! All metrics are expressed per simulated peak season, so they are estimates of the expected
//! value over a season.
use crate::shortfall::{RawShortfallRow, ShortfallRecord};
use anyhow::{Result, ensure};
use itertools::Itertools;

/// Risk metrics for a single area
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRiskMetrics {
    /// Index of the area
    pub area: usize,
    /// Loss of load expectation: expected number of time steps with a shortfall
    pub lole: f64,
    /// Expected energy unserved
    pub eeu: f64,
    /// Expected number of shortfall events
    pub events_per_season: f64,
    /// Mean number of time steps per shortfall event
    pub mean_event_duration: f64,
    /// Largest shortfall seen in any time step
    pub peak_shortfall: f64,
}

/// Risk metrics for the system as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRiskMetrics {
    /// Expected number of time steps in which any area has a shortfall
    pub lole: f64,
    /// Expected energy unserved, summed over areas
    pub eeu: f64,
}

/// Calculate risk metrics for every area from clustered shortfalls.
///
/// # Arguments
///
/// * `records` - Clustered shortfall records for all areas
/// * `n_areas` - Number of areas, including those without any shortfalls
/// * `n_sim` - Number of simulated seasons the shortfalls were taken from
pub fn calculate_area_metrics(
    records: &[ShortfallRecord],
    n_areas: usize,
    n_sim: usize,
) -> Result<Vec<AreaRiskMetrics>> {
    ensure!(n_sim > 0, "Number of simulations must be greater than zero");
    let n_sim = n_sim as f64;
    let by_area = records.iter().into_group_map_by(|record| record.area);

    Ok((0..n_areas)
        .map(|area| {
            let Some(area_records) = by_area.get(&area) else {
                return AreaRiskMetrics {
                    area,
                    lole: 0.0,
                    eeu: 0.0,
                    events_per_season: 0.0,
                    mean_event_duration: 0.0,
                    peak_shortfall: 0.0,
                };
            };

            let n_rows = area_records.len() as f64;
            // Event IDs are a running count, so the last one is the number of events
            let n_events = area_records
                .iter()
                .map(|record| record.shortfall_event_id)
                .max()
                .unwrap_or_default() as f64;

            AreaRiskMetrics {
                area,
                lole: n_rows / n_sim,
                eeu: area_records.iter().map(|r| -r.margin).sum::<f64>() / n_sim,
                events_per_season: n_events / n_sim,
                mean_event_duration: n_rows / n_events,
                peak_shortfall: area_records
                    .iter()
                    .map(|r| -r.margin)
                    .fold(0.0, f64::max),
            }
        })
        .collect())
}

/// Calculate system-wide risk metrics from raw shortfall rows
pub fn calculate_system_metrics(
    rows: &[RawShortfallRow],
    n_sim: usize,
) -> Result<SystemRiskMetrics> {
    ensure!(n_sim > 0, "Number of simulations must be greater than zero");
    let n_sim = n_sim as f64;

    let energy_unserved: f64 = rows
        .iter()
        .flat_map(|row| row.margins.iter())
        .map(|margin| (-margin).max(0.0))
        .sum();

    Ok(SystemRiskMetrics {
        lole: rows.len() as f64 / n_sim,
        eeu: energy_unserved / n_sim,
    })
}
