//! Functionality for running a hindcast margin simulation.
use crate::metrics::{calculate_area_metrics, calculate_system_metrics};
use crate::model::Model;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::shortfall::{cluster_shortfalls, extract_raw_shortfalls};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. all margins) to output files
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    let params = &model.parameters;
    let itc = model.interconnection()?;
    let mut simulator = model.build_simulator()?;
    let season_length = simulator.season_length();

    write_metadata(output_path, model).context("Failed to save metadata")?;
    let mut writer = DataWriter::create(
        output_path,
        model.iter_area_ids().cloned().collect(),
        params.write_raw_shortfalls,
        debug_model,
    )?;

    info!(
        "Simulating {} peak seasons of {} time steps with seed {}",
        params.n_sim, season_length, params.seed
    );
    info!(
        "Interconnection policy: {} (capacity {})",
        itc.policy(),
        itc.capacity()
    );
    for (area_id, fleet) in model.iter_area_ids().zip(&model.fleets) {
        info!(
            "Area {area_id}: installed capacity {:.1} MW, expected available capacity {:.1} MW",
            fleet.installed_capacity(),
            fleet.expected_capacity()
        );
    }
    let margins = simulator.simulate_post_itc(params.n_sim, &itc, params.seed, true)?;
    writer.write_debug_margins(&margins)?;

    let rows = extract_raw_shortfalls(&margins, season_length)?;
    let records = cluster_shortfalls(&rows, season_length);
    info!(
        "Found {} time steps with a shortfall in at least one area",
        rows.len()
    );
    writer.write_raw_shortfalls(&rows)?;
    writer.write_shortfalls(&records)?;

    let area_metrics = calculate_area_metrics(&records, simulator.n_areas(), params.n_sim)?;
    for (area_id, metrics) in model.iter_area_ids().zip(&area_metrics) {
        info!(
            "Area {area_id}: LOLE = {:.4}, EEU = {:.4}",
            metrics.lole, metrics.eeu
        );
    }
    writer.write_area_metrics(&area_metrics)?;

    let system_metrics = calculate_system_metrics(&rows, params.n_sim)?;
    info!(
        "System: LOLE = {:.4}, EEU = {:.4}",
        system_metrics.lole, system_metrics.eeu
    );
    writer.write_system_metrics(&system_metrics)?;

    writer.flush()?;

    Ok(())
}
