//! Time-dependent hindcast simulation of power margins in a pair of interconnected areas.
//!
//! Simulated conventional generation for many peak seasons is combined with a historic
//! (hindcast) season of demand and renewable generation. Margins are shared between areas over
//! an interconnector and the resulting shortfalls are grouped into events and summarised as risk
//! metrics.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod area;
pub mod cli;
pub mod generation;
pub mod id;
pub mod input;
pub mod kernel;
pub mod log;
pub mod metrics;
pub mod model;
pub mod net_demand;
pub mod output;
pub mod policy;
pub mod settings;
pub mod shortfall;
pub mod simulation;
pub mod simulator;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program.
///
/// This will be *somewhere* in the user's home directory.
pub fn get_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No appropriate location to store config (unlikely)
        return PathBuf::default();
    };
    config_dir.push("hindcast-margin");

    config_dir
}
