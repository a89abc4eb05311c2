//! Code for reading conventional generating units from a CSV file.
use super::*;
use crate::area::AreaMap;
use crate::generation::{ConvGenDistribution, GeneratorUnit};
use crate::id::IDCollection;
use serde::Deserialize;
use std::path::Path;

const GENERATORS_FILE_NAME: &str = "generators.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct GeneratorRaw {
    area_id: String,
    capacity: f64,
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    availability: f64,
    mttr: f64,
}

/// Read the generation fleet of every area.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `areas` - The model's areas
///
/// # Returns
///
/// One [`ConvGenDistribution`] per area, in the same order as `areas`.
pub fn read_generators(model_dir: &Path, areas: &AreaMap) -> Result<Vec<ConvGenDistribution>> {
    let file_path = model_dir.join(GENERATORS_FILE_NAME);
    let generators_csv = read_csv(&file_path)?;
    read_generators_from_iter(generators_csv, areas).with_context(|| input_err_msg(&file_path))
}

fn read_generators_from_iter<I>(iter: I, areas: &AreaMap) -> Result<Vec<ConvGenDistribution>>
where
    I: Iterator<Item = GeneratorRaw>,
{
    let mut units: Vec<Vec<GeneratorUnit>> = vec![Vec::new(); areas.len()];
    for generator in iter {
        let (area_idx, _) = areas.get_id_by_str(&generator.area_id)?;
        units[area_idx].push(GeneratorUnit {
            capacity: generator.capacity,
            availability: generator.availability,
            mttr: generator.mttr,
        });
    }

    areas
        .keys()
        .zip(units)
        .map(|(area_id, units)| {
            ensure!(!units.is_empty(), "No generators found for area {area_id}");
            ConvGenDistribution::new(units)
                .with_context(|| format!("Invalid generators for area {area_id}"))
        })
        .collect()
}
