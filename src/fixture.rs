//! Fixtures for tests

use crate::area::{Area, AreaMap};
use crate::generation::{ConvGenDistribution, GeneratorUnit};
use crate::model::{Model, ModelParameters};
use crate::policy::SharingPolicy;
use ndarray::array;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn areas() -> AreaMap {
    ["GB", "IE"]
        .into_iter()
        .map(|id| {
            let area = Area {
                id: id.into(),
                description: format!("Area {id}"),
            };
            (area.id.clone(), area)
        })
        .collect()
}

#[fixture]
pub fn fleets() -> Vec<ConvGenDistribution> {
    let unit = |capacity, availability, mttr| GeneratorUnit {
        capacity,
        availability,
        mttr,
    };

    vec![
        ConvGenDistribution::new(vec![
            unit(300.0, 0.9, 12.0),
            unit(300.0, 0.9, 12.0),
            unit(200.0, 0.85, 8.0),
        ])
        .unwrap(),
        ConvGenDistribution::new(vec![unit(150.0, 0.95, 6.0), unit(100.0, 0.8, 4.0)]).unwrap(),
    ]
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        n_sim: 20,
        seed: 3,
        interconnector_capacity: 50.0,
        policy: SharingPolicy::Share,
        write_raw_shortfalls: false,
    }
}

/// A two-area model with a peak season of four time steps
#[fixture]
pub fn model(
    areas: AreaMap,
    fleets: Vec<ConvGenDistribution>,
    model_parameters: ModelParameters,
) -> Model {
    let demand = array![[600.0, 180.0], [700.0, 200.0], [750.0, 220.0], [650.0, 190.0]];
    let renewables = array![[50.0, 10.0], [20.0, 0.0], [0.0, 30.0], [80.0, 5.0]];

    Model::new(
        PathBuf::from("model"),
        model_parameters,
        areas,
        demand,
        renewables,
        fleets,
    )
    .unwrap()
}
