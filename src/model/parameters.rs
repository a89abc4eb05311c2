//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{input_err_msg, read_toml};
use crate::policy::SharingPolicy;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_n_sim, usize, 1000);
define_param_default!(default_seed, u64, 1);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Number of peak seasons to simulate
    #[serde(default = "default_n_sim")]
    pub n_sim: usize,
    /// Base random seed
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Maximum power flow over the interconnector, in either direction
    #[serde(default)]
    pub interconnector_capacity: f64,
    /// How shortfalls are shared between the two areas
    #[serde(default)]
    pub policy: SharingPolicy,
    /// Whether to also write one row per time step with a shortfall in any area
    #[serde(default)]
    pub write_raw_shortfalls: bool,
}

/// Check that the `n_sim` parameter is valid
fn check_n_sim(value: usize) -> Result<()> {
    ensure!(value > 0, "n_sim must be greater than zero");

    Ok(())
}

/// Check that the `interconnector_capacity` parameter is valid
fn check_interconnector_capacity(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "interconnector_capacity must be a finite number greater than or equal to zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // n_sim
        check_n_sim(self.n_sim)?;

        // interconnector_capacity
        check_interconnector_capacity(self.interconnector_capacity)?;
        if self.interconnector_capacity <= 0.0 {
            warn!(
                "The interconnector capacity is zero, so areas will not share any power under \
                the '{}' policy",
                self.policy
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fmt::Display;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// Helper function to assert validation result based on expected validity
    fn assert_validation_result<T, U: Display>(
        result: Result<T>,
        expected_valid: bool,
        value: U,
        expected_error_fragment: &str,
    ) {
        if expected_valid {
            assert!(
                result.is_ok(),
                "Expected value {} to be valid, but got error: {:?}",
                value,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Expected value {value} to be invalid, but it was accepted",
            );
            let error_message = result.err().unwrap().to_string();
            assert!(
                error_message.contains(expected_error_fragment),
                "Error message should mention the validation constraint, got: {error_message}",
            );
        }
    }

    fn write_model_file(dir: &Path, contents: &str) {
        let mut file = File::create(dir.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_model_params_from_path_defaults() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "");

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(
            model_params,
            ModelParameters {
                n_sim: 1000,
                seed: 1,
                interconnector_capacity: 0.0,
                policy: SharingPolicy::Share,
                write_raw_shortfalls: false,
            }
        );
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_file(
            dir.path(),
            "n_sim = 50\nseed = 7\ninterconnector_capacity = 250.0\npolicy = \"veto\"",
        );

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.n_sim, 50);
        assert_eq!(model_params.seed, 7);
        assert_eq!(model_params.interconnector_capacity, 250.0);
        assert_eq!(model_params.policy, SharingPolicy::Veto);
    }

    #[test]
    fn test_model_params_bad_policy() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "policy = \"negotiate\"");
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(1, true)]
    #[case(1000, true)]
    #[case(0, false)]
    fn test_check_n_sim(#[case] value: usize, #[case] expected_valid: bool) {
        assert_validation_result(
            check_n_sim(value),
            expected_valid,
            value,
            "n_sim must be greater than zero",
        );
    }

    #[rstest]
    #[case(0.0, true)] // Valid minimum value (exactly zero)
    #[case(50.0, true)]
    #[case(f64::MAX, true)] // Valid maximum finite value
    #[case(-1.0, false)] // Invalid: negative value
    #[case(f64::INFINITY, false)] // Invalid: infinite value
    #[case(f64::NAN, false)] // Invalid: NaN value
    fn test_check_interconnector_capacity(#[case] value: f64, #[case] expected_valid: bool) {
        assert_validation_result(
            check_interconnector_capacity(value),
            expected_valid,
            value,
            "interconnector_capacity must be a finite number greater than or equal to zero",
        );
    }
}
