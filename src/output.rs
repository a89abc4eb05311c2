//! The module responsible for writing output data to disk.
use crate::area::AreaID;
use crate::metrics::{AreaRiskMetrics, SystemRiskMetrics};
use crate::shortfall::{RawShortfallRow, ShortfallRecord};
use anyhow::{Context, Result, ensure};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "hindcast_results";

/// The output file name for clustered shortfalls
const SHORTFALLS_FILE_NAME: &str = "shortfalls.csv";

/// The output file name for unclustered shortfalls
const RAW_SHORTFALLS_FILE_NAME: &str = "raw_shortfalls.csv";

/// The output file name for per-area risk metrics
const AREA_METRICS_FILE_NAME: &str = "area_risk_metrics.csv";

/// The output file name for system-wide risk metrics
const SYSTEM_METRICS_FILE_NAME: &str = "system_risk_metrics.csv";

/// The output file name for post-interconnection margins
const POST_ITC_MARGINS_FILE_NAME: &str = "debug_post_itc_margins.csv";

/// Get the default output folder for a model, named after the model's folder
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // The path may be relative (e.g. "."), so resolve it to find the folder name
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, optionally overwriting existing data
///
/// # Arguments
///
/// * `output_dir` - The output directory to create/overwrite
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// True if the output dir contained existing data that was deleted, false if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir).context("Could not delete folder")?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the area risk metrics CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AreaRiskMetricsRow {
    area_id: AreaID,
    lole: f64,
    eeu: f64,
    events_per_season: f64,
    mean_event_duration: f64,
    peak_shortfall: f64,
}

/// Represents a row in the system risk metrics CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SystemRiskMetricsRow {
    lole: f64,
    eeu: f64,
}

/// Write a header made up of some leading columns and one column per area
fn write_area_header(
    writer: &mut csv::Writer<File>,
    leading: &[&str],
    area_ids: &[AreaID],
    trailing: &[&str],
) -> Result<()> {
    let header = leading
        .iter()
        .copied()
        .chain(area_ids.iter().map(|id| &*id.0))
        .chain(trailing.iter().copied());
    writer.write_record(header)?;

    Ok(())
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    post_itc_margins_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `area_ids` - The model's areas, in column order
    fn create(output_path: &Path, area_ids: &[AreaID]) -> Result<Self> {
        let mut post_itc_margins_writer =
            csv::Writer::from_path(output_path.join(POST_ITC_MARGINS_FILE_NAME))?;
        write_area_header(&mut post_itc_margins_writer, &["time_id"], area_ids, &[])?;

        Ok(Self {
            post_itc_margins_writer,
        })
    }

    /// Write post-interconnection margins for every time step
    fn write_post_itc_margins(&mut self, margins: &Array2<f64>) -> Result<()> {
        for (time_id, row) in margins.rows().into_iter().enumerate() {
            let record = std::iter::once(time_id.to_string())
                .chain(row.iter().map(ToString::to_string));
            self.post_itc_margins_writer.write_record(record)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.post_itc_margins_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    area_ids: Vec<AreaID>,
    shortfalls_writer: csv::Writer<File>,
    area_metrics_writer: csv::Writer<File>,
    system_metrics_writer: csv::Writer<File>,
    raw_shortfalls_writer: Option<csv::Writer<File>>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `area_ids` - The model's areas, in column order
    /// * `write_raw_shortfalls` - Whether to write unclustered shortfalls
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(
        output_path: &Path,
        area_ids: Vec<AreaID>,
        write_raw_shortfalls: bool,
        save_debug_info: bool,
    ) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let raw_shortfalls_writer = if write_raw_shortfalls {
            let mut writer = new_writer(RAW_SHORTFALLS_FILE_NAME)?;
            write_area_header(&mut writer, &[], &area_ids, &["time_id", "time_cyclical"])?;
            Some(writer)
        } else {
            None
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path, &area_ids)?)
        } else {
            None
        };

        Ok(Self {
            shortfalls_writer: new_writer(SHORTFALLS_FILE_NAME)?,
            area_metrics_writer: new_writer(AREA_METRICS_FILE_NAME)?,
            system_metrics_writer: new_writer(SYSTEM_METRICS_FILE_NAME)?,
            raw_shortfalls_writer,
            debug_writer,
            area_ids,
        })
    }

    /// Write clustered shortfalls to a CSV file
    pub fn write_shortfalls(&mut self, records: &[ShortfallRecord]) -> Result<()> {
        if records.is_empty() {
            // The header is normally derived from the first record
            self.shortfalls_writer.write_record([
                "margin",
                "area",
                "shortfall_event_id",
                "time_id",
            ])?;
        }
        for record in records {
            self.shortfalls_writer.serialize(record)?;
        }

        Ok(())
    }

    /// Write unclustered shortfalls to a CSV file, if enabled
    pub fn write_raw_shortfalls(&mut self, rows: &[RawShortfallRow]) -> Result<()> {
        let Some(writer) = &mut self.raw_shortfalls_writer else {
            return Ok(());
        };

        for row in rows {
            let record = row
                .margins
                .iter()
                .map(ToString::to_string)
                .chain([row.time_id.to_string(), row.time_cyclical.to_string()]);
            writer.write_record(record)?;
        }

        Ok(())
    }

    /// Write per-area risk metrics to a CSV file
    pub fn write_area_metrics(&mut self, metrics: &[AreaRiskMetrics]) -> Result<()> {
        for area_metrics in metrics {
            let area_id = self
                .area_ids
                .get(area_metrics.area)
                .with_context(|| format!("No area with index {}", area_metrics.area))?;
            let row = AreaRiskMetricsRow {
                area_id: area_id.clone(),
                lole: area_metrics.lole,
                eeu: area_metrics.eeu,
                events_per_season: area_metrics.events_per_season,
                mean_event_duration: area_metrics.mean_event_duration,
                peak_shortfall: area_metrics.peak_shortfall,
            };
            self.area_metrics_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write system-wide risk metrics to a CSV file
    pub fn write_system_metrics(&mut self, metrics: &SystemRiskMetrics) -> Result<()> {
        let row = SystemRiskMetricsRow {
            lole: metrics.lole,
            eeu: metrics.eeu,
        };
        self.system_metrics_writer.serialize(row)?;

        Ok(())
    }

    /// Write post-interconnection margins to a CSV file, if debug info is enabled
    pub fn write_debug_margins(&mut self, margins: &Array2<f64>) -> Result<()> {
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_post_itc_margins(margins)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.shortfalls_writer.flush()?;
        self.area_metrics_writer.flush()?;
        self.system_metrics_writer.flush()?;
        if let Some(wtr) = &mut self.raw_shortfalls_writer {
            wtr.flush()?;
        }
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
