//! Extraction of shortfalls from simulated margins and their grouping into shortfall events.
//!
//! Margins cover `n_sim` simulated seasons stacked one after another. Each row therefore has an
//! absolute `time_id`, from which the season (`replicate`) and the time step within the season
//! (`time_cyclical`) are derived, with `time_id == replicate * season_length + time_cyclical`.
use anyhow::{Result, bail, ensure};
use ndarray::Array2;
use serde::Serialize;

/// Position of a row within the stacked simulated seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeasonTime {
    time_id: usize,
    replicate: usize,
    time_cyclical: usize,
}

impl SeasonTime {
    fn new(time_id: usize, season_length: usize) -> Self {
        Self {
            time_id,
            replicate: time_id / season_length,
            time_cyclical: time_id % season_length,
        }
    }

    /// Whether this time step directly follows `previous` in the same season.
    ///
    /// A shortfall at the start of a season never continues one from the end of the previous
    /// season, as the two seasons are independent simulations.
    fn continues(&self, previous: &SeasonTime) -> bool {
        self.replicate == previous.replicate && self.time_cyclical == previous.time_cyclical + 1
    }
}

/// Whether a margin is a shortfall. NaN is never a shortfall.
fn is_shortfall(margin: f64) -> bool {
    margin < 0.0
}

/// A time step in which at least one area has a shortfall
#[derive(Debug, Clone, PartialEq)]
pub struct RawShortfallRow {
    /// Post-interconnection margin of every area
    pub margins: Vec<f64>,
    /// Row index across all simulated seasons
    pub time_id: usize,
    /// Time step within the season
    pub time_cyclical: usize,
}

/// A single area's shortfall at a single time step, labelled with the event it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortfallRecord {
    /// The (negative) margin
    pub margin: f64,
    /// Index of the area
    pub area: usize,
    /// Running count of shortfall events for this area, starting at 1
    pub shortfall_event_id: usize,
    /// Row index across all simulated seasons
    pub time_id: usize,
}

/// Shortfalls found in a set of simulated margins
#[derive(Debug, Clone, PartialEq)]
pub enum ShortfallTable {
    /// One row per time step in which any area is short
    Raw(Vec<RawShortfallRow>),
    /// One row per area and time step in which that area is short, grouped into events
    Clustered(Vec<ShortfallRecord>),
}

/// Find every time step in which at least one area has a negative margin.
///
/// # Arguments
///
/// * `margins` - Margins for `n_sim * season_length` time steps
/// * `season_length` - Number of time steps per simulated season
pub fn extract_raw_shortfalls(
    margins: &Array2<f64>,
    season_length: usize,
) -> Result<Vec<RawShortfallRow>> {
    ensure!(season_length > 0, "Season length must be greater than zero");
    ensure!(
        margins.nrows() % season_length == 0,
        "Margins have {} rows, which is not a whole number of seasons of length {}",
        margins.nrows(),
        season_length
    );
    if let Some(((i, j), margin)) = margins.indexed_iter().find(|(_, m)| !m.is_finite()) {
        bail!("Margin for area {j} at time {i} is not a finite number ({margin})");
    }

    Ok(margins
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&margin| is_shortfall(margin)))
        .map(|(time_id, row)| RawShortfallRow {
            margins: row.to_vec(),
            time_id,
            time_cyclical: time_id % season_length,
        })
        .collect())
}

/// Group each area's shortfalls into events of consecutive time steps.
///
/// Areas are processed one at a time and their records concatenated in area order. Within an
/// area, a new event starts at the first shortfall and whenever a shortfall does not directly
/// follow the previous one in the same simulated season.
///
/// # Arguments
///
/// * `rows` - Raw shortfall rows, in time order
/// * `season_length` - Number of time steps per simulated season
pub fn cluster_shortfalls(rows: &[RawShortfallRow], season_length: usize) -> Vec<ShortfallRecord> {
    let n_areas = rows.first().map_or(0, |row| row.margins.len());
    let mut records = Vec::new();
    for area in 0..n_areas {
        let mut event_id = 0;
        let mut previous: Option<SeasonTime> = None;
        for row in rows {
            let margin = row.margins[area];
            if !is_shortfall(margin) {
                continue;
            }

            let time = SeasonTime::new(row.time_id, season_length);
            if !previous.is_some_and(|previous| time.continues(&previous)) {
                event_id += 1;
            }
            previous = Some(time);

            records.push(ShortfallRecord {
                margin,
                area,
                shortfall_event_id: event_id,
                time_id: time.time_id,
            });
        }
    }

    records
}

/// Extract shortfalls from margins, either as raw rows or grouped into events
pub fn extract_shortfalls(
    margins: &Array2<f64>,
    season_length: usize,
    raw: bool,
) -> Result<ShortfallTable> {
    let rows = extract_raw_shortfalls(margins, season_length)?;
    if raw {
        return Ok(ShortfallTable::Raw(rows));
    }

    Ok(ShortfallTable::Clustered(cluster_shortfalls(
        &rows,
        season_length,
    )))
}
