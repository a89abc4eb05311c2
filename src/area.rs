//! Areas are the separately balanced parts of the power system, linked by an interconnector.
use crate::id::{define_id_getter, define_id_type};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {AreaID}

/// A map of [`Area`]s, keyed by area ID, in the order they appear in the input file
pub type AreaMap = IndexMap<AreaID, Area>;

/// Represents an area with an ID and a longer description.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Area {
    /// A unique identifier for an area (e.g. "GB").
    pub id: AreaID,
    /// A text description of the area (e.g. "Great Britain").
    pub description: String,
}
define_id_getter! {Area, AreaID}
