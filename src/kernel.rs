//! Bulk numeric routines which turn simulated generation into power margins.
//!
//! All functions work in place on arrays with one row per time step (across every simulated
//! season) and one column per area. Demand arrays hold a single season, which is applied to each
//! simulated season in turn.
//!
//! The interconnection routines are defined for exactly two areas. Flows are expressed as the
//! power flowing *into* area 0, so a negative flow means area 0 exports to area 1.
use ndarray::{Array2, ArrayViewMut1, Zip};

/// Subtract net demand from available generation, giving pre-interconnection margins.
///
/// # Arguments
///
/// * `margins` - Simulated generation for whole seasons, replaced by margins
/// * `net_demand` - Net demand for one season
pub fn calculate_pre_itc_margins(margins: &mut Array2<f64>, net_demand: &Array2<f64>) {
    assert_eq!(
        margins.nrows() % net_demand.nrows(),
        0,
        "Margins do not cover a whole number of seasons"
    );

    for mut season in margins.exact_chunks_mut(net_demand.dim()) {
        season -= net_demand;
    }
}

/// Power flowing into area 0 when neither area shares its shortfall.
///
/// An area with spare capacity exports to an area in shortfall, limited by the interconnector
/// capacity, its own surplus and the other area's deficit.
pub fn veto_flow(m0: f64, m1: f64, capacity: f64) -> f64 {
    if m0 < 0.0 && m1 > 0.0 {
        capacity.min(m1).min(-m0)
    } else if m0 > 0.0 && m1 < 0.0 {
        -capacity.min(m0).min(-m1)
    } else {
        0.0
    }
}

/// Power flowing into area 0 when a system-wide shortfall is shared in proportion to demand.
///
/// Sharing applies only when the system as a whole is short and neither area could export more
/// than the interconnector allows; otherwise the veto flow is used. With no demand in either area
/// there is nothing to share by, so the veto flow is used as well.
pub fn share_flow(m0: f64, m1: f64, d0: f64, d1: f64, capacity: f64) -> f64 {
    let total_demand = d0 + d1;
    if m0 + m1 < 0.0 && m0 < capacity && m1 < capacity && total_demand > 0.0 {
        (d0 / total_demand * m1 - d1 / total_demand * m0).clamp(-capacity, capacity)
    } else {
        veto_flow(m0, m1, capacity)
    }
}

/// Move `flow` into area 0 from area 1
fn apply_flow(mut row: ArrayViewMut1<f64>, flow: f64) {
    row[0] += flow;
    row[1] -= flow;
}

/// Apply interconnection under a veto policy to two-area margins.
pub fn calculate_post_itc_veto_margins(margins: &mut Array2<f64>, capacity: f64) {
    assert_eq!(margins.ncols(), 2, "Margins must have exactly two areas");

    for row in margins.rows_mut() {
        let flow = veto_flow(row[0], row[1], capacity);
        apply_flow(row, flow);
    }
}

/// Apply interconnection under a share policy to two-area margins.
///
/// # Arguments
///
/// * `margins` - Pre-interconnection margins for whole seasons, replaced by post-interconnection
///   margins
/// * `demand` - Demand for one season
/// * `capacity` - Interconnector capacity
pub fn calculate_post_itc_share_margins(
    margins: &mut Array2<f64>,
    demand: &Array2<f64>,
    capacity: f64,
) {
    assert_eq!(margins.ncols(), 2, "Margins must have exactly two areas");
    assert_eq!(demand.ncols(), 2, "Demand must have exactly two areas");
    assert_eq!(
        margins.nrows() % demand.nrows(),
        0,
        "Margins do not cover a whole number of seasons"
    );

    for mut season in margins.exact_chunks_mut(demand.dim()) {
        Zip::from(season.rows_mut())
            .and(demand.rows())
            .for_each(|row, d| {
                let flow = share_flow(row[0], row[1], d[0], d[1], capacity);
                apply_flow(row, flow);
            });
    }
}
