//! The hindcast margin simulator.
//!
//! Generation is simulated independently for every area and combined with the hindcast net
//! demand to give power margins for many simulated peak seasons. Generation draws are cached so
//! that repeated runs (e.g. for different interconnection policies) see the same draws, and the
//! cache is extended rather than redrawn when more seasons are requested.
use crate::generation::GenerationDistribution;
use crate::kernel::{
    calculate_post_itc_share_margins, calculate_post_itc_veto_margins, calculate_pre_itc_margins,
};
use crate::net_demand::NetDemandModel;
use crate::policy::Interconnection;
use crate::shortfall::{ShortfallTable, extract_shortfalls};
use anyhow::{Context, Result, bail, ensure};
use log::debug;
use ndarray::{Array2, Axis, s};

/// Simulated generation for a number of complete seasons
#[derive(Debug, Clone, PartialEq)]
struct GenerationCache {
    n_replicates: usize,
    draws: Array2<f64>,
}

/// Simulates power margins for a set of interconnected areas over a hindcast peak season
#[derive(Debug)]
pub struct HindcastMarginSimulator {
    net_demand: NetDemandModel,
    gen_dists: Vec<Box<dyn GenerationDistribution>>,
    cache: Option<GenerationCache>,
}

impl HindcastMarginSimulator {
    /// Create a new [`HindcastMarginSimulator`].
    ///
    /// # Arguments
    ///
    /// * `demand` - Demand per time step (rows) and area (columns)
    /// * `renewables` - Renewable generation with the same shape as `demand`
    /// * `gen_dists` - One generation model per area, in column order
    pub fn new(
        demand: &Array2<f64>,
        renewables: &Array2<f64>,
        gen_dists: Vec<Box<dyn GenerationDistribution>>,
    ) -> Result<Self> {
        let net_demand = NetDemandModel::new(demand, renewables)?;
        ensure!(
            gen_dists.len() == net_demand.n_areas(),
            "Got {} generation models for {} areas",
            gen_dists.len(),
            net_demand.n_areas()
        );

        Ok(Self {
            net_demand,
            gen_dists,
            cache: None,
        })
    }

    /// Replace the demand and renewable generation.
    ///
    /// Cached generation draws are kept as long as the season length is unchanged, so margins for
    /// a new demand scenario are computed with the same simulated generation.
    pub fn set_inputs(&mut self, demand: &Array2<f64>, renewables: &Array2<f64>) -> Result<()> {
        let net_demand = NetDemandModel::new(demand, renewables)?;
        ensure!(
            net_demand.n_areas() == self.gen_dists.len(),
            "New inputs have {} areas, but the simulator has {}",
            net_demand.n_areas(),
            self.gen_dists.len()
        );

        if net_demand.season_length() != self.season_length() && self.cache.is_some() {
            debug!(
                "Season length changed from {} to {}. Discarding cached generation.",
                self.season_length(),
                net_demand.season_length()
            );
            self.cache = None;
        }
        self.net_demand = net_demand;

        Ok(())
    }

    /// The number of time steps in a peak season
    pub fn season_length(&self) -> usize {
        self.net_demand.season_length()
    }

    /// The number of areas
    pub fn n_areas(&self) -> usize {
        self.net_demand.n_areas()
    }

    /// The demand and net demand the simulator is working with
    pub fn net_demand(&self) -> &NetDemandModel {
        &self.net_demand
    }

    /// The number of seasons of generation currently cached
    pub fn n_cached_replicates(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.n_replicates)
    }

    /// Draw `n_sim` seasons of generation for every area.
    ///
    /// Area `i` is simulated with seed `seed + i`.
    fn draw_generation(&self, n_sim: usize, seed: u64) -> Result<Array2<f64>> {
        let season_length = self.season_length();
        let mut generation = Array2::zeros((n_sim * season_length, self.n_areas()));
        for (area, dist) in self.gen_dists.iter().enumerate() {
            let draws = dist
                .simulate(n_sim, season_length - 1, seed.wrapping_add(area as u64))
                .with_context(|| format!("Failed to simulate generation for area {area}"))?;
            ensure!(
                draws.len() == n_sim * season_length,
                "Generation model for area {} returned {} values, expected {} ({} seasons of {} \
                time steps)",
                area,
                draws.len(),
                n_sim * season_length,
                n_sim,
                season_length
            );
            if let Some(idx) = draws.iter().position(|value| !value.is_finite()) {
                bail!(
                    "Generation model for area {area} returned a non-finite value ({}) at row {idx}",
                    draws[idx]
                );
            }
            generation.column_mut(area).assign(&draws);
        }

        Ok(generation)
    }

    /// Get simulated generation for `n_sim` seasons, using and extending the cache if requested
    fn simulate_generation(
        &mut self,
        n_sim: usize,
        seed: u64,
        use_saved: bool,
    ) -> Result<Array2<f64>> {
        ensure!(n_sim > 0, "Number of simulations must be greater than zero");
        if !use_saved {
            return self.draw_generation(n_sim, seed);
        }

        let n_cached = self.n_cached_replicates();
        if n_sim > n_cached {
            // Only draw the missing seasons, seeded by how many are already cached
            let n_new = n_sim - n_cached;
            debug!("Simulating {n_new} seasons of generation ({n_cached} cached)");
            let draws = self.draw_generation(n_new, seed.wrapping_add(n_cached as u64))?;
            match &mut self.cache {
                Some(cache) => {
                    cache.draws.append(Axis(0), draws.view())?;
                    cache.n_replicates = n_sim;
                }
                None => {
                    self.cache = Some(GenerationCache {
                        n_replicates: n_sim,
                        draws,
                    });
                }
            }
        } else {
            debug!("Using {n_sim} of {n_cached} cached seasons of generation");
        }

        let cache = self.cache.as_ref().context("Generation cache is empty")?;
        Ok(cache
            .draws
            .slice(s![..n_sim * self.season_length(), ..])
            .to_owned())
    }

    /// Simulate margins before any interconnection.
    ///
    /// # Arguments
    ///
    /// * `n_sim` - Number of peak seasons to simulate
    /// * `seed` - Base random seed
    /// * `use_saved` - Whether to reuse (and extend) cached generation draws. Otherwise
    ///   generation is drawn afresh and the cache is left untouched.
    ///
    /// # Returns
    ///
    /// An array with `n_sim * season_length` rows and one column per area.
    pub fn simulate_pre_itc(
        &mut self,
        n_sim: usize,
        seed: u64,
        use_saved: bool,
    ) -> Result<Array2<f64>> {
        let mut margins = self.simulate_generation(n_sim, seed, use_saved)?;
        calculate_pre_itc_margins(&mut margins, self.net_demand.net_demand());

        Ok(margins)
    }

    /// Simulate margins after interconnection between exactly two areas.
    pub fn simulate_post_itc(
        &mut self,
        n_sim: usize,
        itc: &Interconnection,
        seed: u64,
        use_saved: bool,
    ) -> Result<Array2<f64>> {
        ensure!(
            self.n_areas() == 2,
            "Interconnection is only supported between two areas, but there are {}",
            self.n_areas()
        );

        let mut margins = self.simulate_pre_itc(n_sim, seed, use_saved)?;
        match *itc {
            Interconnection::Veto { capacity } => {
                calculate_post_itc_veto_margins(&mut margins, capacity);
            }
            Interconnection::Share { capacity } => {
                calculate_post_itc_share_margins(&mut margins, self.net_demand.demand(), capacity);
            }
        }

        Ok(margins)
    }

    /// Simulate post-interconnection margins and extract the shortfalls.
    ///
    /// Cached generation is always used. If `raw` is true, one row is returned per time step
    /// with a shortfall in any area; otherwise shortfalls are grouped into events per area.
    pub fn simulate_shortfalls(
        &mut self,
        n_sim: usize,
        itc: &Interconnection,
        seed: u64,
        raw: bool,
    ) -> Result<ShortfallTable> {
        let margins = self.simulate_post_itc(n_sim, itc, seed, true)?;
        extract_shortfalls(&margins, self.season_length(), raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::policy::SharingPolicy;
    use float_cmp::assert_approx_eq;
    use ndarray::{Array1, array};
    use rstest::{fixture, rstest};

    /// Generation which depends only on the seed and position, so draws are easy to predict
    #[derive(Debug)]
    struct SeededGeneration;

    impl GenerationDistribution for SeededGeneration {
        fn simulate(&self, n_sim: usize, n_timesteps: usize, seed: u64) -> Result<Array1<f64>> {
            Ok((0..n_sim * (n_timesteps + 1))
                .map(|i| (seed * 1000) as f64 + i as f64)
                .collect())
        }
    }

    /// Generation which always returns the wrong number of values
    #[derive(Debug)]
    struct ShortGeneration;

    impl GenerationDistribution for ShortGeneration {
        fn simulate(&self, n_sim: usize, n_timesteps: usize, _seed: u64) -> Result<Array1<f64>> {
            Ok(Array1::zeros(n_sim * n_timesteps))
        }
    }

    /// Generation with an undefined value in its second time step
    #[derive(Debug)]
    struct NanGeneration;

    impl GenerationDistribution for NanGeneration {
        fn simulate(&self, n_sim: usize, n_timesteps: usize, _seed: u64) -> Result<Array1<f64>> {
            let mut draws = Array1::from_elem(n_sim * (n_timesteps + 1), 100.0);
            draws[1] = f64::NAN;
            Ok(draws)
        }
    }

    fn two_area_simulator(demand: &Array2<f64>) -> HindcastMarginSimulator {
        HindcastMarginSimulator::new(
            demand,
            &Array2::zeros(demand.dim()),
            vec![Box::new(SeededGeneration), Box::new(SeededGeneration)],
        )
        .unwrap()
    }

    #[fixture]
    fn simulator() -> HindcastMarginSimulator {
        two_area_simulator(&array![[100.0, 50.0], [120.0, 60.0], [80.0, 40.0]])
    }

    #[rstest]
    fn test_pre_itc_margins(mut simulator: HindcastMarginSimulator) {
        let margins = simulator.simulate_pre_itc(2, 1, true).unwrap();
        assert_eq!(margins.dim(), (6, 2));

        // Area 0 uses seed 1, area 1 uses seed 2
        assert_eq!(margins.row(0), array![1000.0 - 100.0, 2000.0 - 50.0]);
        assert_eq!(margins.row(4), array![1004.0 - 120.0, 2004.0 - 60.0]);
    }

    #[rstest]
    fn test_cache_monotonic(mut simulator: HindcastMarginSimulator) {
        let first = simulator.simulate_pre_itc(10, 1, true).unwrap();
        assert_eq!(simulator.n_cached_replicates(), 10);
        let second = simulator.simulate_pre_itc(20, 1, true).unwrap();
        assert_eq!(simulator.n_cached_replicates(), 20);

        assert_eq!(second.nrows(), 60);
        assert_eq!(second.slice(s![..30, ..]), first);

        // The extension is drawn with the base seed offset by the number of cached seasons
        assert_eq!(second[[30, 0]], 11000.0 - 100.0);
    }

    #[rstest]
    fn test_cache_reused_for_fewer_seasons(mut simulator: HindcastMarginSimulator) {
        let all = simulator.simulate_pre_itc(5, 1, true).unwrap();
        let fewer = simulator.simulate_pre_itc(3, 99, true).unwrap();
        assert_eq!(simulator.n_cached_replicates(), 5);
        assert_eq!(fewer, all.slice(s![..9, ..]));
    }

    #[rstest]
    fn test_no_saved_leaves_cache_untouched(mut simulator: HindcastMarginSimulator) {
        simulator.simulate_pre_itc(2, 1, true).unwrap();
        let fresh = simulator.simulate_pre_itc(4, 3, false).unwrap();
        assert_eq!(fresh[[0, 0]], 3000.0 - 100.0);
        assert_eq!(simulator.n_cached_replicates(), 2);

        // Cache still holds the original draws
        let cached = simulator.simulate_pre_itc(2, 3, true).unwrap();
        assert_eq!(cached[[0, 0]], 1000.0 - 100.0);
    }

    #[rstest]
    fn test_returned_margins_do_not_alias_cache(mut simulator: HindcastMarginSimulator) {
        let mut margins = simulator.simulate_pre_itc(1, 1, true).unwrap();
        margins.fill(-1.0);
        assert_eq!(simulator.simulate_pre_itc(1, 1, true).unwrap()[[0, 0]], 900.0);
    }

    #[rstest]
    fn test_zero_simulations(mut simulator: HindcastMarginSimulator) {
        assert_error!(
            simulator.simulate_pre_itc(0, 1, true),
            "Number of simulations must be greater than zero"
        );
    }

    #[rstest]
    fn test_deterministic(mut simulator: HindcastMarginSimulator) {
        let itc = Interconnection::new(SharingPolicy::Share, 500.0).unwrap();
        let first = simulator.simulate_shortfalls(3, &itc, 1, false).unwrap();
        let second = simulator.simulate_shortfalls(3, &itc, 1, false).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(SharingPolicy::Veto)]
    #[case(SharingPolicy::Share)]
    fn test_post_itc_conserves_total(
        mut simulator: HindcastMarginSimulator,
        #[case] policy: SharingPolicy,
    ) {
        let pre = simulator.simulate_pre_itc(2, 1, true).unwrap();
        let itc = Interconnection::new(policy, 50.0).unwrap();
        let post = simulator.simulate_post_itc(2, &itc, 1, true).unwrap();
        for (p, q) in pre.rows().into_iter().zip(post.rows()) {
            assert_approx_eq!(f64, p.sum(), q.sum());
        }
    }

    #[test]
    fn test_unrecognised_policy() {
        assert_error!(
            Interconnection::from_policy_str("negotiate", 50.0),
            "Policy not recognised: 'negotiate'. Valid policies are 'veto' and 'share'"
        );
    }

    #[test]
    fn test_shortfalls_scenario() {
        // Area 0 has a deficit of 80 and area 1 a surplus of 30
        let mut simulator = two_area_simulator(&array![[80.0, 970.0]]);
        let itc = Interconnection::new(SharingPolicy::Veto, 50.0).unwrap();
        let margins = simulator.simulate_post_itc(1, &itc, 0, true).unwrap();
        assert_eq!(margins, array![[-50.0, 0.0]]);

        let ShortfallTable::Clustered(records) =
            simulator.simulate_shortfalls(1, &itc, 0, false).unwrap()
        else {
            panic!("Expected clustered shortfalls");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].area, 0);
        assert_eq!(records[0].margin, -50.0);
    }

    #[test]
    fn test_raw_shortfalls() {
        // Seed 0 gives area 0 generation of 0, 1, 2, ... so it is only short in the first season
        let mut simulator = two_area_simulator(&array![[1.5, 0.0], [2.5, 0.0]]);
        let itc = Interconnection::new(SharingPolicy::Veto, 0.0).unwrap();
        let ShortfallTable::Raw(rows) = simulator.simulate_shortfalls(3, &itc, 0, true).unwrap()
        else {
            panic!("Expected raw shortfalls");
        };

        assert_eq!(
            rows.iter().map(|row| row.time_id).collect::<Vec<_>>(),
            [0, 1]
        );
        for row in &rows {
            assert_eq!(row.time_cyclical, row.time_id % 2);
            assert!(row.margins[0] < 0.0);
        }
        assert_eq!(simulator.n_cached_replicates(), 3);
    }

    #[test]
    fn test_non_finite_generation_rejected() {
        let demand = Array2::zeros((3, 2));
        let mut simulator = HindcastMarginSimulator::new(
            &demand,
            &demand,
            vec![Box::new(SeededGeneration), Box::new(NanGeneration)],
        )
        .unwrap();
        assert_error!(
            simulator.simulate_pre_itc(2, 1, true),
            "Generation model for area 1 returned a non-finite value (NaN) at row 1"
        );
        assert_eq!(simulator.n_cached_replicates(), 0);
    }

    #[test]
    fn test_post_itc_needs_two_areas() {
        let demand = Array2::zeros((2, 3));
        let mut simulator = HindcastMarginSimulator::new(
            &demand,
            &demand,
            vec![
                Box::new(SeededGeneration),
                Box::new(SeededGeneration),
                Box::new(SeededGeneration),
            ],
        )
        .unwrap();
        assert!(simulator.simulate_pre_itc(1, 1, true).is_ok());

        let itc = Interconnection::new(SharingPolicy::Veto, 10.0).unwrap();
        assert_error!(
            simulator.simulate_post_itc(1, &itc, 1, true),
            "Interconnection is only supported between two areas, but there are 3"
        );
    }

    #[test]
    fn test_generation_model_count() {
        let demand = Array2::zeros((2, 2));
        assert_error!(
            HindcastMarginSimulator::new(&demand, &demand, vec![Box::new(SeededGeneration)]),
            "Got 1 generation models for 2 areas"
        );
    }

    #[test]
    fn test_generation_wrong_length() {
        let demand = Array2::zeros((4, 2));
        let mut simulator = HindcastMarginSimulator::new(
            &demand,
            &demand,
            vec![Box::new(SeededGeneration), Box::new(ShortGeneration)],
        )
        .unwrap();
        assert_error!(
            simulator.simulate_pre_itc(2, 1, true),
            "Generation model for area 1 returned 6 values, expected 8 (2 seasons of 4 time steps)"
        );
        assert_eq!(simulator.n_cached_replicates(), 0);
    }

    #[rstest]
    fn test_set_inputs(mut simulator: HindcastMarginSimulator) {
        simulator.simulate_pre_itc(2, 1, true).unwrap();

        // Same season length keeps the cache
        let demand = Array2::zeros((3, 2));
        simulator.set_inputs(&demand, &demand).unwrap();
        assert_eq!(simulator.n_cached_replicates(), 2);
        let margins = simulator.simulate_pre_itc(2, 1, true).unwrap();
        assert_eq!(margins[[0, 0]], 1000.0);

        // New season length discards it
        let demand = Array2::zeros((4, 2));
        simulator.set_inputs(&demand, &demand).unwrap();
        assert_eq!(simulator.n_cached_replicates(), 0);

        // Wrong number of areas
        let demand = Array2::zeros((4, 3));
        assert_error!(
            simulator.set_inputs(&demand, &demand),
            "New inputs have 3 areas, but the simulator has 2"
        );
    }
}
