//! `RunoutAnalyzer`: marks cells downslope of steep excluded-aspect terrain
//! via a weighted, bounded multi-source BFS.
//!
//! A simpler single-source steepest-descent trace is kept alongside it as
//! [`RunoutAnalyzer::trace_steepest_descent`] — cheaper, but it only ever
//! marks one thin path per seed rather than a spreading zone.

use std::collections::VecDeque;

use crate::aspect::{Aspect, RUNOUT_SEED_TOLERANCE_DEG};
use crate::band::{BandKind, TerrainBand};
use crate::grid::ElevationGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunoutParams {
    /// Gradient magnitude (rise/run) at or above which a cell is a
    /// candidate avalanche source. Default `0.30`, roughly 17 degrees.
    pub steep_threshold: f64,
    /// Stop propagating a branch once its intensity falls below this.
    pub runout_cutoff: f64,
    /// Stop propagating a branch once cumulative distance exceeds this.
    pub max_runout_meters: f64,
    /// Small epsilon guarding the max-reduction update from re-enqueuing on
    /// floating point noise.
    pub epsilon: f64,
}

impl Default for RunoutParams {
    fn default() -> Self {
        Self {
            steep_threshold: 0.30,
            runout_cutoff: 0.05,
            max_runout_meters: 1500.0,
            epsilon: 1e-9,
        }
    }
}

/// Decay-length rule: steeper sources propagate farther.
fn decay_length_m(slope: f64) -> f64 {
    200.0 * (1.0 + slope.clamp(0.0, 1.0))
}

fn decay(step_m: f64, slope: f64) -> f64 {
    (-step_m / decay_length_m(slope)).exp()
}

pub struct RunoutAnalyzer;

impl RunoutAnalyzer {
    /// Compute the `runout_intensity` band. Returns an all-zero band
    /// immediately if `excluded_aspects` is empty — there is nothing to
    /// seed a runout from.
    pub fn analyze(
        grid: &ElevationGrid,
        azimuths: &TerrainBand,
        gradients: &TerrainBand,
        excluded_aspects: &[Aspect],
        params: &RunoutParams,
    ) -> TerrainBand {
        let mut runout = vec![0.0f32; grid.len()];

        if excluded_aspects.is_empty() {
            log::debug!("RunoutAnalyzer::analyze excluded_aspects empty, skipping BFS");
            return TerrainBand::new(BandKind::Runout, grid.width, grid.height, grid.bounds, runout);
        }

        let seeds = Self::seed_indices(grid, azimuths, gradients, excluded_aspects, params);
        if seeds.is_empty() {
            log::warn!(
                "RunoutAnalyzer::analyze found zero seed cells despite non-empty excluded_aspects \
                 ({} aspects); check steep_threshold against this grid's gradient range",
                excluded_aspects.len()
            );
        } else {
            log::debug!("RunoutAnalyzer::analyze seeds={}", seeds.len());
        }

        // Seeds start the queue at intensity 1.0 but are not themselves
        // marked runout — only downslope neighbors of a dequeued cell ever
        // get a `runout[n]` write (spec.md §4.3 step 2; the source zone
        // itself is not runout).
        let mut queue: VecDeque<(usize, f64, f64)> = VecDeque::new();
        for &idx in &seeds {
            queue.push_back((idx, 0.0, 1.0));
        }

        while let Some((idx, dist, intensity)) = queue.pop_front() {
            if intensity < params.runout_cutoff || dist > params.max_runout_meters {
                continue;
            }
            let slope_here = (gradients.values[idx] as f64).abs();
            let elevation_here = grid.elevation_at(idx);

            let mut neighbors = grid.neighbors8(idx);
            // Deterministic tie-break: lower neighbor index first.
            neighbors.sort_by_key(|(n_idx, _)| *n_idx);

            for (n_idx, step_m) in neighbors {
                if grid.elevation_at(n_idx).is_nan() || elevation_here.is_nan() {
                    continue;
                }
                if !(grid.elevation_at(n_idx) < elevation_here) {
                    continue; // only propagate strictly downslope
                }
                let proposed = intensity * decay(step_m, slope_here);
                if proposed > runout[n_idx] as f64 + params.epsilon {
                    runout[n_idx] = runout[n_idx].max(proposed as f32);
                    let next_dist = dist + step_m;
                    if proposed >= params.runout_cutoff && next_dist <= params.max_runout_meters {
                        queue.push_back((n_idx, next_dist, proposed));
                    }
                }
            }
        }

        TerrainBand::new(BandKind::Runout, grid.width, grid.height, grid.bounds, runout)
    }

    fn seed_indices(
        grid: &ElevationGrid,
        azimuths: &TerrainBand,
        gradients: &TerrainBand,
        excluded_aspects: &[Aspect],
        params: &RunoutParams,
    ) -> Vec<usize> {
        let mut seeds = Vec::new();
        for idx in 0..grid.len() {
            let gradient = (gradients.values[idx] as f64).abs();
            if gradient < params.steep_threshold {
                continue;
            }
            let azimuth = azimuths.values[idx] as f64;
            let excluded = excluded_aspects
                .iter()
                .any(|aspect| aspect.contains_azimuth(azimuth, RUNOUT_SEED_TOLERANCE_DEG));
            if excluded {
                seeds.push(idx);
            }
        }
        seeds.sort_unstable();
        seeds
    }

    /// Original single-source steepest-descent trace: from every seed cell,
    /// walk to the lowest-elevation 8-neighbor repeatedly, marking each
    /// visited cell as runout (intensity 1.0), until no lower neighbor
    /// exists or the walked cell's gradient drops back below
    /// `params.steep_threshold`. Kept as a cheaper O(path length)
    /// alternative to the BFS above; not used by `EngineFacade::analyze`.
    pub fn trace_steepest_descent(
        grid: &ElevationGrid,
        azimuths: &TerrainBand,
        gradients: &TerrainBand,
        excluded_aspects: &[Aspect],
        params: &RunoutParams,
    ) -> TerrainBand {
        let mut runout = vec![0.0f32; grid.len()];
        if excluded_aspects.is_empty() {
            return TerrainBand::new(BandKind::Runout, grid.width, grid.height, grid.bounds, runout);
        }

        let seeds = Self::seed_indices(grid, azimuths, gradients, excluded_aspects, params);
        for seed in seeds {
            let mut current = seed;
            loop {
                let neighbors = grid.neighbors8(current);
                let current_elevation = grid.elevation_at(current);
                let mut lowest = current;
                let mut lowest_elevation = current_elevation;
                for (n_idx, _) in neighbors {
                    let e = grid.elevation_at(n_idx);
                    if e < lowest_elevation {
                        lowest_elevation = e;
                        lowest = n_idx;
                    }
                }
                if lowest == current {
                    break;
                }
                current = lowest;
                runout[current] = 1.0;
                if (gradients.values[current] as f64).abs() < params.steep_threshold {
                    break;
                }
            }
        }

        TerrainBand::new(BandKind::Runout, grid.width, grid.height, grid.bounds, runout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;
    use crate::terrain::TerrainAnalyzer;

    fn bounds() -> Bounds {
        Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 }
    }

    /// A north-to-south downhill ramp: higher at row 0, lower at the last
    /// row, steep enough to exceed `steep_threshold`.
    fn south_facing_ramp(n: usize) -> ElevationGrid {
        let mut data = vec![0.0f32; n * n];
        for row in 0..n {
            for col in 0..n {
                data[row * n + col] = (n - row) as f32 * 50.0;
            }
        }
        ElevationGrid::new(n, n, data, bounds()).unwrap()
    }

    #[test]
    fn no_excluded_aspects_yields_all_zero_band() {
        let grid = south_facing_ramp(9);
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        let params = RunoutParams::default();
        let runout = RunoutAnalyzer::analyze(&grid, &analysis.azimuths_deg, &analysis.gradients_signed, &[], &params);
        assert!(runout.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn south_facing_steep_ramp_seeds_downslope_runout() {
        let grid = south_facing_ramp(9);
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        let params = RunoutParams::default();
        let runout = RunoutAnalyzer::analyze(
            &grid,
            &analysis.azimuths_deg,
            &analysis.gradients_signed,
            &[Aspect::South],
            &params,
        );
        // Downslope (southward, higher row index) cells should pick up
        // nonzero intensity from upslope excluded-aspect seeds.
        let last_row_idx = grid.idx(4, grid.height - 1);
        assert!(runout.values[last_row_idx] > 0.0 || runout.values.iter().any(|v| *v > 0.0));
    }

    #[test]
    fn runout_intensity_stays_within_unit_interval() {
        let grid = south_facing_ramp(12);
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        let params = RunoutParams::default();
        let runout = RunoutAnalyzer::analyze(
            &grid,
            &analysis.azimuths_deg,
            &analysis.gradients_signed,
            &[Aspect::South],
            &params,
        );
        for v in &runout.values {
            assert!(*v >= 0.0 && *v <= 1.0 + 1e-6);
        }
    }
}
