//! `Pathfinder`: A* search over the elevation grid.
//!
//! Hand-rolled binary-heap A* over dense `u32` cell indices with `f64`
//! costs and explicit arena-style parent pointers, rather than reaching for
//! a generic graph-search crate — the tie-break rule below (prefer deeper
//! paths, then insertion order) needs direct control over heap ordering
//! that a generic search's comparator can't easily express.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::aspect::{Aspect, EXCLUSION_TOLERANCE_DEG};
use crate::band::TerrainBand;
use crate::error::{EngineError, EngineResult};
use crate::grid::ElevationGrid;
use crate::progress::{ControlFlow, ExplorationTracker, ProgressCallback};

/// Per-call search constraints.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub max_gradient: f64,
    pub excluded_aspects: Vec<Aspect>,
    pub aspect_gradient_threshold: f64,
    pub avoid_runouts: bool,
    pub runout_threshold: f64,
    pub exploration_batch_size: usize,
    pub snap_radius: i64,
    pub max_nodes: Option<usize>,
    /// When true, exploration reporting emits every popped cell exactly
    /// once in pop order instead of the default frontier-pruned reporting.
    pub report_all_pops: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_gradient: 1.0,
            excluded_aspects: Vec::new(),
            aspect_gradient_threshold: 0.05,
            avoid_runouts: false,
            runout_threshold: 0.5,
            exploration_batch_size: 125,
            snap_radius: 8,
            max_nodes: None,
            report_all_pops: false,
        }
    }
}

/// A single waypoint along a reconstructed path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    pub lon: f64,
    pub lat: f64,
    pub elevation: f64,
    pub aspect: Aspect,
    pub gradient: f64,
}

const ALPHA: f64 = 4.0;
const GENTLE_RATIO: f64 = 0.1;
/// Unconditional heuristic scale guaranteeing admissibility against the
/// diagonal ground-distance step cost. Applied on every call, not just
/// when a pathological grid is detected.
const HEURISTIC_SCALE: f64 = 0.999;

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    f: f64,
    g: f64,
    seq: u64,
    idx: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse `f` so the smallest `f` pops
        // first. Tie-break on larger `g` first (prefer deeper paths, spec
        // §4.4), then on earlier insertion (smaller `seq` first, since a
        // FIFO tie-break also reverses for max-heap semantics).
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.g.partial_cmp(&other.g).unwrap_or(Ordering::Equal))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct Pathfinder;

/// Borrowed terrain context a search reads from; bundled so `find_path`
/// doesn't take an unwieldy number of positional arguments.
pub struct TerrainContext<'a> {
    pub grid: &'a ElevationGrid,
    pub azimuths: &'a TerrainBand,
    pub gradients: &'a TerrainBand,
    pub runouts: Option<&'a TerrainBand>,
}

impl Pathfinder {
    /// Find a least-cost path from `start` to `goal` (lon, lat pairs),
    /// respecting `constraints`, reporting exploration batches to
    /// `progress`.
    pub fn find_path(
        ctx: &TerrainContext,
        start: (f64, f64),
        goal: (f64, f64),
        constraints: &Constraints,
        progress: &mut dyn ProgressCallback,
    ) -> EngineResult<Vec<PathPoint>> {
        let grid = ctx.grid;

        let start_cell = grid.cell_at(start.0, start.1)?;
        let goal_cell = grid.cell_at(goal.0, goal.1)?;

        let start_idx = Self::snap_to_feasible(ctx, start_cell, constraints)?;
        let goal_idx = Self::snap_to_feasible(ctx, goal_cell, constraints)?;

        log::debug!(
            "Pathfinder::find_path start={:?} goal={:?} snapped_start_idx={start_idx} snapped_goal_idx={goal_idx}",
            start,
            goal
        );

        let goal_center = grid.center_of(goal_idx % grid.width, goal_idx / grid.width);

        let mut best_g = vec![f64::INFINITY; grid.len()];
        let mut parent = vec![u32::MAX; grid.len()];
        let mut heap = BinaryHeap::new();
        let mut seq_counter: u64 = 0;

        best_g[start_idx] = 0.0;
        heap.push(HeapEntry {
            f: Self::heuristic(grid, start_idx, goal_center),
            g: 0.0,
            seq: 0,
            idx: start_idx as u32,
        });

        let mut tracker = ExplorationTracker::new(grid, constraints.exploration_batch_size, constraints.report_all_pops);
        let mut nodes_popped: usize = 0;

        while let Some(entry) = heap.pop() {
            let idx = entry.idx as usize;
            // Lazy deletion: a stale, superseded heap entry.
            if entry.g > best_g[idx] + 1e-12 {
                continue;
            }

            nodes_popped += 1;
            if let Some(max_nodes) = constraints.max_nodes {
                if nodes_popped > max_nodes {
                    return Err(EngineError::search_budget_exceeded(format!(
                        "exceeded max_nodes={max_nodes}"
                    )));
                }
            }

            tracker.record_pop(idx);
            if tracker.should_flush() {
                if tracker.flush(progress) == ControlFlow::Cancel {
                    return Err(EngineError::cancelled("host requested cancellation at batch boundary"));
                }
            }

            if idx == goal_idx {
                tracker.flush(progress);
                log::debug!("Pathfinder::find_path succeeded nodes_popped={nodes_popped}");
                return Ok(Self::reconstruct(ctx, &parent, idx));
            }

            for (n_idx, step_m) in grid.neighbors8(idx) {
                if !Self::is_feasible(ctx, n_idx, constraints) {
                    continue;
                }
                let gradient_n = ctx.gradients.values[n_idx] as f64;
                let cost = step_m * (1.0 + ALPHA * (gradient_n.abs() - GENTLE_RATIO).max(0.0));
                let tentative_g = best_g[idx] + cost;
                if tentative_g < best_g[n_idx] {
                    best_g[n_idx] = tentative_g;
                    parent[n_idx] = idx as u32;
                    seq_counter += 1;
                    heap.push(HeapEntry {
                        f: tentative_g + Self::heuristic(grid, n_idx, goal_center),
                        g: tentative_g,
                        seq: seq_counter,
                        idx: n_idx as u32,
                    });
                }
            }
        }

        tracker.flush(progress);
        log::debug!("Pathfinder::find_path exhausted open set, nodes_popped={nodes_popped}");
        Err(EngineError::no_path_found("open set exhausted before reaching goal"))
    }

    fn heuristic(grid: &ElevationGrid, idx: usize, goal_center: (f64, f64)) -> f64 {
        let (row, col) = (idx / grid.width, idx % grid.width);
        let (lon, lat) = grid.center_of(col, row);
        let (glon, glat) = goal_center;
        crate::grid::great_circle_m(lon, lat, glon, glat) * HEURISTIC_SCALE
    }

    fn is_feasible(ctx: &TerrainContext, idx: usize, constraints: &Constraints) -> bool {
        let elevation = ctx.grid.elevation_at(idx);
        if elevation.is_nan() {
            return false;
        }
        let gradient = (ctx.gradients.values[idx] as f64).abs();
        if gradient > constraints.max_gradient {
            return false;
        }
        if gradient >= constraints.aspect_gradient_threshold && !constraints.excluded_aspects.is_empty() {
            let azimuth = ctx.azimuths.values[idx] as f64;
            let excluded = constraints
                .excluded_aspects
                .iter()
                .any(|a| a.contains_azimuth(azimuth, EXCLUSION_TOLERANCE_DEG));
            if excluded {
                return false;
            }
        }
        if constraints.avoid_runouts {
            if let Some(runouts) = ctx.runouts {
                if runouts.values[idx] as f64 > constraints.runout_threshold {
                    return false;
                }
            }
        }
        true
    }

    /// Map a waypoint's snapped cell to the nearest feasible cell, widening
    /// a Chebyshev ring search up to `snap_radius`.
    fn snap_to_feasible(
        ctx: &TerrainContext,
        cell: (usize, usize),
        constraints: &Constraints,
    ) -> EngineResult<usize> {
        let grid = ctx.grid;
        let origin_idx = grid.idx(cell.0, cell.1);
        if Self::is_feasible(ctx, origin_idx, constraints) {
            return Ok(origin_idx);
        }

        for radius in 1..=constraints.snap_radius {
            let mut candidates: Vec<usize> = Vec::new();
            let (col, row) = (cell.0 as i64, cell.1 as i64);
            for dc in -radius..=radius {
                for dr in -radius..=radius {
                    // Only the ring boundary of this radius, interior already
                    // checked at smaller radii.
                    if dc.abs() != radius && dr.abs() != radius {
                        continue;
                    }
                    let (nc, nr) = (col + dc, row + dr);
                    if nc < 0 || nr < 0 || nc as usize >= grid.width || nr as usize >= grid.height {
                        continue;
                    }
                    let idx = grid.idx(nc as usize, nr as usize);
                    if Self::is_feasible(ctx, idx, constraints) {
                        candidates.push(idx);
                    }
                }
            }
            if let Some(&best) = candidates.iter().min_by(|&&a, &&b| {
                let da = grid.step_distance_m(cell, (a % grid.width, a / grid.width));
                let db = grid.step_distance_m(cell, (b % grid.width, b / grid.width));
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            }) {
                return Ok(best);
            }
        }

        Err(EngineError::no_feasible_endpoint(format!(
            "no feasible cell within snap_radius={} of ({}, {})",
            constraints.snap_radius, cell.0, cell.1
        )))
    }

    fn reconstruct(ctx: &TerrainContext, parent: &[u32], goal_idx: usize) -> Vec<PathPoint> {
        let grid = ctx.grid;
        let mut chain = vec![goal_idx];
        let mut current = goal_idx;
        while parent[current] != u32::MAX {
            current = parent[current] as usize;
            chain.push(current);
        }
        chain.reverse();

        chain
            .into_iter()
            .map(|idx| {
                let (row, col) = (idx / grid.width, idx % grid.width);
                let (lon, lat) = grid.center_of(col, row);
                let gradient = ctx.gradients.values[idx] as f64;
                let azimuth = ctx.azimuths.values[idx] as f64;
                PathPoint {
                    lon,
                    lat,
                    elevation: grid.elevation_at(idx) as f64,
                    aspect: Aspect::from_azimuth(azimuth),
                    gradient,
                }
            })
            .collect()
    }
}
