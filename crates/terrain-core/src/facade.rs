//! `EngineFacade`: the entry points a host calls.
//!
//! Both `analyze` and `find_path` work exclusively in terms of
//! [`RasterCodec`] blobs and native tuples — no `wasm-bindgen`/`JsValue`
//! leaks in from here. They own input validation (waypoint count, blob
//! tagging, constraint ranges) and `error!`-log every mapped error before
//! returning it, so a host that only renders `EngineError::kind()` to end
//! users still has `detail`/`Display` somewhere in its own log stream.

use geojson::{Feature, FeatureCollection, Geometry, Value};

use crate::aspect::Aspect;
use crate::band::{BandKind, TerrainBand};
use crate::codec::RasterCodec;
use crate::error::{EngineError, EngineResult};
use crate::grid::ElevationGrid;
use crate::pathfinder::{Constraints, PathPoint, Pathfinder, TerrainContext};
use crate::progress::ProgressCallback;
use crate::runout::{RunoutAnalyzer, RunoutParams};
use crate::terrain::TerrainAnalyzer;

/// Output of [`EngineFacade::analyze`]: four self-describing raster blobs
/// sharing the input grid's georeferencing.
pub struct AnalyzeOutput {
    pub elevation_blob: Vec<u8>,
    pub azimuth_blob: Vec<u8>,
    pub gradient_blob: Vec<u8>,
    pub runout_blob: Vec<u8>,
}

/// Outcome of one leg of a multi-waypoint `find_path` call (spec.md §4.4's
/// "per-segment failure is reported individually").
#[derive(Debug, Clone)]
pub enum SegmentOutcome {
    Success(Vec<PathPoint>),
    Failed(EngineError),
}

/// Result of [`EngineFacade::find_path`]: the concatenated path (duplicated
/// join cells between consecutive legs dropped) plus every leg's individual
/// outcome, so a host can tell exactly which leg failed without re-deriving
/// it from the merged point list.
pub struct FindPathOutput {
    pub points: Vec<PathPoint>,
    pub segments: Vec<SegmentOutcome>,
}

pub struct EngineFacade;

impl EngineFacade {
    /// Decode an elevation blob, derive slope/aspect, and — when
    /// `excluded_aspects` is non-empty — precompute avalanche runout
    /// intensity. Returns all four bands re-encoded as blobs.
    pub fn analyze(elevation_blob: &[u8], excluded_aspects: &[Aspect]) -> EngineResult<AnalyzeOutput> {
        let elevation_band = Self::decode_tagged(elevation_blob, BandKind::Elevation, "elevation_blob")
            .inspect_err(|e| log::error!("EngineFacade::analyze {e}"))?;

        let grid = ElevationGrid::new(
            elevation_band.width,
            elevation_band.height,
            elevation_band.values,
            elevation_band.bounds,
        )
        .inspect_err(|e| log::error!("EngineFacade::analyze {e}"))?;

        let analysis = TerrainAnalyzer::analyze(&grid).inspect_err(|e| log::error!("EngineFacade::analyze {e}"))?;

        let runout = RunoutAnalyzer::analyze(
            &grid,
            &analysis.azimuths_deg,
            &analysis.gradients_signed,
            excluded_aspects,
            &RunoutParams::default(),
        );

        log::debug!(
            "EngineFacade::analyze cells={} excluded_aspects={}",
            grid.len(),
            excluded_aspects.len()
        );

        Ok(AnalyzeOutput {
            // Elevation itself is untouched by analysis; pass the caller's
            // own bytes through rather than re-encoding a clone of `grid.data`.
            elevation_blob: elevation_blob.to_vec(),
            azimuth_blob: RasterCodec::encode(&analysis.azimuths_deg),
            gradient_blob: RasterCodec::encode(&analysis.gradients_signed),
            runout_blob: RasterCodec::encode(&runout),
        })
    }

    /// Find a least-cost route through `waypoints` (`len() >= 2`), running
    /// `waypoints.len() - 1` independent A* searches and concatenating
    /// them, dropping the duplicated join cell between consecutive legs.
    ///
    /// When `continue_on_segment_error` is false (the common case), the
    /// first failing leg aborts the whole call and its error is returned
    /// directly. When true, the engine keeps searching subsequent legs from
    /// their own waypoints — not from the failed leg's unreached goal — and
    /// the caller inspects `FindPathOutput::segments` to see which legs, if
    /// any, didn't make it.
    pub fn find_path(
        elevation_blob: &[u8],
        azimuth_blob: &[u8],
        gradient_blob: &[u8],
        runout_blob: Option<&[u8]>,
        waypoints: &[(f64, f64)],
        constraints: &Constraints,
        continue_on_segment_error: bool,
        progress: &mut dyn ProgressCallback,
    ) -> EngineResult<FindPathOutput> {
        if waypoints.len() < 2 {
            let err = EngineError::invalid_input(format!(
                "find_path requires at least 2 waypoints, got {}",
                waypoints.len()
            ));
            log::error!("EngineFacade::find_path {err}");
            return Err(err);
        }
        Self::validate_constraints(constraints).inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;

        let elevation_band = Self::decode_tagged(elevation_blob, BandKind::Elevation, "elevation_blob")
            .inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;
        let (width, height, bounds) = (elevation_band.width, elevation_band.height, elevation_band.bounds);
        let grid = ElevationGrid::new(width, height, elevation_band.values, bounds)
            .inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;

        let azimuths = Self::decode_matching(azimuth_blob, BandKind::Azimuth, "azimuth_blob", &grid)
            .inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;
        let gradients = Self::decode_matching(gradient_blob, BandKind::Gradient, "gradient_blob", &grid)
            .inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;
        let runouts = runout_blob
            .map(|blob| Self::decode_matching(blob, BandKind::Runout, "runout_blob", &grid))
            .transpose()
            .inspect_err(|e| log::error!("EngineFacade::find_path {e}"))?;

        let ctx = TerrainContext { grid: &grid, azimuths: &azimuths, gradients: &gradients, runouts: runouts.as_ref() };

        let mut points: Vec<PathPoint> = Vec::new();
        let mut segments: Vec<SegmentOutcome> = Vec::with_capacity(waypoints.len() - 1);
        // Only the immediately preceding leg's last point can be this leg's
        // duplicated join cell; a leg following a failed leg starts fresh.
        let mut previous_leg_succeeded = false;

        for (leg, pair) in waypoints.windows(2).enumerate() {
            let (start, goal) = (pair[0], pair[1]);
            match Pathfinder::find_path(&ctx, start, goal, constraints, progress) {
                Ok(segment_points) => {
                    if previous_leg_succeeded {
                        // Drop the duplicated join cell: this leg's first
                        // point is the previous leg's last point.
                        points.extend(segment_points.iter().skip(1).cloned());
                    } else {
                        points.extend(segment_points.iter().cloned());
                    }
                    segments.push(SegmentOutcome::Success(segment_points));
                    previous_leg_succeeded = true;
                }
                Err(e) => {
                    log::error!("EngineFacade::find_path leg {leg} ({start:?} -> {goal:?}) failed: {e}");
                    let aborting = !continue_on_segment_error;
                    segments.push(SegmentOutcome::Failed(e.clone()));
                    previous_leg_succeeded = false;
                    if aborting {
                        return Err(e);
                    }
                }
            }
        }

        if points.is_empty() {
            // Every leg failed; surface the last leg's error rather than an
            // empty success.
            if let Some(SegmentOutcome::Failed(e)) = segments.last() {
                return Err(e.clone());
            }
        }

        Ok(FindPathOutput { points, segments })
    }

    /// Render a reconstructed path as a GeoJSON `FeatureCollection` of
    /// Points (spec.md §6), with a convenience `LineString` feature
    /// appended so hosts that just want to draw the route don't have to
    /// rebuild it from the Points themselves.
    pub fn path_to_geojson(points: &[PathPoint]) -> String {
        let mut features: Vec<Feature> = points
            .iter()
            .enumerate()
            .map(|(index, p)| Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![p.lon, p.lat, p.elevation]))),
                id: None,
                properties: Some(
                    serde_json::json!({
                        "aspect": p.aspect.name(),
                        "gradient": p.gradient,
                        "elevation_m": p.elevation,
                        "index": index,
                    })
                    .as_object()
                    .unwrap()
                    .clone(),
                ),
                foreign_members: None,
            })
            .collect();

        if points.len() >= 2 {
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(
                    points.iter().map(|p| vec![p.lon, p.lat]).collect(),
                ))),
                id: None,
                properties: Some(serde_json::json!({ "kind": "route_line" }).as_object().unwrap().clone()),
                foreign_members: None,
            });
        }

        FeatureCollection { bbox: None, features, foreign_members: None }.to_string()
    }

    fn validate_constraints(constraints: &Constraints) -> EngineResult<()> {
        if !constraints.max_gradient.is_finite() || constraints.max_gradient < 0.0 {
            return Err(EngineError::invalid_input("constraints.max_gradient must be a non-negative finite number"));
        }
        if !constraints.aspect_gradient_threshold.is_finite() || constraints.aspect_gradient_threshold < 0.0 {
            return Err(EngineError::invalid_input(
                "constraints.aspect_gradient_threshold must be a non-negative finite number",
            ));
        }
        if constraints.exploration_batch_size == 0 {
            return Err(EngineError::invalid_input("constraints.exploration_batch_size must be positive"));
        }
        if constraints.snap_radius < 0 {
            return Err(EngineError::invalid_input("constraints.snap_radius must be non-negative"));
        }
        Ok(())
    }

    fn decode_tagged(blob: &[u8], expected: BandKind, field: &str) -> EngineResult<TerrainBand> {
        let band = RasterCodec::decode(blob)?;
        if band.kind != expected {
            return Err(EngineError::invalid_input(format!(
                "{field} is tagged {:?}, expected {:?}",
                band.kind, expected
            )));
        }
        Ok(band)
    }

    fn decode_matching(blob: &[u8], expected: BandKind, field: &str, grid: &ElevationGrid) -> EngineResult<TerrainBand> {
        let band = Self::decode_tagged(blob, expected, field)?;
        if band.width != grid.width || band.height != grid.height {
            return Err(EngineError::invalid_input(format!(
                "{field} is {}x{}, elevation grid is {}x{}",
                band.width, band.height, grid.width, grid.height
            )));
        }
        Ok(band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::Aspect;
    use crate::band::BandKind;
    use crate::grid::Bounds;
    use crate::progress::NullProgress;

    fn flat_elevation_blob(n: usize) -> (Vec<u8>, Bounds) {
        let bounds = Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 };
        let band = TerrainBand::new(BandKind::Elevation, n, n, bounds, vec![0.0f32; n * n]);
        (RasterCodec::encode(&band), bounds)
    }

    #[test]
    fn analyze_rejects_wrong_band_kind() {
        let (_, bounds) = flat_elevation_blob(5);
        let azimuth_band = TerrainBand::new(BandKind::Azimuth, 5, 5, bounds, vec![0.0; 25]);
        let blob = RasterCodec::encode(&azimuth_band);
        assert!(EngineFacade::analyze(&blob, &[]).is_err());
    }

    #[test]
    fn analyze_round_trips_flat_grid_to_zero_gradient() {
        let (blob, _) = flat_elevation_blob(5);
        let out = EngineFacade::analyze(&blob, &[]).unwrap();
        let gradients = RasterCodec::decode(&out.gradient_blob).unwrap();
        assert!(gradients.values.iter().all(|v| *v == 0.0));
        let runouts = RasterCodec::decode(&out.runout_blob).unwrap();
        assert!(runouts.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn find_path_single_segment_matches_direct_pathfinder_call() {
        let (elevation_blob, _) = flat_elevation_blob(3);
        let analyzed = EngineFacade::analyze(&elevation_blob, &[]).unwrap();
        let constraints = Constraints::default();
        let mut progress = NullProgress;
        let out = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &analyzed.azimuth_blob,
            &analyzed.gradient_blob,
            Some(&analyzed.runout_blob),
            &[(0.1, 0.1), (0.9, 0.9)],
            &constraints,
            false,
            &mut progress,
        )
        .unwrap();
        assert_eq!(out.points.len(), 3);
        assert_eq!(out.segments.len(), 1);
        assert!(matches!(out.segments[0], SegmentOutcome::Success(_)));
    }

    #[test]
    fn find_path_rejects_single_waypoint() {
        let (elevation_blob, _) = flat_elevation_blob(3);
        let analyzed = EngineFacade::analyze(&elevation_blob, &[]).unwrap();
        let constraints = Constraints::default();
        let mut progress = NullProgress;
        let result = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &analyzed.azimuth_blob,
            &analyzed.gradient_blob,
            None,
            &[(0.1, 0.1)],
            &constraints,
            false,
            &mut progress,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn find_path_multi_waypoint_drops_duplicated_join_cell() {
        let (elevation_blob, _) = flat_elevation_blob(5);
        let analyzed = EngineFacade::analyze(&elevation_blob, &[]).unwrap();
        let constraints = Constraints::default();
        let mut progress = NullProgress;
        // Three waypoints across a 5x5 flat grid -> two legs sharing a join
        // cell at the middle waypoint.
        let out = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &analyzed.azimuth_blob,
            &analyzed.gradient_blob,
            Some(&analyzed.runout_blob),
            &[(0.05, 0.05), (0.5, 0.5), (0.95, 0.95)],
            &constraints,
            false,
            &mut progress,
        )
        .unwrap();
        assert_eq!(out.segments.len(), 2);
        // No point should appear twice in a row (the join cell is dropped
        // once, not duplicated).
        for window in out.points.windows(2) {
            assert_ne!(window[0], window[1]);
        }
    }

    #[test]
    fn path_to_geojson_includes_required_properties_and_line_string() {
        let (elevation_blob, _) = flat_elevation_blob(3);
        let analyzed = EngineFacade::analyze(&elevation_blob, &[]).unwrap();
        let constraints = Constraints::default();
        let mut progress = NullProgress;
        let out = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &analyzed.azimuth_blob,
            &analyzed.gradient_blob,
            None,
            &[(0.1, 0.1), (0.9, 0.9)],
            &constraints,
            false,
            &mut progress,
        )
        .unwrap();
        let json = EngineFacade::path_to_geojson(&out.points);
        assert!(json.contains("\"aspect\""));
        assert!(json.contains("\"gradient\""));
        assert!(json.contains("\"elevation_m\""));
        assert!(json.contains("\"index\""));
        assert!(json.contains("LineString"));
    }

    #[test]
    fn find_path_rejects_band_size_mismatch() {
        let (elevation_blob, bounds) = flat_elevation_blob(5);
        let analyzed = EngineFacade::analyze(&elevation_blob, &[]).unwrap();
        let wrong_size_azimuth = RasterCodec::encode(&TerrainBand::new(BandKind::Azimuth, 3, 3, bounds, vec![0.0; 9]));
        let constraints = Constraints::default();
        let mut progress = NullProgress;
        let result = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &wrong_size_azimuth,
            &analyzed.gradient_blob,
            None,
            &[(0.1, 0.1), (0.9, 0.9)],
            &constraints,
            false,
            &mut progress,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn excluded_aspect_without_feasible_alternative_yields_no_feasible_endpoint() {
        // Uniform south-facing ramp with steep slope everywhere; excluding
        // South with a loose gradient threshold leaves no feasible cell.
        let n = 7;
        let bounds = Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 };
        let mut data = vec![0.0f32; n * n];
        for row in 0..n {
            for col in 0..n {
                data[row * n + col] = (n - row) as f32 * 500.0;
            }
        }
        let elevation_blob = RasterCodec::encode(&TerrainBand::new(BandKind::Elevation, n, n, bounds, data));
        let analyzed = EngineFacade::analyze(&elevation_blob, &[Aspect::South]).unwrap();
        let mut constraints = Constraints::default();
        constraints.excluded_aspects = vec![Aspect::South];
        constraints.aspect_gradient_threshold = 0.0;
        constraints.max_gradient = 10.0;
        constraints.snap_radius = 1;
        let mut progress = NullProgress;
        let result = EngineFacade::find_path(
            &analyzed.elevation_blob,
            &analyzed.azimuth_blob,
            &analyzed.gradient_blob,
            None,
            &[(0.1, 0.1), (0.9, 0.9)],
            &constraints,
            false,
            &mut progress,
        );
        assert!(matches!(result, Err(EngineError::NoFeasibleEndpoint { .. })));
    }
}
