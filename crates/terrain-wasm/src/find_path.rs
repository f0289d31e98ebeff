//! `find_path_rs`: the wasm-bindgen entry point wrapping
//! `terrain_core::EngineFacade::find_path`. The A* search itself, its
//! tie-breaking, and its frontier-reporting logic now live in
//! `terrain_core::pathfinder` and `terrain_core::progress` — this module is
//! left with parsing GeoJSON points, bridging the JS progress callback, and
//! shaping the `Constraints` the host's function parameters describe.

use std::io::Cursor;

use geojson::{GeoJson, Geometry, Value};
use georaster::geotiff::GeoTiffReader;
use js_sys::Function;
use terrain_core::{Aspect, BandKind, Constraints, ControlFlow, EngineFacade, ProgressCallback, RasterCodec};
use wasm_bindgen::prelude::*;

use crate::raster::{read_band, read_elevation_grid};

/// Open an elevation GeoTIFF buffer into an [`terrain_core::ElevationGrid`].
/// The host round-trips `compute_azimuths`'s output buffers back in here, so
/// every input arrives as a GeoTIFF, not a pre-encoded blob.
fn open_elevation_grid(buffer: &[u8]) -> Result<terrain_core::ElevationGrid, JsValue> {
  let mut reader: GeoTiffReader<Cursor<Vec<u8>>> = GeoTiffReader::open(Cursor::new(buffer.to_vec()))
    .map_err(|e| JsValue::from_str(&format!("Failed to open elevations GeoTIFF: {:?}", e)))?;
  read_elevation_grid(&mut reader)
}

/// Open a single-band GeoTIFF buffer sharing `grid`'s georeferencing and
/// re-encode it as the `RasterCodec` blob `EngineFacade` expects.
fn geotiff_to_band_blob(buffer: &[u8], kind: BandKind, grid: &terrain_core::ElevationGrid) -> Result<Vec<u8>, JsValue> {
  let mut reader: GeoTiffReader<Cursor<Vec<u8>>> = GeoTiffReader::open(Cursor::new(buffer.to_vec()))
    .map_err(|e| JsValue::from_str(&format!("Failed to open {:?} GeoTIFF: {:?}", kind, e)))?;
  let band = read_band(&mut reader, kind, grid)?;
  Ok(RasterCodec::encode(&band))
}

fn parse_point_to_lonlat(point_str: &str) -> Result<(f64, f64), JsValue> {
  let geojson: GeoJson = point_str.parse().map_err(|_| JsValue::from_str("Invalid GeoJSON"))?;
  match geojson {
    GeoJson::Geometry(Geometry { value: Value::Point(coords), .. }) => Ok((coords[0], coords[1])),
    _ => Err(JsValue::from_str("Invalid point GeoJSON")),
  }
}

fn parse_excluded_aspects(excluded_aspects: JsValue) -> Vec<Aspect> {
  if excluded_aspects.is_undefined() || excluded_aspects.is_null() {
    Vec::new()
  } else {
    serde_wasm_bindgen::from_value(excluded_aspects).unwrap_or_default()
  }
}

fn to_js_error(e: terrain_core::EngineError) -> JsValue {
  let payload = serde_json::json!({
    "kind": e.kind(),
    "message": e.to_string(),
    "detail": e.detail(),
  });
  JsValue::from_str(&payload.to_string())
}

/// Bridges a host-supplied JS function to [`ProgressCallback`]. A callback
/// returning `false` cancels the search at the next batch boundary; any
/// other return value (including none, for a host that just wants
/// visualization) continues it. A callback that throws is treated the same
/// as a `Continue` — cancellation is opt-in, not a side effect of a JS bug.
struct JsProgress {
  callback: Option<Function>,
}

impl ProgressCallback for JsProgress {
  fn report(&mut self, nodes: &[(f64, f64)]) -> ControlFlow {
    let Some(callback) = &self.callback else {
      return ControlFlow::Continue;
    };
    let arr = js_sys::Array::new();
    for (lon, lat) in nodes {
      let point = js_sys::Array::new();
      point.push(&JsValue::from_f64(*lon));
      point.push(&JsValue::from_f64(*lat));
      arr.push(&point);
    }
    match callback.call1(&JsValue::NULL, &arr) {
      Ok(result) if result.as_bool() == Some(false) => ControlFlow::Cancel,
      _ => ControlFlow::Continue,
    }
  }
}

/// Find a route from `start` to `end` (plus any `waypoints` in between)
/// across the given elevation/azimuth/gradient/runout GeoTIFF buffers,
/// returning a GeoJSON `FeatureCollection` string.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn find_path_rs(
  elevations_buffer: &[u8],
  start: String,
  end: String,
  max_gradient: Option<f64>,
  azimuths_buffer: &[u8],
  excluded_aspects: JsValue,
  gradients_buffer: &[u8],
  aspect_gradient_threshold: Option<f64>,
  exploration_callback: Option<Function>,
  exploration_batch_size: Option<usize>,
  runouts_buffer: Option<Vec<u8>>,
  avoid_runouts: Option<bool>,
  runout_threshold: Option<f64>,
  waypoints: Option<Vec<String>>,
) -> Result<String, JsValue> {
  let constraints = Constraints {
    max_gradient: max_gradient.unwrap_or(1.0),
    excluded_aspects: parse_excluded_aspects(excluded_aspects),
    aspect_gradient_threshold: aspect_gradient_threshold.unwrap_or(0.0),
    avoid_runouts: avoid_runouts.unwrap_or(false),
    runout_threshold: runout_threshold.unwrap_or(0.2),
    exploration_batch_size: exploration_batch_size.unwrap_or(10_000),
    ..Constraints::default()
  };

  let mut route_points: Vec<(f64, f64)> = Vec::with_capacity(2 + waypoints.as_ref().map_or(0, Vec::len));
  route_points.push(parse_point_to_lonlat(&start)?);
  if let Some(extra) = &waypoints {
    for wp in extra {
      route_points.push(parse_point_to_lonlat(wp)?);
    }
  }
  route_points.push(parse_point_to_lonlat(&end)?);

  let mut progress = JsProgress { callback: exploration_callback };

  let grid = open_elevation_grid(elevations_buffer)?;
  let elevation_blob =
    RasterCodec::encode(&terrain_core::TerrainBand::new(BandKind::Elevation, grid.width, grid.height, grid.bounds, grid.data.clone()));
  let azimuth_blob = geotiff_to_band_blob(azimuths_buffer, BandKind::Azimuth, &grid)?;
  let gradient_blob = geotiff_to_band_blob(gradients_buffer, BandKind::Gradient, &grid)?;
  let runout_blob = runouts_buffer
    .as_deref()
    .map(|buffer| geotiff_to_band_blob(buffer, BandKind::Runout, &grid))
    .transpose()?;

  let out = EngineFacade::find_path(
    &elevation_blob,
    &azimuth_blob,
    &gradient_blob,
    runout_blob.as_deref(),
    &route_points,
    &constraints,
    false,
    &mut progress,
  )
  .map_err(to_js_error)?;

  Ok(EngineFacade::path_to_geojson(&out.points))
}
