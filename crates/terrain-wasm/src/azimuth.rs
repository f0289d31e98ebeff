//! `compute_azimuths`: the wasm-bindgen entry point wrapping
//! `terrain_core::EngineFacade::analyze`. The Sobel-kernel slope math and
//! the steepest-descent runout walk this module used to do by hand now live
//! in `terrain_core::terrain` and `terrain_core::runout`, derived with the
//! Horn operator instead of a 5x5 kernel.

use georaster::geotiff::GeoTiffReader;
use std::io::Cursor;
use terrain_core::{Aspect, BandKind, EngineFacade, RasterCodec, TerrainBand};
use wasm_bindgen::prelude::*;

use crate::geotiff::serialize_band_to_geotiff;
use crate::raster::read_elevation_grid;

#[wasm_bindgen]
pub struct AzimuthResult {
  elevations: Vec<u8>,
  azimuths: Vec<u8>,
  gradients: Vec<u8>,
  runout_zones: Vec<u8>,
}

#[wasm_bindgen]
impl AzimuthResult {
  #[wasm_bindgen(getter)]
  pub fn elevations(&self) -> Vec<u8> {
    self.elevations.clone()
  }

  #[wasm_bindgen(getter)]
  pub fn azimuths(&self) -> Vec<u8> {
    self.azimuths.clone()
  }

  #[wasm_bindgen(getter)]
  pub fn gradients(&self) -> Vec<u8> {
    self.gradients.clone()
  }

  #[wasm_bindgen(getter)]
  pub fn runout_zones(&self) -> Vec<u8> {
    self.runout_zones.clone()
  }
}

fn parse_excluded_aspects(excluded_aspects: JsValue) -> Vec<Aspect> {
  if excluded_aspects.is_undefined() || excluded_aspects.is_null() {
    Vec::new()
  } else {
    serde_wasm_bindgen::from_value(excluded_aspects).unwrap_or_default()
  }
}

/// Derive slope/aspect/runout bands from an elevation GeoTIFF and
/// re-package all four as GeoTIFFs carrying the input's own geo-key tags.
#[wasm_bindgen]
pub fn compute_azimuths(elevations_geotiff: &[u8], excluded_aspects: JsValue) -> Result<AzimuthResult, JsValue> {
  let excluded = parse_excluded_aspects(excluded_aspects);

  let cursor: Cursor<Vec<u8>> = Cursor::new(elevations_geotiff.to_vec());
  let mut reader: GeoTiffReader<Cursor<Vec<u8>>> =
    GeoTiffReader::open(cursor).map_err(|e| JsValue::from_str(&format!("Failed to open GeoTIFF: {:?}", e)))?;
  let grid = read_elevation_grid(&mut reader)?;

  let geo_keys: Vec<u32> =
    reader.geo_keys.as_ref().ok_or_else(|| JsValue::from_str("Missing geo_keys"))?.clone();
  let origin: [f64; 2] = reader.origin().ok_or_else(|| JsValue::from_str("Missing origin"))?;

  let elevation_blob = RasterCodec::encode(&TerrainBand::new(BandKind::Elevation, grid.width, grid.height, grid.bounds, grid.data));

  let analyzed = EngineFacade::analyze(&elevation_blob, &excluded).map_err(|e| JsValue::from_str(&e.to_string()))?;

  let elevation_band = RasterCodec::decode(&analyzed.elevation_blob).map_err(|e| JsValue::from_str(&e.to_string()))?;
  let azimuth_band = RasterCodec::decode(&analyzed.azimuth_blob).map_err(|e| JsValue::from_str(&e.to_string()))?;
  let gradient_band = RasterCodec::decode(&analyzed.gradient_blob).map_err(|e| JsValue::from_str(&e.to_string()))?;
  let runout_band = RasterCodec::decode(&analyzed.runout_blob).map_err(|e| JsValue::from_str(&e.to_string()))?;

  Ok(AzimuthResult {
    elevations: serialize_band_to_geotiff(&elevation_band, &geo_keys, origin)?,
    azimuths: serialize_band_to_geotiff(&azimuth_band, &geo_keys, origin)?,
    gradients: serialize_band_to_geotiff(&gradient_band, &geo_keys, origin)?,
    runout_zones: serialize_band_to_geotiff(&runout_band, &geo_keys, origin)?,
  })
}
