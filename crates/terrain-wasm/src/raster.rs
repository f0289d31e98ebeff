//! GeoTIFF readers that hand back `terrain-core` types directly, instead of
//! the teacher's intermediate `Vec<Vec<f64>>` raster — `ElevationGrid` and
//! `TerrainBand` are already the row-major, georeferenced shape a GeoTIFF
//! pixel stream maps onto.

use georaster::geotiff::{GeoTiffReader, RasterValue};
use std::io::{Read, Seek};
use terrain_core::{BandKind, Bounds, ElevationGrid, TerrainBand};
use wasm_bindgen::prelude::*;

/// Bounds implied by a GeoTIFF's upper-left tie point, pixel size, and
/// dimensions. `pixel_size[1]` is negative (rows increase southward), the
/// convention `crate::geotiff::serialize_band_to_geotiff` writes.
fn bounds_from_geotiff<R: Read + Seek + Send>(
  geotiff: &GeoTiffReader<R>,
  width: usize,
  height: usize,
) -> Result<Bounds, JsValue> {
  let origin = geotiff.origin().ok_or_else(|| JsValue::from_str("GeoTIFF missing origin tie point"))?;
  let pixel_size = geotiff.pixel_size().ok_or_else(|| JsValue::from_str("GeoTIFF missing pixel size"))?;
  let west = origin[0];
  let north = origin[1];
  let east = west + width as f64 * pixel_size[0];
  let south = north + height as f64 * pixel_size[1];
  Ok(Bounds { north, south, east, west })
}

fn read_band_values<R: Read + Seek + Send>(
  geotiff: &mut GeoTiffReader<R>,
  width: usize,
  height: usize,
) -> Result<Vec<f32>, JsValue> {
  let mut values = vec![0.0f32; width * height];
  for pixel in geotiff.pixels(0, 0, width as u32, height as u32) {
    let (x, y, value) = pixel;
    let v: f32 = match value {
      RasterValue::F64(v) => v as f32,
      RasterValue::F32(v) => v,
      other => return Err(JsValue::from_str(&format!("expected float pixel data, found: {:?}", other))),
    };
    values[y as usize * width + x as usize] = v;
  }
  Ok(values)
}

/// Build an [`ElevationGrid`] from an elevation GeoTIFF.
pub fn read_elevation_grid<R: Read + Seek + Send>(geotiff: &mut GeoTiffReader<R>) -> Result<ElevationGrid, JsValue> {
  let (width, height) = geotiff
    .image_info()
    .dimensions
    .ok_or_else(|| JsValue::from_str("Failed to get image dimensions"))?;
  let (width, height) = (width as usize, height as usize);
  let bounds = bounds_from_geotiff(geotiff, width, height)?;
  let values = read_band_values(geotiff, width, height)?;
  ElevationGrid::new(width, height, values, bounds).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build a [`TerrainBand`] of `kind` from a single-band GeoTIFF, sharing
/// `grid`'s georeferencing. The band is trusted to have been derived from
/// the same grid upstream, so dimensions/bounds come from `grid` rather
/// than being re-derived from this GeoTIFF's own tags.
pub fn read_band<R: Read + Seek + Send>(
  geotiff: &mut GeoTiffReader<R>,
  kind: BandKind,
  grid: &ElevationGrid,
) -> Result<TerrainBand, JsValue> {
  let values = read_band_values(geotiff, grid.width, grid.height)?;
  Ok(TerrainBand::new(kind, grid.width, grid.height, grid.bounds, values))
}
