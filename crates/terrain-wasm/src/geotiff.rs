//! GeoTIFF writer: packages a `TerrainBand` as a single-band Float32 GeoTIFF,
//! stamping back the host's own geo-key tags and tie point so a DEM tile the
//! host already has georeferenced doesn't lose its CRS metadata on the way
//! back out.

use std::io::Cursor;
use terrain_core::TerrainBand;
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use wasm_bindgen::prelude::*;

/// `origin` is the `[x, y]` tie point the elevation GeoTIFF this band was
/// derived from was read with; `geo_keys` is that GeoTIFF's raw GeoKeyTag
/// (34735) payload passed through unchanged.
pub fn serialize_band_to_geotiff(band: &TerrainBand, geo_keys: &[u32], origin: [f64; 2]) -> Result<Vec<u8>, JsValue> {
  let (width, height) = (band.width, band.height);
  let buffer: Vec<u8> = Vec::new();
  let mut cursor: Cursor<Vec<u8>> = Cursor::new(buffer);
  let mut encoder: TiffEncoder<&mut Cursor<Vec<u8>>> =
    TiffEncoder::new(&mut cursor).map_err(|e| JsValue::from_str(&format!("Failed to create encoder: {}", e)))?;

  {
    let mut image = encoder
      .new_image::<Gray32Float>(width as u32, height as u32)
      .map_err(|e| JsValue::from_str(&format!("Failed to create image: {}", e)))?;

    image
      .encoder()
      .write_tag(Tag::Unknown(34735), geo_keys)
      .map_err(|e| JsValue::from_str(&format!("Failed to write geo_keys: {}", e)))?;
    image
      .encoder()
      .write_tag(Tag::Unknown(34737), "NAD83|}")
      .map_err(|e| JsValue::from_str(&format!("Failed to write CRS: {}", e)))?;
    let geo_doubles: [f64; 2] = [6378137.0, 298.257222101];
    image
      .encoder()
      .write_tag(Tag::Unknown(34736), &geo_doubles[..])
      .map_err(|e| JsValue::from_str(&format!("Failed to write geo_doubles: {}", e)))?;

    let pixel_w = (band.bounds.east - band.bounds.west) / width as f64;
    let pixel_h = (band.bounds.north - band.bounds.south) / height as f64;
    let pixel_scale: [f64; 3] = [pixel_w, pixel_h, 0.0];
    image
      .encoder()
      .write_tag(Tag::Unknown(33550), &pixel_scale[..])
      .map_err(|e| JsValue::from_str(&format!("Failed to write pixel scale: {}", e)))?;
    let tie_points: [f64; 6] = [0.0, 0.0, 0.0, origin[0], origin[1], 0.0];
    image
      .encoder()
      .write_tag(Tag::Unknown(33922), &tie_points[..])
      .map_err(|e| JsValue::from_str(&format!("Failed to write tie points: {}", e)))?;

    image
      .write_data(&band.values)
      .map_err(|e| JsValue::from_str(&format!("Failed to write data: {}", e)))?;
  }

  Ok(cursor.into_inner())
}
