//! `RasterCodec`: packages a `TerrainBand` into a self-describing byte blob
//! and parses it back.
//!
//! GeoTIFF serialization (`serialize_to_geotiff`, using the `tiff` crate
//! and hand-written geo-key tags) lives in `terrain-wasm` for hosts that
//! want that interchange format; this codec is the engine's own compact
//! wire format for bands that never leave Rust-to-Rust hands.

use crate::band::{BandKind, TerrainBand};
use crate::error::{EngineError, EngineResult};
use crate::grid::Bounds;

const MAGIC: [u8; 4] = *b"TRB1";
const VERSION: u8 = 1;
/// magic(4) + version(1) + kind(1) + width(4) + height(4) + bounds(4*8)
const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 4 + 32;

pub struct RasterCodec;

impl RasterCodec {
    /// Pack `band` into a self-describing blob.
    pub fn encode(band: &TerrainBand) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + band.values.len() * 4);
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION);
        buf.push(band.kind as u8);
        buf.extend_from_slice(&(band.width as u32).to_le_bytes());
        buf.extend_from_slice(&(band.height as u32).to_le_bytes());
        buf.extend_from_slice(&band.bounds.north.to_le_bytes());
        buf.extend_from_slice(&band.bounds.south.to_le_bytes());
        buf.extend_from_slice(&band.bounds.east.to_le_bytes());
        buf.extend_from_slice(&band.bounds.west.to_le_bytes());
        for v in &band.values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Parse a blob produced by [`RasterCodec::encode`]. Rejects on
    /// magic/version/size mismatch.
    pub fn decode(blob: &[u8]) -> EngineResult<TerrainBand> {
        if blob.len() < HEADER_LEN {
            return Err(EngineError::invalid_input("raster blob shorter than header"));
        }
        if blob[0..4] != MAGIC {
            return Err(EngineError::invalid_input("raster blob magic mismatch"));
        }
        let version = blob[4];
        if version != VERSION {
            return Err(EngineError::invalid_input(format!("unsupported raster blob version {version}")));
        }
        let kind = BandKind::from_u8(blob[5])
            .ok_or_else(|| EngineError::invalid_input(format!("unknown band kind tag {}", blob[5])))?;

        let width = u32::from_le_bytes(blob[6..10].try_into().unwrap()) as usize;
        let height = u32::from_le_bytes(blob[10..14].try_into().unwrap()) as usize;

        let north = f64::from_le_bytes(blob[14..22].try_into().unwrap());
        let south = f64::from_le_bytes(blob[22..30].try_into().unwrap());
        let east = f64::from_le_bytes(blob[30..38].try_into().unwrap());
        let west = f64::from_le_bytes(blob[38..46].try_into().unwrap());
        let bounds = Bounds { north, south, east, west };

        let expected_len = HEADER_LEN + width * height * 4;
        if blob.len() != expected_len {
            return Err(EngineError::invalid_input(format!(
                "raster blob length {} does not match expected {expected_len} for {width}x{height}",
                blob.len()
            )));
        }

        let mut values = Vec::with_capacity(width * height);
        let mut offset = HEADER_LEN;
        for _ in 0..(width * height) {
            let bytes: [u8; 4] = blob[offset..offset + 4].try_into().unwrap();
            values.push(f32::from_le_bytes(bytes));
            offset += 4;
        }

        Ok(TerrainBand { kind, width, height, bounds, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_band() -> TerrainBand {
        TerrainBand::new(
            BandKind::Gradient,
            2,
            2,
            Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 },
            vec![0.1, 0.2, 0.3, 0.4],
        )
    }

    #[test]
    fn round_trip_preserves_band_bitwise() {
        let band = sample_band();
        let blob = RasterCodec::encode(&band);
        let decoded = RasterCodec::decode(&blob).unwrap();
        assert_eq!(decoded.width, band.width);
        assert_eq!(decoded.height, band.height);
        assert_eq!(decoded.kind as u8, band.kind as u8);
        assert_eq!(decoded.values, band.values);
        assert_eq!(decoded.bounds.north, band.bounds.north);
    }

    #[test]
    fn rejects_bad_magic() {
        let band = sample_band();
        let mut blob = RasterCodec::encode(&band);
        blob[0] = b'X';
        assert!(RasterCodec::decode(&blob).is_err());
    }

    #[test]
    fn rejects_truncated_blob() {
        let band = sample_band();
        let blob = RasterCodec::encode(&band);
        assert!(RasterCodec::decode(&blob[..blob.len() - 4]).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let band = sample_band();
        let mut blob = RasterCodec::encode(&band);
        blob[4] = 99;
        assert!(RasterCodec::decode(&blob).is_err());
    }

    #[test]
    fn all_band_kinds_round_trip() {
        for kind in [BandKind::Elevation, BandKind::Azimuth, BandKind::Gradient, BandKind::Runout] {
            let band = TerrainBand::new(
                kind,
                1,
                1,
                Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 },
                vec![42.0],
            );
            let blob = RasterCodec::encode(&band);
            let decoded = RasterCodec::decode(&blob).unwrap();
            assert_eq!(decoded.kind as u8, kind as u8);
        }
    }
}
