//! `TerrainBand`: a dense per-cell scalar field sharing a grid's
//! georeferencing.

use crate::grid::Bounds;

/// The closed set of band kinds `RasterCodec` can tag a blob with (spec
/// §4.5). `Elevation` is included so the codec can also round-trip a raw
/// float band, not just analyzer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BandKind {
    Elevation = 0,
    Azimuth = 1,
    Gradient = 2,
    Runout = 3,
}

impl BandKind {
    pub fn from_u8(tag: u8) -> Option<BandKind> {
        match tag {
            0 => Some(BandKind::Elevation),
            1 => Some(BandKind::Azimuth),
            2 => Some(BandKind::Gradient),
            3 => Some(BandKind::Runout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerrainBand {
    pub kind: BandKind,
    pub width: usize,
    pub height: usize,
    pub bounds: Bounds,
    pub values: Vec<f32>,
}

impl TerrainBand {
    pub fn new(kind: BandKind, width: usize, height: usize, bounds: Bounds, values: Vec<f32>) -> Self {
        debug_assert_eq!(width * height, values.len());
        Self { kind, width, height, bounds, values }
    }

    #[inline]
    pub fn at(&self, col: usize, row: usize) -> f32 {
        self.values[row * self.width + col]
    }
}
