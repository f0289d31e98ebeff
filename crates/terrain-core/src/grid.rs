//! `ElevationGrid`: a row-major elevation raster plus georeferencing.

use crate::error::{EngineError, EngineResult};

/// Decimal-degree bounding box. `north > south`, `east > west`; no
/// antimeridian wrap is supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.north.is_finite() && self.south.is_finite() && self.east.is_finite() && self.west.is_finite()) {
            return Err(EngineError::invalid_input("bounds must be finite"));
        }
        if self.north <= self.south {
            return Err(EngineError::invalid_input("bounds.north must exceed bounds.south"));
        }
        if self.east <= self.west {
            return Err(EngineError::invalid_input("bounds.east must exceed bounds.west"));
        }
        Ok(())
    }
}

/// Mean Earth radius in meters, used for Haversine step distances.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Eight-connected neighbor offsets, N, NE, E, SE, S, SW, W, NW — this fixed
/// enumeration order is relied on elsewhere for deterministic tie-breaking.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (0, -1),  // N  (row - 1)
    (1, -1),  // NE
    (1, 0),   // E  (col + 1)
    (1, 1),   // SE
    (0, 1),   // S  (row + 1)
    (-1, 1),  // SW
    (-1, 0),  // W  (col - 1)
    (-1, -1), // NW
];

/// Owns the dense elevation matrix and its georeferencing. Immutable once
/// constructed; the `TerrainAnalyzer` and `Pathfinder` borrow it.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
    pub bounds: Bounds,
    pub pixel_w: f64,
    pub pixel_h: f64,
}

impl ElevationGrid {
    pub fn new(width: usize, height: usize, data: Vec<f32>, bounds: Bounds) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::invalid_input("grid width and height must be positive"));
        }
        if width * height != data.len() {
            return Err(EngineError::invalid_input(format!(
                "width*height ({}) does not match data length ({})",
                width * height,
                data.len()
            )));
        }
        bounds.validate()?;

        let pixel_w = (bounds.east - bounds.west) / width as f64;
        let pixel_h = (bounds.north - bounds.south) / height as f64;

        log::debug!(
            "ElevationGrid::new width={width} height={height} pixel_w={pixel_w:.6} pixel_h={pixel_h:.6}"
        );

        Ok(Self { width, height, data, bounds, pixel_w, pixel_h })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn idx(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn row_col(&self, idx: usize) -> (usize, usize) {
        (idx / self.width, idx % self.width)
    }

    #[inline]
    pub fn elevation_at(&self, idx: usize) -> f32 {
        self.data[idx]
    }

    /// Map a geographic point to its containing `(col, row)`. Out-of-range
    /// points are an error.
    pub fn cell_at(&self, lon: f64, lat: f64) -> EngineResult<(usize, usize)> {
        if lon < self.bounds.west || lon >= self.bounds.east || lat < self.bounds.south || lat >= self.bounds.north {
            return Err(EngineError::out_of_bounds(format!(
                "point ({lon}, {lat}) lies outside grid bounds {:?}",
                self.bounds
            )));
        }
        let col = ((lon - self.bounds.west) / self.pixel_w).floor() as usize;
        // Row 0 covers the northernmost strip, per spec's pixel-coverage invariant.
        let row = ((self.bounds.north - lat) / self.pixel_h).floor() as usize;
        let col = col.min(self.width - 1);
        let row = row.min(self.height - 1);
        Ok((col, row))
    }

    /// The geographic center of cell `(col, row)`.
    pub fn center_of(&self, col: usize, row: usize) -> (f64, f64) {
        let lon = self.bounds.west + (col as f64 + 0.5) * self.pixel_w;
        let lat = self.bounds.north - (row as f64 + 0.5) * self.pixel_h;
        (lon, lat)
    }

    /// Great-circle distance (meters) between two cell centers, via
    /// Haversine. Sufficient at DEM resolutions of tens of meters.
    pub fn step_distance_m(&self, a: (usize, usize), b: (usize, usize)) -> f64 {
        let (lon1, lat1) = self.center_of(a.0, a.1);
        let (lon2, lat2) = self.center_of(b.0, b.1);
        great_circle_m(lon1, lat1, lon2, lat2)
    }

    /// Enumerate the up-to-8 in-bounds neighbors of `idx`, each paired with
    /// its great-circle step distance in meters, in the fixed N..NW order.
    pub fn neighbors8(&self, idx: usize) -> Vec<(usize, f64)> {
        let (row, col) = self.row_col(idx);
        let mut out = Vec::with_capacity(8);
        for &(dc, dr) in NEIGHBOR_OFFSETS.iter() {
            let nc = col as i64 + dc;
            let nr = row as i64 + dr;
            if nc < 0 || nr < 0 || nc as usize >= self.width || nr as usize >= self.height {
                continue;
            }
            let (nc, nr) = (nc as usize, nr as usize);
            let n_idx = self.idx(nc, nr);
            let dist = self.step_distance_m((col, row), (nc, nr));
            out.push((n_idx, dist));
        }
        out
    }

    /// The geographic diagonal length of one pixel, in meters — used by the
    /// Pathfinder to validate its snap-distance bound.
    pub fn pixel_diagonal_m(&self) -> f64 {
        let (lon0, lat0) = self.center_of(0, 0);
        let lon1 = lon0 + self.pixel_w;
        let lat1 = lat0 - self.pixel_h;
        great_circle_m(lon0, lat0, lon1, lat1)
    }
}

/// Great-circle distance (meters) between two `(lon, lat)` points, via
/// Haversine. Exposed so the Pathfinder's heuristic can reuse the same
/// distance model as the grid's own step costs.
pub fn great_circle_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1r, lat2r) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_unit_square() -> Bounds {
        Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 }
    }

    #[test]
    fn rejects_mismatched_data_length() {
        let err = ElevationGrid::new(3, 3, vec![0.0; 8], bounds_unit_square());
        assert!(err.is_err());
    }

    #[test]
    fn rejects_ill_formed_bounds() {
        let bounds = Bounds { north: 0.0, south: 1.0, east: 1.0, west: 0.0 };
        let err = ElevationGrid::new(2, 2, vec![0.0; 4], bounds);
        assert!(err.is_err());
    }

    #[test]
    fn cell_at_maps_corners_to_expected_cells() {
        let grid = ElevationGrid::new(3, 3, vec![0.0; 9], bounds_unit_square()).unwrap();
        assert_eq!(grid.cell_at(0.01, 0.99).unwrap(), (0, 0));
        assert_eq!(grid.cell_at(0.99, 0.01).unwrap(), (2, 2));
        assert!(grid.cell_at(1.5, 0.5).is_err());
    }

    #[test]
    fn center_of_round_trips_through_cell_at() {
        let grid = ElevationGrid::new(4, 4, vec![0.0; 16], bounds_unit_square()).unwrap();
        for row in 0..4 {
            for col in 0..4 {
                let (lon, lat) = grid.center_of(col, row);
                assert_eq!(grid.cell_at(lon, lat).unwrap(), (col, row));
            }
        }
    }

    #[test]
    fn neighbors8_interior_cell_has_eight() {
        let grid = ElevationGrid::new(3, 3, vec![0.0; 9], bounds_unit_square()).unwrap();
        let center_idx = grid.idx(1, 1);
        assert_eq!(grid.neighbors8(center_idx).len(), 8);
    }

    #[test]
    fn neighbors8_corner_cell_has_three() {
        let grid = ElevationGrid::new(3, 3, vec![0.0; 9], bounds_unit_square()).unwrap();
        let corner_idx = grid.idx(0, 0);
        assert_eq!(grid.neighbors8(corner_idx).len(), 3);
    }
}
