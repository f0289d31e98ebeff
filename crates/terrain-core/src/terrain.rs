//! `TerrainAnalyzer`: derives per-cell gradient magnitude and aspect azimuth
//! from elevations using the Horn (1981) 3x3 finite-difference operator.

use crate::aspect::{azimuth_from_gradient, FLAT_AZIMUTH, FLAT_GRADIENT_EPSILON};
use crate::band::{BandKind, TerrainBand};
use crate::error::{EngineError, EngineResult};
use crate::grid::ElevationGrid;

/// Output of [`TerrainAnalyzer::analyze`]: azimuth in `[0, 360)` degrees (or
/// `FLAT_AZIMUTH`), and gradient carrying the sign of the slope projected on
/// the downhill direction — callers use `abs()` for magnitude.
pub struct TerrainAnalysis {
    pub azimuths_deg: TerrainBand,
    pub gradients_signed: TerrainBand,
}

pub struct TerrainAnalyzer;

impl TerrainAnalyzer {
    /// Compute slope/aspect for every cell in `grid`.
    ///
    /// Interior cells use the full Horn stencil; border cells fall back to
    /// one-sided differences via clamped neighbor lookups. Any cell
    /// touching a NaN elevation (itself or a neighbor used by its stencil)
    /// is reported `Flat`/`0.0`.
    pub fn analyze(grid: &ElevationGrid) -> EngineResult<TerrainAnalysis> {
        if grid.width < 3 || grid.height < 3 {
            return Err(EngineError::invalid_input(
                "grid must be at least 3 cells in both dimensions for slope analysis",
            ));
        }
        let nan_count = grid.data.iter().filter(|v| v.is_nan()).count();
        if nan_count == grid.len() {
            return Err(EngineError::invalid_input("elevation data is entirely NaN"));
        }
        log::debug!(
            "TerrainAnalyzer::analyze cells={} nan_fraction={:.4}",
            grid.len(),
            nan_count as f64 / grid.len() as f64
        );

        let (width, height) = (grid.width, grid.height);
        let mut azimuths = vec![0.0f32; width * height];
        let mut gradients = vec![0.0f32; width * height];

        // Ground spacing per row/column varies with latitude; precompute
        // once per row rather than per cell.
        let sx_per_row = Self::sx_per_row(grid);
        let sy_per_row = Self::sy_per_row(grid);

        for row in 0..height {
            let sx = sx_per_row[row];
            let sy = sy_per_row[row];
            for col in 0..width {
                let (azimuth, gradient) =
                    Self::cell_slope(grid, col, row, sx, sy);
                let idx = grid.idx(col, row);
                azimuths[idx] = azimuth as f32;
                gradients[idx] = gradient as f32;
            }
        }

        Ok(TerrainAnalysis {
            azimuths_deg: TerrainBand::new(BandKind::Azimuth, width, height, grid.bounds, azimuths),
            gradients_signed: TerrainBand::new(BandKind::Gradient, width, height, grid.bounds, gradients),
        })
    }

    fn sx_per_row(grid: &ElevationGrid) -> Vec<f64> {
        (0..grid.height)
            .map(|row| {
                if grid.width < 2 {
                    1.0
                } else {
                    grid.step_distance_m((0, row), (1, row)).max(1e-9)
                }
            })
            .collect()
    }

    fn sy_per_row(grid: &ElevationGrid) -> Vec<f64> {
        (0..grid.height)
            .map(|row| {
                if row + 1 < grid.height {
                    grid.step_distance_m((0, row), (0, row + 1)).max(1e-9)
                } else if row > 0 {
                    grid.step_distance_m((0, row - 1), (0, row)).max(1e-9)
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Fetch elevation at `(col, row)`, clamped to the grid edges — used to
    /// implement one-sided differences at borders by repeating the edge
    /// value, equivalent to a zero second derivative across the boundary.
    #[inline]
    fn z(grid: &ElevationGrid, col: i64, row: i64) -> f32 {
        let col = col.clamp(0, grid.width as i64 - 1) as usize;
        let row = row.clamp(0, grid.height as i64 - 1) as usize;
        grid.elevation_at(grid.idx(col, row))
    }

    fn cell_slope(grid: &ElevationGrid, col: usize, row: usize, sx: f64, sy: f64) -> (f64, f64) {
        let (c, r) = (col as i64, row as i64);

        // Gather the 3x3 neighborhood, clamping at borders (one-sided
        // difference equivalent).
        let nw = Self::z(grid, c - 1, r - 1);
        let n = Self::z(grid, c, r - 1);
        let ne = Self::z(grid, c + 1, r - 1);
        let w = Self::z(grid, c - 1, r);
        let center = Self::z(grid, c, r);
        let e = Self::z(grid, c + 1, r);
        let sw = Self::z(grid, c - 1, r + 1);
        let s = Self::z(grid, c, r + 1);
        let se = Self::z(grid, c + 1, r + 1);

        if [nw, n, ne, w, center, e, sw, s, se].iter().any(|v| v.is_nan()) {
            return (FLAT_AZIMUTH, 0.0);
        }

        let (nw, n, ne, w, e, sw, s, se) =
            (nw as f64, n as f64, ne as f64, w as f64, e as f64, sw as f64, s as f64, se as f64);

        let dz_dx = ((ne + 2.0 * e + se) - (nw + 2.0 * w + sw)) / (8.0 * sx);
        let dz_dy = ((sw + 2.0 * s + se) - (nw + 2.0 * n + ne)) / (8.0 * sy);

        let magnitude = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
        if magnitude < FLAT_GRADIENT_EPSILON {
            return (FLAT_AZIMUTH, 0.0);
        }

        let azimuth = azimuth_from_gradient(dz_dx, dz_dy);
        // Signed gradient carries the sign of the downhill-projected slope
        // (south/positive-dz_dy side positive); feasibility predicates
        // consume `abs()` of this value.
        let signed_gradient = if dz_dy >= 0.0 { magnitude } else { -magnitude };
        (azimuth, signed_gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;

    fn bounds() -> Bounds {
        Bounds { north: 1.0, south: 0.0, east: 1.0, west: 0.0 }
    }

    #[test]
    fn flat_grid_is_all_flat() {
        let grid = ElevationGrid::new(5, 5, vec![0.0; 25], bounds()).unwrap();
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        for v in &analysis.gradients_signed.values {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn uniform_south_slope_has_nonzero_gradient_away_from_border_effects() {
        // Elevation increases going north (row 0) to south (last row):
        // data[row][col] = row * 10.0, so a cell descends toward south.
        let width = 7;
        let height = 7;
        let mut data = vec![0.0f32; width * height];
        for row in 0..height {
            for col in 0..width {
                data[row * width + col] = row as f32 * 10.0;
            }
        }
        let grid = ElevationGrid::new(width, height, data, bounds()).unwrap();
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        let center_idx = grid.idx(3, 3);
        assert!(analysis.gradients_signed.values[center_idx].abs() > 0.0);
    }

    #[test]
    fn nan_cell_forces_flat_neighbors() {
        let width = 5;
        let height = 5;
        let mut data = vec![1.0f32; width * height];
        data[2 * width + 2] = f32::NAN;
        let grid = ElevationGrid::new(width, height, data, bounds()).unwrap();
        let analysis = TerrainAnalyzer::analyze(&grid).unwrap();
        let idx = grid.idx(2, 2);
        assert_eq!(analysis.gradients_signed.values[idx], 0.0);
        assert_eq!(analysis.azimuths_deg.values[idx], FLAT_AZIMUTH as f32);
    }

    #[test]
    fn entirely_nan_grid_is_rejected() {
        let grid = ElevationGrid::new(5, 5, vec![f32::NAN; 25], bounds()).unwrap();
        assert!(TerrainAnalyzer::analyze(&grid).is_err());
    }

    #[test]
    fn undersized_grid_is_rejected() {
        let grid = ElevationGrid::new(2, 2, vec![0.0; 4], bounds()).unwrap();
        assert!(TerrainAnalyzer::analyze(&grid).is_err());
    }
}
