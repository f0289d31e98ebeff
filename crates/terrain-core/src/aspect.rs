//! Aspect classification: the compass direction a slope faces.
//!
//! Binning and tolerance conventions are kept deliberately distinct per call
//! site, mirroring the original crate (`compute_runout_zones` used a wider
//! tolerance than `find_path`'s successor filter): collapsing them to one
//! number would be a silent behavior change, not a simplification.

use serde::{Deserialize, Serialize};

/// Bin width is 45 degrees with centers at the eight compass points;
/// `Flat` is reserved for cells below the gradient epsilon or with an
/// undefined slope (see [`crate::terrain`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    Flat,
}

/// Exact classification tolerance: bin edges are closed-below, i.e. an
/// azimuth exactly on a boundary rounds to the lower-angle bin.
pub const BIN_TOLERANCE_DEG: f64 = 0.0;

/// Tolerance the Pathfinder's feasibility predicate uses when deciding
/// whether a cell's aspect falls in an excluded set.
pub const EXCLUSION_TOLERANCE_DEG: f64 = 2.5;

/// Wider tolerance `RunoutAnalyzer` uses when detecting avalanche seed
/// cells; steep excluded-aspect terrain close to a bin edge still seeds a
/// runout path in the source implementation.
pub const RUNOUT_SEED_TOLERANCE_DEG: f64 = 22.5;

/// Sentinel azimuth value used for undefined/flat slope, matching the
/// source's `-1.0` convention instead of `NaN` so it participates cleanly
/// in ordered comparisons.
pub const FLAT_AZIMUTH: f64 = -1.0;

/// Gradient magnitude below which a cell is classified `Flat` regardless of
/// its (numerically unstable) azimuth.
pub const FLAT_GRADIENT_EPSILON: f64 = 0.01;

impl Aspect {
    pub const ALL: [Aspect; 8] = [
        Aspect::North,
        Aspect::Northeast,
        Aspect::East,
        Aspect::Southeast,
        Aspect::South,
        Aspect::Southwest,
        Aspect::West,
        Aspect::Northwest,
    ];

    /// Bin a normalized azimuth in `[0, 360)` degrees (or the `FLAT_AZIMUTH`
    /// sentinel) into one of the nine aspect categories.
    pub fn from_azimuth(azimuth: f64) -> Aspect {
        if azimuth == FLAT_AZIMUTH {
            return Aspect::Flat;
        }
        match azimuth {
            a if a <= 22.5 => Aspect::North,
            a if a <= 67.5 => Aspect::Northeast,
            a if a <= 112.5 => Aspect::East,
            a if a <= 157.5 => Aspect::Southeast,
            a if a <= 202.5 => Aspect::South,
            a if a <= 247.5 => Aspect::Southwest,
            a if a <= 292.5 => Aspect::West,
            a if a <= 337.5 => Aspect::Northwest,
            _ => Aspect::North,
        }
    }

    /// Whether `azimuth` falls within this aspect's bin, widened by
    /// `tolerance` degrees on each edge.
    pub fn contains_azimuth(&self, azimuth: f64, tolerance: f64) -> bool {
        match self {
            Aspect::Northeast => (22.5 - tolerance) <= azimuth && azimuth <= (67.5 + tolerance),
            Aspect::East => (67.5 - tolerance) <= azimuth && azimuth <= (112.5 + tolerance),
            Aspect::Southeast => (112.5 - tolerance) <= azimuth && azimuth <= (157.5 + tolerance),
            Aspect::South => (157.5 - tolerance) <= azimuth && azimuth <= (202.5 + tolerance),
            Aspect::Southwest => (202.5 - tolerance) <= azimuth && azimuth <= (247.5 + tolerance),
            Aspect::West => (247.5 - tolerance) <= azimuth && azimuth <= (292.5 + tolerance),
            Aspect::Northwest => (292.5 - tolerance) <= azimuth && azimuth <= (337.5 + tolerance),
            Aspect::North => {
                (0.0 - tolerance) <= azimuth && azimuth <= (22.5 + tolerance)
                    || (337.5 - tolerance) <= azimuth && azimuth <= 360.0
            }
            Aspect::Flat => azimuth == FLAT_AZIMUTH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Aspect::North => "north",
            Aspect::Northeast => "northeast",
            Aspect::East => "east",
            Aspect::Southeast => "southeast",
            Aspect::South => "south",
            Aspect::Southwest => "southwest",
            Aspect::West => "west",
            Aspect::Northwest => "northwest",
            Aspect::Flat => "flat",
        }
    }
}

/// Compute the azimuth (degrees, 0 = North, 90 = East, clockwise) from a
/// pair of partial derivatives, using the convention `atan2(dz/dx, dz/dy)`
/// so that north-pointing gradients map to 0 degrees.
pub fn azimuth_from_gradient(dz_dx: f64, dz_dy: f64) -> f64 {
    if dz_dx == 0.0 && dz_dy == 0.0 {
        return FLAT_AZIMUTH;
    }
    let radians = dz_dx.atan2(dz_dy);
    let mut degrees = radians.to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    degrees
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_centers_classify_to_named_aspect() {
        assert_eq!(Aspect::from_azimuth(0.0), Aspect::North);
        assert_eq!(Aspect::from_azimuth(45.0), Aspect::Northeast);
        assert_eq!(Aspect::from_azimuth(90.0), Aspect::East);
        assert_eq!(Aspect::from_azimuth(180.0), Aspect::South);
        assert_eq!(Aspect::from_azimuth(315.0), Aspect::Northwest);
    }

    #[test]
    fn boundary_azimuth_rounds_to_lower_bin() {
        // 22.5 is the North/Northeast boundary; it rounds to the
        // lower-angle bin (North), not up to Northeast.
        assert_eq!(Aspect::from_azimuth(22.5), Aspect::North);
        assert_eq!(Aspect::from_azimuth(22.501), Aspect::Northeast);
    }

    #[test]
    fn flat_sentinel_classifies_flat() {
        assert_eq!(Aspect::from_azimuth(FLAT_AZIMUTH), Aspect::Flat);
    }

    #[test]
    fn exclusion_tolerance_widens_bin_edges() {
        // 65.0 sits in East bin proper only with a wide tolerance.
        assert!(!Aspect::East.contains_azimuth(65.0, EXCLUSION_TOLERANCE_DEG));
        assert!(Aspect::East.contains_azimuth(65.0, RUNOUT_SEED_TOLERANCE_DEG));
    }

    #[test]
    fn azimuth_from_gradient_matches_downslope_convention() {
        // Pure eastward descent: dz/dx > 0, dz/dy == 0 -> azimuth 90.
        let az = azimuth_from_gradient(1.0, 0.0);
        assert!((az - 90.0).abs() < 1e-9);
        // Pure northward descent: dz/dx == 0, dz/dy > 0 -> azimuth 0.
        let az = azimuth_from_gradient(0.0, 1.0);
        assert!(az.abs() < 1e-9);
    }
}
