//! Distance-based tessellation level assignment.
//!
//! Levels are assigned once per patch, before any evaluation point exists,
//! and every evaluation worker for that patch reads the same record. The
//! adaptive heuristic measures the view-space depth of each boundary edge's
//! midpoint and maps it through a clamped logarithmic falloff; because the
//! midpoint is computed from the two corner control points an edge shares
//! with its neighboring patch, both patches assign the same factor to the
//! shared edge and the tessellated meshes meet without cracks.
//!
//! The two inner factors are set to the maximum of the four outer factors,
//! so the patch interior is never coarser than any of its boundaries. A
//! fixed mode ([`TessLevels::fixed`]) bypasses the distance heuristic for
//! surfaces that do not need adaptive detail.
//!
//! # Example
//!
//! ```
//! use quilt::tess::{tess_factor, TessLimits, ADAPTIVE_FALLOFF, ADAPTIVE_DISTANCE_SCALE};
//!
//! let near = tess_factor(0.5, ADAPTIVE_FALLOFF, ADAPTIVE_DISTANCE_SCALE, TessLimits::BASIC);
//! let far = tess_factor(500.0, ADAPTIVE_FALLOFF, ADAPTIVE_DISTANCE_SCALE, TessLimits::BASIC);
//! assert!(near >= far);
//! assert_eq!(far, TessLimits::BASIC.min);
//! ```

pub mod displace;
pub mod trim;

use nalgebra::Point3;

use crate::error::{Result, TessError};
use crate::pipeline::FrameContext;

/// Smallest tessellation level ever assigned.
pub const MIN_TESS_LEVEL: u32 = 2;
/// Largest level for basic and Gregory patches.
pub const MAX_TESS_LEVEL: u32 = 32;
/// Largest level for displaced surfaces.
pub const MAX_DISPLACED_TESS_LEVEL: u32 = 64;

/// Falloff constant `k` of the adaptive factor formula.
pub const ADAPTIVE_FALLOFF: f64 = 16.0;
/// Distance scale constant `s` of the adaptive factor formula.
pub const ADAPTIVE_DISTANCE_SCALE: f64 = 0.05;

/// Inclusive tessellation level bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessLimits {
    /// Lower bound.
    pub min: u32,
    /// Upper bound.
    pub max: u32,
}

impl TessLimits {
    /// Limits for basic Bezier and Gregory patches: 2..=32.
    pub const BASIC: Self = Self {
        min: MIN_TESS_LEVEL,
        max: MAX_TESS_LEVEL,
    };

    /// Limits for displaced surfaces: 2..=64.
    pub const DISPLACED: Self = Self {
        min: MIN_TESS_LEVEL,
        max: MAX_DISPLACED_TESS_LEVEL,
    };

    /// Create custom limits.
    ///
    /// # Errors
    ///
    /// Returns [`TessError::InvalidLevelRange`] when `min` is zero (a level
    /// is a subdivision count, so at least one interval is required) or
    /// `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min == 0 || min > max {
            return Err(TessError::InvalidLevelRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Clamp a level into these limits.
    #[inline]
    pub fn clamp(&self, level: u32) -> u32 {
        level.clamp(self.min, self.max)
    }
}

impl Default for TessLimits {
    fn default() -> Self {
        Self::BASIC
    }
}

/// Map a view-space distance to a tessellation factor.
///
/// The factor is `round(-falloff * log10(dist * scale))`, clamped into
/// `limits`. It is monotonically non-increasing in `dist` and stays inside
/// the limits for any input: a distance at or below zero (where the
/// logarithm diverges or is undefined) yields the maximum or minimum
/// respectively, and NaN yields the minimum.
pub fn tess_factor(dist: f64, falloff: f64, scale: f64, limits: TessLimits) -> u32 {
    let raw = -falloff * (dist * scale).log10();
    if raw.is_nan() {
        return limits.min;
    }
    let rounded = raw.round();
    if rounded <= limits.min as f64 {
        limits.min
    } else if rounded >= limits.max as f64 {
        limits.max
    } else {
        rounded as u32
    }
}

/// Per-patch tessellation levels: four outer factors (one per boundary
/// edge) and two inner factors.
///
/// Outer factors follow the edge order u-min, v-min, u-max, v-max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessLevels {
    /// Edge factors in order u-min, v-min, u-max, v-max.
    pub outer: [u32; 4],
    /// Interior factors along u and v.
    pub inner: [u32; 2],
}

impl TessLevels {
    /// Build levels from four outer factors, setting both inner factors to
    /// the maximum outer factor.
    ///
    /// The interior must never be coarser than any boundary, or gaps open
    /// between adjacently tessellated patches of differing density.
    pub fn from_outer(outer: [u32; 4], limits: TessLimits) -> Self {
        let outer = outer.map(|level| limits.clamp(level));
        let max = outer.iter().copied().max().unwrap_or(limits.min);
        Self {
            outer,
            inner: [max, max],
        }
    }

    /// Uniform fixed subdivision: `u_subdivisions` intervals along u and
    /// `v_subdivisions` along v, no distance heuristic.
    pub fn fixed(u_subdivisions: u32, v_subdivisions: u32, limits: TessLimits) -> Self {
        let u = limits.clamp(u_subdivisions);
        let v = limits.clamp(v_subdivisions);
        Self {
            outer: [v, u, v, u],
            inner: [u, v],
        }
    }

    /// Assign adaptive levels from the patch's four corner points and the
    /// frame transforms.
    ///
    /// `corners` are ordered (u0,v0), (u0,v1), (u1,v0), (u1,v1). Each edge's
    /// factor comes from the view-space depth of the edge midpoint in object
    /// space, so patches sharing an edge assign it the same factor.
    pub fn assign(corners: &[Point3<f64>; 4], context: &FrameContext, limits: TessLimits) -> Self {
        let [c00, c01, c10, c11] = corners;
        // Edge order: u-min, v-min, u-max, v-max.
        let midpoints = [
            midpoint(c00, c01),
            midpoint(c00, c10),
            midpoint(c10, c11),
            midpoint(c01, c11),
        ];
        let outer = midpoints.map(|mid| {
            let dist = context.view_depth(&mid);
            tess_factor(dist, ADAPTIVE_FALLOFF, ADAPTIVE_DISTANCE_SCALE, limits)
        });
        Self::from_outer(outer, limits)
    }
}

fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) / 2.0)
}
