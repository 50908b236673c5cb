//! Displacement mapping with distance-based mip selection.
//!
//! Displaced surfaces perturb every evaluated position along its normal by a
//! height sampled from a single-channel texture. The sample's mip level is
//! chosen from the view-space depth through the same logarithmic factor
//! function the level assigner uses, with the falloff constant replaced by
//! the surface's subdivision count and a coarser distance scale. Sampling
//! happens at the patch's global texture coordinate, which is continuous
//! across patch boundaries, so neighboring patches read matching heights
//! along their shared edge.
//!
//! Coordinates outside [0, 1) on either axis contribute zero displacement
//! instead of sampling, which avoids wrap and clamp artifacts at the outer
//! boundary of the patch grid.

use nalgebra::{Point3, Vector3};

use crate::texture::Texture;

use super::{tess_factor, TessLimits};

/// Height-to-world scale applied to sampled displacement.
pub const DISPLACEMENT_SCALE: f64 = 0.05;
/// Distance scale constant `s` used for mip selection.
pub const MIP_DISTANCE_SCALE: f64 = 0.1;
/// Depth divisor applied before the factor function.
pub const MIP_DEPTH_DIVISOR: f64 = 5.0;
/// Base LOD the factor is subtracted from.
pub const MIP_LOD_BASE: f64 = 6.0;

/// Continuous mip level for a sample at the given view-space depth.
///
/// Computed as `6 - log2(max(factor(depth / 5), 1))` with the factor
/// function parameterized by the surface's subdivision count. Nearby
/// samples get a high factor and therefore a fine (low) mip level.
pub fn mip_lod(depth: f64, subdivisions: u32) -> f64 {
    let factor = tess_factor(
        depth / MIP_DEPTH_DIVISOR,
        subdivisions as f64,
        MIP_DISTANCE_SCALE,
        TessLimits::DISPLACED,
    );
    MIP_LOD_BASE - (factor.max(1) as f64).log2()
}

/// Displace `position` along `normal` by the height sampled at
/// `(global_u, global_v)`.
///
/// Returns the position unchanged when either coordinate falls outside
/// [0, 1).
pub fn displace(
    position: Point3<f64>,
    normal: &Vector3<f64>,
    global_u: f64,
    global_v: f64,
    depth: f64,
    heights: &Texture,
    subdivisions: u32,
) -> Point3<f64> {
    if !(0.0..1.0).contains(&global_u) || !(0.0..1.0).contains(&global_v) {
        return position;
    }
    let lod = mip_lod(depth, subdivisions);
    let height = heights.sample_lod(lod, global_u, global_v, 0) as f64;
    position + normal * (height * DISPLACEMENT_SCALE)
}
