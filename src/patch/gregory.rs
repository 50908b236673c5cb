//! Gregory patch evaluation with rational corner blending.
//!
//! A Gregory patch carries 20 control points: two boundary rows of four
//! ("top" and "bottom"), two side points on each middle row, and eight
//! inner points (four paired with the u direction, four with v). The inner
//! points are never used directly as polygon vertices. For every evaluation
//! parameter they are first blended pairwise into four corner points with
//! rational weights drawn from `{u, v, 1-u, 1-v}`; the blended corners then
//! complete a virtual 4x4 grid that is evaluated as a standard bicubic
//! patch. The per-parameter blend is what buys tangent continuity across
//! neighboring patches without requiring a regular control grid.
//!
//! Each corner's weight pair vanishes simultaneously at exactly one domain
//! corner; a small epsilon in the denominator keeps that case finite, with
//! the blended point degrading toward zero contribution instead of NaN.

use nalgebra::Point3;

use super::ControlGrid;

/// Additive denominator guard for the rational corner blend.
pub const CORNER_BLEND_EPSILON: f64 = 1e-9;

/// The 20 control points of a Gregory patch.
///
/// `top` and `bottom` are the two boundary rows (evaluated with the v
/// parameter); `top_sides` and `bottom_sides` are the outer points of the
/// two middle rows; `u_inner` and `v_inner` are the eight inner points
/// feeding the corner blend, indexed corner-major: 0 = (u0,v0), 1 = (u0,v1),
/// 2 = (u1,v0), 3 = (u1,v1).
#[derive(Debug, Clone, PartialEq)]
pub struct GregoryPatch {
    /// Boundary row at u = 0.
    pub top: [Point3<f64>; 4],
    /// Side points of the first middle row (v = 0 side, v = 1 side).
    pub top_sides: [Point3<f64>; 2],
    /// Side points of the second middle row (v = 0 side, v = 1 side).
    pub bottom_sides: [Point3<f64>; 2],
    /// Boundary row at u = 1.
    pub bottom: [Point3<f64>; 4],
    /// Inner points paired with the u-direction blend weights.
    pub u_inner: [Point3<f64>; 4],
    /// Inner points paired with the v-direction blend weights.
    pub v_inner: [Point3<f64>; 4],
}

impl GregoryPatch {
    /// Blend the eight inner points into the four corner points for the
    /// given parameters.
    ///
    /// Each corner is a weighted average of one `u_inner` and one `v_inner`
    /// point, with the weight pair chosen so it vanishes only at the domain
    /// corner the pair sits next to:
    ///
    /// - corner 0: weights (u, v), vanishing at (0, 0)
    /// - corner 1: weights (u, 1-v), vanishing at (0, 1)
    /// - corner 2: weights (1-u, v), vanishing at (1, 0)
    /// - corner 3: weights (1-u, 1-v), vanishing at (1, 1)
    pub fn blended_corners(&self, u: f64, v: f64) -> [Point3<f64>; 4] {
        let u1 = 1.0 - u;
        let v1 = 1.0 - v;
        [
            blend(self.u_inner[0], self.v_inner[0], u, v),
            blend(self.u_inner[1], self.v_inner[1], u, v1),
            blend(self.u_inner[2], self.v_inner[2], u1, v),
            blend(self.u_inner[3], self.v_inner[3], u1, v1),
        ]
    }

    /// Assemble the virtual 4x4 control grid for the given parameters.
    ///
    /// Rows are: the top boundary, the two middle rows completed by the
    /// blended corners, and the bottom boundary.
    pub fn virtual_grid(&self, u: f64, v: f64) -> ControlGrid {
        let [c00, c01, c10, c11] = self.blended_corners(u, v);
        ControlGrid::new([
            self.top,
            [self.top_sides[0], c00, c01, self.top_sides[1]],
            [self.bottom_sides[0], c10, c11, self.bottom_sides[1]],
            self.bottom,
        ])
    }

    /// Evaluate the patch at `(u, v)` via the virtual grid.
    pub fn evaluate(&self, u: f64, v: f64) -> Point3<f64> {
        self.virtual_grid(u, v).evaluate(u, v)
    }

    /// The four boundary corner points, ordered (u0,v0), (u0,v1), (u1,v0),
    /// (u1,v1), as used for distance-based level assignment.
    pub fn corners(&self) -> [Point3<f64>; 4] {
        [self.top[0], self.top[3], self.bottom[0], self.bottom[3]]
    }
}

fn blend(a: Point3<f64>, b: Point3<f64>, wa: f64, wb: f64) -> Point3<f64> {
    Point3::from((wa * a.coords + wb * b.coords) / (wa + wb + CORNER_BLEND_EPSILON))
}
