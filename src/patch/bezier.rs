//! Bicubic Bezier patch evaluation.
//!
//! Evaluation uses de Casteljau blending: repeated linear interpolation
//! between control points, which evaluates the Bernstein basis without ever
//! forming explicit polynomial coefficients and stays numerically stable for
//! parameters in [0, 1]. A cubic blend of four points is three interpolation
//! passes (4 points to 3, 3 to 2, 2 to the result); the quadratic variant
//! over three points is two passes and serves derivative curves and short
//! curve segments.
//!
//! # Example
//!
//! ```
//! use quilt::patch::ControlGrid;
//! use nalgebra::Point3;
//!
//! // A flat unit lattice on z = 0.
//! let grid = ControlGrid::from_fn(|i, j| Point3::new(i as f64, j as f64, 0.0));
//!
//! // The evaluator interpolates the corner control points exactly.
//! assert_eq!(grid.evaluate(0.0, 0.0), grid.point(0, 0));
//! assert_eq!(grid.evaluate(1.0, 1.0), grid.point(3, 3));
//! ```

use nalgebra::{Point3, Vector3};

#[inline]
fn lerp(a: Vector3<f64>, b: Vector3<f64>, t: f64) -> Vector3<f64> {
    (1.0 - t) * a + t * b
}

/// Cubic de Casteljau blend of four vectors at parameter `t`.
pub(crate) fn cubic_blend_vectors(b: &[Vector3<f64>; 4], t: f64) -> Vector3<f64> {
    let q0 = lerp(b[0], b[1], t);
    let q1 = lerp(b[1], b[2], t);
    let q2 = lerp(b[2], b[3], t);

    let r0 = lerp(q0, q1, t);
    let r1 = lerp(q1, q2, t);

    lerp(r0, r1, t)
}

/// Quadratic de Casteljau blend of three vectors at parameter `t`.
pub(crate) fn quadratic_blend_vectors(b: &[Vector3<f64>; 3], t: f64) -> Vector3<f64> {
    let q0 = lerp(b[0], b[1], t);
    let q1 = lerp(b[1], b[2], t);

    lerp(q0, q1, t)
}

/// Evaluate a cubic Bezier segment through four control points at `t`.
///
/// Stable for `t` in [0, 1]; extrapolates for parameters outside that range,
/// so callers are expected to clamp.
pub fn cubic_blend(points: &[Point3<f64>; 4], t: f64) -> Point3<f64> {
    Point3::from(cubic_blend_vectors(
        &[
            points[0].coords,
            points[1].coords,
            points[2].coords,
            points[3].coords,
        ],
        t,
    ))
}

/// Evaluate a quadratic Bezier segment through three control points at `t`.
pub fn quadratic_blend(points: &[Point3<f64>; 3], t: f64) -> Point3<f64> {
    Point3::from(quadratic_blend_vectors(
        &[points[0].coords, points[1].coords, points[2].coords],
        t,
    ))
}

/// A 4x4 grid of control points defining a bicubic Bezier patch.
///
/// Indexing is row-major: `point(i, j)` is the control point at parametric
/// row `i` (the u index) and column `j` (the v index). A patch always has
/// exactly 16 control points.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    points: [[Point3<f64>; 4]; 4],
}

impl ControlGrid {
    /// Create a grid from its 16 control points, row-major.
    pub fn new(points: [[Point3<f64>; 4]; 4]) -> Self {
        Self { points }
    }

    /// Create a grid by evaluating `f(i, j)` for each row/column index pair.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> Point3<f64>) -> Self {
        Self {
            points: std::array::from_fn(|i| std::array::from_fn(|j| f(i, j))),
        }
    }

    /// Control point at row `i`, column `j`.
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> Point3<f64> {
        self.points[i][j]
    }

    /// Control points of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[Point3<f64>; 4] {
        &self.points[i]
    }

    /// The four corner control points, ordered (u0,v0), (u0,v1), (u1,v0),
    /// (u1,v1).
    ///
    /// Adjacent patches that share an edge share the two corner points of
    /// that edge, which is what keeps distance-based tessellation factors
    /// identical on both sides.
    pub fn corners(&self) -> [Point3<f64>; 4] {
        [
            self.points[0][0],
            self.points[0][3],
            self.points[3][0],
            self.points[3][3],
        ]
    }

    /// Evaluate the patch at `(u, v)`.
    ///
    /// Each row is cubic-blended at `v`, then the four intermediate points
    /// are cubic-blended at `u`. The result interpolates the four corner
    /// control points exactly. Parameters are expected in [0, 1].
    pub fn evaluate(&self, u: f64, v: f64) -> Point3<f64> {
        let rows = [
            cubic_blend(&self.points[0], v),
            cubic_blend(&self.points[1], v),
            cubic_blend(&self.points[2], v),
            cubic_blend(&self.points[3], v),
        ];
        cubic_blend(&rows, u)
    }
}
