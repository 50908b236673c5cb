//! Tangent-plane derivatives and surface normals.
//!
//! A bicubic patch's partial derivative is itself a Bezier surface of one
//! degree lower in the differentiated direction. Its control points follow
//! the standard Bezier derivative construction: the u-derivative grid has
//! one fewer row, with each point equal to `3 * (p(i+1, j) - p(i, j))`; the
//! v-derivative grid has one fewer column, built from column differences.
//! Evaluating those grids (quadratic in the reduced direction, cubic in the
//! other) gives analytic tangent vectors, and their cross product gives the
//! surface normal.
//!
//! Under a model transform with non-uniform scale, normals must be mapped by
//! the inverse-transpose of the upper 3x3 of the model matrix and then
//! renormalized; [`transform_normal`] does exactly that.

use nalgebra::{Matrix4, Vector3};

use super::bezier::{cubic_blend_vectors, quadratic_blend_vectors};
use super::ControlGrid;

/// Orientation convention applied to computed normals.
///
/// `Flipped` negates the normal after the inverse-transpose step, matching
/// the convention used for displaced surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalOrientation {
    /// Normal as produced by `du x dv`.
    #[default]
    Outward,
    /// Negated normal.
    Flipped,
}

impl NormalOrientation {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            NormalOrientation::Outward => 1.0,
            NormalOrientation::Flipped => -1.0,
        }
    }
}

/// Control points of the u-derivative surface: 3 rows of 4 columns.
pub fn derivative_u_grid(grid: &ControlGrid) -> [[Vector3<f64>; 4]; 3] {
    std::array::from_fn(|i| {
        std::array::from_fn(|j| 3.0 * (grid.point(i + 1, j) - grid.point(i, j)))
    })
}

/// Control points of the v-derivative surface: 4 rows of 3 columns.
pub fn derivative_v_grid(grid: &ControlGrid) -> [[Vector3<f64>; 3]; 4] {
    std::array::from_fn(|i| {
        std::array::from_fn(|j| 3.0 * (grid.point(i, j + 1) - grid.point(i, j)))
    })
}

/// Partial derivative of the patch with respect to `u` at `(u, v)`.
pub fn derivative_u(grid: &ControlGrid, u: f64, v: f64) -> Vector3<f64> {
    let dg = derivative_u_grid(grid);
    let rows = [
        cubic_blend_vectors(&dg[0], v),
        cubic_blend_vectors(&dg[1], v),
        cubic_blend_vectors(&dg[2], v),
    ];
    quadratic_blend_vectors(&rows, u)
}

/// Partial derivative of the patch with respect to `v` at `(u, v)`.
pub fn derivative_v(grid: &ControlGrid, u: f64, v: f64) -> Vector3<f64> {
    let dg = derivative_v_grid(grid);
    let rows = [
        quadratic_blend_vectors(&dg[0], v),
        quadratic_blend_vectors(&dg[1], v),
        quadratic_blend_vectors(&dg[2], v),
        quadratic_blend_vectors(&dg[3], v),
    ];
    cubic_blend_vectors(&rows, u)
}

/// Unit surface normal at `(u, v)`, in the patch's object space.
///
/// Returns the zero vector where the tangent frame degenerates (zero cross
/// product); such samples are local failures that do not affect neighbors.
pub fn normal(grid: &ControlGrid, u: f64, v: f64) -> Vector3<f64> {
    let du = derivative_u(grid, u, v);
    let dv = derivative_v(grid, u, v);
    normalize_or_zero(du.cross(&dv))
}

/// Map an object-space normal through a model transform.
///
/// Uses the inverse-transpose of the upper 3x3 of `model`, renormalizes,
/// and applies the orientation sign. A singular model matrix leaves the
/// normal untransformed.
pub fn transform_normal(
    normal: Vector3<f64>,
    model: &Matrix4<f64>,
    orientation: NormalOrientation,
) -> Vector3<f64> {
    let linear = model.fixed_view::<3, 3>(0, 0).into_owned();
    let mapped = match linear.try_inverse() {
        Some(inverse) => inverse.transpose() * normal,
        None => normal,
    };
    orientation.sign() * normalize_or_zero(mapped)
}

#[inline]
fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn flat_grid() -> ControlGrid {
        ControlGrid::from_fn(|i, j| Point3::new(i as f64, j as f64, 0.0))
    }

    #[test]
    fn test_derivative_grids_shape_and_values() {
        let grid = flat_grid();
        let du = derivative_u_grid(&grid);
        let dv = derivative_v_grid(&grid);

        // Unit spacing: every difference is 3 along the respective axis,
        // including the last column of du and the last row of dv.
        for row in &du {
            for d in row {
                assert_eq!(*d, Vector3::new(3.0, 0.0, 0.0));
            }
        }
        for row in &dv {
            for d in row {
                assert_eq!(*d, Vector3::new(0.0, 3.0, 0.0));
            }
        }
    }

    #[test]
    fn test_planar_patch_constant_normal() {
        let grid = flat_grid();
        for iu in 0..=4 {
            for iv in 0..=4 {
                let (u, v) = (iu as f64 / 4.0, iv as f64 / 4.0);
                let n = normal(&grid, u, v);
                assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let grid = ControlGrid::from_fn(|i, j| {
            Point3::new(i as f64, j as f64, ((i * i) as f64).sin() + j as f64 * 0.5)
        });
        let (u, v) = (0.4, 0.6);
        let h = 1e-6;

        let du = derivative_u(&grid, u, v);
        let fd_u = (grid.evaluate(u + h, v) - grid.evaluate(u - h, v)) / (2.0 * h);
        assert!((du - fd_u).norm() < 1e-5);

        let dv = derivative_v(&grid, u, v);
        let fd_v = (grid.evaluate(u, v + h) - grid.evaluate(u, v - h)) / (2.0 * h);
        assert!((dv - fd_v).norm() < 1e-5);
    }

    #[test]
    fn test_normal_under_nonuniform_scale() {
        // Scaling x by 2 leaves a z-facing normal z-facing only if the
        // inverse-transpose is used; the plain linear map would too for this
        // normal, so also check a tilted one.
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let tilted = Vector3::new(1.0, 0.0, 1.0).normalize();
        let n = transform_normal(tilted, &model, NormalOrientation::Outward);
        // Inverse-transpose scales the x component by 1/2.
        let expected = Vector3::new(tilted.x / 2.0, 0.0, tilted.z).normalize();
        assert!((n - expected).norm() < 1e-12);
        assert!((n.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flipped_orientation() {
        let n = transform_normal(
            Vector3::new(0.0, 0.0, 1.0),
            &Matrix4::identity(),
            NormalOrientation::Flipped,
        );
        assert_eq!(n, Vector3::new(0.0, 0.0, -1.0));
    }
}
