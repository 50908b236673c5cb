//! Parametric patch types and evaluation.
//!
//! This module provides the polynomial core of the engine:
//!
//! - [`ControlGrid`]: a 4x4 bicubic Bezier control grid with de Casteljau
//!   evaluation ([`bezier`])
//! - [`GregoryPatch`]: a 20-point Gregory patch with rational corner
//!   blending ([`gregory`])
//! - analytic tangent-plane derivatives and surface normals ([`derivative`])
//!
//! All evaluation is a pure function of the control points and the
//! parametric coordinate `(u, v)` in [0, 1] x [0, 1]; nothing here holds
//! state between calls.
//!
//! ```
//! use quilt::patch::{ControlGrid, derivative};
//! use nalgebra::{Point3, Vector3};
//!
//! let grid = ControlGrid::from_fn(|i, j| Point3::new(i as f64, j as f64, 0.0));
//! let n = derivative::normal(&grid, 0.5, 0.5);
//! assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
//! ```

pub mod bezier;
pub mod derivative;
pub mod gregory;

pub use bezier::{cubic_blend, quadratic_blend, ControlGrid};
pub use derivative::{derivative_u, derivative_v, normal, transform_normal, NormalOrientation};
pub use gregory::{GregoryPatch, CORNER_BLEND_EPSILON};
