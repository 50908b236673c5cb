//! # Quilt
//!
//! An adaptive surface-tessellation and evaluation engine for parametric
//! patches.
//!
//! Given a coarse grid of control points describing a bicubic Bezier patch
//! (or a 20-point Gregory patch), quilt decides how finely to subdivide the
//! patch from viewer distance, evaluates the resulting fine mesh positions
//! by de Casteljau blending, and derives surface normals, tangent-plane
//! derivatives, and optional texture-driven displacement for shading.
//!
//! ## Features
//!
//! - **Bicubic Bezier evaluation**: numerically stable nested de Casteljau
//!   blending with exact corner interpolation
//! - **Gregory patches**: rational corner blending with singular-denominator
//!   handling, for tangent continuity across irregular topology
//! - **Analytic derivatives**: Bezier derivative control grids, surface
//!   normals, inverse-transpose normal transforms
//! - **Crack-free adaptive levels**: per-edge logarithmic distance factors
//!   shared across patch boundaries, interior never coarser than any edge
//! - **Displacement mapping**: distance-driven mip selection and
//!   normal-direction perturbation, continuous across patch boundaries
//! - **Trim masks**: texture-encoded containment tests
//!
//! ## Quick Start
//!
//! ```
//! use quilt::prelude::*;
//! use nalgebra::{Matrix4, Point3, Vector3};
//!
//! // A flat 4x4 control lattice on z = 0.
//! let grid = ControlGrid::from_fn(|i, j| Point3::new(i as f64, j as f64, 0.0));
//! let surface = PatchSurface::Bezier(grid);
//!
//! // Camera looking straight down from 10 units above.
//! let context = FrameContext::new(
//!     Matrix4::identity(),
//!     Matrix4::new_translation(&Vector3::new(0.0, 0.0, -10.0)),
//!     Matrix4::identity(),
//!     Point3::new(0.0, 0.0, 10.0),
//! );
//!
//! let out = tessellate_patch(&surface, &context, &TessellationOptions::default());
//!
//! // Symmetric view: every edge gets the same factor, the mesh stays flat.
//! assert_eq!(out.levels.inner, [out.levels.outer[0]; 2]);
//! assert!(out.vertices.iter().all(|v| v.position.z.abs() < 1e-12));
//! ```
//!
//! ## Design
//!
//! Tessellation is a two-stage pipeline. A per-patch level assignment
//! produces a small immutable [`tess::TessLevels`] record; a data-parallel
//! evaluation stage then maps every `(u, v)` sample through the patch
//! evaluator independently, reading only shared immutable inputs. The
//! engine recomputes everything per frame from control points and camera
//! state and owns no caches, files, or protocols.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod curve;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod tess;
pub mod texture;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use quilt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::curve::{CubicSplineC0, CurveSegment};
    pub use crate::error::{Result, TessError};
    pub use crate::patch::{ControlGrid, GregoryPatch, NormalOrientation};
    pub use crate::pipeline::{
        tessellate_grid, tessellate_patch, FrameContext, PatchSurface, SurfaceVertex,
        TessMode, TessellatedPatch, TessellationOptions,
    };
    pub use crate::tess::{tess_factor, TessLevels, TessLimits};
    pub use crate::texture::Texture;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
