//! Two-stage tessellation pipeline.
//!
//! Tessellation runs as two stages per patch, mirroring the split between a
//! level-assignment leader and a pool of independent evaluation workers:
//!
//! 1. **Level assignment**: one computation per patch produces a small
//!    immutable [`TessLevels`] record from the patch corners and the frame
//!    transforms.
//! 2. **Evaluation**: every sample of the resulting (u, v) set is a pure
//!    function of that record and the shared immutable inputs (control
//!    points, [`FrameContext`], textures), so the stage is a plain parallel
//!    map with no ordering, locking, or communication between samples.
//!
//! The sample set has two parts: an interior grid at the inner factors, and
//! one chain per boundary edge sampled at that edge's outer factor.
//! Triangle emission stitches each edge chain to the interior, so two
//! patches that assigned the same outer factor to a shared edge emit
//! identical vertex positions along it and their meshes meet without
//! cracks.
//!
//! Everything is recomputed per frame from control points and camera state;
//! no results are cached across frames. A sample that degenerates (for
//! example a zero-length tangent frame) affects only its own output slot.
//!
//! # Example
//!
//! ```
//! use quilt::pipeline::{tessellate_patch, FrameContext, PatchSurface, TessellationOptions};
//! use quilt::patch::ControlGrid;
//! use nalgebra::Point3;
//!
//! let grid = ControlGrid::from_fn(|i, j| Point3::new(i as f64, j as f64, 0.0));
//! let surface = PatchSurface::Bezier(grid);
//! let context = FrameContext::identity();
//! let tessellated = tessellate_patch(&surface, &context, &TessellationOptions::default());
//! assert!(!tessellated.triangles().is_empty());
//! ```

use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use rayon::prelude::*;

use crate::error::{Result, TessError};
use crate::patch::derivative::{derivative_u, derivative_v, transform_normal, NormalOrientation};
use crate::patch::{ControlGrid, GregoryPatch};
use crate::tess::{displace, trim, TessLevels, TessLimits};
use crate::texture::Texture;

/// Immutable per-frame transform state, passed by reference into every
/// evaluation call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Object-to-world transform.
    pub model: Matrix4<f64>,
    /// World-to-view transform.
    pub view: Matrix4<f64>,
    /// View-to-clip transform.
    pub projection: Matrix4<f64>,
    /// Camera position in world space.
    pub camera_position: Point3<f64>,
}

impl FrameContext {
    /// Create a context from its transforms and camera position.
    pub fn new(
        model: Matrix4<f64>,
        view: Matrix4<f64>,
        projection: Matrix4<f64>,
        camera_position: Point3<f64>,
    ) -> Self {
        Self {
            model,
            view,
            projection,
            camera_position,
        }
    }

    /// Identity transforms with the camera at the origin.
    pub fn identity() -> Self {
        Self::new(
            Matrix4::identity(),
            Matrix4::identity(),
            Matrix4::identity(),
            Point3::origin(),
        )
    }

    /// Absolute view-space depth of an object-space point.
    pub fn view_depth(&self, object_point: &Point3<f64>) -> f64 {
        (self.view * self.model).transform_point(object_point).z.abs()
    }

    /// Object-space point mapped to world space.
    pub fn world_position(&self, object_point: &Point3<f64>) -> Point3<f64> {
        self.model.transform_point(object_point)
    }

    /// Homogeneous clip-space position of an object-space point.
    ///
    /// The perspective divide is left to the consumer.
    pub fn clip_position(&self, object_point: &Point3<f64>) -> Vector4<f64> {
        self.projection * self.view * self.model * object_point.to_homogeneous()
    }
}

/// A tessellatable surface patch.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchSurface {
    /// A standard bicubic Bezier patch.
    Bezier(ControlGrid),
    /// A 20-point Gregory patch.
    Gregory(GregoryPatch),
}

impl PatchSurface {
    /// Evaluate the surface position at `(u, v)`.
    pub fn evaluate(&self, u: f64, v: f64) -> Point3<f64> {
        match self {
            Self::Bezier(grid) => grid.evaluate(u, v),
            Self::Gregory(patch) => patch.evaluate(u, v),
        }
    }

    /// Tangent-plane derivatives `(du, dv)` at `(u, v)`, in object space.
    ///
    /// For a Gregory patch the derivatives are taken on the virtual grid
    /// assembled for the same parameters, treating the blended corners as
    /// locally constant: the corners' own dependence on `(u, v)` is not
    /// differentiated. The tangents (and normals built from them) are
    /// therefore exact along the patch boundary, where the corner rows'
    /// basis weights vanish, and approximate toward the patch interior.
    pub fn local_frame(&self, u: f64, v: f64) -> (Vector3<f64>, Vector3<f64>) {
        match self {
            Self::Bezier(grid) => (derivative_u(grid, u, v), derivative_v(grid, u, v)),
            Self::Gregory(patch) => {
                let grid = patch.virtual_grid(u, v);
                (derivative_u(&grid, u, v), derivative_v(&grid, u, v))
            }
        }
    }

    /// The four boundary corners used for level assignment.
    pub fn corners(&self) -> [Point3<f64>; 4] {
        match self {
            Self::Bezier(grid) => grid.corners(),
            Self::Gregory(patch) => patch.corners(),
        }
    }
}

/// How tessellation levels are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessMode {
    /// Distance-based adaptive levels per edge.
    #[default]
    Adaptive,
    /// Uniform subdivision counts, no distance heuristic.
    Fixed {
        /// Subdivisions along u.
        u_subdivisions: u32,
        /// Subdivisions along v.
        v_subdivisions: u32,
    },
}

/// Displacement-mapping inputs for a tessellation run.
#[derive(Debug, Clone, Copy)]
pub struct Displacement<'a> {
    /// Single-channel height texture with a mip chain.
    pub heights: &'a Texture,
    /// Subdivision count driving mip selection.
    pub subdivisions: u32,
}

/// Options for a tessellation run.
#[derive(Debug, Clone)]
pub struct TessellationOptions<'a> {
    /// Level clamp range.
    pub limits: TessLimits,
    /// Adaptive or fixed level assignment.
    pub mode: TessMode,
    /// Normal orientation convention.
    pub orientation: NormalOrientation,
    /// Optional displacement mapping.
    pub displacement: Option<Displacement<'a>>,
    /// Optional trim mask.
    pub trim: Option<&'a Texture>,
    /// Whether to evaluate samples in parallel (default: true).
    pub parallel: bool,
}

impl Default for TessellationOptions<'_> {
    fn default() -> Self {
        Self {
            limits: TessLimits::BASIC,
            mode: TessMode::Adaptive,
            orientation: NormalOrientation::Outward,
            displacement: None,
            trim: None,
            parallel: true,
        }
    }
}

impl<'a> TessellationOptions<'a> {
    /// Options for a displaced surface: widened level limits, the flipped
    /// normal convention, and the given height texture.
    pub fn displaced(heights: &'a Texture, subdivisions: u32) -> Self {
        Self {
            limits: TessLimits::DISPLACED,
            orientation: NormalOrientation::Flipped,
            displacement: Some(Displacement {
                heights,
                subdivisions,
            }),
            ..Self::default()
        }
    }

    /// Set the level clamp range.
    pub fn with_limits(mut self, limits: TessLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the level assignment mode.
    pub fn with_mode(mut self, mode: TessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set a trim mask.
    pub fn with_trim(mut self, mask: &'a Texture) -> Self {
        self.trim = Some(mask);
        self
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// One evaluated sample of a tessellated patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceVertex {
    /// World-space position, displaced when displacement mapping is active.
    pub position: Point3<f64>,
    /// Unit world-space normal; zero where the tangent frame degenerates.
    pub normal: Vector3<f64>,
    /// Patch-local parametric coordinate.
    pub uv: Vector2<f64>,
    /// Texture coordinate continuous across the patch grid.
    pub global_uv: Vector2<f64>,
    /// Mip LOD used for displacement sampling; 0 when displacement is off.
    pub lod: f64,
    /// Object-space tangent along u.
    pub derivative_u: Vector3<f64>,
    /// Object-space tangent along v.
    pub derivative_v: Vector3<f64>,
    /// Whether the trim mask classified this sample as outside.
    pub trimmed: bool,
}

/// The output of tessellating one patch.
///
/// Vertices are laid out as the interior sample grid (row-major,
/// `interior_rows x interior_cols`, covering the open interior of the
/// domain at the inner factors) followed by the four boundary edge chains
/// in edge order u-min, v-min, u-max, v-max, each sampled at its own outer
/// factor. Because a shared edge gets the same outer factor on both sides,
/// adjacent patches emit identical vertex positions along it.
#[derive(Debug, Clone)]
pub struct TessellatedPatch {
    /// Levels assigned by stage 1.
    pub levels: TessLevels,
    /// Interior samples along u (one less than the effective inner u
    /// factor).
    pub interior_rows: usize,
    /// Interior samples along v (one less than the effective inner v
    /// factor).
    pub interior_cols: usize,
    /// Interior grid followed by the four edge chains.
    pub vertices: Vec<SurfaceVertex>,
    /// Start of each edge chain in `vertices`; the last entry is the total
    /// length.
    edge_offsets: [usize; 5],
}

impl TessellatedPatch {
    /// Interior vertex at sample row `i`, column `j`.
    ///
    /// Row `i` sits at `u = (i + 1) / (interior_rows + 1)`, column `j` at
    /// `v = (j + 1) / (interior_cols + 1)`.
    #[inline]
    pub fn interior(&self, i: usize, j: usize) -> &SurfaceVertex {
        &self.vertices[i * self.interior_cols + j]
    }

    /// The resampled chain of boundary edge `edge` (0 = u-min, 1 = v-min,
    /// 2 = u-max, 3 = v-max), `outer[edge] + 1` vertices in parameter
    /// order.
    #[inline]
    pub fn edge(&self, edge: usize) -> &[SurfaceVertex] {
        &self.vertices[self.edge_offsets[edge]..self.edge_offsets[edge + 1]]
    }

    /// Triangle index list over the sample set.
    ///
    /// Interior cells are triangulated as a regular grid; each boundary
    /// edge chain is stitched to the nearest interior row or column, so the
    /// mesh boundary follows the outer factors. Triangles touching a
    /// trimmed vertex are dropped, which is the mesh-level equivalent of
    /// discarding trimmed fragments.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let rows = self.interior_rows;
        let cols = self.interior_cols;
        let mut triangles = Vec::new();

        for i in 0..rows.saturating_sub(1) {
            for j in 0..cols - 1 {
                let a = i * cols + j;
                let b = a + 1;
                let c = a + cols;
                let d = c + 1;
                self.push_triangle(&mut triangles, [a, c, d]);
                self.push_triangle(&mut triangles, [a, d, b]);
            }
        }

        let inner_u = (rows + 1) as f64;
        let inner_v = (cols + 1) as f64;
        let row_chain = |i: usize| -> Vec<(usize, f64)> {
            (0..cols).map(|j| (i * cols + j, (j + 1) as f64 / inner_v)).collect()
        };
        let col_chain = |j: usize| -> Vec<(usize, f64)> {
            (0..rows).map(|i| (i * cols + j, (i + 1) as f64 / inner_u)).collect()
        };
        let edge_chain = |edge: usize| -> Vec<(usize, f64)> {
            let outer = self.levels.outer[edge] as usize;
            let start = self.edge_offsets[edge];
            (0..=outer)
                .map(|s| (start + s, s as f64 / outer as f64))
                .collect()
        };

        self.stitch(&mut triangles, &edge_chain(0), &row_chain(0), false);
        self.stitch(&mut triangles, &edge_chain(1), &col_chain(0), true);
        self.stitch(&mut triangles, &edge_chain(2), &row_chain(rows - 1), true);
        self.stitch(&mut triangles, &edge_chain(3), &col_chain(cols - 1), false);

        triangles
    }

    /// Bridge an edge chain to its adjacent interior chain.
    ///
    /// Both chains are ordered by parameter; the walk advances whichever
    /// chain's next vertex has the smaller parameter, fanning the edge onto
    /// the interior endpoints past the interior chain's inset range. `flip`
    /// reverses the winding for the two edges whose interior lies on the
    /// other side.
    fn stitch(
        &self,
        triangles: &mut Vec<[usize; 3]>,
        edge: &[(usize, f64)],
        interior: &[(usize, f64)],
        flip: bool,
    ) {
        let mut i = 0;
        let mut j = 0;
        while i + 1 < edge.len() || j + 1 < interior.len() {
            let advance_edge = j + 1 >= interior.len()
                || (i + 1 < edge.len() && edge[i + 1].1 <= interior[j + 1].1);
            let mut triangle = if advance_edge {
                let triangle = [edge[i].0, interior[j].0, edge[i + 1].0];
                i += 1;
                triangle
            } else {
                let triangle = [edge[i].0, interior[j].0, interior[j + 1].0];
                j += 1;
                triangle
            };
            if flip {
                triangle.swap(1, 2);
            }
            self.push_triangle(triangles, triangle);
        }
    }

    fn push_triangle(&self, triangles: &mut Vec<[usize; 3]>, triangle: [usize; 3]) {
        if triangle.iter().all(|&v| !self.vertices[v].trimmed) {
            triangles.push(triangle);
        }
    }
}

/// Tessellate a single patch whose domain spans the whole texture space.
pub fn tessellate_patch(
    surface: &PatchSurface,
    context: &FrameContext,
    options: &TessellationOptions,
) -> TessellatedPatch {
    tessellate_windowed(surface, context, options, Vector2::zeros(), Vector2::new(1.0, 1.0))
}

/// Tessellate a `u_patches x v_patches` grid of patches.
///
/// Patches are ordered row-major with u as the row index: patch `k` covers
/// the domain cell `(k / v_patches, k % v_patches)`. Each patch's global
/// texture coordinates are offset into its cell, so displacement and trim
/// lookups are continuous across patch boundaries.
///
/// # Errors
///
/// Returns [`TessError::PatchCountMismatch`] when `patches.len()` is not
/// `u_patches * v_patches`.
pub fn tessellate_grid(
    patches: &[PatchSurface],
    u_patches: usize,
    v_patches: usize,
    context: &FrameContext,
    options: &TessellationOptions,
) -> Result<Vec<TessellatedPatch>> {
    let expected = u_patches * v_patches;
    if patches.len() != expected || expected == 0 {
        return Err(TessError::PatchCountMismatch {
            u_patches,
            v_patches,
            expected,
            actual: patches.len(),
        });
    }

    log::debug!(
        "tessellating {}x{} patch grid ({} patches)",
        u_patches,
        v_patches,
        expected
    );

    let scale = Vector2::new(1.0 / u_patches as f64, 1.0 / v_patches as f64);
    Ok(patches
        .iter()
        .enumerate()
        .map(|(index, surface)| {
            let pu = index / v_patches;
            let pv = index % v_patches;
            let base = Vector2::new(pu as f64 * scale.x, pv as f64 * scale.y);
            tessellate_windowed(surface, context, options, base, scale)
        })
        .collect())
}

/// Stage 1 (level assignment) and stage 2 (sample evaluation) for one
/// patch, with its global texture window given by `base` and `scale`.
fn tessellate_windowed(
    surface: &PatchSurface,
    context: &FrameContext,
    options: &TessellationOptions,
    base: Vector2<f64>,
    scale: Vector2<f64>,
) -> TessellatedPatch {
    let levels = match options.mode {
        TessMode::Adaptive => TessLevels::assign(&surface.corners(), context, options.limits),
        TessMode::Fixed {
            u_subdivisions,
            v_subdivisions,
        } => TessLevels::fixed(u_subdivisions, v_subdivisions, options.limits),
    };

    // The stitched layout needs at least one interior sample per axis.
    let inner_u = (levels.inner[0] as usize).max(2);
    let inner_v = (levels.inner[1] as usize).max(2);
    let interior_rows = inner_u - 1;
    let interior_cols = inner_v - 1;

    let edge_counts = levels.outer.map(|outer| outer as usize + 1);
    let mut parameters =
        Vec::with_capacity(interior_rows * interior_cols + edge_counts.iter().sum::<usize>());
    for i in 0..interior_rows {
        for j in 0..interior_cols {
            parameters.push((
                (i + 1) as f64 / inner_u as f64,
                (j + 1) as f64 / inner_v as f64,
            ));
        }
    }

    let mut edge_offsets = [0; 5];
    edge_offsets[0] = parameters.len();
    for edge in 0..4 {
        let outer = levels.outer[edge] as usize;
        for s in 0..=outer {
            let t = s as f64 / outer as f64;
            parameters.push(match edge {
                0 => (0.0, t),
                1 => (t, 0.0),
                2 => (1.0, t),
                _ => (t, 1.0),
            });
        }
        edge_offsets[edge + 1] = parameters.len();
    }

    let evaluate = |&(u, v): &(f64, f64)| evaluate_sample(surface, context, options, u, v, base, scale);

    let vertices: Vec<SurfaceVertex> = if options.parallel {
        parameters.par_iter().map(evaluate).collect()
    } else {
        parameters.iter().map(evaluate).collect()
    };

    TessellatedPatch {
        levels,
        interior_rows,
        interior_cols,
        vertices,
        edge_offsets,
    }
}

fn evaluate_sample(
    surface: &PatchSurface,
    context: &FrameContext,
    options: &TessellationOptions,
    u: f64,
    v: f64,
    base: Vector2<f64>,
    scale: Vector2<f64>,
) -> SurfaceVertex {
    let object = surface.evaluate(u, v);
    let (du, dv) = surface.local_frame(u, v);
    let raw_normal = du
        .cross(&dv)
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::zeros);
    let normal = transform_normal(raw_normal, &context.model, options.orientation);

    let global_u = base.x + scale.x * u;
    let global_v = base.y + scale.y * v;

    let mut position = context.world_position(&object);
    let mut lod = 0.0;
    if let Some(displacement) = &options.displacement {
        let depth = context.view_depth(&object);
        lod = displace::mip_lod(depth, displacement.subdivisions);
        position = displace::displace(
            position,
            &normal,
            global_u,
            global_v,
            depth,
            displacement.heights,
            displacement.subdivisions,
        );
    }

    let trimmed = options
        .trim
        .is_some_and(|mask| !trim::is_inside(mask, global_u, global_v));

    SurfaceVertex {
        position,
        normal,
        uv: Vector2::new(u, v),
        global_uv: Vector2::new(global_u, global_v),
        lod,
        derivative_u: du,
        derivative_v: dv,
        trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tess::{tess_factor, ADAPTIVE_DISTANCE_SCALE, ADAPTIVE_FALLOFF};

    /// Flat 4x4 lattice on z = 0, points 1 unit apart.
    fn flat_surface() -> PatchSurface {
        PatchSurface::Bezier(ControlGrid::from_fn(|i, j| {
            Point3::new(i as f64, j as f64, 0.0)
        }))
    }

    /// Camera on +z looking straight down at the z = 0 plane from `dist`.
    fn top_down_context(dist: f64) -> FrameContext {
        FrameContext::new(
            Matrix4::identity(),
            Matrix4::new_translation(&Vector3::new(0.0, 0.0, -dist)),
            Matrix4::identity(),
            Point3::new(0.0, 0.0, dist),
        )
    }

    /// Expected triangle count for an untrimmed patch: two per interior
    /// cell, plus one per segment of each stitched band.
    fn expected_triangle_count(out: &TessellatedPatch) -> usize {
        let rows = out.interior_rows;
        let cols = out.interior_cols;
        let interior = 2 * rows.saturating_sub(1) * (cols - 1);
        let bands: usize = [cols, rows, cols, rows]
            .iter()
            .zip(&out.levels.outer)
            .map(|(&chain, &outer)| outer as usize + chain - 1)
            .sum();
        interior + bands
    }

    #[test]
    fn test_flat_grid_from_above() {
        let surface = flat_surface();
        let context = top_down_context(10.0);
        let out = tessellate_patch(&surface, &context, &TessellationOptions::default());

        // All edge midpoints sit on z = 0, depth 10: one factor everywhere.
        let expected =
            tess_factor(10.0, ADAPTIVE_FALLOFF, ADAPTIVE_DISTANCE_SCALE, TessLimits::BASIC);
        assert_eq!(out.levels.outer, [expected; 4]);
        assert_eq!(out.levels.inner, [expected; 2]);

        // The output mesh is perfectly flat with constant normal (0, 0, 1).
        for vertex in &out.vertices {
            assert!(vertex.position.z.abs() < 1e-12);
            assert!((vertex.normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
            assert!(!vertex.trimmed);
        }
    }

    #[test]
    fn test_sample_layout_and_uv_coverage() {
        let surface = flat_surface();
        let context = top_down_context(10.0);
        let out = tessellate_patch(&surface, &context, &TessellationOptions::default());

        let edge_total: usize = out.levels.outer.iter().map(|&o| o as usize + 1).sum();
        assert_eq!(
            out.vertices.len(),
            out.interior_rows * out.interior_cols + edge_total
        );
        for edge in 0..4 {
            assert_eq!(out.edge(edge).len(), out.levels.outer[edge] as usize + 1);
        }

        // Edge chains carry the domain corners and the corner control
        // points.
        assert_eq!(out.edge(0)[0].uv, Vector2::new(0.0, 0.0));
        assert_eq!(out.edge(0)[0].position, Point3::new(0.0, 0.0, 0.0));
        let far = out.edge(3).last().unwrap();
        assert_eq!(far.uv, Vector2::new(1.0, 1.0));
        assert_eq!(far.position, Point3::new(3.0, 3.0, 0.0));

        // The interior grid stays strictly inside the domain.
        let first = out.interior(0, 0);
        let last = out.interior(out.interior_rows - 1, out.interior_cols - 1);
        assert!(first.uv.x > 0.0 && first.uv.y > 0.0);
        assert!(last.uv.x < 1.0 && last.uv.y < 1.0);
    }

    #[test]
    fn test_adjacent_patches_share_edge_vertices() {
        // Two flat patches meeting along y = 1, with view-space depth
        // rising steeply in y so the two patches pick different maximum
        // factors while the shared edge gets one factor from both sides.
        let patch_a = PatchSurface::Bezier(ControlGrid::from_fn(|i, j| {
            Point3::new(i as f64, j as f64 / 3.0, 0.0)
        }));
        let patch_b = PatchSurface::Bezier(ControlGrid::from_fn(|i, j| {
            Point3::new(i as f64, 1.0 + j as f64 / 3.0, 0.0)
        }));
        #[rustfmt::skip]
        let view = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, -3.0, 0.0, -2.0,
            0.0, 0.0, 0.0, 1.0,
        );
        let context = FrameContext::new(
            Matrix4::identity(),
            view,
            Matrix4::identity(),
            Point3::origin(),
        );
        let options = TessellationOptions::default();

        let out_a = tessellate_patch(&patch_a, &context, &options);
        let out_b = tessellate_patch(&patch_b, &context, &options);

        // A's v-max edge is B's v-min edge: same outer factor, and the
        // depth gradient makes the interiors disagree.
        assert_eq!(out_a.levels.outer[3], out_b.levels.outer[1]);
        assert_ne!(out_a.levels.inner, out_b.levels.inner);

        // Both patches emit the same vertex positions along the shared
        // edge: no T-junctions.
        let edge_a = out_a.edge(3);
        let edge_b = out_b.edge(1);
        assert_eq!(edge_a.len(), edge_b.len());
        for (a, b) in edge_a.iter().zip(edge_b) {
            assert!((a.position - b.position).norm() < 1e-12);
        }
    }

    #[test]
    fn test_triangles_cover_interior_and_bands() {
        let surface = flat_surface();
        let context = top_down_context(10.0);
        let out = tessellate_patch(&surface, &context, &TessellationOptions::default());

        let triangles = out.triangles();
        assert_eq!(triangles.len(), expected_triangle_count(&out));
        for triangle in &triangles {
            assert!(triangle.iter().all(|&v| v < out.vertices.len()));
        }

        // Consistent winding: every triangle of the flat patch faces +z.
        for [a, b, c] in &triangles {
            let pa = out.vertices[*a].position;
            let pb = out.vertices[*b].position;
            let pc = out.vertices[*c].position;
            let area = (pb - pa).cross(&(pc - pa)).z;
            assert!(area > 0.0, "triangle must wind counterclockwise");
        }
    }

    #[test]
    fn test_serial_matches_parallel() {
        let surface = flat_surface();
        let context = top_down_context(3.0);
        let parallel = tessellate_patch(&surface, &context, &TessellationOptions::default());
        let serial = tessellate_patch(
            &surface,
            &context,
            &TessellationOptions::default().with_parallel(false),
        );
        assert_eq!(parallel.vertices, serial.vertices);
    }

    #[test]
    fn test_fixed_mode_sample_counts() {
        let surface = flat_surface();
        let context = FrameContext::identity();
        let options = TessellationOptions::default().with_mode(TessMode::Fixed {
            u_subdivisions: 4,
            v_subdivisions: 8,
        });
        let out = tessellate_patch(&surface, &context, &options);
        assert_eq!(out.interior_rows, 3);
        assert_eq!(out.interior_cols, 7);
        // Fixed outer factors follow the edge directions: the u-min/u-max
        // edges run along v.
        assert_eq!(out.edge(0).len(), 9);
        assert_eq!(out.edge(1).len(), 5);
    }

    #[test]
    fn test_clip_position_perspective() {
        let projection =
            Matrix4::new_perspective(1.0, std::f64::consts::FRAC_PI_2, 1.0, 100.0);
        let context = FrameContext::new(
            Matrix4::identity(),
            Matrix4::identity(),
            projection,
            Point3::origin(),
        );

        // A point on the near plane projects to NDC z = -1 at the center.
        let near = context.clip_position(&Point3::new(0.0, 0.0, -1.0));
        assert!((near.w - 1.0).abs() < 1e-12);
        assert!(near.x.abs() < 1e-12 && near.y.abs() < 1e-12);
        assert!((near.z / near.w + 1.0).abs() < 1e-9);

        // With a 90 degree fov, x = 1 at depth 2 lands at NDC x = 0.5.
        let off_axis = context.clip_position(&Point3::new(1.0, 0.0, -2.0));
        assert!((off_axis.w - 2.0).abs() < 1e-12);
        assert!((off_axis.x / off_axis.w - 0.5).abs() < 1e-12);

        // The model transform participates in the projection.
        let moved = FrameContext::new(
            Matrix4::new_translation(&Vector3::new(0.0, 0.0, -1.0)),
            Matrix4::identity(),
            projection,
            Point3::origin(),
        );
        let via_model = moved.clip_position(&Point3::origin());
        assert!((via_model.w - 1.0).abs() < 1e-12);
        assert!((via_model.z / via_model.w + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_displacement_raises_flat_patch() {
        let heights = Texture::constant(&[1.0]).unwrap();
        let surface = flat_surface();
        let context = top_down_context(10.0);
        let options = TessellationOptions::displaced(&heights, 16);
        let out = tessellate_patch(&surface, &context, &options);

        for vertex in &out.vertices {
            let inside = (0.0..1.0).contains(&vertex.global_uv.x)
                && (0.0..1.0).contains(&vertex.global_uv.y);
            if inside {
                // Flipped orientation displaces along -z.
                assert!(
                    (vertex.position.z + crate::tess::displace::DISPLACEMENT_SCALE).abs() < 1e-12
                );
                assert!(vertex.lod > 0.0);
            } else {
                assert_eq!(vertex.position.z, 0.0);
            }
        }
    }

    #[test]
    fn test_trim_mask_drops_triangles() {
        let surface = flat_surface();
        let context = top_down_context(10.0);
        let outside = Texture::constant(&[0.0, 0.0, 0.3]).unwrap();
        let inside = Texture::constant(&[0.0, 0.0, 0.8]).unwrap();

        let trimmed = tessellate_patch(
            &surface,
            &context,
            &TessellationOptions::default().with_trim(&outside),
        );
        assert!(trimmed.vertices.iter().all(|v| v.trimmed));
        assert!(trimmed.triangles().is_empty());

        let kept = tessellate_patch(
            &surface,
            &context,
            &TessellationOptions::default().with_trim(&inside),
        );
        assert!(kept.vertices.iter().all(|v| !v.trimmed));
        assert_eq!(kept.triangles().len(), expected_triangle_count(&kept));
    }

    #[test]
    fn test_grid_global_uv_continuous() {
        let patches = vec![flat_surface(), flat_surface()];
        let context = top_down_context(10.0);
        let out = tessellate_grid(&patches, 1, 2, &context, &TessellationOptions::default())
            .unwrap();

        // Left patch covers global v in [0, 0.5], right in [0.5, 1]; the
        // shared boundary reads the same global coordinate from both sides.
        let left = &out[0];
        let right = &out[1];
        assert!(left.edge(3).iter().all(|v| v.global_uv.y == 0.5));
        assert!(right.edge(1).iter().all(|v| v.global_uv.y == 0.5));
        assert!(right.edge(3).iter().all(|v| v.global_uv.y == 1.0));
    }

    #[test]
    fn test_grid_rejects_wrong_patch_count() {
        let patches = vec![flat_surface()];
        let context = FrameContext::identity();
        let result = tessellate_grid(&patches, 2, 2, &context, &TessellationOptions::default());
        assert!(matches!(
            result,
            Err(TessError::PatchCountMismatch {
                expected: 4,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_gregory_surface_tessellates() {
        let p = |i: usize, j: usize| Point3::new(i as f64 / 3.0, j as f64 / 3.0, 0.0);
        let surface = PatchSurface::Gregory(GregoryPatch {
            top: [p(0, 0), p(0, 1), p(0, 2), p(0, 3)],
            top_sides: [p(1, 0), p(1, 3)],
            bottom_sides: [p(2, 0), p(2, 3)],
            bottom: [p(3, 0), p(3, 1), p(3, 2), p(3, 3)],
            u_inner: [p(1, 1), p(1, 2), p(2, 1), p(2, 2)],
            v_inner: [p(1, 1), p(1, 2), p(2, 1), p(2, 2)],
        });
        let context = top_down_context(10.0);
        let out = tessellate_patch(&surface, &context, &TessellationOptions::default());

        for vertex in &out.vertices {
            assert!(vertex.position.z.abs() < 1e-9);
            assert!(vertex.position.coords.iter().all(|c| c.is_finite()));
        }
    }
}
