//! Error types for quilt.
//!
//! Numeric edge cases (near-zero denominators in the Gregory corner blend,
//! out-of-range displacement coordinates, unclamped tessellation factors) are
//! handled in place and never surface as errors. Only genuine input-contract
//! violations are reported through [`TessError`].

use thiserror::Error;

/// Result type alias using [`TessError`].
pub type Result<T> = std::result::Result<T, TessError>;

/// Errors that can occur while building tessellation inputs.
#[derive(Error, Debug)]
pub enum TessError {
    /// A curve was built from a point list whose length is not 2, 3, or 4.
    #[error("unsupported curve order: {count} points (expected 2, 3, or 4)")]
    UnsupportedCurveOrder {
        /// Number of points supplied.
        count: usize,
    },

    /// A spline needs at least two points.
    #[error("spline requires at least 2 points, got {count}")]
    DegenerateSpline {
        /// Number of points supplied.
        count: usize,
    },

    /// A texture was created with no mip levels or no texels.
    #[error("texture has no data")]
    EmptyTexture,

    /// A texture level does not match its declared dimensions.
    #[error("texture level {level} has {actual} texels, expected {expected}")]
    TextureSizeMismatch {
        /// Mip level index.
        level: usize,
        /// Texel count implied by width × height × channels.
        expected: usize,
        /// Texel count actually supplied.
        actual: usize,
    },

    /// Tessellation level limits are inverted.
    #[error("invalid tessellation level range: min {min} > max {max}")]
    InvalidLevelRange {
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// A patch-grid tessellation was given the wrong number of patches.
    #[error("patch grid {u_patches}x{v_patches} requires {expected} patches, got {actual}")]
    PatchCountMismatch {
        /// Patches along u.
        u_patches: usize,
        /// Patches along v.
        v_patches: usize,
        /// `u_patches * v_patches`.
        expected: usize,
        /// Patches actually supplied.
        actual: usize,
    },
}
