//! Trim-curve containment testing.
//!
//! Trimming clips a tessellated surface to an irregular boundary encoded in
//! a mask texture: the blue channel holds the containment field, and a
//! sample strictly above 0.5 counts as inside. The test is a single
//! deterministic threshold with no fallback; samples that land outside are
//! dropped by the consumer rather than shaded. Trimming is independent of
//! tessellation density.

use crate::texture::Texture;

/// Channel of the mask holding the containment field (blue).
pub const TRIM_CHANNEL: usize = 2;
/// Containment threshold.
pub const TRIM_THRESHOLD: f32 = 0.5;

/// Whether the coordinate lies inside the trimmed region.
pub fn is_inside(mask: &Texture, u: f64, v: f64) -> bool {
    mask.sample(0, u, v, TRIM_CHANNEL) > TRIM_THRESHOLD
}
