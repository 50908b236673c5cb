//! Sampled textures for displacement and trim lookups.
//!
//! The tessellation core reads textures, never writes them: a height or
//! displacement map perturbs evaluated positions, and a trim mask clips the
//! surface to an irregular boundary. Textures are stored as an owned mip
//! chain of `f32` texel planes; sampling is nearest-texel at an explicit
//! level, which is all the displacement stage needs (it picks its own mip
//! level from projected distance rather than relying on implicit filtering).
//!
//! # Example
//!
//! ```
//! use quilt::texture::Texture;
//!
//! // A 2x2 single-channel height map with a generated mip chain.
//! let tex = Texture::with_mips(2, 2, 1, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
//! assert_eq!(tex.level_count(), 2);
//! assert_eq!(tex.sample(1, 0.5, 0.5, 0), 0.5);
//! ```

use crate::error::{Result, TessError};

/// One mip level of a texture: a `width x height` plane of interleaved
/// `channels`-component texels.
#[derive(Debug, Clone)]
pub struct TextureLevel {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<f32>,
}

impl TextureLevel {
    /// Read one channel of the texel at integer coordinates, clamped to the
    /// level bounds.
    fn texel(&self, x: usize, y: usize, channel: usize) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[(y * self.width + x) * self.channels + channel]
    }
}

/// An immutable texture with a mip chain.
///
/// Level 0 is the finest level; each following level should halve both
/// dimensions (rounding up). [`Texture::with_mips`] builds such a chain by
/// 2x2 box filtering; [`Texture::from_levels`] accepts a prebuilt one.
#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<TextureLevel>,
}

impl Texture {
    /// Create a single-level texture from interleaved texel data.
    ///
    /// # Errors
    ///
    /// Returns [`TessError::EmptyTexture`] for zero-sized input and
    /// [`TessError::TextureSizeMismatch`] when `data` does not hold
    /// `width * height * channels` values.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(TessError::EmptyTexture);
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(TessError::TextureSizeMismatch {
                level: 0,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            levels: vec![TextureLevel {
                width,
                height,
                channels,
                data,
            }],
        })
    }

    /// Create a texture and generate its full mip chain by 2x2 box filtering
    /// down to a 1x1 level.
    pub fn with_mips(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Result<Self> {
        let mut texture = Self::new(width, height, channels, data)?;
        loop {
            let prev = texture.levels.last().unwrap();
            if prev.width == 1 && prev.height == 1 {
                break;
            }
            let width = prev.width.div_ceil(2);
            let height = prev.height.div_ceil(2);
            let mut data = Vec::with_capacity(width * height * channels);
            for y in 0..height {
                for x in 0..width {
                    for c in 0..channels {
                        let sum = prev.texel(2 * x, 2 * y, c)
                            + prev.texel(2 * x + 1, 2 * y, c)
                            + prev.texel(2 * x, 2 * y + 1, c)
                            + prev.texel(2 * x + 1, 2 * y + 1, c);
                        data.push(sum / 4.0);
                    }
                }
            }
            texture.levels.push(TextureLevel {
                width,
                height,
                channels,
                data,
            });
        }
        Ok(texture)
    }

    /// Create a 1x1 texture holding a single texel.
    ///
    /// Convenient for uniform trim masks and flat height fields.
    pub fn constant(texel: &[f32]) -> Result<Self> {
        Self::new(1, 1, texel.len(), texel.to_vec())
    }

    /// Assemble a texture from prebuilt mip levels (finest first).
    pub fn from_levels(levels: Vec<(usize, usize, usize, Vec<f32>)>) -> Result<Self> {
        if levels.is_empty() {
            return Err(TessError::EmptyTexture);
        }
        let mut out = Vec::with_capacity(levels.len());
        for (i, (width, height, channels, data)) in levels.into_iter().enumerate() {
            if width == 0 || height == 0 || channels == 0 {
                return Err(TessError::EmptyTexture);
            }
            let expected = width * height * channels;
            if data.len() != expected {
                return Err(TessError::TextureSizeMismatch {
                    level: i,
                    expected,
                    actual: data.len(),
                });
            }
            out.push(TextureLevel {
                width,
                height,
                channels,
                data,
            });
        }
        Ok(Self { levels: out })
    }

    /// Number of mip levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of channels per texel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.levels[0].channels
    }

    /// Dimensions of level 0.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.levels[0].width, self.levels[0].height)
    }

    /// Nearest-texel sample of one channel at an explicit mip level.
    ///
    /// `u` and `v` are clamped into [0, 1]; `level` is clamped to the
    /// available chain; `channel` is clamped to the available channels.
    pub fn sample(&self, level: usize, u: f64, v: f64, channel: usize) -> f32 {
        let level = &self.levels[level.min(self.levels.len() - 1)];
        let channel = channel.min(level.channels - 1);
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let x = ((u * level.width as f64) as usize).min(level.width - 1);
        let y = ((v * level.height as f64) as usize).min(level.height - 1);
        level.texel(x, y, channel)
    }

    /// Sample at a continuous LOD value, rounded to the nearest mip level.
    ///
    /// Negative LOD reads level 0; LOD beyond the chain reads the coarsest
    /// level.
    pub fn sample_lod(&self, lod: f64, u: f64, v: f64, channel: usize) -> f32 {
        let level = if lod.is_finite() {
            lod.max(0.0).round() as usize
        } else if lod > 0.0 {
            self.levels.len() - 1
        } else {
            0
        };
        self.sample(level, u, v, channel)
    }
}
