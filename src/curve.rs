//! Bezier curve segments and C0 cubic splines.
//!
//! Curve rendering feeds the engine variable-length point lists: two points
//! describe a line, three a quadratic Bezier, four a cubic. The length is
//! dispatched once at construction time into a tagged [`CurveSegment`]
//! variant; per-sample evaluation then runs the order-matched de Casteljau
//! blend without re-branching on the list length. Lengths outside {2, 3, 4}
//! are an input-contract violation and construction fails with
//! [`TessError::UnsupportedCurveOrder`].
//!
//! [`CubicSplineC0`] chains segments over a shared [0, 1] parameter, with a
//! trailing lower-order segment when the point count is not `3n + 1`, and
//! supports sampling a partial parameter range for partial-curve rendering.
//!
//! # Example
//!
//! ```
//! use quilt::curve::CurveSegment;
//! use nalgebra::Point3;
//!
//! let segment = CurveSegment::from_points(&[
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 2.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//! ])
//! .unwrap();
//! assert_eq!(segment.order(), 3);
//! let mid = segment.evaluate(0.5);
//! assert!((mid.y - 1.0).abs() < 1e-12);
//! ```

use nalgebra::{Point3, Vector3};

use crate::error::{Result, TessError};
use crate::patch::bezier::{cubic_blend, quadratic_blend, quadratic_blend_vectors};

/// A single Bezier curve segment of order 2, 3, or 4.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveSegment {
    /// A straight segment between two points.
    Line([Point3<f64>; 2]),
    /// A quadratic Bezier through three control points.
    Quadratic([Point3<f64>; 3]),
    /// A cubic Bezier through four control points.
    Cubic([Point3<f64>; 4]),
}

impl CurveSegment {
    /// Build a segment from a point list, dispatching on its length.
    ///
    /// # Errors
    ///
    /// Returns [`TessError::UnsupportedCurveOrder`] when the list length is
    /// not 2, 3, or 4.
    pub fn from_points(points: &[Point3<f64>]) -> Result<Self> {
        match points {
            [a, b] => Ok(Self::Line([*a, *b])),
            [a, b, c] => Ok(Self::Quadratic([*a, *b, *c])),
            [a, b, c, d] => Ok(Self::Cubic([*a, *b, *c, *d])),
            _ => Err(TessError::UnsupportedCurveOrder {
                count: points.len(),
            }),
        }
    }

    /// Number of control points (2, 3, or 4).
    #[inline]
    pub fn order(&self) -> usize {
        match self {
            Self::Line(_) => 2,
            Self::Quadratic(_) => 3,
            Self::Cubic(_) => 4,
        }
    }

    /// Evaluate the segment at `t`, clamped into [0, 1].
    pub fn evaluate(&self, t: f64) -> Point3<f64> {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Line([a, b]) => Point3::from((1.0 - t) * a.coords + t * b.coords),
            Self::Quadratic(points) => quadratic_blend(points, t),
            Self::Cubic(points) => cubic_blend(points, t),
        }
    }

    /// First derivative with respect to `t`, clamped into [0, 1].
    pub fn derivative(&self, t: f64) -> Vector3<f64> {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Line([a, b]) => b - a,
            Self::Quadratic([a, b, c]) => {
                let d0 = b - a;
                let d1 = c - b;
                2.0 * ((1.0 - t) * d0 + t * d1)
            }
            Self::Cubic([a, b, c, d]) => {
                3.0 * quadratic_blend_vectors(&[b - a, c - b, d - c], t)
            }
        }
    }

    /// Sample `count` points uniformly over the parameter range
    /// `[start, end]` (both clamped into [0, 1]).
    ///
    /// Returns a single point when `count` is 1; an empty vector when it is
    /// 0.
    pub fn sample_range(&self, start: f64, end: f64, count: usize) -> Vec<Point3<f64>> {
        sample_over(|t| self.evaluate(t), start, end, count)
    }
}

/// A C0 cubic spline: a chain of Bezier segments over a shared [0, 1]
/// parameter.
///
/// Consecutive segments share their boundary control point, which is what
/// makes the chain positionally continuous. When the point count is not
/// `3n + 1` the trailing segment has lower order (a quadratic for a
/// two-point remainder, a line for one).
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSplineC0 {
    segments: Vec<CurveSegment>,
}

impl CubicSplineC0 {
    /// Build a spline through the given points.
    ///
    /// # Errors
    ///
    /// Returns [`TessError::DegenerateSpline`] for fewer than two points.
    pub fn through_points(points: &[Point3<f64>]) -> Result<Self> {
        if points.len() < 2 {
            return Err(TessError::DegenerateSpline {
                count: points.len(),
            });
        }

        let full = (points.len() - 1) / 3;
        let remainder = (points.len() - 1) % 3;

        let mut segments = Vec::with_capacity(full + 1);
        for i in 0..full {
            segments.push(CurveSegment::from_points(&points[i * 3..i * 3 + 4])?);
        }
        if remainder > 0 {
            segments.push(CurveSegment::from_points(&points[full * 3..])?);
        }

        Ok(Self { segments })
    }

    /// Number of segments in the chain.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The segments of the chain, in parameter order.
    #[inline]
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// Evaluate the spline at `t` in [0, 1].
    ///
    /// The parameter range is split uniformly across segments; `t = 1` maps
    /// to the end of the last segment.
    pub fn evaluate(&self, t: f64) -> Point3<f64> {
        let t = t.clamp(0.0, 1.0);
        let count = self.segments.len() as f64;
        let index = if t == 1.0 {
            self.segments.len() - 1
        } else {
            (t * count) as usize
        };
        let local = t * count - index as f64;
        self.segments[index].evaluate(local)
    }

    /// Sample `count` points uniformly over `[start, end]`.
    pub fn sample_range(&self, start: f64, end: f64, count: usize) -> Vec<Point3<f64>> {
        sample_over(|t| self.evaluate(t), start, end, count)
    }
}

fn sample_over(
    eval: impl Fn(f64) -> Point3<f64>,
    start: f64,
    end: f64,
    count: usize,
) -> Vec<Point3<f64>> {
    let start = start.clamp(0.0, 1.0);
    let end = end.clamp(start, 1.0);
    match count {
        0 => Vec::new(),
        1 => vec![eval(start)],
        _ => (0..count)
            .map(|i| {
                let t = start + (end - start) * i as f64 / (count - 1) as f64;
                eval(t)
            })
            .collect(),
    }
}
