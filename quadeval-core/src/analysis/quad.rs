use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{consts::QUAD_CORNERS, error::QuadEvalError};

/// A width/height pair describing either an image in pixels or a document
/// template in its reference units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Creates a size, rejecting dimensions that are not finite and positive.
    ///
    /// # Example
    /// ```
    /// use quadeval_core::analysis::quad::Size;
    /// let size = Size::new(856.0, 540.0).unwrap();
    /// assert_eq!(size.width, 856.0);
    /// assert!(Size::new(0.0, 540.0).is_err());
    /// ```
    pub fn new(width: f64, height: f64) -> Result<Self, QuadEvalError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(QuadEvalError::InvalidSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Pixel dimensions of a raster canvas of this size.
    ///
    /// Fractional sizes are truncated, so a canvas may end up with zero rows
    /// or columns.
    pub fn canvas(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }
}

impl TryFrom<Vec<f64>> for Size {
    type Error = QuadEvalError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [width, height] => Size::new(*width, *height),
            other => Err(QuadEvalError::InvalidDimension {
                what: "size".to_string(),
                expected: 2,
                got: other.len(),
            }),
        }
    }
}

impl From<Size> for [f64; 2] {
    fn from(size: Size) -> Self {
        [size.width, size.height]
    }
}

/// An ordered quadrilateral.
///
/// The corner order is whatever the producer emitted: it may start at any
/// corner and run either clockwise or counter-clockwise. A `Quad` is never
/// mutated; reorientation and reprojection build new quads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "[[f64; 2]; 4]")]
pub struct Quad {
    points: [DVec2; QUAD_CORNERS],
}

impl Quad {
    pub fn new(points: [DVec2; QUAD_CORNERS]) -> Self {
        Self { points }
    }

    /// Builds a quad from raw coordinate lists, checking that there are four
    /// points with two coordinates each.
    ///
    /// # Example
    /// ```
    /// use quadeval_core::analysis::quad::Quad;
    /// let quad = Quad::from_coords(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
    /// assert_eq!(quad.points()[2].x, 10.0);
    /// assert!(Quad::from_coords(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).is_err());
    /// ```
    pub fn from_coords<P: AsRef<[f64]>>(coords: &[P]) -> Result<Self, QuadEvalError> {
        if coords.len() != QUAD_CORNERS {
            return Err(QuadEvalError::InvalidDimension {
                what: "quad".to_string(),
                expected: QUAD_CORNERS,
                got: coords.len(),
            });
        }

        let mut points = [DVec2::ZERO; QUAD_CORNERS];
        for (slot, coord) in points.iter_mut().zip(coords) {
            *slot = point_from_coords(coord.as_ref())?;
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[DVec2; QUAD_CORNERS] {
        &self.points
    }

    /// Returns the quad relabelled so that corner `i` of the result is
    /// corner `(i + 4 - k) % 4` of `self`.
    ///
    /// `rotate_right(1)` of `[a, b, c, d]` is `[d, a, b, c]`.
    pub fn rotate_right(&self, k: usize) -> Self {
        let mut points = self.points;
        points.rotate_right(k % QUAD_CORNERS);
        Self { points }
    }

    /// Signed area computed with the shoelace formula.
    ///
    /// Positive for counter-clockwise order in a y-up frame (clockwise on
    /// screen, where y grows downward). Self-intersecting quads have their
    /// lobes cancel each other.
    pub fn signed_area(&self) -> f64 {
        shoelace(&self.points)
    }

    /// Returns the quad with a deterministic winding direction.
    ///
    /// The quad is kept as-is when the cross product of its first two edges
    /// is positive. Otherwise the corners are swapped pairwise into
    /// `(p1, p0, p3, p2)`, which flips the winding.
    pub fn canonical_orientation(&self) -> Self {
        let [p0, p1, p2, p3] = self.points;
        if (p1 - p0).perp_dot(p2 - p1) > 0.0 {
            *self
        } else {
            Self::new([p1, p0, p3, p2])
        }
    }

    /// Squared diagonal of the axis-aligned box around the corners.
    pub(crate) fn extent_squared(&self) -> f64 {
        let min = self.points.iter().fold(DVec2::INFINITY, |acc, p| acc.min(*p));
        let max = self
            .points
            .iter()
            .fold(DVec2::NEG_INFINITY, |acc, p| acc.max(*p));
        (max - min).length_squared()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Quad {
    type Error = QuadEvalError;

    fn try_from(value: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Quad::from_coords(&value)
    }
}

impl From<Quad> for [[f64; 2]; 4] {
    fn from(quad: Quad) -> Self {
        quad.points.map(|p| p.to_array())
    }
}

fn point_from_coords(coords: &[f64]) -> Result<DVec2, QuadEvalError> {
    match coords {
        [x, y] => Ok(DVec2::new(*x, *y)),
        other => Err(QuadEvalError::InvalidDimension {
            what: "point".to_string(),
            expected: 2,
            got: other.len(),
        }),
    }
}

/// Euclidean distance between two points given as coordinate slices.
///
/// # Example
/// ```
/// use quadeval_core::analysis::quad::distance;
/// assert_eq!(distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 5.0);
/// assert!(distance(&[0.0, 0.0, 0.0], &[3.0, 4.0]).is_err());
/// ```
pub fn distance(p1: &[f64], p2: &[f64]) -> Result<f64, QuadEvalError> {
    let a = point_from_coords(p1)?;
    let b = point_from_coords(p2)?;
    Ok(a.distance(b))
}

/// The axis-aligned rectangle `[(0,0), (w,0), (w,h), (0,h)]`.
pub fn rectangle_from_size(size: Size) -> Quad {
    Quad::new([
        DVec2::new(0.0, 0.0),
        DVec2::new(size.width, 0.0),
        DVec2::new(size.width, size.height),
        DVec2::new(0.0, size.height),
    ])
}

pub fn perimeter(size: Size) -> f64 {
    2.0 * (size.width + size.height)
}

/// Signed shoelace area of a closed polygon.
pub fn shoelace(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum();
    twice / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Quad {
        Quad::from_coords(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap()
    }

    #[test]
    fn test_size_validation() {
        assert!(Size::new(10.0, 20.0).is_ok());
        assert!(matches!(
            Size::new(-1.0, 20.0),
            Err(QuadEvalError::InvalidSize { .. })
        ));
        assert!(Size::new(10.0, f64::NAN).is_err());
        assert!(matches!(
            Size::try_from(vec![1.0, 2.0, 3.0]),
            Err(QuadEvalError::InvalidDimension { expected: 2, got: 3, .. })
        ));
    }

    #[test]
    fn test_size_canvas_truncates() {
        let size = Size::new(10.9, 3.2).unwrap();
        assert_eq!(size.canvas(), (10, 3));
    }

    #[test]
    fn test_quad_from_coords_arity() {
        let too_few: Vec<Vec<f64>> = vec![vec![0.0, 0.0], vec![1.0, 0.0]];
        assert!(matches!(
            Quad::try_from(too_few),
            Err(QuadEvalError::InvalidDimension { expected: 4, got: 2, .. })
        ));

        let bad_point: Vec<Vec<f64>> = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0, 5.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ];
        assert!(matches!(
            Quad::try_from(bad_point),
            Err(QuadEvalError::InvalidDimension { expected: 2, got: 3, .. })
        ));
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(&[1.0, 1.0], &[4.0, 5.0]).unwrap(), 5.0);
        assert_eq!(distance(&[2.0, 2.0], &[2.0, 2.0]).unwrap(), 0.0);
        assert!(matches!(
            distance(&[1.0], &[4.0, 5.0]),
            Err(QuadEvalError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_rectangle_and_perimeter() {
        let size = Size::new(856.0, 540.0).unwrap();
        let rect = rectangle_from_size(size);
        assert_eq!(rect.points()[0], DVec2::new(0.0, 0.0));
        assert_eq!(rect.points()[1], DVec2::new(856.0, 0.0));
        assert_eq!(rect.points()[2], DVec2::new(856.0, 540.0));
        assert_eq!(rect.points()[3], DVec2::new(0.0, 540.0));
        assert_eq!(perimeter(size), 2792.0);
    }

    #[test]
    fn test_signed_area_follows_winding() {
        let q = square();
        assert_eq!(q.signed_area(), 100.0);

        let reversed = Quad::new([
            q.points()[3],
            q.points()[2],
            q.points()[1],
            q.points()[0],
        ]);
        assert_eq!(reversed.signed_area(), -100.0);
    }

    #[test]
    fn test_canonical_orientation() {
        // Positive first-edge cross product: unchanged
        let q = square();
        assert_eq!(q.canonical_orientation(), q);

        // Opposite winding: pairwise swap
        let reversed = Quad::from_coords(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]])
            .unwrap();
        let oriented = reversed.canonical_orientation();
        assert_eq!(
            oriented,
            Quad::from_coords(&[[0.0, 10.0], [0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]).unwrap()
        );
        assert!(oriented.signed_area() > 0.0);
    }

    #[test]
    fn test_rotate_right() {
        let q = square();
        let r = q.rotate_right(1);
        assert_eq!(r.points()[0], q.points()[3]);
        assert_eq!(r.points()[1], q.points()[0]);
        assert_eq!(q.rotate_right(4), q);
        assert_eq!(q.rotate_right(2).rotate_right(2), q);
    }

    #[test]
    fn test_quad_serde_shape() {
        let q: Quad = serde_json::from_str("[[0, 0], [10, 0], [10.5, 10], [0, 10]]").unwrap();
        assert_eq!(q.points()[2], DVec2::new(10.5, 10.0));
        let back = serde_json::to_string(&q).unwrap();
        assert_eq!(back, "[[0.0,0.0],[10.0,0.0],[10.5,10.0],[0.0,10.0]]");

        let size: Size = serde_json::from_str("[1080, 1920]").unwrap();
        assert_eq!(size, Size::new(1080.0, 1920.0).unwrap());
    }
}
