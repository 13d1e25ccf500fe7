use glam::{DMat3, DVec2, DVec3};

use crate::{
    analysis::quad::Quad,
    consts::{COLLINEAR_EPSILON, PIVOT_EPSILON, QUAD_CORNERS},
    error::QuadEvalError,
};

/// A planar projective transform normalized so that `h22 == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    matrix: DMat3,
}

impl Homography {
    pub fn from_matrix(matrix: DMat3) -> Self {
        Self { matrix }
    }

    /// Solves the transform mapping each corner of `src` onto the matching
    /// corner of `dst`.
    ///
    /// The eight unknowns `h00..h21` come from the direct linear system
    ///
    /// ```text
    /// [x y 1 0 0 0 -x*u -y*u] . h = u
    /// [0 0 0 x y 1 -x*v -y*v] . h = v
    /// ```
    ///
    /// for every correspondence `(x, y) -> (u, v)`, solved by Gaussian
    /// elimination with partial pivoting. Fails with `DegenerateTransform`
    /// when three corners of either quad are collinear (or coincide).
    pub fn from_quads(src: &Quad, dst: &Quad) -> Result<Self, QuadEvalError> {
        ensure_non_degenerate(src, "source")?;
        ensure_non_degenerate(dst, "target")?;

        let mut system = [[0.0f64; 9]; 8];
        for (i, (s, d)) in src.points().iter().zip(dst.points()).enumerate() {
            system[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -s.x * d.x, -s.y * d.x, d.x];
            system[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -s.x * d.y, -s.y * d.y, d.y];
        }

        let h = solve_augmented(system)?;

        // glam matrices are column-major
        let matrix = DMat3::from_cols(
            DVec3::new(h[0], h[3], h[6]),
            DVec3::new(h[1], h[4], h[7]),
            DVec3::new(h[2], h[5], 1.0),
        );
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &DMat3 {
        &self.matrix
    }

    /// Applies the transform to one point.
    pub fn project(&self, point: DVec2) -> Result<DVec2, QuadEvalError> {
        project_point(self, point)
    }

    /// Applies the transform to every corner, keeping the corner order.
    pub fn project_quad(&self, quad: &Quad) -> Result<Quad, QuadEvalError> {
        let mut points = [DVec2::ZERO; QUAD_CORNERS];
        for (slot, p) in points.iter_mut().zip(quad.points()) {
            *slot = self.project(*p)?;
        }
        Ok(Quad::new(points))
    }
}

/// Maps `point` through `transform`.
///
/// Fails with `DegenerateTransform` when the homogeneous denominator
/// `h20*x + h21*y + h22` is exactly zero, i.e. the point lands on the line
/// at infinity.
///
/// # Example
/// ```
/// use glam::{DMat3, DVec2};
/// use quadeval_core::analysis::homography::{Homography, project_point};
/// let shift = Homography::from_matrix(DMat3::from_translation(DVec2::new(2.0, 3.0)));
/// assert_eq!(project_point(&shift, DVec2::new(1.0, 1.0)).unwrap(), DVec2::new(3.0, 4.0));
/// ```
pub fn project_point(transform: &Homography, point: DVec2) -> Result<DVec2, QuadEvalError> {
    let p = transform.matrix * point.extend(1.0);
    if p.z == 0.0 {
        return Err(QuadEvalError::degenerate_transform(
            "project-point",
            format!("point {point} maps to infinity"),
        ));
    }

    let projected = DVec2::new(p.x / p.z, p.y / p.z);
    if !projected.is_finite() {
        return Err(QuadEvalError::degenerate_transform(
            "project-point",
            format!("point {point} maps to a non-finite location"),
        ));
    }
    Ok(projected)
}

fn ensure_non_degenerate(quad: &Quad, role: &str) -> Result<(), QuadEvalError> {
    let points = quad.points();
    let tolerance = COLLINEAR_EPSILON * quad.extent_squared();

    for skip in 0..QUAD_CORNERS {
        let [a, b, c] = [1, 2, 3].map(|k| points[(skip + k) % QUAD_CORNERS]);
        if (b - a).perp_dot(c - a).abs() <= tolerance {
            return Err(QuadEvalError::degenerate_transform(
                "solve-perspective",
                format!("{role} quad {points:?} has three collinear corners {a}, {b}, {c}"),
            ));
        }
    }
    Ok(())
}

fn solve_augmented(mut a: [[f64; 9]; 8]) -> Result<[f64; 8], QuadEvalError> {
    let scale = a
        .iter()
        .flat_map(|row| row[..8].iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));

    for col in 0..8 {
        let pivot_row = (col..8)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= PIVOT_EPSILON * scale {
            return Err(QuadEvalError::degenerate_transform(
                "solve-perspective",
                format!("singular system at column {col}"),
            ));
        }
        a.swap(col, pivot_row);

        let pivot = a[col][col];
        for row in (col + 1)..8 {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..9 {
                a[row][c] -= factor * a[col][c];
            }
        }
    }

    let mut h = [0.0f64; 8];
    for row in (0..8).rev() {
        let tail: f64 = ((row + 1)..8).map(|c| a[row][c] * h[c]).sum();
        h[row] = (a[row][8] - tail) / a[row][row];
    }
    Ok(h)
}
