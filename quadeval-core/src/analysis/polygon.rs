//! Exact area of intersection between quadrilateral regions.
//!
//! A quad is decomposed into interior-disjoint convex pieces:
//! - a convex quad is kept whole,
//! - a concave quad is cut along the diagonal leaving its reflex corner,
//! - a self-intersecting (bow-tie) quad is split at its edge crossing into
//!   its two lobes.
//!
//! Intersections between convex pieces are clipped with Sutherland-Hodgman
//! and measured with the shoelace formula. Because the pieces never overlap,
//! the intersection of two regions is the plain sum over piece pairs.

use glam::DVec2;

use crate::{
    analysis::quad::{Quad, shoelace},
    consts::COLLINEAR_EPSILON,
    error::QuadEvalError,
};

/// A convex polygon with counter-clockwise (positive area) vertex order.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<DVec2>,
}

impl ConvexPolygon {
    fn new(mut vertices: Vec<DVec2>) -> Self {
        if shoelace(&vertices) < 0.0 {
            vertices.reverse();
        }
        Self { vertices }
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        shoelace(&self.vertices)
    }

    /// Clips `self` against `clip` and returns the area of what remains.
    pub fn intersection_area(&self, clip: &ConvexPolygon) -> f64 {
        let clipped = sutherland_hodgman(&self.vertices, &clip.vertices);
        shoelace(&clipped).abs()
    }
}

/// The area enclosed by a quad, as a set of interior-disjoint convex pieces.
#[derive(Clone, Debug)]
pub struct Region {
    parts: Vec<ConvexPolygon>,
    area: f64,
}

impl Region {
    /// Decomposes a quad into a region.
    ///
    /// Fails with `DegeneratePolygon` when fewer than three distinct corners
    /// remain or the enclosed area vanishes. `stage` names the caller in the
    /// error message.
    pub fn from_quad(quad: &Quad, stage: &str) -> Result<Self, QuadEvalError> {
        let vertices = dedup_cyclic(quad.points());
        if vertices.len() < 3 {
            return Err(QuadEvalError::degenerate_polygon(
                stage,
                format!("only {} distinct vertices", vertices.len()),
            ));
        }

        let tolerance = COLLINEAR_EPSILON * quad.extent_squared();
        let parts: Vec<ConvexPolygon> = decompose(&vertices, tolerance)
            .into_iter()
            .filter(|part| part.area() > tolerance)
            .collect();

        let area: f64 = parts.iter().map(ConvexPolygon::area).sum();
        if parts.is_empty() || area <= tolerance {
            return Err(QuadEvalError::degenerate_polygon(
                stage,
                format!("zero enclosed area for {:?}", quad.points()),
            ));
        }

        Ok(Self { parts, area })
    }

    pub fn parts(&self) -> &[ConvexPolygon] {
        &self.parts
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn intersection_area(&self, other: &Region) -> f64 {
        self.parts
            .iter()
            .flat_map(|a| other.parts.iter().map(move |b| a.intersection_area(b)))
            .sum()
    }
}

fn dedup_cyclic(points: &[DVec2]) -> Vec<DVec2> {
    let mut vertices: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in points {
        if vertices.last() != Some(&p) {
            vertices.push(p);
        }
    }
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

fn decompose(vertices: &[DVec2], tolerance: f64) -> Vec<ConvexPolygon> {
    if vertices.len() == 3 {
        return vec![ConvexPolygon::new(vertices.to_vec())];
    }

    let [p0, p1, p2, p3] = [vertices[0], vertices[1], vertices[2], vertices[3]];

    // Bow-tie: opposite edges cross, each lobe is a triangle
    if let Some(x) = segment_crossing(p0, p1, p2, p3) {
        return vec![
            ConvexPolygon::new(vec![x, p1, p2]),
            ConvexPolygon::new(vec![p0, x, p3]),
        ];
    }
    if let Some(x) = segment_crossing(p1, p2, p3, p0) {
        return vec![
            ConvexPolygon::new(vec![p0, p1, x]),
            ConvexPolygon::new(vec![x, p2, p3]),
        ];
    }

    let mut ccw = vertices.to_vec();
    if shoelace(&ccw) < 0.0 {
        ccw.reverse();
    }

    let n = ccw.len();
    let reflex = (0..n).find(|&i| {
        let prev = ccw[(i + n - 1) % n];
        let next = ccw[(i + 1) % n];
        (ccw[i] - prev).perp_dot(next - ccw[i]) < -tolerance
    });

    match reflex {
        None => vec![ConvexPolygon { vertices: ccw }],
        Some(r) => {
            let at = |k: usize| ccw[(r + k) % n];
            vec![
                ConvexPolygon::new(vec![at(0), at(1), at(2)]),
                ConvexPolygon::new(vec![at(0), at(2), at(3)]),
            ]
        }
    }
}

/// Proper crossing point of segments `ab` and `cd`, excluding touching
/// endpoints and collinear overlap.
fn segment_crossing(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> Option<DVec2> {
    let r = b - a;
    let s = d - c;
    let denom = r.perp_dot(s);
    if denom == 0.0 {
        return None;
    }

    let t = (c - a).perp_dot(s) / denom;
    let u = (c - a).perp_dot(r) / denom;
    if t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0 {
        Some(a + r * t)
    } else {
        None
    }
}

/// Clips `subject` by the convex counter-clockwise polygon `clip`.
fn sutherland_hodgman(subject: &[DVec2], clip: &[DVec2]) -> Vec<DVec2> {
    let mut output = subject.to_vec();

    for (i, &a) in clip.iter().enumerate() {
        if output.is_empty() {
            break;
        }
        let b = clip[(i + 1) % clip.len()];
        let edge = b - a;
        let side = |p: DVec2| edge.perp_dot(p - a);

        let input = std::mem::take(&mut output);
        for (j, &current) in input.iter().enumerate() {
            let previous = input[(j + input.len() - 1) % input.len()];
            let (d_cur, d_prev) = (side(current), side(previous));

            // A vertex lying on the clip line is its own crossing point
            let crossing = || previous + (current - previous) * (d_prev / (d_prev - d_cur));
            if d_cur >= 0.0 {
                if d_prev < 0.0 && d_cur > 0.0 {
                    output.push(crossing());
                }
                output.push(current);
            } else if d_prev > 0.0 {
                output.push(crossing());
            }
        }
    }

    output
}
