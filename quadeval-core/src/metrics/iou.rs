use crate::{
    analysis::{polygon::Region, quad::Quad},
    consts::INTERSECTION_CLAMP_EPSILON,
    error::QuadEvalError,
    metrics::{Metric, MetricContext, MetricKind},
};

/// Jaccard index of two quads in image coordinates (`iou`).
#[derive(Clone, Copy, Debug, Default)]
pub struct IouMetric;

impl Metric for IouMetric {
    const KIND: MetricKind = MetricKind::Iou;

    fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        _context: &MetricContext,
    ) -> Result<f64, QuadEvalError> {
        intersection_over_union(prediction, ground_truth)
    }
}

/// Intersection over union of the areas enclosed by two quads.
///
/// Winding order does not matter. Fails with `DegeneratePolygon` if either
/// quad encloses no area.
///
/// # Example
/// ```
/// use quadeval_core::analysis::quad::Quad;
/// use quadeval_core::metrics::intersection_over_union;
/// let a = Quad::from_coords(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
/// let b = Quad::from_coords(&[[5.0, 0.0], [15.0, 0.0], [15.0, 10.0], [5.0, 10.0]]).unwrap();
/// let iou = intersection_over_union(&a, &b).unwrap();
/// assert!((iou - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn intersection_over_union(a: &Quad, b: &Quad) -> Result<f64, QuadEvalError> {
    let stage = IouMetric::KIND.name();
    let region_a = Region::from_quad(a, stage)?;
    let region_b = Region::from_quad(b, stage)?;

    Ok(jaccard_index(
        region_a.area(),
        region_b.area(),
        region_a.intersection_area(&region_b),
    ))
}

/// `inter / (area_a + area_b - inter)`, with near-containment overshoot
/// snapped back to the smaller area.
///
/// Both areas must be positive.
pub fn jaccard_index(area_a: f64, area_b: f64, intersection: f64) -> f64 {
    let area_min = area_a.min(area_b);
    let intersection = if area_min < intersection
        && intersection < area_min * (1.0 + INTERSECTION_CLAMP_EPSILON)
    {
        area_min
    } else {
        intersection
    };

    let area_union = area_a + area_b - intersection;
    intersection / area_union
}
