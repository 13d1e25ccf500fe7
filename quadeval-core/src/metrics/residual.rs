use crate::{
    analysis::{
        homography::Homography,
        quad::{Quad, Size, perimeter, rectangle_from_size},
    },
    consts::QUAD_CORNERS,
    error::QuadEvalError,
    metrics::{Metric, MetricContext, MetricKind},
};

/// Worst corner displacement in the predicted quad's frame (`minD`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ResidualMetric;

impl Metric for ResidualMetric {
    const KIND: MetricKind = MetricKind::MinD;

    fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        context: &MetricContext,
    ) -> Result<f64, QuadEvalError> {
        residual_metric(prediction, ground_truth, context.template_size)
    }
}

/// Per-corner distances between two quads, corner `i` against corner `i`.
pub fn corner_residuals(run: &Quad, ideal: &Quad) -> [f64; QUAD_CORNERS] {
    let (a, b) = (run.points(), ideal.points());
    std::array::from_fn(|i| a[i].distance(b[i]))
}

fn worst(residuals: &[f64; QUAD_CORNERS]) -> f64 {
    residuals.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Maximum corner residual over the template perimeter, minimized over the
/// four cyclic relabelings of the ground-truth corners.
///
/// Both quads are brought to the same winding first. The prediction (`run`)
/// is mapped onto `rectangle_from_size(size)` and the same transform is
/// applied to the ground truth (`ideal`). Every rotation of the transformed
/// ground truth is then compared with the rectangle, and the rotation whose
/// worst corner is smallest wins; on ties the earlier rotation is kept.
///
/// Lower is better and `0.0` is an exact match. Fails with
/// `DegenerateTransform` when the prediction has collinear corners.
///
/// # Example
/// ```
/// use quadeval_core::analysis::quad::{Size, rectangle_from_size};
/// use quadeval_core::metrics::residual_metric;
/// let size = Size::new(10.0, 10.0).unwrap();
/// let rect = rectangle_from_size(size);
/// assert!(residual_metric(&rect, &rect.rotate_right(1), size).unwrap() < 1e-9);
/// ```
pub fn residual_metric(run: &Quad, ideal: &Quad, size: Size) -> Result<f64, QuadEvalError> {
    let run = run.canonical_orientation();
    let ideal = ideal.canonical_orientation();
    let target = rectangle_from_size(size);

    let matrix = Homography::from_quads(&run, &target)?;
    let transformed = matrix.project_quad(&ideal)?;

    let best = (0..QUAD_CORNERS)
        .map(|k| worst(&corner_residuals(&transformed.rotate_right(k), &target)))
        .fold(f64::INFINITY, |best, candidate| {
            if best > candidate { candidate } else { best }
        });

    Ok(best / perimeter(size))
}
