use crate::{
    analysis::{
        homography::Homography,
        polygon::Region,
        quad::{Quad, Size, rectangle_from_size},
    },
    error::QuadEvalError,
    metrics::{Metric, MetricContext, MetricKind, jaccard_index},
};

/// Jaccard index measured in the undistorted ground-truth frame (`iou_gt`).
#[derive(Clone, Copy, Debug, Default)]
pub struct IouGtMetric;

impl Metric for IouGtMetric {
    const KIND: MetricKind = MetricKind::IouGt;

    fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        context: &MetricContext,
    ) -> Result<f64, QuadEvalError> {
        intersection_over_union_with_gt_normalization(prediction, ground_truth, context.template_size)
    }
}

/// IoU between the template rectangle and the prediction reprojected into
/// the template frame.
///
/// The perspective transform is solved from the ground-truth quad onto
/// `rectangle_from_size(template_size)` and then applied to the prediction,
/// so the score does not depend on how large or how tilted the document
/// appears in the source image. A degenerate ground truth raises
/// `DegenerateTransform`.
pub fn intersection_over_union_with_gt_normalization(
    prediction: &Quad,
    ground_truth: &Quad,
    template_size: Size,
) -> Result<f64, QuadEvalError> {
    let stage = IouGtMetric::KIND.name();
    let target = rectangle_from_size(template_size);

    let matrix = Homography::from_quads(ground_truth, &target)?;
    let projected = matrix.project_quad(prediction)?;

    let region_target = Region::from_quad(&target, stage)?;
    let region_test = Region::from_quad(&projected, stage)?;

    Ok(jaccard_index(
        region_test.area(),
        region_target.area(),
        region_target.intersection_area(&region_test),
    ))
}
