use crate::metrics::MetricKind;

/// Default score threshold for the IoU family of metrics.
///
/// A record is counted as correct when its `iou`, `iou_gt` or `mean_iou`
/// score is above this value. 0.9 is the customary acceptance level for
/// document boundary localization on MIDV-500-style benchmarks.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.9;

/// Default threshold for the corner-residual metric (`minD`).
///
/// The score is a worst-corner displacement divided by the template
/// perimeter, so a value of 0.017 allows roughly 1.7% of the perimeter as
/// the maximum corner error. A record is correct when its score is below
/// this value.
pub const DEFAULT_RESIDUALS_THRESHOLD: f64 = 0.017;

/// Tolerance applied when comparing a score against a threshold.
///
/// IoU scores pass when `score > threshold - THRESHOLD_TOLERANCE`, residual
/// scores pass when `score < threshold + THRESHOLD_TOLERANCE`.
pub const THRESHOLD_TOLERANCE: f64 = 1e-10;

/// Relative overshoot accepted when one polygon nearly contains the other.
///
/// When the computed intersection area lies in
/// `(min_area, min_area * (1 + INTERSECTION_CLAMP_EPSILON))` it is snapped to
/// `min_area`, which keeps the Jaccard index from exceeding its analytic
/// bound because of floating point error.
pub const INTERSECTION_CLAMP_EPSILON: f64 = 1e-10;

/// Relative tolerance used to detect collinear correspondences.
///
/// Three points are treated as collinear when the cross product of their
/// edge vectors is below this fraction of the squared quad extent.
pub const COLLINEAR_EPSILON: f64 = 1e-12;

/// Smallest pivot accepted while solving the 8x8 perspective system.
pub const PIVOT_EPSILON: f64 = 1e-12;

/// Number of corners in a quadrilateral.
pub const QUAD_CORNERS: usize = 4;

/// Metrics evaluated when the caller does not select any.
pub const DEFAULT_METRICS: [MetricKind; 2] = [MetricKind::IouGt, MetricKind::MinD];
