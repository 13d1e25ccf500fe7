use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::quad::{Quad, Size},
    error::QuadEvalError,
};

pub mod iou;
pub mod iou_gt;
pub mod mean_iou;
pub mod residual;

pub use iou::{IouMetric, intersection_over_union, jaccard_index};
pub use iou_gt::{IouGtMetric, intersection_over_union_with_gt_normalization};
pub use mean_iou::{MeanIouMetric, mean_intersection_over_union};
pub use residual::{ResidualMetric, residual_metric};

/// Geometric context shared by every metric evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricContext {
    /// Pixel size of the source image.
    pub image_size: Size,
    /// Reference size of the document template.
    pub template_size: Size,
}

/// A comparison between a predicted quad and a ground-truth quad.
///
/// Implementations are pure: the same inputs always give the same score and
/// nothing is shared between calls.
pub trait Metric {
    const KIND: MetricKind;

    fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        context: &MetricContext,
    ) -> Result<f64, QuadEvalError>;
}

/// Whether higher or lower scores are better.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricFamily {
    /// Ratios in `[0, 1]`, higher is better.
    Overlap,
    /// Normalized distances, lower is better.
    Residual,
}

/// The metrics that can be selected by name.
///
/// Declaration order is the order statistics are reported in.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum MetricKind {
    #[serde(rename = "mean_iou")]
    #[value(name = "mean_iou")]
    MeanIou,
    #[serde(rename = "iou_gt")]
    #[value(name = "iou_gt")]
    IouGt,
    #[serde(rename = "iou")]
    #[value(name = "iou")]
    Iou,
    #[serde(rename = "minD")]
    #[value(name = "minD")]
    MinD,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::MeanIou,
        MetricKind::IouGt,
        MetricKind::Iou,
        MetricKind::MinD,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            MetricKind::MeanIou => "mean_iou",
            MetricKind::IouGt => "iou_gt",
            MetricKind::Iou => "iou",
            MetricKind::MinD => "minD",
        }
    }

    pub const fn title(&self) -> &'static str {
        match self {
            MetricKind::MeanIou => "Mean intersection over union of foreground and background",
            MetricKind::IouGt => "Intersection over union in ground truth quad coordinate system",
            MetricKind::Iou => "Intersection over union",
            MetricKind::MinD => "Minimum corner distance in result quad coordinate system",
        }
    }

    pub const fn family(&self) -> MetricFamily {
        match self {
            MetricKind::MinD => MetricFamily::Residual,
            _ => MetricFamily::Overlap,
        }
    }

    /// Score recorded for an image without a predicted quad.
    ///
    /// Overlap metrics score it as `0.0`; the residual metric has no
    /// meaningful value and reports `None`.
    pub const fn missing_value(&self) -> Option<f64> {
        match self.family() {
            MetricFamily::Overlap => Some(0.0),
            MetricFamily::Residual => None,
        }
    }

    pub fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        context: &MetricContext,
    ) -> Result<f64, QuadEvalError> {
        match self {
            MetricKind::MeanIou => MeanIouMetric.compute(prediction, ground_truth, context),
            MetricKind::IouGt => IouGtMetric.compute(prediction, ground_truth, context),
            MetricKind::Iou => IouMetric.compute(prediction, ground_truth, context),
            MetricKind::MinD => ResidualMetric.compute(prediction, ground_truth, context),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = QuadEvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| QuadEvalError::UnknownMetric {
                name: s.to_string(),
            })
    }
}
