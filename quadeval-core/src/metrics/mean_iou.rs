use crate::{
    analysis::{
        quad::{Quad, Size},
        raster::{background_overlap, foreground_overlap, rasterize_quad},
    },
    error::QuadEvalError,
    metrics::{Metric, MetricContext, MetricKind},
};

/// Mean of foreground and background IoU on the image raster (`mean_iou`).
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanIouMetric;

impl Metric for MeanIouMetric {
    const KIND: MetricKind = MetricKind::MeanIou;

    fn compute(
        &self,
        prediction: &Quad,
        ground_truth: &Quad,
        context: &MetricContext,
    ) -> Result<f64, QuadEvalError> {
        mean_intersection_over_union(prediction, ground_truth, context.image_size)
    }
}

/// Average of the foreground IoU and the background IoU of two quads filled
/// into `image_size` masks at native resolution.
///
/// Fails with `EmptyRegion` when neither quad covers a pixel, or when
/// together they cover the whole canvas.
pub fn mean_intersection_over_union(
    a: &Quad,
    b: &Quad,
    image_size: Size,
) -> Result<f64, QuadEvalError> {
    let (width, height) = image_size.canvas();
    let empty = |region: &str| QuadEvalError::EmptyRegion {
        region: region.to_string(),
        width,
        height,
    };

    let mask_a = rasterize_quad(a, width, height);
    let mask_b = rasterize_quad(b, width, height);

    let iou = foreground_overlap(&mask_a, &mask_b)
        .ratio()
        .ok_or_else(|| empty("foreground"))?;
    let iou_back = background_overlap(&mask_a, &mask_b)
        .ratio()
        .ok_or_else(|| empty("background"))?;

    Ok((iou + iou_back) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(coords: [[f64; 2]; 4]) -> Quad {
        Quad::from_coords(&coords).unwrap()
    }

    #[test]
    fn test_mean_iou_identical() {
        let size = Size::new(40.0, 30.0).unwrap();
        let q = quad([[5.0, 5.0], [20.0, 6.0], [21.0, 20.0], [4.0, 19.0]]);
        assert_eq!(mean_intersection_over_union(&q, &q, size).unwrap(), 1.0);
    }

    #[test]
    fn test_mean_iou_symmetric_and_bounded() {
        let size = Size::new(1080.0, 1920.0).unwrap();
        let a = quad([[97.0, 672.0], [904.0, 643.0], [931.0, 1142.0], [122.0, 1185.0]]);
        let b = quad([[45.1, 674.3], [903.8, 643.4], [930.4, 1141.7], [116.2, 1185.0]]);
        let ab = mean_intersection_over_union(&a, &b, size).unwrap();
        let ba = mean_intersection_over_union(&b, &a, size).unwrap();
        assert_eq!(ab, ba);
        assert!(ab > 0.9 && ab < 1.0);
    }

    #[test]
    fn test_mean_iou_disjoint_quads() {
        let size = Size::new(100.0, 100.0).unwrap();
        let left = quad([[10.0, 10.0], [30.0, 10.0], [30.0, 30.0], [10.0, 30.0]]);
        let right = quad([[60.0, 60.0], [80.0, 60.0], [80.0, 80.0], [60.0, 80.0]]);
        let score = mean_intersection_over_union(&left, &right, size).unwrap();
        // No foreground overlap, background IoU strictly inside (0, 1)
        assert!(score > 0.0 && score < 0.5);
    }

    #[test]
    fn test_mean_iou_empty_foreground() {
        let size = Size::new(20.0, 20.0).unwrap();
        let outside = quad([[100.0, 100.0], [110.0, 100.0], [110.0, 110.0], [100.0, 110.0]]);
        assert!(matches!(
            mean_intersection_over_union(&outside, &outside, size),
            Err(QuadEvalError::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_mean_iou_empty_background() {
        let size = Size::new(20.0, 20.0).unwrap();
        let cover = quad([[-5.0, -5.0], [30.0, -5.0], [30.0, 30.0], [-5.0, 30.0]]);
        let err = mean_intersection_over_union(&cover, &cover, size).unwrap_err();
        assert!(matches!(err, QuadEvalError::EmptyRegion { ref region, .. } if region == "background"));
    }

    #[test]
    fn test_mean_iou_zero_canvas() {
        let size = Size::new(0.5, 20.0).unwrap();
        let q = quad([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert!(matches!(
            mean_intersection_over_union(&q, &q, size),
            Err(QuadEvalError::EmptyRegion { width: 0, .. })
        ));
    }
}
