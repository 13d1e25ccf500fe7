use serde::{Deserialize, Serialize};

use crate::{
    analysis::quad::{Quad, Size},
    consts::QUAD_CORNERS,
    error::QuadEvalError,
    metrics::MetricContext,
};

/// One evaluated image as written by a detection system.
///
/// ```json
/// {
///   "origin_image_path": "D:/images/01_alb_id/CA/CA01_01.tif",
///   "size": [1080, 1920],
///   "template_size": [856, 540],
///   "ground_truth_quad": [[97.0, 672.0], [904.0, 643.0], [931.0, 1142.0], [122.0, 1185.0]],
///   "system_result_quad_exists": true,
///   "system_result_quad": [[45.1, 674.3], [903.8, 643.4], [930.4, 1141.7], [116.2, 1185.0]]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path of the source image, absolute or relative.
    pub origin_image_path: String,
    /// Image size `[width, height]` in pixels.
    pub size: Size,
    /// Template size `[width, height]`.
    pub template_size: Size,
    /// Annotated document boundary.
    pub ground_truth_quad: Quad,
    /// Whether the system produced a quad for this image.
    pub system_result_quad_exists: bool,
    /// The system's quad. Kept raw because systems commonly emit an empty or
    /// placeholder value when `system_result_quad_exists` is false.
    #[serde(default)]
    pub system_result_quad: Option<Vec<Vec<f64>>>,
}

impl ImageRecord {
    /// The predicted quad, or `None` when the system reported no result.
    ///
    /// Fails with `InvalidDimension` when a result is claimed but missing or
    /// malformed.
    pub fn prediction(&self) -> Result<Option<Quad>, QuadEvalError> {
        if !self.system_result_quad_exists {
            return Ok(None);
        }

        match &self.system_result_quad {
            Some(coords) => Quad::from_coords(coords).map(Some),
            None => Err(QuadEvalError::InvalidDimension {
                what: "system_result_quad".to_string(),
                expected: QUAD_CORNERS,
                got: 0,
            }),
        }
    }

    pub fn context(&self) -> MetricContext {
        MetricContext {
            image_size: self.size,
            template_size: self.template_size,
        }
    }

    /// The image name used by run lists: the file name of
    /// `origin_image_path` without its extension.
    pub fn name(&self) -> &str {
        image_name(&self.origin_image_path)
    }
}

/// Strips directories (either separator) and everything from the first `.`.
///
/// # Example
/// ```
/// use quadeval_core::report::record::image_name;
/// assert_eq!(image_name("D:/images\\01_alb_id/CA\\CA01_01.tif"), "CA01_01");
/// assert_eq!(image_name("CA01_01"), "CA01_01");
/// ```
pub fn image_name(path: &str) -> &str {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file.split('.').next().unwrap_or(file)
}
