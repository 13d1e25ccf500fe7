pub mod homography;
pub mod polygon;
pub mod quad;
pub mod raster;
