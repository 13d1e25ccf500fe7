use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QuadEvalError {
    #[snafu(display("Invalid dimension for `{}`: expected {}, got {}", what, expected, got))]
    InvalidDimension {
        what: String,
        expected: usize,
        got: usize,
    },
    #[snafu(display("Invalid size `{}x{}`: both dimensions must be finite and positive", width, height))]
    InvalidSize { width: f64, height: f64 },
    #[snafu(display("Degenerate polygon at stage `{}`: {}", stage, message))]
    DegeneratePolygon { stage: String, message: String },
    #[snafu(display("Degenerate projective transform at stage `{}`: {}", stage, message))]
    DegenerateTransform { stage: String, message: String },
    #[snafu(display("Empty {} region on a {}x{} canvas", region, width, height))]
    EmptyRegion {
        region: String,
        width: u32,
        height: u32,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Parse report `{}` error: {}", path, source))]
    ReportParse {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Unknown metric `{}`", name))]
    UnknownMetric { name: String },
    #[snafu(display("Record `{}` failed at `{}`: {}", path, stage, source))]
    Record {
        #[snafu(source(from(QuadEvalError, Box::new)))]
        source: Box<QuadEvalError>,
        stage: String,
        path: String,
    },
}

impl QuadEvalError {
    pub fn degenerate_polygon(stage: &str, message: impl Into<String>) -> Self {
        Self::DegeneratePolygon {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    pub fn degenerate_transform(stage: &str, message: impl Into<String>) -> Self {
        Self::DegenerateTransform {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}
