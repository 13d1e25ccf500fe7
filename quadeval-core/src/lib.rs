pub mod analysis;
pub mod consts;
pub mod error;
pub mod metrics;
pub mod report;

// Re-export commonly used types
pub use analysis::quad::{Quad, Size};
pub use error::QuadEvalError;
pub use metrics::{Metric, MetricContext, MetricKind};
pub use report::{
    evaluate::{ErrorPolicy, Evaluator, EvaluatorConfig, RecordScores},
    loader::{filter_by_runlist, read_report, read_runlist},
    record::ImageRecord,
    stats::{MetricStatistics, Statistics, banner},
};
