use std::collections::BTreeMap;

use clap::ValueEnum;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::*;

use crate::{
    consts::*,
    error::{QuadEvalError, RecordSnafu},
    metrics::MetricKind,
    report::{
        record::ImageRecord,
        stats::{ScoreAccumulator, Statistics},
    },
};

/// What to do when a metric fails on a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole batch.
    #[default]
    Halt,
    /// Log the failure and score the metric as if no quad was predicted.
    Skip,
}

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub metrics: Vec<MetricKind>,
    pub iou_threshold: f64,
    pub residuals_threshold: f64,
    pub on_error: ErrorPolicy,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            metrics: DEFAULT_METRICS.to_vec(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            residuals_threshold: DEFAULT_RESIDUALS_THRESHOLD,
            on_error: ErrorPolicy::default(),
        }
    }
}

/// Scores of one record, keyed by metric. `None` means not applicable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordScores {
    pub origin_image_path: String,
    pub scores: BTreeMap<MetricKind, Option<f64>>,
}

pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(mut config: EvaluatorConfig) -> Self {
        config.metrics.sort();
        config.metrics.dedup();
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Scores one record with every selected metric.
    ///
    /// Records without a predicted quad get each metric's missing value and
    /// never reach the geometry code.
    pub fn evaluate_record(&self, record: &ImageRecord) -> Result<RecordScores, QuadEvalError> {
        let path = &record.origin_image_path;
        let missing = || {
            self.config
                .metrics
                .iter()
                .map(|kind| (*kind, kind.missing_value()))
                .collect::<BTreeMap<_, _>>()
        };

        let prediction = match self.recover(record.prediction(), path, "prediction")? {
            Some(Some(prediction)) => prediction,
            Some(None) | None => {
                debug!("no result quad for {}", path);
                return Ok(RecordScores {
                    origin_image_path: path.clone(),
                    scores: missing(),
                });
            }
        };

        let context = record.context();
        let mut scores = BTreeMap::new();
        for kind in &self.config.metrics {
            let result = kind.compute(&prediction, &record.ground_truth_quad, &context);
            let score = match self.recover(result, path, kind.name())? {
                Some(score) => Some(score),
                None => kind.missing_value(),
            };
            debug!("{} {} = {:?}", path, kind, score);
            scores.insert(*kind, score);
        }

        Ok(RecordScores {
            origin_image_path: path.clone(),
            scores,
        })
    }

    /// Applies the error policy: `Ok(None)` means the failure was skipped.
    fn recover<T>(
        &self,
        result: Result<T, QuadEvalError>,
        path: &str,
        stage: &str,
    ) -> Result<Option<T>, QuadEvalError> {
        match (result, self.config.on_error) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(err), ErrorPolicy::Skip) => {
                warn!("skipping `{}` for {}: {}", stage, path, err);
                Ok(None)
            }
            (Err(err), ErrorPolicy::Halt) => Err(err).context(RecordSnafu { path, stage }),
        }
    }

    /// Scores every record in parallel, keeping the input order.
    ///
    /// When several records fail, the error of the earliest one is returned.
    pub fn evaluate(&self, records: &[ImageRecord]) -> Result<Vec<RecordScores>, QuadEvalError> {
        let span = info_span!("evaluate", records = records.len());
        let _guard = span.enter();

        info!(
            "evaluating {} records with metrics {:?}",
            records.len(),
            self.config.metrics.iter().map(MetricKind::name).collect::<Vec<_>>()
        );

        let results: Vec<Result<RecordScores, QuadEvalError>> = records
            .par_iter()
            .map(|record| {
                let _guard = span.enter();
                self.evaluate_record(record)
            })
            .collect();
        let scores = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        info!("evaluated {} records", scores.len());
        Ok(scores)
    }

    /// Evaluates `records` and aggregates the scores.
    pub fn run(&self, records: &[ImageRecord]) -> Result<Statistics, QuadEvalError> {
        let scores = self.evaluate(records)?;

        let mut accumulator = ScoreAccumulator::new(&self.config.metrics);
        for record in &scores {
            accumulator.add(record);
        }

        Ok(accumulator.summarize(self.config.iou_threshold, self.config.residuals_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prediction: Option<[[f64; 2]; 4]>) -> ImageRecord {
        ImageRecord {
            origin_image_path: "images/CA01_01.tif".to_string(),
            size: crate::analysis::quad::Size::new(40.0, 40.0).unwrap(),
            template_size: crate::analysis::quad::Size::new(10.0, 10.0).unwrap(),
            ground_truth_quad: crate::analysis::quad::Quad::from_coords(&[
                [0.0, 0.0],
                [10.0, 0.0],
                [10.0, 10.0],
                [0.0, 10.0],
            ])
            .unwrap(),
            system_result_quad_exists: prediction.is_some(),
            system_result_quad: prediction.map(|q| q.iter().map(|p| p.to_vec()).collect()),
        }
    }

    fn all_metrics() -> EvaluatorConfig {
        EvaluatorConfig {
            metrics: MetricKind::ALL.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.metrics, vec![MetricKind::IouGt, MetricKind::MinD]);
        assert_eq!(config.iou_threshold, 0.9);
        assert_eq!(config.residuals_threshold, 0.017);
        assert_eq!(config.on_error, ErrorPolicy::Halt);
    }

    #[test]
    fn test_metrics_are_deduplicated() {
        let evaluator = Evaluator::new(EvaluatorConfig {
            metrics: vec![MetricKind::MinD, MetricKind::Iou, MetricKind::MinD],
            ..Default::default()
        });
        assert_eq!(evaluator.config().metrics, vec![MetricKind::Iou, MetricKind::MinD]);
    }

    #[test]
    fn test_missing_prediction_uses_sentinels() {
        let evaluator = Evaluator::new(all_metrics());
        let scores = evaluator.evaluate_record(&record(None)).unwrap();
        assert_eq!(scores.scores[&MetricKind::Iou], Some(0.0));
        assert_eq!(scores.scores[&MetricKind::IouGt], Some(0.0));
        assert_eq!(scores.scores[&MetricKind::MeanIou], Some(0.0));
        assert_eq!(scores.scores[&MetricKind::MinD], None);
    }

    #[test]
    fn test_exact_prediction() {
        let evaluator = Evaluator::new(all_metrics());
        let scores = evaluator
            .evaluate_record(&record(Some([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]])))
            .unwrap();
        assert_eq!(scores.scores[&MetricKind::Iou], Some(1.0));
        assert_eq!(scores.scores[&MetricKind::MeanIou], Some(1.0));
        assert!((scores.scores[&MetricKind::IouGt].unwrap() - 1.0).abs() < 1e-9);
        assert!(scores.scores[&MetricKind::MinD].unwrap() < 1e-9);
    }

    #[test]
    fn test_halt_policy_reports_record() {
        let evaluator = Evaluator::new(EvaluatorConfig {
            metrics: vec![MetricKind::Iou],
            on_error: ErrorPolicy::Halt,
            ..Default::default()
        });
        let flat = record(Some([[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [2.0, 0.0]]));
        let err = evaluator.evaluate_record(&flat).unwrap_err();
        match err {
            QuadEvalError::Record { source, stage, path } => {
                assert_eq!(stage, "iou");
                assert_eq!(path, "images/CA01_01.tif");
                assert!(matches!(*source, QuadEvalError::DegeneratePolygon { .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_skip_policy_substitutes_sentinels() {
        let evaluator = Evaluator::new(EvaluatorConfig {
            metrics: vec![MetricKind::Iou, MetricKind::MinD],
            on_error: ErrorPolicy::Skip,
            ..Default::default()
        });
        let flat = record(Some([[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [2.0, 0.0]]));
        let scores = evaluator.evaluate_record(&flat).unwrap();
        assert_eq!(scores.scores[&MetricKind::Iou], Some(0.0));
        assert_eq!(scores.scores[&MetricKind::MinD], None);

        let mut malformed = record(None);
        malformed.system_result_quad_exists = true;
        let scores = evaluator.evaluate_record(&malformed).unwrap();
        assert_eq!(scores.scores[&MetricKind::Iou], Some(0.0));
    }

    #[test]
    fn test_halt_reports_earliest_failure() {
        let evaluator = Evaluator::new(EvaluatorConfig {
            metrics: vec![MetricKind::Iou],
            ..Default::default()
        });
        let flat = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [2.0, 0.0]];
        let records: Vec<ImageRecord> = (0..64)
            .map(|i| {
                let mut r = if i >= 20 && i % 3 == 2 {
                    record(Some(flat))
                } else {
                    record(Some([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]))
                };
                r.origin_image_path = format!("images/{i}.tif");
                r
            })
            .collect();

        for _ in 0..8 {
            match evaluator.evaluate(&records) {
                Err(QuadEvalError::Record { path, .. }) => assert_eq!(path, "images/20.tif"),
                other => panic!("expected a record error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_evaluate_keeps_order() {
        let evaluator = Evaluator::new(all_metrics());
        let mut records: Vec<ImageRecord> = (0..32)
            .map(|i| {
                let dx = i as f64 * 0.25;
                record(Some([[dx, 0.0], [10.0 + dx, 0.0], [10.0 + dx, 10.0], [dx, 10.0]]))
            })
            .collect();
        for (i, r) in records.iter_mut().enumerate() {
            r.origin_image_path = format!("images/{i}.tif");
        }

        let scores = evaluator.evaluate(&records).unwrap();
        for (i, s) in scores.iter().enumerate() {
            assert_eq!(s.origin_image_path, format!("images/{i}.tif"));
        }
        // Larger shifts never improve the overlap
        let ious: Vec<f64> = scores.iter().map(|s| s.scores[&MetricKind::Iou].unwrap()).collect();
        assert!(ious.windows(2).all(|w| w[0] >= w[1]));
    }
}
