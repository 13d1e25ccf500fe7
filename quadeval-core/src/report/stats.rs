use std::{collections::BTreeMap, fmt, path::Path};

use serde::Serialize;

use crate::{
    consts::THRESHOLD_TOLERANCE,
    metrics::{MetricFamily, MetricKind},
    report::evaluate::RecordScores,
};

/// Collects per-record scores for each selected metric.
#[derive(Debug, Clone, Default)]
pub struct ScoreAccumulator {
    scores: BTreeMap<MetricKind, Vec<Option<f64>>>,
}

impl ScoreAccumulator {
    pub fn new(metrics: &[MetricKind]) -> Self {
        Self {
            scores: metrics.iter().map(|kind| (*kind, Vec::new())).collect(),
        }
    }

    pub fn add(&mut self, record: &RecordScores) {
        for (kind, score) in &record.scores {
            self.scores.entry(*kind).or_default().push(*score);
        }
    }

    pub fn summarize(&self, iou_threshold: f64, residuals_threshold: f64) -> Statistics {
        let metrics = self
            .scores
            .iter()
            .map(|(kind, scores)| {
                let threshold = match kind.family() {
                    MetricFamily::Overlap => iou_threshold,
                    MetricFamily::Residual => residuals_threshold,
                };
                MetricStatistics::from_scores(*kind, scores, threshold)
            })
            .collect();

        Statistics { metrics }
    }
}

/// Aggregate result of one metric over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStatistics {
    pub metric: MetricKind,
    /// Number of records, including those without a score.
    pub count: usize,
    /// Mean over the records that have a score.
    pub mean: Option<f64>,
    /// Fraction of all records counted as correct.
    pub correct_ratio: f64,
    pub threshold: f64,
}

impl MetricStatistics {
    pub fn from_scores(metric: MetricKind, scores: &[Option<f64>], threshold: f64) -> Self {
        let values: Vec<f64> = scores.iter().flatten().copied().collect();
        let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

        let correct = values
            .iter()
            .filter(|&&score| is_correct(metric, score, threshold))
            .count();
        let correct_ratio = if scores.is_empty() {
            0.0
        } else {
            correct as f64 / scores.len() as f64
        };

        Self {
            metric,
            count: scores.len(),
            mean,
            correct_ratio,
            threshold,
        }
    }
}

/// Whether a single score passes the threshold of its metric family.
pub fn is_correct(metric: MetricKind, score: f64, threshold: f64) -> bool {
    match metric.family() {
        MetricFamily::Overlap => score > threshold - THRESHOLD_TOLERANCE,
        MetricFamily::Residual => score < threshold + THRESHOLD_TOLERANCE,
    }
}

/// Statistics for every evaluated metric, in report order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub metrics: Vec<MetricStatistics>,
}

impl Statistics {
    pub fn get(&self, metric: MetricKind) -> Option<&MetricStatistics> {
        self.metrics.iter().find(|s| s.metric == metric)
    }
}

impl fmt::Display for MetricStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mean = self
            .mean
            .map_or_else(|| "nan".to_string(), |mean| format!("{mean:?}"));
        let percent = self.correct_ratio * 100.0;

        writeln!(f, "Metric: {}", self.metric.title())?;
        match self.metric.family() {
            MetricFamily::Overlap => {
                writeln!(f, "   Number of images                : {}", self.count)?;
                writeln!(f, "   Average value                   : {}", mean)?;
                writeln!(f, "   Percentage of correct (*) images: {:?} %", percent)?;
                writeln!(
                    f,
                    "* A result is considered to be correct if its score is more than THRESHOLD={:.2}. \
                     To change THRESHOLD see help",
                    self.threshold
                )
            }
            MetricFamily::Residual => {
                writeln!(f, "   Number of images                 : {}", self.count)?;
                writeln!(f, "   Average value (*)                : {}", mean)?;
                writeln!(f, "   Percentage of correct (**) images: {:?} %", percent)?;
                writeln!(
                    f,
                    "* Note: average value is calculated only for the images having a resulting quadrilateral"
                )?;
                writeln!(
                    f,
                    "** A result is considered to be correct if its deviation is less than \
                     RESIDUALS_THRESHOLD={:.3}. To change RESIDUALS_THRESHOLD see help",
                    self.threshold
                )
            }
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for metric in &self.metrics {
            writeln!(f)?;
            write!(f, "{metric}")?;
        }
        Ok(())
    }
}

/// Header printed before the statistics.
pub fn banner(metrics: &[MetricKind], runlist: Option<&Path>) -> String {
    let mut text = String::from("Calculating following statistic(s):\n");
    for metric in metrics {
        text.push_str(&format!("   {metric}\n"));
    }
    match runlist {
        Some(path) => text.push_str(&format!("on subset:\n{}\n", path.display())),
        None => text.push_str("on full dataset\n"),
    }
    text
}
