use std::{collections::HashSet, fs, path::Path};

use snafu::ResultExt;
use tracing::*;

use crate::{
    error::{IoReadSnafu, QuadEvalError, ReportParseSnafu},
    report::record::ImageRecord,
};

/// Reads a JSON report: an array with one object per image.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Vec<ImageRecord>, QuadEvalError> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    let content = fs::read_to_string(path).context(IoReadSnafu {
        path: path_str.clone(),
    })?;
    let records: Vec<ImageRecord> =
        serde_json::from_str(&content).context(ReportParseSnafu { path: path_str.clone() })?;

    info!("loaded {} records from {}", records.len(), path_str);
    Ok(records)
}

/// Reads a run list: one image name per line, blank lines ignored.
pub fn read_runlist<P: AsRef<Path>>(path: P) -> Result<HashSet<String>, QuadEvalError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).context(IoReadSnafu {
        path: path.to_string_lossy().to_string(),
    })?;

    Ok(parse_runlist(&content))
}

pub fn parse_runlist(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps the records whose image name appears in `runlist`, in report order.
pub fn filter_by_runlist(records: Vec<ImageRecord>, runlist: &HashSet<String>) -> Vec<ImageRecord> {
    let total = records.len();
    let kept: Vec<ImageRecord> = records
        .into_iter()
        .filter(|record| runlist.contains(record.name()))
        .collect();

    debug!("run list kept {} of {} records", kept.len(), total);
    kept
}
