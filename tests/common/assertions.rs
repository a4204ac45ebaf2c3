//! Custom assertions on run reports

use imgprobe::{RunReport, SaveFailure, SavedFile, TargetOutcome, TargetReport};
use std::path::Path;

/// Report of the target with the given 1-based index
pub fn target(report: &RunReport, index: usize) -> &TargetReport {
    report
        .targets
        .iter()
        .find(|t| t.target.index == index)
        .unwrap_or_else(|| panic!("no target #{index} in report"))
}

/// Unwrap a saved outcome
pub fn expect_saved(report: &TargetReport) -> &SavedFile {
    match &report.outcome {
        TargetOutcome::Saved { saved, .. } => saved,
        other => panic!("target #{} expected saved, got {other:?}", report.target.index),
    }
}

/// Unwrap a save failure
pub fn expect_save_failed(report: &TargetReport) -> &SaveFailure {
    match &report.outcome {
        TargetOutcome::SaveFailed { failure, .. } => failure,
        other => panic!(
            "target #{} expected save_failed, got {other:?}",
            report.target.index
        ),
    }
}

/// Assert that no file was left at `path`
pub fn assert_no_file(path: &Path) {
    assert!(!path.exists(), "unexpected file at {}", path.display());
}
