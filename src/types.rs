//! Core types for imgprobe
//!
//! Every record here is produced once and never mutated afterwards. The
//! pipeline builds them, the reporters only read them.

use crate::error::{EXIT_OK, EXIT_TARGET_FAILED, FetchError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One URL to probe and where its image goes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    /// URL to download
    pub source_url: String,
    /// File the image is written to
    pub destination_path: PathBuf,
    /// 1-based position in the configured list
    pub index: usize,
}

/// Outcome of a single GET request
#[derive(Clone, Debug)]
pub struct FetchResult {
    /// Wall-clock time spent on the request and body, in milliseconds
    pub elapsed_ms: f64,
    /// Body bytes, or why there are none
    pub outcome: std::result::Result<Bytes, FetchError>,
}

impl FetchResult {
    /// Whether the fetch produced a body
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Body bytes, if the fetch succeeded
    pub fn bytes(&self) -> Option<&Bytes> {
        self.outcome.as_ref().ok()
    }

    /// Failure, if the fetch failed
    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }
}

/// Result of content sniffing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// MIME type detected from the bytes
    pub mime_type: String,
    /// Whether the MIME type is one of the accepted image types
    pub is_image: bool,
}

/// A file that was written successfully
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    /// Bytes reported written by the write call
    pub bytes_written: u64,
    /// Whether the file exists when checked after the write
    pub path_exists: bool,
    /// Size reported by the filesystem after the write
    pub disk_size: u64,
    /// Whether the on-disk size equals the downloaded size
    pub sizes_match: bool,
    /// Path the file was written to
    pub full_path: PathBuf,
    /// Public path below the document root, when one applies
    pub web_path: Option<String>,
}

/// A write that failed, with directory diagnostics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFailure {
    /// System error text
    pub error: String,
    /// Whether the parent directory exists
    pub dir_exists: bool,
    /// Whether the parent directory is writable
    pub dir_writable: bool,
    /// Path the write was attempted at
    pub full_path: PathBuf,
}

/// Outcome of saving validated image bytes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveResult {
    /// The file was written
    Saved(SavedFile),
    /// The write failed
    Failed(SaveFailure),
}

/// Final state of one target
///
/// Exactly one of these is produced per target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TargetOutcome {
    /// The download failed
    FetchFailed {
        /// Why the download failed
        error: FetchError,
    },
    /// The download succeeded but the content is not an accepted image
    NotImage {
        /// Sniffed content type
        validation: ValidationResult,
        /// First bytes of the payload with non-printables replaced
        snippet: String,
    },
    /// The image was saved
    Saved {
        /// Sniffed content type
        validation: ValidationResult,
        /// Write diagnostics
        saved: SavedFile,
    },
    /// The image could not be saved
    SaveFailed {
        /// Sniffed content type
        validation: ValidationResult,
        /// Write failure diagnostics
        failure: SaveFailure,
    },
}

impl TargetOutcome {
    /// Short label for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            TargetOutcome::FetchFailed { .. } => "fetch_failed",
            TargetOutcome::NotImage { .. } => "not_image",
            TargetOutcome::Saved { .. } => "saved",
            TargetOutcome::SaveFailed { .. } => "save_failed",
        }
    }

    /// Whether the target ended with the image on disk
    pub fn is_saved(&self) -> bool {
        matches!(self, TargetOutcome::Saved { .. })
    }

    /// Validation result, for every state past a successful fetch
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            TargetOutcome::FetchFailed { .. } => None,
            TargetOutcome::NotImage { validation, .. }
            | TargetOutcome::Saved { validation, .. }
            | TargetOutcome::SaveFailed { validation, .. } => Some(validation),
        }
    }
}

/// Everything reported about one target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    /// The target that was processed
    pub target: DownloadTarget,
    /// Request time in milliseconds, rounded to two decimals
    pub elapsed_ms: f64,
    /// Downloaded size in bytes, when the fetch succeeded
    pub size_bytes: Option<u64>,
    /// Final state
    pub outcome: TargetOutcome,
}

/// Filesystem diagnostics for the output directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStatus {
    /// Directory that was prepared
    pub path: PathBuf,
    /// Whether the directory existed before the run
    pub existed: bool,
    /// Whether this run created it
    pub created: bool,
    /// Why creation failed, if it did
    pub creation_error: Option<String>,
    /// Whether the directory is writable by this process
    pub writable: bool,
    /// Permission bits as four octal digits (unix only)
    pub permissions: Option<String>,
    /// User the process runs as
    pub user: String,
    /// Free space on the volume, in bytes
    pub available_space: Option<u64>,
}

/// Runtime settings that shape the run, reported once at the end
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Name and version of the running program
    pub runtime_version: String,
    /// Whether remote URLs may be fetched
    pub allow_remote_fetch: bool,
    /// Time budget for the run in seconds (None = unlimited)
    pub max_execution_seconds: Option<u64>,
    /// Largest accepted response body in bytes (None = unlimited)
    pub memory_limit: Option<u64>,
    /// Largest file that will be written in bytes (None = unlimited)
    pub upload_max_size: Option<u64>,
    /// Current working directory
    pub working_directory: PathBuf,
    /// Web document root, if configured
    pub document_root: Option<PathBuf>,
}

/// Per-state totals for a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of targets processed
    pub total: usize,
    /// Targets whose image was saved
    pub saved: usize,
    /// Targets whose download failed
    pub fetch_failed: usize,
    /// Targets that did not contain an image
    pub not_image: usize,
    /// Targets whose image could not be written
    pub save_failed: usize,
}

impl RunSummary {
    /// Tally the outcomes of a set of target reports
    pub fn from_reports(reports: &[TargetReport]) -> Self {
        let mut summary = RunSummary {
            total: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match report.outcome {
                TargetOutcome::FetchFailed { .. } => summary.fetch_failed += 1,
                TargetOutcome::NotImage { .. } => summary.not_image += 1,
                TargetOutcome::Saved { .. } => summary.saved += 1,
                TargetOutcome::SaveFailed { .. } => summary.save_failed += 1,
            }
        }
        summary
    }

    /// Number of targets that did not end with a saved image
    pub fn failed(&self) -> usize {
        self.fetch_failed + self.not_image + self.save_failed
    }

    /// Process exit code: non-zero when any target failed
    pub fn exit_code(&self) -> i32 {
        if self.failed() == 0 {
            EXIT_OK
        } else {
            EXIT_TARGET_FAILED
        }
    }
}

/// Complete record of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Output directory diagnostics
    pub directory: DirectoryStatus,
    /// One report per target, in input order
    pub targets: Vec<TargetReport>,
    /// Environment snapshot taken after the targets
    pub environment: EnvironmentSnapshot,
    /// Totals
    pub summary: RunSummary,
}
