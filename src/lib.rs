//! # imgprobe
//!
//! Diagnostic pipeline that checks whether a host can download images and
//! write them to disk.
//!
//! For each configured URL the pipeline downloads the body, sniffs its MIME
//! type from the bytes, writes accepted images into the output directory and
//! verifies the result on disk. Every step is reported as it happens, followed
//! by an environment snapshot and a summary.
//!
//! ## Quick Start
//!
//! ```no_run
//! use imgprobe::{Config, Pipeline, report::reporter_for};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         urls: vec!["https://example.com/logo.png".to_string()],
//!         ..Default::default()
//!     };
//!     config.validate()?;
//!
//!     let mut reporter = reporter_for(&config.report, std::io::stdout());
//!     let pipeline = Pipeline::new(config)?;
//!     let report = pipeline.run(reporter.as_mut()).await?;
//!
//!     println!("{} of {} saved", report.summary.saved, report.summary.total);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Environment snapshot providers
pub mod environment;
/// Error types
pub mod error;
/// URL fetching
pub mod fetch;
/// Per-target pipeline orchestration
pub mod pipeline;
/// Output directory preparation
pub mod prepare;
/// Report rendering (text, HTML, JSON)
pub mod report;
/// Writing images to disk
pub mod save;
/// MIME sniffing and content validation
pub mod sniff;
/// Core types
pub mod types;
/// Helper functions
pub mod utils;

pub use config::{Config, FetchConfig, ReportConfig, ReportFormat, SaveConfig};
pub use environment::{EnvironmentProvider, FixedEnvironment, HostEnvironment};
pub use error::{Error, FetchError, FetchErrorKind, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use pipeline::Pipeline;
pub use report::Reporter;
pub use types::{
    DirectoryStatus, DownloadTarget, EnvironmentSnapshot, FetchResult, RunReport, RunSummary,
    SaveFailure, SaveResult, SavedFile, TargetOutcome, TargetReport, ValidationResult,
};
