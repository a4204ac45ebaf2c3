//! Download, validate, save and report pipeline
//!
//! For every configured target, in order:
//! 1. Fetch - download the URL (capped by the run's time budget)
//! 2. Validate - sniff the MIME type from the bytes
//! 3. Save - write accepted images and re-check them on disk
//! 4. Report - hand the [`TargetReport`] to the reporter
//!
//! A failure at any step ends that target only. The run itself fails only on
//! report-stream errors.

use crate::config::Config;
use crate::environment::{EnvironmentProvider, HostEnvironment, resolve_document_root};
use crate::error::{Error, FetchError, FetchErrorKind, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::prepare::prepare_directory;
use crate::report::Reporter;
use crate::save::{SaveOptions, save_image};
use crate::sniff::{SNIPPET_LEN, printable_snippet, validate};
use crate::types::{
    DownloadTarget, FetchResult, RunReport, RunSummary, SaveResult, TargetOutcome, TargetReport,
};
use crate::utils::round_ms;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runs every configured target through the pipeline
pub struct Pipeline {
    /// Validated run configuration
    config: Arc<Config>,
    /// Downloads target URLs
    fetcher: Arc<dyn Fetcher>,
    /// Supplies the environment block at the end of the run
    environment: Arc<dyn EnvironmentProvider>,
}

impl Pipeline {
    /// Create a pipeline with the HTTP fetcher and the host environment
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        let environment = HostEnvironment::new(&config);
        Ok(Self::with_parts(
            Arc::new(config),
            Arc::new(fetcher),
            Arc::new(environment),
        ))
    }

    /// Create a pipeline from explicit parts
    pub fn with_parts(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        environment: Arc<dyn EnvironmentProvider>,
    ) -> Self {
        Self {
            config,
            fetcher,
            environment,
        }
    }

    /// Configuration this pipeline runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every target and feed the results to `reporter`
    ///
    /// # Errors
    ///
    /// Only errors returned by the reporter abort the run. Per-target
    /// failures are recorded in the returned [`RunReport`].
    pub async fn run(&self, reporter: &mut dyn Reporter) -> Result<RunReport> {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();

        info!(
            fetcher = self.fetcher.name(),
            targets = self.config.urls.len(),
            output_dir = %self.config.output_dir.display(),
            "starting run"
        );

        let directory = prepare_directory(&self.config.output_dir);
        reporter
            .begin(started_at, &directory)
            .map_err(reporting("begin"))?;

        let mut targets = Vec::with_capacity(self.config.urls.len());
        for target in self.config.targets() {
            let timeout_cap = match self.remaining_budget(clock) {
                Budget::Unlimited => None,
                Budget::Remaining(left) => Some(left),
                Budget::Spent => {
                    let report = budget_spent(target);
                    reporter.target(&report).map_err(reporting("target"))?;
                    targets.push(report);
                    continue;
                }
            };

            let report = self.process(target, timeout_cap).await;
            reporter.target(&report).map_err(reporting("target"))?;
            targets.push(report);
        }

        let environment = self.environment.snapshot();
        reporter
            .environment(&environment)
            .map_err(reporting("environment"))?;

        let summary = RunSummary::from_reports(&targets);
        info!(
            total = summary.total,
            saved = summary.saved,
            failed = summary.failed(),
            "run finished"
        );

        let report = RunReport {
            started_at,
            directory,
            targets,
            environment,
            summary,
        };
        reporter.finish(&report).map_err(reporting("summary"))?;
        Ok(report)
    }

    /// Fetch, validate and save one target
    async fn process(
        &self,
        target: DownloadTarget,
        timeout_cap: Option<Duration>,
    ) -> TargetReport {
        debug!(index = target.index, url = %target.source_url, "processing target");

        let FetchResult {
            elapsed_ms,
            outcome,
        } = self.fetcher.fetch(&target.source_url, timeout_cap).await;
        let elapsed_ms = round_ms(elapsed_ms);

        let body = match outcome {
            Ok(body) => body,
            Err(error) => {
                warn!(index = target.index, error = %error, "download failed");
                return TargetReport {
                    target,
                    elapsed_ms,
                    size_bytes: None,
                    outcome: TargetOutcome::FetchFailed { error },
                };
            }
        };
        let size_bytes = Some(body.len() as u64);

        let validation = validate(&body);
        if !validation.is_image {
            info!(
                index = target.index,
                mime = %validation.mime_type,
                "response is not an image"
            );
            return TargetReport {
                target,
                elapsed_ms,
                size_bytes,
                outcome: TargetOutcome::NotImage {
                    validation,
                    snippet: printable_snippet(&body, SNIPPET_LEN),
                },
            };
        }

        let document_root = resolve_document_root(self.config.document_root.as_deref());
        let options = SaveOptions {
            max_file_bytes: self.config.save.max_file_bytes,
            document_root: document_root.as_deref(),
        };
        let outcome = match save_image(&target.destination_path, &body, &options).await {
            SaveResult::Saved(saved) => {
                info!(
                    index = target.index,
                    path = %saved.full_path.display(),
                    bytes = saved.bytes_written,
                    sizes_match = saved.sizes_match,
                    "image saved"
                );
                TargetOutcome::Saved { validation, saved }
            }
            SaveResult::Failed(failure) => {
                warn!(
                    index = target.index,
                    path = %failure.full_path.display(),
                    error = %failure.error,
                    "image could not be saved"
                );
                TargetOutcome::SaveFailed {
                    validation,
                    failure,
                }
            }
        };

        TargetReport {
            target,
            elapsed_ms,
            size_bytes,
            outcome,
        }
    }

    fn remaining_budget(&self, clock: Instant) -> Budget {
        match self.config.max_execution_time {
            None => Budget::Unlimited,
            Some(limit) => match limit.checked_sub(clock.elapsed()) {
                Some(left) if !left.is_zero() => Budget::Remaining(left),
                _ => Budget::Spent,
            },
        }
    }
}

/// Time left for the rest of the run
enum Budget {
    Unlimited,
    Remaining(Duration),
    Spent,
}

/// Turn an I/O failure on the report stream into [`Error::Report`]
fn reporting(section: &'static str) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Io(io) => Error::Report(format!("cannot write {section} section: {io}")),
        other => other,
    }
}

fn budget_spent(target: DownloadTarget) -> TargetReport {
    warn!(index = target.index, "time budget spent, skipping download");
    TargetReport {
        target,
        elapsed_ms: 0.0,
        size_bytes: None,
        outcome: TargetOutcome::FetchFailed {
            error: FetchError::new(
                FetchErrorKind::Timeout,
                "maximum execution time reached before the download started",
            ),
        },
    }
}
