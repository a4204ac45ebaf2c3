//! Report rendering
//!
//! The pipeline produces structured records and hands them to a [`Reporter`]
//! as it goes. The text and HTML reporters share one description of what a
//! report contains (the `*_rows` functions below) and differ only in
//! markup; the JSON reporter serializes the finished [`RunReport`].

mod html;
mod json;
mod text;

pub use html::HtmlReporter;
pub use json::JsonReporter;
pub use text::TextReporter;

use crate::config::{ReportConfig, ReportFormat};
use crate::error::Result;
use crate::sniff::SNIPPET_LEN;
use crate::types::{
    DirectoryStatus, EnvironmentSnapshot, RunReport, TargetOutcome, TargetReport,
};
use crate::utils::{format_number, human_filesize};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Title printed at the top of human-readable reports
pub const REPORT_TITLE: &str = "Image download and save test";

/// Consumer of pipeline records
///
/// Methods are called in order: `begin` once, `target` once per target in
/// input order, `environment` once, `finish` once.
pub trait Reporter {
    /// Start of the run, after the output directory was prepared
    fn begin(&mut self, started_at: DateTime<Utc>, directory: &DirectoryStatus) -> Result<()>;

    /// One target reached its final state
    fn target(&mut self, report: &TargetReport) -> Result<()>;

    /// Environment snapshot, after all targets
    fn environment(&mut self, snapshot: &EnvironmentSnapshot) -> Result<()>;

    /// The complete run
    fn finish(&mut self, report: &RunReport) -> Result<()>;
}

/// Build the reporter for `config.format` writing to `out`
pub fn reporter_for<W>(config: &ReportConfig, out: W) -> Box<dyn Reporter>
where
    W: Write + 'static,
{
    match config.format {
        ReportFormat::Text => Box::new(TextReporter::new(out, config)),
        ReportFormat::Html => Box::new(HtmlReporter::new(out)),
        ReportFormat::Json => Box::new(JsonReporter::new(out)),
    }
}

/// One line of a human-readable report
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Row {
    /// `key : value`
    Field { key: &'static str, value: String },
    /// Free text
    Note(String),
    /// Diagnostic payload preview
    Snippet(String),
    /// Preview of a saved image (rendered by HTML only)
    Image { src: String, alt: String },
}

impl Row {
    fn field(key: &'static str, value: impl Into<String>) -> Self {
        Row::Field {
            key,
            value: value.into(),
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn limit_bytes(limit: Option<u64>) -> String {
    match limit {
        Some(bytes) => human_filesize(bytes),
        None => "unlimited".to_string(),
    }
}

pub(crate) fn directory_rows(dir: &DirectoryStatus) -> Vec<Row> {
    let path = dir.path.display().to_string();
    let mut rows = Vec::new();

    if dir.created {
        rows.push(Row::field("Directory created", path));
    } else if let Some(err) = &dir.creation_error {
        rows.push(Row::field("Could not create directory", path));
        rows.push(Row::field("Error", err.clone()));
    } else {
        rows.push(Row::field("Directory", path));
    }

    rows.push(Row::field("Writable", yes_no(dir.writable)));
    rows.push(Row::field(
        "Permissions (octal)",
        dir.permissions.clone().unwrap_or_else(|| "n/a".to_string()),
    ));
    rows.push(Row::field("Current user", dir.user.clone()));
    rows.push(Row::field(
        "Available space",
        dir.available_space
            .map(human_filesize)
            .unwrap_or_else(|| "unknown".to_string()),
    ));
    rows
}

pub(crate) fn target_rows(report: &TargetReport) -> Vec<Row> {
    let mut rows = vec![Row::field("Source", report.target.source_url.clone())];

    let validation = match &report.outcome {
        TargetOutcome::FetchFailed { error } => {
            rows.push(Row::field("Download", "FAILED"));
            rows.push(Row::field("Error", error.message.clone()));
            return rows;
        }
        TargetOutcome::NotImage { validation, .. }
        | TargetOutcome::Saved { validation, .. }
        | TargetOutcome::SaveFailed { validation, .. } => validation,
    };

    let size = report.size_bytes.unwrap_or(0);
    rows.push(Row::field("Download", "OK"));
    rows.push(Row::field("Size (bytes)", format_number(size)));
    rows.push(Row::field("Size (human)", human_filesize(size)));
    rows.push(Row::field(
        "Download time",
        format!("{:.2} ms", report.elapsed_ms),
    ));
    rows.push(Row::field("MIME", validation.mime_type.clone()));
    rows.push(Row::field("Is image", yes_no(validation.is_image)));

    match &report.outcome {
        TargetOutcome::FetchFailed { .. } => {}
        TargetOutcome::NotImage { snippet, .. } => {
            rows.push(Row::Note(format!(
                "First {} bytes of the response (not an image):",
                SNIPPET_LEN
            )));
            rows.push(Row::Snippet(snippet.clone()));
        }
        TargetOutcome::Saved { saved, .. } => {
            rows.push(Row::field("Bytes saved", format_number(saved.bytes_written)));
            rows.push(Row::field("File exists", yes_no(saved.path_exists)));
            rows.push(Row::field("Size on disk", format_number(saved.disk_size)));
            rows.push(Row::field("Sizes match", yes_no(saved.sizes_match)));
            rows.push(Row::field("Full path", saved.full_path.display().to_string()));
            if let Some(web_path) = &saved.web_path {
                rows.push(Row::field("Suggested web path", web_path.clone()));
                rows.push(Row::Image {
                    src: web_path.clone(),
                    alt: format!("Test image #{}", report.target.index),
                });
            }
        }
        TargetOutcome::SaveFailed { failure, .. } => {
            rows.push(Row::field("Save", "FAILED"));
            rows.push(Row::field("Error", failure.error.clone()));
            rows.push(Row::field("Directory exists", yes_no(failure.dir_exists)));
            rows.push(Row::field("Directory writable", yes_no(failure.dir_writable)));
            rows.push(Row::field("Full path", failure.full_path.display().to_string()));
        }
    }

    rows
}

pub(crate) fn environment_rows(env: &EnvironmentSnapshot) -> Vec<Row> {
    vec![
        Row::field("Runtime version", env.runtime_version.clone()),
        Row::field("Remote fetch", on_off(env.allow_remote_fetch)),
        Row::field(
            "Max execution time",
            match env.max_execution_seconds {
                Some(secs) => format!("{} sec", secs),
                None => "unlimited".to_string(),
            },
        ),
        Row::field("Memory limit", limit_bytes(env.memory_limit)),
        Row::field("Upload max size", limit_bytes(env.upload_max_size)),
        Row::field(
            "Working directory",
            env.working_directory.display().to_string(),
        ),
        Row::field(
            "DOCUMENT_ROOT",
            env.document_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string()),
        ),
    ]
}

pub(crate) fn summary_rows(report: &RunReport) -> Vec<Row> {
    let summary = &report.summary;
    vec![
        Row::field("Check directory", report.directory.path.display().to_string()),
        Row::field(
            "Saved",
            format!("{} of {}", summary.saved, summary.total),
        ),
        Row::field("Download failed", summary.fetch_failed.to_string()),
        Row::field("Not an image", summary.not_image.to_string()),
        Row::field("Save failed", summary.save_failed.to_string()),
        Row::Note("If the files were saved, writing images to disk works.".to_string()),
    ]
}
