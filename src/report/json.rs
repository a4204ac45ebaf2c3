//! JSON report for machines.

use super::Reporter;
use crate::error::Result;
use crate::types::{DirectoryStatus, EnvironmentSnapshot, RunReport, TargetReport};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Writes the finished [`RunReport`] as one pretty-printed JSON document
///
/// Nothing is written until [`Reporter::finish`], so the output is always a
/// complete document.
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    /// Create a JSON reporter
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn begin(&mut self, _started_at: DateTime<Utc>, _directory: &DirectoryStatus) -> Result<()> {
        Ok(())
    }

    fn target(&mut self, _report: &TargetReport) -> Result<()> {
        Ok(())
    }

    fn environment(&mut self, _snapshot: &EnvironmentSnapshot) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
