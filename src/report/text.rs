//! Plain-text report for consoles.

use super::{
    REPORT_TITLE, Reporter, Row, directory_rows, environment_rows, summary_rows, target_rows,
};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::types::{DirectoryStatus, EnvironmentSnapshot, RunReport, TargetReport};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Renders `key : value` lines with padded keys and dashed separators
pub struct TextReporter<W> {
    out: W,
    key_width: usize,
    rule_width: usize,
}

impl<W: Write> TextReporter<W> {
    /// Create a text reporter using the layout from `config`
    pub fn new(out: W, config: &ReportConfig) -> Self {
        Self {
            out,
            key_width: config.key_width,
            rule_width: config.rule_width,
        }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn rule(&mut self, ch: char) -> Result<()> {
        let rule = ch.to_string().repeat(self.rule_width);
        self.line(&rule)
    }

    fn rows(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            match row {
                Row::Field { key, value } => {
                    writeln!(self.out, "{:<width$} : {}", key, value, width = self.key_width)?;
                }
                Row::Note(text) => {
                    self.line("")?;
                    self.line(text)?;
                }
                Row::Snippet(snippet) => {
                    self.line(snippet)?;
                }
                Row::Image { .. } => {}
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn begin(&mut self, started_at: DateTime<Utc>, directory: &DirectoryStatus) -> Result<()> {
        self.rule('=')?;
        self.line(&format!("{} (plain text)", REPORT_TITLE))?;
        self.line(&format!("Started {}", started_at.format("%Y-%m-%d %H:%M:%S UTC")))?;
        self.rule('=')?;
        self.line("")?;
        self.rows(&directory_rows(directory))?;
        self.line("")?;
        self.rule('-')?;
        self.out.flush()?;
        Ok(())
    }

    fn target(&mut self, report: &TargetReport) -> Result<()> {
        self.line(&format!("Test #{}", report.target.index))?;
        self.rule('-')?;
        self.rows(&target_rows(report))?;
        self.line("")?;
        self.rule('-')?;
        self.line("")?;
        self.out.flush()?;
        Ok(())
    }

    fn environment(&mut self, snapshot: &EnvironmentSnapshot) -> Result<()> {
        self.line("System information:")?;
        self.rule('-')?;
        self.rows(&environment_rows(snapshot))?;
        self.rule('-')?;
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        self.line("Test result:")?;
        self.rows(&summary_rows(report))?;
        self.line("")?;
        self.rule('=')?;
        self.out.flush()?;
        Ok(())
    }
}
