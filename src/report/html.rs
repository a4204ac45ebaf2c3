//! HTML fragment report for browsers.

use super::{
    REPORT_TITLE, Reporter, Row, directory_rows, environment_rows, summary_rows, target_rows,
};
use crate::error::Result;
use crate::types::{DirectoryStatus, EnvironmentSnapshot, RunReport, TargetReport};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Renders the report as an HTML fragment (no `<html>`/`<body>` wrapper)
///
/// Every value is escaped. Saved images that have a web path get an
/// `<img>` preview.
pub struct HtmlReporter<W> {
    out: W,
}

impl<W: Write> HtmlReporter<W> {
    /// Create an HTML reporter
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn rows(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            match row {
                Row::Field { key, value } => {
                    writeln!(
                        self.out,
                        "<strong>{}:</strong> {}<br>",
                        escape(key),
                        escape(value)
                    )?;
                }
                Row::Note(text) => {
                    writeln!(self.out, "<p>{}</p>", escape(text))?;
                }
                Row::Snippet(snippet) => {
                    writeln!(self.out, "<pre>{}</pre>", escape(snippet))?;
                }
                Row::Image { src, alt } => {
                    writeln!(
                        self.out,
                        "<img src=\"{}\" alt=\"{}\" style=\"max-width: 300px;\"><br>",
                        escape(src),
                        escape(alt)
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for HtmlReporter<W> {
    fn begin(&mut self, started_at: DateTime<Utc>, directory: &DirectoryStatus) -> Result<()> {
        writeln!(self.out, "<h2>{}</h2>", escape(REPORT_TITLE))?;
        writeln!(
            self.out,
            "<p>Started {}</p>",
            started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        self.rows(&directory_rows(directory))?;
        writeln!(self.out, "<hr>")?;
        self.out.flush()?;
        Ok(())
    }

    fn target(&mut self, report: &TargetReport) -> Result<()> {
        writeln!(self.out, "<h3>Test #{}</h3>", report.target.index)?;
        self.rows(&target_rows(report))?;
        writeln!(self.out, "<hr>")?;
        self.out.flush()?;
        Ok(())
    }

    fn environment(&mut self, snapshot: &EnvironmentSnapshot) -> Result<()> {
        writeln!(self.out, "<h3>System information</h3>")?;
        self.rows(&environment_rows(snapshot))?;
        writeln!(self.out, "<hr>")?;
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> Result<()> {
        writeln!(self.out, "<h3>Test result</h3>")?;
        self.rows(&summary_rows(report))?;
        self.out.flush()?;
        Ok(())
    }
}

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{
        directory, environment, failed_report, not_image_report, run_report, saved_report,
    };

    fn render(targets: Vec<TargetReport>) -> String {
        let report = run_report(targets);
        let mut reporter = HtmlReporter::new(Vec::new());
        reporter.begin(report.started_at, &directory()).unwrap();
        for target in &report.targets {
            reporter.target(target).unwrap();
        }
        reporter.environment(&environment()).unwrap();
        reporter.finish(&report).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn fields_use_line_break_markup() {
        let out = render(vec![failed_report(1)]);
        assert!(out.contains("<strong>Download:</strong> FAILED<br>"));
        assert!(out.contains("<h3>Test #1</h3>"));
    }

    #[test]
    fn snippet_is_escaped_inside_pre() {
        let out = render(vec![not_image_report(1, "<script>alert(1)</script>")]);
        assert!(out.contains("<pre>&lt;script&gt;alert(1)&lt;/script&gt;</pre>"));
        assert!(!out.contains("<script>"));
    }

    #[test]
    fn saved_image_under_document_root_gets_img_tag() {
        let out = render(vec![saved_report(3, Some("/test_images/test_image_3.jpg"))]);
        assert!(out.contains(
            "<img src=\"/test_images/test_image_3.jpg\" alt=\"Test image #3\" style=\"max-width: 300px;\"><br>"
        ));
    }

    #[test]
    fn saved_image_without_web_path_has_no_img_tag() {
        let out = render(vec![saved_report(1, None)]);
        assert!(!out.contains("<img"));
    }
}
