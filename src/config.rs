//! Configuration types for imgprobe

use crate::error::{Error, Result};
use crate::types::DownloadTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sample URLs probed when no other list is configured
pub const DEFAULT_URLS: &[&str] = &[
    "https://picsum.photos/200/300",
    "https://niala.com.ua/image/catalog/kb-a4f-btp2.jpg",
    "https://niala.com.ua/image/catalog/prod/kiborg/zymovyi-maskuvalnyi-vodovidshtokhuvalnyi-taktychnyi-kostium-kiborg-multicam-alpine-29735080882236_+8d12af5aa9.jpg",
];

/// HTTP fetch settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whether remote (http/https) URLs may be fetched at all (default: true)
    #[serde(default = "default_true")]
    pub allow_remote: bool,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest response body accepted, in bytes (None = unlimited)
    #[serde(default)]
    pub max_response_bytes: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            allow_remote: true,
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_response_bytes: None,
        }
    }
}

/// File save settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Largest file that will be written, in bytes (None = unlimited)
    #[serde(default)]
    pub max_file_bytes: Option<u64>,
}

/// Report output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text for consoles
    #[default]
    Text,
    /// HTML fragment for browsers
    Html,
    /// Single JSON document
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportFormat::Text => "text",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "txt" => Ok(ReportFormat::Text),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            other => Err(Error::config(
                "report.format",
                format!("unknown report format '{other}' (expected text, html or json)"),
            )),
        }
    }
}

/// Report layout settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format (default: text)
    #[serde(default)]
    pub format: ReportFormat,

    /// Column width keys are padded to (default: 28)
    #[serde(default = "default_key_width")]
    pub key_width: usize,

    /// Length of separator lines (default: 72)
    #[serde(default = "default_rule_width")]
    pub rule_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            key_width: default_key_width(),
            rule_width: default_rule_width(),
        }
    }
}

/// Main configuration for a probe run
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration that probes [`DEFAULT_URLS`] into `./test_images`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URLs to probe, in report order
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Directory the images are written to (default: "test_images")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix, followed by the 1-based index (default: "test_image_")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// File extension without the dot (default: "jpg")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Web server document root used to derive public paths for saved files
    #[serde(default)]
    pub document_root: Option<PathBuf>,

    /// Time budget for the whole run (None = unlimited)
    #[serde(default, with = "optional_duration_serde")]
    pub max_execution_time: Option<Duration>,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// File save settings
    #[serde(default)]
    pub save: SaveConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            file_extension: default_file_extension(),
            document_root: None,
            max_execution_time: None,
            fetch: FetchConfig::default(),
            save: SaveConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. The result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(Error::config("urls", "at least one URL is required"));
        }
        if let Some(blank) = self.urls.iter().position(|u| u.trim().is_empty()) {
            return Err(Error::config(
                "urls",
                format!("URL #{} is empty", blank + 1),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output_dir", "output directory is empty"));
        }
        if self.file_prefix.contains(['/', '\\']) || self.file_extension.contains(['/', '\\']) {
            return Err(Error::config(
                "file_prefix",
                "file prefix and extension must not contain path separators",
            ));
        }
        if self.fetch.timeout.is_zero() {
            return Err(Error::config("fetch.timeout", "timeout must be non-zero"));
        }
        if self.max_execution_time.is_some_and(|d| d.is_zero()) {
            return Err(Error::config(
                "max_execution_time",
                "time budget must be non-zero when set",
            ));
        }
        if self.report.key_width == 0 {
            return Err(Error::config(
                "report.key_width",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// File name used for the target with the given 1-based index
    pub fn file_name(&self, index: usize) -> String {
        if self.file_extension.is_empty() {
            format!("{}{}", self.file_prefix, index)
        } else {
            format!("{}{}.{}", self.file_prefix, index, self.file_extension)
        }
    }

    /// Build the ordered download targets
    pub fn targets(&self) -> Vec<DownloadTarget> {
        self.urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let index = i + 1;
                DownloadTarget {
                    source_url: url.clone(),
                    destination_path: self.output_dir.join(self.file_name(index)),
                    index,
                }
            })
            .collect()
    }
}

fn default_urls() -> Vec<String> {
    DEFAULT_URLS.iter().map(|u| u.to_string()).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("test_images")
}

fn default_file_prefix() -> String {
    "test_image_".to_string()
}

fn default_file_extension() -> String {
    "jpg".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_key_width() -> usize {
    28
}

fn default_rule_width() -> usize {
    72
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.urls.len(), DEFAULT_URLS.len());
        assert_eq!(config.output_dir, PathBuf::from("test_images"));
        assert_eq!(config.report.key_width, 28);
        assert_eq!(config.report.rule_width, 72);
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
        assert!(config.fetch.allow_remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn durations_are_whole_seconds() {
        let json = r#"{"max_execution_time": 90, "fetch": {"timeout": 5}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_execution_time, Some(Duration::from_secs(90)));
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["max_execution_time"], 90);
        assert_eq!(value["fetch"]["timeout"], 5);
    }

    #[test]
    fn report_format_parses_case_insensitively() {
        assert_eq!("HTML".parse::<ReportFormat>().unwrap(), ReportFormat::Html);
        assert_eq!("plain".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert_eq!(" json ".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Html.to_string(), "html");
    }

    #[test]
    fn targets_follow_url_order_with_one_based_names() {
        let config = Config {
            urls: vec!["http://a/1".into(), "http://b/2".into()],
            output_dir: PathBuf::from("out"),
            ..Default::default()
        };

        let targets = config.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].index, 1);
        assert_eq!(targets[0].source_url, "http://a/1");
        assert_eq!(
            targets[0].destination_path,
            PathBuf::from("out").join("test_image_1.jpg")
        );
        assert_eq!(targets[1].index, 2);
        assert_eq!(
            targets[1].destination_path,
            PathBuf::from("out").join("test_image_2.jpg")
        );
    }

    #[test]
    fn file_name_without_extension() {
        let config = Config {
            file_extension: String::new(),
            ..Default::default()
        };
        assert_eq!(config.file_name(3), "test_image_3");
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let cases: Vec<(Config, &str)> = vec![
            (
                Config {
                    urls: vec![],
                    ..Default::default()
                },
                "urls",
            ),
            (
                Config {
                    urls: vec!["http://ok".into(), "  ".into()],
                    ..Default::default()
                },
                "urls",
            ),
            (
                Config {
                    output_dir: PathBuf::new(),
                    ..Default::default()
                },
                "output_dir",
            ),
            (
                Config {
                    file_prefix: "../evil".into(),
                    ..Default::default()
                },
                "file_prefix",
            ),
            (
                Config {
                    fetch: FetchConfig {
                        timeout: Duration::ZERO,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                "fetch.timeout",
            ),
            (
                Config {
                    max_execution_time: Some(Duration::ZERO),
                    ..Default::default()
                },
                "max_execution_time",
            ),
            (
                Config {
                    report: ReportConfig {
                        key_width: 0,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                "report.key_width",
            ),
        ];

        for (config, expected_key) in cases {
            match config.validate() {
                Err(Error::Config { key, .. }) => {
                    assert_eq!(key.as_deref(), Some(expected_key));
                }
                other => panic!("expected config error for {expected_key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_json_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.json");
        std::fs::write(
            &path,
            r#"{"urls": ["http://example.com/a.png"], "report": {"format": "html"}}"#,
        )
        .unwrap();

        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.urls, vec!["http://example.com/a.png".to_string()]);
        assert_eq!(config.report.format, ReportFormat::Html);

        std::fs::write(&path, r#"{"urls": []}"#).unwrap();
        assert!(Config::from_json_file(&path).is_err());

        let missing = Config::from_json_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Config { key: None, .. })));
    }
}
