//! Environment snapshot reported at the end of a run.

use crate::config::Config;
use crate::types::EnvironmentSnapshot;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no document root is configured
pub const DOCUMENT_ROOT_ENV: &str = "DOCUMENT_ROOT";

/// Source of the [`EnvironmentSnapshot`]
///
/// The pipeline asks for the snapshot once, after every target has been
/// processed. Tests substitute [`FixedEnvironment`] to keep reports stable.
pub trait EnvironmentProvider: Send + Sync {
    /// Take the snapshot
    fn snapshot(&self) -> EnvironmentSnapshot;
}

/// Reads the snapshot from the configuration and the running process
#[derive(Clone, Debug)]
pub struct HostEnvironment {
    allow_remote_fetch: bool,
    max_execution_seconds: Option<u64>,
    memory_limit: Option<u64>,
    upload_max_size: Option<u64>,
    document_root: Option<PathBuf>,
}

impl HostEnvironment {
    /// Capture the limits that come from `config`
    pub fn new(config: &Config) -> Self {
        Self {
            allow_remote_fetch: config.fetch.allow_remote,
            max_execution_seconds: config.max_execution_time.map(|d| d.as_secs()),
            memory_limit: config.fetch.max_response_bytes,
            upload_max_size: config.save.max_file_bytes,
            document_root: config.document_root.clone(),
        }
    }
}

impl EnvironmentProvider for HostEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        let working_directory = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read current directory");
            PathBuf::new()
        });

        let document_root = resolve_document_root(self.document_root.as_deref());

        EnvironmentSnapshot {
            runtime_version: runtime_version(),
            allow_remote_fetch: self.allow_remote_fetch,
            max_execution_seconds: self.max_execution_seconds,
            memory_limit: self.memory_limit,
            upload_max_size: self.upload_max_size,
            working_directory,
            document_root,
        }
    }
}

/// A snapshot decided up front
#[derive(Clone, Debug)]
pub struct FixedEnvironment(pub EnvironmentSnapshot);

impl EnvironmentProvider for FixedEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        self.0.clone()
    }
}

/// Document root from configuration, falling back to `DOCUMENT_ROOT`
pub fn resolve_document_root(configured: Option<&Path>) -> Option<PathBuf> {
    configured.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(DOCUMENT_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Program name, version and target platform
pub fn runtime_version() -> String {
    format!(
        "{} {} ({}-{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, SaveConfig};
    use std::time::Duration;

    #[test]
    fn host_snapshot_reflects_config_limits() {
        let config = Config {
            max_execution_time: Some(Duration::from_secs(120)),
            document_root: Some(PathBuf::from("/srv/www")),
            fetch: FetchConfig {
                allow_remote: false,
                max_response_bytes: Some(8 * 1024 * 1024),
                ..Default::default()
            },
            save: SaveConfig {
                max_file_bytes: Some(2 * 1024 * 1024),
            },
            ..Default::default()
        };

        let snapshot = HostEnvironment::new(&config).snapshot();

        assert!(!snapshot.allow_remote_fetch);
        assert_eq!(snapshot.max_execution_seconds, Some(120));
        assert_eq!(snapshot.memory_limit, Some(8 * 1024 * 1024));
        assert_eq!(snapshot.upload_max_size, Some(2 * 1024 * 1024));
        assert_eq!(snapshot.document_root, Some(PathBuf::from("/srv/www")));
        assert_eq!(snapshot.working_directory, std::env::current_dir().unwrap());
        assert!(snapshot.runtime_version.starts_with("imgprobe "));
    }

    #[test]
    fn default_config_has_no_limits() {
        let snapshot = HostEnvironment::new(&Config::default()).snapshot();

        assert!(snapshot.allow_remote_fetch);
        assert_eq!(snapshot.max_execution_seconds, None);
        assert_eq!(snapshot.memory_limit, None);
        assert_eq!(snapshot.upload_max_size, None);
    }

    #[test]
    fn fixed_environment_returns_its_snapshot() {
        let snapshot = EnvironmentSnapshot {
            runtime_version: "test 0.0.0".into(),
            allow_remote_fetch: true,
            max_execution_seconds: None,
            memory_limit: None,
            upload_max_size: None,
            working_directory: PathBuf::from("/work"),
            document_root: None,
        };

        assert_eq!(FixedEnvironment(snapshot.clone()).snapshot(), snapshot);
    }
}
