//! Output directory preparation and diagnostics.

use crate::types::DirectoryStatus;
use crate::utils::{current_user, get_available_space, is_writable, permissions_octal};
use std::path::Path;

/// Mode applied to directories created for the run
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Make sure `path` exists and describe it
///
/// Creates the directory (and missing parents) when absent. A failure to
/// create it is recorded in the returned status and does not stop the run;
/// each later write then fails and is reported on its own.
pub fn prepare_directory(path: &Path) -> DirectoryStatus {
    let existed = path.is_dir();
    let mut created = false;
    let mut creation_error = None;

    if !existed {
        match create_dir(path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "created output directory");
                created = true;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not create output directory");
                creation_error = Some(e.to_string());
            }
        }
    }

    let status = DirectoryStatus {
        path: path.to_path_buf(),
        existed,
        created,
        creation_error,
        writable: is_writable(path),
        permissions: permissions_octal(path),
        user: current_user(),
        available_space: get_available_space(path).ok(),
    };

    tracing::debug!(
        path = %status.path.display(),
        writable = status.writable,
        permissions = ?status.permissions,
        "output directory prepared"
    );

    status
}

fn create_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }

    builder.create(path)
}
