//! Utility functions for formatting and filesystem inspection

use std::path::Path;

/// Units used by [`human_filesize`]
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with a binary unit and two decimals
///
/// The unit is picked from the number of decimal digits in `bytes` (one step
/// per three digits) and the value is divided by the matching power of 1024.
///
/// # Examples
///
/// ```
/// use imgprobe::utils::human_filesize;
///
/// assert_eq!(human_filesize(512), "512.00 B");
/// assert_eq!(human_filesize(1024), "1.00 KB");
/// assert_eq!(human_filesize(1_572_864), "1.50 MB");
/// ```
#[must_use]
pub fn human_filesize(bytes: u64) -> String {
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{:.2} {}", value, SIZE_UNITS[factor])
}

/// Format an integer with comma thousands separators
///
/// # Examples
///
/// ```
/// use imgprobe::utils::format_number;
///
/// assert_eq!(format_number(0), "0");
/// assert_eq!(format_number(1024), "1,024");
/// assert_eq!(format_number(12_345_678), "12,345,678");
/// ```
#[must_use]
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Round a millisecond value to two decimals
#[must_use]
pub fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

/// Check whether the current process may write into `path`
///
/// Uses `access(2)` with `W_OK` on unix so effective permissions (including
/// root) are taken into account. Elsewhere the read-only attribute is used.
/// A path that does not exist is never writable.
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            return false;
        };

        // SAFETY: c_path is a valid, null-terminated C string that outlives the call
        unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
    }

    #[cfg(not(unix))]
    {
        std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }
}

/// Permission bits of `path` as four octal digits (e.g. `0755`)
///
/// Returns `None` when the path cannot be inspected or on platforms without
/// unix permission bits.
pub fn permissions_octal(path: &Path) -> Option<String> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = std::fs::metadata(path).ok()?.permissions().mode();
        Some(format!("{:04o}", mode & 0o7777))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Name of the user the process runs as
///
/// Taken from `USER` or `USERNAME`; on unix it falls back to the effective
/// uid, elsewhere to `"unknown"`.
pub fn current_user() -> String {
    for var in ["USER", "USERNAME"] {
        if let Ok(name) = std::env::var(var)
            && !name.trim().is_empty()
        {
            return name;
        }
    }

    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail
        let uid = unsafe { libc::geteuid() };
        format!("uid {}", uid)
    }

    #[cfg(not(unix))]
    {
        "unknown".to_string()
    }
}

/// Get available disk space for a given path
///
/// Uses platform-specific APIs to query filesystem statistics:
/// - Linux: statvfs
/// - macOS: statvfs
/// - Windows: GetDiskFreeSpaceExW
///
/// # Arguments
///
/// * `path` - The path to check (typically the output directory)
///
/// # Returns
///
/// Returns the available disk space in bytes, or an IO error if the check fails.
pub fn get_available_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: This is safe because:
        // 1. c_path is a valid, null-terminated C string created from the input path
        // 2. stat is properly initialized with zeroed memory before the call
        // 3. We check the return value and propagate any OS errors
        // 4. The statvfs struct is only read after a successful call
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // f_bavail is available blocks for unprivileged users
            #[allow(clippy::unnecessary_cast)]
            let available_bytes = (stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64);
            Ok(available_bytes)
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: This is safe because:
        // 1. wide_path is a valid, null-terminated wide string
        // 2. All output pointers point to valid, properly aligned u64 variables
        // 3. We check the return value and propagate any OS errors
        unsafe {
            let mut free_bytes_available: u64 = 0;
            let mut _total_bytes: u64 = 0;
            let mut _total_free_bytes: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut free_bytes_available as *mut u64 as *mut _,
                &mut _total_bytes as *mut u64 as *mut _,
                &mut _total_free_bytes as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(free_bytes_available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = path;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "Disk space checking is not supported on this platform",
        ))
    }
}
