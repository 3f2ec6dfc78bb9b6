// ─── Platform ───
// Target naming as used by the patch CDN, the runtime manifest and the
// patch tool distribution.

use std::path::Path;

use crate::core::error::{LauncherError, LauncherResult};

/// Operating system key: `windows`, `linux` or `darwin`.
pub fn platform_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "windows",
        "linux" => "linux",
        "macos" => "darwin",
        _ => "linux",
    }
}

/// Architecture key: `amd64` or `arm64`. Anything else maps to `amd64`.
pub fn platform_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        _ => "amd64",
    }
}

pub fn is_windows() -> bool {
    cfg!(target_os = "windows")
}

/// Append the platform executable suffix to a bare program name.
pub fn executable_name(base: &str) -> String {
    if is_windows() {
        format!("{base}.exe")
    } else {
        base.to_string()
    }
}

/// Set `0o755` on Unix; no-op elsewhere.
pub fn mark_executable(path: &Path) -> LauncherResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)
            .map_err(|e| LauncherError::io(path, e))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).map_err(|e| LauncherError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
