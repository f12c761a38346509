//! Blender executable detection.

use std::path::{Path, PathBuf};

/// Returns platform-specific default Blender installation paths.
fn default_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let mut paths = vec![PathBuf::from(
            "/Applications/Blender.app/Contents/MacOS/Blender",
        )];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("Applications/Blender.app/Contents/MacOS/Blender"));
        }

        paths
    }

    #[cfg(target_os = "windows")]
    {
        let foundation = PathBuf::from(r"C:\Program Files\Blender Foundation");
        let mut paths = Vec::new();
        // Newest release series first
        for series in ["4.5", "4.4", "4.3", "4.2"] {
            paths.push(foundation.join(format!("Blender {series}")).join("blender.exe"));
        }
        paths
    }

    #[cfg(target_os = "linux")]
    {
        let mut paths = vec![
            PathBuf::from("/usr/bin/blender"),
            PathBuf::from("/usr/local/bin/blender"),
            PathBuf::from("/opt/blender/blender"),
            PathBuf::from("/snap/bin/blender"),
        ];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("blender/blender"));
            paths.push(home.join(".local/bin/blender"));
        }

        paths
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        vec![]
    }
}

/// Check if a path is executable.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Attempt to find the Blender executable.
///
/// Detection order:
/// 1. BLENDER_PATH environment variable
/// 2. PATH search (via `which`)
/// 3. Platform-specific default paths
pub fn find_blender() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BLENDER_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() && is_executable(&p) {
            return Some(p);
        }
        tracing::warn!(path = %p.display(), "BLENDER_PATH is not an executable, ignoring");
    }

    if let Ok(path) = which::which("blender") {
        return Some(path);
    }

    #[cfg(target_os = "macos")]
    if let Ok(path) = which::which("Blender") {
        return Some(path);
    }

    default_paths()
        .into_iter()
        .find(|path| path.exists() && is_executable(path))
}
