//! Platform identifiers used in Blender extension archive names.

use std::fmt;

/// Platforms Blender extensions are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    LinuxX64,
    MacosX64,
    MacosArm64,
    WindowsX64,
    Unsupported,
}

impl Platform {
    /// Map an OS/architecture pair onto a platform.
    ///
    /// `system` uses the names Python's `platform.system()` reports
    /// (`Linux`, `Darwin`, `Windows`); the Rust `std::env::consts::OS`
    /// names (`linux`, `macos`, `windows`) are accepted too.
    pub fn from_parts(system: &str, machine: &str) -> Self {
        match system {
            "Linux" | "linux" if machine == "x86_64" => Platform::LinuxX64,
            "Darwin" | "macos" => {
                if machine == "x86_64" {
                    Platform::MacosX64
                } else {
                    Platform::MacosArm64
                }
            }
            // TODO: windows-arm64 once Blender ships extension builds for it
            "Windows" | "Microsoft" | "windows" => Platform::WindowsX64,
            _ => Platform::Unsupported,
        }
    }

    /// Platform of the running host.
    pub fn current() -> Self {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Identifier joined with `connector`, e.g. `linux-x64` or `linux_x64`.
    pub fn identifier(&self, connector: char) -> String {
        match self {
            Platform::LinuxX64 => format!("linux{connector}x64"),
            Platform::MacosX64 => format!("macos{connector}x64"),
            Platform::MacosArm64 => format!("macos{connector}arm64"),
            Platform::WindowsX64 => format!("windows{connector}x64"),
            Platform::Unsupported => "unsupported".to_string(),
        }
    }

    /// Identifier as it appears in archive file names.
    pub fn file_tag(&self) -> String {
        self.identifier('_')
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier('-'))
    }
}
