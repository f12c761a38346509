//! Error types for batoms-build.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for batoms-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while packaging the extension.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Blender not found. Install Blender 4.2+ or specify path with --blender")]
    BlenderNotFound,

    #[error("Blender command failed: {0}")]
    BlenderCommandFailed(String),

    #[error("No site-packages directory reported by Blender's Python")]
    NoSitePackages,

    #[error("Blender extension system is unavailable. Ensure that Blender is running.")]
    RegistryUnavailable,

    #[error(
        "No extension ending with `{0}` is enabled in Blender.\n\
         Please enable the extension in Blender's Preferences > Add-ons."
    )]
    ExtensionNotEnabled(String),

    #[error(
        "Multiple `{name}` extensions detected: {modules:?}. \
         Please ensure only one extension is active in Blender."
    )]
    MultipleExtensions { name: String, modules: Vec<String> },

    #[error(
        "`{0}` dependency not found in pyproject.toml. Ensure you're using the latest version."
    )]
    MissingDependencyGroup(String),

    #[error("`{0}` in pyproject.toml must be an array of requirement strings.")]
    InvalidDependencyGroup(String),

    #[error("Source directory {0} does not exist.")]
    SourceNotFound(PathBuf),

    #[error("Extra wheels directory {0} does not exist.")]
    ExtraWheelsNotFound(PathBuf),

    #[error(
        "The number of wheels in {dir} ({found} wheels) is different \
         from {expected} in current platform."
    )]
    WheelCountMismatch {
        dir: PathBuf,
        found: usize,
        expected: usize,
    },

    #[error("No wheels found in build directory.")]
    NoWheelsFound,

    #[error("{program} exited with {code}: {detail}")]
    SubprocessFailed {
        program: String,
        code: String,
        detail: String,
    },

    #[error("only_compress_wheels should only be performed when no extra wheels are provided.")]
    CompressWithExtraWheels,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML document error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
