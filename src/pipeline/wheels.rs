//! Building, merging and compressing the extension's wheels.

use crate::error::{BuildError, Result};
use crate::pipeline::dirs::copy_source_tree;
use crate::pipeline::manifest::{load_pyproject, WHEELS_DIR_NAME};
use crate::pipeline::snapshot::PackageSnapshot;
use crate::platform::Platform;
use crate::process::run_streamed;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn is_wheel(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "whl")
}

/// The `.whl` files directly inside a directory, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WheelSet {
    names: BTreeSet<String>,
}

impl WheelSet {
    /// Scan `dir` (non-recursively). A missing directory yields an empty set.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut names = BTreeSet::new();
        if !dir.exists() {
            return Ok(Self { names });
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if is_wheel(&path) {
                if let Some(name) = path.file_name() {
                    names.insert(name.to_string_lossy().into_owned());
                }
            }
        }

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Wheel file names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Ensure `dir` exists and holds no `.whl` files. Other files are left alone.
pub fn clear_wheels(dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_wheel(&path) {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::debug!("removed {} stale wheel(s) from {}", removed, dir.display());
    }
    Ok(removed)
}

/// Inputs for a wheel build.
#[derive(Debug, Clone)]
pub struct WheelBuildRequest {
    /// Extension source package directory (e.g. `<repo>/batoms`)
    pub source_dir: PathBuf,
    /// Project descriptor to pin
    pub pyproject: PathBuf,
    /// Output directory for `.whl` files
    pub wheels_dir: PathBuf,
    /// Optional package index
    pub index_url: Option<String>,
    /// Optional-dependency group holding the pins
    pub group: String,
}

/// Arguments for `python -m pip wheel` against a staged project.
pub fn pip_wheel_args(
    staged: &Path,
    wheels_dir: &Path,
    group: &str,
    index_url: Option<&str>,
) -> Vec<OsString> {
    let mut target = staged.as_os_str().to_owned();
    target.push(format!("[{group}]"));

    let mut args: Vec<OsString> = vec![
        "-m".into(),
        "pip".into(),
        "wheel".into(),
        "--wheel-dir".into(),
        wheels_dir.as_os_str().to_owned(),
        "-e".into(),
        target,
    ];
    if let Some(url) = index_url {
        args.push("--index-url".into());
        args.push(url.into());
    }
    args
}

/// Copy the source tree and the pinned descriptor into `staging`.
///
/// Returns the path of the staged descriptor.
pub fn stage_project(
    request: &WheelBuildRequest,
    snapshot: &PackageSnapshot,
    staging: &Path,
) -> Result<PathBuf> {
    let package_name = request
        .source_dir
        .file_name()
        .ok_or_else(|| BuildError::SourceNotFound(request.source_dir.clone()))?;
    copy_source_tree(&request.source_dir, &staging.join(package_name))?;

    let pinned = load_pyproject(&request.pyproject, snapshot, &request.group)?;
    let descriptor_name = request
        .pyproject
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "pyproject.toml".into());
    let staged = staging.join(descriptor_name);
    fs::write(&staged, pinned)?;
    tracing::debug!(path = %staged.display(), "staged pinned descriptor");
    Ok(staged)
}

/// Build wheels for the extension and its pinned dependencies with Blender's Python.
pub fn build_wheels(
    python: &Path,
    request: &WheelBuildRequest,
    snapshot: &PackageSnapshot,
) -> Result<WheelSet> {
    clear_wheels(&request.wheels_dir)?;

    // Building from a scratch copy keeps egg-info and build/ out of the working tree
    let staging = tempfile::Builder::new().prefix("batoms-build-").tempdir()?;
    stage_project(request, snapshot, staging.path())?;

    let mut cmd = Command::new(python);
    cmd.args(pip_wheel_args(
        staging.path(),
        &request.wheels_dir,
        &request.group,
        request.index_url.as_deref(),
    ));
    run_streamed(&mut cmd)?;

    let wheels = WheelSet::scan(&request.wheels_dir)?;
    println!(
        "Build completed. {} wheel(s) saved in {}",
        wheels.len(),
        request.wheels_dir.display()
    );
    Ok(wheels)
}

/// Result of merging wheels from other platforms.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Wheel names copied into the primary directory
    pub merged: Vec<String>,
    /// Wheel names already present and left untouched
    pub skipped: Vec<String>,
}

/// Merge wheels built on other platforms into `wheels_dir`.
///
/// Every extra directory must exist and hold as many wheels as `wheels_dir`;
/// both checks finish before anything is copied. Names already present are
/// never overwritten.
pub fn merge_wheels(wheels_dir: &Path, extra_dirs: &[PathBuf]) -> Result<MergeReport> {
    let mut report = MergeReport::default();
    if extra_dirs.is_empty() {
        println!("No extra wheels provided, skip.");
        return Ok(report);
    }

    for extra in extra_dirs {
        if !extra.is_dir() {
            return Err(BuildError::ExtraWheelsNotFound(extra.clone()));
        }
    }

    let expected = WheelSet::scan(wheels_dir)?.len();
    let mut extra_sets = Vec::with_capacity(extra_dirs.len());
    for extra in extra_dirs {
        let set = WheelSet::scan(extra)?;
        if set.len() != expected {
            return Err(BuildError::WheelCountMismatch {
                dir: extra.clone(),
                found: set.len(),
                expected,
            });
        }
        extra_sets.push((extra, set));
    }

    for (extra, set) in extra_sets {
        for name in set.names() {
            let target = wheels_dir.join(name);
            if target.exists() {
                report.skipped.push(name.to_string());
                continue;
            }
            fs::copy(extra.join(name), &target)?;
            println!(
                "Merged {} from {} --> {}",
                name,
                extra.display(),
                wheels_dir.display()
            );
            report.merged.push(name.to_string());
        }
    }

    Ok(report)
}

/// Archive name for the compressed wheel set, e.g. `batoms-wheels-linux_x64.zip`.
pub fn wheels_archive_name(extension: &str, platform: Platform) -> String {
    format!("{}-wheels-{}.zip", extension, platform.file_tag())
}

/// Zip the contents of `build_dir/wheels` into `export_dir`.
pub fn compress_wheels(
    build_dir: &Path,
    export_dir: &Path,
    extension: &str,
    platform: Platform,
) -> Result<PathBuf> {
    let wheels_dir = build_dir.join(WHEELS_DIR_NAME);
    if !wheels_dir.is_dir() {
        return Err(BuildError::NoWheelsFound);
    }

    fs::create_dir_all(export_dir)?;
    let zip_path = export_dir.join(wheels_archive_name(extension, platform));
    let mut writer = ZipWriter::new(File::create(&zip_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<PathBuf> = fs::read_dir(&wheels_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    for path in entries.iter().filter(|path| path.is_file()) {
        let Some(name) = path.file_name() else {
            continue;
        };
        writer.start_file(name.to_string_lossy().into_owned(), options)?;
        io::copy(&mut File::open(path)?, &mut writer)?;
    }
    writer.finish()?;

    println!("Compressed wheels saved at: {}", zip_path.display());
    Ok(zip_path)
}
