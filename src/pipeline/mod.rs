//! The extension packaging pipeline.
//!
//! One run walks a fixed sequence of stages:
//!
//! 1. clear the build and export directories
//! 2. copy the extension source into the build directory
//! 3. snapshot the packages installed in Blender's Python
//! 4. pin the snapshot into a scratch copy of `pyproject.toml` and build wheels
//! 5. merge wheels built on other platforms (optional)
//! 6. either zip the wheels (`--only-compress-wheels`) or list them in
//!    `blender_manifest.toml` and run `blender --command extension build`
//!
//! Every failure aborts the run. Nothing is retried.

pub mod assemble;
pub mod dirs;
pub mod manifest;
pub mod snapshot;
pub mod wheels;

use crate::blender::{BlenderExecutor, PythonInfo};
use crate::config::{Config, DEFAULT_DEPENDENCY_GROUP, DEFAULT_EXTENSION_NAME};
use crate::error::{BuildError, Result};
use crate::platform::Platform;
use std::path::{Path, PathBuf};

pub use assemble::AssembleReport;
pub use snapshot::PackageSnapshot;
pub use wheels::{MergeReport, WheelBuildRequest, WheelSet};

/// The host application the pipeline drives.
pub trait Host {
    /// Describe the host's bundled Python.
    fn python_info(&self) -> Result<PythonInfo>;

    /// Build wheels for the staged project into `request.wheels_dir`.
    fn build_wheels(
        &self,
        python: &Path,
        request: &WheelBuildRequest,
        snapshot: &PackageSnapshot,
    ) -> Result<WheelSet> {
        wheels::build_wheels(python, request, snapshot)
    }

    /// Package `source_dir` into extension archives under `output_dir`.
    fn extension_build(&self, source_dir: &Path, output_dir: &Path) -> Result<()>;
}

impl Host for BlenderExecutor {
    fn python_info(&self) -> Result<PythonInfo> {
        BlenderExecutor::python_info(self)
    }

    fn extension_build(&self, source_dir: &Path, output_dir: &Path) -> Result<()> {
        BlenderExecutor::extension_build(self, source_dir, output_dir)
    }
}

/// Fully resolved options for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub repo_root: PathBuf,
    pub source_dir: PathBuf,
    pub pyproject: PathBuf,
    pub manifest: PathBuf,
    pub build_dir: PathBuf,
    pub export_dir: PathBuf,
    pub index_url: Option<String>,
    pub extra_wheels: Vec<PathBuf>,
    pub only_compress_wheels: bool,
    pub dependency_group: String,
    pub extension_name: String,
}

impl BuildOptions {
    /// Options with the conventional layout under `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            source_dir: repo_root.join(DEFAULT_EXTENSION_NAME),
            pyproject: repo_root.join("pyproject.toml"),
            manifest: repo_root.join(manifest::MANIFEST_FILE_NAME),
            build_dir: repo_root.join("build"),
            export_dir: repo_root.join("export"),
            index_url: None,
            extra_wheels: Vec::new(),
            only_compress_wheels: false,
            dependency_group: DEFAULT_DEPENDENCY_GROUP.to_string(),
            extension_name: DEFAULT_EXTENSION_NAME.to_string(),
            repo_root,
        }
    }

    /// Fill unset values from a project config.
    pub fn with_config(mut self, config: &Config) -> Self {
        if self.index_url.is_none() {
            self.index_url = config.index_url.clone();
        }
        if let Some(ref source) = config.source_dir {
            self.source_dir = self.repo_root.join(source);
        }
        self.dependency_group = config.dependency_group().to_string();
        self.extension_name = config.extension_name().to_string();
        self
    }

    /// The wheels directory inside the build directory.
    pub fn wheels_dir(&self) -> PathBuf {
        self.build_dir.join(manifest::WHEELS_DIR_NAME)
    }

    /// True when no wheels from other platforms are merged in.
    pub fn current_platform_only(&self) -> bool {
        self.extra_wheels.is_empty()
    }

    /// Reject flag combinations before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.only_compress_wheels && !self.extra_wheels.is_empty() {
            return Err(BuildError::CompressWithExtraWheels);
        }
        Ok(())
    }
}

/// What a pipeline run produced.
#[derive(Debug)]
pub enum BuildOutcome {
    /// `--only-compress-wheels`: a zip of the wheel directory
    Compressed { archive: PathBuf },
    /// A full extension build
    Extension {
        manifest: PathBuf,
        merge: MergeReport,
        report: AssembleReport,
    },
}

/// Runs the packaging stages against a host.
pub struct Pipeline<'h, H: Host + ?Sized> {
    host: &'h H,
    options: BuildOptions,
    platform: Platform,
}

impl<'h, H: Host + ?Sized> Pipeline<'h, H> {
    pub fn new(host: &'h H, options: BuildOptions) -> Self {
        Self {
            host,
            options,
            platform: Platform::current(),
        }
    }

    /// Override the platform used for archive names and pruning.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Execute every stage in order.
    pub fn run(&self) -> Result<BuildOutcome> {
        let opts = &self.options;
        opts.validate()?;

        tracing::info!(build = %opts.build_dir.display(), export = %opts.export_dir.display(), "preparing directories");
        dirs::clear_dirs(&[&opts.build_dir, &opts.export_dir])?;
        dirs::copy_source_tree(&opts.source_dir, &opts.build_dir)?;

        let info = self.host.python_info()?;
        if let Some(ref version) = info.blender_version {
            println!("Using Blender {} (Python {})", version, short_version(&info.version));
        }
        let roots: Vec<PathBuf> = info.site_packages.iter().map(PathBuf::from).collect();
        let snapshot = PackageSnapshot::from_site_packages(&roots)?;
        println!("Pinning {} package(s) from Blender's Python", snapshot.len());

        let request = WheelBuildRequest {
            source_dir: opts.source_dir.clone(),
            pyproject: opts.pyproject.clone(),
            wheels_dir: opts.wheels_dir(),
            index_url: opts.index_url.clone(),
            group: opts.dependency_group.clone(),
        };
        self.host.build_wheels(&info.python(), &request, &snapshot)?;
        let merge = wheels::merge_wheels(&request.wheels_dir, &opts.extra_wheels)?;

        if opts.only_compress_wheels {
            let archive = wheels::compress_wheels(
                &opts.build_dir,
                &opts.export_dir,
                &opts.extension_name,
                self.platform,
            )?;
            return Ok(BuildOutcome::Compressed { archive });
        }

        let manifest = manifest::update_extension_manifest(&opts.manifest, &opts.build_dir)?;
        println!("Updated manifest at {}", manifest.display());

        let report = assemble::assemble_extension(
            self.host,
            &opts.build_dir,
            &opts.export_dir,
            &opts.extension_name,
            opts.current_platform_only().then_some(self.platform),
        )?;

        Ok(BuildOutcome::Extension {
            manifest,
            merge,
            report,
        })
    }
}

fn short_version(version: &str) -> &str {
    version.split_whitespace().next().unwrap_or(version)
}
