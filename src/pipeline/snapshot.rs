//! Snapshot of the packages installed in Blender's Python.

use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Packaging tools that are never pinned into the extension.
pub const EXCLUDED_PACKAGES: &[&str] = &["pip", "wheel", "setuptools", "distribute"];

/// Pinned name -> version mapping of installed packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSnapshot {
    packages: BTreeMap<String, String>,
}

/// Normalize a distribution name for comparison (PEP 503).
fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '.'], "-")
}

fn is_excluded(name: &str) -> bool {
    let normalized = normalize_name(name);
    EXCLUDED_PACKAGES.iter().any(|tool| *tool == normalized)
}

impl PackageSnapshot {
    /// Build a snapshot from name/version pairs, dropping packaging tools.
    pub fn from_entries<I, N, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let packages = entries
            .into_iter()
            .map(|(name, version)| (name.into(), version.into()))
            .filter(|(name, _)| !is_excluded(name))
            .collect();
        Self { packages }
    }

    /// Scan site-packages roots for installed distributions.
    ///
    /// Only the first root is used when several are given.
    pub fn from_site_packages(roots: &[PathBuf]) -> Result<Self> {
        let root = select_site_packages(roots)?;
        let mut entries = Vec::new();

        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if !path.is_dir() || path.extension().is_none_or(|ext| ext != "dist-info") {
                continue;
            }
            if is_editable(&path) {
                tracing::debug!(path = %path.display(), "skipping editable install");
                continue;
            }
            match read_distribution(&path) {
                Some(pair) => entries.push(pair),
                None => tracing::warn!(path = %path.display(), "unreadable dist-info, skipping"),
            }
        }

        let snapshot = Self::from_entries(entries);
        tracing::info!(
            "found {} package(s) in {}",
            snapshot.len(),
            root.display()
        );
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages
            .iter()
            .map(|(name, version)| (name.as_str(), version.as_str()))
    }

    /// Requirement strings `name==version`, sorted by name.
    pub fn requirements(&self) -> Vec<String> {
        self.iter()
            .map(|(name, version)| format!("{name}=={version}"))
            .collect()
    }
}

/// Pick the site-packages root to snapshot.
pub fn select_site_packages(roots: &[PathBuf]) -> Result<&Path> {
    match roots {
        [] => Err(BuildError::NoSitePackages),
        [only] => Ok(only),
        [first, ..] => {
            tracing::warn!(
                "Multiple site-packages directories found. Using the first one: {}",
                first.display()
            );
            Ok(first)
        }
    }
}

#[derive(Deserialize)]
struct DirectUrl {
    #[serde(default)]
    dir_info: Option<DirInfo>,
}

#[derive(Deserialize)]
struct DirInfo {
    #[serde(default)]
    editable: bool,
}

/// PEP 610: editable installs record `dir_info.editable` in direct_url.json.
fn is_editable(dist_info: &Path) -> bool {
    fs::read_to_string(dist_info.join("direct_url.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<DirectUrl>(&content).ok())
        .and_then(|url| url.dir_info)
        .is_some_and(|info| info.editable)
}

/// Read name and version from METADATA, falling back to the directory name.
fn read_distribution(dist_info: &Path) -> Option<(String, String)> {
    if let Ok(metadata) = fs::read_to_string(dist_info.join("METADATA")) {
        let mut name = None;
        let mut version = None;
        // Headers end at the first blank line
        for line in metadata.lines().take_while(|line| !line.is_empty()) {
            if let Some(value) = line.strip_prefix("Name:") {
                name = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("Version:") {
                version = Some(value.trim().to_string());
            }
        }
        if let (Some(name), Some(version)) = (name, version) {
            return Some((name, version));
        }
    }

    let stem = dist_info.file_stem()?.to_string_lossy();
    let (name, version) = stem.split_once('-')?;
    Some((name.to_string(), version.to_string()))
}
