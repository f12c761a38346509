//! Final extension assembly through Blender's own `extension build` command.

use crate::error::Result;
use crate::pipeline::Host;
use crate::platform::Platform;
use std::fs;
use std::path::{Path, PathBuf};

/// Archives produced by the extension build.
#[derive(Debug, Default)]
pub struct AssembleReport {
    /// Archives left in the export directory
    pub archives: Vec<PathBuf>,
    /// Archives removed because they target another platform
    pub pruned: Vec<PathBuf>,
}

/// `<extension>-*.zip` files in `dir`, sorted.
pub fn list_archives(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{extension}-");
    let mut archives: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().is_some_and(|ext| ext == "zip")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
        })
        .collect();
    archives.sort();
    Ok(archives)
}

/// Delete every extension archive whose name lacks the platform's file tag.
pub fn prune_foreign_archives(
    export_dir: &Path,
    extension: &str,
    platform: Platform,
) -> Result<Vec<PathBuf>> {
    let tag = platform.file_tag();
    let mut removed = Vec::new();

    for archive in list_archives(export_dir, extension)? {
        let keep = archive
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(&tag));
        if !keep {
            fs::remove_file(&archive)?;
            println!(
                "Remove {} as no extra wheels provided",
                archive.display()
            );
            removed.push(archive);
        }
    }

    Ok(removed)
}

/// Run the host's extension build and, for single-platform builds, drop
/// archives for the other platforms.
pub fn assemble_extension<H: Host + ?Sized>(
    host: &H,
    build_dir: &Path,
    export_dir: &Path,
    extension: &str,
    current_platform_only: Option<Platform>,
) -> Result<AssembleReport> {
    fs::create_dir_all(build_dir)?;
    fs::create_dir_all(export_dir)?;

    host.extension_build(build_dir, export_dir)?;
    println!(
        "Extension build completed. Files exported to {}",
        export_dir.display()
    );

    let mut report = AssembleReport::default();
    if let Some(platform) = current_platform_only {
        println!("Current platform is {}", platform.file_tag());
        report.pruned = prune_foreign_archives(export_dir, extension, platform)?;
    }
    report.archives = list_archives(export_dir, extension)?;

    Ok(report)
}
