//! `batoms-build clean` command implementation.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the clean command.
pub struct CleanArgs {
    /// Repository root
    pub repo_root: PathBuf,
    /// Build directory (default `<root>/build`)
    pub build_dir: Option<PathBuf>,
    /// Export directory (default `<root>/export`)
    pub export_dir: Option<PathBuf>,
    /// Only show what would be deleted
    pub dry_run: bool,
}

/// Execute the clean command.
pub fn execute(args: CleanArgs) -> Result<()> {
    let repo_root = args
        .repo_root
        .canonicalize()
        .unwrap_or(args.repo_root.clone());

    if args.dry_run {
        println!("Dry run: showing what would be deleted...");
    } else {
        println!("Cleaning build outputs...");
    }
    println!();

    let targets = [
        args.build_dir.unwrap_or_else(|| repo_root.join("build")),
        args.export_dir.unwrap_or_else(|| repo_root.join("export")),
    ];

    let mut deleted_count = 0;
    for dir in &targets {
        if dir.exists() {
            deleted_count += clean_path(dir, args.dry_run)?;
        }
    }

    println!();
    if deleted_count == 0 {
        println!("Nothing to clean.");
    } else if args.dry_run {
        println!(
            "Would delete {} item(s). Run without --dry-run to actually delete.",
            deleted_count
        );
    } else {
        println!("Cleaned {} item(s).", deleted_count);
    }

    Ok(())
}

/// Clean a single path (file or directory).
fn clean_path(path: &Path, dry_run: bool) -> Result<usize> {
    if dry_run {
        println!("  Would delete: {}", path.display());
    } else {
        println!("  Deleting: {}", path.display());
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    Ok(1)
}
