//! `batoms-build build` command implementation.

use crate::blender::BlenderExecutor;
use crate::error::Result;
use crate::pipeline::manifest::ExtensionManifest;
use crate::pipeline::{BuildOptions, BuildOutcome, Pipeline};
use std::path::PathBuf;

/// Arguments for the build command.
pub struct BuildArgs {
    pub options: BuildOptions,
    pub blender: PathBuf,
}

/// Execute the build command.
pub fn execute(args: BuildArgs) -> Result<()> {
    println!(
        "Building extension from {}...",
        args.options.repo_root.display()
    );

    let executor = BlenderExecutor::new(args.blender);
    let outcome = Pipeline::new(&executor, args.options).run()?;

    match outcome {
        BuildOutcome::Compressed { archive } => {
            println!();
            println!("Wheels compressed: {}", archive.display());
        }
        BuildOutcome::Extension {
            manifest,
            merge,
            report,
        } => {
            println!();
            if !merge.merged.is_empty() {
                println!("Merged {} wheel(s) from other platforms", merge.merged.len());
            }
            println!("Build successful: {}", ExtensionManifest::load(&manifest)?.describe());
            for archive in &report.archives {
                println!("  {}", archive.display());
            }
        }
    }

    Ok(())
}
