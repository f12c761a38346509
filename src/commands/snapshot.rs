//! `batoms-build snapshot` command implementation.

use crate::blender::BlenderExecutor;
use crate::error::Result;
use crate::pipeline::PackageSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output format for the snapshot.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the snapshot command.
pub struct SnapshotArgs {
    pub format: OutputFormat,
    pub blender: PathBuf,
}

#[derive(Serialize)]
struct SnapshotReport<'a> {
    python: &'a str,
    site_packages: &'a [String],
    packages: BTreeMap<&'a str, &'a str>,
}

/// Execute the snapshot command.
pub fn execute(args: SnapshotArgs) -> Result<()> {
    let executor = BlenderExecutor::new(args.blender);

    if args.format == OutputFormat::Text {
        println!("Querying Blender Python environment...");
    }
    let info = executor.python_info()?;
    let roots: Vec<PathBuf> = info.site_packages.iter().map(PathBuf::from).collect();
    let snapshot = PackageSnapshot::from_site_packages(&roots)?;

    match args.format {
        OutputFormat::Text => {
            println!();
            println!("Python:  {}", info.executable);
            if let Some(ref version) = info.blender_version {
                println!("Blender: {}", version);
            }
            println!();
            println!("Pinned packages ({}):", snapshot.len());
            for requirement in snapshot.requirements() {
                println!("  {}", requirement);
            }
        }
        OutputFormat::Json => {
            let report = SnapshotReport {
                python: &info.executable,
                site_packages: &info.site_packages,
                packages: snapshot.iter().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
