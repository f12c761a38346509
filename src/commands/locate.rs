//! `batoms-build locate` command implementation.

use crate::blender::BlenderExecutor;
use crate::error::Result;
use crate::proxy::ExtensionProxy;
use std::path::PathBuf;

/// Arguments for the locate command.
pub struct LocateArgs {
    pub name: String,
    pub blender: PathBuf,
}

/// Execute the locate command.
pub fn execute(args: LocateArgs) -> Result<()> {
    let proxy = ExtensionProxy::new(BlenderExecutor::new(args.blender), args.name);
    let module = proxy.resolve()?;
    println!("{}", module);
    Ok(())
}
