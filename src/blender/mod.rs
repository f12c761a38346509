//! Blender interaction module.

mod detect;
mod executor;

pub use detect::find_blender;
pub use executor::{AddonModule, BlenderExecutor, PythonInfo};
