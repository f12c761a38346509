//! batoms-build - Beautiful Atoms extension packaging CLI
//!
//! Builds the Blender extension archives for Beautiful Atoms: pins the
//! packages of Blender's bundled Python, builds wheels, merges wheels from
//! other platforms and runs Blender's own extension build.

pub mod blender;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod proxy;

pub use config::Config;
pub use error::{BuildError, Result};
pub use platform::Platform;
