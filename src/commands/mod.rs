//! Command implementations.

pub mod build;
pub mod clean;
pub mod locate;
pub mod platform;
pub mod snapshot;
