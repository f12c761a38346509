//! `batoms-build platform` command implementation.

use crate::error::{BuildError, Result};
use crate::platform::Platform;

/// Arguments for the platform command.
pub struct PlatformArgs {
    /// Separator between OS and architecture (`-` or `_`)
    pub connector: char,
}

/// Execute the platform command.
pub fn execute(args: PlatformArgs) -> Result<()> {
    if args.connector != '-' && args.connector != '_' {
        return Err(BuildError::ConfigError(format!(
            "Invalid connector '{}'. Use '-' or '_'",
            args.connector
        )));
    }
    println!("{}", Platform::current().identifier(args.connector));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_other_connectors() {
        assert!(execute(PlatformArgs { connector: '.' }).is_err());
        assert!(execute(PlatformArgs { connector: '_' }).is_ok());
    }
}
