//! Resolution of the enabled extension module in Blender's add-on registry.
//!
//! Blender registers extensions under a repository-specific namespace such as
//! `bl_ext.user_default.batoms`. Client code that wants "the batoms module"
//! asks an [`ExtensionProxy`], which queries the registry once, checks that
//! exactly one loaded module matches, and caches the answer.

use crate::blender::{AddonModule, BlenderExecutor};
use crate::error::{BuildError, Result};
use std::cell::OnceCell;
use std::fmt;

/// A source of add-on module registrations.
pub trait AddonRegistry {
    fn modules(&self) -> Result<Vec<AddonModule>>;
}

impl AddonRegistry for BlenderExecutor {
    fn modules(&self) -> Result<Vec<AddonModule>> {
        self.addon_modules()
    }
}

impl AddonRegistry for Vec<AddonModule> {
    fn modules(&self) -> Result<Vec<AddonModule>> {
        Ok(self.clone())
    }
}

/// Pick the single loaded module whose name ends with `.<target>`.
pub fn resolve_extension_module(modules: &[AddonModule], target: &str) -> Result<String> {
    if modules.is_empty() {
        return Err(BuildError::RegistryUnavailable);
    }

    let suffix = format!(".{target}");
    let matches: Vec<String> = modules
        .iter()
        .filter(|module| module.loaded && module.name.ends_with(&suffix))
        .map(|module| module.name.clone())
        .collect();

    match matches.as_slice() {
        [] => Err(BuildError::ExtensionNotEnabled(target.to_string())),
        [only] => Ok(only.clone()),
        _ => Err(BuildError::MultipleExtensions {
            name: target.to_string(),
            modules: matches.clone(),
        }),
    }
}

/// Lazily resolved handle to the enabled extension module.
pub struct ExtensionProxy<R: AddonRegistry> {
    registry: R,
    target: String,
    resolved: OnceCell<String>,
}

impl<R: AddonRegistry> ExtensionProxy<R> {
    pub fn new(registry: R, target: impl Into<String>) -> Self {
        Self {
            registry,
            target: target.into(),
            resolved: OnceCell::new(),
        }
    }

    /// Full module name, resolving against the registry on first call.
    pub fn resolve(&self) -> Result<&str> {
        if let Some(name) = self.resolved.get() {
            return Ok(name);
        }
        let modules = self.registry.modules()?;
        let name = resolve_extension_module(&modules, &self.target)?;
        tracing::debug!(module = %name, "resolved extension module");
        Ok(self.resolved.get_or_init(|| name))
    }

    /// Module name if already resolved.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }
}

impl<R: AddonRegistry> fmt::Display for ExtensionProxy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved() {
            Some(name) => write!(f, "<Proxy for {name}>"),
            None => write!(f, "<Proxy for '{}' (not yet loaded)>", self.target),
        }
    }
}
