//! Blender command execution.

use crate::error::{BuildError, Result};
use crate::process::{run_captured, run_streamed};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

const JSON_START: &str = "BATOMS_BUILD_JSON_START";
const JSON_END: &str = "BATOMS_BUILD_JSON_END";

const PYTHON_INFO_EXPR: &str = r#"
import sys, json, site
info = {
    "executable": sys.executable,
    "version": sys.version,
    "prefix": sys.prefix,
    "site_packages": site.getsitepackages(),
}
try:
    import bpy
    info["blender_version"] = bpy.app.version_string
except Exception:
    info["blender_version"] = None
print("BATOMS_BUILD_JSON_START")
print(json.dumps(info))
print("BATOMS_BUILD_JSON_END")
"#;

const ADDON_MODULES_EXPR: &str = r#"
import json
import addon_utils
mods = []
for mod in addon_utils.modules():
    _default, loaded = addon_utils.check(mod.__name__)
    mods.append({"name": mod.__name__, "loaded": bool(loaded)})
print("BATOMS_BUILD_JSON_START")
print(json.dumps(mods))
print("BATOMS_BUILD_JSON_END")
"#;

/// Wrapper for executing Blender in background mode.
pub struct BlenderExecutor {
    executable: PathBuf,
}

impl BlenderExecutor {
    /// Create a new executor with the given Blender executable path.
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Get the path to the Blender executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Evaluate a Python expression inside background Blender and parse the
    /// JSON block it prints between the markers.
    fn eval_json<T: for<'de> Deserialize<'de>>(&self, expr: &str, factory: bool) -> Result<T> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--background");
        if factory {
            cmd.arg("--factory-startup");
        }
        cmd.args(["--python-exit-code", "1", "--python-expr", expr]);

        let output = run_captured(&mut cmd).map_err(|e| match e {
            BuildError::SubprocessFailed { detail, .. } => BuildError::BlenderCommandFailed(detail),
            other => other,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = extract_json_block(&stdout)?;
        Ok(serde_json::from_str(json)?)
    }

    /// Get information about Blender's bundled Python.
    pub fn python_info(&self) -> Result<PythonInfo> {
        self.eval_json(PYTHON_INFO_EXPR, true)
    }

    /// List add-on and extension modules known to Blender with their loaded state.
    ///
    /// Runs with the user's preferences so enabled extensions are reported.
    pub fn addon_modules(&self) -> Result<Vec<AddonModule>> {
        self.eval_json(ADDON_MODULES_EXPR, false)
    }

    /// Execute `blender --command extension build`.
    pub fn extension_build(&self, source_dir: &Path, output_dir: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["--command", "extension", "build", "--source-dir"])
            .arg(source_dir)
            .arg("--output-dir")
            .arg(output_dir)
            .arg("--split-platform");
        run_streamed(&mut cmd).map_err(|e| match e {
            BuildError::SubprocessFailed { code, .. } => {
                BuildError::BlenderCommandFailed(format!("extension build exited with {code}"))
            }
            other => other,
        })
    }
}

/// Extract the JSON payload printed between the marker lines.
pub(crate) fn extract_json_block(stdout: &str) -> Result<&str> {
    let start = stdout
        .find(JSON_START)
        .ok_or_else(|| BuildError::BlenderCommandFailed("JSON output not found".into()))?;
    let end = stdout[start..]
        .find(JSON_END)
        .map(|offset| start + offset)
        .ok_or_else(|| BuildError::BlenderCommandFailed("JSON output not terminated".into()))?;

    Ok(stdout[start + JSON_START.len()..end].trim())
}

/// Python environment information from Blender.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PythonInfo {
    pub executable: String,
    pub version: String,
    pub prefix: String,
    #[serde(default)]
    pub site_packages: Vec<String>,
    pub blender_version: Option<String>,
}

impl PythonInfo {
    /// Path to the bundled Python interpreter.
    pub fn python(&self) -> PathBuf {
        PathBuf::from(&self.executable)
    }
}

/// An entry from Blender's add-on registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AddonModule {
    /// Importable module name, e.g. `bl_ext.user_default.batoms`
    pub name: String,
    /// Whether the module is currently loaded
    pub loaded: bool,
}

impl AddonModule {
    pub fn new(name: impl Into<String>, loaded: bool) -> Self {
        Self {
            name: name.into(),
            loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block() {
        let stdout = "Blender 4.2.1\nRead prefs\nBATOMS_BUILD_JSON_START\n{\"a\": 1}\nBATOMS_BUILD_JSON_END\nBlender quit\n";
        assert_eq!(extract_json_block(stdout).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_block_missing() {
        assert!(extract_json_block("Blender quit").is_err());
        assert!(extract_json_block("BATOMS_BUILD_JSON_START {}").is_err());
    }

    #[test]
    fn test_parse_python_info() {
        let json = r#"{
            "executable": "/opt/blender/4.2/python/bin/python3.11",
            "version": "3.11.7 (main, Jan 29 2024)",
            "prefix": "/opt/blender/4.2/python",
            "site_packages": ["/opt/blender/4.2/python/lib/python3.11/site-packages"],
            "blender_version": "4.2.1 LTS"
        }"#;
        let info: PythonInfo = serde_json::from_str(json).unwrap();
        assert_eq!(
            info.python(),
            PathBuf::from("/opt/blender/4.2/python/bin/python3.11")
        );
        assert_eq!(info.site_packages.len(), 1);
        assert_eq!(info.blender_version.as_deref(), Some("4.2.1 LTS"));
    }

    #[test]
    fn test_parse_addon_modules() {
        let json = r#"[
            {"name": "bl_ext.user_default.batoms", "loaded": true},
            {"name": "io_scene_fbx", "loaded": false}
        ]"#;
        let mods: Vec<AddonModule> = serde_json::from_str(json).unwrap();
        assert_eq!(mods[0], AddonModule::new("bl_ext.user_default.batoms", true));
        assert!(!mods[1].loaded);
    }

    #[test]
    fn test_executor_new() {
        let executor = BlenderExecutor::new(PathBuf::from("/usr/bin/blender"));
        assert_eq!(executor.executable(), Path::new("/usr/bin/blender"));
    }
}
