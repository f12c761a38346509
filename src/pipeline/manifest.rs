//! Format-preserving edits of `pyproject.toml` and `blender_manifest.toml`.

use crate::error::{BuildError, Result};
use crate::pipeline::snapshot::PackageSnapshot;
use crate::pipeline::wheels::WheelSet;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut, Item, Value};

/// File name of the extension manifest consumed by `blender --command extension build`.
pub const MANIFEST_FILE_NAME: &str = "blender_manifest.toml";

/// Header written at the top of the generated extension manifest.
pub const MANIFEST_HEADER: &str = "# blender_manifest.toml generated by batoms-build, \
please do not modify the wheels field.";

/// Subdirectory of the build directory holding the wheels.
pub const WHEELS_DIR_NAME: &str = "wheels";

/// Build a TOML array with one string per line, pyproject style.
fn multiline_array<I, S>(items: I) -> Array
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut array = Array::new();
    for item in items {
        array.push(item.into());
    }
    if !array.is_empty() {
        for value in array.iter_mut() {
            value.decor_mut().set_prefix("\n    ");
        }
        array.set_trailing_comma(true);
        array.set_trailing("\n");
    }
    array
}

/// Replace `project.optional-dependencies.<group>` with the snapshot pins.
///
/// Everything outside the group is kept byte for byte. Fails when the group is
/// absent, which means the descriptor predates the extension build.
pub fn rewrite_pyproject(source: &str, snapshot: &PackageSnapshot, group: &str) -> Result<String> {
    let mut doc: DocumentMut = source.parse()?;

    let missing = || BuildError::MissingDependencyGroup(group.to_string());
    // Lookups go through `TableLike` so absent keys are never inserted
    let optional = doc
        .as_table_mut()
        .get_mut("project")
        .and_then(Item::as_table_like_mut)
        .and_then(|project| project.get_mut("optional-dependencies"))
        .ok_or_else(missing)?;
    // Inline tables stay on one line
    let inline = optional.is_inline_table();
    let entry = optional
        .as_table_like_mut()
        .and_then(|table| table.get_mut(group))
        .ok_or_else(missing)?;
    let Some(existing) = entry.as_value().filter(|value| value.is_array()) else {
        return Err(BuildError::InvalidDependencyGroup(group.to_string()));
    };

    let requirements = snapshot.requirements();
    let mut pins = if inline {
        Value::Array(requirements.into_iter().collect())
    } else {
        Value::Array(multiline_array(requirements))
    };
    *pins.decor_mut() = existing.decor().clone();
    *entry = Item::Value(pins);

    Ok(doc.to_string())
}

/// Read a pyproject.toml and return its rewritten text. The file itself is never modified.
pub fn load_pyproject(path: &Path, snapshot: &PackageSnapshot, group: &str) -> Result<String> {
    let source = fs::read_to_string(path)?;
    rewrite_pyproject(&source, snapshot, group)
}

/// Relative posix paths of the wheels under `build_dir/wheels`, sorted.
pub fn collect_wheel_paths(build_dir: &Path) -> Result<Vec<String>> {
    let wheels = WheelSet::scan(&build_dir.join(WHEELS_DIR_NAME))?;
    Ok(wheels
        .names()
        .map(|name| format!("{WHEELS_DIR_NAME}/{name}"))
        .collect())
}

/// Replace the `wheels` field of an extension manifest and prepend the generated header.
pub fn render_extension_manifest(source: &str, wheels: &[String]) -> Result<String> {
    let body = source
        .strip_prefix(MANIFEST_HEADER)
        .map(|rest| rest.trim_start_matches(['\r', '\n']))
        .unwrap_or(source);

    let mut doc: DocumentMut = body.parse()?;
    doc["wheels"] = Item::Value(Value::Array(multiline_array(wheels.iter().cloned())));

    Ok(format!("{MANIFEST_HEADER}\n{doc}"))
}

/// Write `build_dir/blender_manifest.toml` listing every wheel in the build directory.
pub fn update_extension_manifest(manifest: &Path, build_dir: &Path) -> Result<PathBuf> {
    let wheels = collect_wheel_paths(build_dir)?;
    let source = fs::read_to_string(manifest)?;
    let rendered = render_extension_manifest(&source, &wheels)?;

    let target = build_dir.join(MANIFEST_FILE_NAME);
    fs::write(&target, rendered)?;
    tracing::info!(
        "listed {} wheel(s) in {}",
        wheels.len(),
        target.display()
    );
    Ok(target)
}

/// The parts of an extension manifest reported after a build.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionManifest {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub wheels: Vec<String>,
}

impl ExtensionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// One-line summary, e.g. `Beautiful Atoms (batoms 2.3.0, 12 wheel(s), linux-x64)`.
    pub fn describe(&self) -> String {
        let platforms = if self.platforms.is_empty() {
            "all platforms".to_string()
        } else {
            self.platforms.join(", ")
        };
        format!(
            "{} ({} {}, {} wheel(s), {})",
            self.name.as_deref().unwrap_or(&self.id),
            self.id,
            self.version,
            self.wheels.len(),
            platforms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PYPROJECT: &str = r#"[build-system]
requires = ["setuptools>=61.0"]
build-backend = "setuptools.build_meta"

[project]
name = "batoms"   # package name
version = "2.3.0"
dependencies = []

[project.optional-dependencies]
blender-extension = []
test = ["pytest", "pytest-cov"]

[tool.setuptools]
packages = ["batoms"]
"#;

    const MANIFEST: &str = r#"schema_version = "1.0.0"
id = "batoms"
version = "2.3.0"
name = "Beautiful Atoms"
wheels = ["./wheels/stale.whl"]

[permissions]
files = "Import/export structure files"
"#;

    fn snapshot() -> PackageSnapshot {
        PackageSnapshot::from_entries([("numpy", "1.26.4"), ("ase", "3.22.1")])
    }

    #[test]
    fn test_rewrite_replaces_group() {
        let rewritten = rewrite_pyproject(PYPROJECT, &snapshot(), "blender-extension").unwrap();
        let doc: toml::Value = toml::from_str(&rewritten).unwrap();
        let group = doc["project"]["optional-dependencies"]["blender-extension"]
            .as_array()
            .unwrap();
        let pins: Vec<_> = group.iter().map(|v| v.as_str().unwrap()).collect();
        assert_eq!(pins, vec!["ase==3.22.1", "numpy==1.26.4"]);
    }

    #[test]
    fn test_rewrite_preserves_other_fields() {
        let rewritten = rewrite_pyproject(PYPROJECT, &snapshot(), "blender-extension").unwrap();

        let marker = "blender-extension = ";
        let before = &PYPROJECT[..PYPROJECT.find(marker).unwrap()];
        assert!(rewritten.starts_with(before));

        let after = &PYPROJECT[PYPROJECT.find("test = ").unwrap()..];
        assert!(rewritten.ends_with(after));
        assert!(rewritten.contains(r#"name = "batoms"   # package name"#));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let first = rewrite_pyproject(PYPROJECT, &snapshot(), "blender-extension").unwrap();
        let second = rewrite_pyproject(PYPROJECT, &snapshot(), "blender-extension").unwrap();
        assert_eq!(first, second);

        let again = rewrite_pyproject(&first, &snapshot(), "blender-extension").unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_rewrite_missing_group() {
        let source = "[project]\nname = \"batoms\"\n";
        let err = rewrite_pyproject(source, &snapshot(), "blender-extension").unwrap_err();
        assert!(matches!(err, BuildError::MissingDependencyGroup(ref g) if g == "blender-extension"));
        assert!(err.to_string().contains("latest version"));
        assert!(!err.to_string().contains("ase=="));
    }

    #[test]
    fn test_rewrite_missing_group_among_others() {
        let source = "[project]\nname = \"batoms\"\n\n[project.optional-dependencies]\ntest = [\"pytest\"]\n";
        let err = rewrite_pyproject(source, &snapshot(), "blender-extension").unwrap_err();
        assert!(matches!(err, BuildError::MissingDependencyGroup(_)));

        let inline = "[project]\noptional-dependencies = { test = [\"pytest\"] }\n";
        let err = rewrite_pyproject(inline, &snapshot(), "blender-extension").unwrap_err();
        assert!(matches!(err, BuildError::MissingDependencyGroup(_)));
    }

    #[test]
    fn test_rewrite_missing_project_table() {
        let err = rewrite_pyproject("[tool.setuptools]\n", &snapshot(), "blender-extension")
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingDependencyGroup(_)));
    }

    #[test]
    fn test_rewrite_rejects_non_array_group() {
        let table = "[project]\nname = \"batoms\"\n\n[project.optional-dependencies.blender-extension]\nase = \"3.22.1\"\n";
        let err = rewrite_pyproject(table, &snapshot(), "blender-extension").unwrap_err();
        assert!(matches!(err, BuildError::InvalidDependencyGroup(ref g) if g == "blender-extension"));

        let string = "[project.optional-dependencies]\nblender-extension = \"ase\"\n";
        let err = rewrite_pyproject(string, &snapshot(), "blender-extension").unwrap_err();
        assert!(matches!(err, BuildError::InvalidDependencyGroup(_)));
    }

    #[test]
    fn test_rewrite_inline_optional_dependencies() {
        let source = "[project]\nname = \"batoms\"\noptional-dependencies = { blender-extension = [] }\n";
        let rewritten = rewrite_pyproject(source, &snapshot(), "blender-extension").unwrap();
        let doc: toml::Value = toml::from_str(&rewritten).unwrap();
        assert_eq!(
            doc["project"]["optional-dependencies"]["blender-extension"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_load_pyproject_does_not_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        fs::write(&path, PYPROJECT).unwrap();

        let rewritten = load_pyproject(&path, &snapshot(), "blender-extension").unwrap();

        assert_ne!(rewritten, PYPROJECT);
        assert_eq!(fs::read_to_string(&path).unwrap(), PYPROJECT);
    }

    #[test]
    fn test_render_extension_manifest_overwrites_wheels() {
        let wheels = vec![
            "wheels/ase-3.22.1-py3-none-any.whl".to_string(),
            "wheels/numpy-1.26.4-cp311-cp311-manylinux_2_17_x86_64.whl".to_string(),
        ];
        let rendered = render_extension_manifest(MANIFEST, &wheels).unwrap();

        assert!(rendered.starts_with(MANIFEST_HEADER));
        assert!(!rendered.contains("stale.whl"));
        assert!(rendered.contains("[permissions]"));

        let manifest: ExtensionManifest = toml::from_str(&rendered).unwrap();
        assert_eq!(manifest.id, "batoms");
        assert_eq!(manifest.wheels, wheels);
    }

    #[test]
    fn test_render_extension_manifest_single_header() {
        let once = render_extension_manifest(MANIFEST, &[]).unwrap();
        let twice = render_extension_manifest(&once, &[]).unwrap();
        assert_eq!(twice.matches(MANIFEST_HEADER).count(), 1);
    }

    #[test]
    fn test_describe_extension_manifest() {
        let manifest: ExtensionManifest = toml::from_str(MANIFEST).unwrap();
        assert_eq!(
            manifest.describe(),
            "Beautiful Atoms (batoms 2.3.0, 1 wheel(s), all platforms)"
        );

        let manifest: ExtensionManifest = toml::from_str(
            "id = \"batoms\"\nversion = \"2.3.0\"\nplatforms = [\"linux-x64\", \"macos-arm64\"]\n",
        )
        .unwrap();
        assert_eq!(
            manifest.describe(),
            "batoms (batoms 2.3.0, 0 wheel(s), linux-x64, macos-arm64)"
        );
    }

    #[test]
    fn test_update_extension_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, MANIFEST).unwrap();

        let build = temp.path().join("build");
        fs::create_dir_all(build.join(WHEELS_DIR_NAME)).unwrap();
        fs::write(build.join("wheels/b-1.0-py3-none-any.whl"), "").unwrap();
        fs::write(build.join("wheels/a-1.0-py3-none-any.whl"), "").unwrap();
        fs::write(build.join("wheels/notes.txt"), "").unwrap();

        let written = update_extension_manifest(&manifest, &build).unwrap();

        assert_eq!(written, build.join(MANIFEST_FILE_NAME));
        let loaded = ExtensionManifest::load(&written).unwrap();
        assert_eq!(
            loaded.wheels,
            vec!["wheels/a-1.0-py3-none-any.whl", "wheels/b-1.0-py3-none-any.whl"]
        );
        assert_eq!(fs::read_to_string(&manifest).unwrap(), MANIFEST);
    }
}
