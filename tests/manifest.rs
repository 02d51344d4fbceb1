// Manifest loading guard rails: schema validation, version parsing and
// resolution through a manifest loaded from disk.
mod support;

use anyhow::Result;
use facadekit::{FrameworkManifest, MANIFEST_SCHEMA_VERSION, ResolutionContext};
use serde_json::json;
use std::fs;
use support::{ORM, family, orm_registry, version, write_manifest};
use tempfile::TempDir;

fn write_raw(dir: &TempDir, value: serde_json::Value) -> Result<std::path::PathBuf> {
    let path = dir.path().join("frameworks.json");
    fs::write(&path, serde_json::to_vec(&value)?)?;
    Ok(path)
}

#[test]
fn loads_and_resolves_from_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let manifest = FrameworkManifest::from_versions(
        Some("billing".to_string()),
        [(family(ORM), version("10.4.2-jakarta"))],
    );
    let path = write_manifest(dir.path(), &manifest);

    let loaded = FrameworkManifest::load(&path)?;
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.version_of(&family(ORM)), Some(version("10.4.2-jakarta")));

    let registry = orm_registry();
    let facade = registry
        .create_for(&family(ORM), &loaded)?
        .expect("orm applies at 10.4.2");
    assert_eq!(facade.level(), &version("10"));
    assert_eq!(facade.call("a", &[])?, json!("nine"));
    Ok(())
}

#[test]
fn rejects_unknown_schema_version() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_raw(
        &dir,
        json!({"schema_version": "framework_manifest_v0", "frameworks": {}}),
    )?;
    let err = FrameworkManifest::load(&path).expect_err("v0 manifests are rejected");
    assert!(
        format!("{err:#}").contains("failed schema validation"),
        "unexpected error: {err:#}"
    );
    Ok(())
}

#[test]
fn rejects_unparsable_versions() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_raw(
        &dir,
        json!({
            "schema_version": MANIFEST_SCHEMA_VERSION,
            "frameworks": {"orm": "latest-and-greatest"}
        }),
    )?;
    assert!(FrameworkManifest::load(&path).is_err());
    Ok(())
}

#[test]
fn rejects_unexpected_fields() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_raw(
        &dir,
        json!({
            "schema_version": MANIFEST_SCHEMA_VERSION,
            "frameworks": {"orm": "5"},
            "detected_by": "gradle"
        }),
    )?;
    let err = FrameworkManifest::load(&path).expect_err("extra fields are rejected");
    assert!(format!("{err:#}").contains("detected_by"), "unexpected error: {err:#}");
    Ok(())
}

#[test]
fn schema_beside_the_project_does_not_replace_the_bundled_one() -> Result<()> {
    let dir = TempDir::new()?;
    let schema_dir = dir.path().join("schema");
    fs::create_dir_all(&schema_dir)?;
    fs::write(
        schema_dir.join("framework_manifest.schema.json"),
        serde_json::to_vec(&json!({
            "type": "object",
            "required": ["schema_version"],
            "properties": {"schema_version": {"const": MANIFEST_SCHEMA_VERSION}}
        }))?,
    )?;
    let project = dir.path().join("proj");
    fs::create_dir_all(&project)?;
    let path = project.join("frameworks.json");
    fs::write(
        &path,
        serde_json::to_vec(&json!({
            "schema_version": MANIFEST_SCHEMA_VERSION,
            "frameworks": {"orm": "5"},
            "detected_by": "gradle"
        }))?,
    )?;

    let err = FrameworkManifest::load(&path).expect_err("the loose schema is ignored");
    assert!(
        format!("{err:#}").contains("failed schema validation"),
        "unexpected error: {err:#}"
    );
    Ok(())
}

#[test]
fn missing_file_reports_path() {
    let err = FrameworkManifest::load(std::path::Path::new("/nonexistent/frameworks.json"))
        .expect_err("missing file");
    assert!(format!("{err:#}").contains("/nonexistent/frameworks.json"));
}
