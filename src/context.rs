//! Resolution contexts: where a family's framework version comes from.
//!
//! The registry never detects versions itself; it asks a
//! [`ResolutionContext`]. The stock context is a [`FrameworkManifest`], a small
//! JSON document (validated against `schema/framework_manifest.schema.json`)
//! that records the framework versions a project was found to use. Broader
//! shapes such as [`ProjectScope`] implement [`ContextSource`] and project
//! themselves down to an optional context.

use crate::contract::FamilyId;
use crate::schema_loader::{load_json_schema, validate_document};
use crate::version::Version;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Schema version every manifest must declare.
pub const MANIFEST_SCHEMA_VERSION: &str = "framework_manifest_v1";
/// Environment variable naming the default manifest path.
pub const MANIFEST_ENV: &str = "FACADE_MANIFEST";
/// Manifest schema path relative to the crate root.
pub const CANONICAL_MANIFEST_SCHEMA_PATH: &str = "schema/framework_manifest.schema.json";

/// Anything that can report the framework version a family resolves to.
pub trait ResolutionContext {
    /// `None` means the family is not present in this context.
    fn version_of(&self, family: &FamilyId) -> Option<Version>;
}

impl ResolutionContext for BTreeMap<FamilyId, Version> {
    fn version_of(&self, family: &FamilyId) -> Option<Version> {
        self.get(family).cloned()
    }
}

/// Broader context shapes that reduce to an optional [`ResolutionContext`].
pub trait ContextSource {
    fn resolution_context(&self) -> Option<&dyn ResolutionContext>;
}

impl<C: ResolutionContext> ContextSource for Option<C> {
    fn resolution_context(&self) -> Option<&dyn ResolutionContext> {
        self.as_ref().map(|ctx| ctx as &dyn ResolutionContext)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Framework versions detected for one project.
pub struct FrameworkManifest {
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub frameworks: BTreeMap<FamilyId, Version>,
}

impl FrameworkManifest {
    /// Build an in-memory manifest without touching disk.
    pub fn from_versions(
        project: Option<String>,
        versions: impl IntoIterator<Item = (FamilyId, Version)>,
    ) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            project,
            frameworks: versions.into_iter().collect(),
        }
    }

    /// Load and validate a manifest from disk.
    ///
    /// The document is checked against the manifest schema before it is
    /// deserialized, so malformed files report every violation at once.
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening manifest {}", path.display()))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing manifest {}", path.display()))?;

        let schema_path = manifest_schema_path();
        let allowed = BTreeSet::from([MANIFEST_SCHEMA_VERSION.to_string()]);
        let schema = load_json_schema(&schema_path, &allowed)
            .with_context(|| format!("loading manifest schema {}", schema_path.display()))?;
        validate_document(&schema, &value, path)?;

        let manifest: FrameworkManifest = serde_json::from_value(value)
            .with_context(|| format!("decoding manifest {}", path.display()))?;
        if manifest.schema_version != schema.schema_version {
            bail!(
                "manifest {} declares schema_version '{}', expected '{}'",
                path.display(),
                manifest.schema_version,
                schema.schema_version
            );
        }
        debug!(
            path = %path.display(),
            families = manifest.frameworks.len(),
            "loaded framework manifest"
        );
        Ok(manifest)
    }

    /// Load the manifest named by `FACADE_MANIFEST`, if the variable is set.
    pub fn from_env() -> Result<Option<Self>> {
        match manifest_path_from_env() {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Detected versions in family order.
    pub fn entries(&self) -> impl Iterator<Item = (&FamilyId, &Version)> {
        self.frameworks.iter()
    }
}

impl ResolutionContext for FrameworkManifest {
    fn version_of(&self, family: &FamilyId) -> Option<Version> {
        self.frameworks.get(family).cloned()
    }
}

impl ContextSource for FrameworkManifest {
    fn resolution_context(&self) -> Option<&dyn ResolutionContext> {
        Some(self)
    }
}

#[derive(Clone, Debug, Default)]
/// A named project that may or may not have had its frameworks detected yet.
pub struct ProjectScope {
    pub name: String,
    pub manifest: Option<FrameworkManifest>,
}

impl ProjectScope {
    pub fn new(name: impl Into<String>, manifest: Option<FrameworkManifest>) -> Self {
        Self {
            name: name.into(),
            manifest,
        }
    }
}

impl ContextSource for ProjectScope {
    fn resolution_context(&self) -> Option<&dyn ResolutionContext> {
        self.manifest
            .as_ref()
            .map(|manifest| manifest as &dyn ResolutionContext)
    }
}

/// `FACADE_MANIFEST`, ignoring empty values.
pub fn manifest_path_from_env() -> Option<PathBuf> {
    env::var(MANIFEST_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// The schema bundled with the crate. Files next to a manifest never replace it.
fn manifest_schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(CANONICAL_MANIFEST_SCHEMA_PATH)
}
