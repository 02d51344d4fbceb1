//! JSON Schema loader for the documents the toolkit reads from disk.
//!
//! Callers point at a schema file and the `schema_version` consts they accept,
//! and get back a compiled validator. Validation failures are
//! flattened into one error message listing every violation.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Every schema the toolkit reads pins its version as a const at this pointer.
const SCHEMA_VERSION_POINTER: &str = "/properties/schema_version/const";

/// Result of loading and compiling a JSON Schema.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

/// Load `path`, require its `schema_version` const to be one of `allowed`, and
/// compile it.
pub(crate) fn load_json_schema(
    path: &Path,
    allowed: &BTreeSet<String>,
) -> Result<SchemaLoadResult> {
    let schema_value: Value = serde_json::from_reader(BufReader::new(
        File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
    ))
    .with_context(|| format!("parsing schema {}", path.display()))?;

    let schema_version = extract_schema_version(&schema_value)
        .ok_or_else(|| anyhow!("schema {} missing schema_version const", path.display()))?;
    if !allowed.contains(&schema_version) {
        bail!(
            "schema_version '{}' not in allowed set {:?}",
            schema_version,
            allowed
        );
    }

    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| anyhow!("compiling schema {}: {err}", path.display()))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

/// Validate `document` and report every violation in one error.
pub(crate) fn validate_document(
    schema: &SchemaLoadResult,
    document: &Value,
    origin: &Path,
) -> Result<()> {
    if let Err(errors) = schema.compiled.validate(document) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{} failed schema validation:\n{}",
            origin.display(),
            details
        );
    }
    Ok(())
}

fn extract_schema_version(schema: &Value) -> Option<String> {
    let version = schema
        .pointer(SCHEMA_VERSION_POINTER)
        .and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}
