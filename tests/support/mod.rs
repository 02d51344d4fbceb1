#![allow(dead_code)]

use facadekit::{
    ContractDefinition, DefinitionSet, FacadeRegistry, FamilyId, FrameworkManifest, Version,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub const ORM: &str = "orm";
pub const CRITERIA: &str = "criteria";

pub fn family(name: &str) -> FamilyId {
    FamilyId::from(name)
}

pub fn version(text: &str) -> Version {
    Version::parse(text).expect("fixture version parses")
}

/// Levels 9, 10 and 11 of the `orm` family.
///
/// Level 9 declares `a` and `describe` (which calls `a`), level 10 only adds
/// `b` and carries the `criteria` tag, level 11 overrides `a` and adds `c`.
pub fn orm_definitions() -> Vec<Arc<ContractDefinition>> {
    vec![
        ContractDefinition::builder(ORM, version("11"))
            .constant("a", json!("eleven"))
            .constant("c", json!("c"))
            .build(),
        ContractDefinition::builder(ORM, version("9"))
            .constant("a", json!("nine"))
            .operation("describe", |facade, _| {
                let a = facade.call("a", &[])?;
                Ok(json!(format!("level {} says {}", facade.level(), a.as_str().unwrap_or("?"))))
            })
            .build(),
        ContractDefinition::builder(ORM, version("10"))
            .also_satisfies(CRITERIA)
            .constant("b", json!("b"))
            .build(),
    ]
}

pub fn orm_registry() -> FacadeRegistry {
    let registry = FacadeRegistry::new();
    registry.register_provider(ORM, Arc::new(DefinitionSet::new(orm_definitions())));
    registry
}

pub fn write_manifest(dir: &Path, manifest: &FrameworkManifest) -> std::path::PathBuf {
    let path = dir.join("frameworks.json");
    let file = std::fs::File::create(&path).expect("create manifest");
    serde_json::to_writer_pretty(file, manifest).expect("write manifest");
    path
}
