//! Shared library for version-scoped capability facades.
//!
//! Callers that target a framework whose public surface shifts between
//! releases declare each capability family as several version-scoped
//! definitions. The registry composes the definitions that apply to a
//! requested (or detected) version into a single `Facade` whose operations
//! resolve newest-wins, falling back to older levels for anything a newer
//! release left unchanged.
//!
//! Public items here form the contract the CLI and tests depend on: version
//! parsing and ordering, contract definitions, the registry, deferred calls,
//! and the manifest-backed resolution context.

pub mod context;
pub mod contract;
pub mod deferred;
pub mod errors;
pub mod registry;
mod schema_loader;
pub mod version;

pub use context::{
    CANONICAL_MANIFEST_SCHEMA_PATH, ContextSource, FrameworkManifest, MANIFEST_ENV,
    MANIFEST_SCHEMA_VERSION, ProjectScope, ResolutionContext, manifest_path_from_env,
};
pub use contract::{
    ContractChain, ContractDefinition, ContractDefinitionBuilder, Facade, FamilyId, OperationFn,
    OperationId,
};
pub use deferred::DeferredCall;
pub use errors::{ErrorKind, FacadeError, FacadeResult};
pub use registry::{DefinitionSet, FacadeRegistry, Provider};
pub use version::Version;

/// Split comma- or whitespace-delimited family lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
