//! Capability contract wiring.
//!
//! Definitions declare one family's operations at one minimum framework
//! level; `ContractChain` composes the applicable subset for a requested
//! version and hands back a `Facade`, the resolved dispatcher callers use.
//! Registry lookups live in `crate::registry`.

pub mod chain;
pub mod definition;
pub mod identity;

pub use chain::{ContractChain, Facade};
pub use definition::{ContractDefinition, ContractDefinitionBuilder, OperationFn};
pub use identity::{FamilyId, OperationId};
