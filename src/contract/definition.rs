//! Version-scoped contract definitions.
//!
//! A family usually has one definition per framework release that changed its
//! shape. Each definition carries its minimum applicable level, the capability
//! tags it satisfies (always including its own family), and the default body
//! of every operation it declares or overrides.

use crate::contract::chain::Facade;
use crate::contract::identity::{FamilyId, OperationId};
use crate::errors::FacadeResult;
use crate::version::Version;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Default body of one operation.
///
/// The facade passed in is bound to the chain level that supplied the body,
/// so calls to sibling operations resolve at that same level.
pub type OperationFn = dyn Fn(&Facade, &[Value]) -> FacadeResult<Value> + Send + Sync;

/// One version-scoped declaration of a capability family's operations.
pub struct ContractDefinition {
    family: FamilyId,
    level: Version,
    capabilities: BTreeSet<FamilyId>,
    operations: BTreeMap<OperationId, Arc<OperationFn>>,
}

impl ContractDefinition {
    /// Start a definition of `family` valid from `level` upwards.
    pub fn builder(family: impl Into<FamilyId>, level: Version) -> ContractDefinitionBuilder {
        let family = family.into();
        let mut capabilities = BTreeSet::new();
        capabilities.insert(family.clone());
        ContractDefinitionBuilder {
            definition: ContractDefinition {
                family,
                level,
                capabilities,
                operations: BTreeMap::new(),
            },
        }
    }

    pub fn family(&self) -> &FamilyId {
        &self.family
    }

    /// Minimum framework version at which this definition applies.
    pub fn level(&self) -> &Version {
        &self.level
    }

    /// Capability tags, own family included.
    pub fn capabilities(&self) -> &BTreeSet<FamilyId> {
        &self.capabilities
    }

    pub fn satisfies(&self, family: &FamilyId) -> bool {
        self.capabilities.contains(family)
    }

    /// Operation ids this definition supplies a body for.
    pub fn operation_ids(&self) -> impl Iterator<Item = &OperationId> {
        self.operations.keys()
    }

    pub fn operation(&self, id: &str) -> Option<&Arc<OperationFn>> {
        self.operations.get(id)
    }

    pub fn declares(&self, id: &str) -> bool {
        self.operations.contains_key(id)
    }
}

impl fmt::Debug for ContractDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractDefinition")
            .field("family", &self.family)
            .field("level", &self.level)
            .field("capabilities", &self.capabilities)
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder returned by [`ContractDefinition::builder`].
pub struct ContractDefinitionBuilder {
    definition: ContractDefinition,
}

impl ContractDefinitionBuilder {
    /// Tag the definition as also satisfying another capability family.
    pub fn also_satisfies(mut self, family: impl Into<FamilyId>) -> Self {
        self.definition.capabilities.insert(family.into());
        self
    }

    /// Declare (or override) an operation body. A repeated id replaces the
    /// earlier body within this definition.
    pub fn operation<F>(mut self, id: impl Into<OperationId>, body: F) -> Self
    where
        F: Fn(&Facade, &[Value]) -> FacadeResult<Value> + Send + Sync + 'static,
    {
        self.definition
            .operations
            .insert(id.into(), Arc::new(body) as Arc<OperationFn>);
        self
    }

    /// Declare an operation that always answers with the same value.
    pub fn constant(self, id: impl Into<OperationId>, value: Value) -> Self {
        self.operation(id, move |_, _| Ok(value.clone()))
    }

    pub fn build(self) -> Arc<ContractDefinition> {
        Arc::new(self.definition)
    }
}
