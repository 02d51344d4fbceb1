use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable name of a capability family (e.g., `jpa.entity_manager`).
///
/// Families key the provider registry and double as capability tags, so a
/// definition can advertise that it also satisfies another family.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub String);

/// Identifier of one operation declared by a family's contract.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub String);

impl FamilyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl OperationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FamilyId {
    fn from(value: &str) -> Self {
        FamilyId(value.to_string())
    }
}

impl From<&str> for OperationId {
    fn from(value: &str) -> Self {
        OperationId(value.to_string())
    }
}

impl Borrow<str> for FamilyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
