//! Facade error types (thiserror).
//!
//! Every failure is synchronous and deterministic: definition sets are static,
//! so retrying a failed resolution cannot change its outcome. "Not applicable
//! here" is never an error; those paths return `Ok(None)`.

use crate::contract::{FamilyId, OperationId};
use crate::version::Version;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("no provider registered for capability family {family}")]
    UnregisteredFamily { family: FamilyId },

    #[error(
        "a context is mandatory once family {family} is bound; version cannot be computed without it"
    )]
    MissingContext { family: FamilyId },

    #[error("no definition of {family} applies to version {version}")]
    NoApplicableDefinition { family: FamilyId, version: Version },

    #[error("{family} (level {level}) does not provide capability {target}")]
    UnsupportedCapability {
        family: FamilyId,
        level: Version,
        target: FamilyId,
    },

    #[error(
        "no default implementation found for operation {operation} in the resolved chain of {family} (level {level})"
    )]
    MissingOperation {
        family: FamilyId,
        level: Version,
        operation: OperationId,
    },

    #[error("operation {operation} failed: {reason}")]
    OperationFailed {
        operation: OperationId,
        reason: String,
    },

    #[error("decoding result of {operation}: {source}")]
    Decode {
        operation: OperationId,
        source: serde_json::Error,
    },
}

pub type FacadeResult<T> = Result<T, FacadeError>;

/// Coarse classification of a [`FacadeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wiring problem the composition root must fix (unregistered family,
    /// missing context, no applicable definition).
    Configuration,
    /// `api(target)` found no level carrying the requested capability.
    UnsupportedCapability,
    /// The static definition set is malformed (an operation with no default
    /// anywhere in the chain).
    InternalContract,
    /// An operation body itself failed or returned an undecodable value.
    Operation,
}

impl FacadeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacadeError::UnregisteredFamily { .. }
            | FacadeError::MissingContext { .. }
            | FacadeError::NoApplicableDefinition { .. } => ErrorKind::Configuration,
            FacadeError::UnsupportedCapability { .. } => ErrorKind::UnsupportedCapability,
            FacadeError::MissingOperation { .. } => ErrorKind::InternalContract,
            FacadeError::OperationFailed { .. } | FacadeError::Decode { .. } => {
                ErrorKind::Operation
            }
        }
    }

    /// Convenience for operation bodies reporting their own failures.
    pub fn operation_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        FacadeError::OperationFailed {
            operation: OperationId(operation.into()),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "ConfigurationError"),
            Self::UnsupportedCapability => write!(f, "UnsupportedCapabilityError"),
            Self::InternalContract => write!(f, "InternalContractError"),
            Self::Operation => write!(f, "OperationError"),
        }
    }
}
