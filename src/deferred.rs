//! Deferred capability calls.
//!
//! A [`DeferredCall`] captures "do this with family F" before any context is
//! known, for example while a code generator is still assembling its plan.
//! Resolution happens in [`DeferredCall::apply`]; when the family does not
//! apply to the given context the result is `Ok(None)` and the transform never
//! runs.

use crate::context::{ContextSource, ResolutionContext};
use crate::contract::{Facade, FamilyId};
use crate::errors::{FacadeError, FacadeResult};
use crate::registry::FacadeRegistry;
use tracing::debug;

type Transform<T> = dyn Fn(Option<&Facade>) -> FacadeResult<T> + Send + Sync;

/// An optional family plus the transform to run against its facade.
pub struct DeferredCall<T> {
    family: Option<FamilyId>,
    transform: Box<Transform<T>>,
}

impl<T> DeferredCall<T> {
    /// Bind `transform` to `family`. With no family the transform is
    /// context-independent and receives `None`.
    pub fn new<F>(family: Option<FamilyId>, transform: F) -> Self
    where
        F: Fn(Option<&Facade>) -> FacadeResult<T> + Send + Sync + 'static,
    {
        Self {
            family,
            transform: Box::new(transform),
        }
    }

    pub fn family(&self) -> Option<&FamilyId> {
        self.family.as_ref()
    }

    /// Resolve against `context` and run the transform.
    ///
    /// Fails with a configuration error when a family is bound but no context
    /// is given, since the version cannot be computed without one.
    pub fn apply(
        &self,
        registry: &FacadeRegistry,
        context: Option<&dyn ResolutionContext>,
    ) -> FacadeResult<Option<T>> {
        let Some(family) = &self.family else {
            return (self.transform)(None).map(Some);
        };
        let context = context.ok_or_else(|| FacadeError::MissingContext {
            family: family.clone(),
        })?;
        match registry.create_for(family, context)? {
            Some(facade) => (self.transform)(Some(&facade)).map(Some),
            None => {
                debug!(%family, "deferred call skipped; family does not apply");
                Ok(None)
            }
        }
    }

    /// [`DeferredCall::apply`] for broader context shapes.
    pub fn apply_to<S>(&self, registry: &FacadeRegistry, source: &S) -> FacadeResult<Option<T>>
    where
        S: ContextSource + ?Sized,
    {
        self.apply(registry, source.resolution_context())
    }
}
