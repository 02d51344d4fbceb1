//! Registry of capability families and their resolved facades.
//!
//! The registry is an explicitly constructed value owned by the composition
//! root (typically shared as `Arc<FacadeRegistry>`), so tests can start from a
//! fresh one. It maps each family to a [`Provider`] and memoizes one composed
//! [`Facade`] per (family, version) pair for its whole lifetime.

use crate::context::ResolutionContext;
use crate::contract::{ContractChain, ContractDefinition, Facade, FamilyId};
use crate::errors::{FacadeError, FacadeResult};
use crate::version::Version;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of a family's definitions and of its version within a context.
pub trait Provider: Send + Sync {
    /// Every definition known for the family, in any order.
    fn known_definitions(&self) -> Vec<Arc<ContractDefinition>>;

    /// Version of `family` implied by `context`; `None` when the family does
    /// not apply there. Defaults to asking the context directly.
    fn version_of(&self, family: &FamilyId, context: &dyn ResolutionContext) -> Option<Version> {
        context.version_of(family)
    }
}

/// Provider backed by a fixed list of definitions.
pub struct DefinitionSet {
    definitions: Vec<Arc<ContractDefinition>>,
}

impl DefinitionSet {
    pub fn new(definitions: impl IntoIterator<Item = Arc<ContractDefinition>>) -> Self {
        let definitions: Vec<_> = definitions.into_iter().collect();
        for (idx, def) in definitions.iter().enumerate() {
            let clash = definitions[..idx].iter().any(|earlier| {
                earlier.family() == def.family()
                    && earlier.level().compare(def.level()) == Ordering::Equal
            });
            if clash {
                warn!(
                    family = %def.family(),
                    level = %def.level(),
                    "duplicate definition level; the later one shadows the earlier"
                );
            }
        }
        Self { definitions }
    }
}

impl Provider for DefinitionSet {
    fn known_definitions(&self) -> Vec<Arc<ContractDefinition>> {
        self.definitions.clone()
    }
}

#[derive(Default)]
/// Provider registry plus the resolved-facade cache.
pub struct FacadeRegistry {
    providers: DashMap<FamilyId, Arc<dyn Provider>>,
    resolved: DashMap<(FamilyId, Version), Facade>,
}

impl FacadeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider for `family`.
    ///
    /// Returns true when a previous provider was replaced.
    pub fn register_provider(
        &self,
        family: impl Into<FamilyId>,
        provider: Arc<dyn Provider>,
    ) -> bool {
        let family = family.into();
        let replaced = self.providers.insert(family.clone(), provider).is_some();
        if replaced {
            warn!(%family, "replaced capability provider");
        } else {
            info!(%family, "registered capability provider");
        }
        replaced
    }

    /// Drop the provider for `family`. Facades already resolved stay cached.
    pub fn unregister_provider(&self, family: &FamilyId) -> bool {
        self.providers.remove(family).is_some()
    }

    /// Provider for `family`, or a configuration error when none is registered.
    pub fn provider(&self, family: &FamilyId) -> FacadeResult<Arc<dyn Provider>> {
        self.providers
            .get(family)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| FacadeError::UnregisteredFamily {
                family: family.clone(),
            })
    }

    /// Registered families in stable order.
    pub fn families(&self) -> Vec<FamilyId> {
        let mut families: Vec<FamilyId> =
            self.providers.iter().map(|entry| entry.key().clone()).collect();
        families.sort();
        families
    }

    /// Resolved facade for `family` at `version`, composing it on first use.
    ///
    /// Fails when no known definition has a level at or below `version` (or,
    /// for [`Version::LATEST`], when the family has no definitions at all).
    pub fn create(&self, family: &FamilyId, version: &Version) -> FacadeResult<Facade> {
        let key = (family.clone(), version.clone());
        if let Some(hit) = self.resolved.get(&key) {
            return Ok(hit.value().clone());
        }

        // Compose outside the cache lock; a racing builder produces an
        // equivalent chain and whichever lands first is kept.
        let definitions = self.provider(family)?.known_definitions();
        let facade = ContractChain::build(family, &definitions, version).ok_or_else(|| {
            FacadeError::NoApplicableDefinition {
                family: family.clone(),
                version: version.clone(),
            }
        })?;
        let cached = self.resolved.entry(key).or_insert(facade).value().clone();
        debug!(%family, %version, level = %cached.level(), "cached resolved facade");
        Ok(cached)
    }

    /// Resolve `family` for whatever version `context` implies.
    ///
    /// `Ok(None)` means the family does not apply to this context: either the
    /// context reports no version, or no definition is old enough for it.
    pub fn create_for(
        &self,
        family: &FamilyId,
        context: &dyn ResolutionContext,
    ) -> FacadeResult<Option<Facade>> {
        let Some(version) = self.version(family, context)? else {
            debug!(%family, "family absent from context");
            return Ok(None);
        };
        match self.create(family, &version) {
            Ok(facade) => Ok(Some(facade)),
            Err(FacadeError::NoApplicableDefinition { .. }) => {
                debug!(%family, %version, "no definition applies to context version");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Version of `family` implied by `context`.
    pub fn version(
        &self,
        family: &FamilyId,
        context: &dyn ResolutionContext,
    ) -> FacadeResult<Option<Version>> {
        Ok(self.provider(family)?.version_of(family, context))
    }

    /// Facade composed from every known definition.
    pub fn latest(&self, family: &FamilyId) -> FacadeResult<Facade> {
        self.create(family, &Version::LATEST)
    }

    /// One facade per distinct known level, newest first.
    ///
    /// Recomputed on every call; the facades themselves come from the cache.
    pub fn all_known(&self, family: &FamilyId) -> FacadeResult<Vec<Facade>> {
        let mut levels: Vec<Version> = self
            .provider(family)?
            .known_definitions()
            .iter()
            .map(|def| def.level().clone())
            .collect();
        levels.sort_by(|a, b| b.compare(a));
        levels.dedup_by(|a, b| a.compare(b) == Ordering::Equal);
        levels
            .iter()
            .map(|level| self.create(family, level))
            .collect()
    }

    /// Number of (family, version) pairs resolved so far.
    pub fn cached_len(&self) -> usize {
        self.resolved.len()
    }
}
