//! Chain composition and dispatch.
//!
//! A chain is the applicable subset of a family's definitions ordered newest
//! first. Node `i` links to node `i + 1` (the next-older level); node 0 is the
//! root, and its facade is what the registry hands out. Composition collapses
//! the chain into one merged table on the root: for every operation id, the
//! newest node declaring it wins, and older nodes only fill operations the
//! newer ones never redefined.

use crate::contract::definition::ContractDefinition;
use crate::contract::identity::{FamilyId, OperationId};
use crate::errors::{FacadeError, FacadeResult};
use crate::version::Version;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const ROOT: usize = 0;

/// Composed, immutable chain of applicable definitions for one request.
pub struct ContractChain {
    family: FamilyId,
    ceiling: Version,
    nodes: Vec<ChainNode>,
    // Operation id -> position of the node that supplies it (root view).
    merged: BTreeMap<OperationId, usize>,
}

struct ChainNode {
    definition: Arc<ContractDefinition>,
    // Cross-family lookups answered from this node: target -> matching position.
    capability_memo: DashMap<FamilyId, Option<usize>>,
}

impl ContractChain {
    /// Compose `definitions` under `ceiling` and return the root facade.
    ///
    /// Definitions of other families are ignored, and definitions above the
    /// ceiling are skipped unless the ceiling is [`Version::LATEST`]. Returns
    /// `None` when nothing applies.
    pub fn build(
        family: &FamilyId,
        definitions: &[Arc<ContractDefinition>],
        ceiling: &Version,
    ) -> Option<Facade> {
        let mut applicable: Vec<Arc<ContractDefinition>> = definitions
            .iter()
            .filter(|def| def.family() == family)
            .filter(|def| ceiling.is_latest() || def.level().is_at_most(ceiling))
            .cloned()
            .collect();
        if applicable.is_empty() {
            debug!(%family, %ceiling, "no definition applies");
            return None;
        }

        // Stable sort keeps provider order for equal levels; the later one
        // ends up newer in the fold.
        applicable.sort_by(|a, b| a.level().compare(b.level()));

        // Fold oldest to newest, each new node linking to the previous one;
        // the last node folded becomes the root at position 0.
        let nodes: Vec<ChainNode> = applicable
            .into_iter()
            .rev()
            .map(|definition| ChainNode {
                definition,
                capability_memo: DashMap::new(),
            })
            .collect();

        let mut merged = BTreeMap::new();
        for (position, node) in nodes.iter().enumerate() {
            for op in node.definition.operation_ids() {
                merged.entry(op.clone()).or_insert(position);
            }
        }

        debug!(
            %family,
            %ceiling,
            levels = ?nodes.iter().map(|n| n.definition.level().to_string()).collect::<Vec<_>>(),
            operations = merged.len(),
            "composed contract chain"
        );

        let chain = ContractChain {
            family: family.clone(),
            ceiling: ceiling.clone(),
            nodes,
            merged,
        };
        Some(Facade {
            chain: Arc::new(chain),
            position: ROOT,
        })
    }

    pub fn family(&self) -> &FamilyId {
        &self.family
    }

    /// The requested ceiling the chain was composed under.
    pub fn ceiling(&self) -> &Version {
        &self.ceiling
    }

    /// Levels in the chain, newest first.
    pub fn levels(&self) -> impl Iterator<Item = &Version> {
        self.nodes.iter().map(|node| node.definition.level())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolved dispatcher: a handle onto one node of a composed chain.
///
/// Cloning is cheap. Equality is identity based: two facades are equal only
/// when they point at the same node of the same composed chain.
#[derive(Clone)]
pub struct Facade {
    chain: Arc<ContractChain>,
    position: usize,
}

impl Facade {
    /// The family this chain was resolved for.
    pub fn family(&self) -> &FamilyId {
        &self.chain.family
    }

    /// The chain this facade belongs to.
    pub fn chain(&self) -> &ContractChain {
        &self.chain
    }

    /// Definition backing this node.
    pub fn definition(&self) -> &ContractDefinition {
        &self.node().definition
    }

    /// Level of this node's definition.
    pub fn level(&self) -> &Version {
        self.definition().level()
    }

    /// Requested version, or `None` when resolved via [`Version::LATEST`].
    pub fn version(&self) -> Option<&Version> {
        (!self.chain.ceiling.is_latest()).then_some(&self.chain.ceiling)
    }

    pub fn is_root(&self) -> bool {
        self.position == ROOT
    }

    /// Facade of the next-older level, if any.
    pub fn nested(&self) -> Option<Facade> {
        let next = self.position + 1;
        (next < self.chain.nodes.len()).then(|| self.at(next))
    }

    /// Invoke `op` with JSON arguments.
    ///
    /// The body runs against the facade of the level that supplied it, not
    /// necessarily this one. Fails with an internal contract error when no
    /// level of the chain declares `op`.
    pub fn call(&self, op: &str, args: &[Value]) -> FacadeResult<Value> {
        let owner = self.supplier(op).ok_or_else(|| self.missing_operation(op))?;
        let body = self.chain.nodes[owner]
            .definition
            .operation(op)
            .cloned()
            .ok_or_else(|| self.missing_operation(op))?;
        let bound = self.at(owner);
        trace!(family = %self.chain.family, op, level = %bound.level(), "dispatching");
        body(&bound, args)
    }

    /// [`Facade::call`] followed by decoding the JSON result into `T`.
    pub fn invoke<T: DeserializeOwned>(&self, op: &str, args: &[Value]) -> FacadeResult<T> {
        let value = self.call(op, args)?;
        serde_json::from_value(value).map_err(|source| FacadeError::Decode {
            operation: OperationId::from(op),
            source,
        })
    }

    /// Level of the definition that would answer `op` from this facade.
    pub fn supplier_level(&self, op: &str) -> Option<&Version> {
        self.supplier(op)
            .map(|position| self.chain.nodes[position].definition.level())
    }

    /// Every operation id reachable from this facade.
    pub fn operations(&self) -> BTreeSet<&OperationId> {
        self.chain.nodes[self.position..]
            .iter()
            .flat_map(|node| node.definition.operation_ids())
            .collect()
    }

    /// Find a level, starting here and walking toward older ones, whose
    /// definition carries the `target` capability tag. Memoized per node.
    pub fn opt_api(&self, target: &FamilyId) -> Option<Facade> {
        let found = *self
            .node()
            .capability_memo
            .entry(target.clone())
            .or_insert_with(|| {
                let hit = (self.position..self.chain.nodes.len())
                    .find(|&position| self.chain.nodes[position].definition.satisfies(target));
                debug!(family = %self.chain.family, %target, ?hit, "memoized capability lookup");
                hit
            });
        found.map(|position| self.at(position))
    }

    /// Like [`Facade::opt_api`], but a miss is an unsupported-capability error.
    pub fn api(&self, target: &FamilyId) -> FacadeResult<Facade> {
        self.opt_api(target)
            .ok_or_else(|| FacadeError::UnsupportedCapability {
                family: self.chain.family.clone(),
                level: self.level().clone(),
                target: target.clone(),
            })
    }

    fn node(&self) -> &ChainNode {
        &self.chain.nodes[self.position]
    }

    fn at(&self, position: usize) -> Facade {
        Facade {
            chain: Arc::clone(&self.chain),
            position,
        }
    }

    fn supplier(&self, op: &str) -> Option<usize> {
        if self.is_root() {
            return self.chain.merged.get(op).copied();
        }
        // Non-root nodes resolve over their own sub-chain with the same
        // newest-wins rule.
        (self.position..self.chain.nodes.len())
            .find(|&position| self.chain.nodes[position].definition.declares(op))
    }

    fn missing_operation(&self, op: &str) -> FacadeError {
        FacadeError::MissingOperation {
            family: self.chain.family.clone(),
            level: self.level().clone(),
            operation: OperationId::from(op),
        }
    }
}

impl PartialEq for Facade {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.chain, &other.chain) && self.position == other.position
    }
}

impl Eq for Facade {}

impl fmt::Display for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.chain.family, self.level())?;
        match self.version() {
            Some(version) => write!(f, " (requested {version})"),
            None => write!(f, " (latest)"),
        }
    }
}

impl fmt::Debug for Facade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("family", &self.chain.family)
            .field("level", self.level())
            .field("ceiling", &self.chain.ceiling)
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn family() -> FamilyId {
        FamilyId::from("orm")
    }

    fn levels_9_10_11() -> Vec<Arc<ContractDefinition>> {
        vec![
            ContractDefinition::builder("orm", Version::new([11]))
                .constant("a", json!("eleven"))
                .constant("c", json!("c"))
                .build(),
            ContractDefinition::builder("orm", Version::new([9]))
                .constant("a", json!("nine"))
                .constant("b", json!("b-nine"))
                .build(),
            ContractDefinition::builder("orm", Version::new([10]))
                .constant("b", json!("b-ten"))
                .build(),
        ]
    }

    fn levels(facade: &Facade) -> Vec<String> {
        facade.chain().levels().map(Version::to_string).collect()
    }

    #[test]
    fn ceiling_filters_and_orders_newest_first() {
        let defs = levels_9_10_11();
        let at_ten = ContractChain::build(&family(), &defs, &Version::new([10])).unwrap();
        assert_eq!(levels(&at_ten), vec!["10", "9"]);
        assert_eq!(at_ten.level(), &Version::new([10]));
        assert_eq!(at_ten.version(), Some(&Version::new([10])));

        let latest = ContractChain::build(&family(), &defs, &Version::LATEST).unwrap();
        assert_eq!(levels(&latest), vec!["11", "10", "9"]);
        assert_eq!(latest.version(), None);
    }

    #[test]
    fn nothing_applicable_builds_nothing() {
        let defs = levels_9_10_11();
        assert!(ContractChain::build(&family(), &defs, &Version::new([8, 9])).is_none());
        assert!(ContractChain::build(&family(), &[], &Version::LATEST).is_none());
    }

    #[test]
    fn newest_body_wins_and_older_levels_fill_gaps() {
        let defs = levels_9_10_11();

        let at_ten = ContractChain::build(&family(), &defs, &Version::new([10])).unwrap();
        assert_eq!(at_ten.call("a", &[]).unwrap(), json!("nine"));
        assert_eq!(at_ten.call("b", &[]).unwrap(), json!("b-ten"));
        let err = at_ten.call("c", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalContract);

        let at_eleven = ContractChain::build(&family(), &defs, &Version::new([11])).unwrap();
        assert_eq!(at_eleven.call("a", &[]).unwrap(), json!("eleven"));
        assert_eq!(at_eleven.call("c", &[]).unwrap(), json!("c"));
        assert_eq!(at_eleven.supplier_level("b"), Some(&Version::new([10])));
    }

    #[test]
    fn bodies_run_against_their_own_level() {
        // Level 9's `describe` calls `name`; level 10 overrides `name` but not
        // `describe`, so the call stays on level 9's view of the chain.
        let defs = vec![
            ContractDefinition::builder("orm", Version::new([9]))
                .constant("name", json!("legacy"))
                .operation("describe", |facade, _| {
                    let name = facade.call("name", &[])?;
                    Ok(json!(format!("{}:{}", facade.level(), name.as_str().unwrap_or(""))))
                })
                .build(),
            ContractDefinition::builder("orm", Version::new([10]))
                .constant("name", json!("modern"))
                .build(),
        ];
        let root = ContractChain::build(&family(), &defs, &Version::LATEST).unwrap();
        assert_eq!(root.call("name", &[]).unwrap(), json!("modern"));
        assert_eq!(root.call("describe", &[]).unwrap(), json!("9:legacy"));
    }

    #[test]
    fn arguments_reach_the_body_and_results_decode() {
        let defs = vec![
            ContractDefinition::builder("orm", Version::new([1]))
                .operation("sum", |_, args| {
                    Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
                })
                .build(),
        ];
        let root = ContractChain::build(&family(), &defs, &Version::LATEST).unwrap();
        let total: i64 = root.invoke("sum", &[json!(2), json!(5)]).unwrap();
        assert_eq!(total, 7);

        let err = root.invoke::<String>("sum", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn repeated_builds_resolve_identically_but_are_distinct() {
        let defs = levels_9_10_11();
        let first = ContractChain::build(&family(), &defs, &Version::new([11])).unwrap();
        let second = ContractChain::build(&family(), &defs, &Version::new([11])).unwrap();
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
        assert_eq!(first.operations(), second.operations());
        for op in first.operations() {
            assert_eq!(first.supplier_level(op.as_str()), second.supplier_level(op.as_str()));
            assert_eq!(
                first.call(op.as_str(), &[]).unwrap(),
                second.call(op.as_str(), &[]).unwrap()
            );
        }
    }

    #[test]
    fn cross_family_lookup_walks_toward_older_levels() {
        let defs = vec![
            ContractDefinition::builder("orm", Version::new([9]))
                .constant("a", json!(9))
                .build(),
            ContractDefinition::builder("orm", Version::new([10]))
                .also_satisfies("criteria")
                .constant("a", json!(10))
                .build(),
            ContractDefinition::builder("orm", Version::new([11]))
                .constant("a", json!(11))
                .build(),
        ];
        let criteria = FamilyId::from("criteria");

        let latest = ContractChain::build(&family(), &defs, &Version::LATEST).unwrap();
        let found = latest.api(&criteria).unwrap();
        assert_eq!(found.level(), &Version::new([10]));
        assert!(!found.is_root());
        assert_eq!(found.call("a", &[]).unwrap(), json!(10));
        // Memoized answers hand back the same node.
        assert_eq!(latest.opt_api(&criteria), Some(found.clone()));

        let old = ContractChain::build(&family(), &defs, &Version::new([9, 5])).unwrap();
        assert!(old.opt_api(&criteria).is_none());
        let err = old.api(&criteria).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedCapability);

        // A node only searches itself and older levels.
        let nine = found.nested().unwrap();
        assert!(nine.opt_api(&criteria).is_none());
        assert_eq!(nine.opt_api(&family()), Some(nine.clone()));
    }

    #[test]
    fn foreign_family_definitions_are_ignored() {
        let mut defs = levels_9_10_11();
        defs.push(
            ContractDefinition::builder("web", Version::new([10, 5]))
                .constant("a", json!("web"))
                .build(),
        );
        let at_eleven = ContractChain::build(&family(), &defs, &Version::new([11])).unwrap();
        assert_eq!(levels(&at_eleven), vec!["11", "10", "9"]);
        assert_eq!(at_eleven.nested().unwrap().call("a", &[]).unwrap(), json!("nine"));

        let only_web = &defs[3..];
        assert!(ContractChain::build(&family(), only_web, &Version::LATEST).is_none());
    }

    #[test]
    fn display_reports_family_level_and_request() {
        let defs = levels_9_10_11();
        let at_ten = ContractChain::build(&family(), &defs, &Version::new([10, 2])).unwrap();
        assert_eq!(at_ten.to_string(), "orm@10 (requested 10.2)");
        let latest = ContractChain::build(&family(), &defs, &Version::LATEST).unwrap();
        assert_eq!(latest.to_string(), "orm@11 (latest)");
    }
}
