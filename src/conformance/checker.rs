//! Concrete-vs-reference conformance.
//!
//! Two rules: every concrete task incarnates an existing reference activity,
//! and the concrete counterparts of a reference parallel block are not
//! joined by an exclusive merge.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use tracing::info;

use super::incarnation::IncarnationMap;
use crate::error::Failure;
use crate::graph::{ProcessGraph, Scope, ScopeId};
use crate::model::GatewayKind;
use crate::soundness::blocks::BlockWalker;

type Located = (ScopeId, NodeIndex);

pub struct ConformanceChecker<'a> {
    concrete: &'a ProcessGraph,
    reference: &'a ProcessGraph,
    incarnations: IncarnationMap,
}

impl<'a> ConformanceChecker<'a> {
    pub fn new(concrete: &'a ProcessGraph, reference: &'a ProcessGraph, stereotype: &str) -> Self {
        ConformanceChecker {
            concrete,
            reference,
            incarnations: IncarnationMap::from_graph(concrete, stereotype),
        }
    }

    pub fn incarnations(&self) -> &IncarnationMap {
        &self.incarnations
    }

    pub fn check(&self) -> Vec<Failure> {
        let (mut failures, counterparts) = self.check_incarnations();
        failures.extend(self.check_parallel_blocks(&counterparts));

        info!(
            concrete = %self.concrete.name,
            reference = %self.reference.name,
            failures = failures.len(),
            "conformance checked"
        );
        failures
    }

    /// Reference activity → its concrete counterparts, in concrete preorder.
    fn check_incarnations(&self) -> (Vec<Failure>, HashMap<Located, Vec<Located>>) {
        let mut failures = Vec::new();
        let mut counterparts: HashMap<Located, Vec<Located>> = HashMap::new();

        for (scope, idx, node) in self.concrete.nodes() {
            if !node.kind.is_task() {
                continue;
            }
            let targets = self.incarnations.incarnations(&node.qualified_id);
            let resolved: Vec<Located> = targets
                .iter()
                .filter_map(|target| self.resolve_reference(target))
                .collect();

            if resolved.is_empty() {
                failures.push(Failure::TaskNotIncarnated {
                    task: node.qualified_id.clone(),
                    reference: targets.first().cloned(),
                });
            }
            for target in resolved {
                counterparts.entry(target).or_default().push((scope.id, idx));
            }
        }

        (failures, counterparts)
    }

    /// Qualified id first, then the first activity with that local id.
    fn resolve_reference(&self, id: &str) -> Option<Located> {
        let is_activity =
            |(scope, idx): Located| self.reference.scope(scope).node(idx).kind.is_activity();

        if let Some(found) = self.reference.find(id).filter(|&found| is_activity(found)) {
            return Some(found);
        }
        self.reference
            .scopes()
            .iter()
            .filter_map(|scope| scope.lookup(id).map(|idx| (scope.id, idx)))
            .find(|&found| is_activity(found))
    }

    fn check_parallel_blocks(&self, counterparts: &HashMap<Located, Vec<Located>>) -> Vec<Failure> {
        let mut failures = Vec::new();

        for scope in self.reference.scopes() {
            for (split, node) in scope.nodes() {
                if node.kind.split_kind() != Some(GatewayKind::And) {
                    continue;
                }
                if let Some(failure) = self.parallel_block(scope, split, counterparts) {
                    failures.push(failure);
                }
            }
        }

        failures
    }

    fn parallel_block(
        &self,
        scope: &Scope,
        split: NodeIndex,
        counterparts: &HashMap<Located, Vec<Located>>,
    ) -> Option<Failure> {
        let branches = scope.successors(split);
        if branches.len() < 2 {
            return None;
        }
        let closure = BlockWalker::new(scope).nearest_common_merge(&branches);

        // Each branch is represented by its first activity with a concrete counterpart.
        let mut represented: Vec<(Vec<NodeIndex>, Located)> = Vec::new();
        for &first in &branches {
            let path = branch_path(scope, split, first, closure);
            let counterpart = path
                .iter()
                .filter_map(|&idx| counterparts.get(&(scope.id, idx)))
                .find_map(|found| found.first().copied());
            if let Some(counterpart) = counterpart {
                represented.push((path, counterpart));
            }
        }

        let concrete_scope = represented
            .iter()
            .map(|(_, (scope, _))| *scope)
            .find(|&candidate| {
                represented.iter().filter(|(_, (s, _))| *s == candidate).count() > 1
            })?;
        let in_scope: Vec<&(Vec<NodeIndex>, Located)> = represented
            .iter()
            .filter(|(_, (s, _))| *s == concrete_scope)
            .collect();

        let mut starts: Vec<NodeIndex> = Vec::new();
        for (_, (_, idx)) in &in_scope {
            if !starts.contains(idx) {
                starts.push(*idx);
            }
        }
        if starts.len() < 2 {
            return None;
        }

        let target = self.concrete.scope(concrete_scope);
        let merge = BlockWalker::new(target).nearest_common_merge(&starts)?;
        if target.node(merge).kind.merge_kind() != Some(GatewayKind::Xor) {
            return None;
        }

        Some(Failure::ParallelBranchesClosedWithXor {
            reference_split: scope.qualified(split),
            concrete_merge: target.qualified(merge),
            branch_paths: in_scope
                .iter()
                .map(|(path, _)| path.iter().map(|&idx| scope.qualified(idx)).collect())
                .collect(),
        })
    }
}

/// `split`, then the first-successor walk from `first` up to and including
/// the closing merge, an end, or a node already on the path.
fn branch_path(
    scope: &Scope,
    split: NodeIndex,
    first: NodeIndex,
    closure: Option<NodeIndex>,
) -> Vec<NodeIndex> {
    let mut path = vec![split];
    let mut seen: HashSet<NodeIndex> = HashSet::from([split]);
    let mut cursor = Some(first);

    while let Some(idx) = cursor {
        if !seen.insert(idx) {
            break;
        }
        path.push(idx);
        if Some(idx) == closure {
            break;
        }
        cursor = scope.successors(idx).first().copied();
    }

    path
}
