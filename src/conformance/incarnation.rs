//! Incarnation links from concrete tasks to reference activities.

use std::collections::BTreeMap;

use crate::graph::ProcessGraph;

/// Concrete qualified id → reference ids named by its incarnation stereotypes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncarnationMap {
    links: BTreeMap<String, Vec<String>>,
}

impl IncarnationMap {
    /// Collect every `stereotype` value on activities of `graph`. A value may
    /// list several reference ids separated by commas.
    pub fn from_graph(graph: &ProcessGraph, stereotype: &str) -> Self {
        let mut links: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (_, _, node) in graph.nodes() {
            let Some(activity) = node.kind.activity() else {
                continue;
            };
            let targets: Vec<String> = activity
                .stereotypes
                .iter()
                .filter(|s| s.name == stereotype)
                .filter_map(|s| s.value.as_deref())
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            if !targets.is_empty() {
                links.entry(node.qualified_id.clone()).or_default().extend(targets);
            }
        }

        IncarnationMap { links }
    }

    pub fn incarnations(&self, concrete: &str) -> &[String] {
        self.links.get(concrete).map(Vec::as_slice).unwrap_or_default()
    }

    /// Concrete nodes incarnating `reference`, in id order.
    pub fn incarnated_by(&self, reference: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|(_, targets)| targets.iter().any(|t| t == reference))
            .map(|(concrete, _)| concrete.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
