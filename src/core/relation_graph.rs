// src/core/relation_graph.rs
use std::collections::{HashMap, HashSet};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::{HexviewError, Result};
use super::identity::{Identifier, Position};
use super::relation::{Relation, RelationType};
use super::store::{ObjectStore, RelationStore};

/// Type and source positions of one relation edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMeta {
    pub relation_type: RelationType,
    pub from_position: Position,
    pub to_position: Position,
}

/// Directed multigraph of typed code relations over identifiers
pub struct RelationGraph {
    graph: DiGraph<Identifier, RelationMeta>,
    index: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Seed a graph with every stored object and relation
    pub fn from_stores(objects: &ObjectStore, relations: &RelationStore) -> Result<Self> {
        let mut graph = Self::new();
        for id in objects.all() {
            graph.add_obj(id)?;
        }
        relations.walk(|relation| graph.add_relation(relation))?;
        Ok(graph)
    }

    /// Register a node; a second registration of the same id is an error
    pub fn add_obj(&mut self, id: &Identifier) -> Result<()> {
        let key = id.id();
        if self.index.contains_key(&key) {
            return Err(HexviewError::Duplicate(key));
        }
        let node = self.graph.add_node(id.clone());
        self.index.insert(key, node);
        Ok(())
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(&id.id())
    }

    /// Add one typed edge per relation target
    pub fn add_relation(&mut self, relation: &Relation) -> Result<()> {
        let from = self.node(&relation.from.id)?;
        for (target, relation_type) in relation.targets() {
            let to = self.node(&target.id)?;
            self.graph.add_edge(
                from,
                to,
                RelationMeta {
                    relation_type,
                    from_position: relation.from.position.clone(),
                    to_position: target.position.clone(),
                },
            );
        }
        Ok(())
    }

    /// Direct edges from `from` whose target is exactly `to`
    pub fn relation_metas(&self, from: &Identifier, to: &Identifier) -> Result<Vec<RelationMeta>> {
        let from = self.node(from)?;
        let to = self.node(to)?;

        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .filter(|e| e.target() == to)
            .map(|e| e.id())
            .collect();
        edges.sort();

        Ok(self.metas(&edges))
    }

    /// Transitive relations between the ownership clusters of `from` and `to`.
    ///
    /// Every edge reachable from `from` through Composition/Embedding hops
    /// whose target lies in the Composition/Embedding closure of `to`.
    pub fn summary_relation_metas(&self, from: &Identifier, to: &Identifier) -> Result<Vec<RelationMeta>> {
        let from = self.node(from)?;
        let to = self.node(to)?;

        let targets = self.closure_in(to);
        let edges: Vec<EdgeIndex> = self
            .closure_out(from)
            .into_iter()
            .filter(|e| {
                self.graph
                    .edge_endpoints(*e)
                    .map_or(false, |(_, target)| targets.contains(&target))
            })
            .collect();

        Ok(self.metas(&edges))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn node(&self, id: &Identifier) -> Result<NodeIndex> {
        self.index
            .get(&id.id())
            .copied()
            .ok_or_else(|| HexviewError::NotFound(id.id()))
    }

    fn metas(&self, edges: &[EdgeIndex]) -> Vec<RelationMeta> {
        edges
            .iter()
            .filter_map(|e| self.graph.edge_weight(*e).cloned())
            .collect()
    }

    /// Outgoing edges of every node reached through ownership hops, in insertion order
    fn closure_out(&self, start: NodeIndex) -> Vec<EdgeIndex> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut edges = Vec::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                edges.push(edge.id());
                if edge.weight().relation_type.is_ownership() && !visited.contains(&edge.target()) {
                    stack.push(edge.target());
                }
            }
        }

        edges.sort();
        edges
    }

    /// Nodes reached from `start` through ownership hops, `start` included
    fn closure_in(&self, start: NodeIndex) -> HashSet<NodeIndex> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                if edge.weight().relation_type.is_ownership() && !visited.contains(&edge.target()) {
                    stack.push(edge.target());
                }
            }
        }

        visited
    }
}

impl Default for RelationGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relation::{Endpoint, Multiplicity};

    fn id(name: &str) -> Identifier {
        Identifier::new("internal/domain/order/entity", name)
    }

    fn ep(name: &str, line: usize) -> Endpoint {
        Endpoint::new(id(name), Position::new("order.go", line * 10, line, 1))
    }

    fn graph_with(names: &[&str]) -> RelationGraph {
        let mut graph = RelationGraph::new();
        for name in names {
            graph.add_obj(&id(name)).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_obj_rejects_duplicates() {
        let mut graph = graph_with(&["A"]);
        assert!(matches!(graph.add_obj(&id("A")), Err(HexviewError::Duplicate(_))));
    }

    #[test]
    fn test_relation_metas_require_known_ids() {
        let graph = graph_with(&["A"]);
        assert!(matches!(
            graph.relation_metas(&id("A"), &id("B")),
            Err(HexviewError::NotFound(_))
        ));
        assert!(graph.relation_metas(&id("A"), &id("A")).unwrap().is_empty());
    }

    #[test]
    fn test_direct_metas_keep_every_edge_to_target() {
        let mut graph = graph_with(&["A", "B"]);
        graph.add_relation(&Relation::dependency(ep("A", 1), ep("B", 2))).unwrap();
        graph
            .add_relation(&Relation::association(ep("A", 3), ep("B", 2), Multiplicity::OneOne))
            .unwrap();

        let metas = graph.relation_metas(&id("A"), &id("B")).unwrap();
        let types: Vec<_> = metas.iter().map(|m| m.relation_type).collect();
        assert_eq!(types, vec![RelationType::Dependency, RelationType::AssociationOneOne]);
        assert!(graph.relation_metas(&id("B"), &id("A")).unwrap().is_empty());
    }

    #[test]
    fn test_implementation_adds_edge_per_interface() {
        let mut graph = graph_with(&["Repo", "Reader", "Writer"]);
        let mut rel = Relation::implementation(ep("Repo", 1), ep("Reader", 2));
        rel.add_implements(ep("Writer", 3));
        graph.add_relation(&rel).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.relation_metas(&id("Repo"), &id("Writer")).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_collapses_ownership_chain() {
        // A -Composition-> B -Embedding-> C -Association-> D
        let mut graph = graph_with(&["A", "B", "C", "D"]);
        graph.add_relation(&Relation::composition(ep("A", 1), ep("B", 2))).unwrap();
        graph.add_relation(&Relation::embedding(ep("B", 2), ep("C", 3))).unwrap();
        graph
            .add_relation(&Relation::association(ep("C", 3), ep("D", 4), Multiplicity::OneMany))
            .unwrap();

        let metas = graph.summary_relation_metas(&id("A"), &id("D")).unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].relation_type, RelationType::AssociationOneMany);
        assert_eq!(metas[0].from_position.line, 3);
        assert_eq!(metas[0].to_position.line, 4);

        assert!(graph.relation_metas(&id("A"), &id("D")).unwrap().is_empty());
    }

    #[test]
    fn test_summary_targets_cluster_of_to() {
        // X -Dependency-> C where C is owned by B: X reaches B's cluster
        let mut graph = graph_with(&["B", "C", "X"]);
        graph.add_relation(&Relation::composition(ep("B", 1), ep("C", 2))).unwrap();
        graph.add_relation(&Relation::dependency(ep("X", 3), ep("C", 2))).unwrap();

        let metas = graph.summary_relation_metas(&id("X"), &id("B")).unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].relation_type, RelationType::Dependency);
    }

    #[test]
    fn test_summary_survives_ownership_cycles() {
        let mut graph = graph_with(&["A", "B", "D"]);
        graph.add_relation(&Relation::composition(ep("A", 1), ep("B", 2))).unwrap();
        graph.add_relation(&Relation::embedding(ep("B", 2), ep("A", 1))).unwrap();
        graph.add_relation(&Relation::dependency(ep("B", 2), ep("D", 3))).unwrap();

        let metas = graph.summary_relation_metas(&id("A"), &id("D")).unwrap();
        assert_eq!(metas.len(), 1);
    }
}
