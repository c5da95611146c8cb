// src/core/diagram/diagram.rs
use std::collections::{HashMap, HashSet};
use std::fmt;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::{HexviewError, Result};
use super::super::identity::{Identifier, Position};
use super::super::object::{Aggregate, DomainKind, DomainObject, Object, ObjectKind};
use super::super::relation::RelationType;

/// Id prefix reserved for presentational buckets; never valid in a source identifier
pub const BUCKET_PREFIX: char = '#';

/// Id of every diagram's root; directory buckets never start with two prefixes
pub const ROOT_ID: &str = "##";

/// How a diagram's members are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagramType {
    /// One box per member
    Plain,
    /// Members laid out as tables of attributes and methods
    Table,
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Bucket,
    General,
    Class,
    Attribute,
    Function,
    Method,
    Interface,
    InterfaceMethod,
    Aggregate,
    Entity,
    ValueObject,
}

impl NodeKind {
    /// Kinds summarized as a box with method and attribute columns
    pub fn has_members(&self) -> bool {
        matches!(self, Self::Entity | Self::ValueObject | Self::Interface | Self::Class)
    }

    /// Kinds that only exist as a column entry of another node
    pub fn is_member(&self) -> bool {
        matches!(self, Self::Attribute | Self::Method | Self::InterfaceMethod)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bucket => "bucket",
            Self::General => "general",
            Self::Class => "class",
            Self::Attribute => "attribute",
            Self::Function => "function",
            Self::Method => "method",
            Self::Interface => "interface",
            Self::InterfaceMethod => "interface method",
            Self::Aggregate => "aggregate",
            Self::Entity => "entity",
            Self::ValueObject => "value object",
        };
        f.write_str(s)
    }
}

/// A placed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    /// Key inside the diagram (render id)
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Undecorated identifier used for relation queries
    pub origin: Option<Identifier>,
    pub domain: Option<String>,
    pub position: Position,
}

impl DiagramNode {
    pub fn bucket(key: &str, label: &str) -> Self {
        Self {
            id: bucket_id(key),
            name: label.to_string(),
            kind: NodeKind::Bucket,
            origin: None,
            domain: None,
            position: Position::synthetic(),
        }
    }

    pub fn from_object(object: &Object) -> Self {
        let kind = match object.kind() {
            ObjectKind::General => NodeKind::General,
            ObjectKind::Class { .. } => NodeKind::Class,
            ObjectKind::Attribute => NodeKind::Attribute,
            ObjectKind::Function { receiver: Some(_) } => NodeKind::Method,
            ObjectKind::Function { receiver: None } => NodeKind::Function,
            ObjectKind::Interface { .. } => NodeKind::Interface,
            ObjectKind::InterfaceMethod => NodeKind::InterfaceMethod,
            ObjectKind::Str => NodeKind::Bucket,
        };

        if kind == NodeKind::Bucket {
            return Self::bucket(&object.id(), object.identifier().name());
        }

        Self {
            id: object.id(),
            name: display_name(object.identifier().name(), kind),
            kind,
            origin: Some(object.identifier().clone()),
            domain: None,
            position: object.position().clone(),
        }
    }

    pub fn from_domain(object: &DomainObject) -> Self {
        let kind = match object.kind {
            DomainKind::Entity => NodeKind::Entity,
            DomainKind::ValueObject => NodeKind::ValueObject,
            DomainKind::Class => NodeKind::Class,
            DomainKind::Interface => NodeKind::Interface,
            DomainKind::Function => NodeKind::Function,
            DomainKind::General => NodeKind::General,
            DomainKind::Attribute => NodeKind::Attribute,
            DomainKind::Method => NodeKind::Method,
        };
        Self {
            id: object.identifier().id(),
            name: display_name(object.name(), kind),
            kind,
            origin: Some(object.origin_identifier().clone()),
            domain: Some(object.domain.clone()),
            position: object.position.clone(),
        }
    }

    /// An aggregate node; its origin is the bound root entity
    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        Self {
            id: aggregate.domain.clone(),
            name: aggregate.name.clone(),
            kind: NodeKind::Aggregate,
            origin: aggregate.entity.as_ref().map(|e| e.source.clone()),
            domain: Some(aggregate.domain.clone()),
            position: aggregate.position.clone(),
        }
    }

    pub fn is_bucket(&self) -> bool {
        self.kind == NodeKind::Bucket
    }
}

pub fn bucket_id(key: &str) -> String {
    format!("{}{}", BUCKET_PREFIX, key)
}

/// Members are named `Owner.member`; show just the member part
fn display_name(name: &str, kind: NodeKind) -> String {
    if kind.is_member() {
        name.rsplit('.').next().unwrap_or(name).to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub relation_type: RelationType,
    pub from_position: Position,
    pub to_position: Position,
}

/// One raw edge found while traversing a diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub relation_type: RelationType,
    pub from_position: Position,
    pub to_position: Position,
}

/// All records sharing `(from, to, type)` folded into one rendered edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedEdge {
    pub from: String,
    pub to: String,
    pub relation_type: RelationType,
    pub count: usize,
    /// Distinct (from, to) position pairs in first-seen order
    pub positions: Vec<(Position, Position)>,
}

/// A rooted presentation tree with additional relation edges
#[derive(Debug)]
pub struct Diagram {
    name: String,
    diagram_type: DiagramType,
    graph: DiGraph<DiagramNode, DiagramEdge>,
    index: HashMap<String, NodeIndex>,
    root: NodeIndex,
    objects: Vec<NodeIndex>,
}

impl Diagram {
    pub fn new(name: &str, diagram_type: DiagramType) -> Self {
        let mut graph = DiGraph::new();
        let mut root_node = DiagramNode::from_object(&Object::string("", name));
        root_node.id = ROOT_ID.to_string();
        let mut index = HashMap::new();
        index.insert(root_node.id.clone(), NodeIndex::new(0));
        let root = graph.add_node(root_node);

        Self {
            name: name.to_string(),
            diagram_type,
            graph,
            index,
            root,
            objects: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.diagram_type
    }

    pub fn root_id(&self) -> &str {
        &self.graph[self.root].id
    }

    pub fn add_node(&mut self, node: DiagramNode) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(HexviewError::Duplicate(node.id));
        }
        let key = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        self.objects.push(idx);
        Ok(())
    }

    pub fn add_edge(&mut self, from: &str, to: &str, edge: DiagramEdge) -> Result<()> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        self.graph.add_edge(from, to, edge);
        Ok(())
    }

    /// Add `node` and attach it below `parent` with a structural or member edge
    pub fn place(&mut self, parent: &str, node: DiagramNode, relation_type: RelationType) -> Result<String> {
        let parent_position = self
            .node(parent)
            .map(|p| p.position.clone())
            .ok_or_else(|| HexviewError::NotFound(parent.to_string()))?;
        let id = node.id.clone();
        let edge = DiagramEdge {
            relation_type,
            from_position: parent_position,
            to_position: node.position.clone(),
        };
        self.add_node(node)?;
        self.add_edge(parent, &id, edge)?;
        Ok(id)
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every added node in insertion order (the root excluded)
    pub fn objects(&self) -> Vec<&DiagramNode> {
        self.objects.iter().map(|idx| &self.graph[*idx]).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Outgoing edges of a node as (target id, edge), in insertion order
    pub fn children(&self, id: &str) -> Vec<(&DiagramNode, &DiagramEdge)> {
        match self.index.get(id) {
            Some(idx) => self
                .outgoing(*idx)
                .into_iter()
                .map(|(target, edge)| (&self.graph[target], edge))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Origins of a node and of everything placed below it, members included
    pub fn origins_below(&self, id: &str) -> Vec<Identifier> {
        let mut origins = Vec::new();
        if let Some(idx) = self.index.get(id) {
            self.collect_origins(*idx, &mut origins);
        }
        origins
    }

    /// Drawable edges found by a depth-first walk from the root, unmerged
    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        let mut records = Vec::new();
        let mut visited = HashSet::new();
        self.collect_edges(self.root, &mut visited, &mut records);
        records
    }

    /// Drawable edges with duplicates folded together
    pub fn edges(&self) -> Vec<MergedEdge> {
        merge_edges(self.edge_records())
    }

    pub(super) fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub(super) fn weight(&self, idx: NodeIndex) -> &DiagramNode {
        &self.graph[idx]
    }

    pub(super) fn outgoing(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DiagramEdge)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex, &DiagramEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, target, edge)| (target, edge)).collect()
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| HexviewError::NotFound(id.to_string()))
    }

    fn collect_origins(&self, idx: NodeIndex, origins: &mut Vec<Identifier>) {
        if let Some(origin) = &self.graph[idx].origin {
            if !origins.contains(origin) {
                origins.push(origin.clone());
            }
        }
        for (target, edge) in self.outgoing(idx) {
            if edge.relation_type.is_structural() || edge.relation_type.is_member() {
                self.collect_origins(target, origins);
            }
        }
    }

    fn collect_edges(&self, idx: NodeIndex, visited: &mut HashSet<NodeIndex>, records: &mut Vec<EdgeRecord>) {
        if !visited.insert(idx) {
            return;
        }
        let source = &self.graph[idx];
        let outgoing = self.outgoing(idx);

        for (target, edge) in &outgoing {
            if is_drawable(source, edge.relation_type) {
                records.push(EdgeRecord {
                    from: source.id.clone(),
                    to: self.graph[*target].id.clone(),
                    relation_type: edge.relation_type,
                    from_position: edge.from_position.clone(),
                    to_position: edge.to_position.clone(),
                });
            }
        }
        for (target, _) in outgoing {
            self.collect_edges(target, visited, records);
        }
    }
}

fn is_drawable(source: &DiagramNode, relation_type: RelationType) -> bool {
    match relation_type {
        RelationType::Attribution
        | RelationType::Behavior
        | RelationType::Embedding
        | RelationType::Composition => false,
        RelationType::Aggregation => !source.is_bucket(),
        _ => true,
    }
}

/// Fold records by `(from, to, type)`, counting occurrences and keeping distinct positions
pub fn merge_edges(records: Vec<EdgeRecord>) -> Vec<MergedEdge> {
    let mut merged: Vec<MergedEdge> = Vec::new();
    let mut slots: HashMap<(String, String, RelationType), usize> = HashMap::new();

    for record in records {
        let key = (record.from.clone(), record.to.clone(), record.relation_type);
        let pair = (record.from_position, record.to_position);
        match slots.get(&key) {
            Some(&slot) => {
                let edge = &mut merged[slot];
                edge.count += 1;
                if !edge.positions.contains(&pair) {
                    edge.positions.push(pair);
                }
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(MergedEdge {
                    from: record.from,
                    to: record.to,
                    relation_type: record.relation_type,
                    count: 1,
                    positions: vec![pair],
                });
            }
        }
    }

    merged
}
