// src/core/diagram/sub_diagram.rs
use petgraph::graph::NodeIndex;
use serde::Serialize;

use super::super::relation::RelationType;
use super::diagram::{Diagram, NodeKind};

/// Column content of a summarized node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Columns {
    /// A leaf with nothing to list
    Empty,
    /// One list, e.g. the loose functions of a bucket
    Single(Vec<Element>),
    /// Class-style box: methods on the left, attributes on the right
    Double { left: Vec<Element>, right: Vec<Element> },
}

/// Compact summary of a node and its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub columns: Columns,
}

impl Element {
    pub fn left(&self) -> &[Element] {
        match &self.columns {
            Columns::Double { left, .. } => left,
            Columns::Single(items) => items,
            Columns::Empty => &[],
        }
    }

    pub fn right(&self) -> &[Element] {
        match &self.columns {
            Columns::Double { right, .. } => right,
            _ => &[],
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self.columns, Columns::Double { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Present for entity, value-object, interface and class nodes
    pub element: Option<Element>,
}

/// A bucket or aggregate drawn as a cluster of its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubDiagram {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub nodes: Vec<SubNode>,
    pub sub_graphs: Vec<SubDiagram>,
}

impl SubDiagram {
    /// Elements to lay out: one per summarized node, then the plain members as a single list
    pub fn elements(&self) -> Vec<Element> {
        let mut elements: Vec<Element> = self
            .nodes
            .iter()
            .filter_map(|node| node.element.clone())
            .collect();

        let plain: Vec<Element> = self
            .nodes
            .iter()
            .filter(|node| node.element.is_none())
            .map(|node| Element {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: node.kind,
                columns: Columns::Empty,
            })
            .collect();

        if !plain.is_empty() {
            elements.push(Element {
                id: self.id.clone(),
                name: self.name.clone(),
                kind: self.kind,
                columns: Columns::Single(plain),
            });
        }
        elements
    }
}

impl Diagram {
    /// Nested clusters below the root, following the presentation tree
    pub fn sub_diagrams(&self) -> Vec<SubDiagram> {
        self.outgoing(self.root_index())
            .into_iter()
            .filter(|(_, edge)| is_nesting(edge.relation_type))
            .map(|(child, _)| self.build_sub_diagram(child))
            .collect()
    }

    fn build_sub_diagram(&self, idx: NodeIndex) -> SubDiagram {
        let node = self.weight(idx);
        let mut sub = SubDiagram {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            nodes: Vec::new(),
            sub_graphs: Vec::new(),
        };

        for (child, edge) in self.outgoing(idx) {
            if is_nesting(edge.relation_type) || self.weight(child).is_bucket() {
                sub.sub_graphs.push(self.build_sub_diagram(child));
            } else if edge.relation_type == RelationType::Aggregation {
                let member = self.weight(child);
                sub.nodes.push(SubNode {
                    id: member.id.clone(),
                    name: member.name.clone(),
                    kind: member.kind,
                    element: member.kind.has_members().then(|| self.element(child)),
                });
            }
        }
        sub
    }

    fn element(&self, idx: NodeIndex) -> Element {
        let node = self.weight(idx);
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (child, edge) in self.outgoing(idx) {
            match edge.relation_type {
                RelationType::Behavior => left.push(self.element(child)),
                RelationType::Attribution => right.push(self.element(child)),
                _ => {}
            }
        }

        let columns = if node.kind.has_members() {
            Columns::Double { left, right }
        } else {
            Columns::Empty
        };
        Element {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            columns,
        }
    }
}

fn is_nesting(relation_type: RelationType) -> bool {
    matches!(relation_type, RelationType::AggregationRoot | RelationType::Abstraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagram::{DiagramNode, DiagramType};
    use crate::core::identity::{Identifier, Position};
    use crate::core::object::Object;

    fn diagram() -> Diagram {
        let dir = "pkg";
        let mut diagram = Diagram::new("proj", DiagramType::Table);
        let root = diagram.root_id().to_string();
        let bucket = diagram
            .place(&root, DiagramNode::bucket(dir, "pkg"), RelationType::AggregationRoot)
            .unwrap();

        let class = diagram
            .place(
                &bucket,
                DiagramNode::from_object(&Object::class(Identifier::new(dir, "User"), Position::synthetic())),
                RelationType::Aggregation,
            )
            .unwrap();
        diagram
            .place(
                &class,
                DiagramNode::from_object(&Object::attribute(Identifier::new(dir, "User.Name"), Position::synthetic())),
                RelationType::Attribution,
            )
            .unwrap();
        diagram
            .place(
                &class,
                DiagramNode::from_object(&Object::function(
                    Identifier::new(dir, "User.Greet"),
                    Position::synthetic(),
                    Some(Identifier::new(dir, "User")),
                )),
                RelationType::Behavior,
            )
            .unwrap();

        let abstraction = diagram
            .place(&bucket, DiagramNode::bucket("pkg#abstraction", "abstraction"), RelationType::Abstraction)
            .unwrap();
        diagram
            .place(
                &abstraction,
                DiagramNode::from_object(&Object::function(Identifier::new(dir, "New"), Position::synthetic(), None)),
                RelationType::Aggregation,
            )
            .unwrap();
        diagram
    }

    #[test]
    fn test_sub_diagrams_follow_nesting_edges() {
        let subs = diagram().sub_diagrams();
        assert_eq!(subs.len(), 1);

        let pkg = &subs[0];
        assert_eq!(pkg.name, "pkg");
        assert_eq!(pkg.nodes.len(), 1);
        assert_eq!(pkg.sub_graphs.len(), 1);
        assert_eq!(pkg.sub_graphs[0].nodes[0].name, "New");
        assert!(pkg.sub_graphs[0].sub_graphs.is_empty());
        assert_eq!(pkg.nodes[0].id, "pkg/User");
    }

    #[test]
    fn test_class_element_has_two_columns() {
        let subs = diagram().sub_diagrams();
        let user = subs[0].nodes[0].element.as_ref().unwrap();

        assert!(user.is_double());
        assert_eq!(user.left().len(), 1);
        assert_eq!(user.left()[0].name, "Greet");
        assert_eq!(user.right()[0].name, "Name");
    }

    #[test]
    fn test_plain_members_form_single_element() {
        let subs = diagram().sub_diagrams();
        let abstraction = &subs[0].sub_graphs[0];
        let elements = abstraction.elements();

        assert_eq!(elements.len(), 1);
        assert!(!elements[0].is_double());
        assert_eq!(elements[0].left().len(), 1);
        assert_eq!(elements[0].name, "abstraction");
    }
}
