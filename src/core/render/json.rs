// src/core/render/json.rs
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::Result;
use super::super::diagram::{Diagram, DiagramType, MergedEdge, SubDiagram};
use super::super::layout::{LayoutEngine, TableLayout};

/// Serialized form of a diagram
#[derive(Debug, Serialize)]
pub struct DiagramDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub diagram_type: DiagramType,
    pub edges: Vec<MergedEdge>,
    pub sub_diagrams: Vec<SubDiagram>,
    /// Laid-out tables keyed by sub-diagram id (table diagrams only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<(String, TableLayout)>,
}

impl DiagramDocument {
    pub fn new(diagram: &Diagram, layout: &LayoutConfig) -> Self {
        let sub_diagrams = diagram.sub_diagrams();
        let mut tables = Vec::new();
        if diagram.diagram_type() == DiagramType::Table {
            let engine = LayoutEngine::new(layout);
            collect_tables(&engine, &sub_diagrams, &mut tables);
        }

        Self {
            name: diagram.name().to_string(),
            diagram_type: diagram.diagram_type(),
            edges: diagram.edges(),
            sub_diagrams,
            tables,
        }
    }
}

fn collect_tables(engine: &LayoutEngine, subs: &[SubDiagram], tables: &mut Vec<(String, TableLayout)>) {
    for sub in subs {
        let elements = sub.elements();
        if !elements.is_empty() {
            tables.push((sub.id.clone(), engine.layout(&elements)));
        }
        collect_tables(engine, &sub.sub_graphs, tables);
    }
}

pub fn render(diagram: &Diagram, layout: &LayoutConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(&DiagramDocument::new(diagram, layout))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagram::DiagramNode;
    use crate::core::identity::{Identifier, Position};
    use crate::core::object::Object;
    use crate::core::relation::RelationType;

    fn diagram(diagram_type: DiagramType) -> Diagram {
        let mut diagram = Diagram::new("shop", diagram_type);
        let root = diagram.root_id().to_string();
        let bucket = diagram
            .place(&root, DiagramNode::bucket("pkg", "pkg"), RelationType::AggregationRoot)
            .unwrap();
        diagram
            .place(
                &bucket,
                DiagramNode::from_object(&Object::class(Identifier::new("pkg", "User"), Position::synthetic())),
                RelationType::Aggregation,
            )
            .unwrap();
        diagram
    }

    #[test]
    fn test_document_carries_edges_and_tables() {
        let json = render(&diagram(DiagramType::Table), &LayoutConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "shop");
        assert_eq!(value["type"], "Table");
        assert_eq!(value["edges"][0]["relation_type"], "AggregationRoot");
        assert_eq!(value["sub_diagrams"][0]["nodes"][0]["name"], "User");
        assert_eq!(value["tables"][0][0], "#pkg");
    }

    #[test]
    fn test_plain_document_has_no_tables() {
        let json = render(&diagram(DiagramType::Plain), &LayoutConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("tables").is_none());
    }
}
