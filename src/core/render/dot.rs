// src/core/render/dot.rs
//! Graphviz DOT output.
//!
//! Sub-diagrams become nested `cluster` subgraphs. Table diagrams draw each
//! cluster's members as one HTML-like table whose cells carry ports, so edges
//! land on the member they belong to. Plain diagrams draw one box per member.

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::config::LayoutConfig;
use crate::error::Result;
use super::super::diagram::{Diagram, DiagramType, MergedEdge, NodeKind, SubDiagram};
use super::super::layout::{Cell, LayoutEngine, TableLayout};
use super::super::relation::RelationType;

/// Render a diagram as a DOT digraph
pub fn render(diagram: &Diagram, layout: &LayoutConfig) -> Result<String> {
    let mut renderer = DotRenderer::new(layout);
    renderer.render(diagram)?;
    Ok(renderer.output)
}

struct DotRenderer<'a> {
    engine: LayoutEngine<'a>,
    /// Diagram node id to DOT endpoint (`node` or `node:port`)
    endpoints: HashMap<String, String>,
    next_id: usize,
    output: String,
}

impl<'a> DotRenderer<'a> {
    fn new(layout: &'a LayoutConfig) -> Self {
        Self {
            engine: LayoutEngine::new(layout),
            endpoints: HashMap::new(),
            next_id: 0,
            output: String::new(),
        }
    }

    fn render(&mut self, diagram: &Diagram) -> fmt::Result {
        writeln!(self.output, "digraph \"{}\" {{", escape_label(diagram.name()))?;
        self.output.push_str("  compound=true;\n");
        self.output.push_str("  rankdir=LR;\n");
        self.output.push_str("  node [fontname=\"Helvetica\", fontsize=10];\n");
        self.output.push_str("  edge [fontname=\"Helvetica\", fontsize=9];\n");
        writeln!(self.output, "  label=\"{}\";\n", escape_label(diagram.name()))?;

        let table = diagram.diagram_type() == DiagramType::Table;
        for sub in diagram.sub_diagrams() {
            self.cluster(&sub, table, 1)?;
        }

        for edge in diagram.edges() {
            if table && edge.relation_type.is_structural() {
                continue;
            }
            self.edge(&edge)?;
        }

        self.output.push_str("}\n");
        Ok(())
    }

    fn cluster(&mut self, sub: &SubDiagram, table: bool, indent: usize) -> fmt::Result {
        let cluster = self.fresh("cluster_");
        self.line(indent, format_args!("subgraph {} {{", cluster))?;
        self.line(indent, format_args!("  label=\"{}\";", escape_label(&sub.name)))?;
        self.line(indent, format_args!("  style=\"{}\";", cluster_style(sub.kind)))?;

        if table {
            self.table_node(sub, indent + 1)?;
        } else {
            self.plain_nodes(sub, indent + 1)?;
        }

        for nested in &sub.sub_graphs {
            self.cluster(nested, table, indent + 1)?;
        }

        self.line(indent, format_args!("}}"))
    }

    fn plain_nodes(&mut self, sub: &SubDiagram, indent: usize) -> fmt::Result {
        let anchor = self.fresh("n");
        self.endpoints.insert(sub.id.clone(), anchor.clone());
        self.line(
            indent,
            format_args!(
                "{} [label=\"{}\", shape={}];",
                anchor,
                escape_label(&sub.name),
                shape_for_kind(sub.kind)
            ),
        )?;

        for node in &sub.nodes {
            let id = self.fresh("n");
            self.endpoints.insert(node.id.clone(), id.clone());
            self.line(
                indent,
                format_args!(
                    "{} [label=\"{}\", shape={}, tooltip=\"{}\"];",
                    id,
                    escape_label(&node.name),
                    shape_for_kind(node.kind),
                    escape_label(&format!("{} {}", node.kind, node.id))
                ),
            )?;
        }
        Ok(())
    }

    fn table_node(&mut self, sub: &SubDiagram, indent: usize) -> fmt::Result {
        let node = self.fresh("t");
        self.endpoints.insert(sub.id.clone(), node.clone());

        let elements = sub.elements();
        if elements.is_empty() {
            return self.line(
                indent,
                format_args!("{} [label=\"{}\", shape=plaintext];", node, escape_label(&sub.name)),
            );
        }

        let layout = self.engine.layout(&elements);
        let html = self.html_table(&node, &layout)?;
        self.line(indent, format_args!("{} [shape=plaintext, label=<{}>];", node, html))
    }

    fn html_table(&mut self, node: &str, layout: &TableLayout) -> std::result::Result<String, fmt::Error> {
        let mut html = String::from("<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">");
        for row in &layout.rows {
            html.push_str("<TR>");
            for cell in row {
                self.html_cell(&mut html, node, cell)?;
            }
            html.push_str("</TR>");
        }
        html.push_str("</TABLE>");
        Ok(html)
    }

    fn html_cell(&mut self, html: &mut String, node: &str, cell: &Cell) -> fmt::Result {
        write!(html, "<TD BGCOLOR=\"{}\"", escape_html(&cell.color))?;
        if cell.row_span > 1 {
            write!(html, " ROWSPAN=\"{}\"", cell.row_span)?;
        }
        if cell.col_span > 1 {
            write!(html, " COLSPAN=\"{}\"", cell.col_span)?;
        }
        if cell.is_blank() {
            html.push_str(" BORDER=\"0\"");
        }
        if let Some(target) = &cell.port {
            let port = self.fresh("p");
            self.endpoints.insert(target.clone(), format!("{}:{}", node, port));
            write!(html, " PORT=\"{}\"", port)?;
        }
        write!(html, ">{}</TD>", escape_html(&cell.text))
    }

    fn edge(&mut self, edge: &MergedEdge) -> fmt::Result {
        let (Some(from), Some(to)) = (self.endpoints.get(&edge.from), self.endpoints.get(&edge.to)) else {
            return Ok(());
        };

        let mut attributes = vec![edge_style(edge.relation_type).to_string()];
        if edge.count > 1 {
            attributes.push(format!("label=\"{}\"", edge.count));
        }
        let tooltip = edge
            .positions
            .iter()
            .map(|(from, to)| escape_label(&format!("{} -> {}", from, to)))
            .collect::<Vec<_>>()
            .join("\\n");
        attributes.push(format!("tooltip=\"{}\\n{}\"", edge.relation_type, tooltip));

        writeln!(self.output, "  {} -> {} [{}];", from, to, attributes.join(", "))
    }

    /// One indented line of output
    fn line(&mut self, indent: usize, content: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..indent {
            self.output.push_str("  ");
        }
        self.output.write_fmt(content)?;
        self.output.push('\n');
        Ok(())
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let id = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }
}

fn edge_style(relation_type: RelationType) -> &'static str {
    match relation_type {
        RelationType::Dependency => "style=dashed, arrowhead=vee",
        RelationType::Composition => "dir=both, arrowtail=diamond, arrowhead=none",
        RelationType::Embedding => "dir=both, arrowtail=diamond, arrowhead=vee",
        RelationType::Implementation => "style=dashed, arrowhead=empty",
        RelationType::Association => "arrowhead=vee",
        RelationType::AssociationOneOne => "arrowhead=vee, headlabel=\"1\"",
        RelationType::AssociationOneMany => "arrowhead=vee, headlabel=\"*\"",
        RelationType::Aggregation => "dir=both, arrowtail=odiamond, arrowhead=none",
        RelationType::AggregationRoot => "dir=both, arrowtail=diamond, arrowhead=none, penwidth=2",
        RelationType::Abstraction => "style=dotted, arrowhead=none",
        RelationType::Attribution | RelationType::Behavior => "style=invis",
    }
}

fn shape_for_kind(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Aggregate => "box3d",
        NodeKind::Entity | NodeKind::ValueObject | NodeKind::Class => "box",
        NodeKind::Interface => "component",
        NodeKind::Bucket => "folder",
        NodeKind::Function | NodeKind::Method | NodeKind::InterfaceMethod => "ellipse",
        NodeKind::General | NodeKind::Attribute => "plaintext",
    }
}

fn cluster_style(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Aggregate => "bold",
        NodeKind::Bucket => "rounded",
        _ => "solid",
    }
}

fn escape_label(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
