// src/core/diagram/mod.rs
//! Diagram assembly.
//!
//! A diagram is a rooted presentation tree (buckets, aggregates, objects and
//! their members) with relation edges laid over it. Structural edges decide
//! nesting; `edges()` and `sub_diagrams()` are the two views renderers use.

pub mod diagram;
pub mod sub_diagram;
pub mod assembler;

pub use diagram::{
    bucket_id, merge_edges, Diagram, DiagramEdge, DiagramNode, DiagramType, EdgeRecord,
    MergedEdge, NodeKind, BUCKET_PREFIX, ROOT_ID,
};
pub use sub_diagram::{Columns, Element, SubDiagram, SubNode};
pub use assembler::DiagramAssembler;
