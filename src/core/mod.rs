// src/core/mod.rs
mod engine;

// Identities, objects and the relations between them
pub mod identity;
pub mod object;
pub mod relation;
pub mod store;
pub mod relation_graph;

// Directory conventions and grouping
pub mod directory;
pub mod model;

// Diagram synthesis and output
pub mod diagram;
pub mod layout;
pub mod render;

// Go source analysis
pub mod analyzer;

pub use identity::{Identifier, Position};
pub use object::Object;
pub use relation::{Relation, RelationType};
pub use store::{ObjectStore, RelationStore};
pub use relation_graph::RelationGraph;
pub use directory::{ArchPattern, DirectoryTree, HexagonDirectory};
pub use diagram::{Diagram, DiagramAssembler, DiagramType};
pub use layout::{LayoutEngine, TableLayout};
pub use analyzer::{AnalysisHandler, Collector, GoAnalyzer};

// Export the main engine
pub use engine::{analyze, build_diagram, Detection, Engine, Snapshot, View};
