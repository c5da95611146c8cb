// src/core/relation.rs
use std::fmt;
use serde::{Deserialize, Serialize};

use super::identity::{Identifier, Position};

/// Every edge type known to the engine.
///
/// The first group is emitted by the analyzer; the second group only exists
/// inside assembled diagrams and means presentation containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationType {
    Dependency,
    Composition,
    Embedding,
    Implementation,
    Association,
    AssociationOneOne,
    AssociationOneMany,

    Aggregation,
    AggregationRoot,
    Abstraction,
    Attribution,
    Behavior,
}

impl RelationType {
    pub fn is_association(&self) -> bool {
        matches!(
            self,
            Self::Association | Self::AssociationOneOne | Self::AssociationOneMany
        )
    }

    /// Ownership edges that transitive relation queries collapse through
    pub fn is_ownership(&self) -> bool {
        matches!(self, Self::Composition | Self::Embedding)
    }

    /// Edges that attach a node to its place in the diagram tree
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Aggregation | Self::AggregationRoot | Self::Abstraction)
    }

    /// Member edges summarized inside a box instead of drawn
    pub fn is_member(&self) -> bool {
        matches!(self, Self::Attribution | Self::Behavior)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dependency => "dependency",
            Self::Composition => "composition",
            Self::Embedding => "embedding",
            Self::Implementation => "implementation",
            Self::Association => "association",
            Self::AssociationOneOne => "association one-one",
            Self::AssociationOneMany => "association one-many",
            Self::Aggregation => "aggregation",
            Self::AggregationRoot => "aggregation root",
            Self::Abstraction => "abstraction",
            Self::Attribution => "attribution",
            Self::Behavior => "behavior",
        };
        f.write_str(s)
    }
}

/// Multiplicity of an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    Plain,
    OneOne,
    OneMany,
}

impl Multiplicity {
    pub fn relation_type(&self) -> RelationType {
        match self {
            Self::Plain => RelationType::Association,
            Self::OneOne => RelationType::AssociationOneOne,
            Self::OneMany => RelationType::AssociationOneMany,
        }
    }
}

/// One end of a relation: the object and where it was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Identifier,
    pub position: Position,
}

impl Endpoint {
    pub fn new(id: Identifier, position: Position) -> Self {
        Self { id, position }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Dependency { depends_on: Endpoint },
    Composition { child: Endpoint },
    Embedding { embedded: Endpoint },
    Implementation { implements: Vec<Endpoint> },
    Association { refer: Endpoint, multiplicity: Multiplicity },
}

/// A directed code relation emitted by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: Endpoint,
    pub kind: RelationKind,
}

impl Relation {
    pub fn dependency(from: Endpoint, depends_on: Endpoint) -> Self {
        Self { from, kind: RelationKind::Dependency { depends_on } }
    }

    pub fn composition(from: Endpoint, child: Endpoint) -> Self {
        Self { from, kind: RelationKind::Composition { child } }
    }

    pub fn embedding(from: Endpoint, embedded: Endpoint) -> Self {
        Self { from, kind: RelationKind::Embedding { embedded } }
    }

    pub fn implementation(from: Endpoint, interface: Endpoint) -> Self {
        Self {
            from,
            kind: RelationKind::Implementation { implements: vec![interface] },
        }
    }

    pub fn association(from: Endpoint, refer: Endpoint, multiplicity: Multiplicity) -> Self {
        Self {
            from,
            kind: RelationKind::Association { refer, multiplicity },
        }
    }

    /// Add one more implemented interface; ignored for other kinds
    pub fn add_implements(&mut self, interface: Endpoint) -> bool {
        match &mut self.kind {
            RelationKind::Implementation { implements } => {
                if !implements.iter().any(|e| e.id == interface.id) {
                    implements.push(interface);
                }
                true
            }
            _ => false,
        }
    }

    /// Every (target, edge type) pair this relation contributes
    pub fn targets(&self) -> Vec<(&Endpoint, RelationType)> {
        match &self.kind {
            RelationKind::Dependency { depends_on } => vec![(depends_on, RelationType::Dependency)],
            RelationKind::Composition { child } => vec![(child, RelationType::Composition)],
            RelationKind::Embedding { embedded } => vec![(embedded, RelationType::Embedding)],
            RelationKind::Implementation { implements } => implements
                .iter()
                .map(|e| (e, RelationType::Implementation))
                .collect(),
            RelationKind::Association { refer, multiplicity } => {
                vec![(refer, multiplicity.relation_type())]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(name: &str) -> Endpoint {
        Endpoint::new(Identifier::new("a", name), Position::new("a.go", 0, 1, 1))
    }

    #[test]
    fn test_implementation_collects_interfaces() {
        let mut rel = Relation::implementation(ep("Repo"), ep("Reader"));
        assert!(rel.add_implements(ep("Writer")));
        assert!(rel.add_implements(ep("Writer")));

        let targets = rel.targets();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|(_, t)| *t == RelationType::Implementation));
    }

    #[test]
    fn test_association_type_follows_multiplicity() {
        let rel = Relation::association(ep("Order"), ep("Item"), Multiplicity::OneMany);
        assert_eq!(rel.targets()[0].1, RelationType::AssociationOneMany);
        assert!(rel.targets()[0].1.is_association());
        assert!(!RelationType::Dependency.is_association());
    }
}
