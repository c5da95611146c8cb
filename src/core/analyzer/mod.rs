// src/core/analyzer/mod.rs
//! Source analysis feeding the object and relation stores.
//!
//! Analyzers report what they find as [`NodeEvent`]s and [`LinkEvent`]s to an
//! [`AnalysisHandler`]. Every declaration is reported before any link that
//! refers to it.

mod syntax;
mod golang;

pub use golang::{AnalysisSummary, GoAnalyzer};

use tracing::debug;

use crate::error::{HexviewError, Result};
use super::identity::{Identifier, Position};
use super::object::Object;
use super::relation::{Endpoint, Multiplicity, Relation};
use super::store::{ObjectStore, RelationStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    General,
    Class,
    Attribute,
    Function,
    Interface,
    InterfaceMethod,
}

/// A declaration found in the sources
#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub kind: DeclKind,
    pub id: Identifier,
    pub position: Position,
    /// Owning class or interface for members, receiver type for methods
    pub parent: Option<Identifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHint {
    Dependency,
    Composition,
    Embedding,
    Implementation,
    Association(Multiplicity),
}

/// A relation between two reported declarations
#[derive(Debug, Clone)]
pub struct LinkEvent {
    pub from: Endpoint,
    pub to: Endpoint,
    pub hint: LinkHint,
}

pub trait AnalysisHandler {
    fn on_node(&mut self, event: NodeEvent) -> Result<()>;
    fn on_link(&mut self, event: LinkEvent) -> Result<()>;
}

/// Handler that turns events into stored objects and relations
#[derive(Debug, Default)]
pub struct Collector {
    objects: ObjectStore,
    relations: RelationStore,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn into_stores(self) -> (ObjectStore, RelationStore) {
        (self.objects, self.relations)
    }

    fn parent_of(event: &NodeEvent) -> Result<&Identifier> {
        event
            .parent
            .as_ref()
            .ok_or_else(|| HexviewError::Parser(format!("{} has no owner", event.id)))
    }
}

impl AnalysisHandler for Collector {
    fn on_node(&mut self, event: NodeEvent) -> Result<()> {
        match event.kind {
            DeclKind::General => self.objects.insert(Object::general(event.id, event.position)),
            DeclKind::Class => self.objects.insert(Object::class(event.id, event.position)),
            DeclKind::Interface => self.objects.insert(Object::interface(event.id, event.position)),
            DeclKind::Attribute => {
                let owner = Self::parent_of(&event)?.clone();
                self.objects.insert(Object::attribute(event.id.clone(), event.position))?;
                if !self.objects.attach_attribute(&owner, event.id)? {
                    debug!("{} cannot hold attributes", owner);
                }
                Ok(())
            }
            DeclKind::InterfaceMethod => {
                let owner = Self::parent_of(&event)?.clone();
                self.objects.insert(Object::interface_method(event.id.clone(), event.position))?;
                self.objects.attach_method(&owner, event.id)?;
                Ok(())
            }
            DeclKind::Function => match event.parent {
                Some(receiver) => {
                    self.objects
                        .insert(Object::function(event.id.clone(), event.position, Some(receiver.clone())))?;
                    if !self.objects.attach_method(&receiver, event.id)? {
                        debug!("{} is not a class, method listed with the loose functions", receiver);
                    }
                    Ok(())
                }
                None => self.objects.insert(Object::function(event.id, event.position, None)),
            },
        }
    }

    fn on_link(&mut self, event: LinkEvent) -> Result<()> {
        let LinkEvent { from, to, hint } = event;
        match hint {
            LinkHint::Dependency => self.relations.insert(Relation::dependency(from, to)),
            LinkHint::Composition => self.relations.insert(Relation::composition(from, to)),
            LinkHint::Embedding => self.relations.insert(Relation::embedding(from, to)),
            LinkHint::Implementation => self.relations.add_implementation(from, to),
            LinkHint::Association(multiplicity) => {
                self.relations.insert(Relation::association(from, to, multiplicity))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::ObjectTag;

    fn node(kind: DeclKind, name: &str, parent: Option<&str>) -> NodeEvent {
        NodeEvent {
            kind,
            id: Identifier::new("pkg", name),
            position: Position::new("pkg/a.go", 0, 1, 1),
            parent: parent.map(|p| Identifier::new("pkg", p)),
        }
    }

    fn link(from: &str, to: &str, hint: LinkHint) -> LinkEvent {
        LinkEvent {
            from: Endpoint::new(Identifier::new("pkg", from), Position::synthetic()),
            to: Endpoint::new(Identifier::new("pkg", to), Position::synthetic()),
            hint,
        }
    }

    #[test]
    fn test_members_are_attached_to_owners() {
        let mut collector = Collector::new();
        collector.on_node(node(DeclKind::Class, "User", None)).unwrap();
        collector.on_node(node(DeclKind::Attribute, "User.Name", Some("User"))).unwrap();
        collector.on_node(node(DeclKind::Function, "User.Greet", Some("User"))).unwrap();
        collector.on_node(node(DeclKind::Interface, "Greeter", None)).unwrap();
        collector
            .on_node(node(DeclKind::InterfaceMethod, "Greeter.Greet", Some("Greeter")))
            .unwrap();

        let objects = collector.objects();
        let user = objects.find(&Identifier::new("pkg", "User")).unwrap();
        assert_eq!(user.attributes().len(), 1);
        assert_eq!(user.methods().len(), 1);
        let greeter = objects.find(&Identifier::new("pkg", "Greeter")).unwrap();
        assert_eq!(greeter.tag(), ObjectTag::Interface);
        assert_eq!(greeter.methods()[0].name(), "Greeter.Greet");
    }

    #[test]
    fn test_attribute_without_owner_fails() {
        let mut collector = Collector::new();
        assert!(collector.on_node(node(DeclKind::Attribute, "Loose", None)).is_err());
        assert!(matches!(
            collector.on_node(node(DeclKind::Attribute, "Ghost.X", Some("Ghost"))),
            Err(HexviewError::NotFound(_))
        ));
    }

    #[test]
    fn test_implementations_fold_per_type() {
        let mut collector = Collector::new();
        collector.on_link(link("Repo", "Reader", LinkHint::Implementation)).unwrap();
        collector.on_link(link("Repo", "Writer", LinkHint::Implementation)).unwrap();
        collector.on_link(link("Repo", "Item", LinkHint::Association(Multiplicity::OneMany))).unwrap();

        assert_eq!(collector.relations().len(), 2);
    }
}
