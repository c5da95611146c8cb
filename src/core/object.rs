// src/core/object.rs
use std::fmt;
use serde::{Deserialize, Serialize};

use super::identity::{Identifier, Position};

/// Concrete kinds of code-level declarations reported by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Catch-all declaration (named non-struct types, constants, ...)
    General,
    /// Record type with members discovered incrementally
    Class {
        attributes: Vec<Identifier>,
        methods: Vec<Identifier>,
    },
    Attribute,
    /// A function; one with a receiver is a method
    Function { receiver: Option<Identifier> },
    Interface { methods: Vec<Identifier> },
    InterfaceMethod,
    /// Synthetic label used for presentational bucket nodes
    Str,
}

/// Data-less tag of an [`ObjectKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectTag {
    General,
    Class,
    Attribute,
    Function,
    Interface,
    InterfaceMethod,
    Str,
}

impl fmt::Display for ObjectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::General => "general",
            Self::Class => "class",
            Self::Attribute => "attribute",
            Self::Function => "function",
            Self::Interface => "interface",
            Self::InterfaceMethod => "interface method",
            Self::Str => "label",
        };
        f.write_str(s)
    }
}

/// Anything identifiable and positioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    identifier: Identifier,
    position: Position,
    kind: ObjectKind,
}

impl Object {
    pub fn new(identifier: Identifier, position: Position, kind: ObjectKind) -> Self {
        Self {
            identifier,
            position,
            kind,
        }
    }

    pub fn general(identifier: Identifier, position: Position) -> Self {
        Self::new(identifier, position, ObjectKind::General)
    }

    pub fn class(identifier: Identifier, position: Position) -> Self {
        Self::new(
            identifier,
            position,
            ObjectKind::Class {
                attributes: Vec::new(),
                methods: Vec::new(),
            },
        )
    }

    pub fn attribute(identifier: Identifier, position: Position) -> Self {
        Self::new(identifier, position, ObjectKind::Attribute)
    }

    pub fn function(identifier: Identifier, position: Position, receiver: Option<Identifier>) -> Self {
        Self::new(identifier, position, ObjectKind::Function { receiver })
    }

    pub fn interface(identifier: Identifier, position: Position) -> Self {
        Self::new(identifier, position, ObjectKind::Interface { methods: Vec::new() })
    }

    pub fn interface_method(identifier: Identifier, position: Position) -> Self {
        Self::new(identifier, position, ObjectKind::InterfaceMethod)
    }

    /// A presentational label; the label doubles as the identifier name
    pub fn string(dir: &str, label: &str) -> Self {
        Self::new(Identifier::new(dir, label), Position::synthetic(), ObjectKind::Str)
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn id(&self) -> String {
        self.identifier.id()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn tag(&self) -> ObjectTag {
        match self.kind {
            ObjectKind::General => ObjectTag::General,
            ObjectKind::Class { .. } => ObjectTag::Class,
            ObjectKind::Attribute => ObjectTag::Attribute,
            ObjectKind::Function { .. } => ObjectTag::Function,
            ObjectKind::Interface { .. } => ObjectTag::Interface,
            ObjectKind::InterfaceMethod => ObjectTag::InterfaceMethod,
            ObjectKind::Str => ObjectTag::Str,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, ObjectKind::Class { .. })
    }

    /// Functions with a receiver
    pub fn is_method(&self) -> bool {
        matches!(self.kind, ObjectKind::Function { receiver: Some(_) })
    }

    pub fn receiver(&self) -> Option<&Identifier> {
        match &self.kind {
            ObjectKind::Function { receiver } => receiver.as_ref(),
            _ => None,
        }
    }

    /// Attribute identifiers of a class (empty for every other kind)
    pub fn attributes(&self) -> &[Identifier] {
        match &self.kind {
            ObjectKind::Class { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Method identifiers of a class or interface
    pub fn methods(&self) -> &[Identifier] {
        match &self.kind {
            ObjectKind::Class { methods, .. } | ObjectKind::Interface { methods } => methods,
            _ => &[],
        }
    }

    /// Record a member discovered after the declaration itself.
    /// Returns false when the object cannot hold members of that kind.
    pub fn add_attribute(&mut self, attribute: Identifier) -> bool {
        match &mut self.kind {
            ObjectKind::Class { attributes, .. } => {
                if !attributes.contains(&attribute) {
                    attributes.push(attribute);
                }
                true
            }
            _ => false,
        }
    }

    pub fn add_method(&mut self, method: Identifier) -> bool {
        match &mut self.kind {
            ObjectKind::Class { methods, .. } | ObjectKind::Interface { methods } => {
                if !methods.contains(&method) {
                    methods.push(method);
                }
                true
            }
            _ => false,
        }
    }
}

/// Role of a domain-qualified object in the DDD taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKind {
    Entity,
    ValueObject,
    Class,
    Interface,
    Function,
    General,
    Attribute,
    Method,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Entity => "entity",
            Self::ValueObject => "value object",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::General => "general",
            Self::Attribute => "attribute",
            Self::Method => "method",
        };
        f.write_str(s)
    }
}

/// An object viewed inside a domain.
///
/// `source` is the identifier of the undecorated object, `render` is the same
/// name re-rooted relative to the domain root and is what diagrams key on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainObject {
    pub source: Identifier,
    pub render: Identifier,
    pub domain: String,
    pub kind: DomainKind,
    pub position: Position,
    /// Resolved attributes (tactic fidelity only)
    pub attributes: Vec<DomainObject>,
    /// Resolved methods (tactic fidelity only)
    pub methods: Vec<DomainObject>,
}

impl DomainObject {
    pub fn wrap(object: &Object, domain: &str, domain_root: &str, kind: DomainKind) -> Self {
        Self {
            source: object.identifier().clone(),
            render: object.identifier().relative_to(domain_root),
            domain: domain.to_string(),
            kind,
            position: object.position().clone(),
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn origin_identifier(&self) -> &Identifier {
        &self.source
    }

    pub fn identifier(&self) -> &Identifier {
        &self.render
    }

    pub fn name(&self) -> &str {
        self.render.name()
    }
}

/// Back-reference from an aggregate to its root entity, resolved by id lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub source: Identifier,
    pub render: Identifier,
}

/// A DDD aggregate: a named cluster rooted at one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    pub domain: String,
    pub position: Position,
    pub entity: Option<EntityRef>,
}

impl Aggregate {
    /// A placeholder with only a name; the entity is bound later
    pub fn named(name: &str, domain: &str, position: Position) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            position,
            entity: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.entity.is_some()
    }
}

/// Find the entity whose name matches the aggregate name, ignoring case
pub fn bind_entity<'a, I>(aggregate_name: &str, candidates: I) -> Option<EntityRef>
where
    I: IntoIterator<Item = &'a DomainObject>,
{
    candidates
        .into_iter()
        .filter(|c| c.kind == DomainKind::Entity)
        .find(|c| c.name().eq_ignore_ascii_case(aggregate_name))
        .map(|c| EntityRef {
            source: c.source.clone(),
            render: c.render.clone(),
        })
}
