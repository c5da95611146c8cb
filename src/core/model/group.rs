// src/core/model/group.rs
use serde::Serialize;

use crate::error::{HexviewError, Result};
use super::super::identity::{Identifier, Position};
use super::super::object::{bind_entity, Aggregate, DomainKind, DomainObject, Object, ObjectTag};

/// A directory-shaped bucket of raw objects
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub name: String,
    /// Full directory path this group mirrors
    pub path: String,
    pub sub_groups: Vec<Group>,
    pub objects: Vec<Object>,
}

impl Group {
    pub fn new(name: &str, path: &str, objects: Vec<Object>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            sub_groups: Vec::new(),
            objects,
        }
    }

    pub fn classes(&self) -> Vec<&Object> {
        self.with_tag(ObjectTag::Class)
    }

    pub fn generals(&self) -> Vec<&Object> {
        self.with_tag(ObjectTag::General)
    }

    /// Functions not reached through a class, methods on non-struct types included
    pub fn functions(&self) -> Vec<&Object> {
        self.objects
            .iter()
            .filter(|o| o.tag() == ObjectTag::Function && !held_by_class(&self.objects, o))
            .collect()
    }

    pub fn interfaces(&self) -> Vec<&Object> {
        self.with_tag(ObjectTag::Interface)
    }

    /// Look up members of this group by identifier
    pub fn resolve(&self, ids: &[Identifier]) -> Result<Vec<&Object>> {
        ids.iter()
            .map(|id| {
                self.objects
                    .iter()
                    .find(|o| o.identifier() == id)
                    .ok_or_else(|| HexviewError::NotFound(id.id()))
            })
            .collect()
    }

    pub fn find_group_mut(&mut self, path: &str) -> Option<&mut Group> {
        if self.path == path {
            return Some(self);
        }
        self.sub_groups
            .iter_mut()
            .find_map(|group| group.find_group_mut(path))
    }

    /// Number of groups in this tree, self included
    pub fn len(&self) -> usize {
        1 + self.sub_groups.iter().map(Group::len).sum::<usize>()
    }

    fn with_tag(&self, tag: ObjectTag) -> Vec<&Object> {
        self.objects.iter().filter(|o| o.tag() == tag).collect()
    }
}

/// Raw objects of one domain directory, re-wrapped on demand as domain objects
#[derive(Debug, Clone, Serialize)]
pub struct DomainObjects {
    /// Aggregate (domain) the objects belong to
    pub domain: String,
    /// Directory rendered ids are made relative to
    pub domain_root: String,
    pub objects: Vec<Object>,
    /// Resolve attribute and method identifiers (tactic fidelity)
    pub resolve_members: bool,
}

impl DomainObjects {
    pub fn new(domain: &str, domain_root: &str, objects: Vec<Object>, resolve_members: bool) -> Self {
        Self {
            domain: domain.to_string(),
            domain_root: domain_root.to_string(),
            objects,
            resolve_members,
        }
    }

    /// Classes wrapped with the given domain role
    pub fn classes_as(&self, kind: DomainKind) -> Result<Vec<DomainObject>> {
        self.objects
            .iter()
            .filter(|o| o.is_class())
            .map(|class| {
                let mut wrapped = self.wrap(class, kind);
                if self.resolve_members {
                    wrapped.attributes = self.members(class.attributes(), DomainKind::Attribute)?;
                    wrapped.methods = self.members(class.methods(), DomainKind::Method)?;
                }
                Ok(wrapped)
            })
            .collect()
    }

    pub fn interfaces(&self) -> Result<Vec<DomainObject>> {
        self.objects
            .iter()
            .filter(|o| o.tag() == ObjectTag::Interface)
            .map(|iface| {
                let mut wrapped = self.wrap(iface, DomainKind::Interface);
                if self.resolve_members {
                    wrapped.methods = self.members(iface.methods(), DomainKind::Method)?;
                }
                Ok(wrapped)
            })
            .collect()
    }

    pub fn functions(&self) -> Vec<DomainObject> {
        self.objects
            .iter()
            .filter(|o| o.tag() == ObjectTag::Function && !held_by_class(&self.objects, o))
            .map(|f| self.wrap(f, DomainKind::Function))
            .collect()
    }

    pub fn generals(&self) -> Vec<DomainObject> {
        self.objects
            .iter()
            .filter(|o| o.tag() == ObjectTag::General)
            .map(|g| self.wrap(g, DomainKind::General))
            .collect()
    }

    fn wrap(&self, object: &Object, kind: DomainKind) -> DomainObject {
        DomainObject::wrap(object, &self.domain, &self.domain_root, kind)
    }

    fn members(&self, ids: &[Identifier], kind: DomainKind) -> Result<Vec<DomainObject>> {
        ids.iter()
            .map(|id| {
                self.objects
                    .iter()
                    .find(|o| o.identifier() == id)
                    .map(|member| self.wrap(member, kind))
                    .ok_or_else(|| HexviewError::NotFound(id.id()))
            })
            .collect()
    }
}

/// Whether `function` is a method listed by one of the classes in `objects`
fn held_by_class(objects: &[Object], function: &Object) -> bool {
    function.receiver().map_or(false, |receiver| {
        objects.iter().any(|o| {
            o.is_class() && o.identifier() == receiver && o.methods().contains(function.identifier())
        })
    })
}

/// DDD role of a component directory below an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComponentRole {
    Entity,
    ValueObject,
}

/// An `entity/` or `valueobject/` directory of an aggregate
#[derive(Debug, Clone, Serialize)]
pub struct DomainGroup {
    pub name: String,
    pub path: String,
    pub role: ComponentRole,
    pub members: DomainObjects,
}

impl DomainGroup {
    pub fn new(name: &str, path: &str, role: ComponentRole, members: DomainObjects) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            role,
            members,
        }
    }

    pub fn domain(&self) -> &str {
        &self.members.domain
    }

    pub fn entities(&self) -> Result<Vec<DomainObject>> {
        match self.role {
            ComponentRole::Entity => self.members.classes_as(DomainKind::Entity),
            ComponentRole::ValueObject => Ok(Vec::new()),
        }
    }

    pub fn value_objects(&self) -> Result<Vec<DomainObject>> {
        match self.role {
            ComponentRole::ValueObject => self.members.classes_as(DomainKind::ValueObject),
            ComponentRole::Entity => Ok(Vec::new()),
        }
    }

    /// Entities or value objects, whichever this group holds
    pub fn components(&self) -> Result<Vec<DomainObject>> {
        match self.role {
            ComponentRole::Entity => self.entities(),
            ComponentRole::ValueObject => self.value_objects(),
        }
    }

    pub fn interfaces(&self) -> Result<Vec<DomainObject>> {
        self.members.interfaces()
    }

    pub fn functions(&self) -> Vec<DomainObject> {
        self.members.functions()
    }

    pub fn generals(&self) -> Vec<DomainObject> {
        self.members.generals()
    }
}

/// An aggregate directory with its component sub-groups
#[derive(Debug, Clone, Serialize)]
pub struct AggregateGroup {
    pub name: String,
    pub path: String,
    placeholder: Aggregate,
    pub sub_groups: Vec<DomainGroup>,
    /// Objects declared in the aggregate directory itself
    pub members: DomainObjects,
}

impl AggregateGroup {
    pub fn new(name: &str, path: &str, members: DomainObjects) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            placeholder: Aggregate::named(name, &members.domain, Position::synthetic()),
            sub_groups: Vec::new(),
            members,
        }
    }

    pub fn domain(&self) -> &str {
        &self.members.domain
    }

    /// The aggregate with its root entity bound by case-insensitive name.
    ///
    /// An unmatched name yields an aggregate with no entity (`is_valid() == false`).
    pub fn aggregate(&self) -> Result<Aggregate> {
        let entities = self.entities()?;
        let mut aggregate = self.placeholder.clone();
        aggregate.entity = bind_entity(&aggregate.name, &entities);
        if let Some(entity) = entities
            .iter()
            .find(|e| Some(&e.source) == aggregate.entity.as_ref().map(|r| &r.source))
        {
            aggregate.position = entity.position.clone();
        }
        Ok(aggregate)
    }

    /// Entities of every entity sub-group
    pub fn entities(&self) -> Result<Vec<DomainObject>> {
        let mut entities = Vec::new();
        for group in &self.sub_groups {
            entities.extend(group.entities()?);
        }
        Ok(entities)
    }

    pub fn value_objects(&self) -> Result<Vec<DomainObject>> {
        let mut value_objects = Vec::new();
        for group in &self.sub_groups {
            value_objects.extend(group.value_objects()?);
        }
        Ok(value_objects)
    }

    pub fn add_sub_group(&mut self, group: DomainGroup) {
        self.sub_groups.push(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "internal/domain";

    fn class(dir: &str, name: &str) -> Object {
        Object::class(Identifier::new(dir, name), Position::new("x.go", 0, 1, 1))
    }

    fn entity_group(dir: &str, objects: Vec<Object>, resolve: bool) -> DomainGroup {
        DomainGroup::new(
            "entity",
            dir,
            ComponentRole::Entity,
            DomainObjects::new("order", ROOT, objects, resolve),
        )
    }

    #[test]
    fn test_group_views_filter_by_kind() {
        let dir = "pkg/order";
        let method = Object::function(
            Identifier::new(dir, "Order.Pay"),
            Position::synthetic(),
            Some(Identifier::new(dir, "Order")),
        );
        let mut order = class(dir, "Order");
        order.add_method(Identifier::new(dir, "Order.Pay"));
        let group = Group::new(
            "order",
            dir,
            vec![
                order,
                Object::general(Identifier::new(dir, "Status"), Position::synthetic()),
                Object::function(Identifier::new(dir, "New"), Position::synthetic(), None),
                method,
                Object::interface(Identifier::new(dir, "Repo"), Position::synthetic()),
            ],
        );

        assert_eq!(group.classes().len(), 1);
        assert_eq!(group.generals().len(), 1);
        assert_eq!(group.functions().len(), 1);
        assert_eq!(group.interfaces().len(), 1);
        assert!(group.resolve(&[Identifier::new(dir, "Missing")]).is_err());
    }

    #[test]
    fn test_methods_on_non_struct_types_stay_loose() {
        let dir = "internal/domain/order/valueobject";
        let string = Object::function(
            Identifier::new(dir, "Status.String"),
            Position::synthetic(),
            Some(Identifier::new(dir, "Status")),
        );
        let objects = vec![Object::general(Identifier::new(dir, "Status"), Position::synthetic()), string];

        let group = Group::new("valueobject", dir, objects.clone());
        assert_eq!(group.functions().len(), 1);
        assert_eq!(group.functions()[0].identifier().name(), "Status.String");

        let members = DomainObjects::new("order", ROOT, objects, true);
        let functions = members.functions();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].kind, DomainKind::Function);
    }

    #[test]
    fn test_aggregate_binds_entity_ignoring_case() {
        let dir = "internal/domain/order/entity";
        let mut agg = AggregateGroup::new(
            "Order",
            "internal/domain/order",
            DomainObjects::new("order", ROOT, Vec::new(), false),
        );
        agg.add_sub_group(entity_group(dir, vec![class(dir, "order"), class(dir, "Line")], false));

        let aggregate = agg.aggregate().unwrap();
        assert!(aggregate.is_valid());
        let entity = aggregate.entity.unwrap();
        assert_eq!(entity.source.id(), "internal/domain/order/entity/order");
        assert_eq!(entity.render.id(), "order/entity/order");
    }

    #[test]
    fn test_aggregate_without_match_is_invalid() {
        let dir = "internal/domain/order/entity";
        let mut agg = AggregateGroup::new(
            "order",
            "internal/domain/order",
            DomainObjects::new("order", ROOT, Vec::new(), false),
        );
        agg.add_sub_group(entity_group(dir, vec![class(dir, "Line")], false));

        let aggregate = agg.aggregate().unwrap();
        assert!(!aggregate.is_valid());
    }

    #[test]
    fn test_tactic_members_are_resolved() {
        let dir = "internal/domain/order/entity";
        let mut order = class(dir, "Order");
        order.add_attribute(Identifier::new(dir, "Order.ID"));
        order.add_method(Identifier::new(dir, "Order.Pay"));
        let objects = vec![
            order,
            Object::attribute(Identifier::new(dir, "Order.ID"), Position::synthetic()),
            Object::function(
                Identifier::new(dir, "Order.Pay"),
                Position::synthetic(),
                Some(Identifier::new(dir, "Order")),
            ),
        ];

        let group = entity_group(dir, objects.clone(), true);
        let entities = group.entities().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].attributes[0].kind, DomainKind::Attribute);
        assert_eq!(entities[0].methods[0].name(), "Order.Pay");
        assert!(group.value_objects().unwrap().is_empty());
        assert!(group.functions().is_empty());

        let strategic = entity_group(dir, objects, false);
        assert!(strategic.entities().unwrap()[0].attributes.is_empty());
    }

    #[test]
    fn test_unresolvable_member_is_an_error() {
        let dir = "internal/domain/order/entity";
        let mut order = class(dir, "Order");
        order.add_attribute(Identifier::new(dir, "Order.Gone"));

        let group = entity_group(dir, vec![order], true);
        assert!(matches!(group.entities(), Err(HexviewError::NotFound(_))));
    }
}
