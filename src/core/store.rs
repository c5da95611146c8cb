// src/core/store.rs
//! In-memory object and relation stores.
//!
//! Both stores are filled once by the analyzer handler and then only read
//! by the graph, grouping and diagram stages of one build.

use std::collections::HashMap;

use crate::error::{HexviewError, Result};
use super::identity::Identifier;
use super::object::Object;
use super::relation::{Endpoint, Relation, RelationKind};

/// Keyed store of every declaration seen by the analyzer
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<String, Object>,
    order: Vec<Identifier>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Object) -> Result<()> {
        let key = object.id();
        if self.objects.contains_key(&key) {
            return Err(HexviewError::Duplicate(key));
        }
        self.order.push(object.identifier().clone());
        self.objects.insert(key, object);
        Ok(())
    }

    pub fn find(&self, id: &Identifier) -> Option<&Object> {
        self.objects.get(&id.id())
    }

    /// Fetch a batch of objects; one missing id fails the whole batch
    pub fn get_objects(&self, ids: &[Identifier]) -> Result<Vec<Object>> {
        ids.iter()
            .map(|id| {
                self.find(id)
                    .cloned()
                    .ok_or_else(|| HexviewError::NotFound(id.id()))
            })
            .collect()
    }

    /// All identifiers in insertion order
    pub fn all(&self) -> &[Identifier] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Record an attribute on an already inserted class.
    /// Returns false when the owner is not a class.
    pub fn attach_attribute(&mut self, owner: &Identifier, attribute: Identifier) -> Result<bool> {
        let object = self
            .objects
            .get_mut(&owner.id())
            .ok_or_else(|| HexviewError::NotFound(owner.id()))?;
        Ok(object.add_attribute(attribute))
    }

    /// Record a method on an already inserted class or interface.
    /// Returns false when the owner cannot hold methods.
    pub fn attach_method(&mut self, owner: &Identifier, method: Identifier) -> Result<bool> {
        let object = self
            .objects
            .get_mut(&owner.id())
            .ok_or_else(|| HexviewError::NotFound(owner.id()))?;
        Ok(object.add_method(method))
    }
}

/// Append-only store of code relations
#[derive(Debug, Default)]
pub struct RelationStore {
    relations: Vec<Relation>,
    implementations: HashMap<String, usize>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a relation. Implementation relations of the same from-object
    /// are folded into one relation listing every interface.
    pub fn insert(&mut self, relation: Relation) {
        if let RelationKind::Implementation { implements } = &relation.kind {
            let key = relation.from.id.id();
            if let Some(&index) = self.implementations.get(&key) {
                for interface in implements.clone() {
                    self.relations[index].add_implements(interface);
                }
                return;
            }
            self.implementations.insert(key, self.relations.len());
        }
        self.relations.push(relation);
    }

    pub fn add_implementation(&mut self, from: Endpoint, interface: Endpoint) {
        self.insert(Relation::implementation(from, interface));
    }

    pub fn walk<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Relation) -> Result<()>,
    {
        for relation in &self.relations {
            visitor(relation)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::Position;

    fn id(name: &str) -> Identifier {
        Identifier::new("pkg/order", name)
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut store = ObjectStore::new();
        store.insert(Object::class(id("Order"), Position::synthetic())).unwrap();
        let err = store
            .insert(Object::general(id("Order"), Position::synthetic()))
            .unwrap_err();
        assert!(matches!(err, HexviewError::Duplicate(ref key) if key == "pkg/order/Order"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_objects_fails_whole_batch() {
        let mut store = ObjectStore::new();
        store.insert(Object::class(id("Order"), Position::synthetic())).unwrap();

        assert_eq!(store.get_objects(&[id("Order")]).unwrap().len(), 1);
        let err = store.get_objects(&[id("Order"), id("Missing")]).unwrap_err();
        assert!(matches!(err, HexviewError::NotFound(_)));
    }

    #[test]
    fn test_attach_members() {
        let mut store = ObjectStore::new();
        store.insert(Object::class(id("Order"), Position::synthetic())).unwrap();
        store.insert(Object::general(id("Status"), Position::synthetic())).unwrap();

        assert!(store.attach_attribute(&id("Order"), id("Order.ID")).unwrap());
        assert!(store.attach_method(&id("Order"), id("Order.Pay")).unwrap());
        assert!(!store.attach_method(&id("Status"), id("Status.String")).unwrap());
        assert!(store.attach_method(&id("Missing"), id("Missing.X")).is_err());

        let order = store.find(&id("Order")).unwrap();
        assert_eq!(order.attributes(), &[id("Order.ID")]);
        assert_eq!(order.methods(), &[id("Order.Pay")]);
    }

    #[test]
    fn test_implementations_fold_per_from_object() {
        let ep = |name: &str| Endpoint::new(id(name), Position::synthetic());
        let mut store = RelationStore::new();
        store.add_implementation(ep("Repo"), ep("Reader"));
        store.add_implementation(ep("Repo"), ep("Writer"));
        store.insert(Relation::dependency(ep("Repo"), ep("Order")));

        assert_eq!(store.len(), 2);
        let mut targets = 0;
        store
            .walk(|rel| {
                targets += rel.targets().len();
                Ok(())
            })
            .unwrap();
        assert_eq!(targets, 3);
    }
}
