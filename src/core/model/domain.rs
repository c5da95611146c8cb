// src/core/model/domain.rs
use tracing::debug;

use crate::error::{HexviewError, Result};
use super::super::directory::{base_name, parent_path, DirectoryTree, HexagonDirectory};
use super::super::identity::Identifier;
use super::super::object::Object;
use super::super::store::ObjectStore;
use super::group::{AggregateGroup, ComponentRole, DomainGroup, DomainObjects};

/// How much of each domain directory is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Existence only: aggregates and the classes of their components
    Strategic,
    /// Full membership with attributes and methods resolved
    Tactic,
}

/// DDD grouping over the `internal/domain` sub-tree of a hexagon code base
pub struct DomainModel<'a> {
    tree: &'a DirectoryTree,
    store: &'a ObjectStore,
}

impl<'a> DomainModel<'a> {
    pub fn new(tree: &'a DirectoryTree, store: &'a ObjectStore) -> Self {
        Self { tree, store }
    }

    pub fn strategic_grouping(&self) -> Result<Vec<AggregateGroup>> {
        self.grouping(Fidelity::Strategic)
    }

    pub fn tactic_grouping(&self) -> Result<Vec<AggregateGroup>> {
        self.grouping(Fidelity::Tactic)
    }

    fn grouping(&self, fidelity: Fidelity) -> Result<Vec<AggregateGroup>> {
        let domain_root = self.tree.domain_path();
        let mut aggregates: Vec<AggregateGroup> = Vec::new();

        let outcome = self.tree.walk_dir(&domain_root, |path, ids| {
            match self.tree.hexagon_directory(path) {
                HexagonDirectory::Domain => Ok(()),
                HexagonDirectory::Aggregate => {
                    let name = base_name(path);
                    let objects = match fidelity {
                        Fidelity::Strategic => Vec::new(),
                        Fidelity::Tactic => self.store.get_objects(ids)?,
                    };
                    let members = DomainObjects::new(
                        name,
                        &domain_root,
                        objects,
                        fidelity == Fidelity::Tactic,
                    );
                    aggregates.push(AggregateGroup::new(name, path, members));
                    Ok(())
                }
                HexagonDirectory::Entity => {
                    self.attach_component(&mut aggregates, path, ids, ComponentRole::Entity, fidelity, &domain_root)
                }
                HexagonDirectory::ValueObject => {
                    self.attach_component(&mut aggregates, path, ids, ComponentRole::ValueObject, fidelity, &domain_root)
                }
                HexagonDirectory::Repository | HexagonDirectory::Factory => {
                    debug!("Skipping {} (repositories and factories are not grouped yet)", path);
                    Ok(())
                }
                HexagonDirectory::Invalid => Err(HexviewError::InvalidDirectory(path.to_string())),
            }
        })?;
        outcome.into_first_error()?;

        debug!("Grouped {} aggregates ({:?})", aggregates.len(), fidelity);
        Ok(aggregates)
    }

    /// Attach an entity/value-object directory to the aggregate that encloses it
    fn attach_component(
        &self,
        aggregates: &mut [AggregateGroup],
        path: &str,
        ids: &[Identifier],
        role: ComponentRole,
        fidelity: Fidelity,
        domain_root: &str,
    ) -> Result<()> {
        let aggregate_path = parent_path(path);
        let aggregate = aggregates
            .iter_mut()
            .find(|a| a.path == aggregate_path)
            .ok_or_else(|| HexviewError::NotFound(aggregate_path.to_string()))?;

        let objects: Vec<Object> = match fidelity {
            Fidelity::Strategic => self
                .store
                .get_objects(ids)?
                .into_iter()
                .filter(|o| o.is_class())
                .collect(),
            Fidelity::Tactic => self.store.get_objects(ids)?,
        };

        let members = DomainObjects::new(
            &aggregate.name,
            domain_root,
            objects,
            fidelity == Fidelity::Tactic,
        );
        aggregate.add_sub_group(DomainGroup::new(base_name(path), path, role, members));
        Ok(())
    }
}
