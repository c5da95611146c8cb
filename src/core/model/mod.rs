// src/core/model/mod.rs
//! Grouping models over the directory tree.
//!
//! The general model mirrors directories one to one; the domain model reads
//! the `internal/domain` convention and produces aggregates with their
//! entity and value-object components.

mod group;
mod general;
mod domain;

pub use group::{AggregateGroup, ComponentRole, DomainGroup, DomainObjects, Group};
pub use general::GeneralModel;
pub use domain::{DomainModel, Fidelity};
