// src/core/diagram/assembler.rs
use tracing::{debug, info};

use crate::config::DiagramConfig;
use crate::error::{HexviewError, Result};
use super::super::identity::Identifier;
use super::super::model::{AggregateGroup, DomainObjects, Group};
use super::super::object::{DomainKind, DomainObject, Object};
use super::super::relation::RelationType;
use super::super::relation_graph::{RelationGraph, RelationMeta};
use super::diagram::{Diagram, DiagramEdge, DiagramNode, DiagramType, NodeKind};

/// Which relation query feeds a pairwise pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Direct,
    Summary,
}

/// Builds general, strategic and tactic diagrams from grouping models
pub struct DiagramAssembler<'a> {
    relations: &'a RelationGraph,
    config: &'a DiagramConfig,
}

impl<'a> DiagramAssembler<'a> {
    pub fn new(relations: &'a RelationGraph, config: &'a DiagramConfig) -> Self {
        Self { relations, config }
    }

    /// Directory groups as nested buckets, optionally with code relations between members
    pub fn general_graph(&self, name: &str, root_group: &Group) -> Result<Diagram> {
        let mut diagram = Diagram::new(name, DiagramType::Table);
        let root = diagram.root_id().to_string();
        self.place_group(&mut diagram, &root, root_group)?;

        let query = if self.config.show_struct_embedded_relations {
            Query::Summary
        } else {
            Query::Direct
        };
        let all = self.config.show_all_relations;
        let endpoints = own_origins(&diagram, relation_candidate);
        let added = self.add_pairwise(&mut diagram, query, &endpoints, |t| all || t.is_association())?;

        info!("📐 General diagram '{}': {} nodes, {} relation edges", name, diagram.node_count(), added);
        Ok(diagram)
    }

    /// Aggregates with their entities and value objects, plus summarized relations between them
    pub fn strategic_graph(&self, name: &str, aggregates: &[AggregateGroup]) -> Result<Diagram> {
        let mut diagram = Diagram::new(name, DiagramType::Plain);
        let root = diagram.root_id().to_string();

        for group in aggregates {
            let aggregate_id = place_aggregate(&mut diagram, &root, group)?;
            for component_group in &group.sub_groups {
                for component in component_group.components()? {
                    diagram.place(&aggregate_id, DiagramNode::from_domain(&component), RelationType::Aggregation)?;
                }
            }
        }

        let endpoints = own_origins(&diagram, domain_candidate);
        let added = self.add_pairwise(&mut diagram, Query::Summary, &endpoints, |_| true)?;
        info!("📐 Strategic diagram '{}': {} aggregates, {} relation edges", name, aggregates.len(), added);
        Ok(diagram)
    }

    /// Aggregates broken down into component buckets with full members
    pub fn tactic_graph(&self, name: &str, aggregates: &[AggregateGroup]) -> Result<Diagram> {
        let mut diagram = Diagram::new(name, DiagramType::Table);
        let root = diagram.root_id().to_string();

        let mut buckets = Vec::new();
        for group in aggregates {
            let aggregate_id = place_aggregate(&mut diagram, &root, group)?;
            place_domain_members(&mut diagram, &aggregate_id, &group.members, true)?;

            for component_group in &group.sub_groups {
                let label = format!("{}/{}", group.name, component_group.name);
                let bucket = diagram.place(
                    &aggregate_id,
                    DiagramNode::bucket(&component_group.path, &label),
                    RelationType::Aggregation,
                )?;
                for component in component_group.components()? {
                    place_with_members(&mut diagram, &bucket, &component)?;
                }
                place_domain_members(&mut diagram, &bucket, &component_group.members, false)?;
                buckets.push(bucket);
            }
        }

        // member relations are lifted to their owner, then to the component bucket
        let bucket_endpoints: Vec<(String, Vec<Identifier>)> = buckets
            .into_iter()
            .map(|bucket| {
                let origins = diagram.origins_below(&bucket);
                (bucket, origins)
            })
            .collect();
        let mut added = self.add_pairwise(&mut diagram, Query::Direct, &bucket_endpoints, |_| true)?;

        if self.config.tactic_relations {
            let endpoints: Vec<(String, Vec<Identifier>)> = diagram
                .objects()
                .into_iter()
                .filter(|node| domain_candidate(node))
                .map(|node| (node.id.clone(), diagram.origins_below(&node.id)))
                .collect();
            added += self.add_pairwise(&mut diagram, Query::Direct, &endpoints, |_| true)?;
        }
        info!("📐 Tactic diagram '{}': {} nodes, {} relation edges", name, diagram.node_count(), added);
        Ok(diagram)
    }

    fn place_group(&self, diagram: &mut Diagram, parent: &str, group: &Group) -> Result<()> {
        let bucket = diagram.place(
            parent,
            DiagramNode::bucket(&group.path, &group.name),
            RelationType::AggregationRoot,
        )?;

        let loose: Vec<&Object> = group
            .generals()
            .into_iter()
            .chain(group.functions())
            .collect();
        if !loose.is_empty() {
            let abstraction = diagram.place(
                &bucket,
                abstraction_bucket(&group.path),
                RelationType::Abstraction,
            )?;
            for object in loose {
                diagram.place(&abstraction, DiagramNode::from_object(object), RelationType::Aggregation)?;
            }
        }

        for class in group.classes() {
            let class_id = diagram.place(&bucket, DiagramNode::from_object(class), RelationType::Aggregation)?;
            for attribute in group.resolve(class.attributes())? {
                diagram.place(&class_id, DiagramNode::from_object(attribute), RelationType::Attribution)?;
            }
            for method in group.resolve(class.methods())? {
                diagram.place(&class_id, DiagramNode::from_object(method), RelationType::Behavior)?;
            }
        }

        for interface in group.interfaces() {
            let interface_id = diagram.place(&bucket, DiagramNode::from_object(interface), RelationType::Aggregation)?;
            for method in group.resolve(interface.methods())? {
                diagram.place(&interface_id, DiagramNode::from_object(method), RelationType::Behavior)?;
            }
        }

        debug!("Placed group {} with {} sub-groups", group.path, group.sub_groups.len());
        for sub_group in &group.sub_groups {
            self.place_group(diagram, &bucket, sub_group)?;
        }
        Ok(())
    }

    /// Query every ordered pair of endpoints and add the accepted relation edges.
    ///
    /// An endpoint is a diagram node id with the origins that speak for it.
    fn add_pairwise<T>(
        &self,
        diagram: &mut Diagram,
        query: Query,
        endpoints: &[(String, Vec<Identifier>)],
        accept: T,
    ) -> Result<usize>
    where
        T: Fn(RelationType) -> bool,
    {
        let mut added = 0;
        for (from_id, from_origins) in endpoints {
            for (to_id, to_origins) in endpoints {
                if from_id == to_id {
                    continue;
                }
                for from_origin in from_origins {
                    for to_origin in to_origins {
                        if from_origin == to_origin {
                            continue;
                        }
                        let metas: Vec<RelationMeta> = match query {
                            Query::Direct => self.relations.relation_metas(from_origin, to_origin)?,
                            Query::Summary => self.relations.summary_relation_metas(from_origin, to_origin)?,
                        };
                        for meta in metas.into_iter().filter(|m| accept(m.relation_type)) {
                            diagram.add_edge(
                                from_id,
                                to_id,
                                DiagramEdge {
                                    relation_type: meta.relation_type,
                                    from_position: meta.from_position,
                                    to_position: meta.to_position,
                                },
                            )?;
                            added += 1;
                        }
                    }
                }
            }
        }
        Ok(added)
    }
}

/// Candidate nodes paired with their own origin only
fn own_origins<C>(diagram: &Diagram, candidate: C) -> Vec<(String, Vec<Identifier>)>
where
    C: Fn(&DiagramNode) -> bool,
{
    diagram
        .objects()
        .into_iter()
        .filter(|node| candidate(node))
        .filter_map(|node| node.origin.clone().map(|origin| (node.id.clone(), vec![origin])))
        .collect()
}

/// Attach a validated aggregate node below the root
fn place_aggregate(diagram: &mut Diagram, root: &str, group: &AggregateGroup) -> Result<String> {
    let aggregate = group.aggregate()?;
    if !aggregate.is_valid() {
        return Err(HexviewError::AggregateWithoutEntity(aggregate.name));
    }
    diagram.place(root, DiagramNode::from_aggregate(&aggregate), RelationType::AggregationRoot)
}

/// Loose functions and generals go into an abstraction bucket; interfaces and
/// optionally classes hang directly off `parent`
fn place_domain_members(
    diagram: &mut Diagram,
    parent: &str,
    members: &DomainObjects,
    include_classes: bool,
) -> Result<()> {
    let loose: Vec<DomainObject> = members
        .generals()
        .into_iter()
        .chain(members.functions())
        .collect();
    if !loose.is_empty() {
        let key = parent.trim_start_matches(super::diagram::BUCKET_PREFIX);
        let abstraction = diagram.place(parent, abstraction_bucket(key), RelationType::Abstraction)?;
        for object in &loose {
            diagram.place(&abstraction, DiagramNode::from_domain(object), RelationType::Aggregation)?;
        }
    }

    for interface in members.interfaces()? {
        place_with_members(diagram, parent, &interface)?;
    }
    if include_classes {
        for class in members.classes_as(DomainKind::Class)? {
            place_with_members(diagram, parent, &class)?;
        }
    }
    Ok(())
}

fn place_with_members(diagram: &mut Diagram, parent: &str, object: &DomainObject) -> Result<()> {
    let id = diagram.place(parent, DiagramNode::from_domain(object), RelationType::Aggregation)?;
    for attribute in &object.attributes {
        diagram.place(&id, DiagramNode::from_domain(attribute), RelationType::Attribution)?;
    }
    for method in &object.methods {
        diagram.place(&id, DiagramNode::from_domain(method), RelationType::Behavior)?;
    }
    Ok(())
}

fn abstraction_bucket(key: &str) -> DiagramNode {
    DiagramNode::bucket(&format!("{}#abstraction", key), "abstraction")
}

fn relation_candidate(node: &DiagramNode) -> bool {
    !node.is_bucket() && !node.kind.is_member()
}

fn domain_candidate(node: &DiagramNode) -> bool {
    relation_candidate(node) && node.kind != NodeKind::Aggregate
}
