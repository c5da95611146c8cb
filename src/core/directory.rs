// src/core/directory.rs
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{HexviewError, Result, WalkFailure};
use super::identity::Identifier;

const CMD: &str = "cmd";
const PKG: &str = "pkg";
const INTERNAL: &str = "internal";
const DOMAIN: &str = "domain";
const ENTITY: &str = "entity";
const VALUE_OBJECT: &str = "valueobject";
const REPOSITORY: &str = "repository";
const FACTORY: &str = "factory";

/// Folder convention a code base follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchPattern {
    /// `cmd/`, `pkg/`, `internal/domain/<aggregate>/...`
    Hexagon,
    Plain,
}

impl fmt::Display for ArchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hexagon => f.write_str("Hexagon"),
            Self::Plain => f.write_str("Plain"),
        }
    }
}

/// Structural role of a directory inside `internal/domain`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexagonDirectory {
    Domain,
    Aggregate,
    Entity,
    ValueObject,
    Repository,
    Factory,
    Invalid,
}

/// Node of the directory prefix tree
#[derive(Debug, Clone, Default)]
pub struct DirNode {
    pub name: String,
    pub children: BTreeMap<String, DirNode>,
    /// Identifiers declared directly in this directory, once attached
    pub value: Option<Vec<Identifier>>,
    listed: bool,
}

impl DirNode {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn identifiers(&self) -> &[Identifier] {
        self.value.as_deref().unwrap_or(&[])
    }
}

/// Everything that went wrong during a best-effort walk
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub failures: Vec<WalkFailure>,
}

impl WalkOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn collected failures into a single error
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(HexviewError::Walk { failures: self.failures })
        }
    }

    /// Surface the first collected failure as-is, dropping the rest
    pub fn into_first_error(self) -> Result<()> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }
}

/// Prefix tree over every directory that holds identifiers
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    top: DirNode,
    root_path: String,
}

impl DirectoryTree {
    /// Build the tree from a set of directories (`/` separated)
    pub fn new<'a, I>(dirs: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut top = DirNode::named("");
        for dir in dirs {
            let mut node = &mut top;
            for segment in split(dir) {
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| DirNode::named(segment));
            }
            node.listed = true;
        }

        // The effective root is the first node that branches or holds declarations
        let mut root_path = String::new();
        let mut node = &top;
        while !node.listed && node.children.len() == 1 {
            if let Some((name, child)) = node.children.iter().next() {
                root_path = join(&root_path, name);
                node = child;
            }
        }

        Self { top, root_path }
    }

    /// Build the tree and attach every identifier to its directory
    pub fn from_identifiers(ids: &[Identifier]) -> Result<Self> {
        let dirs: HashSet<&str> = ids.iter().map(|id| id.dir()).collect();
        let mut tree = Self::new(dirs);

        let mut by_dir: BTreeMap<&str, Vec<Identifier>> = BTreeMap::new();
        for id in ids {
            by_dir.entry(id.dir()).or_default().push(id.clone());
        }
        for (dir, list) in by_dir {
            tree.attach(dir, list)?;
        }
        Ok(tree)
    }

    /// Attach the identifiers declared in `dir`
    pub fn attach(&mut self, dir: &str, ids: Vec<Identifier>) -> Result<()> {
        let mut node = &mut self.top;
        for segment in split(dir) {
            node = node
                .children
                .get_mut(segment)
                .ok_or_else(|| HexviewError::NotFound(dir.to_string()))?;
        }
        node.value.get_or_insert_with(Vec::new).extend(ids);
        Ok(())
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Name of the root directory (empty when the root is the source root itself)
    pub fn root_name(&self) -> &str {
        self.root().name.as_str()
    }

    pub fn root(&self) -> &DirNode {
        self.find(&self.root_path).unwrap_or(&self.top)
    }

    pub fn find(&self, path: &str) -> Option<&DirNode> {
        let mut node = &self.top;
        for segment in split(path) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Path of the `internal/domain` directory below the root
    pub fn domain_path(&self) -> String {
        join(&join(&self.root_path, INTERNAL), DOMAIN)
    }

    pub fn arch_design_pattern(&self) -> ArchPattern {
        let root = self.root();
        if !(root.has_child(CMD) && root.has_child(PKG) && root.has_child(INTERNAL)) {
            return ArchPattern::Plain;
        }

        let domain = root
            .children
            .get(INTERNAL)
            .and_then(|internal| internal.children.get(DOMAIN));

        match domain {
            Some(domain) if domain.children.keys().any(|name| !is_domain_component(name)) => {
                ArchPattern::Hexagon
            }
            _ => ArchPattern::Plain,
        }
    }

    /// Classify a directory by its position below `internal/domain`
    pub fn hexagon_directory(&self, dir: &str) -> HexagonDirectory {
        let relative = strip_root(dir, &self.root_path);
        let segments: Vec<&str> = match relative {
            Some(rel) => split(rel).collect(),
            None => return HexagonDirectory::Invalid,
        };

        if segments.len() < 2 || segments[0] != INTERNAL || segments[1] != DOMAIN {
            return HexagonDirectory::Invalid;
        }

        match segments.len() {
            2 => HexagonDirectory::Domain,
            3 if is_component(segments[2]) => HexagonDirectory::Invalid,
            3 => HexagonDirectory::Aggregate,
            4 => match segments[3] {
                ENTITY => HexagonDirectory::Entity,
                VALUE_OBJECT => HexagonDirectory::ValueObject,
                REPOSITORY => HexagonDirectory::Repository,
                FACTORY => HexagonDirectory::Factory,
                _ => HexagonDirectory::Invalid,
            },
            _ => HexagonDirectory::Invalid,
        }
    }

    /// Depth-first walk of the sub-tree at `dir`.
    ///
    /// Callback errors do not stop the walk; they are returned in the outcome.
    /// Only a missing start directory fails immediately.
    pub fn walk_dir<F>(&self, dir: &str, mut callback: F) -> Result<WalkOutcome>
    where
        F: FnMut(&str, &[Identifier]) -> Result<()>,
    {
        let start = self
            .find(dir)
            .ok_or_else(|| HexviewError::NotFound(dir.to_string()))?;

        let mut outcome = WalkOutcome::default();
        walk_node(start, dir.trim_matches('/'), &mut callback, &mut outcome);
        Ok(outcome)
    }

    pub fn walk_root_dir<F>(&self, mut callback: F) -> WalkOutcome
    where
        F: FnMut(&str, &[Identifier]) -> Result<()>,
    {
        let mut outcome = WalkOutcome::default();
        walk_node(self.root(), &self.root_path, &mut callback, &mut outcome);
        outcome
    }
}

fn walk_node<F>(node: &DirNode, path: &str, callback: &mut F, outcome: &mut WalkOutcome)
where
    F: FnMut(&str, &[Identifier]) -> Result<()>,
{
    if let Err(error) = callback(path, node.identifiers()) {
        outcome.failures.push(WalkFailure {
            path: path.to_string(),
            error,
        });
    }
    for (name, child) in &node.children {
        walk_node(child, &join(path, name), callback, outcome);
    }
}

fn is_component(name: &str) -> bool {
    matches!(name, ENTITY | VALUE_OBJECT | REPOSITORY | FACTORY)
}

/// Only entity and value-object buckets misplaced under `domain` rule out a hexagon
fn is_domain_component(name: &str) -> bool {
    matches!(name, ENTITY | VALUE_OBJECT)
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub(crate) fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Last segment of a `/` separated path
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent of a `/` separated path (empty for top-level paths)
pub(crate) fn parent_path(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

fn strip_root<'a>(dir: &'a str, root: &str) -> Option<&'a str> {
    let dir = dir.trim_matches('/');
    if root.is_empty() {
        return Some(dir);
    }
    if dir == root {
        return Some("");
    }
    dir.strip_prefix(root).and_then(|rest| rest.strip_prefix('/'))
}
