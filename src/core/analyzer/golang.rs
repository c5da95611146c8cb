// src/core/analyzer/golang.rs
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, CallGraphMode};
use crate::error::{HexviewError, Result};
use super::super::identity::{Identifier, Position};
use super::super::relation::{Endpoint, Multiplicity};
use super::syntax::{FileFacts, GoSyntax, Holding, TypeRef, TypeShape};
use super::{AnalysisHandler, DeclKind, LinkEvent, LinkHint, NodeEvent};

/// Counts reported after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub files: usize,
    pub skipped: usize,
    pub declarations: usize,
    pub links: usize,
}

/// Analyzer for a Go module rooted at a directory
pub struct GoAnalyzer {
    root: PathBuf,
    config: AnalysisConfig,
    ignore_patterns: Vec<String>,
    syntax: GoSyntax,
    generated: Regex,
}

impl GoAnalyzer {
    pub fn new<P: AsRef<Path>>(root: P, config: &AnalysisConfig, ignore_patterns: &[String]) -> Result<Self> {
        let generated = Regex::new(r"(?m)^// Code generated .* DO NOT EDIT\.$")
            .map_err(|e| HexviewError::Parser(e.to_string()))?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            config: config.clone(),
            ignore_patterns: ignore_patterns.to_vec(),
            syntax: GoSyntax::new()?,
            generated,
        })
    }

    /// Module path declared in `go.mod`, if any
    pub fn module_path(&self) -> Result<Option<String>> {
        let go_mod = self.root.join("go.mod");
        if !go_mod.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(go_mod)?;
        let re = Regex::new(r"(?m)^module\s+(\S+)").map_err(|e| HexviewError::Parser(e.to_string()))?;
        Ok(re.captures(&content).map(|c| c[1].trim_matches('"').to_string()))
    }

    /// Go files below the root, sorted, honouring .gitignore and the ignore patterns
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.ignore_patterns {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| HexviewError::Config(e.to_string()))?;
        }
        let overrides = overrides.build().map_err(|e| HexviewError::Config(e.to_string()))?;

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .overrides(overrides)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| HexviewError::FileSystem(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("go") {
                continue;
            }
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with("_test.go"));
            if is_test && !self.config.include_tests {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    /// Parse every source file and report declarations, then links, to `handler`
    pub fn analyze<H: AnalysisHandler>(&mut self, handler: &mut H) -> Result<AnalysisSummary> {
        let module = self.module_path()?;
        let mut summary = AnalysisSummary::default();
        let mut files = Vec::new();

        for path in self.source_files()? {
            let content = std::fs::read_to_string(&path)?;
            if self.config.skip_generated && self.generated.is_match(&content) {
                debug!("Skipping generated file {}", path.display());
                summary.skipped += 1;
                continue;
            }
            let (dir, filename) = self.relative(&path);
            match self.syntax.parse(&dir, &filename, &content) {
                Ok(facts) => files.push(facts),
                Err(e) => {
                    warn!("⚠️ Skipping {}: {}", filename, e);
                    summary.skipped += 1;
                }
            }
        }
        summary.files = files.len();
        info!("🔍 Parsed {} Go files ({} skipped)", summary.files, summary.skipped);

        let mut emitter = Emitter::new(handler, module, self.config.call_graph);
        emitter.declarations(&files, &mut summary)?;
        emitter.links(&files, &mut summary)?;

        info!("🔗 Reported {} declarations and {} links", summary.declarations, summary.links);
        Ok(summary)
    }

    /// Directory and file name relative to the root, `/` separated
    fn relative(&self, path: &Path) -> (String, String) {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let filename = segments.join("/");
        let dir = segments[..segments.len().saturating_sub(1)].join("/");
        (dir, filename)
    }
}

/// Declaration lookup built while reporting declarations
#[derive(Default)]
struct Index {
    positions: HashMap<String, Position>,
    interfaces: Vec<(Identifier, Vec<String>)>,
    /// Receiver type id to the type and its method names
    method_sets: BTreeMap<String, (Identifier, HashSet<String>)>,
    /// Method name to every receiver type declaring it
    methods_by_name: HashMap<String, Vec<Identifier>>,
}

struct Emitter<'h, H: AnalysisHandler> {
    handler: &'h mut H,
    module: Option<String>,
    mode: CallGraphMode,
    index: Index,
}

impl<'h, H: AnalysisHandler> Emitter<'h, H> {
    fn new(handler: &'h mut H, module: Option<String>, mode: CallGraphMode) -> Self {
        Self {
            handler,
            module,
            mode,
            index: Index::default(),
        }
    }

    fn declarations(&mut self, files: &[FileFacts], summary: &mut AnalysisSummary) -> Result<()> {
        // types first, members may live in another file of the package
        for file in files {
            for decl in &file.types {
                let id = Identifier::new(file.dir.as_str(), decl.name.as_str());
                let kind = match decl.shape {
                    TypeShape::Struct(_) => DeclKind::Class,
                    TypeShape::Interface(_) => DeclKind::Interface,
                    TypeShape::Other => DeclKind::General,
                };
                if self.node(kind, id.clone(), decl.position.clone(), None, summary)? {
                    if let TypeShape::Interface(methods) = &decl.shape {
                        let names = methods.iter().map(|(name, _)| name.clone()).collect();
                        self.index.interfaces.push((id, names));
                    }
                }
            }
        }

        for file in files {
            for decl in &file.types {
                let owner = Identifier::new(file.dir.as_str(), decl.name.as_str());
                match &decl.shape {
                    TypeShape::Struct(fields) => {
                        for field in fields {
                            if let Some(name) = &field.name {
                                let id = member(&owner, name);
                                self.node(DeclKind::Attribute, id, field.position.clone(), Some(owner.clone()), summary)?;
                            }
                        }
                    }
                    TypeShape::Interface(methods) => {
                        for (name, position) in methods {
                            let id = member(&owner, name);
                            self.node(DeclKind::InterfaceMethod, id, position.clone(), Some(owner.clone()), summary)?;
                        }
                    }
                    TypeShape::Other => {}
                }
            }

            for func in &file.funcs {
                match &func.receiver {
                    Some(receiver) => {
                        let owner = Identifier::new(file.dir.as_str(), receiver.as_str());
                        if !self.index.positions.contains_key(&owner.id()) {
                            debug!("Receiver {} of {} is not declared, skipping", owner, func.name);
                            continue;
                        }
                        let id = member(&owner, &func.name);
                        if self.node(DeclKind::Function, id, func.position.clone(), Some(owner.clone()), summary)? {
                            self.index
                                .method_sets
                                .entry(owner.id())
                                .or_insert_with(|| (owner.clone(), HashSet::new()))
                                .1
                                .insert(func.name.clone());
                            self.index
                                .methods_by_name
                                .entry(func.name.clone())
                                .or_default()
                                .push(owner);
                        }
                    }
                    None => {
                        let id = Identifier::new(file.dir.as_str(), func.name.as_str());
                        self.node(DeclKind::Function, id, func.position.clone(), None, summary)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn links(&mut self, files: &[FileFacts], summary: &mut AnalysisSummary) -> Result<()> {
        for file in files {
            for decl in &file.types {
                let TypeShape::Struct(fields) = &decl.shape else {
                    continue;
                };
                let owner = Identifier::new(file.dir.as_str(), decl.name.as_str());
                for field in fields {
                    let Some(type_ref) = &field.type_ref else {
                        continue;
                    };
                    let Some(target) = self.resolve_type(file, type_ref) else {
                        continue;
                    };
                    let hint = match (field.name.is_none(), type_ref.holding) {
                        (true, _) => LinkHint::Embedding,
                        (false, Holding::Value) => LinkHint::Composition,
                        (false, Holding::Pointer) => LinkHint::Association(Multiplicity::OneOne),
                        (false, Holding::Many) => LinkHint::Association(Multiplicity::OneMany),
                    };
                    let from_position = match &field.name {
                        Some(name) => self.position_of(&member(&owner, name)),
                        None => field.position.clone(),
                    };
                    self.link(owner.clone(), from_position, target, hint, summary)?;
                }
            }
        }

        self.implementations(summary)?;

        for file in files {
            for func in &file.funcs {
                let caller = match &func.receiver {
                    Some(receiver) => Identifier::new(file.dir.as_str(), receiver.as_str()),
                    None => Identifier::new(file.dir.as_str(), func.name.as_str()),
                };
                if !self.index.positions.contains_key(&caller.id()) {
                    continue;
                }
                for call in &func.calls {
                    let Some(callee) = self.resolve_call(file, call.selector, call.qualifier.as_deref(), &call.name) else {
                        continue;
                    };
                    if callee == caller {
                        continue;
                    }
                    self.link(caller.clone(), call.position.clone(), callee, LinkHint::Dependency, summary)?;
                }
            }
        }
        Ok(())
    }

    /// A struct implements every interface whose method names its method set covers
    fn implementations(&mut self, summary: &mut AnalysisSummary) -> Result<()> {
        let mut found = Vec::new();
        for (owner, methods) in self.index.method_sets.values() {
            for (interface, required) in &self.index.interfaces {
                if !required.is_empty() && required.iter().all(|m| methods.contains(m)) {
                    found.push((owner.clone(), interface.clone()));
                }
            }
        }

        for (owner, interface) in found {
            let position = self.position_of(&owner);
            self.link(owner, position, interface, LinkHint::Implementation, summary)?;
        }
        Ok(())
    }

    fn resolve_type(&self, file: &FileFacts, type_ref: &TypeRef) -> Option<Identifier> {
        let dir = match &type_ref.qualifier {
            Some(qualifier) => self.import_dir(file, qualifier)?,
            None => file.dir.clone(),
        };
        let id = Identifier::new(dir, type_ref.name.as_str());
        self.index.positions.contains_key(&id.id()).then_some(id)
    }

    /// Callee of a call site; methods are lifted to their receiver type
    fn resolve_call(&self, file: &FileFacts, selector: bool, qualifier: Option<&str>, name: &str) -> Option<Identifier> {
        if !selector {
            let id = Identifier::new(file.dir.as_str(), name);
            return self.index.positions.contains_key(&id.id()).then_some(id);
        }

        if let Some(dir) = qualifier.and_then(|q| self.import_dir(file, q)) {
            let id = Identifier::new(dir, name);
            return self.index.positions.contains_key(&id.id()).then_some(id);
        }

        match self.mode {
            CallGraphMode::Fast => None,
            CallGraphMode::Deep => match self.index.methods_by_name.get(name).map(Vec::as_slice) {
                Some([receiver]) => Some(receiver.clone()),
                _ => None,
            },
        }
    }

    /// Project directory of an imported package, `None` for external imports
    fn import_dir(&self, file: &FileFacts, qualifier: &str) -> Option<String> {
        let path = file.imports.get(qualifier)?;
        let module = self.module.as_deref()?;
        if path == module {
            return Some(String::new());
        }
        path.strip_prefix(module)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }

    fn position_of(&self, id: &Identifier) -> Position {
        self.index
            .positions
            .get(&id.id())
            .cloned()
            .unwrap_or_else(Position::synthetic)
    }

    /// Report a declaration once; later duplicates (build-tag variants) are skipped
    fn node(
        &mut self,
        kind: DeclKind,
        id: Identifier,
        position: Position,
        parent: Option<Identifier>,
        summary: &mut AnalysisSummary,
    ) -> Result<bool> {
        if self.index.positions.contains_key(&id.id()) {
            warn!("Duplicate declaration {} at {}, keeping the first", id, position);
            return Ok(false);
        }
        self.index.positions.insert(id.id(), position.clone());
        self.handler.on_node(NodeEvent {
            kind,
            id,
            position,
            parent,
        })?;
        summary.declarations += 1;
        Ok(true)
    }

    fn link(
        &mut self,
        from: Identifier,
        from_position: Position,
        to: Identifier,
        hint: LinkHint,
        summary: &mut AnalysisSummary,
    ) -> Result<()> {
        let to_position = self.position_of(&to);
        self.handler.on_link(LinkEvent {
            from: Endpoint::new(from, from_position),
            to: Endpoint::new(to, to_position),
            hint,
        })?;
        summary.links += 1;
        Ok(())
    }
}

fn member(owner: &Identifier, name: &str) -> Identifier {
    Identifier::new(owner.dir(), format!("{}.{}", owner.name(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analyzer::Collector;
    use crate::core::object::ObjectTag;
    use crate::core::relation::{RelationKind, RelationType};
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    const ENTITY: &str = r#"package entity

import "example.com/shop/internal/domain/order/valueobject"

type Order struct {
    ID      string
    Total   valueobject.Money
    Address *valueobject.Address
    Lines   []Line
}

type Line struct {
    Qty int
}

func (o *Order) Ship() string {
    return valueobject.Format(o.Address)
}

func (o *Order) Save() error { return nil }
"#;

    const VALUE_OBJECT: &str = r#"package valueobject

type Money struct {
    Amount int
}

type Address struct {
    Street string
}

func Format(a *Address) string {
    return a.Label()
}

func (a *Address) Label() string { return a.Street }
"#;

    const REPOSITORY: &str = r#"package repository

type Saver interface {
    Save() error
}
"#;

    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("go.mod").write_str("module example.com/shop\n\ngo 1.21\n").unwrap();
        temp.child("internal/domain/order/entity/order.go").write_str(ENTITY).unwrap();
        temp.child("internal/domain/order/valueobject/money.go").write_str(VALUE_OBJECT).unwrap();
        temp.child("internal/domain/order/repository/repo.go").write_str(REPOSITORY).unwrap();
        temp.child("internal/domain/order/entity/order_test.go")
            .write_str("package entity\n\nfunc TestOrder() {}\n")
            .unwrap();
        temp.child("pkg/gen/gen.go")
            .write_str("// Code generated by mockgen. DO NOT EDIT.\npackage gen\n\ntype Mock struct{}\n")
            .unwrap();
        temp
    }

    fn analyze(temp: &TempDir, config: &AnalysisConfig) -> (Collector, AnalysisSummary) {
        let mut analyzer = GoAnalyzer::new(temp.path(), config, &[]).unwrap();
        let mut collector = Collector::new();
        let summary = analyzer.analyze(&mut collector).unwrap();
        (collector, summary)
    }

    fn fast() -> AnalysisConfig {
        AnalysisConfig {
            call_graph: CallGraphMode::Fast,
            include_tests: false,
            skip_generated: true,
        }
    }

    fn link_types(collector: &Collector, from: &str) -> Vec<(String, RelationType)> {
        let mut found = Vec::new();
        collector
            .relations()
            .walk(|relation| {
                if relation.from.id.id() == from {
                    for (target, relation_type) in relation.targets() {
                        found.push((target.id.id(), relation_type));
                    }
                }
                Ok(())
            })
            .unwrap();
        found
    }

    #[test]
    fn test_module_path_and_file_filters() {
        let temp = workspace();
        let analyzer = GoAnalyzer::new(temp.path(), &fast(), &[]).unwrap();
        assert_eq!(analyzer.module_path().unwrap().as_deref(), Some("example.com/shop"));

        let files = analyzer.source_files().unwrap();
        assert_eq!(files.len(), 4);
        assert!(files.iter().all(|f| !f.to_string_lossy().ends_with("_test.go")));

        let (_, summary) = analyze(&temp, &fast());
        assert_eq!(summary.files, 3);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_ignore_patterns_exclude_directories() {
        let temp = workspace();
        let analyzer = GoAnalyzer::new(temp.path(), &fast(), &["pkg/".to_string()]).unwrap();
        let files = analyzer.source_files().unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_declarations_become_objects() {
        let temp = workspace();
        let (collector, _) = analyze(&temp, &fast());
        let objects = collector.objects();

        let order = objects
            .find(&Identifier::new("internal/domain/order/entity", "Order"))
            .unwrap();
        assert_eq!(order.tag(), ObjectTag::Class);
        assert_eq!(order.attributes().len(), 4);
        assert_eq!(order.methods().len(), 2);
        assert_eq!(order.position().filename, "internal/domain/order/entity/order.go");

        let saver = objects
            .find(&Identifier::new("internal/domain/order/repository", "Saver"))
            .unwrap();
        assert_eq!(saver.methods().len(), 1);
    }

    #[test]
    fn test_fields_become_typed_links() {
        let temp = workspace();
        let (collector, _) = analyze(&temp, &fast());
        let links = link_types(&collector, "internal/domain/order/entity/Order");

        assert!(links.contains(&("internal/domain/order/valueobject/Money".to_string(), RelationType::Composition)));
        assert!(links.contains(&(
            "internal/domain/order/valueobject/Address".to_string(),
            RelationType::AssociationOneOne
        )));
        assert!(links.contains(&("internal/domain/order/entity/Line".to_string(), RelationType::AssociationOneMany)));
        assert!(links.contains(&("internal/domain/order/repository/Saver".to_string(), RelationType::Implementation)));
    }

    #[test]
    fn test_calls_are_lifted_to_receivers() {
        let temp = workspace();
        let (collector, _) = analyze(&temp, &fast());

        let links = link_types(&collector, "internal/domain/order/entity/Order");
        assert!(links.contains(&("internal/domain/order/valueobject/Format".to_string(), RelationType::Dependency)));

        // `a.Label()` needs deep resolution
        let format = link_types(&collector, "internal/domain/order/valueobject/Format");
        assert!(format.is_empty());

        let deep = AnalysisConfig {
            call_graph: CallGraphMode::Deep,
            ..fast()
        };
        let (collector, _) = analyze(&temp, &deep);
        let format = link_types(&collector, "internal/domain/order/valueobject/Format");
        assert_eq!(
            format,
            vec![("internal/domain/order/valueobject/Address".to_string(), RelationType::Dependency)]
        );
    }

    #[test]
    fn test_duplicate_declarations_keep_the_first() {
        let temp = workspace();
        temp.child("internal/domain/order/valueobject/money_alt.go")
            .write_str("package valueobject\n\ntype Money struct{}\n")
            .unwrap();
        let (collector, _) = analyze(&temp, &fast());

        let mut implementations = 0;
        collector
            .relations()
            .walk(|relation| {
                if matches!(relation.kind, RelationKind::Implementation { .. }) {
                    implementations += 1;
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(implementations, 1);
        assert!(collector
            .objects()
            .find(&Identifier::new("internal/domain/order/valueobject", "Money.Amount"))
            .is_some());
    }
}
