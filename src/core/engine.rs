// src/core/engine.rs
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{Config, DiagramConfig, OutputFormat};
use crate::error::HexviewError;
use super::analyzer::{AnalysisSummary, Collector, GoAnalyzer};
use super::diagram::{Diagram, DiagramAssembler};
use super::directory::{ArchPattern, DirectoryTree};
use super::model::{DomainModel, GeneralModel};
use super::relation_graph::RelationGraph;
use super::render;
use super::store::{ObjectStore, RelationStore};

/// Name of the config file written by `init`
pub const CONFIG_FILE: &str = "hexview.toml";

/// Which diagram to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Every directory of the code base
    General,
    /// Aggregates and their components
    Strategic,
    /// Aggregates with their component members
    Tactic,
}

impl View {
    pub fn requires_hexagon(&self) -> bool {
        matches!(self, Self::Strategic | Self::Tactic)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            Self::Strategic => f.write_str("strategic"),
            Self::Tactic => f.write_str("tactic"),
        }
    }
}

impl FromStr for View {
    type Err = HexviewError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "strategic" => Ok(Self::Strategic),
            "tactic" => Ok(Self::Tactic),
            other => Err(HexviewError::UnsupportedComponent(other.to_string())),
        }
    }
}

/// Everything one analysis run produced
pub struct Snapshot {
    pub summary: AnalysisSummary,
    pub objects: ObjectStore,
    pub relations: RelationStore,
    pub tree: DirectoryTree,
}

impl Snapshot {
    pub fn pattern(&self) -> ArchPattern {
        self.tree.arch_design_pattern()
    }
}

/// Result of `detect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub pattern: ArchPattern,
    pub objects: usize,
    pub relations: usize,
}

/// Main orchestration engine for hexview
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine from the config file at `config_path` or a discovered one
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path).context("Failed to load configuration")?;
        debug!("Loaded configuration: {:?}", config);
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Write a default config file into `path` (current directory when `None`)
    pub async fn init(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let target_dir = match path {
            Some(path) => path,
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        info!("Initializing hexview in: {}", target_dir.display());

        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;

        let config_path = target_dir.join(CONFIG_FILE);
        if tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
            warn!("⚠️ {} already exists, leaving it untouched", config_path.display());
            return Ok(config_path);
        }

        let mut config = Config::default();
        if let Some(name) = target_dir
            .canonicalize()
            .ok()
            .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        {
            config.project.name = name;
        }
        let content = toml::to_string_pretty(&config).context("Failed to serialize default configuration")?;
        tokio::fs::write(&config_path, content)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        info!("✅ Wrote {}", config_path.display());
        Ok(config_path)
    }

    /// Analyze the sources and report the architecture pattern
    pub async fn detect(&self, source: Option<PathBuf>) -> Result<Detection> {
        let source = source.unwrap_or_else(|| self.config.project.source_dir.clone());
        info!("🔍 Detecting architecture of {}", source.display());

        let config = self.config.clone();
        let snapshot = tokio::task::spawn_blocking(move || analyze(&source, &config))
            .await
            .context("Analysis task panicked")??;

        let detection = Detection {
            pattern: snapshot.pattern(),
            objects: snapshot.objects.len(),
            relations: snapshot.relations.len(),
        };
        info!("🏛️ Architecture: {}", detection.pattern);
        println!("Files:        {}", snapshot.summary.files);
        println!("Architecture: {}", detection.pattern);
        println!("Objects:      {}", detection.objects);
        println!("Relations:    {}", detection.relations);
        Ok(detection)
    }

    /// Build one view of the sources and write it to the output directory
    pub async fn diagram(
        &self,
        source: Option<PathBuf>,
        output: Option<PathBuf>,
        view: &str,
        all_relations: bool,
        embedded_relations: bool,
        format: Option<String>,
    ) -> Result<PathBuf> {
        let view: View = view.parse()?;
        let format = match format {
            Some(format) => format.parse::<OutputFormat>()?,
            None => self.config.diagram.format,
        };
        let source = source.unwrap_or_else(|| self.config.project.source_dir.clone());
        let output_dir = output.unwrap_or_else(|| self.config.project.output_dir.clone());

        let mut config = self.config.clone();
        config.diagram.show_all_relations |= all_relations;
        config.diagram.show_struct_embedded_relations |= embedded_relations;

        info!("📐 Building {} diagram for {}", view, source.display());
        let rendered = tokio::task::spawn_blocking(move || -> Result<String> {
            let snapshot = analyze(&source, &config)?;
            let diagram = build_diagram(&snapshot, view, &config.project.name, &config.diagram)?;
            Ok(render::render(&diagram, format, &config.layout)?)
        })
        .await
        .context("Diagram task panicked")??;

        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let path = output_dir.join(format!(
            "{}-{}.{}",
            self.config.project.name,
            view,
            format.extension()
        ));
        tokio::fs::write(&path, rendered)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("✅ Diagram written to {}", path.display());
        Ok(path)
    }
}

/// Run the analyzer over `source` and collect a complete snapshot
pub fn analyze(source: &Path, config: &Config) -> Result<Snapshot> {
    let mut analyzer = GoAnalyzer::new(source, &config.analysis, &config.project.ignore_patterns)?;
    let mut collector = Collector::new();
    let summary = analyzer
        .analyze(&mut collector)
        .with_context(|| format!("Failed to analyze {}", source.display()))?;

    let (objects, relations) = collector.into_stores();
    let tree = DirectoryTree::from_identifiers(objects.all())?;
    info!(
        "📦 Collected {} objects and {} relations from {} files",
        objects.len(),
        relations.len(),
        summary.files
    );

    Ok(Snapshot {
        summary,
        objects,
        relations,
        tree,
    })
}

/// Group the snapshot for `view` and assemble its diagram
pub fn build_diagram(snapshot: &Snapshot, view: View, name: &str, config: &DiagramConfig) -> Result<Diagram> {
    let pattern = snapshot.pattern();
    if view.requires_hexagon() && pattern != ArchPattern::Hexagon {
        let root = if snapshot.tree.root_path().is_empty() {
            name.to_string()
        } else {
            snapshot.tree.root_path().to_string()
        };
        return Err(HexviewError::NotHexagon(root).into());
    }

    let graph = RelationGraph::from_stores(&snapshot.objects, &snapshot.relations)?;
    let assembler = DiagramAssembler::new(&graph, config);

    let diagram = match view {
        View::General => {
            let group = GeneralModel::new(&snapshot.tree, &snapshot.objects, name).grouping()?;
            assembler.general_graph(name, &group)?
        }
        View::Strategic => {
            let aggregates = DomainModel::new(&snapshot.tree, &snapshot.objects).strategic_grouping()?;
            assembler.strategic_graph(name, &aggregates)?
        }
        View::Tactic => {
            let aggregates = DomainModel::new(&snapshot.tree, &snapshot.objects).tactic_grouping()?;
            assembler.tactic_graph(name, &aggregates)?
        }
    };

    info!(
        "🧩 {} diagram has {} nodes and {} edges",
        view,
        diagram.node_count(),
        diagram.edges().len()
    );
    Ok(diagram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagram::{DiagramType, NodeKind};
    use crate::core::relation::RelationType;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    const ORDER: &str = r#"package entity

import "example.com/shop/internal/domain/order/valueobject"

type Order struct {
    ID      string
    Total   valueobject.Money
    Address *valueobject.Address
}

func (o *Order) Ship() string {
    return valueobject.Format(o.Address)
}
"#;

    const VALUES: &str = r#"package valueobject

type Money struct {
    Amount int
}

type Address struct {
    Street string
}

func Format(a *Address) string { return a.Street }
"#;

    fn hexagon() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("go.mod").write_str("module example.com/shop\n").unwrap();
        temp.child("cmd/shop/main.go")
            .write_str("package main\n\nfunc main() {}\n")
            .unwrap();
        temp.child("pkg/log/log.go")
            .write_str("package log\n\ntype Level int\n")
            .unwrap();
        temp.child("internal/domain/order/entity/order.go").write_str(ORDER).unwrap();
        temp.child("internal/domain/order/valueobject/values.go").write_str(VALUES).unwrap();
        temp
    }

    fn plain() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("go.mod").write_str("module example.com/tool\n").unwrap();
        temp.child("server/server.go")
            .write_str("package server\n\ntype Server struct {\n    Port int\n}\n\nfunc (s *Server) Run() {}\n")
            .unwrap();
        temp.child("store/store.go")
            .write_str("package store\n\ntype Store struct{}\n")
            .unwrap();
        temp
    }

    fn engine(name: &str) -> Engine {
        let mut config = Config::default();
        config.project.name = name.to_string();
        Engine::with_config(config)
    }

    #[test]
    fn test_view_names() {
        assert_eq!("Tactic".parse::<View>().unwrap(), View::Tactic);
        assert_eq!(View::Strategic.to_string(), "strategic");
        assert!(matches!(
            "context".parse::<View>(),
            Err(HexviewError::UnsupportedComponent(name)) if name == "context"
        ));
    }

    #[test]
    fn test_hexagon_snapshot_builds_domain_views() {
        let temp = hexagon();
        let config = Config::default();
        let snapshot = analyze(temp.path(), &config).unwrap();
        assert_eq!(snapshot.pattern(), ArchPattern::Hexagon);

        let strategic = build_diagram(&snapshot, View::Strategic, "shop", &config.diagram).unwrap();
        assert_eq!(strategic.diagram_type(), DiagramType::Plain);
        let aggregates = strategic.children(strategic.root_id());
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].0.kind, NodeKind::Aggregate);

        let tactic = build_diagram(&snapshot, View::Tactic, "shop", &config.diagram).unwrap();
        assert_eq!(tactic.diagram_type(), DiagramType::Table);
        assert!(tactic.node_count() > strategic.node_count());
        // Ship calls valueobject.Format, surfaced between the component buckets
        assert!(tactic.edges().iter().any(|e| e.relation_type == RelationType::Dependency
            && e.from == "#internal/domain/order/entity"
            && e.to == "#internal/domain/order/valueobject"));
    }

    #[test]
    fn test_domain_views_require_hexagon() {
        let temp = plain();
        let config = Config::default();
        let snapshot = analyze(temp.path(), &config).unwrap();
        assert_eq!(snapshot.pattern(), ArchPattern::Plain);

        let err = build_diagram(&snapshot, View::Strategic, "tool", &config.diagram).unwrap_err();
        assert!(matches!(err.downcast_ref::<HexviewError>(), Some(HexviewError::NotHexagon(_))));

        let general = build_diagram(&snapshot, View::General, "tool", &config.diagram).unwrap();
        assert_eq!(general.diagram_type(), DiagramType::Table);
        let groups = general.children(general.root_id());
        assert!(groups.iter().all(|(_, e)| e.relation_type == RelationType::AggregationRoot));
    }

    #[tokio::test]
    async fn test_diagram_writes_named_output() {
        let temp = hexagon();
        let out = temp.child("out");
        let engine = engine("shop");

        let path = engine
            .diagram(
                Some(temp.path().to_path_buf()),
                Some(out.path().to_path_buf()),
                "strategic",
                false,
                false,
                None,
            )
            .await
            .unwrap();

        assert_eq!(path, out.path().join("shop-strategic.dot"));
        out.child("shop-strategic.dot")
            .assert(predicate::str::starts_with("digraph \"shop\""));

        let json = engine
            .diagram(
                Some(temp.path().to_path_buf()),
                Some(out.path().to_path_buf()),
                "general",
                true,
                false,
                Some("json".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(json, out.path().join("shop-general.json"));
        out.child("shop-general.json")
            .assert(predicate::str::contains("\"sub_diagrams\""));
    }

    #[tokio::test]
    async fn test_unknown_view_fails_before_analysis() {
        let engine = engine("shop");
        let err = engine
            .diagram(Some(PathBuf::from("/nonexistent")), None, "context", false, false, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HexviewError>(),
            Some(HexviewError::UnsupportedComponent(_))
        ));
    }

    #[tokio::test]
    async fn test_detect_and_init() {
        let temp = hexagon();
        let engine = engine("shop");

        let detection = engine.detect(Some(temp.path().to_path_buf())).await.unwrap();
        assert_eq!(detection.pattern, ArchPattern::Hexagon);
        assert!(detection.objects > 0);
        assert!(detection.relations > 0);

        let target = temp.child("fresh");
        let written = engine.init(Some(target.path().to_path_buf())).await.unwrap();
        assert_eq!(written, target.path().join(CONFIG_FILE));
        let config = Config::load(&written).unwrap();
        assert_eq!(config.project.name, "fresh");
    }
}
