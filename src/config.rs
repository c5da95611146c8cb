use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{HexviewError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Source analysis settings
    pub analysis: AnalysisConfig,

    /// Diagram assembly settings
    pub diagram: DiagramConfig,

    /// Table layout settings
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used for diagram and file names
    pub name: String,

    /// Root of the Go code base to analyze
    pub source_dir: PathBuf,

    /// Where diagrams are written
    pub output_dir: PathBuf,

    /// Glob patterns skipped during the source walk
    pub ignore_patterns: Vec<String>,
}

/// How far call expressions are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallGraphMode {
    /// Same-package calls and `pkg.Func` calls through imports
    Fast,
    /// Fast plus method calls whose name is unique in the code base
    Deep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Call resolution fidelity
    pub call_graph: CallGraphMode,

    /// Whether `_test.go` files are analyzed
    pub include_tests: bool,

    /// Whether files marked as generated are skipped
    pub skip_generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Dot,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = HexviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(HexviewError::Config(format!("unknown output format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Add every relation type between placed objects (general view)
    pub show_all_relations: bool,

    /// Attribute relations of composed/embedded structs to their owner (general view)
    pub show_struct_embedded_relations: bool,

    /// Add pairwise relations between tactic domain objects
    pub tactic_relations: bool,

    /// Default output format
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Lower clamp for the column count of either side of a table
    pub min_columns: usize,

    /// Upper clamp for the column count of either side of a table
    pub max_columns: usize,

    /// Cell colours
    pub palette: Palette,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub attribute: String,
    pub method: String,
    pub function: String,
    pub blank: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "project".to_string(),
                source_dir: PathBuf::from("."),
                output_dir: PathBuf::from("diagrams"),
                ignore_patterns: vec![
                    "vendor/".to_string(),
                    "testdata/".to_string(),
                    ".git/".to_string(),
                ],
            },
            analysis: AnalysisConfig {
                call_graph: CallGraphMode::Fast,
                include_tests: false,
                skip_generated: true,
            },
            diagram: DiagramConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            show_all_relations: false,
            show_struct_embedded_relations: false,
            tactic_relations: false,
            format: OutputFormat::Dot,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_columns: 2,
            max_columns: 5,
            palette: Palette::default(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: "#f4d58d".to_string(),
            attribute: "#bde0fe".to_string(),
            method: "#cdeac0".to_string(),
            function: "#e2e2e2".to_string(),
            blank: "#ffffff".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| HexviewError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HexviewError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = [
                    "Hexview.toml",
                    "hexview.toml",
                    ".hexview.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.min_columns == 0 || layout.min_columns > layout.max_columns {
            return Err(HexviewError::Config(format!(
                "layout columns must satisfy 0 < min_columns <= max_columns (got {}..{})",
                layout.min_columns, layout.max_columns
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hexview.toml");
        Config::default().save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.analysis.call_graph, CallGraphMode::Fast);
        assert_eq!(loaded.diagram.format, OutputFormat::Dot);
        assert_eq!(loaded.layout.max_columns, 5);
    }

    #[test]
    fn test_bad_column_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hexview.toml");
        let mut config = Config::default();
        config.layout.min_columns = 6;
        config.save(&path).unwrap();

        assert!(matches!(Config::load(&path), Err(HexviewError::Config(_))));
    }

    #[test]
    fn test_output_format_parses_case_insensitively() {
        assert_eq!("DOT".parse::<OutputFormat>().unwrap(), OutputFormat::Dot);
        assert_eq!("json".parse::<OutputFormat>().unwrap().extension(), "json");
        assert!("svg".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_default() {
        let config = Config::load_or_default(Some("/nonexistent/hexview.toml")).unwrap();
        assert_eq!(config.project.name, "project");
    }
}
