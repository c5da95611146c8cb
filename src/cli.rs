use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "hexview")]
#[command(about = "Architecture diagrams for Go code bases")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Print the architecture pattern of a code base
    Detect {
        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Build a diagram of a code base
    Diagram {
        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory for the diagram
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Which view to build (general, strategic, tactic)
        #[arg(long, default_value = "general")]
        view: String,

        /// Draw every relation type, not only associations (general view)
        #[arg(long)]
        all_relations: bool,

        /// Attribute relations of composed and embedded structs to their owner (general view)
        #[arg(long)]
        embedded_relations: bool,

        /// Output format (dot, json)
        #[arg(long)]
        format: Option<String>,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => {
                engine.init(path).await?;
                Ok(())
            }
            Commands::Detect { source } => {
                engine.detect(source).await?;
                Ok(())
            }
            Commands::Diagram {
                source,
                output,
                view,
                all_relations,
                embedded_relations,
                format,
            } => {
                let path = engine
                    .diagram(source, output, &view, all_relations, embedded_relations, format)
                    .await?;
                println!("{}", path.display());
                Ok(())
            }
        }
    }
}
