// src/core/render/mod.rs
//! Output formats for assembled diagrams

pub mod dot;
pub mod json;

pub use json::DiagramDocument;

use crate::config::{LayoutConfig, OutputFormat};
use crate::error::Result;
use super::diagram::Diagram;

/// Render `diagram` in the requested format
pub fn render(diagram: &Diagram, format: OutputFormat, layout: &LayoutConfig) -> Result<String> {
    match format {
        OutputFormat::Dot => dot::render(diagram, layout),
        OutputFormat::Json => json::render(diagram, layout),
    }
}
