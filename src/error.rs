use thiserror::Error;

/// Main error type for hexview operations
#[derive(Error, Debug)]
pub enum HexviewError {
    #[error("Duplicate identifier: {0}")]
    Duplicate(String),

    #[error("Identifier not found: {0}")]
    NotFound(String),

    #[error("Invalid hexagon directory: {0}")]
    InvalidDirectory(String),

    #[error("Unsupported component type: {0}")]
    UnsupportedComponent(String),

    #[error("Code base at '{0}' does not follow the hexagon layout (cmd/, pkg/, internal/domain/)")]
    NotHexagon(String),

    #[error("aggregate {0} has no entity")]
    AggregateWithoutEntity(String),

    #[error("Directory walk failed in {} place(s): {}", failures.len(), summarize(failures))]
    Walk { failures: Vec<WalkFailure> },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("File system error: {0}")]
    FileSystem(String),
}

/// One callback failure recorded during a best-effort directory walk
#[derive(Debug)]
pub struct WalkFailure {
    pub path: String,
    pub error: HexviewError,
}

fn summarize(failures: &[WalkFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, HexviewError>;
