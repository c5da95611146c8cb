// src/core/identity.rs
use std::fmt;
use serde::{Deserialize, Serialize};

/// Stable identity of a declaration: the directory it lives in plus its name.
///
/// Directories use `/` separators and are relative to the analyzed source
/// root, so the root directory is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    dir: String,
    name: String,
}

impl Identifier {
    pub fn new(dir: impl Into<String>, name: impl Into<String>) -> Self {
        let dir = dir.into();
        Self {
            dir: dir.trim_matches('/').to_string(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The globally unique key of this identifier
    pub fn id(&self) -> String {
        if self.dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.dir, self.name)
        }
    }

    /// The same name re-rooted below `prefix` (the prefix is stripped from the directory)
    pub fn relative_to(&self, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        let dir = if prefix.is_empty() {
            self.dir.as_str()
        } else if self.dir == prefix {
            ""
        } else {
            self.dir
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(&self.dir)
        };
        Self::new(dir, self.name.clone())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Where a declaration or reference appears in the source tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(filename: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Self {
            filename: filename.into(),
            offset,
            line,
            column,
        }
    }

    /// Positions for synthetic objects that have no source location
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn is_synthetic(&self) -> bool {
        self.filename.is_empty()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            f.write_str("-")
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}
