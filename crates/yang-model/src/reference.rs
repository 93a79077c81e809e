//! Source locations attached to statements.

use std::fmt;
use std::sync::Arc;

/// Where a statement was declared: source name, line and column.
///
/// Every error raised against a statement carries one of these. The
/// source name is shared between all statements of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementSourceReference {
    source: Arc<str>,
    line: u32,
    column: u32,
}

impl StatementSourceReference {
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for StatementSourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}
