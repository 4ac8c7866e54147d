//! Source positions attached to compiled instructions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A line/column location in the original source text
///
/// Lines and columns are 1-based. Line 0 is reserved for "unknown", which is
/// also the `Default`, so a zeroed position can never be mistaken for a real
/// location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl SourcePosition {
    /// Sentinel for "no reliable mapping"
    pub const UNKNOWN: SourcePosition = SourcePosition { line: 0, column: 0 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
