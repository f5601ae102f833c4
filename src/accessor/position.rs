//! Conversion between compiler coordinates (1-based line and column) and
//! LSP coordinates (0-based line and character)

use serde::Deserialize;
use tower_lsp::lsp_types::{Position, Range};

/// A position as emitted by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CompilerPosition {
    pub line: u32,
    /// Some compiler builds spell this `character`, as LSP does
    #[serde(alias = "character")]
    pub column: u32,
}

/// A range as emitted by the compiler, both ends 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CompilerRange {
    pub start: CompilerPosition,
    pub end: CompilerPosition,
}

pub fn to_lsp_position(position: CompilerPosition) -> Position {
    // Saturate so a stray 0 from the compiler cannot underflow.
    Position::new(
        position.line.saturating_sub(1),
        position.column.saturating_sub(1),
    )
}

/// Translates both ends of a compiler range. Every result shape goes through
/// here.
pub fn to_lsp_range(range: CompilerRange) -> Range {
    Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

/// Returns the 1-based `(line, column)` pair the compiler expects for an LSP
/// cursor position.
pub fn to_compiler_position(position: Position) -> (u32, u32) {
    (
        position.line.saturating_add(1),
        position.character.saturating_add(1),
    )
}
