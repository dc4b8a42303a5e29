//! Byte spans of declarations

use tree_sitter::Node;

/// Region of a source file, as byte offsets plus the 1-indexed line it starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: usize,
    /// Exclusive in the file, inclusive for [`SourceSpan::contains_offset`]
    pub end: usize,
    pub line: u32,
}

impl SourceSpan {
    pub fn from_node(node: Node<'_>) -> Self {
        SourceSpan {
            start: node.start_byte(),
            end: node.end_byte(),
            line: node.start_position().row as u32 + 1,
        }
    }

    /// Check if a byte offset lies in the span, counting both ends
    ///
    /// An offset pointing just past the last byte still selects the span so
    /// that a cursor placed right after an identifier resolves to it.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}
