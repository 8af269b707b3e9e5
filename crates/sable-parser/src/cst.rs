//! Rowan-based concrete syntax tree types for Sable.
//!
//! Defines the `SableLanguage` marker type that connects [`SyntaxKind`] to
//! rowan's generic tree infrastructure, plus type aliases and a debug
//! printer. The CST is lossless: every token the lexer produced, trivia
//! included, appears in the tree, so the surface form can be reconstructed
//! byte-for-byte.

use std::fmt::Write as _;

use crate::syntax_kind::SyntaxKind;

/// Marker type for Sable's language in rowan's generic tree system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SableLanguage {}

impl rowan::Language for SableLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Safety: SyntaxKind is #[repr(u16)] and rowan only stores kinds we
        // previously gave it via kind_to_raw.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}

/// A CST node (interior node with children).
pub type SyntaxNode = rowan::SyntaxNode<SableLanguage>;

/// A CST token (leaf node with text).
pub type SyntaxToken = rowan::SyntaxToken<SableLanguage>;

/// Either a node or a token in the CST.
pub type SyntaxElement = rowan::SyntaxElement<SableLanguage>;

/// Render a syntax tree as an indented debug listing.
///
/// Trivia tokens are shown without their text to keep output readable.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &SyntaxNode, depth: usize) {
    let _ = writeln!(out, "{}{:?}", "  ".repeat(depth), node.kind());
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => write_node(out, &n, depth + 1),
            rowan::NodeOrToken::Token(t) => {
                let indent = "  ".repeat(depth + 1);
                if matches!(
                    t.kind(),
                    SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::COMMENT
                ) {
                    let _ = writeln!(out, "{indent}{:?}", t.kind());
                } else {
                    let _ = writeln!(out, "{indent}{:?} {:?}", t.kind(), t.text());
                }
            }
        }
    }
}
