//! Doc comment extraction
//!
//! A declaration's doc comment is the group of comments directly above it:
//! consecutive comments with no blank line in between, the last one ending
//! on the line before the declaration. The text is normalized the same way
//! Go's `ast.CommentGroup.Text` does it, so markers written for Go tooling
//! match unchanged.

use tree_sitter::Node;

use crate::language::tree_sitter_utils::node_text;

/// Comment nodes that document `decl`, in source order.
pub fn doc_comment_nodes(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut comments = Vec::new();
    let mut next_row = decl.start_position().row;
    let mut current = decl.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 < next_row {
            break;
        }
        comments.push(sibling);
        next_row = sibling.start_position().row;
        current = sibling.prev_sibling();
    }

    // a comment on the same line as preceding code trails that code
    if let Some(earliest) = comments.last() {
        if let Some(before) = earliest.prev_sibling() {
            if before.end_position().row == earliest.start_position().row {
                comments.pop();
            }
        }
    }

    comments.reverse();
    comments
}

/// Normalized doc text of `decl`, or `None` when it has no doc comment.
pub fn doc_text(decl: Node<'_>, source: &str) -> Option<String> {
    let nodes = doc_comment_nodes(decl);
    if nodes.is_empty() {
        return None;
    }
    let raw: Vec<&str> = nodes.iter().map(|n| node_text(*n, source)).collect();
    Some(comment_group_text(&raw))
}

/// Text of a comment group with markers, directives and blank runs removed.
pub fn comment_group_text(comments: &[&str]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for comment in comments {
        if let Some(rest) = comment.strip_prefix("//") {
            if is_directive(rest) {
                continue;
            }
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            lines.push(rest.to_string());
        } else if let Some(rest) = comment.strip_prefix("/*") {
            let rest = rest.strip_suffix("*/").unwrap_or(rest);
            lines.extend(rest.split('\n').map(str::to_string));
        }
    }

    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.trim_end_matches([' ', '\t', '\r', '\n']))
        .collect();

    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() && out.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// `//go:generate`, `//line`, `//export` and friends are not documentation.
fn is_directive(after_slashes: &str) -> bool {
    if after_slashes.starts_with("line ")
        || after_slashes.starts_with("extern ")
        || after_slashes.starts_with("export ")
    {
        return true;
    }
    let bytes = after_slashes.as_bytes();
    let Some(colon) = after_slashes.find(':') else {
        return false;
    };
    if colon == 0 || colon + 1 >= bytes.len() {
        return false;
    }
    (0..=colon + 1)
        .filter(|&i| i != colon)
        .all(|i| bytes[i].is_ascii_lowercase() || bytes[i].is_ascii_digit())
}
