//! Normalization of generated Go code
//!
//! The buffer must parse cleanly with tree-sitter-go before anything is
//! rewritten. Formatting follows gofmt for the constructs the layout can
//! produce: tab indentation from brace structure and aligned struct field
//! types.

use tree_sitter::Parser;

use crate::error::{GentestError, Result};

pub fn normalize(buffer: &str) -> Result<String> {
    validate(buffer)?;

    let lines: Vec<&str> = buffer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let lines = align_struct_fields(&lines);
    Ok(reindent(&lines))
}

/// Reject buffers that are not valid Go, keeping the buffer for diagnosis.
fn validate(buffer: &str) -> Result<()> {
    let render_error = |message: String| GentestError::Render {
        message,
        buffer: buffer.to_string(),
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| render_error(format!("failed to set Go language for parser: {}", e)))?;
    let tree = parser
        .parse(buffer, None)
        .ok_or_else(|| render_error("tree-sitter returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(render_error(format!(
            "generated code does not parse (first error near line {})",
            first_error_line(root)
        )));
    }
    Ok(())
}

fn first_error_line(node: tree_sitter::Node<'_>) -> usize {
    if node.is_error() || node.is_missing() {
        return node.start_position().row + 1;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find(|child| child.has_error())
        .map(first_error_line)
        .unwrap_or(node.start_position().row + 1)
}

/// Pad field names inside each `struct {` block so the types line up.
fn align_struct_fields(lines: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        out.push(line.to_string());
        i += 1;
        if !line.ends_with("struct {") {
            continue;
        }

        let start = i;
        while i < lines.len() && !lines[i].starts_with('}') {
            i += 1;
        }
        let block = &lines[start..i];
        let width = block
            .iter()
            .filter_map(|l| l.split_once(' '))
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);
        for field in block {
            match field.split_once(' ') {
                Some((name, ty)) => {
                    let pad = width + 1 - name.chars().count();
                    out.push(format!("{}{}{}", name, " ".repeat(pad), ty.trim_start()));
                }
                None => out.push(field.to_string()),
            }
        }
    }
    out
}

/// Rebuild indentation: closers dedent before their line, openers indent
/// after it.
fn reindent(lines: &[String]) -> String {
    let mut out = String::new();
    let mut depth: usize = 0;
    for line in lines {
        if line.starts_with('}') || line.starts_with(')') {
            depth = depth.saturating_sub(1);
        }
        for _ in 0..depth {
            out.push('\t');
        }
        out.push_str(line);
        out.push('\n');
        if line.ends_with('{') || line.ends_with('(') {
            depth += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_aligns_struct_fields() {
        let buffer = "func TestF(t *testing.T) {\ntype expected struct {\ngotint int\ngoterror error\n}\n}\n";
        let expected = "func TestF(t *testing.T) {\n\
                        \ttype expected struct {\n\
                        \t\tgotint   int\n\
                        \t\tgoterror error\n\
                        \t}\n\
                        }\n";
        assert_eq!(normalize(buffer).unwrap(), expected);
    }

    #[test]
    fn test_else_branch_keeps_depth() {
        let buffer = "func TestF(t *testing.T) {\nif test.wantError {\nassert.Error(t, err)\n} else {\nassert.NoError(t, err)\n}\n}\n";
        let expected = "func TestF(t *testing.T) {\n\
                        \tif test.wantError {\n\
                        \t\tassert.Error(t, err)\n\
                        \t} else {\n\
                        \t\tassert.NoError(t, err)\n\
                        \t}\n\
                        }\n";
        assert_eq!(normalize(buffer).unwrap(), expected);
    }

    #[test]
    fn test_blank_lines_and_stray_indentation_are_dropped() {
        let buffer = "\n\n   func TestF(t *testing.T) {\n\n        f()\n\n}\n\n";
        assert_eq!(normalize(buffer).unwrap(), "func TestF(t *testing.T) {\n\tf()\n}\n");
    }

    #[test]
    fn test_syntax_error_keeps_buffer() {
        let buffer = "func TestF(t *testing.T) {\ntests := []struct {\n";
        match normalize(buffer) {
            Err(GentestError::Render { buffer: kept, .. }) => assert_eq!(kept, buffer),
            other => panic!("expected render error, got {:?}", other),
        }
    }

    #[test]
    fn test_multibyte_names_align_by_chars() {
        let lines = vec!["type input struct {", "größe int", "n string", "}"];
        let aligned = align_struct_fields(&lines);
        assert_eq!(aligned[1], "größe int");
        assert_eq!(aligned[2], "n     string");
    }
}
