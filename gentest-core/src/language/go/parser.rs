//! Go language parser using tree-sitter

use tree_sitter::{Node, Parser, Tree};

use crate::error::{GentestError, Result};
use crate::language::go::doc;
use crate::language::tree_sitter_utils::{children_by_field, find_child_by_kind, named_children, node_text};
use crate::language::SourceSpan;

/// Go parser using tree-sitter
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GentestError::Parse {
                file: "<grammar>".to_string(),
                message: format!("failed to set Go language for parser: {}", e),
            })?;
        Ok(GoParser { parser })
    }

    /// Parse one file. tree-sitter is error tolerant, so a tree comes back
    /// even for broken input; only the signature resolver rejects errors.
    pub fn parse(&mut self, source: &str, filename: &str) -> Result<GoSource> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| GentestError::Parse {
                file: filename.to_string(),
                message: "tree-sitter returned no tree".to_string(),
            })?;
        Ok(GoSource {
            path: filename.to_string(),
            source: source.to_string(),
            tree,
        })
    }
}

/// A parsed Go file
pub struct GoSource {
    path: String,
    source: String,
    tree: Tree,
}

impl GoSource {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Name from the `package` clause
    pub fn package_name(&self) -> Option<&str> {
        let clause = find_child_by_kind(self.root(), "package_clause")?;
        let ident = find_child_by_kind(clause, "package_identifier")?;
        Some(node_text(ident, &self.source))
    }

    /// Top-level function and method declarations, in source order
    pub fn functions(&self, file_index: usize) -> Vec<FunctionDecl<'_>> {
        named_children(self.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
            .filter_map(|n| FunctionDecl::from_node(n, &self.source, file_index))
            .collect()
    }
}

/// Handle to one top-level function or method declaration
///
/// Borrowed from the parse forest; the engine only reads through it.
#[derive(Debug, Clone)]
pub struct FunctionDecl<'a> {
    pub file_index: usize,
    pub name: String,
    pub name_span: SourceSpan,
    pub body_span: Option<SourceSpan>,
    pub span: SourceSpan,
    pub doc: Option<String>,
    /// Type parameter names visible in the signature, including the ones a
    /// generic receiver introduces (`func (l *List[T]) ...`).
    pub type_params: Vec<String>,
    node: Node<'a>,
    source: &'a str,
}

impl<'a> FunctionDecl<'a> {
    fn from_node(node: Node<'a>, source: &'a str, file_index: usize) -> Option<Self> {
        let name_node = node.child_by_field_name("name")?;
        let body_span = node.child_by_field_name("body").map(SourceSpan::from_node);

        let mut type_params = Vec::new();
        if let Some(list) = node.child_by_field_name("type_parameters") {
            collect_type_param_names(list, source, &mut type_params);
        }
        if let Some(receiver) = node.child_by_field_name("receiver") {
            collect_receiver_type_args(receiver, source, &mut type_params);
        }

        Some(FunctionDecl {
            file_index,
            name: node_text(name_node, source).to_string(),
            name_span: SourceSpan::from_node(name_node),
            body_span,
            span: SourceSpan::from_node(node),
            doc: doc::doc_text(node, source),
            type_params,
            node,
            source,
        })
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.source)
    }

    pub fn is_method(&self) -> bool {
        self.node.kind() == "method_declaration"
    }

    pub fn receiver(&self) -> Option<Node<'a>> {
        self.node.child_by_field_name("receiver")
    }

    pub fn parameters(&self) -> Option<Node<'a>> {
        self.node.child_by_field_name("parameters")
    }

    pub fn result(&self) -> Option<Node<'a>> {
        self.node.child_by_field_name("result")
    }

    pub fn body(&self) -> Option<Node<'a>> {
        self.node.child_by_field_name("body")
    }
}

fn collect_type_param_names(list: Node<'_>, source: &str, out: &mut Vec<String>) {
    for decl in named_children(list) {
        if decl.kind() == "type_parameter_declaration" {
            for name in children_by_field(decl, "name") {
                out.push(node_text(name, source).to_string());
            }
        }
    }
}

/// `func (l *List[K, V]) ...` binds `K` and `V` for the rest of the signature.
fn collect_receiver_type_args(receiver: Node<'_>, source: &str, out: &mut Vec<String>) {
    let Some(param) = named_children(receiver)
        .into_iter()
        .find(|n| n.kind() == "parameter_declaration")
    else {
        return;
    };
    let mut ty = param.child_by_field_name("type");
    while let Some(node) = ty {
        match node.kind() {
            "pointer_type" | "parenthesized_type" => ty = named_children(node).into_iter().next(),
            "generic_type" => {
                if let Some(args) = node.child_by_field_name("type_arguments") {
                    collect_type_arg_idents(args, source, out);
                }
                return;
            }
            _ => return,
        }
    }
}

fn collect_type_arg_idents(args: Node<'_>, source: &str, out: &mut Vec<String>) {
    for arg in named_children(args) {
        // older grammars wrap each argument in a type_elem
        let arg = if arg.kind() == "type_elem" {
            match named_children(arg).into_iter().next() {
                Some(inner) => inner,
                None => continue,
            }
        } else {
            arg
        };
        if arg.kind() == "type_identifier" {
            out.push(node_text(arg, source).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> GoSource {
        GoParser::new().unwrap().parse(source, "test.go").unwrap()
    }

    #[test]
    fn test_go_parser_discovers_functions_in_source_order() {
        let file = parse(
            r#"
package main

func zzz() {}

type T struct{}

func (t *T) aaa() {}

func mmm() {}
"#,
        );
        let names: Vec<String> = file.functions(0).into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["zzz", "aaa", "mmm"]);
    }

    #[test]
    fn test_package_name() {
        let file = parse("package widgets\n\nfunc f() {}\n");
        assert_eq!(file.package_name(), Some("widgets"));
    }

    #[test]
    fn test_name_and_body_spans() {
        let source = "package a\n\nfunc returnInt() int {\n\treturn 1\n}\n";
        let file = parse(source);
        let functions = file.functions(0);
        let f = &functions[0];

        let name_start = source.find("returnInt").unwrap();
        assert_eq!(f.name_span.start, name_start);
        assert_eq!(f.name_span.end, name_start + "returnInt".len());
        assert_eq!(f.name_span.line, 3);

        let body = f.body_span.unwrap();
        assert_eq!(body.start, source.find('{').unwrap());
        assert_eq!(body.end, source.rfind('}').unwrap() + 1);
    }

    #[test]
    fn test_method_accessors() {
        let file = parse("package e\n\ntype T struct{}\n\n// offset_m\nfunc (t *T) m(x int) error { return nil }\n");
        let functions = file.functions(0);
        let m = &functions[0];
        assert!(m.is_method());
        assert_eq!(m.name, "m");
        assert!(m.receiver().is_some());
        assert!(m.parameters().is_some());
        assert_eq!(m.text(m.result().unwrap()), "error");
        assert_eq!(m.doc.as_deref(), Some("offset_m\n"));
    }

    #[test]
    fn test_type_params_from_declaration_and_receiver() {
        let file = parse(
            r#"
package g

func Map[K comparable, V any](m map[K]V) []V { return nil }

type List[T any] struct{}

func (l *List[T]) Push(v T) {}
"#,
        );
        let functions = file.functions(0);
        assert_eq!(functions[0].type_params, vec!["K", "V"]);
        assert_eq!(functions[1].type_params, vec!["T"]);
    }

    #[test]
    fn test_parse_error_still_produces_tree() {
        let file = parse("func foo() { invalid syntax }}}}");
        assert!(file.root().has_error());
    }
}
