//! Receiver mutation detection
//!
//! Decides whether a method writes to its receiver directly: assignments,
//! `op=`, `:=` re-assignment and `++`/`--` whose target is rooted at the
//! receiver. One top-down traversal that stops at the first write.
//! Function literals are entered, so a write from a goroutine or deferred
//! closure counts. Calls are not followed: a helper that mutates the
//! receiver is invisible here. Value receivers are copies, so only pointer
//! receivers can be mutated.

use tree_sitter::Node;

use crate::language::tree_sitter_utils::{children_by_field, has_token, named_children, node_text};
use crate::language::FunctionDecl;
use crate::typecheck::TypeOracle;
use crate::types::{Param, TypeDescriptor};

/// What the receiver's name refers to within one scope
#[derive(Debug, Clone)]
enum Binding {
    Receiver,
    /// A local declaration reusing the name, with its type when known
    Shadow(Option<TypeDescriptor>),
}

/// Whether the body of `decl` writes to `receiver`.
pub fn receiver_mutated(decl: &FunctionDecl<'_>, receiver: &Param, oracle: &dyn TypeOracle) -> bool {
    if !matches!(receiver.ty, TypeDescriptor::Pointer(_)) {
        return false;
    }
    let Some(name) = receiver.declared_name() else {
        return false;
    };
    let Some(body) = decl.body() else {
        return false;
    };

    let mut visitor = MutationVisitor {
        decl,
        oracle,
        name,
        receiver_ty: &receiver.ty,
        scopes: vec![Some(Binding::Receiver)],
    };
    // the receiver lives in the same scope as the top-level statements
    named_children(body).into_iter().any(|stmt| visitor.visit(stmt))
}

struct MutationVisitor<'v, 'a> {
    decl: &'v FunctionDecl<'a>,
    oracle: &'v dyn TypeOracle,
    name: &'v str,
    receiver_ty: &'v TypeDescriptor,
    /// Innermost last; `Some` when the scope declares the receiver's name
    scopes: Vec<Option<Binding>>,
}

impl MutationVisitor<'_, '_> {
    fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.decl.source())
    }

    fn visit(&mut self, node: Node<'_>) -> bool {
        match node.kind() {
            "block"
            | "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "select_statement"
            | "expression_case"
            | "type_case"
            | "default_case"
            | "communication_case" => self.scoped(|v| v.visit_children(node)),
            "type_switch_statement" => self.scoped(|v| v.visit_type_switch(node)),
            "func_literal" => self.scoped(|v| v.visit_func_literal(node)),
            "assignment_statement" => self.visit_assignment(node),
            "short_var_declaration" => self.visit_short_var(node),
            "inc_statement" | "dec_statement" => named_children(node)
                .into_iter()
                .next()
                .is_some_and(|target| self.writes_receiver(target)),
            "var_declaration" | "const_declaration" => self.visit_var_declaration(node),
            "range_clause" | "receive_statement" => self.visit_clause_with_left(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) -> bool {
        named_children(node).into_iter().any(|child| self.visit(child))
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        self.scopes.push(None);
        let found = f(self);
        self.scopes.pop();
        found
    }

    fn declare(&mut self, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            *scope = Some(binding);
        }
    }

    fn lookup(&self) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(Option::as_ref)
    }

    fn binding_is_receiver_typed(&self, binding: &Binding) -> bool {
        match binding {
            Binding::Receiver => true,
            Binding::Shadow(Some(ty)) => self.oracle.identical(ty, self.receiver_ty),
            Binding::Shadow(None) => false,
        }
    }

    /// A write target counts when it is rooted at an identifier with the
    /// receiver's name bound to the receiver's type.
    fn writes_receiver(&self, target: Node<'_>) -> bool {
        let Some(base) = base_identifier(target) else {
            return false;
        };
        self.text(base) == self.name && self.lookup().is_some_and(|b| self.binding_is_receiver_typed(b))
    }

    fn visit_assignment(&mut self, node: Node<'_>) -> bool {
        let targets = node
            .child_by_field_name("left")
            .map(named_children)
            .unwrap_or_default();
        if targets.iter().any(|target| self.writes_receiver(*target)) {
            return true;
        }
        self.visit_children(node)
    }

    fn visit_short_var(&mut self, node: Node<'_>) -> bool {
        let values = node
            .child_by_field_name("right")
            .map(named_children)
            .unwrap_or_default();
        if values.iter().any(|value| self.visit(*value)) {
            return true;
        }

        let targets = node
            .child_by_field_name("left")
            .map(named_children)
            .unwrap_or_default();
        for (i, target) in targets.iter().enumerate() {
            if self.text(*target) != self.name {
                continue;
            }
            let redeclared_here = self.scopes.last().is_some_and(Option::is_some);
            if redeclared_here {
                // `:=` with an existing binding in the same scope assigns to it
                if self.writes_receiver(*target) {
                    return true;
                }
            } else {
                let ty = if targets.len() == values.len() {
                    self.oracle.type_of_expr(self.decl, values[i])
                } else {
                    None
                };
                self.declare(Binding::Shadow(ty));
            }
        }
        false
    }

    fn visit_var_declaration(&mut self, node: Node<'_>) -> bool {
        let mut specs = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "var_spec" | "const_spec" => specs.push(child),
                "var_spec_list" | "const_spec_list" => specs.extend(named_children(child)),
                _ => {}
            }
        }

        for spec in specs {
            let values = spec
                .child_by_field_name("value")
                .map(named_children)
                .unwrap_or_default();
            if values.iter().any(|value| self.visit(*value)) {
                return true;
            }
            let names = children_by_field(spec, "name");
            let Some(i) = names.iter().position(|n| self.text(*n) == self.name) else {
                continue;
            };
            let ty = match spec.child_by_field_name("type") {
                Some(ty) => self.oracle.type_of_syntax(self.decl, ty),
                None if names.len() == values.len() => self.oracle.type_of_expr(self.decl, values[i]),
                None => None,
            };
            self.declare(Binding::Shadow(ty));
        }
        false
    }

    /// `for k, v := range x` and `case v := <-ch` declare, their `=` forms write.
    fn visit_clause_with_left(&mut self, node: Node<'_>) -> bool {
        if let Some(value) = node.child_by_field_name("right") {
            if self.visit(value) {
                return true;
            }
        }
        let targets = node
            .child_by_field_name("left")
            .map(named_children)
            .unwrap_or_default();
        if has_token(node, ":=") {
            if targets.iter().any(|t| self.text(*t) == self.name) {
                self.declare(Binding::Shadow(None));
            }
            false
        } else {
            targets.iter().any(|target| self.writes_receiver(*target))
        }
    }

    fn visit_type_switch(&mut self, node: Node<'_>) -> bool {
        let alias_id = node.child_by_field_name("alias").map(|alias| alias.id());
        for child in named_children(node) {
            if Some(child.id()) == alias_id {
                if named_children(child).iter().any(|n| self.text(*n) == self.name) {
                    self.declare(Binding::Shadow(None));
                }
                continue;
            }
            if self.visit(child) {
                return true;
            }
        }
        false
    }

    fn visit_func_literal(&mut self, node: Node<'_>) -> bool {
        if let Some(params) = node.child_by_field_name("parameters") {
            for decl in named_children(params) {
                let shadows = children_by_field(decl, "name")
                    .iter()
                    .any(|n| self.text(*n) == self.name);
                if shadows {
                    let ty = decl
                        .child_by_field_name("type")
                        .and_then(|ty| self.oracle.type_of_syntax(self.decl, ty));
                    self.declare(Binding::Shadow(ty));
                }
            }
        }
        node.child_by_field_name("body")
            .is_some_and(|body| self.visit(body))
    }
}

/// Unwrap selectors, index and slice expressions, parentheses and `*` to
/// the identifier a write target is rooted at.
fn base_identifier(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "identifier" => Some(node),
        "selector_expression" | "index_expression" | "slice_expression" => {
            base_identifier(node.child_by_field_name("operand")?)
        }
        "parenthesized_expression" => base_identifier(named_children(node).into_iter().next()?),
        "unary_expression" if has_token(node, "*") => base_identifier(node.child_by_field_name("operand")?),
        _ => None,
    }
}
