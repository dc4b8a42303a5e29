//! Package-level type model
//!
//! A best-effort, single-package resolver. It turns type syntax into
//! `TypeDescriptor`s, resolves declaration signatures and answers the two
//! questions the engine asks about types: "is this assignable to `error`"
//! and "are these two types identical". Other packages are never loaded;
//! a qualified type is taken at face value.

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::Node;

use crate::error::{GentestError, Result};
use crate::language::tree_sitter_utils::{children, children_by_field, has_token, named_children, node_text};
use crate::language::{FunctionDecl, GoPackage};
use crate::types::{
    ChanDir, FuncType, InterfaceElem, NamedType, Param, Signature, StructField, TypeDescriptor,
    BASIC_TYPES,
};

/// Alias chains longer than this are treated as cycles
const MAX_RESOLVE_DEPTH: usize = 32;

/// Upstream type queries the engine depends on
pub trait TypeOracle {
    /// Resolved signature of `decl`, or `SignatureResolution`
    fn signature(&self, decl: &FunctionDecl<'_>) -> Result<Signature>;

    /// Type written as syntax inside `decl`, e.g. a parameter type
    fn type_of_syntax(&self, decl: &FunctionDecl<'_>, ty: Node<'_>) -> Option<TypeDescriptor>;

    /// Type of an expression inside `decl`, when it can be inferred locally
    fn type_of_expr(&self, decl: &FunctionDecl<'_>, expr: Node<'_>) -> Option<TypeDescriptor>;

    /// Whether a value of `ty` is assignable to the universe `error`
    fn is_error_like(&self, ty: &TypeDescriptor) -> bool;

    fn identical(&self, a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
        a == b
    }
}

type Resolve<T> = std::result::Result<T, String>;

struct TypeSpec<'p> {
    file_index: usize,
    ty: Node<'p>,
    alias: bool,
}

struct MethodInfo<'p> {
    file_index: usize,
    node: Node<'p>,
    pointer_receiver: bool,
}

struct FuncInfo<'p> {
    file_index: usize,
    node: Node<'p>,
}

/// `TypeOracle` over the declarations of one `GoPackage`
pub struct PackageTypes<'p> {
    package: &'p GoPackage,
    package_name: Option<String>,
    type_specs: HashMap<String, TypeSpec<'p>>,
    methods: HashMap<String, Vec<MethodInfo<'p>>>,
    functions: HashMap<String, FuncInfo<'p>>,
    /// Per file: local import name → package name
    imports: Vec<HashMap<String, String>>,
}

impl<'p> PackageTypes<'p> {
    pub fn new(package: &'p GoPackage) -> Self {
        let mut types = PackageTypes {
            package,
            package_name: package.name().map(str::to_string),
            type_specs: HashMap::new(),
            methods: HashMap::new(),
            functions: HashMap::new(),
            imports: Vec::new(),
        };

        for (file_index, file) in package.files().iter().enumerate() {
            let source = file.source();
            let mut imports = HashMap::new();
            for decl in named_children(file.root()) {
                match decl.kind() {
                    "import_declaration" => collect_imports(decl, source, &mut imports),
                    "type_declaration" => types.collect_type_specs(decl, source, file_index),
                    "method_declaration" => types.collect_method(decl, source, file_index),
                    "function_declaration" => {
                        if let Some(name) = decl.child_by_field_name("name") {
                            types
                                .functions
                                .entry(node_text(name, source).to_string())
                                .or_insert(FuncInfo { file_index, node: decl });
                        }
                    }
                    _ => {}
                }
            }
            types.imports.push(imports);
        }

        debug!(
            types = types.type_specs.len(),
            functions = types.functions.len(),
            "indexed package declarations"
        );
        types
    }

    fn collect_type_specs(&mut self, decl: Node<'p>, source: &str, file_index: usize) {
        let mut specs = Vec::new();
        for child in named_children(decl) {
            match child.kind() {
                "type_spec" | "type_alias" => specs.push(child),
                // older grammars group parenthesized specs
                "type_spec_list" => specs.extend(named_children(child)),
                _ => {}
            }
        }
        for spec in specs {
            let (Some(name), Some(ty)) = (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
            else {
                continue;
            };
            self.type_specs
                .entry(node_text(name, source).to_string())
                .or_insert(TypeSpec {
                    file_index,
                    ty,
                    alias: spec.kind() == "type_alias",
                });
        }
    }

    fn collect_method(&mut self, decl: Node<'p>, source: &str, file_index: usize) {
        let Some(receiver) = decl.child_by_field_name("receiver") else {
            return;
        };
        let Some(param) = params_of(receiver).into_iter().next() else {
            return;
        };
        let Some(mut ty) = param.child_by_field_name("type") else {
            return;
        };
        let mut pointer_receiver = false;
        loop {
            let next = match ty.kind() {
                "pointer_type" => {
                    pointer_receiver = true;
                    first_named(ty)
                }
                "parenthesized_type" => first_named(ty),
                "generic_type" => ty.child_by_field_name("type"),
                _ => break,
            };
            match next {
                Some(inner) => ty = inner,
                None => return,
            }
        }
        if ty.kind() != "type_identifier" {
            return;
        }
        self.methods
            .entry(node_text(ty, source).to_string())
            .or_default()
            .push(MethodInfo {
                file_index,
                node: decl,
                pointer_receiver,
            });
    }

    fn own_named(&self, name: &str) -> TypeDescriptor {
        TypeDescriptor::named(self.package_name.as_deref(), name)
    }

    /// Resolve type syntax found in `file_index` with `type_params` in scope.
    fn resolve_type(
        &self,
        node: Node<'_>,
        source: &str,
        file_index: usize,
        type_params: &[String],
        depth: usize,
    ) -> Resolve<TypeDescriptor> {
        if node.has_error() || node.is_missing() {
            return Err(format!("syntax error in type `{}`", node_text(node, source)));
        }
        let resolve = |n: Node<'_>| self.resolve_type(n, source, file_index, type_params, depth);
        let required = |field: &str| {
            node.child_by_field_name(field)
                .ok_or_else(|| format!("`{}` is missing its {}", node_text(node, source), field))
        };

        match node.kind() {
            "type_identifier" | "identifier" => {
                self.resolve_ident(node_text(node, source), type_params, depth)
            }
            "qualified_type" => {
                let package = node_text(required("package")?, source);
                let name = node_text(required("name")?, source);
                let package = self
                    .imports
                    .get(file_index)
                    .and_then(|imports| imports.get(package))
                    .map(String::as_str)
                    .unwrap_or(package);
                Ok(TypeDescriptor::named(Some(package), name))
            }
            "generic_type" => {
                let base = resolve(required("type")?)?;
                let TypeDescriptor::Named(mut named) = base else {
                    return Err(format!("`{}` is not a generic type", node_text(node, source)));
                };
                for arg in named_children(required("type_arguments")?) {
                    let arg = if arg.kind() == "type_elem" {
                        match single_named(arg) {
                            Some(inner) => inner,
                            None => return Err("union type argument".to_string()),
                        }
                    } else {
                        arg
                    };
                    if arg.kind() != "comment" {
                        named.type_args.push(resolve(arg)?);
                    }
                }
                Ok(TypeDescriptor::Named(named))
            }
            "parenthesized_type" => resolve(first_named(node).ok_or("empty parentheses")?),
            "pointer_type" => Ok(TypeDescriptor::pointer(resolve(
                first_named(node).ok_or("pointer without element type")?,
            )?)),
            "slice_type" => Ok(TypeDescriptor::slice(resolve(
                node.child_by_field_name("element")
                    .or_else(|| first_named(node))
                    .ok_or("slice without element type")?,
            )?)),
            "array_type" => Ok(TypeDescriptor::Array {
                len: node_text(required("length")?, source).trim().to_string(),
                elem: Box::new(resolve(required("element")?)?),
            }),
            "map_type" => Ok(TypeDescriptor::Map {
                key: Box::new(resolve(required("key")?)?),
                value: Box::new(resolve(required("value")?)?),
            }),
            "channel_type" => {
                let tokens = children(node);
                let dir = if tokens.first().is_some_and(|t| t.kind() == "<-") {
                    ChanDir::Recv
                } else if has_token(node, "<-") {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() != "comment")
                    .last()
                    .ok_or("channel without element type")?;
                Ok(TypeDescriptor::Chan {
                    dir,
                    elem: Box::new(resolve(elem)?),
                })
            }
            "function_type" => Ok(TypeDescriptor::Func(self.resolve_func_type(
                node,
                source,
                file_index,
                type_params,
                depth,
            )?)),
            "struct_type" => {
                let mut fields = Vec::new();
                let list = named_children(node)
                    .into_iter()
                    .find(|n| n.kind() == "field_declaration_list");
                for field in list.map(named_children).unwrap_or_default() {
                    if field.kind() != "field_declaration" {
                        continue;
                    }
                    let ty = field
                        .child_by_field_name("type")
                        .ok_or("struct field without type")?;
                    let ty = resolve(ty)?;
                    let tag = field
                        .child_by_field_name("tag")
                        .map(|tag| string_literal_value(node_text(tag, source)));
                    let names = children_by_field(field, "name");
                    if names.is_empty() {
                        let ty = if has_token(field, "*") {
                            TypeDescriptor::pointer(ty)
                        } else {
                            ty
                        };
                        fields.push(StructField { name: None, ty, tag });
                    } else {
                        for name in names {
                            fields.push(StructField {
                                name: Some(node_text(name, source).to_string()),
                                ty: ty.clone(),
                                tag: tag.clone(),
                            });
                        }
                    }
                }
                Ok(TypeDescriptor::Struct(fields))
            }
            "interface_type" => {
                let mut elems = Vec::new();
                for elem in named_children(node) {
                    match elem.kind() {
                        "method_elem" | "method_spec" => {
                            let name = node_text(
                                elem.child_by_field_name("name").ok_or("method without name")?,
                                source,
                            );
                            let sig = self.resolve_func_type(elem, source, file_index, type_params, depth)?;
                            elems.push(InterfaceElem::Method {
                                name: name.to_string(),
                                sig,
                            });
                        }
                        "type_elem" | "constraint_elem" => match single_named(elem) {
                            Some(inner) => elems.push(InterfaceElem::Embedded(resolve(inner)?)),
                            None => return Err("type set interfaces are not supported".to_string()),
                        },
                        "comment" => {}
                        _ => elems.push(InterfaceElem::Embedded(resolve(elem)?)),
                    }
                }
                Ok(TypeDescriptor::Interface(elems))
            }
            other => Err(format!(
                "unsupported type syntax `{}` ({})",
                node_text(node, source),
                other
            )),
        }
    }

    fn resolve_ident(&self, name: &str, type_params: &[String], depth: usize) -> Resolve<TypeDescriptor> {
        if type_params.iter().any(|p| p == name) {
            return Ok(TypeDescriptor::named(None, name));
        }
        if let Some(spec) = self.type_specs.get(name) {
            if !spec.alias {
                return Ok(self.own_named(name));
            }
            if depth >= MAX_RESOLVE_DEPTH {
                return Err(format!("alias cycle through `{}`", name));
            }
            let source = self.source_of(spec.file_index)?;
            return self.resolve_type(spec.ty, source, spec.file_index, &[], depth + 1);
        }
        if BASIC_TYPES.contains(&name) {
            return Ok(TypeDescriptor::basic(name));
        }
        match name {
            "error" => Ok(TypeDescriptor::error()),
            "any" => Ok(TypeDescriptor::Interface(Vec::new())),
            "comparable" => Ok(TypeDescriptor::named(None, name)),
            _ => {
                // declared in a file that was not loaded (excluded or build-tagged)
                debug!(name, "type not declared in loaded files, assuming package-local");
                Ok(self.own_named(name))
            }
        }
    }

    /// Parameter and result types of a `function_type` or `method_elem`
    fn resolve_func_type(
        &self,
        node: Node<'_>,
        source: &str,
        file_index: usize,
        type_params: &[String],
        depth: usize,
    ) -> Resolve<FuncType> {
        let params = match node.child_by_field_name("parameters") {
            Some(list) => self.resolve_params(list, source, file_index, type_params, depth)?,
            None => Vec::new(),
        };
        let results = self.resolve_result(node, source, file_index, type_params, depth)?;
        Ok(FuncType {
            variadic: params.last().is_some_and(|p| p.variadic),
            params: params.into_iter().map(|p| p.ty).collect(),
            results: results.into_iter().map(|p| p.ty).collect(),
        })
    }

    fn resolve_params(
        &self,
        list: Node<'_>,
        source: &str,
        file_index: usize,
        type_params: &[String],
        depth: usize,
    ) -> Resolve<Vec<Param>> {
        if list.has_error() {
            return Err(format!("syntax error in `{}`", node_text(list, source)));
        }
        let mut params = Vec::new();
        for decl in params_of(list) {
            let ty_node = decl
                .child_by_field_name("type")
                .ok_or_else(|| format!("parameter `{}` has no type", node_text(decl, source)))?;
            let ty = self.resolve_type(ty_node, source, file_index, type_params, depth)?;
            let variadic = decl.kind() == "variadic_parameter_declaration";
            let ty = if variadic { TypeDescriptor::slice(ty) } else { ty };

            let names = children_by_field(decl, "name");
            if names.is_empty() {
                params.push(Param { name: None, ty, variadic });
            } else {
                for name in names {
                    params.push(Param {
                        name: Some(node_text(name, source).to_string()),
                        ty: ty.clone(),
                        variadic,
                    });
                }
            }
        }
        Ok(params)
    }

    fn resolve_result(
        &self,
        node: Node<'_>,
        source: &str,
        file_index: usize,
        type_params: &[String],
        depth: usize,
    ) -> Resolve<Vec<Param>> {
        match node.child_by_field_name("result") {
            None => Ok(Vec::new()),
            Some(list) if list.kind() == "parameter_list" => {
                self.resolve_params(list, source, file_index, type_params, depth)
            }
            Some(ty) => Ok(vec![Param {
                name: None,
                ty: self.resolve_type(ty, source, file_index, type_params, depth)?,
                variadic: false,
            }]),
        }
    }

    fn source_of(&self, file_index: usize) -> Resolve<&'p str> {
        self.package
            .file(file_index)
            .map(|file| file.source())
            .ok_or_else(|| format!("no file with index {}", file_index))
    }
}

impl PackageTypes<'_> {
    fn is_own(&self, named: &NamedType) -> bool {
        named.package.is_some()
            && named.package == self.package_name
            && self.type_specs.contains_key(&named.name)
    }

    fn error_like(&self, ty: &TypeDescriptor, depth: usize) -> bool {
        if depth >= MAX_RESOLVE_DEPTH {
            return false;
        }
        match ty {
            TypeDescriptor::Named(named) if named.package.is_none() => ty.is_universe_error(),
            TypeDescriptor::Named(named) if self.is_own(named) => {
                self.named_has_error(&named.name, false, depth)
            }
            TypeDescriptor::Pointer(inner) => match inner.as_ref() {
                TypeDescriptor::Named(named) if self.is_own(named) => {
                    self.named_has_error(&named.name, true, depth)
                }
                _ => false,
            },
            TypeDescriptor::Interface(elems) => self.interface_has_error(elems, depth),
            TypeDescriptor::Struct(fields) => fields
                .iter()
                .filter(|field| field.name.is_none())
                .any(|field| self.promotes_error(&field.ty, false, depth + 1)),
            // other packages are not loaded
            _ => false,
        }
    }

    /// Method set check for a package-local named type. Through a pointer
    /// both value and pointer receivers count.
    fn named_has_error(&self, name: &str, through_pointer: bool, depth: usize) -> bool {
        if depth >= MAX_RESOLVE_DEPTH {
            return false;
        }
        let Some(underlying) = self.underlying(name, depth) else {
            return false;
        };
        if let Some(elems) = self.interface_elems(&underlying, depth + 1) {
            // a pointer to an interface has an empty method set
            return !through_pointer && self.interface_has_error(&elems, depth + 1);
        }
        let declared = self.methods.get(name).is_some_and(|methods| {
            methods
                .iter()
                .any(|m| (through_pointer || !m.pointer_receiver) && self.is_error_method(m))
        });
        if declared {
            return true;
        }
        // a defined type over another named type keeps none of its methods,
        // only struct embedding promotes them
        match &underlying {
            TypeDescriptor::Struct(fields) => fields
                .iter()
                .filter(|field| field.name.is_none())
                .any(|field| self.promotes_error(&field.ty, through_pointer, depth + 1)),
            _ => false,
        }
    }

    /// Whether an embedded field brings `Error() string` into the method
    /// set of the embedding struct, or of a pointer to it.
    fn promotes_error(
        &self,
        embedded: &TypeDescriptor,
        through_pointer: bool,
        depth: usize,
    ) -> bool {
        match embedded {
            TypeDescriptor::Pointer(inner) => match inner.as_ref() {
                TypeDescriptor::Named(named) if self.is_own(named) => {
                    self.named_has_error(&named.name, true, depth)
                }
                _ => false,
            },
            TypeDescriptor::Named(named) if named.package.is_none() => embedded.is_universe_error(),
            TypeDescriptor::Named(named) if self.is_own(named) => {
                let elems = self
                    .underlying(&named.name, depth)
                    .and_then(|underlying| self.interface_elems(&underlying, depth + 1));
                match elems {
                    // embedded interfaces promote into both method sets
                    Some(elems) => self.interface_has_error(&elems, depth + 1),
                    None => self.named_has_error(&named.name, through_pointer, depth),
                }
            }
            _ => false,
        }
    }

    /// Underlying type of a package-local type declaration
    fn underlying(&self, name: &str, depth: usize) -> Option<TypeDescriptor> {
        let spec = self.type_specs.get(name)?;
        let source = self.source_of(spec.file_index).ok()?;
        self.resolve_type(spec.ty, source, spec.file_index, &[], depth + 1)
            .ok()
    }

    /// Interface elements of `ty`, following defined types such as
    /// `type Failure error` down to the interface they name
    fn interface_elems(&self, ty: &TypeDescriptor, depth: usize) -> Option<Vec<InterfaceElem>> {
        if depth >= MAX_RESOLVE_DEPTH {
            return None;
        }
        match ty {
            TypeDescriptor::Interface(elems) => Some(elems.clone()),
            universe if universe.is_universe_error() => {
                Some(vec![InterfaceElem::Embedded(universe.clone())])
            }
            TypeDescriptor::Named(named) if self.is_own(named) => {
                let underlying = self.underlying(&named.name, depth)?;
                self.interface_elems(&underlying, depth + 1)
            }
            _ => None,
        }
    }

    fn interface_has_error(&self, elems: &[InterfaceElem], depth: usize) -> bool {
        elems.iter().any(|elem| match elem {
            InterfaceElem::Method { name, sig } => name == "Error" && is_error_signature(sig),
            InterfaceElem::Embedded(inner) => self.error_like(inner, depth + 1),
        })
    }

    fn is_error_method(&self, method: &MethodInfo<'_>) -> bool {
        let Ok(source) = self.source_of(method.file_index) else {
            return false;
        };
        let is_named_error = method
            .node
            .child_by_field_name("name")
            .is_some_and(|name| node_text(name, source) == "Error");
        is_named_error
            && self
                .resolve_func_type(method.node, source, method.file_index, &[], 0)
                .is_ok_and(|sig| is_error_signature(&sig))
    }

    /// Single result type of a call to a non-generic package function
    fn call_result(&self, name: &str) -> Option<TypeDescriptor> {
        let callee = self.functions.get(name)?;
        if callee.node.child_by_field_name("type_parameters").is_some() {
            return None;
        }
        let source = self.source_of(callee.file_index).ok()?;
        let mut results = self
            .resolve_result(callee.node, source, callee.file_index, &[], 0)
            .ok()?;
        match results.len() {
            1 => results.pop().map(|p| p.ty),
            _ => None,
        }
    }
}

impl TypeOracle for PackageTypes<'_> {
    fn signature(&self, decl: &FunctionDecl<'_>) -> Result<Signature> {
        let fail = |reason: String| GentestError::SignatureResolution {
            function: decl.name.clone(),
            reason,
        };
        let source = decl.source();
        let file_index = decl.file_index;
        let type_params = &decl.type_params;

        let body_id = decl.body().map(|body| body.id());
        let broken = children(decl.node())
            .into_iter()
            .find(|child| Some(child.id()) != body_id && child.has_error());
        if let Some(broken) = broken {
            return Err(fail(format!("syntax error near `{}`", node_text(broken, source))));
        }
        let params = match decl.parameters() {
            Some(list) => self
                .resolve_params(list, source, file_index, type_params, 0)
                .map_err(fail)?,
            None => return Err(fail("declaration has no parameter list".to_string())),
        };
        let results = self
            .resolve_result(decl.node(), source, file_index, type_params, 0)
            .map_err(fail)?;
        let receiver = match decl.receiver() {
            Some(list) => {
                let mut receivers = self
                    .resolve_params(list, source, file_index, type_params, 0)
                    .map_err(fail)?;
                if receivers.len() != 1 {
                    return Err(fail(format!(
                        "method has {} receivers, expected exactly one",
                        receivers.len()
                    )));
                }
                receivers.pop()
            }
            None => None,
        };

        debug!(
            function = %decl.name,
            params = params.len(),
            results = results.len(),
            method = receiver.is_some(),
            "resolved signature"
        );
        Ok(Signature {
            params,
            results,
            receiver,
        })
    }

    fn type_of_syntax(&self, decl: &FunctionDecl<'_>, ty: Node<'_>) -> Option<TypeDescriptor> {
        self.resolve_type(ty, decl.source(), decl.file_index, &decl.type_params, 0)
            .ok()
    }

    fn type_of_expr(&self, decl: &FunctionDecl<'_>, expr: Node<'_>) -> Option<TypeDescriptor> {
        let source = decl.source();
        match expr.kind() {
            "parenthesized_expression" => self.type_of_expr(decl, first_named(expr)?),
            "unary_expression" => {
                let operator = expr.child_by_field_name("operator")?;
                if node_text(operator, source) != "&" {
                    return None;
                }
                let operand = expr.child_by_field_name("operand")?;
                self.type_of_expr(decl, operand).map(TypeDescriptor::pointer)
            }
            "composite_literal" => self.type_of_syntax(decl, expr.child_by_field_name("type")?),
            "call_expression" => {
                let function = expr.child_by_field_name("function")?;
                if function.kind() != "identifier" {
                    return None;
                }
                let name = node_text(function, source);
                if name == "new" {
                    let arg = single_named(expr.child_by_field_name("arguments")?)?;
                    return self.type_of_syntax(decl, arg).map(TypeDescriptor::pointer);
                }
                self.call_result(name)
            }
            _ => None,
        }
    }

    fn is_error_like(&self, ty: &TypeDescriptor) -> bool {
        self.error_like(ty, 0)
    }
}

/// `Error() string`
fn is_error_signature(sig: &FuncType) -> bool {
    sig.params.is_empty() && !sig.variadic && sig.results == [TypeDescriptor::basic("string")]
}

fn collect_imports(decl: Node<'_>, source: &str, imports: &mut HashMap<String, String>) {
    let mut specs = Vec::new();
    for child in named_children(decl) {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => specs.extend(
                named_children(child)
                    .into_iter()
                    .filter(|n| n.kind() == "import_spec"),
            ),
            _ => {}
        }
    }
    for spec in specs {
        let Some(path) = spec.child_by_field_name("path") else {
            continue;
        };
        let path = node_text(path, source).trim_matches(|c| c == '"' || c == '`');
        let package = package_name_from_path(path);
        let local = match spec.child_by_field_name("name") {
            Some(name) if name.kind() == "package_identifier" => node_text(name, source).to_string(),
            // dot and blank imports bring no qualifier
            Some(_) => continue,
            None => package.clone(),
        };
        imports.insert(local, package);
    }
}

/// Package name conventionally declared by the package at `path`
///
/// `net/http` → `http`, `example.com/mod/v2` → `mod`, `gopkg.in/yaml.v3` → `yaml`.
pub fn package_name_from_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            let is_major = last.len() > 1
                && last.starts_with('v')
                && last[1..].chars().all(|c| c.is_ascii_digit());
            if is_major {
                segments.pop();
            }
        }
    }
    let last = segments.last().copied().unwrap_or(path);
    let last = if path.starts_with("gopkg.in/") {
        last.split('.').next().unwrap_or(last)
    } else {
        last
    };
    last.strip_prefix("go-").unwrap_or(last).replace(['-', '.'], "_")
}

/// Value of a Go string literal as written in source
fn string_literal_value(literal: &str) -> String {
    if let Some(raw) = literal.strip_prefix('`').and_then(|l| l.strip_suffix('`')) {
        // carriage returns are dropped from raw literals
        return raw.replace('\r', "");
    }
    let inner = literal
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some(digits @ ('x' | 'u' | 'U')) => {
                let width = match digits {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(digits);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn params_of(list: Node<'_>) -> Vec<Node<'_>> {
    named_children(list)
        .into_iter()
        .filter(|n| matches!(n.kind(), "parameter_declaration" | "variadic_parameter_declaration"))
        .collect()
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node).into_iter().find(|n| n.kind() != "comment")
}

/// The only non-comment named child, `None` for unions and empty nodes
fn single_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut inner = named_children(node).into_iter().filter(|n| n.kind() != "comment");
    match (inner.next(), inner.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::tree_sitter_utils::find_descendant;

    fn package(source: &str) -> GoPackage {
        GoPackage::from_sources(&[("p.go", source)]).unwrap()
    }

    fn signature_of(pkg: &GoPackage, name: &str) -> Result<Signature> {
        let types = PackageTypes::new(pkg);
        let decl = pkg
            .primary()
            .functions(0)
            .into_iter()
            .find(|d| d.name == name)
            .unwrap();
        types.signature(&decl)
    }

    fn labels(params: &[Param]) -> Vec<String> {
        params.iter().map(|p| p.ty.to_string()).collect()
    }

    #[test]
    fn test_grouped_and_unnamed_params() {
        let pkg = package("package p\n\nfunc add(a, b int) int { return a + b }\n");
        let sig = signature_of(&pkg, "add").unwrap();
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].name.as_deref(), Some("a"));
        assert_eq!(sig.params[1].name.as_deref(), Some("b"));
        assert_eq!(labels(&sig.results), vec!["int"]);
        assert_eq!(sig.results[0].name, None);
        assert!(sig.receiver.is_none());
    }

    #[test]
    fn test_variadic_param_is_slice() {
        let pkg = package("package p\n\nfunc sum(prefix string, xs ...int) {}\n");
        let sig = signature_of(&pkg, "sum").unwrap();
        assert_eq!(labels(&sig.params), vec!["string", "[]int"]);
        assert!(!sig.params[0].variadic);
        assert!(sig.params[1].variadic);
    }

    #[test]
    fn test_receiver_is_package_qualified() {
        let pkg = package("package e\n\ntype T struct{ Hoge string }\n\nfunc (t *T) assgin() { t.Hoge = \"hoge\" }\n");
        let sig = signature_of(&pkg, "assgin").unwrap();
        let receiver = sig.receiver.unwrap();
        assert_eq!(receiver.name.as_deref(), Some("t"));
        assert_eq!(receiver.ty.to_string(), "*e.T");
    }

    #[test]
    fn test_imports_and_composite_shapes() {
        let pkg = package(
            r#"package c

import (
	ctx "context"
	"net/http"
)

func shapes(a ctx.Context, h http.Handler, in <-chan int, out chan<- string, m map[string][]byte, arr [4]int, f func(int) (string, error), s struct{ name string }, i interface{ hoge() }, v any) {}
"#,
        );
        let sig = signature_of(&pkg, "shapes").unwrap();
        assert_eq!(
            labels(&sig.params),
            vec![
                "context.Context",
                "http.Handler",
                "<-chan int",
                "chan<- string",
                "map[string][]byte",
                "[4]int",
                "func(int) (string, error)",
                "struct{name string}",
                "interface{hoge()}",
                "interface{}",
            ]
        );
    }

    #[test]
    fn test_struct_tags_and_nested_chan_labels() {
        let pkg = package(
            r#"package c

func tagged(s struct {
	Name string `json:"name"`
	X    int    "a\tb"
}, c chan (<-chan int), d chan<- <-chan int) {}
"#,
        );
        let sig = signature_of(&pkg, "tagged").unwrap();
        assert_eq!(
            labels(&sig.params),
            vec![
                "struct{Name string \"json:\\\"name\\\"\"; X int \"a\\tb\"}",
                "chan (<-chan int)",
                "chan<- <-chan int",
            ]
        );
    }

    #[test]
    fn test_alias_and_type_params() {
        let pkg = package(
            r#"package g

type Names = []string

func Map[K comparable, V any](m map[K]V, n Names) []V { return nil }
"#,
        );
        let sig = signature_of(&pkg, "Map").unwrap();
        assert_eq!(labels(&sig.params), vec!["map[K]V", "[]string"]);
        assert_eq!(labels(&sig.results), vec!["[]V"]);
    }

    #[test]
    fn test_alias_cycle_is_an_error() {
        let pkg = package("package g\n\ntype A = B\ntype B = A\n\nfunc f(a A) {}\n");
        let err = signature_of(&pkg, "f").unwrap_err();
        assert!(matches!(err, GentestError::SignatureResolution { .. }));
    }

    #[test]
    fn test_type_set_interface_is_unresolvable() {
        let pkg = package("package p\n\nfunc f(x interface{ ~int | string }) {}\n");
        let err = signature_of(&pkg, "f").unwrap_err();
        match err {
            GentestError::SignatureResolution { function, .. } => assert_eq!(function, "f"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_like_types() {
        let pkg = package(
            r#"package p

import "net"

type ptrErr struct{}

func (e *ptrErr) Error() string { return "" }

type valErr string

func (e valErr) Error() string { return string(e) }

type notErr struct{}

func (n notErr) Error() int { return 0 }

type Failure interface {
	error
	Code() int
}

type Defined error

type otherIface interface{ Error() string }

type E otherIface

type wrapped struct{ error }

type wrapsVal struct{ valErr }

type wrapsPtrVal struct{ ptrErr }

type wrapsPtr struct{ *ptrErr }

type renamed valErr

type loop struct{ *loop }
"#,
        );
        let types = PackageTypes::new(&pkg);
        let named = |name: &str| TypeDescriptor::named(Some("p"), name);

        assert!(types.is_error_like(&TypeDescriptor::error()));
        assert!(types.is_error_like(&TypeDescriptor::pointer(named("ptrErr"))));
        assert!(!types.is_error_like(&named("ptrErr")));
        assert!(types.is_error_like(&named("valErr")));
        assert!(types.is_error_like(&TypeDescriptor::pointer(named("valErr"))));
        assert!(!types.is_error_like(&named("notErr")));
        assert!(types.is_error_like(&named("Failure")));
        assert!(!types.is_error_like(&TypeDescriptor::pointer(named("Failure"))));
        assert!(!types.is_error_like(&TypeDescriptor::named(Some("net"), "Error")));
        assert!(!types.is_error_like(&TypeDescriptor::basic("string")));
        assert!(!types.is_error_like(&TypeDescriptor::Interface(vec![])));

        let anonymous = TypeDescriptor::Interface(vec![InterfaceElem::Method {
            name: "Error".to_string(),
            sig: FuncType {
                params: vec![],
                results: vec![TypeDescriptor::basic("string")],
                variadic: false,
            },
        }]);
        assert!(types.is_error_like(&anonymous));

        // defined types over an interface keep its methods
        assert!(types.is_error_like(&named("Defined")));
        assert!(!types.is_error_like(&TypeDescriptor::pointer(named("Defined"))));
        assert!(types.is_error_like(&named("E")));

        // embedding promotes Error, pointer receivers only through a pointer
        assert!(types.is_error_like(&named("wrapped")));
        assert!(types.is_error_like(&TypeDescriptor::pointer(named("wrapped"))));
        assert!(types.is_error_like(&named("wrapsVal")));
        assert!(!types.is_error_like(&named("wrapsPtrVal")));
        assert!(types.is_error_like(&TypeDescriptor::pointer(named("wrapsPtrVal"))));
        assert!(types.is_error_like(&named("wrapsPtr")));
        assert!(types.is_error_like(&TypeDescriptor::Struct(vec![StructField {
            name: None,
            ty: TypeDescriptor::error(),
            tag: None,
        }])));

        // a defined type over a non-interface type drops its methods
        assert!(!types.is_error_like(&named("renamed")));
        assert!(!types.is_error_like(&TypeDescriptor::pointer(named("renamed"))));
        assert!(!types.is_error_like(&named("loop")));
    }

    #[test]
    fn test_type_of_expr() {
        let pkg = package(
            r#"package e

type T struct{}

func newT() *T { return &T{} }

func (t *T) m() {
	a := &T{}
	b := new(T)
	c := newT()
	d := (T{})
	e := len("x")
}
"#,
        );
        let types = PackageTypes::new(&pkg);
        let functions = pkg.primary().functions(0);
        let decl = functions.iter().find(|d| d.name == "m").unwrap();
        let body = decl.body().unwrap();

        let mut inferred = Vec::new();
        let list = find_descendant(body, "statement_list").unwrap();
        for stmt in named_children(list) {
            let right = stmt.child_by_field_name("right").unwrap();
            let expr = named_children(right)[0];
            inferred.push(types.type_of_expr(decl, expr).map(|t| t.to_string()));
        }
        assert_eq!(
            inferred,
            vec![
                Some("*e.T".to_string()),
                Some("*e.T".to_string()),
                Some("*e.T".to_string()),
                Some("e.T".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_package_name_from_path() {
        assert_eq!(package_name_from_path("net/http"), "http");
        assert_eq!(package_name_from_path("context"), "context");
        assert_eq!(package_name_from_path("example.com/mod/v2"), "mod");
        assert_eq!(package_name_from_path("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(package_name_from_path("github.com/mattn/go-isatty"), "isatty");
    }
}
