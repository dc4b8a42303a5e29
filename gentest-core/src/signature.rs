//! Signature extraction
//!
//! Turns a resolved signature into named, labelled fields. Everything the
//! scaffold needs about the target function is collected once into
//! [`BaseFunctionData`].

use tracing::debug;

use crate::error::Result;
use crate::language::FunctionDecl;
use crate::mutation;
use crate::naming::{base_name, escape_keyword, suggest_name, NameAllocator, NameStyle, NamingOptions};
use crate::typecheck::TypeOracle;
use crate::types::{Param, TypeDescriptor};

/// One named, typed slot of the scaffold: a parameter, result or receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarField {
    /// Unique within its list
    pub name: String,
    pub ty: TypeDescriptor,
    /// Go type label used in struct definitions
    pub type_label: String,
    pub is_error_like: bool,
    /// Spread with `...` at the call site
    pub variadic: bool,
}

/// Name every entry of `tuple` and count the error-like ones.
pub fn tuple_to_fields(
    tuple: &[Param],
    prefix: &str,
    style: NameStyle,
    oracle: &dyn TypeOracle,
) -> (Vec<VarField>, usize) {
    let mut names = NameAllocator::new();
    let mut error_count = 0;
    let mut fields = Vec::with_capacity(tuple.len());

    for param in tuple {
        let base = base_name(param.declared_name(), &param.ty, prefix, style);
        let is_error_like = oracle.is_error_like(&param.ty);
        if is_error_like {
            error_count += 1;
        }
        fields.push(VarField {
            name: names.allocate(&base),
            ty: param.ty.clone(),
            type_label: param.ty.to_string(),
            is_error_like,
            variadic: param.variadic,
        });
    }

    (fields, error_count)
}

/// The receiver slot is always named after its type and never error-like.
pub fn receiver_field(receiver: &Param) -> VarField {
    VarField {
        name: escape_keyword(suggest_name(&receiver.ty)),
        ty: receiver.ty.clone(),
        type_label: receiver.ty.to_string(),
        is_error_like: false,
        variadic: false,
    }
}

/// Everything known about the target function, built once per run
#[derive(Debug)]
pub struct BaseFunctionData<'a> {
    pub decl: FunctionDecl<'a>,
    pub params: Vec<VarField>,
    pub results: Vec<VarField>,
    pub receiver: Option<VarField>,
    pub result_error_count: usize,
    pub receiver_mutated: bool,
}

impl<'a> BaseFunctionData<'a> {
    /// Populate in a fixed order: signature, results, params, receiver,
    /// mutation flag. Fails without partial data when the signature cannot
    /// be resolved.
    pub fn build(decl: FunctionDecl<'a>, oracle: &dyn TypeOracle, naming: &NamingOptions) -> Result<Self> {
        let signature = oracle.signature(&decl)?;

        let (results, result_error_count) =
            tuple_to_fields(&signature.results, &naming.result_prefix, naming.style, oracle);
        let (params, _) = tuple_to_fields(&signature.params, "", naming.style, oracle);
        let receiver = signature.receiver.as_ref().map(receiver_field);
        let receiver_mutated = signature
            .receiver
            .as_ref()
            .is_some_and(|recv| mutation::receiver_mutated(&decl, recv, oracle));

        debug!(
            function = %decl.name,
            params = params.len(),
            results = results.len(),
            errors = result_error_count,
            receiver_mutated,
            "extracted signature fields"
        );

        Ok(BaseFunctionData {
            decl,
            params,
            results,
            receiver,
            result_error_count,
            receiver_mutated,
        })
    }
}
