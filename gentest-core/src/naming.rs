//! Identifier synthesis
//!
//! Derives short variable names from type shapes and makes them unique
//! within one field list. Everything here is pure: the same type always
//! yields the same suggestion.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::TypeDescriptor;

/// Prefix applied to result names unless configured otherwise
pub const DEFAULT_RESULT_PREFIX: &str = "got";

/// Go keywords; a synthesized name equal to one of these gets a trailing `_`.
pub const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// How a prefix is joined to a synthesized name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStyle {
    /// `got` + `int` → `gotint`
    #[default]
    Verbatim,
    /// `got` + `int` → `gotInt`
    CamelCase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    pub result_prefix: String,
    pub style: NameStyle,
}

impl Default for NamingOptions {
    fn default() -> Self {
        NamingOptions {
            result_prefix: DEFAULT_RESULT_PREFIX.to_string(),
            style: NameStyle::default(),
        }
    }
}

/// Suggested variable name for a value of type `ty`
pub fn suggest_name(ty: &TypeDescriptor) -> String {
    match ty {
        TypeDescriptor::Basic(name) => name.clone(),
        TypeDescriptor::Array { elem, .. } | TypeDescriptor::Slice(elem) => match elem.as_ref() {
            TypeDescriptor::Basic(name) => format!("{}List", name),
            _ => "list".to_string(),
        },
        TypeDescriptor::Map { .. } => "mp".to_string(),
        TypeDescriptor::Pointer(elem) => match elem.as_ref() {
            TypeDescriptor::Basic(name) => format!("p{}", name),
            named @ TypeDescriptor::Named(_) => suggest_name(named),
            _ => "p".to_string(),
        },
        TypeDescriptor::Func(_) => "fn".to_string(),
        TypeDescriptor::Chan { .. } => "ch".to_string(),
        TypeDescriptor::Struct(_) => "st".to_string(),
        TypeDescriptor::Interface(_) => "in".to_string(),
        TypeDescriptor::Named(named) => lower_first(&named.name),
    }
}

/// Field name before collision resolution
///
/// Declared names win over synthesized ones, except for the blank
/// identifier. Only synthesized suffixes are re-cased.
pub fn base_name(declared: Option<&str>, ty: &TypeDescriptor, prefix: &str, style: NameStyle) -> String {
    let name = match declared.filter(|n| *n != "_") {
        Some(declared) => format!("{}{}", prefix, declared),
        None => {
            let suggested = suggest_name(ty);
            match style {
                NameStyle::CamelCase if !prefix.is_empty() => {
                    format!("{}{}", prefix, upper_first(&suggested))
                }
                _ => format!("{}{}", prefix, suggested),
            }
        }
    };
    escape_keyword(name)
}

pub fn escape_keyword(mut name: String) -> String {
    if GO_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hands out unique names within one list
///
/// The first request for a base keeps it bare; later ones get a running
/// 1-based counter (`int`, `int2`, `int3`). A candidate that is already
/// taken is skipped.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: HashMap<String, usize>,
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        *counter += 1;
        let mut candidate = if *counter == 1 {
            base.to_string()
        } else {
            format!("{}{}", base, counter)
        };
        while self.used.contains(&candidate) {
            *counter += 1;
            candidate = format!("{}{}", base, counter);
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
