//! Resolved Go type shapes
//!
//! A `TypeDescriptor` is the closed set of shapes the engine reasons about.
//! Its `Display` impl renders the Go type label used in generated structs.

use std::fmt;

/// Predeclared basic type names.
pub const BASIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "byte",
    "rune",
];

/// Channel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Parameter and result types of a function type or method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuncType {
    pub params: Vec<TypeDescriptor>,
    pub results: Vec<TypeDescriptor>,
    /// The last param is variadic; its type is stored as a slice.
    pub variadic: bool,
}

/// One field of an anonymous struct. `name` is `None` for embedded fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: Option<String>,
    pub ty: TypeDescriptor,
    /// Tag value with the literal's quoting removed
    pub tag: Option<String>,
}

/// One element of an anonymous interface
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceElem {
    Method { name: String, sig: FuncType },
    Embedded(TypeDescriptor),
}

/// A declared (named) type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Name of the declaring package. `None` for universe types and type parameters.
    pub package: Option<String>,
    pub name: String,
    pub type_args: Vec<TypeDescriptor>,
}

/// Resolved type of a parameter, result, or receiver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Basic(String),
    Array {
        len: String,
        elem: Box<TypeDescriptor>,
    },
    Slice(Box<TypeDescriptor>),
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    Pointer(Box<TypeDescriptor>),
    Func(FuncType),
    Chan {
        dir: ChanDir,
        elem: Box<TypeDescriptor>,
    },
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceElem>),
    Named(NamedType),
}

impl TypeDescriptor {
    pub fn basic(name: &str) -> Self {
        TypeDescriptor::Basic(name.to_string())
    }

    pub fn slice(elem: TypeDescriptor) -> Self {
        TypeDescriptor::Slice(Box::new(elem))
    }

    pub fn pointer(elem: TypeDescriptor) -> Self {
        TypeDescriptor::Pointer(Box::new(elem))
    }

    pub fn named(package: Option<&str>, name: &str) -> Self {
        TypeDescriptor::Named(NamedType {
            package: package.map(str::to_string),
            name: name.to_string(),
            type_args: Vec::new(),
        })
    }

    /// The universe `error` type
    pub fn error() -> Self {
        Self::named(None, "error")
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, TypeDescriptor::Basic(_))
    }

    /// True for the universe `error` type itself
    pub fn is_universe_error(&self) -> bool {
        matches!(self, TypeDescriptor::Named(n) if n.package.is_none() && n.name == "error")
    }
}

/// One entry of a resolved parameter, result, or receiver tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Declared identifier, `None` when the entry is unnamed
    pub name: Option<String>,
    /// Resolved type; for a variadic parameter this is the slice type
    pub ty: TypeDescriptor,
    pub variadic: bool,
}

impl Param {
    pub fn new(name: Option<&str>, ty: TypeDescriptor) -> Self {
        Param {
            name: name.map(str::to_string),
            ty,
            variadic: false,
        }
    }

    /// Declared name, treating the blank identifier as absent
    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| *n != "_")
    }
}

/// Resolved signature of a function or method declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub receiver: Option<Param>,
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl FuncType {
    /// Writes `(params) results` without the `func` keyword.
    fn write_signature(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let is_last = i + 1 == self.params.len();
            match param {
                TypeDescriptor::Slice(elem) if self.variadic && is_last => {
                    write!(f, "...{}", elem)?
                }
                other => write!(f, "{}", other)?,
            }
        }
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            many => {
                f.write_str(" (")?;
                write_list(f, many, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Basic(name) => f.write_str(name),
            TypeDescriptor::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            TypeDescriptor::Slice(elem) => write!(f, "[]{}", elem),
            TypeDescriptor::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeDescriptor::Pointer(elem) => write!(f, "*{}", elem),
            TypeDescriptor::Func(sig) => {
                f.write_str("func")?;
                sig.write_signature(f)
            }
            TypeDescriptor::Chan { dir, elem } => match dir {
                // `chan <-chan T` would read as `chan<- chan T`
                ChanDir::Both if matches!(elem.as_ref(), TypeDescriptor::Chan { dir: ChanDir::Recv, .. }) => {
                    write!(f, "chan ({})", elem)
                }
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            TypeDescriptor::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match &field.name {
                        Some(name) => write!(f, "{} {}", name, field.ty)?,
                        None => write!(f, "{}", field.ty)?,
                    }
                    if let Some(tag) = &field.tag {
                        write!(f, " {}", quote(tag))?;
                    }
                }
                f.write_str("}")
            }
            TypeDescriptor::Interface(elems) => {
                f.write_str("interface{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match elem {
                        InterfaceElem::Method { name, sig } => {
                            f.write_str(name)?;
                            sig.write_signature(f)?;
                        }
                        InterfaceElem::Embedded(ty) => write!(f, "{}", ty)?,
                    }
                }
                f.write_str("}")
            }
            TypeDescriptor::Named(named) => {
                if let Some(package) = &named.package {
                    write!(f, "{}.", package)?;
                }
                f.write_str(&named.name)?;
                if !named.type_args.is_empty() {
                    f.write_str("[")?;
                    write_list(f, &named.type_args, ", ")?;
                    f.write_str("]")?;
                }
                Ok(())
            }
        }
    }
}

/// Go double-quoted string literal for `value`
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
