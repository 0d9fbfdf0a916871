//! Owned declaration model lowered from the tree-sitter Go syntax tree.
//!
//! Only the constructs needed to classify struct fields are kept: the
//! package clause, imports, type declarations and top-level function
//! signatures. Function bodies are never lowered.

use super::tag::StructTag;
use std::fmt;

/// Syntactic shape of a type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A plain identifier: `int64`, `Status`, `any`
    Name(String),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `pkg.Name`
    Qualified { package: String, name: String },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `interface{ ... }`; `open` when the method set is empty
    Interface { open: bool },
    /// Any other shape (slices, arrays, channels, functions, generics...),
    /// kept as source text for diagnostics
    Other(String),
}

impl TypeExpr {
    /// `interface{}` literal or the predeclared `any`
    pub fn is_open_interface(&self) -> bool {
        match self {
            TypeExpr::Interface { open } => *open,
            TypeExpr::Name(name) => name == "any",
            _ => false,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeExpr::Pointer(_))
    }

    /// Strip one level of pointer indirection
    pub fn pointee(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => write!(f, "{name}"),
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Qualified { package, name } => write!(f, "{package}.{name}"),
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeExpr::Interface { open: true } => write!(f, "interface{{}}"),
            TypeExpr::Interface { open: false } => write!(f, "interface{{...}}"),
            TypeExpr::Other(text) => write!(f, "{text}"),
        }
    }
}

/// One named struct field. `A, B int` lowers to two fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: TypeExpr,
    pub tag: StructTag,
    /// Embedded field; `name` is the embedded type's name
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Struct(Vec<StructField>),
    /// `type T U` or `type T = U`
    Named(TypeExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub spec: TypeSpec,
    /// Declared with `=`
    pub alias: bool,
}

impl TypeDecl {
    pub fn fields(&self) -> Option<&[StructField]> {
        match &self.spec {
            TypeSpec::Struct(fields) => Some(fields),
            TypeSpec::Named(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    /// Explicit local name, including `_` and `.`
    pub alias: Option<String>,
}

/// Declarations found in a single source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDecls {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FuncDecl>,
}
