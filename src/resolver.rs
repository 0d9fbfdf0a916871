//! Type Resolver: canonical descriptions of type references.
//!
//! [`describe`] is purely syntactic. The one-hop enum check in
//! [`TypeResolver::resolve_enum`] opens the owning package through the
//! registry and inspects the referenced declaration.

use crate::errors::Result;
use crate::parser::{CompilationUnit, TypeExpr, TypeSpec};
use crate::registry::PackageRegistry;
use std::fmt;
use std::sync::Arc;

/// Predeclared Go types treated as primitives
pub const PRIMITIVE_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "float32", "float64",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// One of [`PRIMITIVE_TYPES`]
    Base,
    /// Indirection to a shape that has no name (`**T`, `*[]T`, ...)
    Pointer,
    /// Any other named type
    Struct,
    Interface,
    Unknown,
}

/// Package a described type belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageRef {
    /// Predeclared, no package
    Builtin,
    /// Declared in the unit the reference appears in
    Local(String),
    /// Qualified with an imported package's local name
    Imported(String),
}

impl PackageRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            PackageRef::Builtin => None,
            PackageRef::Local(name) | PackageRef::Imported(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub package: PackageRef,
    pub name: String,
}

impl TypeDescriptor {
    fn new(kind: TypeKind, package: PackageRef, name: impl Into<String>) -> Self {
        Self {
            kind,
            package,
            name: name.into(),
        }
    }

    pub fn is_base(&self) -> bool {
        self.kind == TypeKind::Base
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.package.name() {
            Some(package) => write!(f, "{:?}({}.{})", self.kind, package, self.name),
            None => write!(f, "{:?}({})", self.kind, self.name),
        }
    }
}

/// Describe a type expression appearing in `unit`.
///
/// A single pointer level is looked through; the caller tracks
/// pointer-ness from the expression itself. Shapes the generator cannot
/// map degrade to `Unknown` (or `Pointer` behind an indirection).
pub fn describe(expr: &TypeExpr, unit: &CompilationUnit) -> TypeDescriptor {
    match expr {
        TypeExpr::Name(name) if is_primitive(name) => {
            TypeDescriptor::new(TypeKind::Base, PackageRef::Builtin, name)
        }
        TypeExpr::Name(name) if name == "any" => {
            TypeDescriptor::new(TypeKind::Interface, PackageRef::Builtin, name)
        }
        TypeExpr::Name(name) => TypeDescriptor::new(
            TypeKind::Struct,
            PackageRef::Local(unit.name.clone()),
            name,
        ),
        TypeExpr::Qualified { package, name } => TypeDescriptor::new(
            TypeKind::Struct,
            PackageRef::Imported(package.clone()),
            name,
        ),
        TypeExpr::Interface { .. } => {
            TypeDescriptor::new(TypeKind::Interface, PackageRef::Builtin, expr.to_string())
        }
        TypeExpr::Pointer(inner) => match inner.as_ref() {
            TypeExpr::Name(_) | TypeExpr::Qualified { .. } => describe(inner, unit),
            _ => TypeDescriptor::new(TypeKind::Pointer, PackageRef::Builtin, expr.to_string()),
        },
        TypeExpr::Map { .. } | TypeExpr::Other(_) => {
            TypeDescriptor::new(TypeKind::Unknown, PackageRef::Builtin, expr.to_string())
        }
    }
}

/// Outcome of the one-hop enum check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumLookup {
    /// `type T <primitive>`
    Enum {
        /// Unit declaring the type
        owner: Arc<CompilationUnit>,
        primitive: String,
    },
    /// The owning package could not be opened
    PackageUnavailable(String),
    /// The package has no such declaration
    NotFound,
    /// Declared, but not over a primitive (struct, interface, map...)
    NotEnum(String),
    /// Declared over another named type; only one hop is followed
    MultiHop(String),
}

pub struct TypeResolver<'r> {
    registry: &'r PackageRegistry,
}

impl<'r> TypeResolver<'r> {
    pub fn new(registry: &'r PackageRegistry) -> Self {
        Self { registry }
    }

    pub fn describe(&self, expr: &TypeExpr, unit: &CompilationUnit) -> TypeDescriptor {
        describe(expr, unit)
    }

    /// Open the unit that declares a described type. `Ok(None)` means the
    /// qualifier does not name any package the unit can see.
    pub fn owning_unit(
        &self,
        descriptor: &TypeDescriptor,
        unit: &Arc<CompilationUnit>,
    ) -> Result<Option<Arc<CompilationUnit>>> {
        match &descriptor.package {
            PackageRef::Builtin => Ok(None),
            PackageRef::Local(_) => Ok(Some(Arc::clone(unit))),
            PackageRef::Imported(qualifier) => self.registry.resolve_import(unit, qualifier),
        }
    }

    /// Follow a `Struct` descriptor to its declaration and check whether it
    /// is a named type over a primitive.
    ///
    /// Run-fatal errors (module resolution) propagate; a dependency that
    /// fails to parse is reported as `PackageUnavailable`.
    pub fn resolve_enum(
        &self,
        descriptor: &TypeDescriptor,
        unit: &Arc<CompilationUnit>,
    ) -> Result<EnumLookup> {
        let owner = match self.owning_unit(descriptor, unit) {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                return Ok(EnumLookup::PackageUnavailable(format!(
                    "package {} is not imported",
                    descriptor.package.name().unwrap_or("<builtin>")
                )))
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => return Ok(EnumLookup::PackageUnavailable(err.to_string())),
        };

        let Some(decl) = owner.find_type(&descriptor.name) else {
            return Ok(EnumLookup::NotFound);
        };

        Ok(match &decl.spec {
            TypeSpec::Struct(_) => EnumLookup::NotEnum("struct".to_string()),
            TypeSpec::Named(TypeExpr::Name(base)) if is_primitive(base) => EnumLookup::Enum {
                primitive: base.clone(),
                owner,
            },
            TypeSpec::Named(underlying) if underlying.is_open_interface() => {
                EnumLookup::NotEnum(underlying.to_string())
            }
            TypeSpec::Named(underlying @ (TypeExpr::Name(_) | TypeExpr::Qualified { .. })) => {
                EnumLookup::MultiHop(underlying.to_string())
            }
            TypeSpec::Named(underlying) => EnumLookup::NotEnum(underlying.to_string()),
        })
    }
}
