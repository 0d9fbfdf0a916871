// Export modules for library usage
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod emit;
pub mod errors;
pub mod module_locator;
pub mod naming;
pub mod observability;
pub mod output;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod signature;

// Re-export commonly used types
pub use crate::classifier::{
    DroppedField, FieldBuckets, FieldClassifier, FieldDescriptor, GenerationStrategy,
    PackageImport,
};
pub use crate::commands::{Diagnostic, DiagnosticKind, Generated, GenerationReport, Generator};
pub use crate::config::GenConfig;
pub use crate::errors::{Error, Result};
pub use crate::module_locator::{GoListProvider, ModuleInfo, ModuleLocator, ModuleMetadataProvider};
pub use crate::parser::{CompilationUnit, StructTag, TypeExpr};
pub use crate::registry::PackageRegistry;
pub use crate::resolver::{describe, EnumLookup, TypeDescriptor, TypeKind, TypeResolver};
pub use crate::signature::{find_functions, FunctionScan, FunctionSignature, MapParam};
