//! Function Signature Extractor.
//!
//! Finds conversion stubs by name prefix, picks out the first map-typed
//! parameter and the first result, and eagerly locates the result's
//! struct declaration so fields can be classified.

use crate::errors::{Error, Result};
use crate::parser::{CompilationUnit, FuncDecl, StructField, TypeExpr};
use crate::registry::PackageRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The map-typed input parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapParam {
    pub key_type: String,
    pub value_type: String,
    /// `interface{}` or `any`: no static type guarantee on values
    pub value_is_open_interface: bool,
}

impl MapParam {
    /// Go spelling, e.g. `map[string]interface{}`
    pub fn go_type(&self) -> String {
        format!("map[{}]{}", self.key_type, self.value_type)
    }
}

/// The first declared result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    /// Qualifier as written; `None` for a type of the same package
    pub package: Option<String>,
    pub type_name: String,
    pub is_pointer: bool,
}

impl OutputRef {
    /// Type name as the generating package spells it
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(package) => format!("{package}.{}", self.type_name),
            None => self.type_name.clone(),
        }
    }
}

/// The located output struct
#[derive(Debug, Clone)]
pub struct OutputStruct {
    /// Unit declaring the struct
    pub unit: Arc<CompilationUnit>,
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub map_param: MapParam,
    pub output: OutputRef,
    /// Present only when the output package and struct were found
    pub output_struct: Option<OutputStruct>,
    /// Why `output_struct` is absent: `MissingOutput`, or the `Parse`
    /// error of the output's package
    pub output_error: Option<Error>,
}

/// Functions found in one unit, in declaration order
#[derive(Debug, Default)]
pub struct FunctionScan {
    pub functions: Vec<FunctionSignature>,
    /// `UnsupportedSignature` errors for candidates that were skipped
    pub skipped: Vec<Error>,
}

impl FunctionScan {
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Collect every function of `unit` whose name starts with `prefix`.
///
/// Unsupported candidates are skipped and recorded. Only module
/// resolution failures abort the scan.
pub fn find_functions(
    registry: &PackageRegistry,
    unit: &Arc<CompilationUnit>,
    prefix: &str,
) -> Result<FunctionScan> {
    let mut scan = FunctionScan::default();

    for decl in unit.functions().iter().filter(|f| f.name.starts_with(prefix)) {
        match extract_signature(registry, unit, decl) {
            Ok(signature) => {
                info!(
                    function = %signature.name,
                    input = %signature.map_param.go_type(),
                    output = %signature.output.qualified_name(),
                    "found function"
                );
                scan.functions.push(signature);
            }
            Err(err) if err.is_fatal() => return Err(err.in_function(&decl.name)),
            Err(err) => {
                warn!(function = %decl.name, error = %err, "skipping function");
                scan.skipped.push(err);
            }
        }
    }

    Ok(scan)
}

fn extract_signature(
    registry: &PackageRegistry,
    unit: &Arc<CompilationUnit>,
    decl: &FuncDecl,
) -> Result<FunctionSignature> {
    if decl.params.is_empty() || decl.results.is_empty() {
        return Err(Error::unsupported_signature(
            &decl.name,
            "needs at least one parameter and one result",
        ));
    }

    let map_param = decl
        .params
        .iter()
        .find(|p| matches!(p.ty, TypeExpr::Map { .. }))
        .ok_or_else(|| Error::unsupported_signature(&decl.name, "no map-typed parameter"))
        .and_then(|p| parse_map_param(&decl.name, &p.ty))?;

    let output = output_ref(&decl.name, &decl.results[0].ty)?;
    let (output_struct, output_error) = match locate_output(registry, unit, &decl.name, &output) {
        Ok(found) => (Some(found), None),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            warn!(function = %decl.name, output = %output.qualified_name(), error = %err, "output struct not found");
            (None, Some(err))
        }
    };

    Ok(FunctionSignature {
        name: decl.name.clone(),
        map_param,
        output,
        output_struct,
        output_error,
    })
}

fn parse_map_param(function: &str, ty: &TypeExpr) -> Result<MapParam> {
    let TypeExpr::Map { key, value } = ty else {
        return Err(Error::unsupported_signature(function, "parameter is not a map"));
    };
    let TypeExpr::Name(key_type) = key.as_ref() else {
        return Err(Error::unsupported_signature(
            function,
            format!("map key type {key} is not an identifier"),
        ));
    };

    let (value_type, open) = match value.as_ref() {
        TypeExpr::Name(name) => (name.clone(), name == "any"),
        TypeExpr::Interface { open: true } => ("interface{}".to_string(), true),
        other => {
            return Err(Error::unsupported_signature(
                function,
                format!("map value type {other} is neither an identifier nor interface{{}}"),
            ))
        }
    };

    Ok(MapParam {
        key_type: key_type.clone(),
        value_type,
        value_is_open_interface: open,
    })
}

fn output_ref(function: &str, ty: &TypeExpr) -> Result<OutputRef> {
    let is_pointer = ty.is_pointer();
    match ty.pointee() {
        TypeExpr::Name(name) => Ok(OutputRef {
            package: None,
            type_name: name.clone(),
            is_pointer,
        }),
        TypeExpr::Qualified { package, name } => Ok(OutputRef {
            package: Some(package.clone()),
            type_name: name.clone(),
            is_pointer,
        }),
        other => Err(Error::unsupported_signature(
            function,
            format!("first result {other} is not a named type"),
        )),
    }
}

fn locate_output(
    registry: &PackageRegistry,
    unit: &Arc<CompilationUnit>,
    function: &str,
    output: &OutputRef,
) -> Result<OutputStruct> {
    let owner = match &output.package {
        None => Arc::clone(unit),
        Some(qualifier) => registry.resolve_import(unit, qualifier)?.ok_or_else(|| {
            Error::missing_output(
                function,
                output.qualified_name(),
                format!("package {qualifier} is not imported"),
            )
        })?,
    };

    let decl = owner.find_struct(&output.type_name).ok_or_else(|| {
        Error::missing_output(
            function,
            output.qualified_name(),
            format!("no struct {} in package {}", output.type_name, owner.name),
        )
    })?;
    debug!(package = %owner.name, name = %decl.name, "located output struct");

    Ok(OutputStruct {
        name: decl.name.clone(),
        fields: decl.fields().map(<[StructField]>::to_vec).unwrap_or_default(),
        unit: owner,
    })
}
