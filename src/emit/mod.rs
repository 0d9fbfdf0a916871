//! Code Emitter: renders classified fields as Go source text.
//!
//! The emitter performs no validation; it trusts the classifier to hand
//! over complete buckets and writes them out section by section.

use crate::classifier::{FieldBuckets, FieldDescriptor, GenerationStrategy, PackageImport};
use crate::errors::{Error, Result};
use crate::parser::default_package_name;
use std::fmt::{self, Write};

pub const GENERATED_HEADER: &str = "// Code generated by map2struct. DO NOT EDIT.";

/// Everything needed to render one generated function
#[derive(Debug, Clone)]
pub struct FunctionPlan<'a> {
    /// Name of the generated function, e.g. `genMapToBook`
    pub name: String,
    pub param_name: &'a str,
    /// e.g. `map[string]interface{}`
    pub param_type: String,
    /// Output type as the generated file spells it, e.g. `model.Book`
    pub output_type: String,
    pub buckets: &'a FieldBuckets,
}

/// File prologue: generated-code marker, package clause and imports
pub fn render_header(package: &str, imports: &[PackageImport]) -> Result<String> {
    write_header(package, imports).map_err(|e| Error::emit(package, e.to_string()))
}

fn write_header(package: &str, imports: &[PackageImport]) -> std::result::Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{GENERATED_HEADER}")?;
    writeln!(out)?;
    writeln!(out, "package {package}")?;

    match imports {
        [] => {}
        [single] => {
            writeln!(out)?;
            writeln!(out, "import {}", import_line(single))?;
        }
        many => {
            writeln!(out)?;
            writeln!(out, "import (")?;
            for import in many {
                writeln!(out, "\t{}", import_line(import))?;
            }
            writeln!(out, ")")?;
        }
    }
    Ok(out)
}

fn import_line(import: &PackageImport) -> String {
    if default_package_name(&import.path) == import.name {
        go_quote(&import.path)
    } else {
        format!("{} {}", import.name, go_quote(&import.path))
    }
}

/// Interpreted Go string literal for `text`, escaped the way `strconv.Quote` does
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if c.is_control() && (c as u32) <= 0xffff => {
                out.push_str(&format!("\\u{:04x}", c as u32))
            }
            c if c.is_control() => out.push_str(&format!("\\U{:08x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn render_function(plan: &FunctionPlan<'_>) -> Result<String> {
    write_function(plan).map_err(|e| Error::emit(&plan.name, e.to_string()))
}

fn write_function(plan: &FunctionPlan<'_>) -> std::result::Result<String, fmt::Error> {
    let mut out = String::new();
    let src = plan.param_name;
    let buckets = plan.buckets;

    writeln!(out)?;
    writeln!(
        out,
        "func {}({src} {}) (obj *{}, err error) {{",
        plan.name, plan.param_type, plan.output_type
    )?;
    writeln!(out, "\tobj = &{}{{}}", plan.output_type)?;

    if !buckets.direct.is_empty() {
        writeln!(out)?;
        writeln!(out, "\t// assigned directly")?;
        for field in &buckets.direct {
            write_direct(&mut out, src, field)?;
        }
    }

    if !buckets.enums.is_empty() {
        writeln!(out)?;
        writeln!(out, "\t// enum types")?;
        for field in &buckets.enums {
            write_guarded(&mut out, src, field)?;
        }
    }

    if !buckets.assign.is_empty() {
        writeln!(out)?;
        writeln!(out, "\t// pointer types")?;
        for field in &buckets.assign {
            write_guarded(&mut out, src, field)?;
        }
    }

    if !buckets.unsupported.is_empty() {
        writeln!(out)?;
        writeln!(out, "\t// complete by hand")?;
        for field in &buckets.unsupported {
            match &field.strategy {
                GenerationStrategy::Unsupported { reason } => {
                    writeln!(out, "\t// obj.{} = ? // {reason}", field.name)?
                }
                _ => writeln!(out, "\t// obj.{} = ?", field.name)?,
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "\treturn obj, err")?;
    writeln!(out, "}}")?;
    Ok(out)
}

fn write_direct(out: &mut String, src: &str, field: &FieldDescriptor) -> fmt::Result {
    match field.strategy.conversion() {
        Some(conversion) => writeln!(
            out,
            "\tobj.{} = {conversion}({src}[{}])",
            field.name,
            go_quote(&field.key_name)
        ),
        None => writeln!(
            out,
            "\tobj.{} = {src}[{}]",
            field.name,
            go_quote(&field.key_name)
        ),
    }
}

/// `if tmp, ok := src["k"]; ok { ... }` for enum and pointer fields
fn write_guarded(out: &mut String, src: &str, field: &FieldDescriptor) -> fmt::Result {
    writeln!(out, "\tif tmp, ok := {src}[{}]; ok {{", go_quote(&field.key_name))?;

    let value = match &field.strategy {
        GenerationStrategy::Enum {
            type_cast,
            conversion,
            ..
        } => Some(format!("{type_cast}({conversion}(tmp))")),
        GenerationStrategy::Assign { conversion } => Some(format!("{conversion}(tmp)")),
        _ => None,
    };

    match (value, field.is_pointer) {
        (Some(value), true) => {
            writeln!(out, "\t\tval := {value}")?;
            writeln!(out, "\t\tobj.{} = &val", field.name)?;
        }
        (Some(value), false) => writeln!(out, "\t\tobj.{} = {value}", field.name)?,
        (None, true) => writeln!(out, "\t\tobj.{} = &tmp", field.name)?,
        (None, false) => writeln!(out, "\t\tobj.{} = tmp", field.name)?,
    }

    writeln!(out, "\t}}")
}
