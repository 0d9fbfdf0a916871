//! Lowering from the tree-sitter Go syntax tree into [`FileDecls`].

use super::ast::{FileDecls, FuncDecl, ImportSpec, Param, StructField, TypeDecl, TypeExpr, TypeSpec};
use super::tag::{unquote, StructTag};
use crate::errors::{Error, Result};
use std::path::Path;
use tree_sitter::Node;

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the column number for a tree-sitter node (1-indexed)
pub fn node_column(node: &Node) -> usize {
    node.start_position().column + 1
}

/// First ERROR or MISSING node in document order
pub fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn field_children<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Lower a parsed `source_file` node
pub fn lower_file(root: Node, source: &str, path: &Path) -> Result<FileDecls> {
    let mut decls = FileDecls::default();

    for child in named_children(&root) {
        match child.kind() {
            "package_clause" => {
                if let Some(name) = named_children(&child)
                    .into_iter()
                    .find(|n| n.kind() == "package_identifier" || n.kind() == "identifier")
                {
                    decls.package = node_text(&name, source).to_string();
                }
            }
            "import_declaration" => lower_imports(&child, source, &mut decls.imports),
            "type_declaration" => {
                for spec in named_children(&child) {
                    match spec.kind() {
                        "type_spec" => decls.types.extend(lower_type_spec(&spec, source, false)),
                        "type_alias" => decls.types.extend(lower_type_spec(&spec, source, true)),
                        _ => {}
                    }
                }
            }
            "function_declaration" => decls.functions.extend(lower_function(&child, source)),
            _ => {}
        }
    }

    if decls.package.is_empty() {
        return Err(Error::parse(path, "missing package clause"));
    }
    Ok(decls)
}

fn lower_imports(node: &Node, source: &str, imports: &mut Vec<ImportSpec>) {
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => imports.extend(lower_import_spec(&child, source)),
            "import_spec_list" => {
                for spec in named_children(&child) {
                    if spec.kind() == "import_spec" {
                        imports.extend(lower_import_spec(&spec, source));
                    }
                }
            }
            _ => {}
        }
    }
}

fn lower_import_spec(node: &Node, source: &str) -> Option<ImportSpec> {
    let path = node.child_by_field_name("path")?;
    let alias = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, source).to_string());
    Some(ImportSpec {
        path: string_literal_value(node_text(&path, source)),
        alias,
    })
}

fn lower_type_spec(node: &Node, source: &str, alias: bool) -> Option<TypeDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let ty = node.child_by_field_name("type")?;
    let spec = if ty.kind() == "struct_type" {
        TypeSpec::Struct(lower_struct(&ty, source))
    } else {
        TypeSpec::Named(lower_type(&ty, source))
    };
    Some(TypeDecl { name, spec, alias })
}

fn lower_struct(node: &Node, source: &str) -> Vec<StructField> {
    let Some(list) = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    named_children(&list)
        .iter()
        .filter(|n| n.kind() == "field_declaration")
        .flat_map(|decl| lower_field_declaration(decl, source))
        .collect()
}

fn lower_field_declaration(node: &Node, source: &str) -> Vec<StructField> {
    let Some(type_node) = node.child_by_field_name("type") else {
        return Vec::new();
    };
    let tag = node
        .child_by_field_name("tag")
        .map(|t| StructTag::parse(&string_literal_value(node_text(&t, source))))
        .unwrap_or_default();
    let ty = lower_type(&type_node, source);
    let names = field_children(node, "name");

    if names.is_empty() {
        let mut cursor = node.walk();
        let starred = node.children(&mut cursor).any(|c| c.kind() == "*");
        let name = match &ty {
            TypeExpr::Name(name) | TypeExpr::Qualified { name, .. } => name.clone(),
            other => other.to_string(),
        };
        let ty = if starred {
            TypeExpr::Pointer(Box::new(ty))
        } else {
            ty
        };
        return vec![StructField {
            name,
            ty,
            tag,
            embedded: true,
        }];
    }

    names
        .iter()
        .map(|name| StructField {
            name: node_text(name, source).to_string(),
            ty: ty.clone(),
            tag: tag.clone(),
            embedded: false,
        })
        .collect()
}

/// Lower a type node into a [`TypeExpr`]
pub fn lower_type(node: &Node, source: &str) -> TypeExpr {
    match node.kind() {
        "type_identifier" | "identifier" => TypeExpr::Name(node_text(node, source).to_string()),
        "pointer_type" => match named_children(node).first() {
            Some(inner) => TypeExpr::Pointer(Box::new(lower_type(inner, source))),
            None => TypeExpr::Other(node_text(node, source).to_string()),
        },
        "qualified_type" => {
            match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(package), Some(name)) => TypeExpr::Qualified {
                    package: node_text(&package, source).to_string(),
                    name: node_text(&name, source).to_string(),
                },
                _ => TypeExpr::Other(node_text(node, source).to_string()),
            }
        }
        "map_type" => match (
            node.child_by_field_name("key"),
            node.child_by_field_name("value"),
        ) {
            (Some(key), Some(value)) => TypeExpr::Map {
                key: Box::new(lower_type(&key, source)),
                value: Box::new(lower_type(&value, source)),
            },
            _ => TypeExpr::Other(node_text(node, source).to_string()),
        },
        "interface_type" => TypeExpr::Interface {
            open: named_children(node).is_empty(),
        },
        "parenthesized_type" => match named_children(node).first() {
            Some(inner) => lower_type(inner, source),
            None => TypeExpr::Other(node_text(node, source).to_string()),
        },
        _ => TypeExpr::Other(node_text(node, source).to_string()),
    }
}

fn lower_function(node: &Node, source: &str) -> Option<FuncDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let params = node
        .child_by_field_name("parameters")
        .map(|list| lower_params(&list, source))
        .unwrap_or_default();
    let results = match node.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => lower_params(&result, source),
        Some(result) => vec![Param {
            name: None,
            ty: lower_type(&result, source),
        }],
        None => Vec::new(),
    };
    Some(FuncDecl {
        name,
        params,
        results,
    })
}

fn lower_params(list: &Node, source: &str) -> Vec<Param> {
    let mut params = Vec::new();
    for decl in named_children(list) {
        let Some(type_node) = decl.child_by_field_name("type") else {
            continue;
        };
        let ty = match decl.kind() {
            "parameter_declaration" => lower_type(&type_node, source),
            "variadic_parameter_declaration" => {
                TypeExpr::Other(format!("...{}", node_text(&type_node, source)))
            }
            _ => continue,
        };
        let names = field_children(&decl, "name");
        if names.is_empty() {
            params.push(Param { name: None, ty });
        } else {
            params.extend(names.iter().map(|n| Param {
                name: Some(node_text(n, source).to_string()),
                ty: ty.clone(),
            }));
        }
    }
    params
}

/// Value of a Go string literal, raw (backquoted) or interpreted
fn string_literal_value(text: &str) -> String {
    if let Some(raw) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        return raw.to_string();
    }
    unquote(text).unwrap_or_else(|| text.trim_matches('"').to_string())
}
