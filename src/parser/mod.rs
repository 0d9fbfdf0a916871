//! Go declaration parser.
//!
//! Parses every non-test `.go` file of a directory with the tree-sitter Go
//! grammar and merges the lowered declarations into one
//! [`CompilationUnit`].

pub mod ast;
mod lower;
pub mod tag;
mod unit;

pub use ast::{FileDecls, FuncDecl, ImportSpec, Param, StructField, TypeDecl, TypeExpr, TypeSpec};
pub use lower::{node_column, node_line, node_text};
pub use tag::StructTag;
pub use unit::{default_package_name, CompilationUnit};

use crate::errors::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::{Language, Parser};
use walkdir::WalkDir;

fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

fn new_parser(path: &Path) -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&go_language())
        .map_err(|e| Error::parse(path, format!("failed to load Go grammar: {e}")))?;
    Ok(parser)
}

/// Parse one Go source text into its declarations
pub fn parse_source(content: &str, path: &Path) -> Result<FileDecls> {
    let mut parser = new_parser(path)?;
    parse_with(&mut parser, content, path)
}

fn parse_with(parser: &mut Parser, content: &str, path: &Path) -> Result<FileDecls> {
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| Error::parse(path, "parser produced no tree"))?;
    let root = tree.root_node();

    if let Some(bad) = lower::first_error(root) {
        let message = if bad.is_missing() {
            format!("missing {}", bad.kind())
        } else {
            "syntax error".to_string()
        };
        return Err(Error::parse_at(
            path,
            node_line(&bad),
            node_column(&bad),
            message,
        ));
    }

    lower::lower_file(root, content, path)
}

/// Whether a directory entry is a Go source file the parser should read
pub fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go")
}

/// Source files of a directory in file-name order
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parse all non-test sources of `dir` into a compilation unit keyed by
/// `import_path`.
///
/// Files constrained with `//go:build ignore` are skipped. A directory
/// without usable source files is a parse error. When files disagree on
/// the package name, the name most files share wins, ties going to the
/// earliest file.
pub fn parse_directory(dir: &Path, import_path: &str) -> Result<CompilationUnit> {
    if !dir.is_dir() {
        return Err(Error::parse(dir, "not a directory"));
    }
    let files = source_files(dir)?;
    if files.is_empty() {
        return Err(Error::parse(dir, "no Go source files"));
    }

    let mut parser = new_parser(dir)?;
    let mut parsed: Vec<(PathBuf, FileDecls)> = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read_to_string(&file).map_err(|e| Error::io(&file, &e))?;
        if is_build_ignored(&content) {
            debug!(file = %file.display(), "skipping file excluded by build constraint");
            continue;
        }
        let decls = parse_with(&mut parser, &content, &file)?;
        parsed.push((file, decls));
    }

    let Some(package) = majority_package(&parsed) else {
        return Err(Error::parse(dir, "no Go source files"));
    };
    parsed.retain(|(file, decls)| {
        if decls.package == package {
            true
        } else {
            warn!(
                file = %file.display(),
                found = %decls.package,
                expected = %package,
                "skipping file from a different package"
            );
            false
        }
    });

    debug!(dir = %dir.display(), package = %package, files = parsed.len(), "parsed package");
    Ok(CompilationUnit::from_files(
        package,
        import_path.to_string(),
        dir,
        parsed,
    ))
}

/// Whether a build constraint above the package clause names the `ignore` tag
fn is_build_ignored(content: &str) -> bool {
    for line in content.lines().map(str::trim) {
        if line.starts_with("package ") {
            break;
        }
        let constraint = line
            .strip_prefix("//go:build")
            .or_else(|| line.strip_prefix("// +build"));
        if let Some(expr) = constraint {
            let mentions_ignore = expr
                .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .any(|tag| tag == "ignore");
            if mentions_ignore {
                return true;
            }
        }
    }
    false
}

fn majority_package(parsed: &[(PathBuf, FileDecls)]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (_, decls) in parsed {
        match counts.iter_mut().find(|(name, _)| *name == decls.package) {
            Some((_, count)) => *count += 1,
            None => counts.push((decls.package.as_str(), 1)),
        }
    }
    // max_by_key keeps the last maximum, so scan in reverse to prefer earlier files
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.to_string())
}
