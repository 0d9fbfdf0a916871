use super::ast::{FileDecls, FuncDecl, TypeDecl};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// All declarations of one package directory.
///
/// Built once per directory and immutable afterwards; the package
/// registry owns it and hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Declared package name
    pub name: String,
    /// Key the unit was opened under (import path or absolute directory)
    pub import_path: String,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    /// Local name -> import path. Holds both the default and the alias name.
    imports: BTreeMap<String, String>,
    /// Import path -> the name source code of this unit qualifies it with
    qualifiers: BTreeMap<String, String>,
    types: Vec<TypeDecl>,
    type_index: HashMap<String, usize>,
    functions: Vec<FuncDecl>,
}

impl CompilationUnit {
    /// Merge per-file declarations. All files must share `name`.
    pub fn from_files(
        name: String,
        import_path: String,
        dir: &Path,
        files: Vec<(PathBuf, FileDecls)>,
    ) -> Self {
        let mut unit = Self {
            name,
            import_path,
            dir: dir.to_path_buf(),
            files: Vec::with_capacity(files.len()),
            imports: BTreeMap::new(),
            qualifiers: BTreeMap::new(),
            types: Vec::new(),
            type_index: HashMap::new(),
            functions: Vec::new(),
        };

        for (path, decls) in files {
            unit.files.push(path);
            for import in decls.imports {
                let default_name = default_package_name(&import.path);
                unit.imports.insert(default_name.clone(), import.path.clone());
                let qualifier = match import.alias.as_deref() {
                    Some("_" | ".") => continue,
                    Some(alias) => {
                        unit.imports.insert(alias.to_string(), import.path.clone());
                        alias.to_string()
                    }
                    None => default_name,
                };
                unit.qualifiers.entry(import.path).or_insert(qualifier);
            }
            for decl in decls.types {
                if !unit.type_index.contains_key(&decl.name) {
                    unit.type_index.insert(decl.name.clone(), unit.types.len());
                    unit.types.push(decl);
                }
            }
            unit.functions.extend(decls.functions);
        }

        unit
    }

    /// Import path bound to a local package name
    pub fn import_path_of(&self, local_name: &str) -> Option<&str> {
        self.imports.get(local_name).map(String::as_str)
    }

    /// Name this unit's source uses for an imported package, if imported
    /// under a usable name
    pub fn qualifier_for(&self, import_path: &str) -> Option<&str> {
        self.qualifiers.get(import_path).map(String::as_str)
    }

    /// Import table entries in name order
    pub fn imports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct import paths in path order
    pub fn import_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.imports.values().map(String::as_str).collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.type_index.get(name).map(|&idx| &self.types[idx])
    }

    /// A type declaration whose underlying type is a struct literal
    pub fn find_struct(&self, name: &str) -> Option<&TypeDecl> {
        self.find_type(name).filter(|decl| decl.fields().is_some())
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// Top-level functions in file then declaration order
    pub fn functions(&self) -> &[FuncDecl] {
        &self.functions
    }
}

/// Package name Go assumes for an import path when no alias is given:
/// the last element, skipping a `/vN` major-version element and stripping
/// a `.vN` suffix (`gopkg.in/yaml.v3`).
pub fn default_package_name(import_path: &str) -> String {
    let mut segments: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| is_major_version(s)) {
        segments.pop();
    }
    let last = segments.last().copied().unwrap_or(import_path);
    match last.rsplit_once(".v") {
        Some((base, version))
            if !base.is_empty()
                && !version.is_empty()
                && version.chars().all(|c| c.is_ascii_digit()) =>
        {
            base.to_string()
        }
        _ => last.to_string(),
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
