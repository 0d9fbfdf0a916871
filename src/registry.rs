//! Package Registry: memoized, lazily parsed compilation units.
//!
//! A package is located and parsed the first time some caller asks for
//! it; afterwards every caller receives the same `Arc`. Parse failures
//! are memoized as well, so a broken dependency is reported once per
//! import path rather than once per reference.

use crate::errors::{Error, Result};
use crate::module_locator::ModuleLocator;
use crate::parser::{self, CompilationUnit};
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct PackageRegistry {
    locator: ModuleLocator,
    /// Import path (or absolute directory) -> parsed unit
    units: DashMap<String, Arc<CompilationUnit>>,
    failures: DashMap<String, Error>,
    parsed: AtomicUsize,
}

impl PackageRegistry {
    pub fn new(locator: ModuleLocator) -> Self {
        Self {
            locator,
            units: DashMap::new(),
            failures: DashMap::new(),
            parsed: AtomicUsize::new(0),
        }
    }

    pub fn locator(&self) -> &ModuleLocator {
        &self.locator
    }

    /// Open the package behind an import path.
    ///
    /// An empty path and the cgo pseudo package yield `Ok(None)`: callers
    /// treat them as "no package". Locator failures are returned as
    /// `UnresolvedModule`; parse failures as `Parse`.
    pub fn get(&self, import_path: &str) -> Result<Option<Arc<CompilationUnit>>> {
        if import_path.is_empty() {
            return Ok(None);
        }
        if let Some(unit) = self.units.get(import_path) {
            return Ok(Some(Arc::clone(unit.value())));
        }
        if let Some(err) = self.failures.get(import_path) {
            return Err(err.value().clone());
        }

        let Some(dir) = self.locator.resolve(import_path)? else {
            return Ok(None);
        };

        self.parsed.fetch_add(1, Ordering::SeqCst);
        match parser::parse_directory(&dir, import_path) {
            Ok(unit) => {
                let unit = self
                    .units
                    .entry(import_path.to_string())
                    .or_insert_with(|| Arc::new(unit))
                    .value()
                    .clone();
                Ok(Some(unit))
            }
            Err(err) => {
                debug!(import_path, error = %err, "package failed to parse");
                self.failures.insert(import_path.to_string(), err.clone());
                Err(err)
            }
        }
    }

    /// Open the package containing a source file. The unit is keyed by
    /// the file's absolute directory.
    pub fn open_file(&self, file: &Path) -> Result<Arc<CompilationUnit>> {
        let dir = file
            .parent()
            .filter(|d| d.is_absolute())
            .ok_or_else(|| Error::parse(file, "input must be an absolute file path"))?;
        let key = dir.to_string_lossy().into_owned();
        self.get(&key)?
            .ok_or_else(|| Error::parse(file, "no package found for input file"))
    }

    /// Open the package a local name refers to inside `unit`.
    ///
    /// Names missing from the import table are matched against the
    /// declared package names of the unit's imports, opening them on
    /// demand. Failures while probing are not errors: the name is simply
    /// not found.
    pub fn resolve_import(
        &self,
        unit: &CompilationUnit,
        local_name: &str,
    ) -> Result<Option<Arc<CompilationUnit>>> {
        if let Some(path) = unit.import_path_of(local_name) {
            return self.get(path);
        }

        for path in unit.import_paths() {
            if parser::default_package_name(path) == local_name {
                continue;
            }
            match self.get(path) {
                Ok(Some(candidate)) if candidate.name == local_name => {
                    debug!(local_name, import_path = path, "matched package by declared name");
                    return Ok(Some(candidate));
                }
                Ok(_) => {}
                Err(err) => debug!(import_path = path, error = %err, "skipping import while probing"),
            }
        }
        Ok(None)
    }

    /// Number of directories handed to the parser so far
    pub fn parsed_count(&self) -> usize {
        self.parsed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_locator::{ModuleInfo, ModuleMetadataProvider};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    struct MainOnly {
        dir: PathBuf,
        queries: Arc<AtomicUsize>,
    }

    impl ModuleMetadataProvider for MainOnly {
        fn query(&self, module_path: &str) -> Result<Option<ModuleInfo>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(module_path.is_empty().then(|| ModuleInfo {
                path: "example.com/app".into(),
                dir: Some(self.dir.clone()),
                main: true,
                ..ModuleInfo::default()
            }))
        }

        fn goroot(&self) -> Option<PathBuf> {
            None
        }
    }

    fn registry(dir: &Path) -> (PackageRegistry, Arc<AtomicUsize>) {
        let queries = Arc::new(AtomicUsize::new(0));
        let provider = MainOnly {
            dir: dir.to_path_buf(),
            queries: Arc::clone(&queries),
        };
        (
            PackageRegistry::new(ModuleLocator::new(Box::new(provider))),
            queries,
        )
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_empty_path_is_no_package() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (registry, queries) = registry(tmp.path());
        assert!(registry.get("").unwrap().is_none());
        assert_eq!(queries.load(Ordering::SeqCst), 0);
        assert_eq!(registry.parsed_count(), 0);
    }

    #[test]
    fn test_cache_hit_returns_same_unit() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(tmp.path(), "model/model.go", "package model\n\ntype Book struct{}\n");
        let (registry, queries) = registry(tmp.path());

        let first = registry.get("example.com/app/model").unwrap().unwrap();
        let queries_after_first = queries.load(Ordering::SeqCst);
        let second = registry.get("example.com/app/model").unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(queries.load(Ordering::SeqCst), queries_after_first);
        assert_eq!(registry.parsed_count(), 1);
    }

    #[test]
    fn test_parse_failure_is_memoized() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(tmp.path(), "broken/x.go", "package broken\n\ntype X struct {\n");
        let (registry, _) = registry(tmp.path());

        assert!(matches!(registry.get("example.com/app/broken"), Err(Error::Parse { .. })));
        assert!(matches!(registry.get("example.com/app/broken"), Err(Error::Parse { .. })));
        assert_eq!(registry.parsed_count(), 1);
    }

    #[test]
    fn test_cgo_import_is_no_package() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (registry, _) = registry(tmp.path());
        assert!(registry.get("C").unwrap().is_none());
    }

    #[test]
    fn test_open_file_and_resolve_alias() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(
            tmp.path(),
            "gen/gen.go",
            "package gen\n\nimport m \"example.com/app/model\"\n\nvar _ m.Book\n",
        );
        write(tmp.path(), "model/model.go", "package model\n\ntype Book struct{}\n");
        let (registry, _) = registry(tmp.path());

        let unit = registry.open_file(&tmp.path().join("gen/gen.go")).unwrap();
        assert_eq!(unit.name, "gen");
        let by_alias = registry.resolve_import(&unit, "m").unwrap().unwrap();
        let by_default = registry.resolve_import(&unit, "model").unwrap().unwrap();
        assert!(Arc::ptr_eq(&by_alias, &by_default));
        assert!(registry.resolve_import(&unit, "nothere").unwrap().is_none());
    }

    #[test]
    fn test_resolve_import_checks_declared_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(
            tmp.path(),
            "gen/gen.go",
            "package gen\n\nimport \"example.com/app/go-models\"\n",
        );
        write(tmp.path(), "go-models/m.go", "package models\n\ntype Book struct{}\n");
        let (registry, _) = registry(tmp.path());

        let unit = registry.open_file(&tmp.path().join("gen/gen.go")).unwrap();
        let models = registry.resolve_import(&unit, "models").unwrap().unwrap();
        assert_eq!(models.name, "models");
    }
}
