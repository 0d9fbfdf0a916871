// Shared fixtures for map2struct integration tests
#![allow(dead_code)]

use map2struct::{ModuleInfo, ModuleLocator, ModuleMetadataProvider, PackageRegistry, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MAIN_MODULE: &str = "example.com/shop";

/// In-memory module metadata: the main module at the fixture root plus
/// any registered dependencies. Counts every query.
pub struct FakeProvider {
    root: PathBuf,
    dependencies: HashMap<String, PathBuf>,
    queries: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dependencies: HashMap::new(),
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_dependency(mut self, module_path: &str, dir: PathBuf) -> Self {
        self.dependencies.insert(module_path.to_string(), dir);
        self
    }

    pub fn query_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.queries)
    }
}

impl ModuleMetadataProvider for FakeProvider {
    fn query(&self, module_path: &str) -> Result<Option<ModuleInfo>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if module_path.is_empty() {
            return Ok(Some(ModuleInfo {
                path: MAIN_MODULE.to_string(),
                dir: Some(self.root.clone()),
                main: true,
                ..ModuleInfo::default()
            }));
        }
        Ok(self.dependencies.get(module_path).map(|dir| ModuleInfo {
            path: module_path.to_string(),
            version: Some("v1.2.0".to_string()),
            dir: Some(dir.clone()),
            ..ModuleInfo::default()
        }))
    }

    fn goroot(&self) -> Option<PathBuf> {
        None
    }
}

/// A temporary Go module tree
pub struct GoTree {
    pub dir: tempfile::TempDir,
}

impl GoTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
        fs::write(path, content).expect("write fixture file");
        self
    }

    /// Registry over this tree with `github.com/acme/types` served from `deps/types`
    pub fn registry(&self) -> (PackageRegistry, Arc<AtomicUsize>) {
        let provider = FakeProvider::new(self.root())
            .with_dependency("github.com/acme/types", self.path("deps/types"));
        let queries = provider.query_counter();
        (
            PackageRegistry::new(ModuleLocator::new(Box::new(provider))),
            queries,
        )
    }
}
