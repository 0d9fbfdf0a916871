//! Module Locator: maps a symbolic import path to a package directory.
//!
//! Resolution order:
//!
//! 1. absolute paths pass through (lexically cleaned)
//! 2. the cgo pseudo package `C` resolves to no location
//! 3. standard library packages under `$GOROOT/src`
//! 4. packages inside the main module, rewritten against its directory
//! 5. third-party modules from module metadata, trying successively
//!    shorter prefixes of the path and applying `replace` directories
//!
//! Metadata queries and resolved directories are memoized for the
//! lifetime of the locator, which is one generation run.

mod provider;

pub use provider::{parse_module_info, GoListProvider, ModuleInfo, ModuleMetadataProvider};

use crate::errors::{Error, Result};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

/// Import path of the cgo pseudo package
pub const CGO_PSEUDO_PACKAGE: &str = "C";

pub struct ModuleLocator {
    provider: Box<dyn ModuleMetadataProvider>,
    goroot_override: Option<PathBuf>,
    /// Top-level standard library directory name -> absolute path
    std_roots: OnceCell<HashMap<String, PathBuf>>,
    /// Query path -> metadata record (negative results included)
    modules: DashMap<String, Option<ModuleInfo>>,
    /// Import path -> resolved directory
    dirs: DashMap<String, Option<PathBuf>>,
}

impl ModuleLocator {
    pub fn new(provider: Box<dyn ModuleMetadataProvider>) -> Self {
        Self {
            provider,
            goroot_override: None,
            std_roots: OnceCell::new(),
            modules: DashMap::new(),
            dirs: DashMap::new(),
        }
    }

    /// Use this Go installation instead of asking the provider
    pub fn with_goroot(mut self, goroot: Option<PathBuf>) -> Self {
        self.goroot_override = goroot;
        self
    }

    /// Resolve an import path to its package directory.
    ///
    /// Returns `Ok(None)` for the cgo pseudo package. Any other path that
    /// no strategy can place is an `UnresolvedModule` error.
    pub fn resolve(&self, import_path: &str) -> Result<Option<PathBuf>> {
        if let Some(dir) = self.dirs.get(import_path) {
            return Ok(dir.value().clone());
        }

        let dir = self.resolve_uncached(import_path)?;
        trace!(import_path, dir = ?dir, "resolved import path");
        self.dirs
            .entry(import_path.to_string())
            .or_insert_with(|| dir.clone());
        Ok(dir)
    }

    fn resolve_uncached(&self, import_path: &str) -> Result<Option<PathBuf>> {
        if import_path == CGO_PSEUDO_PACKAGE {
            return Ok(None);
        }

        let path = Path::new(import_path);
        if path.is_absolute() {
            return Ok(Some(clean_path(path)));
        }

        if import_path.is_empty() {
            return Err(Error::unresolved_module(import_path, "empty import path"));
        }

        if let Some(dir) = self.std_package_dir(import_path) {
            return Ok(Some(dir));
        }

        if let Some(main) = self.main_module()? {
            if let (Some(rest), Some(dir)) =
                (strip_module_prefix(import_path, &main.path), main.dir.as_deref())
            {
                return Ok(Some(join_subpath(dir, rest)));
            }
        }

        self.resolve_dependency(import_path).map(Some)
    }

    fn resolve_dependency(&self, import_path: &str) -> Result<PathBuf> {
        let segments: Vec<&str> = import_path.split('/').collect();
        for n in (1..=segments.len()).rev() {
            let prefix = segments[..n].join("/");
            let Some(module) = self.lookup(&prefix)? else {
                continue;
            };

            let Some(rest) = strip_module_prefix(import_path, &module.path) else {
                debug!(import_path, module = %module.path, "module does not contain import path");
                continue;
            };
            let Some(dir) = module.effective_dir() else {
                return Err(Error::unresolved_module(
                    import_path,
                    format!(
                        "module {} is missing from the module cache (run go mod download?)",
                        module.path
                    ),
                ));
            };
            return Ok(join_subpath(dir, rest));
        }

        Err(Error::unresolved_module(
            import_path,
            "no module provides this package (forgot to go get?)",
        ))
    }

    /// The main module, if the run happens inside one
    pub fn main_module(&self) -> Result<Option<ModuleInfo>> {
        self.lookup("")
    }

    /// Memoized metadata query
    fn lookup(&self, module_path: &str) -> Result<Option<ModuleInfo>> {
        if let Some(cached) = self.modules.get(module_path) {
            return Ok(cached.value().clone());
        }

        let info = self.provider.query(module_path)?;
        debug!(module_path, found = info.is_some(), "queried module metadata");
        self.modules
            .entry(module_path.to_string())
            .or_insert_with(|| info.clone());
        Ok(info)
    }

    fn std_package_dir(&self, import_path: &str) -> Option<PathBuf> {
        let roots = self.std_roots.get_or_init(|| {
            let goroot = self
                .goroot_override
                .clone()
                .or_else(|| self.provider.goroot());
            goroot
                .map(|root| list_std_roots(&root.join("src")))
                .unwrap_or_default()
        });

        let (first, rest) = match import_path.split_once('/') {
            Some((first, rest)) => (first, Some(rest)),
            None => (import_path, None),
        };
        let root = roots.get(first)?;
        Some(match rest {
            Some(rest) => root.join(rest),
            None => root.clone(),
        })
    }
}

fn list_std_roots(src: &Path) -> HashMap<String, PathBuf> {
    let Ok(entries) = fs::read_dir(src) else {
        debug!(src = %src.display(), "standard library sources not found");
        return HashMap::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((name, entry.path()))
        })
        .collect()
}

/// Remainder of `import_path` below `module_path`, if it lies inside it
fn strip_module_prefix<'a>(import_path: &'a str, module_path: &str) -> Option<&'a str> {
    if module_path.is_empty() {
        return None;
    }
    let rest = import_path.strip_prefix(module_path)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn join_subpath(dir: &Path, rest: &str) -> PathBuf {
    if rest.is_empty() {
        dir.to_path_buf()
    } else {
        dir.join(rest)
    }
}

/// Lexically normalise `.` and `..` components
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
