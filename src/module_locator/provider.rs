//! Module metadata from the Go toolchain.
//!
//! The locator treats metadata as a black-box key -> record lookup. The
//! production implementation shells out to `go list -m -json`; tests use
//! an in-memory provider.

use crate::errors::{Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Resolved identity of a module, as reported by `go list -m -json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModuleInfo {
    /// Module path
    pub path: String,
    pub version: Option<String>,
    /// Directory holding the module's files, if downloaded
    pub dir: Option<PathBuf>,
    pub go_mod: Option<PathBuf>,
    pub go_version: Option<String>,
    /// Is this the main module?
    pub main: bool,
    pub indirect: bool,
    /// Replacement module, when a `replace` directive applies
    pub replace: Option<Box<ModuleInfo>>,
}

impl ModuleInfo {
    /// Directory packages of this module live in, honouring `replace`
    pub fn effective_dir(&self) -> Option<&Path> {
        self.replace
            .as_ref()
            .and_then(|r| r.dir.as_deref())
            .or(self.dir.as_deref())
    }
}

/// Parse the JSON record printed by `go list -m -json`
pub fn parse_module_info(json: &str) -> Result<ModuleInfo> {
    Ok(serde_json::from_str(json)?)
}

/// Source of module metadata.
pub trait ModuleMetadataProvider {
    /// Look up a module by path; the empty path means the main module.
    /// `Ok(None)` means the path is unknown to the metadata source.
    fn query(&self, module_path: &str) -> Result<Option<ModuleInfo>>;

    /// Root of the Go installation (`GOROOT`)
    fn goroot(&self) -> Option<PathBuf>;
}

/// Metadata provider backed by the `go` command.
///
/// The executable is looked up on the first query, so runs that only
/// touch absolute or standard library paths work without it.
pub struct GoListProvider {
    program: String,
    go_path: OnceCell<std::result::Result<PathBuf, String>>,
    work_dir: PathBuf,
}

impl GoListProvider {
    /// Run queries with `go` from `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_program("go", work_dir)
    }

    /// Run queries with `program` (a name looked up in `PATH`, or a path)
    pub fn with_program(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            go_path: OnceCell::new(),
            work_dir: work_dir.into(),
        }
    }

    fn go_path(&self) -> Result<&Path> {
        self.go_path
            .get_or_init(|| {
                which::which(&self.program).map_err(|e| format!("{} ({e})", self.program))
            })
            .as_deref()
            .map_err(|reason| Error::Toolchain(reason.clone()))
    }

    fn run(&self, args: &[&str]) -> Result<Option<String>> {
        let go_path = self.go_path()?;
        let output = Command::new(go_path)
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| Error::io(go_path, &e))?;

        if !output.status.success() {
            debug!(
                args = ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "go command failed"
            );
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl ModuleMetadataProvider for GoListProvider {
    fn query(&self, module_path: &str) -> Result<Option<ModuleInfo>> {
        let mut args = vec!["list", "-m", "-json"];
        if !module_path.is_empty() {
            args.push(module_path);
        }
        match self.run(&args)? {
            Some(stdout) if !stdout.trim().is_empty() => parse_module_info(&stdout).map(Some),
            _ => Ok(None),
        }
    }

    fn goroot(&self) -> Option<PathBuf> {
        if let Some(root) = std::env::var_os("GOROOT").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(root));
        }
        self.run(&["env", "GOROOT"])
            .ok()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}
