//! Output location, formatting and persistence of the generated file.

use crate::errors::{Error, Result};
use crate::naming::to_snake_case;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Where the generated file goes.
///
/// `requested` ending in `.go` is taken as the file itself; any other
/// value is a directory. Without a request the input's directory is
/// used. The file name is the snake-cased input stem plus `suffix`.
pub fn derive_output_path(input: &Path, requested: Option<&Path>, suffix: &str) -> PathBuf {
    if let Some(path) = requested.filter(|p| p.extension().is_some_and(|e| e == "go")) {
        return path.to_path_buf();
    }

    let dir = requested
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}{suffix}.go", to_snake_case(&stem)))
}

/// Run `text` through the first formatter found on `PATH`.
///
/// No formatter available leaves the text as is. A formatter that
/// rejects the text is an `Emit` error.
pub fn post_process(text: &str, formatters: &[String]) -> Result<String> {
    let Some((name, binary)) = formatters
        .iter()
        .find_map(|name| which::which(name).ok().map(|path| (name, path)))
    else {
        warn!(?formatters, "no formatter found, writing unformatted output");
        return Ok(text.to_string());
    };

    debug!(formatter = %name, path = %binary.display(), "formatting generated code");
    run_formatter(&binary, text).map_err(|message| {
        debug!(text, "unformatted output");
        Error::emit(name.as_str(), message)
    })
}

fn run_formatter(binary: &Path, text: &str) -> std::result::Result<String, String> {
    let mut child = Command::new(binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start {}: {e}", binary.display()))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| "formatter stdin unavailable".to_string())?;
    let input = text.to_string();
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child
        .wait_with_output()
        .map_err(|e| format!("formatter did not finish: {e}"))?;
    writer
        .join()
        .map_err(|_| "formatter input thread panicked".to_string())?
        .map_err(|e| format!("failed to write to formatter: {e}"))?;

    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }
    String::from_utf8(output.stdout).map_err(|e| format!("formatter produced invalid UTF-8: {e}"))
}

/// Write the generated file, creating its directory when needed
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, &e))?;
    }
    fs::write(path, text).map_err(|e| Error::io(path, &e))?;
    info!(path = %path.display(), bytes = text.len(), "wrote generated file");
    Ok(())
}
