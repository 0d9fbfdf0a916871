use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::GenConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".map2struct.toml";

/// How many directories, starting with the input's own, are searched
pub const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse and validate a config from TOML text
pub fn parse_config(contents: &str) -> std::result::Result<GenConfig, String> {
    let config = toml::from_str::<GenConfig>(contents)
        .map_err(|e| format!("failed to parse {CONFIG_FILE_NAME}: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// `start` followed by its ancestors, at most `max_depth` directories
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load an explicitly requested config file; any failure is an error
pub fn load_config_from_path(path: &Path) -> Result<GenConfig> {
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
    let config =
        parse_config(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn try_load_config_from_path(path: &Path) -> Option<GenConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to read config file");
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!(path = %path.display(), "loaded config");
            Some(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring invalid config, using defaults");
            None
        }
    }
}

/// Find the nearest `.map2struct.toml` at or above `start_dir`.
/// Unreadable or invalid files are skipped with a warning.
pub fn load_config(start_dir: &Path) -> GenConfig {
    directory_ancestors(start_dir.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            debug!(
                depth = MAX_TRAVERSAL_DEPTH,
                "no config found, using defaults"
            );
            GenConfig::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);

        let all: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a"), 10).collect();
        assert_eq!(all, vec![PathBuf::from("/a"), PathBuf::from("/")]);
    }

    #[test]
    fn test_parse_config_partial_keys() {
        let config = parse_config(indoc! {r#"
            function_prefix = "Convert"
            formatters = ["gofmt"]
        "#})
        .unwrap();
        assert_eq!(config.function_prefix, "Convert");
        assert_eq!(config.formatters, vec!["gofmt".to_string()]);
        assert_eq!(config.tag_key, "json");
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        assert!(parse_config("prefix = \"X\"\n").is_err());
    }

    #[test]
    fn test_load_config_searches_ancestors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("pkg/gen");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "tag_key = \"map\"\n").unwrap();

        assert_eq!(load_config(&nested).tag_key, "map");
    }

    #[test]
    fn test_load_config_skips_invalid_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("gen");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(CONFIG_FILE_NAME), "tag_key = [\n").unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "tag_key = \"yaml\"\n").unwrap();

        assert_eq!(load_config(&nested).tag_key, "yaml");
    }

    #[test]
    fn test_explicit_path_must_parse() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "format = \"yes\"\n").unwrap();

        assert!(matches!(load_config_from_path(&path), Err(Error::Config(_))));
        assert!(matches!(
            load_config_from_path(&tmp.path().join("missing.toml")),
            Err(Error::Io { .. })
        ));
    }
}
