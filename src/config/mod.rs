//! Generator configuration.
//!
//! Every key has a default, so an empty (or absent) `.map2struct.toml`
//! reproduces the conventional `MapTo` / `gen` / `cast` setup.

mod loader;

pub use loader::{
    directory_ancestors, load_config, load_config_from_path, parse_config, CONFIG_FILE_NAME,
    MAX_TRAVERSAL_DEPTH,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenConfig {
    /// Name prefix of the functions to generate for
    #[serde(default = "default_function_prefix")]
    pub function_prefix: String,

    /// Prepended to a source function's name to name the generated one
    #[serde(default = "default_generated_prefix")]
    pub generated_prefix: String,

    /// Name of the generated function's map parameter
    #[serde(default = "default_param_name")]
    pub param_name: String,

    /// Struct tag key holding the map key name
    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    /// Import path of the value conversion helpers
    #[serde(default = "default_conversion_import")]
    pub conversion_import: String,

    /// Prefix of conversion helper calls; the capitalised primitive name is appended
    #[serde(default = "default_conversion_prefix")]
    pub conversion_prefix: String,

    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Run the generated text through a formatter
    #[serde(default = "default_format")]
    pub format: bool,

    /// Formatters to try, first one found on `PATH` wins
    #[serde(default = "default_formatters")]
    pub formatters: Vec<String>,

    /// Overrides the toolchain's GOROOT for standard-library lookups
    #[serde(default)]
    pub goroot: Option<PathBuf>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            function_prefix: default_function_prefix(),
            generated_prefix: default_generated_prefix(),
            param_name: default_param_name(),
            tag_key: default_tag_key(),
            conversion_import: default_conversion_import(),
            conversion_prefix: default_conversion_prefix(),
            output_suffix: default_output_suffix(),
            format: default_format(),
            formatters: default_formatters(),
            goroot: None,
        }
    }
}

impl GenConfig {
    /// Local package name of the conversion helpers, e.g. `cast` for `cast.To`
    pub fn conversion_package(&self) -> Option<&str> {
        self.conversion_prefix
            .rsplit_once('.')
            .map(|(package, _)| package)
            .filter(|package| !package.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        let identifiers = [
            ("function_prefix", &self.function_prefix),
            ("generated_prefix", &self.generated_prefix),
            ("param_name", &self.param_name),
        ];
        for (key, value) in identifiers {
            if !is_go_identifier(value) {
                return Err(format!("{key} {value:?} is not a Go identifier"));
            }
        }
        if self.tag_key.is_empty() {
            return Err("tag_key must not be empty".to_string());
        }
        if self.conversion_prefix.is_empty() {
            return Err("conversion_prefix must not be empty".to_string());
        }
        Ok(())
    }
}

fn is_go_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn default_function_prefix() -> String {
    "MapTo".to_string()
}

fn default_generated_prefix() -> String {
    "gen".to_string()
}

fn default_param_name() -> String {
    "src".to_string()
}

fn default_tag_key() -> String {
    "json".to_string()
}

fn default_conversion_import() -> String {
    "github.com/spf13/cast".to_string()
}

fn default_conversion_prefix() -> String {
    "cast.To".to_string()
}

fn default_output_suffix() -> String {
    "_gen".to_string()
}

fn default_format() -> bool {
    true
}

fn default_formatters() -> Vec<String> {
    vec!["goimports".to_string(), "gofmt".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenConfig::default();
        assert_eq!(config.function_prefix, "MapTo");
        assert_eq!(config.conversion_package(), Some("cast"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let config = GenConfig {
            param_name: "1src".into(),
            ..GenConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("param_name"));

        let config = GenConfig {
            function_prefix: String::new(),
            ..GenConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conversion_package_without_qualifier() {
        let config = GenConfig {
            conversion_prefix: "To".into(),
            ..GenConfig::default()
        };
        assert_eq!(config.conversion_package(), None);
    }
}
