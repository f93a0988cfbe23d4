//! Configuration for construction and writing
//!
//! Configuration lives in a TOML file:
//!
//! ```toml
//! [construct]
//! strict = false
//!
//! [writer]
//! indent = 2
//! final_newline = true
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::result::Result;

/// File names searched by [`ConfigLoader::auto_discover`], in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".ktastrc.toml", "ktast.toml"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KtastConfig {
    pub construct: ConstructOptions,
    pub writer: WriterOptions,
}

/// Options for building an AST from a parse tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstructOptions {
    /// Refuse parse trees that carry syntax errors
    pub strict: bool,
}

impl Default for ConstructOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

/// Options for canonical output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterOptions {
    /// Spaces per block level
    pub indent: usize,
    /// End canonical output with a newline
    pub final_newline: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            final_newline: false,
        }
    }
}

impl KtastConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_error(path, e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config { message } => Error::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                message
            )),
            other => other,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.writer.indent > 16 {
            return Err(Error::config_error(format!(
                "writer.indent must be at most 16, got {}",
                self.writer.indent
            )));
        }
        Ok(())
    }
}

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Find a config file in `start_path` or any of its ancestors
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| Error::io_error(start_path, e))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load config from an explicit path, or discover one from `start_dir`,
    /// falling back to defaults when nothing is found
    pub fn load(custom_path: Option<&Path>, start_dir: &Path) -> Result<KtastConfig> {
        if let Some(path) = custom_path {
            return KtastConfig::load(path);
        }
        match Self::auto_discover(start_dir)? {
            Some(path) => KtastConfig::load(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(KtastConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KtastConfig::default();
        assert!(config.construct.strict);
        assert_eq!(config.writer.indent, 4);
        assert!(!config.writer.final_newline);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = KtastConfig::from_toml_str("[writer]\nindent = 2\n").unwrap();
        assert_eq!(config.writer.indent, 2);
        assert!(!config.writer.final_newline);
        assert!(config.construct.strict);
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let err = KtastConfig::from_toml_str("[writer]\ntabs = true\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_indent_is_validated() {
        let err = KtastConfig::from_toml_str("[writer]\nindent = 40\n").unwrap_err();
        assert!(err.to_string().contains("writer.indent"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = KtastConfig::load(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("ktast.toml"),
            "[construct]\nstrict = false\n",
        )
        .unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert!(found.ends_with("ktast.toml"));

        let config = ConfigLoader::load(None, &nested).unwrap();
        assert!(!config.construct.strict);
    }

    #[test]
    fn test_explicit_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[writer]\nfinal_newline = true\n").unwrap();

        let config = ConfigLoader::load(Some(&path), temp_dir.path()).unwrap();
        assert!(config.writer.final_newline);
    }
}
