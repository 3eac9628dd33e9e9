// TOML config adapter - Configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{TrimError, TrimResult};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "boxtrim.toml";

/// Contents of a `boxtrim.toml` file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub session: SessionSection,
    pub logging: LoggingSection,
}

/// `[session]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub target_size: Option<u32>,
    pub date_tag: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub encoders: Option<Vec<String>>,
    pub fallback_fps: Option<f64>,
    pub seek_seconds: Option<f64>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
    /// `stderr` or a file path
    pub output: Option<String>,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse config file contents
    pub fn parse(content: &str) -> TrimResult<ConfigFile> {
        toml::from_str(content).map_err(|e| TrimError::Config {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> TrimResult<ConfigFile> {
        let content = std::fs::read_to_string(path).map_err(|e| TrimError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Resolve which config file to read.
    ///
    /// An explicit path must exist; otherwise the default file is used only
    /// when present in `working_dir`.
    pub fn locate(explicit: Option<PathBuf>, working_dir: &Path) -> TrimResult<Option<PathBuf>> {
        match explicit {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => Err(TrimError::Config {
                message: format!("Config file does not exist: {}", path.display()),
            }),
            None => {
                let candidate = working_dir.join(DEFAULT_CONFIG_FILE);
                Ok(candidate.is_file().then_some(candidate))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_file() {
        let config = TomlConfigAdapter::parse(
            r#"
            [session]
            source_dir = "downloads"
            output_dir = "trimmed"
            target_size = 224
            date_tag = "14_april"
            extensions = ["mp4"]
            encoders = ["mpeg4"]
            fallback_fps = 25.0
            seek_seconds = 2.5

            [logging]
            level = "debug"
            format = "json"
            output = "stderr"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.source_dir, Some(PathBuf::from("downloads")));
        assert_eq!(config.session.target_size, Some(224));
        assert_eq!(config.session.encoders, Some(vec!["mpeg4".to_string()]));
        assert_eq!(config.session.seek_seconds, Some(2.5));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_parse_empty_file() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = TomlConfigAdapter::parse("[session]\ntarget = 3\n");
        assert!(matches!(result, Err(TrimError::Config { .. })));
    }

    #[test]
    fn test_locate_default_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(TomlConfigAdapter::locate(None, dir.path()).unwrap(), None);

        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "").unwrap();
        assert_eq!(TomlConfigAdapter::locate(None, dir.path()).unwrap(), Some(path));
    }

    #[test]
    fn test_locate_missing_explicit_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(TomlConfigAdapter::locate(Some(missing), dir.path()).is_err());
    }
}
