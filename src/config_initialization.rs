//! Configuration initialization and hierarchy management

use std::path::PathBuf;

use crate::adapters::toml_config::ConfigFile;
use crate::domain::model::{EncoderCandidate, DEFAULT_FPS};
use crate::error::{TrimError, TrimResult};
use crate::output::today_date_tag;
use crate::utils::logging::{LogFormat, LogLevel, LogOutput, LoggingConfig, DEFAULT_LOG_FILE};
use crate::utils::path::DEFAULT_EXTENSIONS;

/// Default square output size
pub const DEFAULT_TARGET_SIZE: u32 = 448;
/// Default seek jump
pub const DEFAULT_SEEK_SECONDS: f64 = 5.0;

/// Environment variable naming an explicit config file
pub const ENV_CONFIG: &str = "BOXTRIM_CONFIG";
pub const ENV_DATE_TAG: &str = "BOXTRIM_DATE_TAG";
pub const ENV_LOG_LEVEL: &str = "BOXTRIM_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "BOXTRIM_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "BOXTRIM_LOG_OUTPUT";

/// Everything a trimming run needs, passed explicitly into the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target_size: u32,
    pub date_tag: String,
    pub extensions: Vec<String>,
    pub encoders: Vec<EncoderCandidate>,
    pub fallback_fps: f64,
    pub seek_seconds: f64,
    pub logging: LoggingConfig,
    /// Environment variables that overrode a lower layer, logged once the
    /// subscriber is installed
    pub env_overrides: Vec<&'static str>,
}

/// Values given on the command line (clap already folds in their env vars)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub target_size: Option<u32>,
}

impl SessionConfig {
    /// Built-in defaults
    pub fn with_defaults(date_tag: impl Into<String>) -> Self {
        Self {
            source_dir: PathBuf::from("videos"),
            output_dir: PathBuf::from("trimmed"),
            target_size: DEFAULT_TARGET_SIZE,
            date_tag: date_tag.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            encoders: EncoderCandidate::default_preferences(),
            fallback_fps: DEFAULT_FPS,
            seek_seconds: DEFAULT_SEEK_SECONDS,
            logging: LoggingConfig::default(),
            env_overrides: Vec::new(),
        }
    }

    /// Resolve the hierarchy: CLI > Env > File > Defaults.
    ///
    /// `env` looks up an environment variable; it is a parameter so the
    /// layering can be exercised without touching the process environment.
    pub fn resolve<E>(file: Option<ConfigFile>, env: E, cli: &CliOverrides) -> TrimResult<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::with_defaults(today_date_tag());
        let mut log_output: Option<LogOutput> = None;

        // File layer
        if let Some(file) = file {
            let session = file.session;
            if let Some(dir) = session.source_dir {
                config.source_dir = dir;
            }
            if let Some(dir) = session.output_dir {
                config.output_dir = dir;
            }
            if let Some(size) = session.target_size {
                config.target_size = size;
            }
            if let Some(tag) = session.date_tag {
                config.date_tag = tag;
            }
            if let Some(extensions) = session.extensions {
                config.extensions = extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect();
            }
            if let Some(encoders) = session.encoders {
                config.encoders = encoders
                    .iter()
                    .map(|name| name.parse())
                    .collect::<TrimResult<Vec<_>>>()?;
            }
            if let Some(fps) = session.fallback_fps {
                config.fallback_fps = fps;
            }
            if let Some(seconds) = session.seek_seconds {
                config.seek_seconds = seconds;
            }

            let logging = file.logging;
            if let Some(level) = logging.level {
                config.logging.level = LogLevel::parse(&level)?;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format)?;
            }
            if let Some(output) = logging.output {
                log_output = Some(LogOutput::parse(&output));
            }
        }

        // Env layer
        if let Some(tag) = env(ENV_DATE_TAG) {
            config.date_tag = tag;
            config.env_overrides.push(ENV_DATE_TAG);
        }
        if let Some(level) = env(ENV_LOG_LEVEL) {
            config.logging.level = LogLevel::parse(&level)?;
            config.env_overrides.push(ENV_LOG_LEVEL);
        }
        if let Some(format) = env(ENV_LOG_FORMAT) {
            config.logging.format = LogFormat::parse(&format)?;
            config.env_overrides.push(ENV_LOG_FORMAT);
        }
        if let Some(output) = env(ENV_LOG_OUTPUT) {
            log_output = Some(LogOutput::parse(&output));
            config.env_overrides.push(ENV_LOG_OUTPUT);
        }

        // CLI layer
        if let Some(dir) = &cli.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(size) = cli.target_size {
            config.target_size = size;
        }

        // The log follows the output folder unless placed explicitly
        config.logging.output =
            log_output.unwrap_or_else(|| LogOutput::File(config.output_dir.join(DEFAULT_LOG_FILE)));

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> TrimResult<()> {
        if self.target_size < 2 || self.target_size % 2 != 0 {
            return Err(TrimError::Config {
                message: format!(
                    "Target size must be an even number of at least 2, got {}",
                    self.target_size
                ),
            });
        }
        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(TrimError::Config {
                message: format!("Fallback fps must be positive, got {}", self.fallback_fps),
            });
        }
        if !(self.seek_seconds.is_finite() && self.seek_seconds > 0.0) {
            return Err(TrimError::Config {
                message: format!("Seek seconds must be positive, got {}", self.seek_seconds),
            });
        }
        if self.encoders.is_empty() {
            return Err(TrimError::Config {
                message: "Encoder preference list cannot be empty".to_string(),
            });
        }
        if self.extensions.is_empty() {
            return Err(TrimError::Config {
                message: "Video extension list cannot be empty".to_string(),
            });
        }
        if self.date_tag.trim().is_empty() {
            return Err(TrimError::Config {
                message: "Date tag cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
