use crate::error::{Result, RuleCheckError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `Rule: <line>` followed by the findings and a blank line
    #[default]
    Text,
    /// One JSON object per rule
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Do not print rules that passed without findings
    #[serde(default)]
    pub quiet_ok: bool,
    /// Print a summary to stderr when done
    #[serde(default)]
    pub stats: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// 0 = pick from the number of CPUs
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    /// Skip lines starting with `#`
    #[serde(default)]
    pub skip_comments: bool,
    /// Skip empty and whitespace-only lines
    #[serde(default)]
    pub skip_blank: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            quiet_ok: false,
            stats: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            queue_size: default_queue_size(),
            skip_comments: false,
            skip_blank: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_queue_size() -> usize {
    1_024
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RuleCheckError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(RuleCheckError::ConfigError(format!(
                "Unknown log level '{}', expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        if self.validation.worker_threads > 1000 {
            return Err(RuleCheckError::ConfigError(
                "Worker threads cannot exceed 1000".to_string(),
            ));
        }

        if self.validation.queue_size == 0 {
            return Err(RuleCheckError::ConfigError(
                "Queue size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn default_config() -> Self {
        Settings {
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_config()
    }
}
