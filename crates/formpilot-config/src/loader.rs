//! Configuration loader.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from a file if present, otherwise the fail-closed defaults.
    pub fn load_or_closed(path: &Path) -> Config {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "No usable configuration at {} ({}); using fail-closed defaults",
                    path.display(),
                    e
                );
                Config::default()
            }
        }
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        let threshold = config.planner.label_match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "planner.label_match_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        let confidence = config.executor.optical_confidence_threshold;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ConfigError::Invalid(format!(
                "executor.optical_confidence_threshold must be within [0, 1], got {}",
                confidence
            )));
        }
        if config.executor.wait_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "executor.wait_poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.formpilot`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}
