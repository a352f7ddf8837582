//! Configuration loading from cadence.toml
//!
//! Settings can be placed in a `cadence.toml` file in the project root. The
//! file is discovered by walking up from the current directory; command-line
//! flags override it.

use cadence_core::{Options, OptionsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up during discovery
pub const CONFIG_FILE: &str = "cadence.toml";

/// Errors while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has fields of the wrong type
    #[error("invalid {}: {source}", path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },
    /// The `[options]` table holds a bad value
    #[error("invalid [options]: {0}")]
    Options(#[from] OptionsError),
}

/// Cadence configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Options inherited by every case, e.g. `max_time = "2s"`
    #[serde(default)]
    pub options: toml::Table,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Profiling configuration
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Reporter name: "pretty", "csv", "json" or "json-summary"
    #[serde(default)]
    pub reporter: Option<String>,
}

/// Profiling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Only profile cases matching this pattern
    #[serde(default)]
    pub include: Option<String>,
    /// Where captured profiles are written
    #[serde(default = "default_profile_dir")]
    pub directory: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            include: None,
            directory: default_profile_dir(),
        }
    }
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("target/cadence/profiles")
}

impl CadenceConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find and load the nearest configuration file above the current directory
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Ok(None),
        }
    }

    /// Find and load the nearest configuration file at or above `start`
    pub fn discover_from(start: &Path) -> Result<Option<Self>, ConfigError> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                tracing::debug!(path = %config_path.display(), "Loading configuration");
                return Self::load(&config_path).map(Some);
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// The `[options]` table as typed root options
    pub fn root_options(&self) -> Result<Options, ConfigError> {
        Ok(Options::from_table(&self.options)?)
    }

    /// Generate a starter configuration
    pub fn default_toml() -> String {
        r#"# Cadence Configuration

[options]
# Upper bound on time spent measuring one case
max_time = "5s"
# Minimum duration of one sampled cycle
min_time = "50ms"
# Minimum number of samples per case
min_samples = 5
# Iterations in the first cycle
init_count = 1
# Pause between cycles
delay = "5ms"

[output]
# Reporter: pretty, csv, json or json-summary
reporter = "pretty"

[profile]
# Only profile cases whose name matches (uncomment to enable)
# include = "parse"
# Directory for captured profiles
directory = "target/cadence/profiles"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CadenceConfig::default();
        assert!(config.options.is_empty());
        assert_eq!(config.output.reporter, None);
        assert_eq!(config.profile.directory, PathBuf::from("target/cadence/profiles"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [options]
            max_time = "2s"
            min_samples = 10
            colour = "blue"

            [output]
            reporter = "json"
        "#;

        let config: CadenceConfig = toml::from_str(toml_str).unwrap();
        let options = config.root_options().unwrap();

        assert_eq!(options.max_time(), Some(Duration::from_secs(2)));
        assert_eq!(options.min_samples(), Some(10));
        assert_eq!(config.output.reporter.as_deref(), Some("json"));
        // Defaults should still apply
        assert_eq!(config.profile.include, None);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: CadenceConfig = toml::from_str(&CadenceConfig::default_toml()).unwrap();
        let options = config.root_options().unwrap();
        assert_eq!(options.delay(), Some(Duration::from_millis(5)));
        assert_eq!(config.output.reporter.as_deref(), Some("pretty"));
    }

    #[test]
    fn test_bad_option_value() {
        let config: CadenceConfig = toml::from_str("[options]\nmin_samples = \"many\"").unwrap();
        assert!(matches!(config.root_options(), Err(ConfigError::Options(_))));
    }

    #[test]
    fn test_discover_walks_up() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(CONFIG_FILE), "[output]\nreporter = \"csv\"\n").unwrap();

        let config = CadenceConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.output.reporter.as_deref(), Some("csv"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join(CONFIG_FILE), "[output\n").unwrap();

        let err = CadenceConfig::discover_from(root.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
