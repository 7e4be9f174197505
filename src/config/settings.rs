//! Checker settings.
//!
//! Everything the probes would otherwise hard-code (service names, search
//! directories, minimum versions, timeouts) lives here so it can be
//! overridden from `readycheck.yml` and replaced with fixtures in tests.
//! Every field has a default; an absent file means all defaults.

use crate::driver::DEFAULT_PARTIAL_THRESHOLD;
use crate::error::{ReadyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings file name looked up in the project root.
pub const SETTINGS_FILE: &str = "readycheck.yml";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Env file the backend reads (relative to project root)
    pub env_file: PathBuf,

    /// Backend directory containing package.json (relative to project root)
    pub backend_dir: PathBuf,

    /// Database settings
    pub mysql: MysqlSettings,

    /// Python / model settings
    pub llm: LlmSettings,

    /// Minimum accepted tool versions
    pub versions: VersionSettings,

    /// Process timeouts
    pub timeouts: TimeoutSettings,

    /// Fraction of components that must pass for a "mostly ready" verdict
    pub partial_threshold: f64,

    /// Attempts allowed when re-entering the database password
    pub max_password_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env"),
            backend_dir: PathBuf::from("backend"),
            mysql: MysqlSettings::default(),
            llm: LlmSettings::default(),
            versions: VersionSettings::default(),
            timeouts: TimeoutSettings::default(),
            partial_threshold: DEFAULT_PARTIAL_THRESHOLD,
            max_password_attempts: 3,
        }
    }
}

/// MySQL server and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlSettings {
    /// Client binary
    pub client: String,
    /// Service names tried in order (Windows services / systemd units)
    pub service_names: Vec<String>,
    /// Host used when DB_HOST is not set
    pub default_host: String,
    /// Port used when DB_PORT is not set
    pub default_port: u16,
    /// User suggested when configuring
    pub default_user: String,
    /// Database name suggested when configuring
    pub default_database: String,
}

impl Default for MysqlSettings {
    fn default() -> Self {
        Self {
            client: "mysql".to_string(),
            service_names: vec![
                "MySQL80".to_string(),
                "MySQL".to_string(),
                "mysql".to_string(),
                "mysqld".to_string(),
                "mariadb".to_string(),
            ],
            default_host: "localhost".to_string(),
            default_port: 3306,
            default_user: "root".to_string(),
            default_database: "game".to_string(),
        }
    }
}

/// Python interpreter and model file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Interpreter commands tried in order
    pub python_commands: Vec<String>,
    /// Directories searched for model files (relative to project root)
    pub model_search_dirs: Vec<PathBuf>,
    /// Expected model extension
    pub model_extension: String,
    /// Smaller files are treated as truncated downloads
    pub min_model_bytes: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let python_commands = if cfg!(target_os = "windows") {
            vec!["python", "py", "python3"]
        } else {
            vec!["python3", "python"]
        };

        Self {
            python_commands: python_commands.into_iter().map(String::from).collect(),
            model_search_dirs: vec![
                PathBuf::from("models"),
                PathBuf::from("backend/models"),
            ],
            model_extension: "gguf".to_string(),
            min_model_bytes: 1024 * 1024,
        }
    }
}

/// Minimum versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionSettings {
    pub node_major: u32,
    pub python: String,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            node_major: 18,
            python: "3.8".to_string(),
        }
    }
}

/// Timeouts in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Service queries and other instant tools
    pub quick_secs: u64,
    /// Version checks and imports
    pub probe_secs: u64,
    /// Package installs
    pub install_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            quick_secs: 5,
            probe_secs: 15,
            install_secs: 600,
        }
    }
}

impl TimeoutSettings {
    pub fn quick(&self) -> Duration {
        Duration::from_secs(self.quick_secs)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, `readycheck.yml` in the
    /// project root is used when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        let path = match explicit {
            Some(p) if !p.exists() => {
                return Err(ReadyError::ConfigNotFound {
                    path: p.to_path_buf(),
                })
            }
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = project_root.join(SETTINGS_FILE);
                if !candidate.exists() {
                    debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = fs::read_to_string(&path)?;
        let settings = Self::parse(&content).map_err(|message| ReadyError::ConfigParseError {
            path: path.clone(),
            message,
        })?;
        settings.validate()?;

        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse settings YAML. An empty document yields defaults.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Reject values that would make the checker misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.partial_threshold) {
            return Err(ReadyError::ConfigValidationError {
                message: format!(
                    "partial_threshold must be between 0 and 1, got {}",
                    self.partial_threshold
                ),
            });
        }
        if self.max_password_attempts == 0 {
            return Err(ReadyError::ConfigValidationError {
                message: "max_password_attempts must be at least 1".to_string(),
            });
        }
        if self.llm.python_commands.is_empty() {
            return Err(ReadyError::ConfigValidationError {
                message: "llm.python_commands must list at least one interpreter".to_string(),
            });
        }
        if self.timeouts.quick_secs == 0
            || self.timeouts.probe_secs == 0
            || self.timeouts.install_secs == 0
        {
            return Err(ReadyError::ConfigValidationError {
                message: "timeouts must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(None, temp.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.partial_threshold, 0.75);
        assert_eq!(settings.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let yaml = r#"
backend_dir: server
mysql:
  service_names: [MySQL84]
timeouts:
  install_secs: 120
"#;
        let settings = Settings::parse(yaml).unwrap();
        assert_eq!(settings.backend_dir, PathBuf::from("server"));
        assert_eq!(settings.mysql.service_names, vec!["MySQL84".to_string()]);
        assert_eq!(settings.mysql.client, "mysql");
        assert_eq!(settings.timeouts.install_secs, 120);
        assert_eq!(settings.timeouts.quick_secs, 5);
    }

    #[test]
    fn loads_from_project_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "max_password_attempts: 5\n").unwrap();

        let settings = Settings::load(None, temp.path()).unwrap();
        assert_eq!(settings.max_password_attempts, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = Settings::load(Some(&temp.path().join("nope.yml")), temp.path()).unwrap_err();
        assert!(matches!(err, ReadyError::ConfigNotFound { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "mysql: [unclosed\n").unwrap();

        let err = Settings::load(None, temp.path()).unwrap_err();
        assert!(matches!(err, ReadyError::ConfigParseError { .. }));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "partial_threshold: 1.5\n").unwrap();

        let err = Settings::load(None, temp.path()).unwrap_err();
        assert!(matches!(err, ReadyError::ConfigValidationError { .. }));
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::parse("   \n").unwrap(), Settings::default());
    }

    #[test]
    fn timeout_durations() {
        let t = TimeoutSettings::default();
        assert_eq!(t.quick(), Duration::from_secs(5));
        assert_eq!(t.probe(), Duration::from_secs(15));
        assert_eq!(t.install(), Duration::from_secs(600));
    }
}
