//! Configuration for readycheck.
//!
//! Two kinds of configuration live here:
//! - [`Settings`]: how the checker itself behaves, loaded from an optional
//!   `readycheck.yml` in the project root
//! - [`EnvFile`]: the game backend's `.env`, the only durable state the
//!   checker reads and writes
//!
//! # Example
//!
//! ```
//! use readycheck::config::Settings;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("readycheck.yml"), "backend_dir: server").unwrap();
//!
//! let settings = Settings::load(None, temp.path()).unwrap();
//! assert_eq!(settings.backend_dir, std::path::PathBuf::from("server"));
//! assert_eq!(settings.mysql.client, "mysql");
//! ```

pub mod env_file;
pub mod placeholder;
pub mod settings;

pub use env_file::{update_env_value, EnvFile};
pub use placeholder::is_placeholder;
pub use settings::{
    LlmSettings, MysqlSettings, Settings, TimeoutSettings, VersionSettings, SETTINGS_FILE,
};
