//! Error types for readycheck operations.
//!
//! This module defines [`ReadyError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Probes and remediations return `Result<CheckResult>`; the host seam
//!   turns any `Err` into a failed [`CheckResult`](crate::host::CheckResult)
//!   so nothing reaches the setup flow as an error
//! - `ReadyError` values that do escape are configuration or terminal
//!   problems and end the command with exit code 2
//! - Use `anyhow::Error` (via `ReadyError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for readycheck operations.
#[derive(Debug, Error)]
pub enum ReadyError {
    /// Settings file not found at the explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse a settings or scenario file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid settings values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// No component with this name exists in the registry.
    #[error("Unknown component '{name}' (available: {available})")]
    UnknownComponent { name: String, available: String },

    /// A dry-run scenario selection does not exist in the scenario table.
    #[error("No scenario {index} for probe '{probe}' ({available} available)")]
    UnknownScenario {
        probe: String,
        index: usize,
        available: usize,
    },

    /// The program could not be found on PATH.
    #[error("{program} not found on PATH")]
    CommandNotFound { program: String },

    /// The program could not be started or waited on.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// The program did not finish within its timeout and was killed.
    #[error("Command timed out after {seconds}s: {command}")]
    CommandTimedOut { command: String, seconds: u64 },

    /// A prompt needed an answer that a non-interactive session cannot give.
    #[error("Cannot prompt for '{key}' in non-interactive mode (no default value)")]
    PromptUnavailable { key: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for readycheck operations.
pub type Result<T> = std::result::Result<T, ReadyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = ReadyError::ConfigNotFound {
            path: PathBuf::from("/foo/readycheck.yml"),
        };
        assert!(err.to_string().contains("/foo/readycheck.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = ReadyError::ConfigParseError {
            path: PathBuf::from("/readycheck.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/readycheck.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn unknown_component_lists_available() {
        let err = ReadyError::UnknownComponent {
            name: "redis".into(),
            available: "node, mysql".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("redis"));
        assert!(msg.contains("node, mysql"));
    }

    #[test]
    fn unknown_scenario_displays_probe_and_index() {
        let err = ReadyError::UnknownScenario {
            probe: "mysql.service".into(),
            index: 7,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("mysql.service"));
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn command_not_found_reads_naturally() {
        let err = ReadyError::CommandNotFound {
            program: "nvidia-smi".into(),
        };
        assert_eq!(err.to_string(), "nvidia-smi not found on PATH");
    }

    #[test]
    fn command_timed_out_displays_seconds() {
        let err = ReadyError::CommandTimedOut {
            command: "npm install".into(),
            seconds: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("300s"));
        assert!(msg.contains("npm install"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ReadyError = io_err.into();
        assert!(matches!(err, ReadyError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(ReadyError::ConfigValidationError {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
