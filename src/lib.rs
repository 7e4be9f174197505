//! readycheck - Pre-flight checks and guided setup for the game.
//!
//! readycheck verifies everything the game needs on the player's machine
//! (Node.js, the web backend, MySQL, GPU drivers, a native toolchain and a
//! local LLM) and walks the player through fixing whatever is missing.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`checker`] - Running a component's probes and rendering the results
//! - [`components`] - The six component definitions and their registry
//! - [`config`] - Settings, `.env` editing and placeholder detection
//! - [`driver`] - The setup pass over every component and the verdict
//! - [`error`] - Error types and result aliases
//! - [`flow`] - The per-component check, diagnose and fix state machine
//! - [`host`] - Live and simulated access to the machine
//! - [`shell`] - Shell command execution
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use readycheck::components;
//! use readycheck::driver::{check_all, Verdict, DEFAULT_PARTIAL_THRESHOLD};
//! use readycheck::host::{ScenarioHost, ScenarioTable};
//!
//! // Simulate a machine whose MySQL service is stopped
//! let mut host = ScenarioHost::new(ScenarioTable::builtin());
//! host.select("mysql.service", 1).unwrap();
//!
//! let summary = check_all(components::registry(), &host, DEFAULT_PARTIAL_THRESHOLD);
//! assert_eq!(summary.ready, 5);
//! assert_eq!(summary.verdict, Verdict::Partial);
//! ```

pub mod checker;
pub mod cli;
pub mod components;
pub mod config;
pub mod driver;
pub mod error;
pub mod flow;
pub mod host;
pub mod shell;
pub mod ui;

pub use error::{ReadyError, Result};
