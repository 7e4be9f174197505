//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`readycheck check`, `readycheck setup`)
//! - Shared settings loading and host selection ([`CommandContext`])
//! - Consistent global flag handling

pub mod check;
pub mod component;
pub mod dispatcher;
pub mod list;
pub mod setup;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
