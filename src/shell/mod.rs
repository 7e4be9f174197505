//! Process execution and platform detection.

pub mod command;
pub mod platform;

pub use command::{
    display_command, execute, CommandOptions, CommandResult, CommandRunner, SystemRunner,
};
pub use platform::{home_dir, is_ci, Platform};
