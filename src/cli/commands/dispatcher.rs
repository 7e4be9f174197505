//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandContext`] for what every command shares: settings and host
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::args::{Cli, Commands, ScenarioSelection, SetupArgs};
use crate::config::Settings;
use crate::error::Result;
use crate::host::{Host, HostContext, LiveHost, ScenarioHost, ScenarioTable};
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Success for exit code 0, failure otherwise.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Settings and host selection shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_root: PathBuf,
    pub settings: Settings,
    pub env_file: Option<PathBuf>,
    pub dry_run: bool,
    pub scenarios: Vec<ScenarioSelection>,
    pub scenario_file: Option<PathBuf>,
}

impl CommandContext {
    /// Defaults for a project: live host, default settings.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            settings: Settings::default(),
            env_file: None,
            dry_run: false,
            scenarios: Vec::new(),
            scenario_file: None,
        }
    }

    /// Build from parsed arguments, loading the settings file.
    pub fn from_cli(cli: &Cli, project_root: PathBuf) -> Result<Self> {
        let settings = Settings::load(cli.config.as_deref(), &project_root)?;
        Ok(Self {
            project_root,
            settings,
            env_file: cli.env_file.clone(),
            dry_run: cli.is_dry_run(),
            scenarios: cli.scenarios(),
            scenario_file: cli.scenario_file.clone(),
        })
    }

    /// Probe context for the live host.
    pub fn host_context(&self) -> HostContext {
        let ctx = HostContext::new(&self.project_root, self.settings.clone());
        match &self.env_file {
            Some(path) => ctx.with_env_path(path),
            None => ctx,
        }
    }

    /// The live host, or a scenario host for dry runs.
    ///
    /// Unknown scenario selections and unreadable scenario files are errors.
    pub fn build_host(&self) -> Result<Box<dyn Host>> {
        if !self.dry_run {
            return Ok(Box::new(LiveHost::new(self.host_context())));
        }

        let mut table = ScenarioTable::builtin();
        if let Some(path) = &self.scenario_file {
            table.extend_from_file(path)?;
        }
        let mut host = ScenarioHost::new(table);
        for selection in &self.scenarios {
            host.select(&selection.probe, selection.index)?;
        }
        debug!(selections = self.scenarios.len(), "dry-run host");
        Ok(Box::new(host))
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.context.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it. No subcommand runs `setup`.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        match &cli.command {
            Some(Commands::Check(args)) => {
                super::check::CheckCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Setup(args)) => {
                super::setup::SetupCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Component(args)) => {
                super::component::ComponentCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => super::list::ListCommand::new(args.clone()).execute(ui),
            None => super::setup::SetupCommand::new(ctx, SetupArgs::default()).execute(ui),
        }
    }
}
