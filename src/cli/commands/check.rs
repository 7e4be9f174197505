//! Check command implementation.
//!
//! The `readycheck check` command probes every component and reports,
//! changing nothing.

use crate::checker::render;
use crate::cli::args::CheckArgs;
use crate::components;
use crate::driver::{check_all, show_summary};
use crate::error::{ReadyError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    ctx: CommandContext,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(ctx: CommandContext, args: CheckArgs) -> Self {
        Self { ctx, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &CheckArgs {
        &self.args
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let host = self.ctx.build_host()?;
        let summary = check_all(
            components::registry(),
            host.as_ref(),
            self.ctx.settings.partial_threshold,
        );

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&summary).map_err(|e| ReadyError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::from_exit_code(summary.exit_code()));
        }

        if host.is_dry_run() {
            ui.warning("Dry run: results come from scenarios, not this machine");
        }
        for outcome in &summary.components {
            ui.show_header(&outcome.title);
            ui.message(&render::status_table(outcome));
            for line in render::details(outcome) {
                ui.message(&line);
            }
        }

        if !self.args.no_summary {
            show_summary(ui, &summary);
        }
        Ok(CommandResult::from_exit_code(summary.exit_code()))
    }
}
