//! Component command implementation.
//!
//! The `readycheck component <name> [check|setup]` command runs the status
//! table or the fix flow for a single component.

use crate::checker;
use crate::cli::args::{ComponentAction, ComponentArgs};
use crate::components;
use crate::error::Result;
use crate::flow::{run_flow, FlowOutcome};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The component command implementation.
pub struct ComponentCommand {
    ctx: CommandContext,
    args: ComponentArgs,
}

impl ComponentCommand {
    /// Create a new component command.
    pub fn new(ctx: CommandContext, args: ComponentArgs) -> Self {
        Self { ctx, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ComponentArgs {
        &self.args
    }
}

impl Command for ComponentCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let component = components::find(&self.args.name)?;
        let mut host = self.ctx.build_host()?;
        ui.show_header(component.title);

        match self.args.action {
            ComponentAction::Check => {
                let outcome = checker::check_verbose(component, host.as_ref(), ui);
                if outcome.overall_ok {
                    ui.success(&format!("{} is ready", component.title));
                    Ok(CommandResult::success())
                } else {
                    ui.error(&format!("{} is not ready", component.title));
                    Ok(CommandResult::failure(1))
                }
            }
            ComponentAction::Setup => match run_flow(component, host.as_mut(), ui)? {
                FlowOutcome::Success => {
                    ui.success(&format!("{} is ready", component.title));
                    Ok(CommandResult::success())
                }
                FlowOutcome::Exited => Ok(CommandResult::success()),
                outcome => {
                    ui.warning(&format!("{}: {}", component.title, outcome));
                    Ok(CommandResult::failure(1))
                }
            },
        }
    }
}
