//! Setup command implementation.
//!
//! The `readycheck setup` command walks every failing component through
//! its fix flow. It is the default when no subcommand is given.

use crate::cli::args::SetupArgs;
use crate::components;
use crate::driver::SetupDriver;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The setup command implementation.
pub struct SetupCommand {
    ctx: CommandContext,
    args: SetupArgs,
}

impl SetupCommand {
    /// Create a new setup command.
    pub fn new(ctx: CommandContext, args: SetupArgs) -> Self {
        Self { ctx, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &SetupArgs {
        &self.args
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut host = self.ctx.build_host()?;
        if host.is_dry_run() {
            ui.warning("Dry run: nothing on this machine will be changed");
        }

        let report = SetupDriver::new(components::registry())
            .with_threshold(self.ctx.settings.partial_threshold)
            .with_final_check(!self.args.no_final_check)
            .run(host.as_mut(), ui)?;

        Ok(CommandResult::from_exit_code(report.exit_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    fn dry_run(selections: &[&str]) -> CommandContext {
        let mut ctx = CommandContext::new("/test");
        ctx.dry_run = true;
        ctx.scenarios = selections.iter().map(|s| s.parse().unwrap()).collect();
        ctx
    }

    #[test]
    fn fixing_everything_exits_zero() {
        let cmd = SetupCommand::new(dry_run(&["mysql.service=1"]), SetupArgs::default());
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_mysql", "a");

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("[dry-run] would run:"));
    }

    #[test]
    fn skipping_exits_one() {
        let cmd = SetupCommand::new(dry_run(&["llm.model=2"]), SetupArgs::default());
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_llm", "s");

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn exit_is_success() {
        let cmd = SetupCommand::new(dry_run(&["node.runtime=1"]), SetupArgs::default());
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_node", "x");

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(ui.prompt_count("choice_backend"), 0);
    }
}
