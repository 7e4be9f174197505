//! List command implementation.
//!
//! The `readycheck list` command lists components in setup order with
//! their checks and fixes.

use serde::Serialize;

use crate::cli::args::ListArgs;
use crate::components::{self, ComponentSpec};
use crate::error::{ReadyError, Result};
use crate::ui::theme::Theme;
use crate::ui::{should_use_colors, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    args: ListArgs,
}

#[derive(Serialize)]
struct ComponentEntry<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    probes: Vec<&'a str>,
    remedies: Vec<&'a str>,
}

impl<'a> From<&'a ComponentSpec> for ComponentEntry<'a> {
    fn from(c: &'a ComponentSpec) -> Self {
        Self {
            name: c.name,
            title: c.title,
            description: c.description,
            probes: c.probes.iter().map(|p| p.id).collect(),
            remedies: c.remedies.iter().map(|r| r.tag).collect(),
        }
    }
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(args: ListArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.json {
            let entries: Vec<ComponentEntry> =
                components::registry().iter().map(ComponentEntry::from).collect();
            let json =
                serde_json::to_string_pretty(&entries).map_err(|e| ReadyError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        let theme = if should_use_colors() {
            Theme::new()
        } else {
            Theme::plain()
        };

        for component in components::registry() {
            ui.message(&format!(
                "{} {}",
                theme.highlight.apply_to(component.name),
                theme.dim.apply_to(format!("- {}", component.description))
            ));
            for probe in component.probes {
                ui.message(&format!(
                    "    {}  {}",
                    theme.key.apply_to(probe.id),
                    probe.label
                ));
            }
            if !component.remedies.is_empty() {
                let tags: Vec<&str> = component.remedies.iter().map(|r| r.tag).collect();
                ui.message(&format!(
                    "    {} {}",
                    theme.dim.apply_to("fixes:"),
                    tags.join(", ")
                ));
            }
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    #[test]
    fn lists_every_component_and_probe() {
        let cmd = ListCommand::new(ListArgs::default());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        for component in components::registry() {
            assert!(ui.has_message(component.name));
            for probe in component.probes {
                assert!(ui.has_message(probe.id));
            }
        }
    }

    #[test]
    fn json_lists_in_setup_order() {
        let cmd = ListCommand::new(ListArgs { json: true });
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, components::names());
        assert_eq!(value[2]["probes"][3], "mysql.credentials");
    }
}
