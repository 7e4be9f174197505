//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// readycheck - Check and fix everything the game needs to run.
#[derive(Debug, Parser)]
#[command(name = "readycheck")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file (overrides default readycheck.yml)
    #[arg(short, long, global = true, env = "READYCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Path to the backend's .env file
    #[arg(long, global = true, env = "READYCHECK_ENV_FILE", value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Simulate the machine from canned scenarios; change nothing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(flatten)]
    pub scenario_args: ScenarioArgs,

    /// YAML file with extra dry-run scenarios
    #[arg(long = "scenarios", global = true, value_name = "FILE")]
    pub scenario_file: Option<PathBuf>,

    /// Never prompt; answer from READYCHECK_PROMPT_* variables or defaults
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Scenario selections given before and after the subcommand, in
    /// command-line order.
    pub fn scenarios(&self) -> Vec<ScenarioSelection> {
        let after: &[ScenarioSelection] = match &self.command {
            Some(Commands::Check(args)) => &args.scenario_args.scenarios[..],
            Some(Commands::Setup(args)) => &args.scenario_args.scenarios[..],
            Some(Commands::Component(args)) => &args.scenario_args.scenarios[..],
            Some(Commands::List(_)) | None => &[],
        };
        self.scenario_args
            .scenarios
            .iter()
            .chain(after)
            .cloned()
            .collect()
    }

    /// Whether the run simulates the machine. Scenario flags imply it.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || !self.scenarios().is_empty() || self.scenario_file.is_some()
    }
}

/// `--scenario` flags, accepted before and after the subcommand.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScenarioArgs {
    /// Pick a dry-run scenario for a probe (e.g. mysql.service=1)
    #[arg(
        long = "scenario",
        value_name = "PROBE=INDEX",
        value_parser = parse_scenario
    )]
    pub scenarios: Vec<ScenarioSelection>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check every component without changing anything
    Check(CheckArgs),

    /// Walk through fixing each failing component (default)
    Setup(SetupArgs),

    /// Check or set up a single component
    Component(ComponentArgs),

    /// List components and their checks
    List(ListArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip the summary and verdict
    #[arg(long)]
    pub no_summary: bool,

    #[command(flatten)]
    pub scenario_args: ScenarioArgs,
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SetupArgs {
    /// Skip the final re-check of every component
    #[arg(long)]
    pub no_final_check: bool,

    #[command(flatten)]
    pub scenario_args: ScenarioArgs,
}

/// Arguments for the `component` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ComponentArgs {
    /// Component name (see `readycheck list`)
    pub name: String,

    /// What to do
    #[arg(value_enum, default_value_t = ComponentAction::Check)]
    pub action: ComponentAction,

    #[command(flatten)]
    pub scenario_args: ScenarioArgs,
}

/// Action for a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComponentAction {
    /// Show the status table
    Check,
    /// Run the interactive setup flow
    Setup,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A `--scenario probe=index` selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSelection {
    pub probe: String,
    pub index: usize,
}

impl FromStr for ScenarioSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (probe, index) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PROBE=INDEX, got '{}'", s))?;
        let probe = probe.trim();
        if probe.is_empty() {
            return Err(format!("missing probe id in '{}'", s));
        }
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid scenario index in '{}'", s))?;
        Ok(Self {
            probe: probe.to_string(),
            index,
        })
    }
}

fn parse_scenario(s: &str) -> Result<ScenarioSelection, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_setup() {
        let cli = Cli::try_parse_from(["readycheck"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn check_flags() {
        let cli = Cli::try_parse_from(["readycheck", "check", "--json", "--no-summary"]).unwrap();
        match cli.command {
            Some(Commands::Check(args)) => {
                assert!(args.json);
                assert!(args.no_summary);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn component_defaults_to_check() {
        let cli = Cli::try_parse_from(["readycheck", "component", "mysql"]).unwrap();
        match cli.command {
            Some(Commands::Component(args)) => {
                assert_eq!(args.name, "mysql");
                assert_eq!(args.action, ComponentAction::Check);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn repeated_scenarios() {
        let cli = Cli::try_parse_from([
            "readycheck",
            "--scenario",
            "mysql.service=1",
            "check",
            "--scenario",
            "gpu.driver=2",
        ])
        .unwrap();
        assert_eq!(
            cli.scenarios(),
            vec![
                ScenarioSelection {
                    probe: "mysql.service".to_string(),
                    index: 1
                },
                ScenarioSelection {
                    probe: "gpu.driver".to_string(),
                    index: 2
                },
            ]
        );
        assert!(cli.is_dry_run());
    }

    #[test]
    fn scenarios_without_subcommand() {
        let cli = Cli::try_parse_from([
            "readycheck",
            "--scenario",
            "node.npm=1",
            "--scenario",
            "llm.model=3",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.scenarios().len(), 2);
        assert_eq!(cli.scenarios()[1].probe, "llm.model");
    }

    #[test]
    fn scenarios_only_after_component() {
        let cli = Cli::try_parse_from([
            "readycheck",
            "component",
            "gpu",
            "setup",
            "--scenario",
            "gpu.cuda=1",
        ])
        .unwrap();
        assert_eq!(
            cli.scenarios(),
            vec![ScenarioSelection {
                probe: "gpu.cuda".to_string(),
                index: 1
            }]
        );
        assert!(cli.is_dry_run());
    }

    #[test]
    fn about_comes_from_doc_comment() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("Check and fix everything the game needs to run"));
    }

    #[test]
    fn scenario_parse_errors() {
        assert!("mysql.service".parse::<ScenarioSelection>().is_err());
        assert!("=1".parse::<ScenarioSelection>().is_err());
        assert!("mysql.service=one".parse::<ScenarioSelection>().is_err());
        assert!(Cli::try_parse_from(["readycheck", "--scenario", "bad"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "readycheck",
            "setup",
            "--no-final-check",
            "--dry-run",
            "--env-file",
            "config/.env",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.env_file, Some(PathBuf::from("config/.env")));
        assert!(matches!(
            cli.command,
            Some(Commands::Setup(SetupArgs {
                no_final_check: true,
                ..
            }))
        ));
    }
}
