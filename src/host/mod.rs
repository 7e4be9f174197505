//! The seam between checks and the machine they inspect.
//!
//! Probes and remediations are plain functions over a [`HostContext`]. They
//! never run directly: the flow and the aggregator go through a [`Host`],
//! which either executes them against the real system ([`LiveHost`]) or
//! answers from a canned table ([`ScenarioHost`]) for dry runs.
//!
//! Both return `Result<CheckResult>` so they can use `?` freely; the host
//! turns any error into a failing result, so nothing escapes to the
//! orchestrator.

pub mod live;
pub mod scenario;

pub use live::LiveHost;
pub use scenario::{ScenarioHost, ScenarioTable};

use crate::config::{EnvFile, Settings};
use crate::error::Result;
use crate::shell::{home_dir, CommandOptions, CommandResult, CommandRunner, SystemRunner};
use crate::ui::UserInterface;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Outcome of a single probe or remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// A probe implementation.
pub type ProbeFn = fn(&HostContext) -> Result<CheckResult>;

/// A remediation implementation.
pub type RemedyFn = fn(&mut RemedyContext<'_>) -> Result<CheckResult>;

/// A named, side-effect-free inspection.
#[derive(Clone, Copy)]
pub struct ProbeSpec {
    /// Stable name, e.g. `mysql.credentials`. Keys the scenario table.
    pub id: &'static str,
    /// Row label in status tables.
    pub label: &'static str,
    pub run: ProbeFn,
}

impl std::fmt::Debug for ProbeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

/// A named remediation bound to a situation tag.
#[derive(Clone, Copy)]
pub struct RemedySpec {
    /// Situation tag referenced by diagnosis rules.
    pub tag: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Probe ids this remedy is expected to fix. Used by dry runs.
    pub fixes: &'static [&'static str],
    pub run: RemedyFn,
}

impl std::fmt::Debug for RemedySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemedySpec")
            .field("tag", &self.tag)
            .field("label", &self.label)
            .field("fixes", &self.fixes)
            .finish()
    }
}

/// Everything a probe may look at.
///
/// Static lists (service names, search directories) come from
/// [`Settings`], and processes go through an injectable
/// [`CommandRunner`], so probes can be exercised against fixtures.
pub struct HostContext {
    pub project_root: PathBuf,
    pub settings: Settings,
    env_path: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl HostContext {
    /// Create a context for a project, using the system command runner.
    pub fn new(project_root: impl Into<PathBuf>, settings: Settings) -> Self {
        let project_root = project_root.into();
        let env_path = project_root.join(&settings.env_file);
        Self {
            project_root,
            settings,
            env_path,
            runner: Box::new(SystemRunner),
        }
    }

    /// Use a different `.env` file.
    pub fn with_env_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.env_path = if path.is_absolute() {
            path
        } else {
            self.project_root.join(path)
        };
        self
    }

    /// Use a different command runner.
    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    /// Read the `.env` file fresh. A missing file reads as empty.
    pub fn env(&self) -> Result<EnvFile> {
        EnvFile::load(&self.env_path)
    }

    /// Resolve a path relative to the project root. A leading `~/` is the
    /// user's home directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if let (Ok(rest), Some(home)) = (path.strip_prefix("~"), home_dir()) {
            home.join(rest)
        } else if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn backend_dir(&self) -> PathBuf {
        self.resolve(&self.settings.backend_dir)
    }

    /// Run a program in the project root with a timeout.
    pub fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<CommandResult> {
        let options = CommandOptions {
            cwd: Some(self.project_root.clone()),
            timeout: Some(timeout),
            ..Default::default()
        };
        self.run_with(program, args, &options)
    }

    /// Run a program with explicit options.
    pub fn run_with(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<CommandResult> {
        debug!(program, ?args, "spawning");
        self.runner.run(program, args, options)
    }
}

/// What a remediation gets: the host plus a way to talk to the user.
pub struct RemedyContext<'a> {
    pub host: &'a HostContext,
    pub ui: &'a mut dyn UserInterface,
}

/// Executes probes and remediations.
pub trait Host {
    /// Run a probe. Never fails; errors become a failing result.
    fn probe(&self, probe: &ProbeSpec) -> CheckResult;

    /// Run a remediation. Never fails; errors become a failing result.
    fn remediate(&mut self, remedy: &RemedySpec, ui: &mut dyn UserInterface) -> CheckResult;

    /// Whether this host only simulates the machine.
    fn is_dry_run(&self) -> bool {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{context, FakeRunner};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn check_result_constructors() {
        assert!(CheckResult::pass("fine").ok);
        let failed = CheckResult::fail("broken");
        assert!(!failed.ok);
        assert_eq!(failed.message, "broken");
    }

    #[test]
    fn env_path_defaults_under_project_root() {
        let temp = TempDir::new().unwrap();
        let ctx = HostContext::new(temp.path(), Settings::default());
        assert_eq!(ctx.env_path(), temp.path().join(".env"));
    }

    #[test]
    fn relative_env_override_is_resolved() {
        let temp = TempDir::new().unwrap();
        let ctx =
            HostContext::new(temp.path(), Settings::default()).with_env_path("config/app.env");
        assert_eq!(ctx.env_path(), temp.path().join("config/app.env"));
    }

    #[test]
    fn resolve_relative_and_home_paths() {
        let temp = TempDir::new().unwrap();
        let ctx = HostContext::new(temp.path(), Settings::default());
        assert_eq!(
            ctx.resolve("models/a.gguf"),
            temp.path().join("models/a.gguf")
        );
        if let Some(home) = home_dir() {
            assert_eq!(ctx.resolve("~/models/a.gguf"), home.join("models/a.gguf"));
        }
    }

    #[test]
    fn missing_env_reads_empty() {
        let temp = TempDir::new().unwrap();
        let ctx = HostContext::new(temp.path(), Settings::default());
        assert!(ctx.env().unwrap().get("DB_USER").is_none());
    }

    #[test]
    fn run_goes_through_runner() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), FakeRunner::new().ok("node --version", "v20.1.0"));
        let result = ctx
            .run("node", &["--version"], Duration::from_secs(1))
            .unwrap();
        assert_eq!(result.stdout, "v20.1.0");
    }

    #[test]
    fn unknown_program_is_not_found() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), FakeRunner::new());
        assert!(ctx.run("nvcc", &["--version"], Duration::from_secs(1)).is_err());
    }
}
