//! Host that touches the real machine.

use super::{CheckResult, Host, HostContext, ProbeSpec, RemedyContext, RemedySpec};
use crate::ui::UserInterface;
use tracing::{debug, warn};

/// Runs probes and remediations against the real system.
pub struct LiveHost {
    ctx: HostContext,
}

impl LiveHost {
    pub fn new(ctx: HostContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &HostContext {
        &self.ctx
    }
}

impl Host for LiveHost {
    fn probe(&self, probe: &ProbeSpec) -> CheckResult {
        let result = (probe.run)(&self.ctx).unwrap_or_else(|e| {
            warn!(probe = probe.id, error = %e, "probe errored");
            CheckResult::fail(e.to_string())
        });
        debug!(probe = probe.id, ok = result.ok, message = %result.message, "probe");
        result
    }

    fn remediate(&mut self, remedy: &RemedySpec, ui: &mut dyn UserInterface) -> CheckResult {
        let mut rc = RemedyContext {
            host: &self.ctx,
            ui,
        };
        let result = (remedy.run)(&mut rc).unwrap_or_else(|e| {
            warn!(remedy = remedy.tag, error = %e, "remediation errored");
            CheckResult::fail(e.to_string())
        });
        debug!(remedy = remedy.tag, ok = result.ok, "remediation finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReadyError, Result};
    use crate::host::testing::{context, FakeRunner};
    use crate::ui::{MockUI, Prompt};
    use tempfile::TempDir;

    fn erroring_probe(_: &HostContext) -> Result<CheckResult> {
        Err(ReadyError::CommandNotFound {
            program: "nvidia-smi".to_string(),
        })
    }

    fn node_probe(ctx: &HostContext) -> Result<CheckResult> {
        let out = ctx.run("node", &["--version"], ctx.settings.timeouts.probe())?;
        Ok(CheckResult::pass(out.first_line()))
    }

    fn asking_remedy(rc: &mut RemedyContext<'_>) -> Result<CheckResult> {
        let answer = rc.ui.prompt(&Prompt::input("name", "Name?", None))?;
        Ok(CheckResult::pass(format!("hello {}", answer.as_string())))
    }

    #[test]
    fn probe_error_becomes_failure() {
        let temp = TempDir::new().unwrap();
        let host = LiveHost::new(context(temp.path(), FakeRunner::new()));
        let probe = ProbeSpec {
            id: "gpu.driver",
            label: "NVIDIA driver",
            run: erroring_probe,
        };

        let result = host.probe(&probe);
        assert!(!result.ok);
        assert_eq!(result.message, "nvidia-smi not found on PATH");
    }

    #[test]
    fn probe_runs_against_context() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new().ok("node --version", "v20.11.0\n");
        let host = LiveHost::new(context(temp.path(), runner));
        let probe = ProbeSpec {
            id: "node.runtime",
            label: "Node.js",
            run: node_probe,
        };

        assert_eq!(host.probe(&probe), CheckResult::pass("v20.11.0"));
    }

    #[test]
    fn remedy_gets_the_ui() {
        let temp = TempDir::new().unwrap();
        let mut host = LiveHost::new(context(temp.path(), FakeRunner::new()));
        let mut ui = MockUI::new();
        ui.set_prompt_response("name", "world");
        let remedy = RemedySpec {
            tag: "greet",
            label: "Greet",
            fixes: &[],
            run: asking_remedy,
        };

        let result = host.remediate(&remedy, &mut ui);
        assert_eq!(result.message, "hello world");
        assert!(!host.is_dry_run());
    }
}
