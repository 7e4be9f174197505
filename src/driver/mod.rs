//! The top-level setup driver.
//!
//! A single ordered pass over the registry: components that already pass
//! are reported and left alone, the rest go through the setup
//! [flow](crate::flow). Exit stops the pass immediately. An optional final
//! read-only re-check produces the [`Verdict`].

pub mod summary;

pub use summary::{check_all, show_summary, Summary, Verdict};

use crate::checker;
use crate::components::ComponentSpec;
use crate::error::Result;
use crate::flow::{run_flow, FlowOutcome};
use crate::host::Host;
use crate::ui::UserInterface;
use serde::Serialize;
use tracing::{debug, info};

/// Fraction of components that must pass for a "mostly ready" verdict.
pub const DEFAULT_PARTIAL_THRESHOLD: f64 = 0.75;

/// What happened to one component during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Passed before anything was done.
    AlreadyReady,
    /// Failed, then passed after remediation.
    Fixed,
    Skipped,
    /// Still failing; the user chose to continue.
    ForcedOk,
}

/// Everything a setup session did.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Components processed, in order.
    pub statuses: Vec<(String, ComponentStatus)>,
    /// Component at which the user exited, if any.
    pub exited_at: Option<String>,
    /// Final re-check, when one was run.
    pub summary: Option<Summary>,
}

impl SessionReport {
    pub fn exited(&self) -> bool {
        self.exited_at.is_some()
    }

    pub fn status(&self, component: &str) -> Option<ComponentStatus> {
        self.statuses
            .iter()
            .find(|(name, _)| name == component)
            .map(|(_, status)| *status)
    }

    /// 0 on a deliberate exit or a ready verdict, 1 otherwise.
    ///
    /// Without a final check, skipped components count as not ready.
    pub fn exit_code(&self) -> i32 {
        if self.exited() {
            return 0;
        }
        match &self.summary {
            Some(summary) => summary.exit_code(),
            None if self
                .statuses
                .iter()
                .any(|(_, s)| *s == ComponentStatus::Skipped) =>
            {
                1
            }
            None => 0,
        }
    }
}

/// Walks components in order and runs the flow for each failing one.
pub struct SetupDriver<'a> {
    components: &'a [ComponentSpec],
    threshold: f64,
    final_check: bool,
}

impl<'a> SetupDriver<'a> {
    pub fn new(components: &'a [ComponentSpec]) -> Self {
        Self {
            components,
            threshold: DEFAULT_PARTIAL_THRESHOLD,
            final_check: true,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_final_check(mut self, final_check: bool) -> Self {
        self.final_check = final_check;
        self
    }

    pub fn run(&self, host: &mut dyn Host, ui: &mut dyn UserInterface) -> Result<SessionReport> {
        let total = self.components.len();
        let mut report = SessionReport {
            statuses: Vec::with_capacity(total),
            exited_at: None,
            summary: None,
        };

        for (index, component) in self.components.iter().enumerate() {
            ui.show_progress(index + 1, total);

            if checker::check(component, &*host).overall_ok {
                ui.success(&format!("{} is ready", component.title));
                report
                    .statuses
                    .push((component.name.to_string(), ComponentStatus::AlreadyReady));
                continue;
            }

            ui.show_header(component.title);
            let status = match run_flow(component, host, ui)? {
                FlowOutcome::Success => ComponentStatus::Fixed,
                FlowOutcome::Skipped => ComponentStatus::Skipped,
                FlowOutcome::ForcedOk => ComponentStatus::ForcedOk,
                FlowOutcome::Exited => {
                    info!(component = component.name, "user exited setup");
                    ui.message("Setup stopped. Run readycheck again to continue.");
                    report.exited_at = Some(component.name.to_string());
                    return Ok(report);
                }
            };
            debug!(component = component.name, ?status, "component done");
            report.statuses.push((component.name.to_string(), status));
        }

        if self.final_check {
            let summary = check_all(self.components, &*host, self.threshold);
            show_summary(ui, &summary);
            report.summary = Some(summary);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components;
    use crate::host::{ScenarioHost, ScenarioTable};
    use crate::ui::MockUI;

    fn scenario(selections: &[(&str, usize)]) -> ScenarioHost {
        let mut host = ScenarioHost::new(ScenarioTable::builtin());
        for (probe, index) in selections {
            host.select(probe, *index).unwrap();
        }
        host
    }

    #[test]
    fn ready_machine_prompts_nothing() {
        let mut host = scenario(&[]);
        let mut ui = MockUI::new();

        let report = SetupDriver::new(components::registry())
            .run(&mut host, &mut ui)
            .unwrap();

        assert!(ui.prompts_shown().is_empty());
        assert!(report
            .statuses
            .iter()
            .all(|(_, s)| *s == ComponentStatus::AlreadyReady));
        assert_eq!(report.summary.unwrap().verdict, Verdict::Ready);
    }

    #[test]
    fn skip_continues_with_next_component() {
        let mut host = scenario(&[("node.npm", 1), ("mysql.database", 1)]);
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_node", "s");
        ui.set_prompt_response("choice_mysql", "a");

        let report = SetupDriver::new(components::registry())
            .run(&mut host, &mut ui)
            .unwrap();

        assert_eq!(report.status("node"), Some(ComponentStatus::Skipped));
        assert_eq!(report.status("mysql"), Some(ComponentStatus::Fixed));
        assert_eq!(report.status("llm"), Some(ComponentStatus::AlreadyReady));
        let summary = report.summary.as_ref().unwrap();
        assert_eq!(summary.ready, 5);
        assert_eq!(summary.verdict, Verdict::Partial);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn exit_stops_before_next_component() {
        let mut host = scenario(&[("backend.node_modules", 1), ("gpu.driver", 1)]);
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_backend", "x");

        let report = SetupDriver::new(components::registry())
            .run(&mut host, &mut ui)
            .unwrap();

        assert_eq!(report.exited_at.as_deref(), Some("backend"));
        assert_eq!(report.statuses.len(), 1);
        assert!(report.summary.is_none());
        assert_eq!(ui.prompt_count("choice_gpu"), 0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn forced_ok_still_fails_final_check() {
        let mut host = scenario(&[("toolchain.compiler", 1)]);
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_toolchain", "c");

        let report = SetupDriver::new(components::registry())
            .run(&mut host, &mut ui)
            .unwrap();

        assert_eq!(report.status("toolchain"), Some(ComponentStatus::ForcedOk));
        assert_eq!(report.summary.as_ref().unwrap().verdict, Verdict::Partial);
    }

    #[test]
    fn without_final_check_skips_decide_exit_code() {
        let mut host = scenario(&[("llm.library", 1)]);
        let mut ui = MockUI::new();
        ui.set_prompt_response("choice_llm", "s");

        let report = SetupDriver::new(components::registry())
            .with_final_check(false)
            .run(&mut host, &mut ui)
            .unwrap();

        assert!(report.summary.is_none());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn threshold_is_configurable() {
        let mut host = scenario(&[("gpu.cuda", 1), ("toolchain.cmake", 1)]);
        let mut ui = MockUI::new();

        let report = SetupDriver::new(components::registry())
            .with_threshold(0.5)
            .run(&mut host, &mut ui)
            .unwrap();

        assert_eq!(report.summary.unwrap().verdict, Verdict::Partial);
    }
}
