//! Component status aggregation.
//!
//! [`check`] runs every probe of a component in declaration order and ANDs
//! the verdicts. It never short-circuits: a status table always shows every
//! row, and each probe is run exactly once per check so the table and the
//! verdict come from the same results.

pub mod render;

use crate::components::ComponentSpec;
use crate::host::{CheckResult, Host};
use crate::ui::UserInterface;
use serde::Serialize;
use tracing::debug;

/// One probe's row in a component outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub result: CheckResult,
}

/// The result of checking one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentOutcome {
    pub component: String,
    pub title: String,
    pub results: Vec<ProbeReport>,
    pub overall_ok: bool,
}

impl ComponentOutcome {
    /// Look up a probe result by label.
    pub fn get(&self, label: &str) -> Option<&CheckResult> {
        self.results
            .iter()
            .find(|r| r.label == label)
            .map(|r| &r.result)
    }

    /// The first failing probe, in declaration order.
    pub fn first_failure(&self) -> Option<&ProbeReport> {
        self.results.iter().find(|r| !r.result.ok)
    }
}

/// Run every probe of `component` and aggregate.
pub fn check(component: &ComponentSpec, host: &dyn Host) -> ComponentOutcome {
    let results: Vec<ProbeReport> = component
        .probes
        .iter()
        .map(|probe| ProbeReport {
            id: probe.id.to_string(),
            label: probe.label.to_string(),
            result: host.probe(probe),
        })
        .collect();
    let overall_ok = results.iter().all(|r| r.result.ok);

    debug!(component = component.name, overall_ok, "checked");
    ComponentOutcome {
        component: component.name.to_string(),
        title: component.title.to_string(),
        results,
        overall_ok,
    }
}

/// [`check`], then print the status table and failure details.
pub fn check_verbose(
    component: &ComponentSpec,
    host: &dyn Host,
    ui: &mut dyn UserInterface,
) -> ComponentOutcome {
    let mut spinner = ui.start_spinner(&format!("Checking {}", component.title));
    let outcome = check(component, host);
    spinner.finish_clear();

    ui.message(&render::status_table(&outcome));
    for line in render::details(&outcome) {
        ui.message(&line);
    }
    outcome
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
    fn all_passing_is_ok() {
        let mysql = components::find("mysql").unwrap();
        let outcome = check(mysql, &scenario(&[]));
        assert!(outcome.overall_ok);
        assert_eq!(outcome.results.len(), mysql.probes.len());
    }

    #[test]
    fn one_failure_fails_the_component() {
        let mysql = components::find("mysql").unwrap();
        let outcome = check(mysql, &scenario(&[("mysql.service", 1)]));
        assert!(!outcome.overall_ok);
        assert_eq!(outcome.first_failure().unwrap().id, "mysql.service");
    }

    #[test]
    fn no_short_circuit() {
        let mysql = components::find("mysql").unwrap();
        let outcome = check(
            mysql,
            &scenario(&[("mysql.config", 1), ("mysql.database", 1)]),
        );
        let failing: Vec<&str> = outcome
            .results
            .iter()
            .filter(|r| !r.result.ok)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(failing, vec!["mysql.config", "mysql.database"]);
    }

    #[test]
    fn overall_is_and_of_results() {
        let host = scenario(&[("llm.model", 3), ("node.npm", 1)]);
        for component in components::registry() {
            let outcome = check(component, &host);
            assert_eq!(
                outcome.overall_ok,
                outcome.results.iter().all(|r| r.result.ok)
            );
        }
    }

    #[test]
    fn check_is_idempotent() {
        let host = scenario(&[("gpu.cuda", 1)]);
        let gpu = components::find("gpu").unwrap();
        assert_eq!(check(gpu, &host), check(gpu, &host));
    }

    #[test]
    fn get_by_label() {
        let node = components::find("node").unwrap();
        let outcome = check(node, &scenario(&[("node.npm", 1)]));
        assert!(outcome.get("Node.js runtime").unwrap().ok);
        assert!(!outcome.get("npm").unwrap().ok);
        assert!(outcome.get("nope").is_none());
    }

    #[test]
    fn verbose_prints_table_and_details() {
        let node = components::find("node").unwrap();
        let mut ui = MockUI::new();
        let outcome = check_verbose(node, &scenario(&[("node.npm", 1)]), &mut ui);

        assert!(!outcome.overall_ok);
        assert!(ui.messages().iter().any(|m| m.contains("Node.js runtime")));
        assert!(ui.messages().iter().any(|m| m.starts_with("npm:")));
    }
}
